//! Parsing logic for the PlantUML state machine dialect.
//!
//! This module grows a [`Model`] line by line. It tracks three pieces of
//! context while walking the file:
//! - whether the cursor is inside the `@startuml` / `@enduml` block
//! - whether it is inside a `header` / `footer` section
//! - the stack of currently-enclosing parent states
//!
//! The parser is recovery-oriented: malformed lines are reported through the
//! diagnostic sink and skipped, and the rest of the file is processed.

use log::debug;
use plantgen_core::diag::{Diagnostic, DiagnosticSink};
use plantgen_core::model::{
    DeclKind, Declaration, EventDirection, Import, ImportScope, Model, NO_PARENT, StateId,
    StateKind, Transition, Variable, Visibility,
};
use std::collections::HashSet;

use crate::Config;
use crate::lexer::tokenize;

/// Milliseconds per time unit token.
fn unit_multiplier(unit: &str) -> Option<u64> {
    match unit {
        "ms" => Some(1),
        "s" => Some(1000),
        "min" => Some(60000),
        _ => None,
    }
}

/// A transition arrow is any token of the shape `-...>`, which covers the
/// PlantUML direction hints (`->`, `-->`, `-down->`, ...).
fn is_transition_arrow(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('-') && token.ends_with('>')
}

/// The reserved names `initial` and `final` always carry their pseudostate
/// role, wherever they appear.
fn kind_for_name(name: &str) -> StateKind {
    match name {
        "initial" => StateKind::Initial,
        "final" => StateKind::Final,
        _ => StateKind::Normal,
    }
}

fn split_statements(text: &str) -> Vec<String> {
    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

pub struct Parser<'a, D: DiagnosticSink> {
    model: Model,
    diags: &'a mut D,
    verbose: bool,
    in_uml: bool,
    in_header: bool,
    in_footer: bool,
    parent_stack: Vec<StateId>,
    current_parent: StateId,
    /// States that went through an explicit `state X` declaration line,
    /// so a second declaration can be flagged while plain references stay
    /// silent.
    declared: HashSet<StateId>,
    line_no: usize,
}

impl<'a, D: DiagnosticSink> Parser<'a, D> {
    pub fn new(diags: &'a mut D, config: &Config) -> Self {
        Self {
            model: Model::new(),
            diags,
            verbose: config.verbose,
            in_uml: false,
            in_header: false,
            in_footer: false,
            parent_stack: Vec::new(),
            current_parent: NO_PARENT,
            declared: HashSet::new(),
            line_no: 0,
        }
    }

    /// Consume all input lines and return the finished model.
    pub fn parse<I>(mut self, lines: I) -> Model
    where
        I: IntoIterator<Item = String>,
    {
        for line in lines {
            self.line_no += 1;
            self.parse_line(line.trim_end());
        }
        self.model
    }

    fn error(&mut self, message: String) {
        self.diags.report(Diagnostic::error(message).at_line(self.line_no));
    }

    fn warning(&mut self, message: String) {
        self.diags
            .report(Diagnostic::warning(message).at_line(self.line_no));
    }

    fn parse_line(&mut self, line: &str) {
        let trimmed = line.trim();

        if !self.in_uml {
            if trimmed == "@startuml" {
                self.in_uml = true;
            }
            return;
        }
        if trimmed == "@enduml" {
            self.in_uml = false;
            return;
        }

        self.model.add_uml_line(line);

        match trimmed {
            "header" => self.in_header = true,
            "endheader" => self.in_header = false,
            "footer" => self.in_footer = true,
            "endfooter" => self.in_footer = false,
            _ => {
                let tokens = tokenize(line);
                if tokens.is_empty() {
                    return;
                }
                if self.in_header || self.in_footer {
                    self.parse_interface_line(&tokens);
                } else {
                    self.parse_body_line(&tokens);
                }
            }
        }
    }

    // ========== Header / footer context ==========

    fn parse_interface_line(&mut self, tokens: &[&str]) {
        match tokens[0] {
            "model" if tokens.len() == 2 => {
                self.model.set_model_name(tokens[1]);
                if self.verbose {
                    debug!("model name detected: {}", self.model.model_name());
                }
            }
            "import" => self.parse_import(tokens),
            "private" | "public" => self.parse_variable(tokens),
            "in" | "out" if tokens.get(1) == Some(&"event") => self.parse_directed_event(tokens),
            "event" if tokens.len() >= 2 => self.parse_internal_event(tokens),
            _ => self.warning(format!("unrecognized header line '{}'", tokens.join(" "))),
        }
    }

    /// `import [global] "NAME"`
    fn parse_import(&mut self, tokens: &[&str]) {
        let (scope, name) = match tokens {
            [_, "global", name] => (ImportScope::Global, *name),
            [_, name] => (ImportScope::Local, *name),
            _ => {
                self.error(format!("malformed import '{}'", tokens.join(" ")));
                return;
            }
        };
        let content = name.trim_matches('"').to_owned();
        if self.verbose {
            debug!("found import {content}");
        }
        self.model.add_import(Import { content, scope });
    }

    /// `{private|public} var NAME : TYPE [= VALUE]`
    fn parse_variable(&mut self, tokens: &[&str]) {
        let well_formed = tokens.len() >= 5
            && tokens[1] == "var"
            && tokens[3] == ":"
            && (tokens.len() == 5 || (tokens.len() == 7 && tokens[5] == "="));
        if !well_formed {
            self.error(format!("malformed variable declaration '{}'", tokens.join(" ")));
            return;
        }

        let variable = Variable {
            name: tokens[2].to_owned(),
            ty: tokens[4].to_owned(),
            visibility: if tokens[0] == "private" {
                Visibility::Private
            } else {
                Visibility::Public
            },
            initial_value: tokens.get(6).map(|v| (*v).to_owned()),
        };
        if self.verbose {
            debug!("found variable {} {}", variable.ty, variable.name);
        }
        if !self.model.add_variable(variable) {
            self.warning(format!(
                "duplicate variable '{}', keeping the first declaration",
                tokens[2]
            ));
        }
    }

    /// `{in|out} event NAME [: TYPE]`
    fn parse_directed_event(&mut self, tokens: &[&str]) {
        let well_formed =
            tokens.len() == 3 || (tokens.len() == 5 && tokens[3] == ":");
        if !well_formed {
            self.error(format!("malformed event declaration '{}'", tokens.join(" ")));
            return;
        }

        let direction = if tokens[0] == "in" {
            EventDirection::Incoming
        } else {
            EventDirection::Outgoing
        };
        let parameter = tokens.get(4).map(|t| (*t).to_owned());
        let (_, created) = self.model.add_event(tokens[2], direction, parameter);
        if created {
            if self.verbose {
                debug!("added new event {}", tokens[2]);
            }
        } else {
            self.warning(format!(
                "duplicate event declaration '{}', keeping the first definition",
                tokens[2]
            ));
        }
    }

    /// `event NAME [: TYPE]`
    fn parse_internal_event(&mut self, tokens: &[&str]) {
        let well_formed =
            tokens.len() == 2 || (tokens.len() == 4 && tokens[2] == ":");
        if !well_formed {
            self.error(format!("malformed event declaration '{}'", tokens.join(" ")));
            return;
        }

        let parameter = tokens.get(3).map(|t| (*t).to_owned());
        let (_, created) = self
            .model
            .add_event(tokens[1], EventDirection::Internal, parameter);
        if created {
            if self.verbose {
                debug!("added new internal event {}", tokens[1]);
            }
        } else {
            self.warning(format!(
                "duplicate event declaration '{}', keeping the first definition",
                tokens[1]
            ));
        }
    }

    // ========== Body context ==========

    fn parse_body_line(&mut self, tokens: &[&str]) {
        if tokens[0] == "}" {
            self.current_parent = self.parent_stack.pop().unwrap_or(NO_PARENT);
        } else if tokens[0] == "state" && tokens.len() > 1 {
            self.parse_state_declaration(tokens);
        } else if tokens.len() > 2 && is_transition_arrow(tokens[1]) {
            self.parse_transition(tokens);
        } else if tokens.len() > 2 && tokens[1] == ":" {
            self.parse_state_action(tokens);
        } else {
            self.warning(format!("unrecognized line '{}'", tokens.join(" ")));
        }
    }

    /// `state NAME [<<choice>>] [{`
    fn parse_state_declaration(&mut self, tokens: &[&str]) {
        let name = tokens[1];
        let mut kind = kind_for_name(name);
        let mut opens_nesting = false;
        for token in &tokens[2..] {
            match *token {
                "<<choice>>" => kind = StateKind::Choice,
                "{" => opens_nesting = true,
                _ => {}
            }
        }

        let (id, created) = self.model.add_state(name, self.current_parent, kind);
        if created {
            if self.verbose {
                debug!("new state: {name}, id = {id}, parent = {}", self.current_parent);
            }
        } else {
            // A reference from an earlier transition line is the normal
            // PlantUML idiom; only a repeated declaration is suspicious.
            if !self.declared.insert(id) {
                self.warning(format!("duplicate state '{name}', keeping the first definition"));
            }
            let existing_kind = self.model.state_by_id(id).map(|s| s.kind);
            if kind == StateKind::Choice && existing_kind != Some(StateKind::Choice) {
                self.warning(format!(
                    "state '{name}' was already defined as a plain state; <<choice>> ignored"
                ));
            }
        }
        self.declared.insert(id);

        if opens_nesting {
            if self.current_parent != NO_PARENT {
                self.parent_stack.push(self.current_parent);
            }
            self.current_parent = id;
        }
    }

    /// `SRC -> TGT [: EVENTSPEC [GUARD]] [/ ACTIONS]` where either end may be
    /// `[*]` (initial at the source, final at the target).
    fn parse_transition(&mut self, tokens: &[&str]) {
        let source_name = if tokens[0] == "[*]" { "initial" } else { tokens[0] };
        let target_name = if tokens[2] == "[*]" { "final" } else { tokens[2] };

        let (source, _) =
            self.model
                .add_state(source_name, self.current_parent, kind_for_name(source_name));
        let (target, _) =
            self.model
                .add_state(target_name, self.current_parent, kind_for_name(target_name));

        let mut transition = Transition {
            source,
            target,
            event: None,
            guard: None,
            actions: Vec::new(),
        };

        let mut rest: &[&str] = &tokens[3..];
        if rest.first() == Some(&":") {
            rest = &rest[1..];
            let Some(remaining) = self.parse_event_spec(rest, source_name, &mut transition) else {
                return; // malformed, already reported
            };
            rest = remaining;
        }

        if rest.first() == Some(&"/") {
            self.intern_raised_events(&rest[1..]);
            transition.actions = split_statements(&rest[1..].join(" "));
        } else if !rest.is_empty() {
            self.warning(format!(
                "unexpected trailing tokens on transition: '{}'",
                rest.join(" ")
            ));
        }

        if self.verbose {
            debug!(
                "added transition {source_name} --> {target_name} (event {:?})",
                transition.event
            );
        }
        self.model.add_transition(transition);
    }

    /// Event specification after the `:`. Three forms: a leading `[` is a
    /// guard-only (completion) transition, `after`/`every` are time events,
    /// anything else names an event. Returns the unconsumed tokens, or None
    /// when the line is malformed.
    fn parse_event_spec<'t, 's>(
        &mut self,
        rest: &'t [&'s str],
        source_name: &str,
        transition: &mut Transition,
    ) -> Option<&'t [&'s str]> {
        let Some(&first) = rest.first() else {
            return Some(rest);
        };

        // A `/` right after the colon means the arrow only carries actions.
        if first == "/" {
            return Some(rest);
        }

        if first.starts_with('[') {
            let (guard, remaining) = self.take_guard(rest)?;
            transition.guard = Some(guard);
            return Some(remaining);
        }

        if first == "after" || first == "every" {
            return self.parse_time_spec(rest, source_name, transition);
        }

        let event = match self.model.event_by_name(first) {
            Some(event) => event.id,
            // Events may be referenced before declaration; assume incoming.
            None => self.model.add_event(first, EventDirection::Incoming, None).0,
        };
        transition.event = Some(event);

        let mut remaining = &rest[1..];
        if remaining.first().is_some_and(|t| t.starts_with('[')) {
            let (guard, r) = self.take_guard(remaining)?;
            transition.guard = Some(guard);
            remaining = r;
        }
        Some(remaining)
    }

    /// `after N {ms|s|min} [GUARD]` or `every N {ms|s|min} [GUARD]`.
    ///
    /// The synthesized event name is `{src}_{after|every}_{N}{unit}`, unique
    /// per declaration site. A missing or invalid duration or unit rejects
    /// the line; silently defaulting the unit could synthesize colliding
    /// identifiers for diagrams that put the guard right after the number.
    fn parse_time_spec<'t, 's>(
        &mut self,
        rest: &'t [&'s str],
        source_name: &str,
        transition: &mut Transition,
    ) -> Option<&'t [&'s str]> {
        let keyword = rest[0];
        let Some(count_token) = rest.get(1) else {
            self.error(format!("no duration specified after '{keyword}'"));
            return None;
        };
        let Ok(count) = count_token.parse::<u64>() else {
            self.error(format!("invalid duration '{count_token}' after '{keyword}'"));
            return None;
        };
        let Some(multiplier) = rest.get(2).and_then(|unit| unit_multiplier(unit)) else {
            self.error(format!(
                "missing or unknown time unit after '{keyword} {count_token}' (expected ms, s or min)"
            ));
            return None;
        };

        let name = format!("{source_name}_{keyword}_{count_token}{}", rest[2]);
        let (event, _) = self
            .model
            .add_time_event(&name, count * multiplier, keyword == "every");
        transition.event = Some(event);

        let mut remaining = &rest[3..];
        if remaining.first().is_some_and(|t| t.starts_with('[')) {
            let (guard, r) = self.take_guard(remaining)?;
            transition.guard = Some(guard);
            remaining = r;
        }
        Some(remaining)
    }

    /// Join tokens from the opening `[` through the token that closes it,
    /// returning the guard text without the outer brackets. Guards may
    /// contain spaces.
    fn take_guard<'t, 's>(&mut self, tokens: &'t [&'s str]) -> Option<(String, &'t [&'s str])> {
        let end = tokens.iter().position(|t| t.ends_with(']'));
        let Some(end) = end else {
            self.error("unterminated guard expression".to_owned());
            return None;
        };
        let joined = tokens[..=end].join(" ");
        let guard = joined[1..joined.len() - 1].trim().to_owned();
        Some((guard, &tokens[end + 1..]))
    }

    /// `STATE : entry|exit|oncycle / BODY` declares an action;
    /// `STATE : TEXT` attaches a comment decoration.
    fn parse_state_action(&mut self, tokens: &[&str]) {
        let Some(state) = self.model.state_by_name(tokens[0]) else {
            self.warning(format!(
                "action on unknown state '{}', line skipped",
                tokens[0]
            ));
            return;
        };
        let state_id = state.id;

        let kind = match tokens[2] {
            "entry" => Some(DeclKind::Entry),
            "exit" => Some(DeclKind::Exit),
            "oncycle" => Some(DeclKind::OnCycle),
            _ => None,
        };

        match kind {
            Some(kind) if tokens.len() > 3 && tokens[3] == "/" => {
                self.intern_raised_events(&tokens[4..]);
                let body = tokens[4..].join(" ");
                if self.verbose {
                    debug!("found {kind:?} declaration for state {}", tokens[0]);
                }
                self.model.add_declaration(Declaration {
                    state: state_id,
                    kind,
                    body,
                });
            }
            _ => {
                let body = tokens[2..].join(" ");
                self.model.add_declaration(Declaration {
                    state: state_id,
                    kind: DeclKind::Comment,
                    body,
                });
            }
        }
    }

    /// Any `raise X` inside an action body implicitly declares `X` as an
    /// internal event, unless it already exists.
    fn intern_raised_events(&mut self, tokens: &[&str]) {
        for pair in tokens.windows(2) {
            if pair[0] == "raise" {
                let name = pair[1].trim_end_matches(';');
                if !name.is_empty() {
                    self.model
                        .add_event(name, EventDirection::Internal, None);
                }
            }
        }
    }
}
