//! Entry/exit action functions and action-body expansion.
//!
//! Action and guard bodies arrive verbatim from the diagram and contain
//! `${name}` placeholders plus the bare `raise X` form. Expansion is a
//! token-stream rewrite: tokenize, substitute each token, re-serialize.
//! Entry functions additionally start the timers of the state's outgoing
//! time events; exit functions stop them.

use plantgen_core::diag::{Diagnostic, DiagnosticSink};
use plantgen_core::model::{DeclKind, StateKind};

use super::Emitter;
use super::utils::CodeBuffer;
use crate::lexer::tokenize;

impl Emitter<'_> {
    pub(super) fn impl_entry_actions<D: DiagnosticSink>(&self, out: &mut CodeBuffer, diags: &mut D) {
        for state in self.model.states() {
            if state.kind == StateKind::Initial {
                continue;
            }
            let declarations: Vec<_> = self
                .model
                .declarations_of(state.id, DeclKind::Entry)
                .collect();
            let timers = self.time_events_from(state.id);
            if declarations.is_empty() && timers.is_empty() {
                continue;
            }

            out.line(
                0,
                format!(
                    "void {}::{}()",
                    self.styler.machine_class(),
                    self.styler.state_entry_action(state)
                ),
            );
            out.line(0, "{");

            for (index, event) in timers.iter().enumerate() {
                out.line(
                    1,
                    format!(
                        "/* Start timer {} with timeout of {} ms. */",
                        event.name, event.expire_ms
                    ),
                );
                out.line(
                    1,
                    format!("time_events.{}.timeout_ms = {};", event.name, event.expire_ms),
                );
                out.line(
                    1,
                    format!(
                        "time_events.{}.expireTime_ms = time_now_ms + {};",
                        event.name, event.expire_ms
                    ),
                );
                out.line(
                    1,
                    format!(
                        "time_events.{}.isPeriodic = {};",
                        event.name, event.is_periodic
                    ),
                );
                out.line(1, format!("time_events.{}.isStarted = true;", event.name));
                if index + 1 < timers.len() {
                    out.blank();
                }
            }

            if !declarations.is_empty() && !timers.is_empty() {
                out.blank();
            }
            for declaration in &declarations {
                let statement = self.expand_statement(&declaration.body, diags);
                out.line(1, statement);
            }

            out.line(0, "}");
            out.blank();
        }
    }

    pub(super) fn impl_exit_actions<D: DiagnosticSink>(&self, out: &mut CodeBuffer, diags: &mut D) {
        for state in self.model.states() {
            if state.kind == StateKind::Initial {
                continue;
            }
            let declarations: Vec<_> = self
                .model
                .declarations_of(state.id, DeclKind::Exit)
                .collect();
            let timers = self.time_events_from(state.id);
            if declarations.is_empty() && timers.is_empty() {
                continue;
            }

            out.line(
                0,
                format!(
                    "void {}::{}()",
                    self.styler.machine_class(),
                    self.styler.state_exit_action(state)
                ),
            );
            out.line(0, "{");

            for event in &timers {
                out.line(1, format!("time_events.{}.isStarted = false;", event.name));
            }
            if !declarations.is_empty() && !timers.is_empty() {
                out.blank();
            }
            for declaration in &declarations {
                let statement = self.expand_statement(&declaration.body, diags);
                out.line(1, statement);
            }

            out.line(0, "}");
            out.blank();
        }
    }

    /// Rewrite one action body into a target-language statement: `${name}`
    /// placeholders become qualified variable accesses and `raise X [ARG]`
    /// becomes a call to the matching raise function.
    pub(super) fn expand_statement<D: DiagnosticSink>(&self, text: &str, diags: &mut D) -> String {
        let tokens = tokenize(text);
        let mut output: Vec<String> = Vec::new();
        let mut index = 0;

        while index < tokens.len() {
            let token = tokens[index];
            if token == "raise" {
                index += 1;
                let Some(name_token) = tokens.get(index) else {
                    diags.report(Diagnostic::warning(
                        "dangling 'raise' at end of action body".to_owned(),
                    ));
                    output.push("raise".to_owned());
                    break;
                };
                let name = name_token.trim_end_matches(';');
                let Some(event) = self.model.event_by_name(name) else {
                    diags.report(Diagnostic::warning(format!(
                        "raise of undeclared event '{name}'"
                    )));
                    output.push(format!("/* unresolved: raise {name} */"));
                    index += 1;
                    continue;
                };

                let raise = self.styler.event_raise(&event.name);
                if event.requires_parameter() {
                    // The argument is the next token, when one is present
                    // and the event name was not statement-terminated.
                    let argument = (!name_token.ends_with(';'))
                        .then(|| tokens.get(index + 1))
                        .flatten()
                        .filter(|t| **t != "raise");
                    match argument {
                        Some(argument) => {
                            output.push(format!("{raise}({});", argument.trim_end_matches(';')));
                            index += 2;
                        }
                        None => {
                            output.push(format!("{raise}({{}});"));
                            index += 1;
                        }
                    }
                } else {
                    output.push(format!("{raise}();"));
                    index += 1;
                }
            } else {
                output.push(self.expand_references(token, false, diags));
                index += 1;
            }
        }

        let mut statement = output.join(" ");
        if !statement.ends_with(';') {
            statement.push(';');
        }
        statement
    }

    /// Rewrite a guard expression. Unlike action bodies, guards run where the
    /// dispatched event is in scope, so `${event}` resolves to the event's
    /// payload slot.
    pub(super) fn expand_guard<D: DiagnosticSink>(&self, text: &str, diags: &mut D) -> String {
        tokenize(text)
            .into_iter()
            .map(|token| self.expand_references(token, true, diags))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Substitute every `${name}` inside one token.
    fn expand_references<D: DiagnosticSink>(
        &self,
        token: &str,
        in_guard: bool,
        diags: &mut D,
    ) -> String {
        let mut output = String::new();
        let mut rest = token;

        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                diags.report(Diagnostic::error(format!(
                    "invalid variable/event reference in '{token}'"
                )));
                output.push_str(&rest[start..]);
                return output;
            };
            let name = &after[..end];
            output.push_str(&self.resolve_reference(name, in_guard, diags));
            rest = &after[end + 1..];
        }
        output.push_str(rest);
        output
    }

    fn resolve_reference<D: DiagnosticSink>(
        &self,
        name: &str,
        in_guard: bool,
        diags: &mut D,
    ) -> String {
        if let Some(variable) = self.model.variable_by_name(name) {
            return match variable.visibility {
                plantgen_core::model::Visibility::Private => {
                    format!("variables.internal.{}", variable.name)
                }
                plantgen_core::model::Visibility::Public => {
                    format!("variables.exported.{}", variable.name)
                }
            };
        }

        if in_guard {
            if let Some(event) = self.model.event_by_name(name) {
                // Only queued events have a payload slot the guard can see.
                let queued = !event.is_time_event
                    && event.direction != plantgen_core::model::EventDirection::Outgoing;
                if queued && event.requires_parameter() {
                    return format!("event.parameter.{}", self.styler.event_id_variant(event));
                }
                diags.report(Diagnostic::warning(format!(
                    "event '{name}' carries no readable parameter, reference left unresolved"
                )));
                return format!("/* unresolved: {name} */");
            }
        }

        diags.report(Diagnostic::warning(format!(
            "unresolved reference '${{{name}}}'"
        )));
        format!("/* unresolved: {name} */")
    }
}
