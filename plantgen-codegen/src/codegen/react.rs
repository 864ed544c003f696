//! The run cycle and the per-state react functions.
//!
//! `run_cycle` drains the event queue in arrival order and dispatches each
//! event to the react of the current state. A react delegates to its parent
//! first (inherited transitions win), then evaluates its own transitions in
//! declaration order; the first match whose guard holds performs the full
//! super-step: exit actions innermost-first up to the least common ancestor,
//! transition actions, entry actions outermost-in, and finally choice
//! resolution down to a concrete state.

use plantgen_core::diag::{Diagnostic, DiagnosticSink, GenerateError};
use plantgen_core::model::{DeclKind, State, StateId, StateKind, Transition};
use plantgen_core::semantics::{self, EntryPath};

use super::Emitter;
use super::utils::{CodeBuffer, if_else_if};

impl Emitter<'_> {
    pub(super) fn impl_top_run_cycle(&self, c: &mut CodeBuffer) {
        c.line(
            0,
            format!("void {}::{}()", self.styler.machine_class(), self.styler.top_run_cycle()),
        );
        c.line(0, "{");
        c.line(1, "// Handle all queued events.");
        c.line(1, "while (!event_queue.empty())");
        c.line(1, "{");
        c.line(2, "auto event = event_queue.front();");
        c.line(2, "event_queue.pop_front();");
        c.blank();
        c.line(2, "switch (state)");
        c.line(2, "{");
        for state in self.normal_states() {
            c.line(3, format!("case {}:", self.styler.state_value(state)));
            c.line(4, format!("{}(event, true);", self.styler.state_react(state)));
            c.line(4, "break;");
            c.blank();
        }
        c.line(3, "default:");
        c.line(4, "// Invalid, or final state.");
        c.line(4, "break;");
        c.line(2, "}");
        c.line(1, "}");
        c.line(0, "}");
        c.blank();
    }

    pub(super) fn impl_state_reacts<D: DiagnosticSink>(
        &self,
        c: &mut CodeBuffer,
        diags: &mut D,
    ) -> Result<(), GenerateError> {
        for state in self.normal_states() {
            self.emit_react(c, state, diags)?;
        }
        Ok(())
    }

    fn emit_react<D: DiagnosticSink>(
        &self,
        c: &mut CodeBuffer,
        state: &State,
        diags: &mut D,
    ) -> Result<(), GenerateError> {
        c.line(
            0,
            format!(
                "bool {}::{}(const {}& event, bool try_transition)",
                self.styler.machine_class(),
                self.styler.state_react(state),
                self.styler.event_struct()
            ),
        );
        c.line(0, "{");

        let comments: Vec<_> = self
            .model
            .declarations_of(state.id, DeclKind::Comment)
            .collect();
        if !comments.is_empty() {
            for comment in comments {
                c.line(1, format!("// {}", comment.body));
            }
            c.blank();
        }

        c.line(1, "auto did_transition = try_transition;");
        c.line(1, "if (try_transition)");
        c.line(1, "{");

        let parent = self.model.state_by_id(state.parent);
        let parent_first = self.config.parent_first_execution;

        // When there is no parent react, or the parent already had its
        // chance, a non-matching event is simply not handled here.
        let fallback = match (parent, parent_first) {
            (Some(parent), false) => format!(
                "did_transition = {}(event, try_transition);",
                self.styler.state_react(parent)
            ),
            _ => "did_transition = false;".to_owned(),
        };

        let mut indent = 2;
        if let (Some(parent), true) = (parent, parent_first) {
            c.line(
                indent,
                format!("if (!{}(event, try_transition))", self.styler.state_react(parent)),
            );
            c.line(indent, "{");
            indent += 1;
        }

        let branches = self.emittable_transitions(state);
        if branches.is_empty() {
            c.line(indent, &fallback);
        } else {
            for (index, transition) in branches.iter().enumerate() {
                let condition = self.branch_condition(transition, diags)?;
                c.line(indent, format!("{} ({})", if_else_if(index), condition));
                c.line(indent, "{");
                self.emit_super_step(c, indent + 1, state, transition, diags)?;
                c.line(indent, "}");
            }
            c.line(indent, "else");
            c.line(indent, "{");
            c.line(indent + 1, &fallback);
            c.line(indent, "}");
        }

        if parent.is_some() && parent_first {
            indent -= 1;
            c.line(indent, "}");
        }
        c.line(1, "}");
        c.line(1, "return did_transition;");
        c.line(0, "}");
        c.blank();
        Ok(())
    }

    /// Transitions of a state that survive the semantic checks. Whatever is
    /// dropped here was already reported by validation.
    fn emittable_transitions(&self, state: &State) -> Vec<&Transition> {
        self.model
            .transitions_from(state.id)
            .filter(|t| {
                match t.event.and_then(|id| self.model.event_by_id(id)) {
                    Some(event) => {
                        event.is_time_event
                            || event.direction != plantgen_core::model::EventDirection::Outgoing
                    }
                    // Completion transitions are only valid into a final
                    // state, where they become an unconditional exit.
                    None => self
                        .model
                        .state_by_id(t.target)
                        .is_some_and(|s| s.kind == StateKind::Final),
                }
            })
            .collect()
    }

    fn branch_condition<D: DiagnosticSink>(
        &self,
        transition: &Transition,
        diags: &mut D,
    ) -> Result<String, GenerateError> {
        let guard = transition
            .guard
            .as_deref()
            .map(|g| self.expand_guard(g, diags));
        match transition.event {
            Some(id) => {
                let event = self.event(id)?;
                let matches = format!("{} == event.id", self.styler.event_id_value(event));
                Ok(match guard {
                    Some(guard) => format!("({matches}) && ({guard})"),
                    None => matches,
                })
            }
            None => Ok(guard.unwrap_or_else(|| "true".to_owned())),
        }
    }

    /// The body of a taken transition: exits up to the least common
    /// ancestor, the transition's own actions, entries down to the target,
    /// then the state update (possibly through a choice chain).
    fn emit_super_step<D: DiagnosticSink>(
        &self,
        c: &mut CodeBuffer,
        indent: usize,
        source: &State,
        transition: &Transition,
        diags: &mut D,
    ) -> Result<(), GenerateError> {
        let target = self.state(transition.target)?;
        let stop = semantics::lca(self.model, source.id, target.id);

        for exited in semantics::exit_path(self.model, source.id, stop) {
            if self.model.has_exit_behavior(exited.id) {
                c.line(indent, format!("{}();", self.styler.state_exit_action(exited)));
            }
            if self.config.tracing && exited.kind == StateKind::Normal {
                c.line(
                    indent,
                    format!("{}({});", self.styler.trace_exit(), self.styler.state_value(exited)),
                );
            }
        }

        for action in &transition.actions {
            let statement = self.expand_statement(action, diags);
            c.line(indent, statement);
        }

        if target.kind == StateKind::Final {
            // The machine has no representable final state; the source is
            // left and nothing is entered.
            return Ok(());
        }

        let path = semantics::entry_path_via(self.model, target.id, stop);
        self.emit_entry_steps(c, indent, &path, diags);
        match path.deepest() {
            Some(deepest) if deepest.kind == StateKind::Choice => {
                let mut visited: Vec<StateId> = Vec::new();
                self.emit_choice(c, indent, deepest, &mut visited, diags)?;
            }
            Some(deepest) => {
                c.line(indent, format!("state = {};", self.styler.state_value(deepest)));
            }
            None => {
                return Err(GenerateError::Internal(format!(
                    "empty entry path into state '{}'",
                    target.name
                )));
            }
        }
        Ok(())
    }

    fn emit_entry_steps<D: DiagnosticSink>(
        &self,
        c: &mut CodeBuffer,
        indent: usize,
        path: &EntryPath<'_>,
        diags: &mut D,
    ) {
        for step in &path.steps {
            if step.state.kind == StateKind::Choice {
                continue;
            }
            if self.model.has_entry_behavior(step.state.id) {
                c.line(indent, format!("{}();", self.styler.state_entry_action(step.state)));
            }
            if self.config.tracing && step.state.kind == StateKind::Normal {
                c.line(
                    indent,
                    format!(
                        "{}({});",
                        self.styler.trace_enter(),
                        self.styler.state_value(step.state)
                    ),
                );
            }
            for action in step.init_actions {
                let statement = self.expand_statement(action, diags);
                c.line(indent, statement);
            }
        }
    }

    /// Resolve a choice pseudostate: guarded branches in source order, then
    /// the single unguarded default. Targets may be composites or further
    /// choices; recursion continues until a concrete state is reached.
    pub(super) fn emit_choice<D: DiagnosticSink>(
        &self,
        c: &mut CodeBuffer,
        indent: usize,
        choice: &State,
        visited: &mut Vec<StateId>,
        diags: &mut D,
    ) -> Result<(), GenerateError> {
        if visited.contains(&choice.id) {
            diags.report(Diagnostic::error(format!(
                "choice '{}' is part of a choice cycle; resolution truncated",
                choice.name
            )));
            return Ok(());
        }
        // `visited` tracks the current resolution path only; it is popped
        // below so that sibling branches may share a downstream choice.
        visited.push(choice.id);
        let result = self.emit_choice_resolution(c, indent, choice, visited, diags);
        visited.pop();
        result
    }

    fn emit_choice_resolution<D: DiagnosticSink>(
        &self,
        c: &mut CodeBuffer,
        indent: usize,
        choice: &State,
        visited: &mut Vec<StateId>,
        diags: &mut D,
    ) -> Result<(), GenerateError> {
        let branches = semantics::choice_branches(self.model, choice.id);
        if !branches.is_well_formed() {
            diags.report(Diagnostic::error(format!(
                "choice '{}' is malformed; resolution omitted",
                choice.name
            )));
            return Ok(());
        }
        let Some(default) = branches.default else {
            return Err(GenerateError::Internal(format!(
                "well-formed choice '{}' lost its default branch",
                choice.name
            )));
        };

        c.blank();
        c.line(indent, format!("/* Choice: {} */", choice.name));
        for (index, branch) in branches.guarded.iter().enumerate() {
            let guard = branch.guard.as_deref().unwrap_or("true");
            let condition = self.expand_guard(guard, diags);
            c.line(indent, format!("{} ({})", if_else_if(index), condition));
            c.line(indent, "{");
            self.emit_choice_branch(c, indent + 1, choice, branch, visited, diags)?;
            c.line(indent, "}");
        }
        c.line(indent, "else");
        c.line(indent, "{");
        self.emit_choice_branch(c, indent + 1, choice, default, visited, diags)?;
        c.line(indent, "}");
        Ok(())
    }

    fn emit_choice_branch<D: DiagnosticSink>(
        &self,
        c: &mut CodeBuffer,
        indent: usize,
        choice: &State,
        transition: &Transition,
        visited: &mut Vec<StateId>,
        diags: &mut D,
    ) -> Result<(), GenerateError> {
        let target = self.state(transition.target)?;
        c.line(indent, format!("// goto: {}", target.name));

        for action in &transition.actions {
            let statement = self.expand_statement(action, diags);
            c.line(indent, statement);
        }

        if target.kind == StateKind::Final {
            return Ok(());
        }

        let stop = semantics::lca(self.model, choice.id, target.id);
        let path = semantics::entry_path_via(self.model, target.id, stop);
        self.emit_entry_steps(c, indent, &path, diags);
        match path.deepest() {
            Some(deepest) if deepest.kind == StateKind::Choice => {
                self.emit_choice(c, indent, deepest, visited, diags)?;
            }
            Some(deepest) => {
                c.line(indent, format!("state = {};", self.styler.state_value(deepest)));
            }
            None => {
                return Err(GenerateError::Internal(format!(
                    "empty entry path out of choice '{}'",
                    choice.name
                )));
            }
        }
        Ok(())
    }
}
