//! Validation of a frozen model.
//!
//! Runs once between parsing and emission and checks everything the grammar
//! cannot express:
//! - initial pseudostates have exactly one outgoing transition
//! - final pseudostates have none
//! - choices have at least two branches and exactly one default
//! - completion transitions from normal states target a final state
//! - events used on transitions are not outgoing
//! - unreachable states and unreferenced variables
//!
//! All findings are reported through the diagnostic sink; nothing here
//! aborts generation. The emitter independently omits whatever is reported
//! as a semantic error.

use std::collections::HashSet;

use crate::diag::{Diagnostic, DiagnosticSink};
use crate::model::{EventDirection, Model, NO_PARENT, StateId, StateKind};
use crate::semantics::{choice_branches, initial_path};

pub fn validate<D: DiagnosticSink>(model: &Model, diags: &mut D) {
    for state in model.states() {
        let outgoing = model.transitions_from(state.id).count();
        match state.kind {
            StateKind::Initial => {
                if outgoing == 0 {
                    diags.report(Diagnostic::error(format!(
                        "initial state under '{}' has no outgoing transition",
                        parent_name(model, state.parent)
                    )));
                } else if outgoing > 1 {
                    diags.report(Diagnostic::error(format!(
                        "initial state under '{}' has {} outgoing transitions, all but the first are ignored",
                        parent_name(model, state.parent),
                        outgoing
                    )));
                }
            }
            StateKind::Final => {
                if outgoing > 0 {
                    diags.report(Diagnostic::error(format!(
                        "final state under '{}' must not have outgoing transitions",
                        parent_name(model, state.parent)
                    )));
                }
            }
            StateKind::Choice => {
                let branches = choice_branches(model, state.id);
                if branches.total < 2 {
                    diags.report(Diagnostic::error(format!(
                        "choice '{}' needs at least two outgoing transitions",
                        state.name
                    )));
                }
                if branches.default.is_none() {
                    diags.report(Diagnostic::error(format!(
                        "choice '{}' has no default (unguarded) branch",
                        state.name
                    )));
                } else if branches.extra_defaults > 0 {
                    diags.report(Diagnostic::error(format!(
                        "choice '{}' has more than one unguarded branch",
                        state.name
                    )));
                }
            }
            StateKind::Normal => {
                for transition in model.transitions_from(state.id) {
                    if transition.event.is_none() {
                        let target_is_final = model
                            .state_by_id(transition.target)
                            .is_some_and(|t| t.kind == StateKind::Final);
                        if !target_is_final {
                            diags.report(Diagnostic::error(format!(
                                "completion transition from '{}' must target a final state; transition omitted",
                                state.name
                            )));
                        }
                    }
                }
            }
        }
    }

    for transition in model.transitions() {
        let Some(event) = transition.event.and_then(|id| model.event_by_id(id)) else {
            continue;
        };
        if !event.is_time_event && event.direction == EventDirection::Outgoing {
            diags.report(Diagnostic::error(format!(
                "outgoing event '{}' cannot trigger a transition; transition omitted",
                event.name
            )));
        }
    }

    report_unreachable_states(model, diags);
    report_unreferenced_variables(model, diags);
}

fn parent_name(model: &Model, parent: StateId) -> String {
    model
        .state_by_id(parent)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "top".to_owned())
}

/// A normal state is reachable when it is the target of some transition, an
/// ancestor of a reachable state, or on the initial entry path.
fn report_unreachable_states<D: DiagnosticSink>(model: &Model, diags: &mut D) {
    let mut reachable: HashSet<StateId> = HashSet::new();

    if let Some(path) = initial_path(model) {
        for step in &path.steps {
            reachable.insert(step.state.id);
        }
    }
    for transition in model.transitions() {
        reachable.insert(transition.target);
    }

    // Entering a state implicitly keeps every ancestor active.
    let mut with_ancestors = reachable.clone();
    for id in &reachable {
        let mut current = model.state_by_id(*id).map(|s| s.parent);
        while let Some(parent) = current {
            if parent == NO_PARENT || !with_ancestors.insert(parent) {
                break;
            }
            current = model.state_by_id(parent).map(|s| s.parent);
        }
    }

    for state in model.states() {
        if state.kind == StateKind::Normal && !with_ancestors.contains(&state.id) {
            diags.report(Diagnostic::warning(format!(
                "state '{}' is unreachable",
                state.name
            )));
        }
    }
}

fn report_unreferenced_variables<D: DiagnosticSink>(model: &Model, diags: &mut D) {
    let referenced = model.referenced_variable_names();
    for variable in model.variables() {
        if !referenced.contains(variable.name.as_str()) {
            diags.report(Diagnostic::warning(format!(
                "variable '{}' is never referenced",
                variable.name
            )));
        }
    }
}
