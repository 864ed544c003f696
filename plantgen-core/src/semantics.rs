//! Derived structure over a frozen model.
//!
//! Everything the emitter needs to know about hierarchy lives here:
//! - entry paths into composites (following `initial` children)
//! - the initial super-step from the top-level `initial` pseudostate
//! - ancestor chains and least common ancestors
//! - exit paths up to (but not including) a common ancestor
//! - choice pseudostate branch ordering
//!
//! All functions take the model by shared reference and return borrowed
//! handles; the model is never mutated during analysis.

use crate::model::{Model, NO_PARENT, State, StateId, StateKind, Transition};

static NO_ACTIONS: [String; 0] = [];

/// One state entered during a super-step, together with the actions of the
/// initial-transition segment taken *out of* it towards the next, deeper
/// step. The deepest step carries no actions.
#[derive(Clone, Debug)]
pub struct EntryStep<'a> {
    pub state: &'a State,
    pub init_actions: &'a [String],
}

/// Ordered list of states entered by one super-step, outermost first.
///
/// When the walk reaches a choice pseudostate the path stops there; choice
/// resolution needs guard data and is performed at emission time.
#[derive(Clone, Debug, Default)]
pub struct EntryPath<'a> {
    pub steps: Vec<EntryStep<'a>>,
}

impl<'a> EntryPath<'a> {
    pub fn deepest(&self) -> Option<&'a State> {
        self.steps.last().map(|step| step.state)
    }

    pub fn ends_in_choice(&self) -> bool {
        self.deepest().is_some_and(|s| s.kind == StateKind::Choice)
    }
}

/// The initial super-step: the actions on the top `[*]` transition plus the
/// entry steps down to the first resting state.
#[derive(Clone, Debug)]
pub struct InitialPath<'a> {
    pub actions: &'a [String],
    pub steps: Vec<EntryStep<'a>>,
}

/// The `initial` child of a composite together with its single outgoing
/// transition and that transition's target.
fn initial_segment<'a>(model: &'a Model, state: StateId) -> Option<(&'a Transition, &'a State)> {
    let initial = model
        .children_of(state)
        .find(|child| child.kind == StateKind::Initial)?;
    let transition = model.transitions_from(initial.id).next()?;
    let target = model.state_by_id(transition.target)?;
    Some((transition, target))
}

/// Entry path into `target`: start at the target and follow `initial`
/// children of composites until a state without one is reached, or until a
/// choice stops the walk.
pub fn entry_path<'a>(model: &'a Model, target: StateId) -> EntryPath<'a> {
    let mut steps = Vec::new();
    let Some(mut state) = model.state_by_id(target) else {
        return EntryPath { steps };
    };

    // Guards against malformed nesting where an initial segment points back
    // into an already-entered state.
    let mut visited: Vec<StateId> = Vec::new();

    loop {
        if visited.contains(&state.id) {
            break;
        }
        visited.push(state.id);

        if state.kind == StateKind::Choice {
            steps.push(EntryStep {
                state,
                init_actions: &NO_ACTIONS,
            });
            break;
        }

        match initial_segment(model, state.id) {
            Some((transition, next)) => {
                steps.push(EntryStep {
                    state,
                    init_actions: &transition.actions,
                });
                state = next;
            }
            None => {
                steps.push(EntryStep {
                    state,
                    init_actions: &NO_ACTIONS,
                });
                break;
            }
        }
    }

    EntryPath { steps }
}

/// Entry path into `target` as seen from outside `stop`: ancestors of the
/// target strictly below `stop` are entered first (outermost first), then the
/// target's own initial chain.
pub fn entry_path_via<'a>(model: &'a Model, target: StateId, stop: StateId) -> EntryPath<'a> {
    let mut prefix = Vec::new();
    let mut current = model
        .state_by_id(target)
        .and_then(|s| model.state_by_id(s.parent));
    while let Some(state) = current {
        if state.id == stop {
            break;
        }
        prefix.push(state);
        current = model.state_by_id(state.parent);
    }
    prefix.reverse();

    let mut steps: Vec<EntryStep<'a>> = prefix
        .into_iter()
        .map(|state| EntryStep {
            state,
            init_actions: &NO_ACTIONS,
        })
        .collect();
    steps.extend(entry_path(model, target).steps);
    EntryPath { steps }
}

/// The initial super-step from the single top-level `initial` pseudostate,
/// or `None` when the diagram has no `[*] -> X` at the top.
pub fn initial_path<'a>(model: &'a Model) -> Option<InitialPath<'a>> {
    let top_initial = model
        .states()
        .iter()
        .find(|s| s.kind == StateKind::Initial && s.parent == NO_PARENT)?;
    let transition = model.transitions_from(top_initial.id).next()?;
    let target = model.state_by_id(transition.target)?;
    Some(InitialPath {
        actions: &transition.actions,
        steps: entry_path(model, target.id).steps,
    })
}

/// Ancestor chain of a state: its parent, grandparent and so on, always
/// ending with [`NO_PARENT`].
pub fn parent_chain(model: &Model, state: StateId) -> Vec<StateId> {
    let mut chain = Vec::new();
    let mut current = model
        .state_by_id(state)
        .map(|s| s.parent)
        .unwrap_or(NO_PARENT);
    loop {
        chain.push(current);
        if current == NO_PARENT {
            break;
        }
        current = model
            .state_by_id(current)
            .map(|s| s.parent)
            .unwrap_or(NO_PARENT);
    }
    chain
}

/// Least common ancestor of two states, computed over their parent chains.
/// Returns [`NO_PARENT`] when nothing but the top is shared. Symmetric in
/// its arguments.
///
/// Because the chains start at the *parents*, a transition targeting an
/// ancestor exits and re-enters that ancestor, and a self-transition is
/// external (exits and re-enters its own state).
pub fn lca(model: &Model, a: StateId, b: StateId) -> StateId {
    let b_chain = parent_chain(model, b);
    for candidate in parent_chain(model, a) {
        if b_chain.contains(&candidate) {
            return candidate;
        }
    }
    NO_PARENT
}

/// States exited when leaving `source` towards `stop`, innermost first.
/// `stop` itself is not included; the source always is.
pub fn exit_path<'a>(model: &'a Model, source: StateId, stop: StateId) -> Vec<&'a State> {
    let mut path = Vec::new();
    let mut current = model.state_by_id(source);
    while let Some(state) = current {
        path.push(state);
        if state.parent == stop {
            break;
        }
        current = model.state_by_id(state.parent);
    }
    path
}

/// Outgoing transitions of a choice pseudostate, split into the ordered
/// guarded branches and the unguarded default.
///
/// A well-formed choice has at least two outgoing transitions and exactly
/// one default; the counts are kept so validation can diagnose violations.
#[derive(Clone, Debug)]
pub struct ChoiceBranches<'a> {
    pub guarded: Vec<&'a Transition>,
    pub default: Option<&'a Transition>,
    pub extra_defaults: usize,
    pub total: usize,
}

impl ChoiceBranches<'_> {
    pub fn is_well_formed(&self) -> bool {
        self.total >= 2 && self.default.is_some() && self.extra_defaults == 0
    }
}

pub fn choice_branches<'a>(model: &'a Model, choice: StateId) -> ChoiceBranches<'a> {
    let mut guarded = Vec::new();
    let mut default = None;
    let mut extra_defaults = 0;
    let mut total = 0;

    for transition in model.transitions_from(choice) {
        total += 1;
        if transition.guard.is_some() {
            guarded.push(transition);
        } else if default.is_none() {
            default = Some(transition);
        } else {
            extra_defaults += 1;
        }
    }

    ChoiceBranches {
        guarded,
        default,
        extra_defaults,
        total,
    }
}
