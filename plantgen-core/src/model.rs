//! Type definitions for the state machine model.
//!
//! This module contains the data structures that make up the intermediate
//! representation of a parsed diagram, including:
//! - State, Event, Transition: the machine's structure
//! - Declaration: entry/exit/oncycle actions and comment decorations
//! - Variable and Import: the header/footer interface declarations
//! - Model: the root store owning every collection
//!
//! Entities refer to each other by monotonically-assigned integer ids rather
//! than by reference, which keeps the model trivially clonable and lets
//! lookups hand out borrows whose validity spans the model's lifetime.

use std::collections::HashSet;

/// Identifier of a state. Id 0 is reserved and means "no parent".
pub type StateId = u32;

/// Identifier of an event.
pub type EventId = u32;

/// Parent id carried by states declared at the top level of the diagram.
pub const NO_PARENT: StateId = 0;

/// Role of a state in the machine.
///
/// Only `Normal` states are representable at runtime; the other three are
/// pseudostates that exist to describe structure (`Initial`, `Final`) or
/// transient branching (`Choice`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    Normal,
    Initial,
    Final,
    Choice,
}

/// A state parsed from the diagram body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub id: StateId,
    pub name: String,
    pub parent: StateId,
    pub kind: StateKind,
}

impl State {
    /// True for initial/final/choice states, which never appear in the
    /// generated state enumeration.
    pub fn is_pseudostate(&self) -> bool {
        self.kind != StateKind::Normal
    }
}

/// Direction of an event relative to the generated machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventDirection {
    Incoming,
    Outgoing,
    Internal,
}

/// An event declaration, either written in the header/footer or synthesized
/// from a timed transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub direction: EventDirection,
    /// Payload type passed through verbatim to the target language.
    pub parameter_type: Option<String>,
    pub is_time_event: bool,
    /// Reload behavior of a time event: `every` reloads, `after` fires once.
    pub is_periodic: bool,
    /// Expiry of a time event in milliseconds.
    pub expire_ms: u64,
}

impl Event {
    pub fn requires_parameter(&self) -> bool {
        self.parameter_type.is_some()
    }
}

/// A transition between two states.
///
/// `event == None` marks a completion transition: the segment out of an
/// initial pseudostate, a guarded branch out of a choice, or an unconditional
/// arrow into a final state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub source: StateId,
    pub target: StateId,
    pub event: Option<EventId>,
    pub guard: Option<String>,
    /// Action statements carried on the arrow, in declaration order.
    pub actions: Vec<String>,
}

/// Kind of a state-attached declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Entry,
    Exit,
    OnCycle,
    Comment,
}

/// An entry/exit/oncycle action body or a comment decoration on a state.
///
/// The body is kept verbatim; `${var}` and `raise X` forms inside it are
/// rewritten during emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub state: StateId,
    pub kind: DeclKind,
    pub body: String,
}

/// Visibility of a machine variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
}

/// A typed variable owned by the generated machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    /// Opaque type string passed through to the target language.
    pub ty: String,
    pub visibility: Visibility,
    pub initial_value: Option<String>,
}

/// Include scope of an import declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportScope {
    Global,
    Local,
}

/// A verbatim include passed through to the emitted prelude.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub content: String,
    pub scope: ImportScope,
}

/// The in-memory intermediate representation of one diagram.
///
/// The model is constructed empty, grown append-only by the parser, then
/// frozen (used by shared reference) for semantic analysis and emission.
/// Entities are never removed. Id allocation lives here so that every model
/// starts counting from 1 and tests stay isolated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    model_name: String,
    states: Vec<State>,
    events: Vec<Event>,
    transitions: Vec<Transition>,
    declarations: Vec<Declaration>,
    variables: Vec<Variable>,
    imports: Vec<Import>,
    uml_lines: Vec<String>,
    next_state_id: StateId,
    next_event_id: EventId,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model name, capitalizing the first character.
    pub fn set_model_name(&mut self, name: &str) {
        self.model_name = capitalize_first(name);
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn has_model_name(&self) -> bool {
        !self.model_name.is_empty()
    }

    pub fn add_uml_line(&mut self, line: &str) {
        self.uml_lines.push(line.to_owned());
    }

    pub fn uml_lines(&self) -> &[String] {
        &self.uml_lines
    }

    /// Add a state, or return the existing one under the dedup rules:
    /// `initial`/`final` are unique per parent, every other name is unique
    /// across the whole model. The first definition always wins.
    ///
    /// Returns the state id and whether a new state was created.
    pub fn add_state(&mut self, name: &str, parent: StateId, kind: StateKind) -> (StateId, bool) {
        let special = name == "initial" || name == "final";
        let existing = self.states.iter().find(|s| {
            if special {
                s.name == name && s.parent == parent
            } else {
                s.name == name
            }
        });
        if let Some(state) = existing {
            return (state.id, false);
        }

        self.next_state_id += 1;
        let id = self.next_state_id;
        self.states.push(State {
            id,
            name: name.to_owned(),
            parent,
            kind,
        });
        (id, true)
    }

    /// Add a plain event, or return the existing one of the same name.
    /// The first definition wins, matching the reader's dedup rule.
    pub fn add_event(
        &mut self,
        name: &str,
        direction: EventDirection,
        parameter_type: Option<String>,
    ) -> (EventId, bool) {
        if let Some(event) = self.events.iter().find(|e| e.name == name) {
            return (event.id, false);
        }

        self.next_event_id += 1;
        let id = self.next_event_id;
        self.events.push(Event {
            id,
            name: name.to_owned(),
            direction,
            parameter_type,
            is_time_event: false,
            is_periodic: false,
            expire_ms: 0,
        });
        (id, true)
    }

    /// Add a synthesized time event. Time events never carry parameters and
    /// have no direction semantics beyond firing into the machine.
    pub fn add_time_event(&mut self, name: &str, expire_ms: u64, periodic: bool) -> (EventId, bool) {
        if let Some(event) = self.events.iter().find(|e| e.name == name) {
            return (event.id, false);
        }

        self.next_event_id += 1;
        let id = self.next_event_id;
        self.events.push(Event {
            id,
            name: name.to_owned(),
            direction: EventDirection::Incoming,
            parameter_type: None,
            is_time_event: true,
            is_periodic: periodic,
            expire_ms,
        });
        (id, true)
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn add_declaration(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    /// Add a variable. Returns false without storing when the name is taken.
    pub fn add_variable(&mut self, variable: Variable) -> bool {
        if self.variables.iter().any(|v| v.name == variable.name) {
            return false;
        }
        self.variables.push(variable);
        true
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    // ========== Lookups ==========

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_by_id(&self, id: StateId) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }

    pub fn state_by_name(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn children_of(&self, id: StateId) -> impl Iterator<Item = &State> {
        self.states.iter().filter(move |s| s.parent == id && s.id != id)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event_by_id(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn event_by_name(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Incoming events, excluding time events, in declaration order.
    pub fn in_events(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| !e.is_time_event && e.direction == EventDirection::Incoming)
    }

    pub fn out_events(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| !e.is_time_event && e.direction == EventDirection::Outgoing)
    }

    pub fn internal_events(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| !e.is_time_event && e.direction == EventDirection::Internal)
    }

    pub fn time_events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_time_event)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Outgoing transitions of a state, in declaration order.
    pub fn transitions_from(&self, state: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.source == state)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn declarations_of(&self, state: StateId, kind: DeclKind) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(move |d| d.state == state && d.kind == kind)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable_by_name(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variables_of(&self, visibility: Visibility) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(move |v| v.visibility == visibility)
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    // ========== Derived predicates ==========

    /// Whether a state needs an entry action function: either it declares one
    /// or it owns a timed transition whose timer must be started on entry.
    pub fn has_entry_behavior(&self, state: StateId) -> bool {
        self.declarations_of(state, DeclKind::Entry).next().is_some()
            || self.has_time_event_from(state)
    }

    /// Whether a state needs an exit action function: either it declares one
    /// or it owns a timed transition whose timer must be stopped on exit.
    pub fn has_exit_behavior(&self, state: StateId) -> bool {
        self.declarations_of(state, DeclKind::Exit).next().is_some()
            || self.has_time_event_from(state)
    }

    fn has_time_event_from(&self, state: StateId) -> bool {
        self.transitions_from(state).any(|t| {
            t.event
                .and_then(|id| self.event_by_id(id))
                .is_some_and(|e| e.is_time_event)
        })
    }

    /// Variable names mentioned as `${name}` anywhere an expansion happens:
    /// action declaration bodies, transition guards or transition actions.
    pub fn referenced_variable_names(&self) -> HashSet<&str> {
        let mut referenced = HashSet::new();
        for variable in &self.variables {
            let needle = format!("${{{}}}", variable.name);
            let mentioned = self
                .declarations
                .iter()
                .any(|d| d.kind != DeclKind::Comment && d.body.contains(&needle))
                || self.transitions.iter().any(|t| {
                    t.guard.as_deref().is_some_and(|g| g.contains(&needle))
                        || t.actions.iter().any(|a| a.contains(&needle))
                });
            if mentioned {
                referenced.insert(variable.name.as_str());
            }
        }
        referenced
    }
}

/// Uppercase the first character, leaving the rest untouched.
pub(crate) fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
