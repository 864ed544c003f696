//! Naming strategy for the emitted artifact.
//!
//! Pure functions over (model, entity). In nested mode a state's base
//! identifier is its parent's base joined with `_`; in simple mode only the
//! leaf name is used. Stateless apart from configuration.

use plantgen_core::model::{Event, EventDirection, Model, State, Variable};

pub struct Styler<'a> {
    model: &'a Model,
    simple_names: bool,
}

impl<'a> Styler<'a> {
    pub fn new(model: &'a Model, simple_names: bool) -> Self {
        Self {
            model,
            simple_names,
        }
    }

    /// Base identifier of a state: each segment's first letter uppercased,
    /// parent-qualified unless simple names are configured.
    pub fn state_base(&self, state: &State) -> String {
        let mut base = String::new();
        if !self.simple_names {
            if let Some(parent) = self.model.state_by_id(state.parent) {
                base = self.state_base(parent);
                base.push('_');
            }
        }
        base + &capitalize_first(&state.name)
    }

    /// The bare enum variant, e.g. `Run_CheckData`.
    pub fn state_variant(&self, state: &State) -> String {
        self.state_base(state)
    }

    /// The scoped enum value, e.g. `Plugin_State::Run_CheckData`.
    pub fn state_value(&self, state: &State) -> String {
        format!("{}::{}", self.state_enum(), self.state_base(state))
    }

    pub fn state_enum(&self) -> String {
        format!("{}_State", self.model.model_name())
    }

    pub fn state_react(&self, state: &State) -> String {
        format!("state_{}_react", lower_first(&self.state_base(state)))
    }

    pub fn state_entry_action(&self, state: &State) -> String {
        format!("state_{}_entry_action", lower_first(&self.state_base(state)))
    }

    pub fn state_exit_action(&self, state: &State) -> String {
        format!("state_{}_exit_action", lower_first(&self.state_base(state)))
    }

    pub fn event_raise(&self, event_name: &str) -> String {
        format!("raise_{event_name}")
    }

    /// Variant of an event in the queued-event id enumeration, prefixed by
    /// its kind: `in_*`, `time_*` or `internal_*`.
    pub fn event_id_variant(&self, event: &Event) -> String {
        if event.is_time_event {
            format!("time_{}", event.name)
        } else {
            match event.direction {
                EventDirection::Incoming => format!("in_{}", event.name),
                EventDirection::Internal => format!("internal_{}", event.name),
                EventDirection::Outgoing => format!("out_{}", event.name),
            }
        }
    }

    pub fn event_id_value(&self, event: &Event) -> String {
        format!("{}::{}", self.event_id_enum(), self.event_id_variant(event))
    }

    pub fn variable_getter(&self, variable: &Variable) -> String {
        format!("get_{}", variable.name)
    }

    pub fn top_run_cycle(&self) -> &'static str {
        "run_cycle"
    }

    pub fn time_tick(&self) -> &'static str {
        "time_tick"
    }

    pub fn trace_enter(&self) -> &'static str {
        "trace_state_enter"
    }

    pub fn trace_exit(&self) -> &'static str {
        "trace_state_exit"
    }

    // ========== Aggregate type names ==========

    pub fn machine_class(&self) -> &str {
        self.model.model_name()
    }

    pub fn event_struct(&self) -> String {
        format!("{}_Event", self.model.model_name())
    }

    pub fn event_id_enum(&self) -> String {
        format!("{}_EventId", self.model.model_name())
    }

    pub fn event_data_union(&self) -> String {
        format!("{}_EventData", self.model.model_name())
    }

    pub fn out_event_struct(&self) -> String {
        format!("{}_OutEvent", self.model.model_name())
    }

    pub fn out_event_id_enum(&self) -> String {
        format!("{}_OutEventId", self.model.model_name())
    }

    pub fn out_event_data_union(&self) -> String {
        format!("{}_OutEventData", self.model.model_name())
    }

    pub fn time_event_struct(&self) -> String {
        format!("{}_TimeEvent", self.model.model_name())
    }

    pub fn time_events_struct(&self) -> String {
        format!("{}_TimeEvents", self.model.model_name())
    }

    pub fn variables_struct(&self) -> String {
        format!("{}_Variables", self.model.model_name())
    }

    pub fn internal_variables_struct(&self) -> String {
        format!("{}_InternalVariables", self.model.model_name())
    }

    pub fn exported_variables_struct(&self) -> String {
        format!("{}_ExportedVariables", self.model.model_name())
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
