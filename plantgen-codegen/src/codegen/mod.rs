//! Emission of the target-language artifact.
//!
//! The emitter walks a frozen model and produces the C++ header/source pair
//! through two text channels. It is split into:
//! - this module: orchestration, header declarations, init, raise functions,
//!   getters and the tick routine
//! - **react**: the top run cycle, per-state react functions and choice
//!   resolution
//! - **actions**: entry/exit action functions and action-body expansion
//! - **utils**: the indented text buffer and branch-chain helper
//!
//! Unlike the parser, the emitter is assertive: a dangling id or an
//! impossible path is an internal error that aborts generation.

mod actions;
mod react;
mod utils;

use plantgen_core::diag::{Diagnostic, DiagnosticSink, GenerateError};
use plantgen_core::model::{
    DeclKind, Event, EventId, Model, State, StateId, StateKind, Visibility,
};
use plantgen_core::semantics;

use crate::style::Styler;
use crate::{CodeSink, Config};
use utils::CodeBuffer;

pub(crate) struct Emitter<'a> {
    model: &'a Model,
    styler: &'a Styler<'a>,
    config: &'a Config,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(model: &'a Model, styler: &'a Styler<'a>, config: &'a Config) -> Self {
        Self {
            model,
            styler,
            config,
        }
    }

    /// Produce the full artifact. The header channel receives the type and
    /// class declarations, the body channel the implementations.
    pub(crate) fn generate<S, D>(
        &self,
        header: &mut S,
        body: &mut S,
        diags: &mut D,
    ) -> Result<(), GenerateError>
    where
        S: CodeSink,
        D: DiagnosticSink,
    {
        let mut h = CodeBuffer::new();
        let mut c = CodeBuffer::new();

        self.write_header_prelude(&mut h);
        self.decl_state_enum(&mut h);
        self.decl_event_types(&mut h);
        self.decl_variables(&mut h);
        self.decl_trace_callbacks(&mut h);
        self.decl_machine(&mut h);

        self.write_body_prelude(&mut c);
        self.impl_init(&mut c, diags)?;
        self.impl_trace_calls(&mut c);
        self.impl_top_run_cycle(&mut c);
        self.impl_state_reacts(&mut c, diags)?;
        self.impl_entry_actions(&mut c, diags);
        self.impl_exit_actions(&mut c, diags);
        self.impl_raise_in_events(&mut c);
        self.impl_raise_internal_events(&mut c);
        self.impl_raise_out_events(&mut c);
        self.impl_check_out_event(&mut c);
        self.impl_variable_getters(&mut c);
        self.impl_time_tick(&mut c);
        self.report_inert_oncycle(diags);

        header.append(&h.into_text());
        body.append(&c.into_text());
        Ok(())
    }

    // ========== Shared lookups ==========

    pub(super) fn state(&self, id: StateId) -> Result<&'a State, GenerateError> {
        self.model
            .state_by_id(id)
            .ok_or_else(|| GenerateError::Internal(format!("unknown state id {id}")))
    }

    pub(super) fn event(&self, id: EventId) -> Result<&'a Event, GenerateError> {
        self.model
            .event_by_id(id)
            .ok_or_else(|| GenerateError::Internal(format!("unknown event id {id}")))
    }

    /// Time events owned by a state's outgoing transitions, deduplicated and
    /// in declaration order.
    pub(super) fn time_events_from(&self, state: StateId) -> Vec<&'a Event> {
        let mut events: Vec<&Event> = Vec::new();
        for transition in self.model.transitions_from(state) {
            let Some(event) = transition.event.and_then(|id| self.model.event_by_id(id)) else {
                continue;
            };
            if event.is_time_event && !events.iter().any(|e| e.id == event.id) {
                events.push(event);
            }
        }
        events
    }

    pub(super) fn normal_states(&self) -> impl Iterator<Item = &'a State> {
        self.model
            .states()
            .iter()
            .filter(|s| s.kind == StateKind::Normal)
    }

    fn has_time_events(&self) -> bool {
        self.model.time_events().next().is_some()
    }

    fn has_out_events(&self) -> bool {
        self.model.out_events().next().is_some()
    }

    // ========== Header ==========

    fn write_header_prelude(&self, h: &mut CodeBuffer) {
        h.line(0, "/** @file");
        h.line(
            0,
            format!(
                " *  @brief Interface to the {} state machine.",
                self.model.model_name()
            ),
        );
        h.line(0, " *");
        h.line(0, " *  @startuml");
        for line in self.model.uml_lines() {
            h.line(0, format!(" *  {line}"));
        }
        h.line(0, " *  @enduml");
        h.line(0, " */");
        h.blank();

        h.line(0, "#include <cstdint>");
        h.line(0, "#include <cstddef>");
        h.line(0, "#include <functional>");
        h.line(0, "#include <deque>");
        h.line(0, "#include <string>");
        self.write_imports(h);
        h.blank();
    }

    fn write_imports(&self, out: &mut CodeBuffer) {
        for import in self.model.imports() {
            match import.scope {
                plantgen_core::model::ImportScope::Global => {
                    out.line(0, format!("#include <{}>", import.content));
                }
                plantgen_core::model::ImportScope::Local => {
                    out.line(0, format!("#include \"{}\"", import.content));
                }
            }
        }
    }

    fn decl_state_enum(&self, h: &mut CodeBuffer) {
        h.line(0, format!("enum class {}", self.styler.state_enum()));
        h.line(0, "{");
        for state in self.normal_states() {
            h.line(1, format!("{},", self.styler.state_variant(state)));
        }
        h.line(0, "};");
        h.blank();
    }

    fn decl_event_types(&self, h: &mut CodeBuffer) {
        // Out events ride a separate queue since the caller drains them.
        if self.has_out_events() {
            h.line(0, format!("enum class {}", self.styler.out_event_id_enum()));
            h.line(0, "{");
            for event in self.model.out_events() {
                h.line(1, format!("{},", event.name));
            }
            h.line(0, "};");
            h.blank();

            let parametered: Vec<&Event> = self
                .model
                .out_events()
                .filter(|e| e.requires_parameter())
                .collect();
            if !parametered.is_empty() {
                let union_name = self.styler.out_event_data_union();
                h.line(0, format!("union {union_name}"));
                h.line(0, "{");
                for event in &parametered {
                    h.line(
                        1,
                        format!("{} {};", event.parameter_type.as_deref().unwrap_or(""), event.name),
                    );
                }
                h.line(1, format!("{union_name}() = default;"));
                h.line(1, format!("~{union_name}() = default;"));
                h.line(0, "};");
                h.blank();
            }

            let struct_name = self.styler.out_event_struct();
            h.line(0, format!("struct {struct_name}"));
            h.line(0, "{");
            h.line(1, format!("{} id;", self.styler.out_event_id_enum()));
            if !parametered.is_empty() {
                h.line(1, format!("{} parameter;", self.styler.out_event_data_union()));
            }
            h.line(1, format!("{struct_name}() = default;"));
            h.line(1, format!("~{struct_name}() = default;"));
            h.line(0, "};");
            h.blank();
        }

        if self.has_time_events() {
            let record = self.styler.time_event_struct();
            h.line(0, format!("struct {record}"));
            h.line(0, "{");
            h.line(1, "bool isStarted;");
            h.line(1, "bool isPeriodic;");
            h.line(1, "size_t timeout_ms;");
            h.line(1, "size_t expireTime_ms;");
            h.line(1, format!("{record}() = default;"));
            h.line(1, format!("~{record}() = default;"));
            h.line(0, "};");
            h.blank();

            let aggregate = self.styler.time_events_struct();
            h.line(0, format!("struct {aggregate}"));
            h.line(0, "{");
            for event in self.model.time_events() {
                h.line(1, format!("{record} {};", event.name));
            }
            h.line(0, "};");
            h.blank();
        }

        // The run cycle and every react dispatch on the queued-event type,
        // so this surface is emitted even for diagrams without events.
        h.line(0, format!("enum class {}", self.styler.event_id_enum()));
        h.line(0, "{");
        for event in self.model.in_events() {
            h.line(1, format!("{},", self.styler.event_id_variant(event)));
        }
        for event in self.model.time_events() {
            h.line(1, format!("{},", self.styler.event_id_variant(event)));
        }
        for event in self.model.internal_events() {
            h.line(1, format!("{},", self.styler.event_id_variant(event)));
        }
        h.line(0, "};");
        h.blank();

        let parametered: Vec<&Event> = self
            .model
            .in_events()
            .chain(self.model.internal_events())
            .filter(|e| e.requires_parameter())
            .collect();
        if !parametered.is_empty() {
            let union_name = self.styler.event_data_union();
            h.line(0, format!("union {union_name}"));
            h.line(0, "{");
            for event in &parametered {
                h.line(
                    1,
                    format!(
                        "{} {};",
                        event.parameter_type.as_deref().unwrap_or(""),
                        self.styler.event_id_variant(event)
                    ),
                );
            }
            h.line(1, format!("{union_name}() = default;"));
            h.line(1, format!("~{union_name}() = default;"));
            h.line(0, "};");
            h.blank();
        }

        let struct_name = self.styler.event_struct();
        h.line(0, format!("struct {struct_name}"));
        h.line(0, "{");
        h.line(1, format!("{} id;", self.styler.event_id_enum()));
        if !parametered.is_empty() {
            h.line(1, format!("{} parameter;", self.styler.event_data_union()));
        }
        h.line(1, format!("{struct_name}() = default;"));
        h.line(1, format!("~{struct_name}() = default;"));
        h.line(0, "};");
        h.blank();
    }

    fn decl_variables(&self, h: &mut CodeBuffer) {
        let private: Vec<_> = self.model.variables_of(Visibility::Private).collect();
        let public: Vec<_> = self.model.variables_of(Visibility::Public).collect();
        if private.is_empty() && public.is_empty() {
            return;
        }

        let outer = self.styler.variables_struct();
        h.line(0, format!("struct {outer}"));
        h.line(0, "{");

        if !private.is_empty() {
            let inner = self.styler.internal_variables_struct();
            h.line(1, format!("struct {inner}"));
            h.line(1, "{");
            for variable in &private {
                h.line(2, format!("{} {};", variable.ty, variable.name));
            }
            let initializers: Vec<String> =
                private.iter().map(|v| format!("{}()", v.name)).collect();
            h.line(2, format!("{inner}() : {} {{}}", initializers.join(", ")));
            h.line(2, format!("~{inner}() = default;"));
            h.line(1, "} internal;");
        }

        if !public.is_empty() {
            let inner = self.styler.exported_variables_struct();
            h.line(1, format!("struct {inner}"));
            h.line(1, "{");
            for variable in &public {
                h.line(2, format!("{} {};", variable.ty, variable.name));
            }
            let initializers: Vec<String> =
                public.iter().map(|v| format!("{}()", v.name)).collect();
            h.line(2, format!("{inner}() : {} {{}}", initializers.join(", ")));
            h.line(2, format!("~{inner}() = default;"));
            h.line(1, "} exported;");
        }

        let mut initializers = Vec::new();
        if !private.is_empty() {
            initializers.push("internal()".to_owned());
        }
        if !public.is_empty() {
            initializers.push("exported()".to_owned());
        }
        h.line(1, format!("{outer}() : {} {{}}", initializers.join(", ")));
        h.line(1, format!("~{outer}() = default;"));
        h.line(0, "};");
        h.blank();
    }

    fn decl_trace_callbacks(&self, h: &mut CodeBuffer) {
        if !self.config.tracing {
            return;
        }
        h.line(
            0,
            format!(
                "using TraceEntry_t = std::function<void({} state)>;",
                self.styler.state_enum()
            ),
        );
        h.line(
            0,
            format!(
                "using TraceExit_t = std::function<void({} state)>;",
                self.styler.state_enum()
            ),
        );
        h.blank();
    }

    fn decl_machine(&self, h: &mut CodeBuffer) {
        let class = self.styler.machine_class();
        h.line(0, format!("///\\brief State machine base class for {class}."));
        h.line(0, format!("class {class}"));
        h.line(0, "{");
        h.line(0, "private:");
        h.line(1, format!("{} state;", self.styler.state_enum()));
        if self.has_time_events() {
            h.line(1, format!("{} time_events;", self.styler.time_events_struct()));
        }
        h.line(
            1,
            format!("std::deque<{}> event_queue;", self.styler.event_struct()),
        );
        if self.has_out_events() {
            h.line(
                1,
                format!(
                    "std::deque<{}> out_event_queue;",
                    self.styler.out_event_struct()
                ),
            );
        }
        if !self.model.variables().is_empty() {
            h.line(1, format!("{} variables;", self.styler.variables_struct()));
        }
        if self.config.tracing {
            h.line(1, "TraceEntry_t trace_enter_function;");
            h.line(1, "TraceExit_t trace_exit_function;");
        }
        if self.has_time_events() {
            h.line(1, "size_t time_now_ms;");
        }

        h.line(1, format!("void {}();", self.styler.top_run_cycle()));
        if self.config.tracing {
            h.line(
                1,
                format!(
                    "void {}({} state);",
                    self.styler.trace_enter(),
                    self.styler.state_enum()
                ),
            );
            h.line(
                1,
                format!(
                    "void {}({} state);",
                    self.styler.trace_exit(),
                    self.styler.state_enum()
                ),
            );
        }
        for event in self.model.internal_events() {
            h.line(1, format!("void {};", self.raise_signature(event)));
        }
        for event in self.model.out_events() {
            h.line(1, format!("void {};", self.raise_signature(event)));
        }
        for state in self.model.states() {
            if state.kind != StateKind::Initial && self.model.has_entry_behavior(state.id) {
                h.line(1, format!("void {}();", self.styler.state_entry_action(state)));
            }
        }
        for state in self.model.states() {
            if state.kind != StateKind::Initial && self.model.has_exit_behavior(state.id) {
                h.line(1, format!("void {}();", self.styler.state_exit_action(state)));
            }
        }
        for state in self.normal_states() {
            h.line(
                1,
                format!(
                    "bool {}(const {}& event, bool try_transition);",
                    self.styler.state_react(state),
                    self.styler.event_struct()
                ),
            );
        }
        h.blank();

        h.line(0, "public:");
        let mut initializers = vec!["state()".to_owned()];
        if self.has_time_events() {
            initializers.push("time_events()".to_owned());
        }
        initializers.push("event_queue()".to_owned());
        if self.has_out_events() {
            initializers.push("out_event_queue()".to_owned());
        }
        if !self.model.variables().is_empty() {
            initializers.push("variables()".to_owned());
        }
        if self.has_time_events() {
            initializers.push("time_now_ms()".to_owned());
        }
        h.line(1, format!("{class}() : {} {{}}", initializers.join(", ")));
        h.line(1, format!("~{class}() = default;"));
        if self.config.tracing {
            h.line(1, "void set_trace_enter_callback(const TraceEntry_t& enter_cb);");
            h.line(1, "void set_trace_exit_callback(const TraceExit_t& exit_cb);");
            h.line(
                1,
                format!(
                    "static std::string get_state_name({} s);",
                    self.styler.state_enum()
                ),
            );
            h.line(
                1,
                format!("[[nodiscard]] {} get_state() const;", self.styler.state_enum()),
            );
        }
        h.line(1, "void init();");
        if self.has_time_events() {
            h.line(
                1,
                format!("void {}(size_t time_elapsed_ms);", self.styler.time_tick()),
            );
        }
        for event in self.model.in_events() {
            h.line(1, format!("void {};", self.raise_signature(event)));
        }
        if self.has_out_events() {
            h.line(
                1,
                format!(
                    "bool is_out_event_raised({}& ev);",
                    self.styler.out_event_struct()
                ),
            );
        }
        for variable in self.model.variables_of(Visibility::Public) {
            h.line(
                1,
                format!(
                    "[[nodiscard]] {} {}() const;",
                    variable.ty,
                    self.styler.variable_getter(variable)
                ),
            );
        }
        h.line(0, "};");
        h.blank();
    }

    fn raise_signature(&self, event: &Event) -> String {
        let raise = self.styler.event_raise(&event.name);
        match &event.parameter_type {
            Some(ty) => format!("{raise}({ty} value)"),
            None => format!("{raise}()"),
        }
    }

    // ========== Body ==========

    fn write_body_prelude(&self, c: &mut CodeBuffer) {
        let mut file_base = self.model.model_name().to_owned();
        if let Some(first) = file_base.get_mut(0..1) {
            first.make_ascii_lowercase();
        }
        c.line(0, format!("#include \"{file_base}.h\""));
        self.write_imports(c);
        c.blank();
    }

    fn impl_init<D: DiagnosticSink>(
        &self,
        c: &mut CodeBuffer,
        diags: &mut D,
    ) -> Result<(), GenerateError> {
        c.line(0, format!("void {}::init()", self.styler.machine_class()));
        c.line(0, "{");

        c.line(1, "// Initialise variables.");
        let mut any_explicit = false;
        for variable in self.model.variables() {
            let Some(value) = &variable.initial_value else {
                continue;
            };
            let partition = match variable.visibility {
                Visibility::Private => "internal",
                Visibility::Public => "exported",
            };
            c.line(
                1,
                format!("variables.{partition}.{} = {value};", variable.name),
            );
            any_explicit = true;
        }
        if !any_explicit {
            c.line(
                1,
                "// No variables with specific values defined, all initialised to 0.",
            );
        }
        c.blank();

        if let Some(path) = semantics::initial_path(self.model) {
            c.line(1, "// Set initial state.");
            for action in path.actions {
                let statement = self.expand_statement(action, diags);
                c.line(1, statement);
            }
            for step in &path.steps {
                if step.state.kind == StateKind::Choice {
                    continue;
                }
                if self.model.has_entry_behavior(step.state.id) {
                    c.line(1, format!("{}();", self.styler.state_entry_action(step.state)));
                }
                for action in step.init_actions {
                    let statement = self.expand_statement(action, diags);
                    c.line(1, statement);
                }
            }
            match path.steps.last().map(|step| step.state) {
                Some(deepest) if deepest.kind == StateKind::Choice => {
                    let mut visited = Vec::new();
                    self.emit_choice(c, 1, deepest, &mut visited, diags)?;
                }
                Some(deepest) => {
                    c.line(1, format!("state = {};", self.styler.state_value(deepest)));
                    if self.config.tracing {
                        c.line(
                            1,
                            format!(
                                "{}({});",
                                self.styler.trace_enter(),
                                self.styler.state_value(deepest)
                            ),
                        );
                    }
                }
                None => {
                    diags.report(Diagnostic::error(
                        "no resting state reachable from the initial state".to_owned(),
                    ));
                }
            }
        } else {
            diags.report(Diagnostic::error(
                "diagram has no top-level initial state".to_owned(),
            ));
        }
        c.line(0, "}");
        c.blank();
        Ok(())
    }

    fn impl_trace_calls(&self, c: &mut CodeBuffer) {
        if !self.config.tracing {
            return;
        }
        let class = self.styler.machine_class();
        let state_type = self.styler.state_enum();

        c.line(
            0,
            format!(
                "void {class}::{}({state_type} entered_state)",
                self.styler.trace_enter()
            ),
        );
        c.line(0, "{");
        c.line(1, "if (nullptr != trace_enter_function)");
        c.line(1, "{");
        c.line(2, "trace_enter_function(entered_state);");
        c.line(1, "}");
        c.line(0, "}");
        c.blank();

        c.line(
            0,
            format!(
                "void {class}::{}({state_type} exited_state)",
                self.styler.trace_exit()
            ),
        );
        c.line(0, "{");
        c.line(1, "if (nullptr != trace_exit_function)");
        c.line(1, "{");
        c.line(2, "trace_exit_function(exited_state);");
        c.line(1, "}");
        c.line(0, "}");
        c.blank();

        c.line(
            0,
            format!("void {class}::set_trace_enter_callback(const TraceEntry_t& enter_cb)"),
        );
        c.line(0, "{");
        c.line(1, "trace_enter_function = enter_cb;");
        c.line(0, "}");
        c.blank();

        c.line(
            0,
            format!("void {class}::set_trace_exit_callback(const TraceExit_t& exit_cb)"),
        );
        c.line(0, "{");
        c.line(1, "trace_exit_function = exit_cb;");
        c.line(0, "}");
        c.blank();

        c.line(
            0,
            format!("std::string {class}::get_state_name({state_type} s)"),
        );
        c.line(0, "{");
        c.line(1, "switch (s)");
        c.line(1, "{");
        for state in self.normal_states() {
            c.line(2, format!("case {}:", self.styler.state_value(state)));
            c.line(3, format!("return \"{}\";", self.styler.state_variant(state)));
            c.blank();
        }
        c.line(2, "default:");
        c.line(3, "// Invalid state.");
        c.line(3, "return {};");
        c.line(1, "}");
        c.line(0, "}");
        c.blank();

        c.line(0, format!("{state_type} {class}::get_state() const"));
        c.line(0, "{");
        c.line(1, "return state;");
        c.line(0, "}");
        c.blank();
    }

    fn impl_raise_in_events(&self, c: &mut CodeBuffer) {
        for event in self.model.in_events() {
            c.line(
                0,
                format!("void {}::{}", self.styler.machine_class(), self.raise_signature(event)),
            );
            c.line(0, "{");
            c.line(1, format!("{} event {{}};", self.styler.event_struct()));
            c.line(1, format!("event.id = {};", self.styler.event_id_value(event)));
            if event.requires_parameter() {
                c.line(
                    1,
                    format!(
                        "event.parameter.{} = value;",
                        self.styler.event_id_variant(event)
                    ),
                );
            }
            c.line(1, "event_queue.push_back(event);");
            c.line(1, format!("{}();", self.styler.top_run_cycle()));
            c.line(0, "}");
            c.blank();
        }
    }

    /// Internal raises only enqueue: they can only happen from inside an
    /// action, which means a run cycle is already draining the queue and
    /// will pick the event up once the current super-step has finished.
    fn impl_raise_internal_events(&self, c: &mut CodeBuffer) {
        for event in self.model.internal_events() {
            c.line(
                0,
                format!("void {}::{}", self.styler.machine_class(), self.raise_signature(event)),
            );
            c.line(0, "{");
            c.line(1, format!("{} event {{}};", self.styler.event_struct()));
            c.line(1, format!("event.id = {};", self.styler.event_id_value(event)));
            if event.requires_parameter() {
                c.line(
                    1,
                    format!(
                        "event.parameter.{} = value;",
                        self.styler.event_id_variant(event)
                    ),
                );
            }
            c.line(1, "event_queue.push_back(event);");
            c.line(0, "}");
            c.blank();
        }
    }

    fn impl_raise_out_events(&self, c: &mut CodeBuffer) {
        for event in self.model.out_events() {
            c.line(
                0,
                format!("void {}::{}", self.styler.machine_class(), self.raise_signature(event)),
            );
            c.line(0, "{");
            c.line(1, format!("{} event {{}};", self.styler.out_event_struct()));
            c.line(
                1,
                format!(
                    "event.id = {}::{};",
                    self.styler.out_event_id_enum(),
                    event.name
                ),
            );
            if event.requires_parameter() {
                c.line(1, format!("event.parameter.{} = value;", event.name));
            }
            c.line(1, "out_event_queue.push_back(event);");
            c.line(0, "}");
            c.blank();
        }
    }

    fn impl_check_out_event(&self, c: &mut CodeBuffer) {
        if !self.has_out_events() {
            return;
        }
        c.line(
            0,
            format!(
                "bool {}::is_out_event_raised({}& ev)",
                self.styler.machine_class(),
                self.styler.out_event_struct()
            ),
        );
        c.line(0, "{");
        c.line(1, "bool pending = false;");
        c.line(1, "if (!out_event_queue.empty())");
        c.line(1, "{");
        c.line(2, "ev = out_event_queue.front();");
        c.line(2, "out_event_queue.pop_front();");
        c.line(2, "pending = true;");
        c.line(1, "}");
        c.line(1, "return pending;");
        c.line(0, "}");
        c.blank();
    }

    fn impl_variable_getters(&self, c: &mut CodeBuffer) {
        for variable in self.model.variables_of(Visibility::Public) {
            c.line(
                0,
                format!(
                    "{} {}::{}() const",
                    variable.ty,
                    self.styler.machine_class(),
                    self.styler.variable_getter(variable)
                ),
            );
            c.line(0, "{");
            c.line(1, format!("return variables.exported.{};", variable.name));
            c.line(0, "}");
            c.blank();
        }
    }

    fn impl_time_tick(&self, c: &mut CodeBuffer) {
        if !self.has_time_events() {
            return;
        }
        c.line(
            0,
            format!(
                "void {}::{}(size_t time_elapsed_ms)",
                self.styler.machine_class(),
                self.styler.time_tick()
            ),
        );
        c.line(0, "{");
        c.line(1, "time_now_ms += time_elapsed_ms;");
        c.blank();
        for event in self.model.time_events() {
            c.line(1, format!("if (time_events.{}.isStarted)", event.name));
            c.line(1, "{");
            c.line(
                2,
                format!("if (time_events.{}.expireTime_ms <= time_now_ms)", event.name),
            );
            c.line(2, "{");
            c.line(3, "// Time events do not carry any parameter.");
            c.line(3, format!("{} event {{}};", self.styler.event_struct()));
            c.line(3, format!("event.id = {};", self.styler.event_id_value(event)));
            c.line(3, "event_queue.push_back(event);");
            c.blank();
            c.line(3, "// Check for automatic reload.");
            c.line(3, format!("if (time_events.{}.isPeriodic)", event.name));
            c.line(3, "{");
            c.line(
                4,
                format!(
                    "time_events.{0}.expireTime_ms += time_events.{0}.timeout_ms;",
                    event.name
                ),
            );
            c.line(4, format!("time_events.{}.isStarted = true;", event.name));
            c.line(3, "}");
            c.line(3, "else");
            c.line(3, "{");
            c.line(4, format!("time_events.{}.isStarted = false;", event.name));
            c.line(3, "}");
            c.line(2, "}");
            c.line(1, "}");
        }
        c.line(1, format!("{}();", self.styler.top_run_cycle()));
        c.line(0, "}");
        c.blank();
    }

    fn report_inert_oncycle<D: DiagnosticSink>(&self, diags: &mut D) {
        for state in self.model.states() {
            if self
                .model
                .declarations_of(state.id, DeclKind::OnCycle)
                .next()
                .is_some()
            {
                diags.report(Diagnostic::warning(format!(
                    "oncycle action on '{}' is not emitted",
                    state.name
                )));
            }
        }
    }
}
