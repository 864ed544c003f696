//! Emission checks against the canonical Plugin diagram.
//!
//! These tests pin the observable contracts of the generated machine: the
//! declared surface, the ordering of exit/action/entry sequences inside the
//! per-state reacts, and the timer lifecycle.

use plantgen::{Config, VecSink, generate};

const PLUGIN: &str = include_str!("fixtures/plugin.puml");

fn generate_plugin() -> (String, String, VecSink) {
    let mut header = String::new();
    let mut body = String::new();
    let mut diags = VecSink::new();
    generate(
        PLUGIN.lines().map(str::to_owned),
        &mut header,
        &mut body,
        &mut diags,
        &Config::default(),
    )
    .expect("generation succeeds");
    (header, body, diags)
}

/// The text of one emitted block (function, enum or class), from its
/// signature to the closing brace at column zero.
fn function_body<'a>(source: &'a str, signature: &str) -> &'a str {
    let start = source
        .find(signature)
        .unwrap_or_else(|| panic!("missing block '{signature}'"));
    let rest = &source[start..];
    let end = rest.find("\n}").expect("block is closed");
    &rest[..end]
}

/// Assert that every needle occurs, and in the given order.
fn assert_ordered(haystack: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        let position = haystack[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("'{needle}' missing or out of order in:\n{haystack}"));
        from += position + needle.len();
    }
}

#[test]
fn state_enum_lists_every_non_pseudostate_once() {
    let (header, _, _) = generate_plugin();
    let enum_decl = function_body(&header, "enum class Plugin_State");
    let variants: Vec<&str> = enum_decl
        .lines()
        .skip(2)
        .map(|l| l.trim().trim_end_matches(','))
        .collect();
    assert_eq!(
        variants,
        [
            "Wait",
            "Run",
            "Run_CheckData",
            "Run_AddData",
            "Run_AddData_Ask",
            "Run_Write"
        ]
    );
}

#[test]
fn event_id_enum_is_prefixed_by_kind() {
    let (header, _, _) = generate_plugin();
    let enum_decl = function_body(&header, "enum class Plugin_EventId");
    for variant in [
        "in_Start",
        "in_Abort",
        "in_Reset",
        "time_Wait_every_30s",
        "time_Write_after_1s",
        "internal_Checking",
        "internal_Checked",
        "internal_More",
        "internal_Whatever",
        "internal_Stopped",
    ] {
        assert!(enum_decl.contains(variant), "missing variant {variant}");
    }
    // No event carries a payload, so there must be no data union.
    assert!(!header.contains("Plugin_EventData"));
}

#[test]
fn machine_class_exposes_the_public_surface() {
    let (header, _, _) = generate_plugin();
    let class = function_body(&header, "class Plugin\n");
    for declaration in [
        "void init();",
        "void time_tick(size_t time_elapsed_ms);",
        "void raise_Start();",
        "void raise_Abort();",
        "void raise_Reset();",
        "[[nodiscard]] bool get_timeout() const;",
        "void set_trace_enter_callback(const TraceEntry_t& enter_cb);",
        "static std::string get_state_name(Plugin_State s);",
    ] {
        assert!(class.contains(declaration), "missing '{declaration}'");
    }
    // No out events in the diagram, so no out queue surface.
    assert!(!class.contains("is_out_event_raised"));
}

#[test]
fn init_enters_the_first_state_and_traces_it_once() {
    let (_, body, _) = generate_plugin();
    let init = function_body(&body, "void Plugin::init()");
    assert_ordered(
        init,
        &[
            "variables.exported.timeout = false;",
            "state_wait_entry_action();",
            "state = Plugin_State::Wait;",
            "trace_state_enter(Plugin_State::Wait);",
        ],
    );
    assert_eq!(init.matches("trace_state_enter").count(), 1);
}

#[test]
fn timed_self_loop_restarts_its_own_timer() {
    let (_, body, _) = generate_plugin();
    let react = function_body(&body, "bool Plugin::state_wait_react");
    assert_ordered(
        react,
        &[
            "if (Plugin_EventId::time_Wait_every_30s == event.id)",
            "state_wait_exit_action();",
            "trace_state_exit(Plugin_State::Wait);",
            "variables.exported.timeout = true;",
            "variables.internal.canGetData = false;",
            "state_wait_entry_action();",
            "trace_state_enter(Plugin_State::Wait);",
            "state = Plugin_State::Wait;",
        ],
    );

    let entry = function_body(&body, "void Plugin::state_wait_entry_action()");
    assert_ordered(
        entry,
        &[
            "time_events.Wait_every_30s.timeout_ms = 30000;",
            "time_events.Wait_every_30s.expireTime_ms = time_now_ms + 30000;",
            "time_events.Wait_every_30s.isPeriodic = true;",
            "time_events.Wait_every_30s.isStarted = true;",
        ],
    );

    let exit = function_body(&body, "void Plugin::state_wait_exit_action()");
    assert!(exit.contains("time_events.Wait_every_30s.isStarted = false;"));
}

#[test]
fn super_step_into_composite_orders_exit_entry_and_raise() {
    let (_, body, _) = generate_plugin();
    let react = function_body(&body, "bool Plugin::state_wait_react");
    assert_ordered(
        react,
        &[
            "if (Plugin_EventId::in_Start == event.id)",
            "state_wait_exit_action();",
            "trace_state_enter(Plugin_State::Run);",
            "raise_Checking();",
            "state_run_CheckData_entry_action();",
            "trace_state_enter(Plugin_State::Run_CheckData);",
            "state = Plugin_State::Run_CheckData;",
        ],
    );
}

#[test]
fn internal_raise_enqueues_without_recursing_into_the_drain() {
    let (_, body, _) = generate_plugin();

    // Incoming raises drive a full run-to-completion cycle.
    let start = function_body(&body, "void Plugin::raise_Start()");
    assert_ordered(start, &["event_queue.push_back(event);", "run_cycle();"]);

    // Internal raises happen from inside actions while a drain is already
    // active; they only enqueue, and the same drain picks them up.
    let checked = function_body(&body, "void Plugin::raise_Checked()");
    assert!(checked.contains("event_queue.push_back(event);"));
    assert!(!checked.contains("run_cycle();"));
}

#[test]
fn abort_exits_innermost_first_up_to_the_root() {
    let (_, body, _) = generate_plugin();
    let react = function_body(&body, "bool Plugin::state_run_AddData_Ask_react");

    // Inherited transitions are matched before local ones.
    assert!(react.contains("if (!state_run_AddData_react(event, try_transition))"));

    assert_ordered(
        react,
        &[
            "if (Plugin_EventId::in_Abort == event.id)",
            "state_run_AddData_Ask_exit_action();",
            "trace_state_exit(Plugin_State::Run_AddData_Ask);",
            "state_run_AddData_exit_action();",
            "trace_state_exit(Plugin_State::Run_AddData);",
            "state_run_exit_action();",
            "trace_state_exit(Plugin_State::Run);",
            "variables.internal.canGetData = false;",
            "state_wait_entry_action();",
            "state = Plugin_State::Wait;",
        ],
    );
}

#[test]
fn run_cycle_drains_the_queue_in_fifo_order() {
    let (_, body, _) = generate_plugin();
    let cycle = function_body(&body, "void Plugin::run_cycle()");
    assert_ordered(
        cycle,
        &[
            "while (!event_queue.empty())",
            "auto event = event_queue.front();",
            "event_queue.pop_front();",
            "switch (state)",
            "case Plugin_State::Wait:",
            "state_wait_react(event, true);",
        ],
    );
}

#[test]
fn periodic_timers_reload_and_one_shots_stop() {
    let (_, body, _) = generate_plugin();
    let tick = function_body(&body, "void Plugin::time_tick(size_t time_elapsed_ms)");
    assert_ordered(
        tick,
        &[
            "time_now_ms += time_elapsed_ms;",
            "if (time_events.Wait_every_30s.isStarted)",
            "if (time_events.Wait_every_30s.expireTime_ms <= time_now_ms)",
            "time_events.Wait_every_30s.expireTime_ms += time_events.Wait_every_30s.timeout_ms;",
            "if (time_events.Write_after_1s.isStarted)",
            "time_events.Write_after_1s.isStarted = false;",
            "run_cycle();",
        ],
    );
}

#[test]
fn reacts_reference_each_transition_target_exactly_once() {
    let (_, body, _) = generate_plugin();
    let react = function_body(&body, "bool Plugin::state_run_CheckData_react");
    assert_ordered(
        react,
        &[
            "if (Plugin_EventId::internal_Checked == event.id)",
            "state_run_AddData_entry_action();",
            "state = Plugin_State::Run_AddData_Ask;",
        ],
    );
}

#[test]
fn simple_names_drop_the_parent_qualification() {
    let mut header = String::new();
    let mut body = String::new();
    let mut diags = VecSink::new();
    let config = Config {
        simple_names: true,
        ..Config::default()
    };
    generate(
        PLUGIN.lines().map(str::to_owned),
        &mut header,
        &mut body,
        &mut diags,
        &config,
    )
    .expect("generation succeeds");

    let enum_decl = function_body(&header, "enum class Plugin_State");
    assert!(enum_decl.contains("CheckData,"));
    assert!(!enum_decl.contains("Run_CheckData"));
    assert!(body.contains("bool Plugin::state_checkData_react"));
}

#[test]
fn child_first_consults_the_parent_as_fallback() {
    let mut header = String::new();
    let mut body = String::new();
    let mut diags = VecSink::new();
    let config = Config {
        parent_first_execution: false,
        ..Config::default()
    };
    generate(
        PLUGIN.lines().map(str::to_owned),
        &mut header,
        &mut body,
        &mut diags,
        &config,
    )
    .expect("generation succeeds");

    let react = function_body(&body, "bool Plugin::state_run_AddData_Ask_react");
    // Local transitions are tried first; the parent react is the fallback.
    assert!(!react.contains("if (!state_run_AddData_react(event, try_transition))"));
    let local = react
        .find("if (Plugin_EventId::in_Abort == event.id)")
        .expect("local transition still emitted");
    let fallback = react
        .find("did_transition = state_run_AddData_react(event, try_transition);")
        .expect("parent react as fallback");
    assert!(local < fallback);
}

#[test]
fn emission_is_deterministic() {
    let (header_a, body_a, _) = generate_plugin();
    let (header_b, body_b, _) = generate_plugin();
    assert_eq!(header_a, header_b);
    assert_eq!(body_a, body_b);
}

#[test]
fn header_echoes_the_diagram_source() {
    let (header, _, _) = generate_plugin();
    assert!(header.contains(" *  @startuml"));
    assert!(header.contains(" *  Wait -down-> Run : Start"));
    assert!(header.contains(" *  @enduml"));
}
