//! Choice pseudostate resolution, guard expansion and completion arrows.

use plantgen::{Config, VecSink, generate};

const GATE: &str = r#"@startuml

header
model Gate
private var level : int = 0
in event Check : int
out event Granted
endheader

state decide <<choice>>
[*] -> Idle
Idle -> decide : Check
decide -> Open : [${Check} > 10]
decide -> Closed : / ${level} = 0
state Open {
    [*] -> Hot
}
Open : entry / raise Granted
Open -> Idle : after 5 s
Closed -> Idle : Check
@enduml
"#;

fn run_generate(input: &str) -> (String, String, VecSink) {
    let mut header = String::new();
    let mut body = String::new();
    let mut diags = VecSink::new();
    generate(
        input.lines().map(str::to_owned),
        &mut header,
        &mut body,
        &mut diags,
        &Config::default(),
    )
    .expect("generation succeeds");
    (header, body, diags)
}

/// One emitted block, from its signature to the closing brace at column
/// zero.
fn block<'a>(source: &'a str, signature: &str) -> &'a str {
    let start = source
        .find(signature)
        .unwrap_or_else(|| panic!("missing block '{signature}'"));
    let rest = &source[start..];
    &rest[..rest.find("\n}").expect("block is closed")]
}

#[test]
fn guarded_branches_come_before_the_default() {
    let (_, body, _) = run_generate(GATE);
    let start = body.find("/* Choice: decide */").expect("choice is resolved");
    let resolution = &body[start..];

    let guarded = resolution
        .find("if (event.parameter.in_Check > 10)")
        .expect("guard references the event payload");
    let open = resolution
        .find("state = Gate_State::Open_Hot;")
        .expect("guarded branch enters the composite's leaf");
    let default = resolution.find("else").expect("default branch exists");
    let closed = resolution
        .find("state = Gate_State::Closed;")
        .expect("default branch target");

    assert!(guarded < open, "guard is checked before its branch body");
    assert!(open < default, "guarded branches precede the default");
    assert!(default < closed);
}

#[test]
fn default_branch_runs_its_transition_actions() {
    let (_, body, _) = run_generate(GATE);
    let start = body.find("/* Choice: decide */").expect("choice is resolved");
    let resolution = &body[start..];

    let action = resolution
        .find("variables.internal.level = 0;")
        .expect("default branch action is expanded");
    let closed = resolution
        .find("state = Gate_State::Closed;")
        .expect("default branch target");
    assert!(action < closed, "branch actions run before the state update");
}

#[test]
fn entering_a_composite_branch_runs_its_entry_chain() {
    let (_, body, _) = run_generate(GATE);
    let start = body.find("/* Choice: decide */").expect("choice is resolved");
    let resolution = &body[start..];

    let entry = resolution
        .find("state_open_entry_action();")
        .expect("Open's entry action runs on the guarded branch");
    let trace_open = resolution
        .find("trace_state_enter(Gate_State::Open);")
        .expect("Open is traced");
    let trace_hot = resolution
        .find("trace_state_enter(Gate_State::Open_Hot);")
        .expect("Hot is traced");
    assert!(entry < trace_open && trace_open < trace_hot);
}

#[test]
fn out_events_only_feed_the_out_queue() {
    let (header, body, _) = run_generate(GATE);

    assert!(header.contains("enum class Gate_OutEventId"));
    assert!(header.contains("bool is_out_event_raised(Gate_OutEvent& ev);"));

    let raise = block(&body, "void Gate::raise_Granted()");
    assert!(raise.contains("out_event_queue.push_back(event);"));
    assert!(
        !raise.contains("run_cycle();"),
        "out events are drained by the caller, not the machine"
    );

    let checker = block(&body, "bool Gate::is_out_event_raised(Gate_OutEvent& ev)");
    assert!(checker.contains("ev = out_event_queue.front();"));
    assert!(checker.contains("out_event_queue.pop_front();"));
}

#[test]
fn incoming_event_payload_is_stored_on_raise() {
    let (header, body, _) = run_generate(GATE);
    assert!(header.contains("int in_Check;"));
    assert!(body.contains("void Gate::raise_Check(int value)"));
    assert!(body.contains("event.parameter.in_Check = value;"));
}

#[test]
fn choice_without_default_is_diagnosed_and_omitted() {
    let without_default = GATE.replace("decide -> Closed : / ${level} = 0\n", "");
    let (_, body, diags) = run_generate(&without_default);

    assert!(diags.mentions("no default"));
    assert!(
        !body.contains("/* Choice: decide */"),
        "malformed choice must not be resolved"
    );
}

#[test]
fn completion_transition_to_final_exits_unconditionally() {
    const DOOR: &str = r#"@startuml
header
model Door
endheader
[*] -> Active
Active : exit / raise Bye
Active -> [*]
@enduml
"#;
    let (_, body, _) = run_generate(DOOR);
    let react = block(&body, "bool Door::state_active_react");
    let branch = react.find("if (true)").expect("unconditional branch");
    let exit = react
        .find("state_active_exit_action();")
        .expect("source exit runs");
    assert!(branch < exit);
    assert!(
        !react.contains("state = "),
        "a completion into final leaves the state variable untouched"
    );
}

#[test]
fn completion_transition_elsewhere_is_diagnosed_and_omitted() {
    const BAD: &str = r#"@startuml
header
model Odd
endheader
[*] -> A
A -> B : [1 == 1]
B -> A : Go
@enduml
"#;
    let (_, body, diags) = run_generate(BAD);
    assert!(diags.mentions("must target a final state"));
    let react = block(&body, "bool Odd::state_a_react");
    assert!(
        !react.contains("state = Odd_State::B;"),
        "the guard-only arrow between normal states must not be emitted"
    );
}
