//! Path algebra over the state tree: least common ancestors, exit paths
//! and entry paths, checked on the canonical Plugin diagram.

use plantgen::semantics::{entry_path, entry_path_via, exit_path, initial_path, lca};
use plantgen::{Config, Model, NO_PARENT, StateId, VecSink, parse_model};

const PLUGIN: &str = include_str!("fixtures/plugin.puml");

fn plugin_model() -> Model {
    let mut diags = VecSink::new();
    parse_model(
        PLUGIN.lines().map(str::to_owned),
        &mut diags,
        &Config::default(),
    )
}

fn id(model: &Model, name: &str) -> StateId {
    model
        .state_by_name(name)
        .unwrap_or_else(|| panic!("state '{name}' missing"))
        .id
}

#[test]
fn lca_is_symmetric_for_every_state_pair() {
    let model = plugin_model();
    for a in model.states() {
        for b in model.states() {
            assert_eq!(
                lca(&model, a.id, b.id),
                lca(&model, b.id, a.id),
                "lca must not depend on argument order ({}, {})",
                a.name,
                b.name
            );
        }
    }
}

#[test]
fn lca_of_siblings_is_their_parent() {
    let model = plugin_model();
    let check_data = id(&model, "CheckData");
    let add_data = id(&model, "AddData");
    assert_eq!(lca(&model, check_data, add_data), id(&model, "Run"));
}

#[test]
fn lca_across_the_hierarchy_is_the_top() {
    let model = plugin_model();
    let ask = id(&model, "Ask");
    let wait = id(&model, "Wait");
    assert_eq!(lca(&model, ask, wait), NO_PARENT);
    // A self transition is external: nothing above the state is shared.
    assert_eq!(lca(&model, wait, wait), NO_PARENT);
}

#[test]
fn exit_path_walks_innermost_out_and_stops_before_the_lca() {
    let model = plugin_model();
    let ask = id(&model, "Ask");
    let wait = id(&model, "Wait");

    let stop = lca(&model, ask, wait);
    let names: Vec<&str> = exit_path(&model, ask, stop)
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, ["Ask", "AddData", "Run"]);
}

#[test]
fn exit_path_of_a_sibling_transition_is_only_the_source() {
    let model = plugin_model();
    let check_data = id(&model, "CheckData");
    let add_data = id(&model, "AddData");

    let stop = lca(&model, check_data, add_data);
    let names: Vec<&str> = exit_path(&model, check_data, stop)
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, ["CheckData"]);
}

#[test]
fn entry_path_follows_initial_children_outermost_in() {
    let model = plugin_model();
    let run = id(&model, "Run");
    let path = entry_path(&model, run);
    let names: Vec<&str> = path.steps.iter().map(|s| s.state.name.as_str()).collect();
    assert_eq!(names, ["Run", "CheckData"]);
    assert_eq!(path.steps[0].init_actions, ["raise Checking"]);
    assert!(path.steps[1].init_actions.is_empty());
}

#[test]
fn entry_path_into_a_nested_composite_reaches_the_leaf() {
    let model = plugin_model();
    let add_data = id(&model, "AddData");
    let path = entry_path(&model, add_data);
    let names: Vec<&str> = path.steps.iter().map(|s| s.state.name.as_str()).collect();
    assert_eq!(names, ["AddData", "Ask"]);
}

#[test]
fn entry_path_via_enters_skipped_ancestors_first() {
    let model = plugin_model();
    let ask = id(&model, "Ask");
    // Entering Ask from the very top must pass through Run and AddData.
    let path = entry_path_via(&model, ask, NO_PARENT);
    let names: Vec<&str> = path.steps.iter().map(|s| s.state.name.as_str()).collect();
    assert_eq!(names, ["Run", "AddData", "Ask"]);
}

#[test]
fn exit_and_entry_paths_meet_at_the_lca() {
    let model = plugin_model();
    // For every real transition, walking up from the source and down to the
    // target must describe a simple path through the least common ancestor.
    for transition in model.transitions() {
        let Some(source) = model.state_by_id(transition.source) else {
            continue;
        };
        if source.is_pseudostate() {
            continue;
        }
        let stop = lca(&model, transition.source, transition.target);
        for exited in exit_path(&model, transition.source, stop) {
            assert_ne!(exited.id, stop, "the LCA itself is never exited");
        }
        let last_exited = exit_path(&model, transition.source, stop)
            .last()
            .map(|s| s.parent)
            .expect("exit path never empty");
        assert_eq!(last_exited, stop, "exit path must stop right below the LCA");
    }
}

#[test]
fn initial_path_starts_at_the_top_level_initial() {
    let model = plugin_model();
    let path = initial_path(&model).expect("plugin has a top-level initial");
    let names: Vec<&str> = path.steps.iter().map(|s| s.state.name.as_str()).collect();
    assert_eq!(names, ["Wait"]);
    assert!(path.actions.is_empty());
}
