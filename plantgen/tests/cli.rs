//! End-to-end check of the command-line collaborator: exit codes and the
//! generated file pair.

use std::fs;
use std::process::Command;

const PLUGIN: &str = include_str!("fixtures/plugin.puml");

#[test]
fn generates_the_header_source_pair_in_the_output_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("plugin.puml");
    let outdir = dir.path().join("src-gen");
    fs::write(&input, PLUGIN).expect("write diagram");

    let status = Command::new(env!("CARGO_BIN_EXE_plantgen"))
        .arg(&input)
        .arg("--outdir")
        .arg(&outdir)
        .status()
        .expect("binary runs");
    assert!(status.success());

    let header = fs::read_to_string(outdir.join("plugin.h")).expect("header written");
    let body = fs::read_to_string(outdir.join("plugin.cpp")).expect("source written");
    assert!(header.contains("enum class Plugin_State"));
    assert!(body.contains("#include \"plugin.h\""));
    assert!(body.contains("void Plugin::init()"));
}

#[test]
fn no_tracing_strips_the_trace_surface() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("plugin.puml");
    fs::write(&input, PLUGIN).expect("write diagram");

    let status = Command::new(env!("CARGO_BIN_EXE_plantgen"))
        .arg(&input)
        .arg("--outdir")
        .arg(dir.path())
        .arg("--no-tracing")
        .status()
        .expect("binary runs");
    assert!(status.success());

    let header = fs::read_to_string(dir.path().join("plugin.h")).expect("header written");
    let body = fs::read_to_string(dir.path().join("plugin.cpp")).expect("source written");
    assert!(!header.contains("TraceEntry_t"));
    assert!(!body.contains("trace_state_enter"));
}

#[test]
fn missing_input_file_fails_with_a_nonzero_exit_code() {
    let dir = tempfile::tempdir().expect("temp dir");
    let status = Command::new(env!("CARGO_BIN_EXE_plantgen"))
        .arg(dir.path().join("does-not-exist.puml"))
        .status()
        .expect("binary runs");
    assert!(!status.success());
}

#[test]
fn model_name_falls_back_to_the_file_stem() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("conveyor.puml");
    // Same diagram, but without the `model` directive.
    let anonymous = PLUGIN.replace("model Plugin\n", "");
    fs::write(&input, anonymous).expect("write diagram");

    let status = Command::new(env!("CARGO_BIN_EXE_plantgen"))
        .arg(&input)
        .arg("--outdir")
        .arg(dir.path())
        .status()
        .expect("binary runs");
    assert!(status.success());

    let header = fs::read_to_string(dir.path().join("conveyor.h")).expect("header written");
    assert!(header.contains("enum class Conveyor_State"));
}
