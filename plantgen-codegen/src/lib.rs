//! PlantUML to C++ state machine generation pipeline.
//!
//! The pipeline has four stages, each in its own module:
//!
//! - **lexer**: whitespace tokenization of one line
//! - **parser**: grows the model from the token stream
//! - **style**: maps model entities to target-language identifiers
//! - **codegen**: emits the header/source pair
//!
//! [`generate`] wires them together: parse, validate, then emit. Everything
//! recoverable is reported through the caller's diagnostic sink; only
//! internal invariant violations abort with a [`GenerateError`].

pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod style;

use plantgen_core::diag::{Diagnostic, DiagnosticSink, GenerateError, Severity};
use plantgen_core::model::Model;
use plantgen_core::validation::validate;

use codegen::Emitter;
use parser::Parser;
use style::Styler;

/// Generation options, one field per knob the external collaborator exposes.
#[derive(Clone, Debug)]
pub struct Config {
    /// Log every parsed entity while reading the diagram.
    pub verbose: bool,
    /// Emit the trace hooks and the state-name helper.
    pub tracing: bool,
    /// Name states by their leaf name only instead of parent-qualified.
    pub simple_names: bool,
    /// Dispatch events to the parent react before local transitions.
    pub parent_first_execution: bool,
    /// Model name to use when the diagram has no `model` directive,
    /// typically derived from the input file name.
    pub fallback_model_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            tracing: true,
            simple_names: false,
            parent_first_execution: true,
            fallback_model_name: None,
        }
    }
}

/// Receiver for generated text. The emitter produces two channels, one for
/// the header and one for the body.
pub trait CodeSink {
    fn append(&mut self, text: &str);
}

impl CodeSink for String {
    fn append(&mut self, text: &str) {
        self.push_str(text);
    }
}

/// Outcome of a successful generation run. Errors counted here were
/// recoverable (the offending input was skipped); fatal problems surface as
/// [`GenerateError`] instead.
#[derive(Clone, Debug)]
pub struct GenerateSummary {
    pub model_name: String,
    pub errors: usize,
    pub warnings: usize,
}

/// Wraps the caller's sink to keep severity tallies for the summary.
struct CountingSink<'a, D: DiagnosticSink> {
    inner: &'a mut D,
    errors: usize,
    warnings: usize,
}

impl<'a, D: DiagnosticSink> CountingSink<'a, D> {
    fn new(inner: &'a mut D) -> Self {
        Self {
            inner,
            errors: 0,
            warnings: 0,
        }
    }
}

impl<D: DiagnosticSink> DiagnosticSink for CountingSink<'_, D> {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.inner.report(diagnostic);
    }
}

/// Parse the input into a frozen model without emitting anything.
pub fn parse_model<I, D>(lines: I, diags: &mut D, config: &Config) -> Model
where
    I: IntoIterator<Item = String>,
    D: DiagnosticSink,
{
    Parser::new(diags, config).parse(lines)
}

/// Run the full pipeline: fully consume the input, write the two text
/// streams, and report every problem through the diagnostic sink.
pub fn generate<I, S, D>(
    lines: I,
    header: &mut S,
    body: &mut S,
    diags: &mut D,
    config: &Config,
) -> Result<GenerateSummary, GenerateError>
where
    I: IntoIterator<Item = String>,
    S: CodeSink,
    D: DiagnosticSink,
{
    let mut counting = CountingSink::new(diags);

    let mut model = parse_model(lines, &mut counting, config);
    if !model.has_model_name() {
        match &config.fallback_model_name {
            Some(name) => model.set_model_name(name),
            None => return Err(GenerateError::MissingModelName),
        }
    }
    if model.states().is_empty() {
        return Err(GenerateError::EmptyModel);
    }

    validate(&model, &mut counting);

    let styler = Styler::new(&model, config.simple_names);
    Emitter::new(&model, &styler, config).generate(header, body, &mut counting)?;

    Ok(GenerateSummary {
        model_name: model.model_name().to_owned(),
        errors: counting.errors,
        warnings: counting.warnings,
    })
}
