//! Facade crate for the plantgen state machine generator.
//!
//! Re-exports the model/semantics core and the generation pipeline so that
//! consumers depend on a single crate:
//!
//! ```no_run
//! use plantgen::{generate, Config, VecSink};
//!
//! let diagram = std::fs::read_to_string("machine.puml").unwrap();
//! let mut header = String::new();
//! let mut body = String::new();
//! let mut diags = VecSink::new();
//! let summary = generate(
//!     diagram.lines().map(str::to_owned),
//!     &mut header,
//!     &mut body,
//!     &mut diags,
//!     &Config::default(),
//! )
//! .unwrap();
//! println!("generated {} with {} warnings", summary.model_name, summary.warnings);
//! ```

pub use plantgen_core::diag::{
    Diagnostic, DiagnosticSink, GenerateError, LogSink, Severity, VecSink,
};
pub use plantgen_core::model::{
    DeclKind, Declaration, Event, EventDirection, EventId, Import, ImportScope, Model, NO_PARENT,
    State, StateId, StateKind, Transition, Variable, Visibility,
};
pub use plantgen_core::{semantics, validation};

pub use plantgen_codegen::{
    CodeSink, Config, GenerateSummary, generate, lexer, parse_model, parser, style,
};
