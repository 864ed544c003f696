//! Core types for the plantgen state machine generator.
//!
//! This crate owns the pieces that are independent of any concrete input
//! grammar or output language:
//!
//! - **model**: the intermediate representation and its store
//! - **semantics**: entry paths, ancestor chains, least common ancestors
//!   and choice branch ordering
//! - **validation**: structural checks on a frozen model
//! - **diag**: the diagnostic sink interface and fatal error type

pub mod diag;
pub mod model;
pub mod semantics;
pub mod validation;
