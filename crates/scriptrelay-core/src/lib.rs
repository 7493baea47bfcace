//! Core types, configuration, and helpers shared by the Scriptrelay crates.

pub mod config;
pub mod types;
pub mod utils;

pub use types::{
    ErrorKind, EnvelopeData, GenerationRequest, ResponseEnvelope, ValidationEnvelope,
    ValidationRequest, ValidationResult, EMPTY_SCRIPT_PLACEHOLDER,
};
