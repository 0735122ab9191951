//! Core types and error definitions for Switchyard.
//!
//! This crate provides the foundational types shared across all Switchyard
//! crates: the unified error enum and the tool-call abstraction used to
//! reach external agents.
//!
//! # Main types
//!
//! - [`SwitchyardError`]: Unified error enum for routing, pipeline and store failures.
//! - [`SwitchyardResult`]: Convenience alias for `Result<T, SwitchyardError>`.
//! - [`Failure`]: Structured `{kind, message, details}` body surfaced to callers.
//! - [`ToolCall`]: A named external tool invocation with a JSON payload.
//! - [`ToolInvoker`]: Trait implemented by tool transports.

/// Error type and structured failure body.
pub mod error;
/// Tool-call request type and invoker trait.
pub mod tool;

pub use error::{Failure, SwitchyardError, SwitchyardResult};
pub use tool::{ToolCall, ToolInvoker};
