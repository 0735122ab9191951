//! Orchestration pipeline for the `dmn.orchestrate` task.
//!
//! A run threads one [`OrchestrationState`] through four strictly sequential
//! stages:
//!
//! 1. **Normalize**: the `normalize_orchestration_context` tool cleans the raw input.
//! 2. **Evaluate**: [`evaluate`] applies the decision tables, then [`critique`]
//!    annotates the result. Both are pure and in-process.
//! 3. **Retrieve**: a [`Retriever`] fetches advisory evidence; failures
//!    degrade to empty evidence.
//! 4. **Dispatch**: the `core:dispatch_orchestration` tool receives the plan.

/// Per-stage timeouts and retrieval depth.
pub mod config;
/// Advisory notes on a decision result.
pub mod critic;
/// The staged orchestration run.
pub mod engine;
/// Rule-table decision evaluation.
pub mod evaluator;
/// Evidence retrieval backends.
pub mod retrieval;
/// Run state and outcome types.
pub mod types;

pub use config::PipelineConfig;
pub use critic::{critique, CriticNote};
pub use engine::{Pipeline, DISPATCH_TOOL, NORMALIZE_TOOL};
pub use evaluator::{evaluate, DecisionInput, DecisionModel, DecisionResult, DecisionTable};
pub use retrieval::{Retriever, ToolRetriever, VectorRetriever, RAG_TOOL};
pub use types::{OrchestrationOutcome, OrchestrationState, RunStatus, Stage};
