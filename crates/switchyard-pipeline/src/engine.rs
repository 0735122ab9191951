use crate::config::PipelineConfig;
use crate::critic::critique;
use crate::evaluator::{evaluate, DecisionInput, DecisionModel};
use crate::retrieval::Retriever;
use crate::types::{OrchestrationOutcome, OrchestrationState, RunStatus, Stage};
use std::sync::Arc;
use std::time::Duration;
use switchyard_core::{SwitchyardError, SwitchyardResult, ToolCall, ToolInvoker};
use tracing::{error, info, warn};

/// Tool that cleans raw orchestration input.
pub const NORMALIZE_TOOL: &str = "normalize_orchestration_context";
/// Tool that receives the final plan.
pub const DISPATCH_TOOL: &str = "core:dispatch_orchestration";

/// The orchestration pipeline.
/// Runs normalize → evaluate (+ critic) → retrieve → dispatch, strictly in order.
pub struct Pipeline {
    tools: Arc<dyn ToolInvoker>,
    retriever: Arc<dyn Retriever>,
    model: Arc<DecisionModel>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        tools: Arc<dyn ToolInvoker>,
        retriever: Arc<dyn Retriever>,
        model: Arc<DecisionModel>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            tools,
            retriever,
            model,
            config,
        }
    }

    pub fn model(&self) -> &DecisionModel {
        &self.model
    }

    /// Run the pipeline once for `input`.
    ///
    /// Normalization failure aborts with [`SwitchyardError::NormalizationFailed`].
    /// Retrieval failure is logged and the run continues with no evidence.
    /// Dispatch failure returns [`SwitchyardError::DispatchFailed`] carrying the
    /// evaluation, critic note and evidence.
    pub async fn run(&self, input: serde_json::Value) -> SwitchyardResult<OrchestrationOutcome> {
        let mut state = OrchestrationState::new(input);
        info!(run_id = %state.run_id, "Pipeline: starting run");

        // Stage 1: normalize
        let context = match self.normalize(&state).await {
            Ok(context) => context,
            Err(e) => {
                state.advance(Stage::Failed);
                error!(run_id = %state.run_id, error = %e, "Pipeline: normalization failed");
                return Err(SwitchyardError::NormalizationFailed(e.to_string()));
            }
        };

        // Stage 2: evaluate + critique, in-process
        state.advance(Stage::Evaluate);
        let decision_input = DecisionInput::from_context(&context);
        state.context = Some(context);
        let result = evaluate(&self.model, &decision_input);
        let note = critique(&decision_input, &result);
        info!(
            run_id = %state.run_id,
            route = %result.route,
            policy = %result.policy,
            capacity = %result.capacity,
            plan = %result.plan,
            action = %result.action,
            confidence = note.confidence,
            "Pipeline: evaluation complete"
        );
        state.evaluation = Some(result.clone());
        state.critic = Some(note.clone());

        // Stage 3: retrieve, advisory only
        state.advance(Stage::Retrieve);
        let query = format!(
            "route:{} policy:{} capacity:{}",
            result.route, result.policy, result.capacity
        );
        state.evidence = match self.retrieve(&query).await {
            Ok(evidence) => evidence,
            Err(e) => {
                warn!(run_id = %state.run_id, error = %e, "Pipeline: retrieval failed, continuing without evidence");
                Vec::new()
            }
        };

        // Stage 4: dispatch
        state.advance(Stage::Dispatch);
        let payload = serde_json::json!({
            "plan": result.plan,
            "action": result.action,
            "critic": note,
            "rag_support": state.evidence,
        });
        let dispatch_status = match self
            .call_with_timeout(DISPATCH_TOOL, payload, self.config.dispatch_timeout)
            .await
        {
            Ok(ack) => ack,
            Err(e) => {
                let partial = state.partial();
                state.advance(Stage::Failed);
                error!(run_id = %state.run_id, error = %e, "Pipeline: dispatch failed");
                return Err(SwitchyardError::DispatchFailed {
                    message: e.to_string(),
                    partial: Box::new(partial),
                });
            }
        };
        state.dispatch = Some(dispatch_status.clone());
        state.advance(Stage::Completed);

        let elapsed_ms = (chrono::Utc::now() - state.started_at).num_milliseconds();
        info!(
            run_id = %state.run_id,
            evidence = state.evidence.len(),
            elapsed_ms,
            "Pipeline: run completed"
        );

        Ok(OrchestrationOutcome {
            run_id: state.run_id,
            status: RunStatus::Completed,
            plan: result.plan.clone(),
            action: result.action.clone(),
            dmn_result: result,
            critic: note,
            rag_support: state.evidence,
            dispatch_status,
        })
    }

    async fn normalize(&self, state: &OrchestrationState) -> SwitchyardResult<serde_json::Value> {
        let context = self
            .call_with_timeout(
                NORMALIZE_TOOL,
                state.input.clone(),
                self.config.normalize_timeout,
            )
            .await?;
        if !context.is_object() {
            return Err(SwitchyardError::InvalidRequest(format!(
                "normalized context must be an object, got {context}"
            )));
        }
        Ok(context)
    }

    async fn retrieve(&self, query: &str) -> SwitchyardResult<Vec<serde_json::Value>> {
        let timeout = self.config.retrieve_timeout;
        tokio::time::timeout(timeout, self.retriever.retrieve(query, self.config.top_k))
            .await
            .map_err(|_| SwitchyardError::Timeout(format!("retrieval after {timeout:?}")))?
    }

    async fn call_with_timeout(
        &self,
        tool: &str,
        arguments: serde_json::Value,
        timeout: Duration,
    ) -> SwitchyardResult<serde_json::Value> {
        tokio::time::timeout(timeout, self.tools.invoke(ToolCall::new(tool, arguments)))
            .await
            .map_err(|_| SwitchyardError::Timeout(format!("tool '{tool}' after {timeout:?}")))?
    }
}
