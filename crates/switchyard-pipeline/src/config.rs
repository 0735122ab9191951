use std::time::Duration;

/// Evidence snippets requested per run.
pub const DEFAULT_TOP_K: usize = 5;
const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Time budgets for the stages that do I/O, plus the retrieval size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub normalize_timeout: Duration,
    pub retrieve_timeout: Duration,
    pub dispatch_timeout: Duration,
    pub top_k: usize,
}

impl PipelineConfig {
    /// Same timeout for every stage.
    pub fn with_stage_timeout(timeout: Duration) -> Self {
        Self {
            normalize_timeout: timeout,
            retrieve_timeout: timeout,
            dispatch_timeout: timeout,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_stage_timeout(DEFAULT_STAGE_TIMEOUT)
    }
}
