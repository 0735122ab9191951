use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use switchyard_fabric::{AgentDescriptor, RouteSpec};
use switchyard_mcp::McpHttpClient;
use switchyard_pipeline::PipelineConfig;
use switchyard_vector::RemoteEmbeddingConfig;

/// Contents of `switchyard.toml`. Every section is optional.
#[derive(Debug, Deserialize, Default)]
pub struct SwitchyardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub vector_bus: VectorBusConfig,
    /// Remote embedding model used for non-deterministic `/embed` requests.
    #[serde(default)]
    pub embedding: Option<RemoteEmbeddingConfig>,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub ingest: IngestSection,
    #[serde(default)]
    pub security: SecurityConfig,
    /// Replaces the built-in agent catalog when non-empty.
    #[serde(default)]
    pub agents: Vec<AgentDescriptor>,
    /// Extra forwarding routes on top of the standard table.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Mount point of the vector bus routes.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// JSONL log of the file-backed store. `None` keeps vectors in memory.
    #[serde(default = "default_store_path")]
    pub path: Option<PathBuf>,
    /// Fixed dimension for every namespace; otherwise set by the first upsert.
    #[serde(default)]
    pub dimension: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            dimension: None,
        }
    }
}

/// A remote vector bus. When `url` is set it replaces the local store.
#[derive(Debug, Deserialize)]
pub struct VectorBusConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VectorBusConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrieverKind {
    /// Query the vector service directly.
    #[default]
    Vector,
    /// Call the `rag_vector_query` tool.
    Tool,
}

#[derive(Debug, Deserialize)]
pub struct PipelineSection {
    /// Tool endpoint for normalization, dispatch and tool-based retrieval.
    #[serde(default = "default_tool_endpoint")]
    pub tool_endpoint: String,
    #[serde(default)]
    pub tool_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub stage_timeout_secs: u64,
    #[serde(default)]
    pub normalize_timeout_secs: Option<u64>,
    #[serde(default)]
    pub retrieve_timeout_secs: Option<u64>,
    #[serde(default)]
    pub dispatch_timeout_secs: Option<u64>,
    #[serde(default)]
    pub retriever: RetrieverKind,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Decision model in `{"dmn-model": ...}` JSON form. Built-in rules otherwise.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            tool_endpoint: default_tool_endpoint(),
            tool_token: None,
            stage_timeout_secs: default_timeout_secs(),
            normalize_timeout_secs: None,
            retrieve_timeout_secs: None,
            dispatch_timeout_secs: None,
            retriever: RetrieverKind::default(),
            namespace: default_namespace(),
            top_k: default_top_k(),
            model_path: None,
        }
    }
}

impl PipelineSection {
    pub fn stage_config(&self) -> PipelineConfig {
        let stage = self.stage_timeout_secs;
        PipelineConfig {
            normalize_timeout: Duration::from_secs(self.normalize_timeout_secs.unwrap_or(stage)),
            retrieve_timeout: Duration::from_secs(self.retrieve_timeout_secs.unwrap_or(stage)),
            dispatch_timeout: Duration::from_secs(self.dispatch_timeout_secs.unwrap_or(stage)),
            top_k: self.top_k,
        }
    }

    /// Longest effective stage budget. One client serves every stage, so its
    /// transport timeout must not undercut any of them; the pipeline enforces
    /// the per-stage limits.
    pub fn client_timeout(&self) -> Duration {
        let stages = self.stage_config();
        stages
            .normalize_timeout
            .max(stages.retrieve_timeout)
            .max(stages.dispatch_timeout)
    }

    pub fn tool_client(&self) -> switchyard_core::SwitchyardResult<McpHttpClient> {
        McpHttpClient::with_timeout(
            self.tool_endpoint.clone(),
            self.tool_token.clone(),
            self.client_timeout(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct IngestSection {
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    #[serde(default = "default_embed_batch")]
    pub embed_batch: usize,
    #[serde(default = "default_upsert_batch")]
    pub upsert_batch: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Regex over file names; the standard source/doc extensions otherwise.
    #[serde(default)]
    pub include: Option<String>,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            window: default_window(),
            overlap: default_overlap(),
            embed_batch: default_embed_batch(),
            upsert_batch: default_upsert_batch(),
            concurrency: default_concurrency(),
            namespace: default_namespace(),
            include: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub api_keys: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8088
}
fn default_prefix() -> String {
    "/v1".to_string()
}
fn default_store_path() -> Option<PathBuf> {
    Some(PathBuf::from("./data/vectors.jsonl"))
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_tool_endpoint() -> String {
    "http://localhost:8080/mcp".to_string()
}
fn default_namespace() -> String {
    switchyard_vector::ingest::DEFAULT_NAMESPACE.to_string()
}
fn default_top_k() -> usize {
    switchyard_pipeline::config::DEFAULT_TOP_K
}
fn default_window() -> usize {
    switchyard_vector::chunk::DEFAULT_WINDOW
}
fn default_overlap() -> usize {
    switchyard_vector::chunk::DEFAULT_OVERLAP
}
fn default_embed_batch() -> usize {
    switchyard_vector::ingest::DEFAULT_EMBED_BATCH
}
fn default_upsert_batch() -> usize {
    switchyard_vector::ingest::DEFAULT_UPSERT_BATCH
}
fn default_concurrency() -> usize {
    1
}

impl SwitchyardConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read `path`; a missing file yields the defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(s) => Self::from_toml_str(&s).map_err(|e| {
                anyhow::anyhow!("Failed to parse config file '{}': {e}", path.display())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file '{}': {e}",
                path.display()
            )),
        }
    }
}
