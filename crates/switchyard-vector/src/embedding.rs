use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use switchyard_core::{SwitchyardError, SwitchyardResult};
use tracing::debug;

/// Default dimension for locally computed embeddings.
pub const DEFAULT_DIMENSION: usize = 64;

/// Model hint that always selects the local deterministic embedder.
pub const DETERMINISTIC_MODEL: &str = "deterministic";

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Trait for computing text embeddings of a caller-chosen dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute one vector of length `dim` per input text.
    async fn embed_batch(&self, texts: &[String], dim: usize) -> SwitchyardResult<Vec<Vec<f32>>>;

    /// Compute the embedding for a single text.
    async fn embed(&self, text: &str, dim: usize) -> SwitchyardResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()], dim).await?;
        vectors
            .pop()
            .ok_or_else(|| SwitchyardError::Store("Embedder returned no vector".to_string()))
    }

    /// Short label recorded in chunk metadata (`deterministic`, `remote`).
    fn mode(&self) -> &'static str;
}

/// Seeded hash-mix embedding. No network, no model: the same text and
/// dimension always produce the same unit vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicEmbedding;

impl DeterministicEmbedding {
    pub fn new() -> Self {
        Self
    }

    /// The pure embedding function backing this provider.
    ///
    /// FNV-1a over the UTF-16 code units seeds a xorshift generator; each
    /// component takes the low 16 bits scaled to [-1, 1], and the result is
    /// L2-normalized.
    pub fn vector(text: &str, dim: usize) -> Vec<f32> {
        let mut h = FNV_OFFSET;
        for unit in text.encode_utf16() {
            h ^= u32::from(unit);
            h = h.wrapping_mul(FNV_PRIME);
        }

        let mut raw = Vec::with_capacity(dim);
        for _ in 0..dim {
            h ^= h << 13;
            h ^= h >> 17;
            h ^= h << 5;
            raw.push(f64::from(h & 0xffff) / 65535.0 * 2.0 - 1.0);
        }

        let norm = raw.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        raw.into_iter().map(|v| (v / norm) as f32).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for DeterministicEmbedding {
    async fn embed_batch(&self, texts: &[String], dim: usize) -> SwitchyardResult<Vec<Vec<f32>>> {
        if dim == 0 {
            return Err(SwitchyardError::InvalidRequest(
                "Embedding dimension must be positive".to_string(),
            ));
        }
        Ok(texts.iter().map(|t| Self::vector(t, dim)).collect())
    }

    fn mode(&self) -> &'static str {
        DETERMINISTIC_MODEL
    }
}

/// Settings for a remote, OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEmbeddingConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Embeddings from a remote model via `POST {base_url}/v1/embeddings`.
pub struct HttpEmbedding {
    config: RemoteEmbeddingConfig,
    http: reqwest::Client,
}

impl HttpEmbedding {
    pub fn new(config: RemoteEmbeddingConfig) -> SwitchyardResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SwitchyardError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed_batch(&self, texts: &[String], dim: usize) -> SwitchyardResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.config.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.config.model,
            "input": texts,
            "dimensions": dim,
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| SwitchyardError::Http(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SwitchyardError::remote(status.as_u16(), "remote embed"));
        }

        let mut parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| SwitchyardError::Http(e.to_string()))?;
        parsed.data.sort_by_key(|d| d.index);

        if parsed.data.len() != texts.len() {
            return Err(SwitchyardError::InvalidRequest(format!(
                "Embedder returned {} vectors for {} texts",
                parsed.data.len(),
                texts.len()
            )));
        }

        let mut vectors = Vec::with_capacity(parsed.data.len());
        for datum in parsed.data {
            if datum.embedding.len() != dim {
                return Err(SwitchyardError::DimensionMismatch {
                    expected: dim,
                    actual: datum.embedding.len(),
                });
            }
            vectors.push(datum.embedding);
        }
        debug!(count = vectors.len(), dim, "Remote embeddings computed");
        Ok(vectors)
    }

    fn mode(&self) -> &'static str {
        "remote"
    }
}

/// The embedders a vector service can choose from, keyed by model hint.
#[derive(Clone)]
pub struct EmbedderSet {
    deterministic: Arc<dyn EmbeddingProvider>,
    remote: Option<Arc<dyn EmbeddingProvider>>,
}

impl EmbedderSet {
    /// Only the deterministic embedder.
    pub fn local() -> Self {
        Self {
            deterministic: Arc::new(DeterministicEmbedding),
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn EmbeddingProvider>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// `None` or `"deterministic"` pick the local embedder; any other hint
    /// picks the remote one when configured and falls back to local otherwise.
    pub fn select(&self, model: Option<&str>) -> &dyn EmbeddingProvider {
        match (model, &self.remote) {
            (None, _) | (Some(DETERMINISTIC_MODEL), _) | (Some(_), None) => {
                self.deterministic.as_ref()
            }
            (Some(_), Some(remote)) => remote.as_ref(),
        }
    }
}

impl Default for EmbedderSet {
    fn default() -> Self {
        Self::local()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_deterministic_dimension_and_norm() {
        for dim in [1, 3, 64, 768] {
            let v = DeterministicEmbedding::vector("route:fast policy:allow", dim);
            assert_eq!(v.len(), dim);
            assert!((norm(&v) - 1.0).abs() < 1e-4, "dim {dim} norm {}", norm(&v));
        }
    }

    #[test]
    fn test_deterministic_is_pure() {
        let a = DeterministicEmbedding::vector("fn main() {}", 64);
        let b = DeterministicEmbedding::vector("fn main() {}", 64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_deterministic_distinguishes_texts() {
        let a = DeterministicEmbedding::vector("alpha", 64);
        let b = DeterministicEmbedding::vector("beta", 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic_accepts_empty_text() {
        let v = DeterministicEmbedding::vector("", 16);
        assert_eq!(v.len(), 16);
        assert!((norm(&v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_single_component_normalizes_to_unit() {
        let v = DeterministicEmbedding::vector("", 1);
        assert!((v[0].abs() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_zero_dimension_rejected() {
        let err = DeterministicEmbedding
            .embed_batch(&["x".to_string()], 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
    }

    #[tokio::test]
    async fn test_embed_single_uses_batch() {
        let v = DeterministicEmbedding.embed("hello", 8).await.unwrap();
        assert_eq!(v, DeterministicEmbedding::vector("hello", 8));
    }

    #[test]
    fn test_embedder_set_selection() {
        let set = EmbedderSet::local();
        assert_eq!(set.select(None).mode(), "deterministic");
        assert_eq!(set.select(Some("auto")).mode(), "deterministic");

        let remote = HttpEmbedding::new(RemoteEmbeddingConfig {
            base_url: "http://127.0.0.1:1".into(),
            model: "text-embedding-3-small".into(),
            api_key: None,
            timeout_secs: 1,
        })
        .unwrap();
        let set = EmbedderSet::local().with_remote(Arc::new(remote));
        assert_eq!(set.select(Some("auto")).mode(), "remote");
        assert_eq!(set.select(Some("deterministic")).mode(), "deterministic");
    }

    #[tokio::test]
    async fn test_http_embedding_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let emb = HttpEmbedding::new(RemoteEmbeddingConfig {
            base_url: server.uri(),
            model: "m".into(),
            api_key: Some("sk-test".into()),
            timeout_secs: 5,
        })
        .unwrap();
        let out = emb
            .embed_batch(&["a".to_string(), "b".to_string()], 2)
            .await
            .unwrap();
        assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_http_embedding_wrong_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [1.0, 0.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let emb = HttpEmbedding::new(RemoteEmbeddingConfig {
            base_url: server.uri(),
            model: "m".into(),
            api_key: None,
            timeout_secs: 5,
        })
        .unwrap();
        let err = emb.embed_batch(&["a".to_string()], 2).await.unwrap_err();
        assert_eq!(err.kind(), "dimension_mismatch");
    }

    #[tokio::test]
    async fn test_http_embedding_non_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let emb = HttpEmbedding::new(RemoteEmbeddingConfig {
            base_url: server.uri(),
            model: "m".into(),
            api_key: None,
            timeout_secs: 5,
        })
        .unwrap();
        match emb.embed_batch(&["a".to_string()], 2).await {
            Err(SwitchyardError::Remote { status, .. }) => assert_eq!(status, 429),
            other => panic!("expected remote error, got {other:?}"),
        }
    }
}
