use crate::wire::{DotCandidate, DotScore, Meta};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use switchyard_core::{SwitchyardError, SwitchyardResult};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Namespace used when a request does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A single stored vector. `id` is the natural key within a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub updated_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            text: None,
            meta: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Result of a similarity query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub record: EmbeddingRecord,
    pub score: f32,
}

/// Trait for namespaced vector storage backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite records by id. Returns how many were written.
    async fn upsert(&self, namespace: &str, records: Vec<EmbeddingRecord>)
        -> SwitchyardResult<usize>;

    /// The `top_k` records with the highest inner product against `vector`,
    /// best first, ties broken by id ascending.
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> SwitchyardResult<Vec<SearchResult>>;

    /// Fetch one record by id.
    async fn get(&self, namespace: &str, id: &str) -> SwitchyardResult<Option<EmbeddingRecord>>;

    /// Number of records in a namespace.
    async fn count(&self, namespace: &str) -> SwitchyardResult<usize>;

    /// All namespaces that hold at least one record, sorted.
    async fn namespaces(&self) -> SwitchyardResult<Vec<String>>;
}

#[derive(Debug, Clone)]
struct NamespaceIndex {
    dimension: usize,
    records: BTreeMap<String, EmbeddingRecord>,
}

/// In-memory store using brute-force inner-product scoring.
/// Suitable for small indexes (<100k vectors per namespace).
pub struct InMemoryVectorStore {
    namespaces: RwLock<HashMap<String, NamespaceIndex>>,
    fixed_dimension: Option<usize>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            fixed_dimension: None,
        }
    }

    /// Every namespace is pinned to `dimension` instead of adopting the
    /// length of its first vector.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            fixed_dimension: Some(dimension),
        }
    }

    /// Check a batch against the namespace dimension without writing.
    pub async fn validate(&self, namespace: &str, records: &[EmbeddingRecord]) -> SwitchyardResult<()> {
        let namespaces = self.namespaces.read().await;
        let existing = namespaces.get(namespace).map(|ns| ns.dimension);
        expected_dimension(existing, self.fixed_dimension, records).map(|_| ())
    }

    async fn snapshot(&self) -> Vec<(String, EmbeddingRecord)> {
        let namespaces = self.namespaces.read().await;
        let mut names: Vec<&String> = namespaces.keys().collect();
        names.sort();
        names
            .into_iter()
            .flat_map(|name| {
                namespaces[name]
                    .records
                    .values()
                    .map(move |r| (name.clone(), r.clone()))
            })
            .collect()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the dimension a batch must have and check every record against it.
fn expected_dimension(
    existing: Option<usize>,
    fixed: Option<usize>,
    records: &[EmbeddingRecord],
) -> SwitchyardResult<Option<usize>> {
    let Some(first) = records.first() else {
        return Ok(existing.or(fixed));
    };
    let expected = existing.or(fixed).unwrap_or(first.vector.len());
    if expected == 0 {
        return Err(SwitchyardError::InvalidRequest(
            "Vectors must not be empty".to_string(),
        ));
    }
    for record in records {
        if record.vector.len() != expected {
            return Err(SwitchyardError::DimensionMismatch {
                expected,
                actual: record.vector.len(),
            });
        }
    }
    Ok(Some(expected))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(
        &self,
        namespace: &str,
        records: Vec<EmbeddingRecord>,
    ) -> SwitchyardResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut namespaces = self.namespaces.write().await;
        let existing = namespaces.get(namespace).map(|ns| ns.dimension);
        let Some(dimension) = expected_dimension(existing, self.fixed_dimension, &records)? else {
            return Ok(0);
        };

        let index = namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| NamespaceIndex {
                dimension,
                records: BTreeMap::new(),
            });

        let count = records.len();
        for record in records {
            index.records.insert(record.id.clone(), record);
        }
        debug!(namespace, count, "Upserted vectors");
        Ok(count)
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> SwitchyardResult<Vec<SearchResult>> {
        if vector.is_empty() {
            return Err(SwitchyardError::InvalidRequest(
                "Empty query vector".to_string(),
            ));
        }

        let namespaces = self.namespaces.read().await;
        let Some(index) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };
        if vector.len() != index.dimension {
            return Err(SwitchyardError::DimensionMismatch {
                expected: index.dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(f32, &EmbeddingRecord)> = index
            .records
            .values()
            .map(|r| (dot(vector, &r.vector), r))
            .collect();

        // Highest score first; ids ascending among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, record)| SearchResult {
                record: record.clone(),
                score,
            })
            .collect())
    }

    async fn get(&self, namespace: &str, id: &str) -> SwitchyardResult<Option<EmbeddingRecord>> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .and_then(|ns| ns.records.get(id))
            .cloned())
    }

    async fn count(&self, namespace: &str) -> SwitchyardResult<usize> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.get(namespace).map_or(0, |ns| ns.records.len()))
    }

    async fn namespaces(&self) -> SwitchyardResult<Vec<String>> {
        let namespaces = self.namespaces.read().await;
        let mut names: Vec<String> = namespaces.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// One line of the JSONL log.
#[derive(Debug, Serialize, Deserialize)]
struct LogLine {
    namespace: String,
    #[serde(flatten)]
    record: EmbeddingRecord,
}

/// File-backed store that persists upserts as an append-only JSONL log.
/// The log is replayed on open, so later lines win over earlier ones for the
/// same `(namespace, id)`; [`FileVectorStore::compact`] drops the overwritten
/// lines.
pub struct FileVectorStore {
    path: PathBuf,
    inner: InMemoryVectorStore,
    write_lock: Mutex<()>,
}

impl FileVectorStore {
    /// Open (or create) the store at `path`.
    pub async fn open(path: PathBuf, fixed_dimension: Option<usize>) -> SwitchyardResult<Self> {
        let inner = match fixed_dimension {
            Some(dim) => InMemoryVectorStore::with_dimension(dim),
            None => InMemoryVectorStore::new(),
        };

        if path.exists() {
            let data = tokio::fs::read_to_string(&path).await.map_err(|e| {
                SwitchyardError::Store(format!("Failed to read vector log: {e}"))
            })?;
            let mut replayed = 0usize;
            for (lineno, line) in data.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let entry: LogLine = serde_json::from_str(line).map_err(|e| {
                    SwitchyardError::Store(format!("Invalid log line {}: {e}", lineno + 1))
                })?;
                inner.upsert(&entry.namespace, vec![entry.record]).await?;
                replayed += 1;
            }
            info!(path = %path.display(), lines = replayed, "Vector log replayed");
        } else if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SwitchyardError::Store(format!("Failed to create dir: {e}")))?;
        }

        Ok(Self {
            path,
            inner,
            write_lock: Mutex::new(()),
        })
    }

    async fn append(&self, namespace: &str, records: &[EmbeddingRecord]) -> SwitchyardResult<()> {
        use tokio::io::AsyncWriteExt;

        let mut data = String::new();
        for record in records {
            let line = serde_json::to_string(&LogLine {
                namespace: namespace.to_string(),
                record: record.clone(),
            })?;
            data.push_str(&line);
            data.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SwitchyardError::Store(format!("Failed to open vector log: {e}")))?;
        file.write_all(data.as_bytes())
            .await
            .map_err(|e| SwitchyardError::Store(format!("Failed to append vectors: {e}")))?;
        file.flush()
            .await
            .map_err(|e| SwitchyardError::Store(format!("Failed to flush vector log: {e}")))?;
        Ok(())
    }

    /// Rewrite the log so it holds exactly one line per live record.
    pub async fn compact(&self) -> SwitchyardResult<usize> {
        let _guard = self.write_lock.lock().await;
        let entries = self.inner.snapshot().await;

        let mut data = String::new();
        for (namespace, record) in &entries {
            let line = serde_json::to_string(&LogLine {
                namespace: namespace.clone(),
                record: record.clone(),
            })?;
            data.push_str(&line);
            data.push('\n');
        }

        let tmp = self.path.with_extension("jsonl.tmp");
        tokio::fs::write(&tmp, data.as_bytes())
            .await
            .map_err(|e| SwitchyardError::Store(format!("Failed to write vector log: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SwitchyardError::Store(format!("Failed to replace vector log: {e}")))?;

        info!(path = %self.path.display(), records = entries.len(), "Vector log compacted");
        Ok(entries.len())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn upsert(
        &self,
        namespace: &str,
        records: Vec<EmbeddingRecord>,
    ) -> SwitchyardResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        self.inner.validate(namespace, &records).await?;
        self.append(namespace, &records).await?;
        self.inner.upsert(namespace, records).await
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> SwitchyardResult<Vec<SearchResult>> {
        self.inner.query(namespace, vector, top_k).await
    }

    async fn get(&self, namespace: &str, id: &str) -> SwitchyardResult<Option<EmbeddingRecord>> {
        self.inner.get(namespace, id).await
    }

    async fn count(&self, namespace: &str) -> SwitchyardResult<usize> {
        self.inner.count(namespace).await
    }

    async fn namespaces(&self) -> SwitchyardResult<Vec<String>> {
        self.inner.namespaces().await
    }
}

/// Inner product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Brute-force scoring of every candidate against `query`, in input order.
pub fn score_candidates(query: &[f32], candidates: &[DotCandidate]) -> SwitchyardResult<Vec<DotScore>> {
    candidates
        .iter()
        .map(|c| {
            if c.vector.len() != query.len() {
                return Err(SwitchyardError::DimensionMismatch {
                    expected: query.len(),
                    actual: c.vector.len(),
                });
            }
            Ok(DotScore {
                id: c.id.clone(),
                score: dot(query, &c.vector),
            })
        })
        .collect()
}
