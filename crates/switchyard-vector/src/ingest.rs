use crate::chunk::{chunk_document, Chunk, ChunkConfig};
use crate::embedding::{DeterministicEmbedding, DEFAULT_DIMENSION};
use crate::service::VectorService;
use crate::wire::{EmbedRequest, Meta, UpsertItem, UpsertRequest};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use switchyard_core::{SwitchyardError, SwitchyardResult};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File-name pattern of the files ingested by default.
pub const DEFAULT_INCLUDE: &str = r"(?i)\.(md|txt|ts|tsx|js|jsx|json|yaml|yml|py|rs|go|java|kt|c|cpp|h|cs|swift|toml|ini|sh|ps1|Dockerfile|makefile)$";

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".idea",
    ".vscode",
    "target",
];

pub const DEFAULT_NAMESPACE: &str = "repo";
pub const DEFAULT_EMBED_BATCH: usize = 32;
pub const DEFAULT_UPSERT_BATCH: usize = 128;
/// Dimension requested from a remote embedder.
pub const DEFAULT_REMOTE_DIMENSION: usize = 768;
/// Model hint sent with remote embed requests.
pub const DEFAULT_REMOTE_MODEL: &str = "auto";

/// Where chunk vectors come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedMode {
    /// Computed locally with [`DeterministicEmbedding`].
    Deterministic { dim: usize },
    /// Requested from the vector service's `/embed` operation.
    Remote { dim: usize, model: String },
}

impl EmbedMode {
    pub fn remote_default() -> Self {
        EmbedMode::Remote {
            dim: DEFAULT_REMOTE_DIMENSION,
            model: DEFAULT_REMOTE_MODEL.to_string(),
        }
    }
}

impl Default for EmbedMode {
    fn default() -> Self {
        EmbedMode::Deterministic {
            dim: DEFAULT_DIMENSION,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub root: PathBuf,
    pub namespace: String,
    pub include: Regex,
    pub chunk: ChunkConfig,
    pub mode: EmbedMode,
    pub embed_batch: usize,
    pub upsert_batch: usize,
    /// Batches in flight at once. 1 means strictly sequential.
    pub concurrency: usize,
}

impl IngestConfig {
    pub fn new(root: impl Into<PathBuf>) -> SwitchyardResult<Self> {
        let include = Regex::new(DEFAULT_INCLUDE)
            .map_err(|e| SwitchyardError::Config(format!("Invalid include pattern: {e}")))?;
        Ok(Self {
            root: root.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            include,
            chunk: ChunkConfig::default(),
            mode: EmbedMode::default(),
            embed_batch: DEFAULT_EMBED_BATCH,
            upsert_batch: DEFAULT_UPSERT_BATCH,
            concurrency: 1,
        })
    }

    pub fn with_include(mut self, pattern: &str) -> SwitchyardResult<Self> {
        self.include = Regex::new(pattern)
            .map_err(|e| SwitchyardError::Config(format!("Invalid include pattern: {e}")))?;
        Ok(self)
    }
}

/// Totals of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub chunks: usize,
    pub upserted: usize,
}

/// Walks a source tree and loads it into a [`VectorService`].
pub struct Ingestor {
    service: Arc<dyn VectorService>,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(service: Arc<dyn VectorService>, config: IngestConfig) -> Self {
        Self { service, config }
    }

    /// Health-check the service, then ingest every matching file under the root.
    pub async fn run(&self) -> SwitchyardResult<IngestReport> {
        self.service.healthz().await?;

        let files = self.discover().await?;
        info!(root = %self.config.root.display(), files = files.len(), "Ingest started");

        let mut documents = Vec::with_capacity(files.len());
        for file in &files {
            match tokio::fs::read_to_string(file).await {
                Ok(text) if !text.is_empty() => {
                    documents.push((relative_id(&self.config.root, file), file.clone(), text));
                }
                Ok(_) => {}
                Err(e) => debug!(file = %file.display(), error = %e, "Skipping unreadable file"),
            }
        }

        let mut report = self.ingest_documents(documents).await?;
        report.files = files.len();
        info!(
            files = report.files,
            chunks = report.chunks,
            upserted = report.upserted,
            "Ingest finished"
        );
        Ok(report)
    }

    /// Ingest in-memory documents given as `(source id, origin path, text)`.
    pub async fn ingest_documents(
        &self,
        documents: Vec<(String, PathBuf, String)>,
    ) -> SwitchyardResult<IngestReport> {
        let files = documents.len();
        let mut chunks: Vec<(Chunk, String)> = Vec::new();
        for (source, origin, text) in &documents {
            let origin = origin.display().to_string();
            for chunk in chunk_document(source, text, self.config.chunk) {
                chunks.push((chunk, origin.clone()));
            }
        }
        let chunk_count = chunks.len();

        let items = match &self.config.mode {
            EmbedMode::Deterministic { dim } => local_items(chunks, *dim),
            EmbedMode::Remote { dim, model } => self.remote_items(chunks, *dim, model).await?,
        };

        let upserted = self.upsert_all(items).await?;
        Ok(IngestReport {
            files,
            chunks: chunk_count,
            upserted,
        })
    }

    async fn discover(&self) -> SwitchyardResult<Vec<PathBuf>> {
        let root = self.config.root.clone();
        let include = self.config.include.clone();
        tokio::task::spawn_blocking(move || walk(&root, &include))
            .await
            .map_err(|e| SwitchyardError::Io(std::io::Error::other(e.to_string())))?
    }

    async fn remote_items(
        &self,
        chunks: Vec<(Chunk, String)>,
        dim: usize,
        model: &str,
    ) -> SwitchyardResult<Vec<UpsertItem>> {
        let batch_size = self.config.embed_batch.max(1);
        let batches: Vec<Vec<(Chunk, String)>> = chunk_vec(chunks, batch_size);
        let service = &self.service;

        let embedded: Vec<Vec<UpsertItem>> = stream::iter(batches)
            .map(|part| async move {
                let texts = part.iter().map(|(c, _)| c.text.clone()).collect();
                let resp = service
                    .embed(EmbedRequest {
                        texts,
                        dim: Some(dim),
                        model: Some(model.to_string()),
                    })
                    .await?;
                if resp.embeddings.len() != part.len() {
                    return Err(SwitchyardError::InvalidRequest(format!(
                        "Embed returned {} vectors for {} texts",
                        resp.embeddings.len(),
                        part.len()
                    )));
                }
                let dim = resp.dim;
                debug!(count = part.len(), dim, "Embedded batch");
                let items: Vec<UpsertItem> = part
                    .into_iter()
                    .zip(resp.embeddings)
                    .map(|((chunk, origin), embedding)| {
                        let mut meta = Meta::new();
                        meta.insert("file".into(), origin.into());
                        meta.insert("idx".into(), chunk.index.into());
                        meta.insert("dim".into(), dim.into());
                        UpsertItem {
                            id: chunk.id,
                            vector: embedding.vector,
                            text: Some(embedding.text),
                            meta: Some(meta),
                        }
                    })
                    .collect();
                Ok::<_, SwitchyardError>(items)
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        Ok(embedded.into_iter().flatten().collect())
    }

    async fn upsert_all(&self, items: Vec<UpsertItem>) -> SwitchyardResult<usize> {
        let batch_size = self.config.upsert_batch.max(1);
        let service = &self.service;
        let namespace = &self.config.namespace;

        stream::iter(chunk_vec(items, batch_size))
            .map(|segment| async move {
                let count = segment.len();
                let resp = service
                    .upsert_vectors(UpsertRequest {
                        namespace: Some(namespace.clone()),
                        items: segment,
                    })
                    .await?;
                debug!(count, upserted = resp.upserted, "Upserted batch");
                Ok::<usize, SwitchyardError>(resp.upserted)
            })
            .buffered(self.config.concurrency.max(1))
            .try_fold(0usize, |total, n| async move { Ok(total + n) })
            .await
    }
}

fn local_items(chunks: Vec<(Chunk, String)>, dim: usize) -> Vec<UpsertItem> {
    chunks
        .into_iter()
        .map(|(chunk, origin)| {
            let mut meta = Meta::new();
            meta.insert("file".into(), origin.into());
            meta.insert("idx".into(), chunk.index.into());
            meta.insert("dim".into(), dim.into());
            meta.insert("mode".into(), "deterministic".into());
            UpsertItem {
                id: chunk.id,
                vector: DeterministicEmbedding::vector(&chunk.text, dim),
                text: Some(chunk.text),
                meta: Some(meta),
            }
        })
        .collect()
}

fn chunk_vec<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut out = Vec::new();
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        out.push(iter.by_ref().take(size).collect());
    }
    out
}

/// Path relative to `root`, with `/` separators.
fn relative_id(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && EXCLUDED_DIRS.iter().any(|dir| *dir == name)
}

fn walk(root: &Path, include: &Regex) -> SwitchyardResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(SwitchyardError::InvalidRequest(format!(
            "Ingest root is not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter();
    for entry in walker.filter_entry(|e| e.depth() == 0 || !is_excluded_dir(e)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if include.is_match(&name) || include.is_match(&entry.path().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
