//! Namespaced vector similarity store for Switchyard.
//!
//! Provides inner-product storage and search, deterministic and remote
//! embedding, the vector bus wire contract with both an HTTP client and an
//! in-process implementation, and repository ingestion.
//!
//! # Main types
//!
//! - [`VectorStore`]: Persistence engine trait (upsert, query, get).
//! - [`InMemoryVectorStore`] / [`FileVectorStore`]: Storage backends.
//! - [`EmbeddingProvider`]: Text embedding trait; [`DeterministicEmbedding`] and [`HttpEmbedding`].
//! - [`VectorService`]: The vector bus contract; [`LocalVectorService`] and [`VectorBusClient`].
//! - [`Ingestor`]: Walks a source tree, chunks, embeds and upserts it.

/// Character-window chunking.
pub mod chunk;
/// HTTP client for a remote vector bus.
pub mod client;
/// Embedding provider trait and implementations.
pub mod embedding;
/// Repository ingestion.
pub mod ingest;
/// The vector bus service trait and its local implementation.
pub mod service;
/// Vector store trait and backends.
pub mod store;
/// Wire request and response bodies.
pub mod wire;

pub use chunk::{chunk_document, chunk_text, Chunk, ChunkConfig};
pub use client::VectorBusClient;
pub use embedding::{
    DeterministicEmbedding, EmbedderSet, EmbeddingProvider, HttpEmbedding, RemoteEmbeddingConfig,
    DEFAULT_DIMENSION,
};
pub use ingest::{EmbedMode, IngestConfig, IngestReport, Ingestor};
pub use service::{LocalVectorService, VectorService};
pub use store::{
    dot, EmbeddingRecord, FileVectorStore, InMemoryVectorStore, SearchResult, VectorStore,
    DEFAULT_NAMESPACE,
};
pub use wire::*;
