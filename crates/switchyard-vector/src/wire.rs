//! Request and response bodies of the vector bus HTTP contract.
//!
//! Field names are part of the wire format (`topK`, `includeText`) and must
//! not change.

use serde::{Deserialize, Serialize};

/// Arbitrary per-record metadata.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// `POST /embed` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Texts to embed, in order.
    pub texts: Vec<String>,
    /// Output dimension; the service default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
    /// Model hint. Absent or `"deterministic"` selects the local hash embedding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A text with its vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The input text.
    pub text: String,
    /// Its embedding.
    pub vector: Vec<f32>,
}

/// `POST /embed` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// Length of every returned vector.
    pub dim: usize,
    /// One entry per input text, same order.
    pub embeddings: Vec<Embedding>,
}

/// One record in a `POST /vectors` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertItem {
    /// Record id, unique within the namespace.
    pub id: String,
    /// The vector to store.
    pub vector: Vec<f32>,
    /// Source text, returned by queries that ask for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// `POST /vectors` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertRequest {
    /// Target namespace; `default` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Records to insert or replace.
    pub items: Vec<UpsertItem>,
}

/// `POST /vectors` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertResponse {
    /// Number of records written.
    pub upserted: usize,
}

/// `POST /query` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Namespace to search; `default` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Query vector.
    pub vector: Vec<f32>,
    /// Maximum number of matches.
    #[serde(default, rename = "topK", skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    /// Include stored text in the matches.
    #[serde(default, rename = "includeText", skip_serializing_if = "Option::is_none")]
    pub include_text: Option<bool>,
}

/// One scored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Record id.
    pub id: String,
    /// Dot product with the query vector.
    pub score: f32,
    /// Stored text, when requested and present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Stored metadata, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// `POST /query` response, best match first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Matches in descending score order.
    pub matches: Vec<QueryMatch>,
}

/// A vector to score in a `POST /dot` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotCandidate {
    /// Caller-chosen id, echoed in the score.
    pub id: String,
    /// Candidate vector.
    pub vector: Vec<f32>,
}

/// `POST /dot` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DotRequest {
    /// Query vector.
    pub query: Vec<f32>,
    /// Candidates to score against `query`.
    pub vectors: Vec<DotCandidate>,
}

/// Score of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotScore {
    /// Candidate id.
    pub id: String,
    /// Dot product with the query.
    pub score: f32,
}

/// `POST /dot` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DotResponse {
    /// One score per candidate, in request order.
    pub scores: Vec<DotScore>,
}
