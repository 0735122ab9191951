use serde::{Deserialize, Serialize};
use switchyard_core::{SwitchyardError, SwitchyardResult};

/// Default window length in characters.
pub const DEFAULT_WINDOW: usize = 1200;
/// Default overlap between consecutive windows, in characters.
pub const DEFAULT_OVERLAP: usize = 100;

/// Window and overlap for character chunking. `overlap < window` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChunkConfig")]
pub struct ChunkConfig {
    window: usize,
    overlap: usize,
}

#[derive(Deserialize)]
struct RawChunkConfig {
    window: usize,
    overlap: usize,
}

impl TryFrom<RawChunkConfig> for ChunkConfig {
    type Error = SwitchyardError;

    fn try_from(raw: RawChunkConfig) -> SwitchyardResult<Self> {
        Self::new(raw.window, raw.overlap)
    }
}

impl ChunkConfig {
    pub fn new(window: usize, overlap: usize) -> SwitchyardResult<Self> {
        if window == 0 {
            return Err(SwitchyardError::Config(
                "Chunk window must be positive".to_string(),
            ));
        }
        if overlap >= window {
            return Err(SwitchyardError::Config(format!(
                "Chunk overlap ({overlap}) must be smaller than the window ({window})"
            )));
        }
        Ok(Self { window, overlap })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// One window of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `<source>:<index>`
    pub id: String,
    pub source: String,
    pub index: usize,
    pub text: String,
}

/// Split `text` into overlapping windows of at most `window` characters.
///
/// Each window after the first starts `overlap` characters before the end
/// of the previous one. The last window ends exactly at the end of the
/// text; empty text yields no windows.
pub fn chunk_text(text: &str, config: ChunkConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut out = Vec::new();
    let mut start = 0;

    while start < len {
        let end = (start + config.window).min(len);
        out.push(chars[start..end].iter().collect());
        if end == len {
            break;
        }
        start = end - config.overlap;
    }
    out
}

/// Chunk a document and assign stable ids derived from `source`.
pub fn chunk_document(source: &str, text: &str, config: ChunkConfig) -> Vec<Chunk> {
    chunk_text(text, config)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            id: format!("{source}:{index}"),
            source: source.to_string(),
            index,
            text,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_checks_window_and_overlap() {
        let ok: ChunkConfig = serde_json::from_str(r#"{"window": 10, "overlap": 2}"#).unwrap();
        assert_eq!((ok.window(), ok.overlap()), (10, 2));

        assert!(serde_json::from_str::<ChunkConfig>(r#"{"window": 0, "overlap": 0}"#).is_err());
        let err = serde_json::from_str::<ChunkConfig>(r#"{"window": 5, "overlap": 5}"#)
            .unwrap_err();
        assert!(err.to_string().contains("smaller than the window"), "{err}");
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("tiny", ChunkConfig::default());
        assert_eq!(chunks, vec!["tiny".to_string()]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(chunk_text("", ChunkConfig::default()).is_empty());
    }

    #[test]
    fn test_windows_overlap() {
        let config = ChunkConfig::new(4, 1).unwrap();
        let chunks = chunk_text("abcdefghij", config);
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_exact_window_terminates() {
        let config = ChunkConfig::new(5, 2).unwrap();
        assert_eq!(chunk_text("abcde", config), vec!["abcde"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let config = ChunkConfig::new(2, 0).unwrap();
        let chunks = chunk_text("ñandú", config);
        assert_eq!(chunks, vec!["ña", "nd", "ú"]);
    }

    #[test]
    fn test_default_window_covers_text() {
        let text = "x".repeat(2500);
        let chunks = chunk_text(&text, ChunkConfig::default());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1200);
        assert_eq!(chunks[1].len(), 1200);
        assert_eq!(chunks[2].len(), 2500 - 2200);
    }

    #[test]
    fn test_invalid_config() {
        assert!(ChunkConfig::new(0, 0).is_err());
        assert!(ChunkConfig::new(10, 10).is_err());
        assert!(ChunkConfig::new(10, 9).is_ok());
    }

    #[test]
    fn test_chunk_ids() {
        let config = ChunkConfig::new(3, 0).unwrap();
        let chunks = chunk_document("src/lib.rs", "abcdef", config);
        assert_eq!(chunks[0].id, "src/lib.rs:0");
        assert_eq!(chunks[1].id, "src/lib.rs:1");
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].text, "def");
    }
}
