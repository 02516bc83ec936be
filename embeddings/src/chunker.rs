//! Word-window chunking for long documents.
//!
//! Long documents are embedded as multiple overlapping windows so nothing is
//! lost to truncation. Short inputs are kept whole: fragmenting a text that
//! already fits one window only hurts coherence.

/// Configuration for the word chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Target words per chunk.
    pub window_size: usize,

    /// Overlapping words between consecutive chunks.
    pub overlap: usize,

    /// Trailing fragments of at most this many words are dropped.
    pub min_words: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window_size: 500,
            overlap: 50,
            min_words: 20,
        }
    }
}

/// Splits text into overlapping word windows.
///
/// Deterministic: the same input always yields the same chunk boundaries.
/// The whole text is held in memory; chunking is not lazy.
#[derive(Debug, Clone, Default)]
pub struct WordChunker {
    config: ChunkerConfig,
}

impl WordChunker {
    /// Create a chunker with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chunker with custom configuration.
    pub fn with_config(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Split `text` into overlapping chunks.
    ///
    /// Inputs of at most `window_size` words are returned as a single chunk
    /// equal to the whole text. A trailing fragment of `min_words` words or
    /// fewer is dropped rather than emitted as a degenerate chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.len() <= self.config.window_size {
            return vec![text.to_string()];
        }

        // Guard against a degenerate stride of zero.
        let stride = self
            .config
            .window_size
            .saturating_sub(self.config.overlap)
            .max(1);

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.config.window_size).min(words.len());
            let window = &words[start..end];
            if window.len() > self.config.min_words {
                chunks.push(window.join(" "));
            }
            start += stride;
        }

        chunks
    }
}
