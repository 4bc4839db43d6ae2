//! Token counting against the embedding model's vocabulary

use crate::error::Result;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Token oracle shared by the chunkers and the window splitter
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Load the cl100k vocabulary
    pub fn new() -> Result<Self> {
        let bpe = cl100k_base()?;
        Ok(Self { bpe })
    }

    /// Number of tokens in `text`
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Byte-offset table indexed by token position: `offsets[i]` is the byte
    /// where token `i` begins, `offsets[n]` the text length. `None` when the
    /// tokenizer cannot split the text into whole-character pieces.
    pub fn token_byte_offsets(&self, text: &str) -> Option<Vec<usize>> {
        let pieces = self.bpe.split_by_token(text, false).ok()?;
        let mut offsets = Vec::with_capacity(pieces.len() + 1);
        offsets.push(0usize);
        let mut pos = 0usize;
        for piece in &pieces {
            pos += piece.len();
            offsets.push(pos);
        }
        Some(offsets)
    }
}
