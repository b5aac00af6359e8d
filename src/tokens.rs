use once_cell::sync::OnceCell;
use tiktoken_rs::CoreBPE;

use crate::config::MAX_TOKENS_PER_PAGE;
use crate::error::{PipelineError, Result};

/// Appended to text that was cut at the token limit.
pub const ELLIPSIS: &str = "...";

/// How far a cut may move back to avoid splitting a multi-byte character.
const MAX_BOUNDARY_BACKOFF: usize = 3;

/// Special tokens of `o200k_base`. Text spelling one of them does not
/// encode.
const O200K_SPECIAL_TOKENS: [&str; 2] = ["<|endoftext|>", "<|endofprompt|>"];

static O200K: OnceCell<CoreBPE> = OnceCell::new();

/// A fixed token table. Truncation is only stable if encode and decode agree
/// on the same table for the life of the process.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// The `o200k_base` encoding used by the gpt-4o model family.
#[derive(Debug, Default, Clone, Copy)]
pub struct TiktokenCodec;

impl TiktokenCodec {
    fn bpe() -> Result<&'static CoreBPE> {
        O200K
            .get_or_try_init(tiktoken_rs::o200k_base)
            .map_err(|e| PipelineError::TruncationFailure(format!("loading o200k_base: {e}")))
    }
}

impl TokenCodec for TiktokenCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        if let Some(special) = O200K_SPECIAL_TOKENS.iter().find(|t| text.contains(*t)) {
            return Err(PipelineError::TruncationFailure(format!(
                "text contains disallowed special token {special}"
            )));
        }
        let bpe = Self::bpe()?;
        Ok(bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|rank| rank as u32)
            .collect())
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        let bpe = Self::bpe()?;
        bpe.decode(tokens.iter().map(|&t| t as _).collect())
            .map_err(|e| PipelineError::TruncationFailure(e.to_string()))
    }
}

/// Bounds text to a token budget.
pub struct Truncator {
    codec: Box<dyn TokenCodec>,
    limit: usize,
}

impl Truncator {
    pub fn new(codec: Box<dyn TokenCodec>, limit: usize) -> Self {
        Self { codec, limit }
    }

    pub fn tiktoken(limit: usize) -> Self {
        Self::new(Box::new(TiktokenCodec), limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn count(&self, text: &str) -> Result<usize> {
        Ok(self.codec.encode(text)?.len())
    }

    /// Returns `text` unchanged if it fits, otherwise the first `limit`
    /// tokens followed by [`ELLIPSIS`]. Text that is already the output of a
    /// cut at this limit is returned unchanged.
    pub fn truncate(&self, text: &str) -> Result<String> {
        let tokens = self.codec.encode(text)?;
        if tokens.len() <= self.limit {
            return Ok(text.to_string());
        }

        if let Some(body) = text.strip_suffix(ELLIPSIS) {
            if self.codec.encode(body)?.len() <= self.limit {
                return Ok(text.to_string());
            }
        }

        let head = self.decode_prefix(&tokens)?;
        Ok(format!("{head}{ELLIPSIS}"))
    }

    fn decode_prefix(&self, tokens: &[u32]) -> Result<String> {
        let floor = self.limit.saturating_sub(MAX_BOUNDARY_BACKOFF);
        let mut last_err = None;
        for cut in (floor..=self.limit).rev() {
            match self.codec.decode(&tokens[..cut]) {
                Ok(head) => return Ok(head),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            PipelineError::TruncationFailure("no decodable prefix".to_string())
        }))
    }
}

impl Default for Truncator {
    fn default() -> Self {
        Self::tiktoken(MAX_TOKENS_PER_PAGE)
    }
}
