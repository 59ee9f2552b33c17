//! # Tokenizer Seam
//!
//! The packer only depends on the tokenize-to-ids capability; any pad or
//! special-token policy belongs to the surrounding training setup.

use crate::{
    errors::{CPResult, CtxpackError},
    types::TokenType,
};

/// A trait for sample tokenizers.
pub trait SampleTokenizer<T: TokenType>: Send + Sync {
    /// Tokenize raw text into an ordered sequence of token ids.
    ///
    /// Implementations must not truncate: the packer imposes no upper
    /// bound on a single document's token count.
    ///
    /// ## Arguments
    /// * `text` - The text to tokenize.
    ///
    /// ## Returns
    /// A `Result` containing the token ids or an error.
    fn try_tokenize(
        &self,
        text: &str,
    ) -> CPResult<Vec<T>>;
}

/// A [`SampleTokenizer`] over a Hugging Face `tokenizers` tokenizer.
///
/// Special tokens are *not* added during encoding; the packer appends
/// the end-of-sequence marker itself.
#[cfg(feature = "hf")]
pub struct HfSampleTokenizer {
    tokenizer: tokenizers::Tokenizer,
}

#[cfg(feature = "hf")]
impl HfSampleTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file.
    ///
    /// Any truncation configured in the file is disabled.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> CPResult<Self> {
        let mut tokenizer = tokenizers::Tokenizer::from_file(path)
            .map_err(|err| CtxpackError::Tokenizer(err.to_string()))?;

        tokenizer
            .with_truncation(None)
            .map_err(|err| CtxpackError::Tokenizer(err.to_string()))?;

        Ok(Self { tokenizer })
    }

    /// Wrap an already-configured tokenizer.
    pub fn new(tokenizer: tokenizers::Tokenizer) -> Self {
        Self { tokenizer }
    }
}

#[cfg(feature = "hf")]
impl<T: TokenType> SampleTokenizer<T> for HfSampleTokenizer {
    fn try_tokenize(
        &self,
        text: &str,
    ) -> CPResult<Vec<T>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|err| CtxpackError::Tokenizer(err.to_string()))?;

        narrow_ids(encoding.get_ids())
    }
}

/// Narrow raw `u32` token ids into the target token type.
///
/// Fails with [`CtxpackError::TokenOutOfRange`] on the first id that
/// does not fit.
pub fn narrow_ids<T: TokenType>(ids: &[u32]) -> CPResult<Vec<T>> {
    ids.iter()
        .map(|&id| T::from_u32(id).ok_or(CtxpackError::TokenOutOfRange { token: id as u64 }))
        .collect()
}

/// Test tokenizers and record builders.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;
    use crate::{errors::CtxpackError, types::Record};

    /// Maps each character to its base-36 ordinal: `'a' -> 10`, `'b' -> 11`, ...
    pub struct OrdinalTokenizer;

    impl SampleTokenizer<u32> for OrdinalTokenizer {
        fn try_tokenize(
            &self,
            text: &str,
        ) -> CPResult<Vec<u32>> {
            text.chars()
                .map(|c| {
                    c.to_digit(36)
                        .ok_or_else(|| CtxpackError::Tokenizer(format!("non-ordinal char {c:?}")))
                })
                .collect()
        }
    }

    /// Build `{"text": ...}` records from raw strings.
    pub fn text_records(texts: &[&str]) -> Vec<CPResult<Record>> {
        texts
            .iter()
            .map(|text| {
                let mut record = Record::new();
                record.insert("text".to_string(), serde_json::Value::from(*text));
                Ok(record)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_ids_in_range() {
        let ids = narrow_ids::<u16>(&[0, 2, 65_535]).unwrap();
        assert_eq!(ids, vec![0, 2, 65_535]);
    }

    #[test]
    fn test_narrow_ids_overflow() {
        assert!(matches!(
            narrow_ids::<u16>(&[70_000]),
            Err(CtxpackError::TokenOutOfRange { token: 70_000 })
        ));
    }

    #[cfg(feature = "hf")]
    #[test]
    fn test_hf_tokenizer_encodes_without_specials() {
        use std::collections::HashMap;

        use tokenizers::models::wordlevel::WordLevel;

        let vocab: HashMap<String, u32> =
            HashMap::from([("<unk>".to_string(), 0), ("ciao".to_string(), 7)]);

        let model = WordLevel::builder()
            .vocab(vocab.into_iter().collect())
            .unk_token("<unk>".to_string())
            .build()
            .unwrap();

        let tokenizer = HfSampleTokenizer::new(tokenizers::Tokenizer::new(model));

        // No pre-tokenizer configured, so the whole input is looked up
        // as a single word, and nothing is added around it.
        let ids: Vec<u32> = tokenizer.try_tokenize("ciao").unwrap();
        assert_eq!(ids, vec![7]);

        let unknown: Vec<u32> = tokenizer.try_tokenize("bonjour").unwrap();
        assert_eq!(unknown, vec![0]);
    }
}
