//! # Sequence Packer
//!
//! Concatenates ("packs") tokenized samples into fixed-length chunks of
//! `context_length` tokens, for efficient training of causal models
//! without padding. No measures are taken to disallow a sequence
//! attending to a previous sequence within a chunk; the model is left to
//! learn the unrelatedness of documents from the end-of-sequence marker
//! inserted between them, following the GPT-3 / T5 convention.
//!
//! The incomplete final chunk is discarded.

use crate::{
    errors::{CPResult, CtxpackError},
    tokenize::SampleTokenizer,
    types::{PackedExample, Record, TokenType},
};

/// The end-of-sequence marker id conventionally used by the Mistral
/// model family; present in its pretraining data, but not appended
/// automatically by its tokenizer.
pub const DEFAULT_EOS_TOKEN: u32 = 2;

/// The conventional key of the text field in sample records.
pub const DEFAULT_TEXT_KEY: &str = "text";

/// Options for configuring a [`Packer`].
#[derive(Debug, Clone, PartialEq)]
pub struct PackOptions<T: TokenType> {
    /// The number of tokens in each packed example.
    pub context_length: usize,

    /// The marker token appended after each tokenized document.
    ///
    /// Defaults to [`DEFAULT_EOS_TOKEN`]; override this when targeting a
    /// tokenizer with a different marker id.
    pub eos_token: T,

    /// The key of the text field in sample records.
    pub text_key: String,
}

impl<T: TokenType> PackOptions<T> {
    /// Construct options for the given context length.
    pub fn new(context_length: usize) -> Self {
        Self {
            context_length,
            eos_token: T::from_u32(DEFAULT_EOS_TOKEN).unwrap(),
            text_key: DEFAULT_TEXT_KEY.to_string(),
        }
    }

    /// Sets the end-of-sequence marker token.
    pub fn with_eos_token(
        mut self,
        eos_token: T,
    ) -> Self {
        self.eos_token = eos_token;
        self
    }

    /// Sets the text field key.
    pub fn with_text_key<S: Into<String>>(
        mut self,
        text_key: S,
    ) -> Self {
        self.text_key = text_key.into();
        self
    }

    /// Build a [`Packer`] over the given tokenizer and sample stream.
    ///
    /// ## Arguments
    /// * `tokenizer` - The tokenizing function.
    /// * `samples` - The sample record stream, consumed in order.
    ///
    /// ## Returns
    /// A lazy packed-example iterator, or an error if
    /// [`Self::context_length`] is zero.
    pub fn pack<'a, I>(
        self,
        tokenizer: &'a dyn SampleTokenizer<T>,
        samples: I,
    ) -> CPResult<Packer<'a, T, I::IntoIter>>
    where
        I: IntoIterator<Item = CPResult<Record>>,
    {
        if self.context_length == 0 {
            return Err(CtxpackError::InvalidContextLength { length: 0 });
        }

        Ok(Packer {
            options: self,
            tokenizer,
            samples: samples.into_iter(),
            cache: Vec::new(),
            fused: false,
        })
    }
}

/// A lazy packed-example iterator.
///
/// Each pull consumes as many input samples as needed to accumulate one
/// full chunk; the token cache is owned exclusively by this instance.
/// The iterator fuses after the first error, and the trailing partial
/// chunk at end-of-stream is dropped without emission.
///
/// Re-invoking [`PackOptions::pack`] over the same input restarts from
/// scratch; there is no mid-stream resume.
pub struct Packer<'a, T: TokenType, I>
where
    I: Iterator<Item = CPResult<Record>>,
{
    options: PackOptions<T>,
    tokenizer: &'a dyn SampleTokenizer<T>,
    samples: I,
    cache: Vec<T>,
    fused: bool,
}

impl<T: TokenType, I> Packer<'_, T, I>
where
    I: Iterator<Item = CPResult<Record>>,
{
    /// Tokenize one record's text field into the cache.
    fn extend_from_record(
        &mut self,
        record: &Record,
    ) -> CPResult<()> {
        let key = &self.options.text_key;

        let value = record
            .get(key)
            .ok_or_else(|| CtxpackError::MissingTextField { key: key.clone() })?;
        let text = value
            .as_str()
            .ok_or_else(|| CtxpackError::TextFieldNotString { key: key.clone() })?;

        let ids = self.tokenizer.try_tokenize(text)?;

        self.cache.extend(ids);
        self.cache.push(self.options.eos_token);
        Ok(())
    }
}

impl<T: TokenType, I> Iterator for Packer<'_, T, I>
where
    I: Iterator<Item = CPResult<Record>>,
{
    type Item = CPResult<PackedExample<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }

        let context_length = self.options.context_length;
        loop {
            if self.cache.len() >= context_length {
                let chunk: Vec<T> = self.cache.drain(..context_length).collect();
                return Some(Ok(PackedExample::from_chunk(chunk)));
            }

            let record = match self.samples.next() {
                None => {
                    // End of input; the partial cache is discarded.
                    self.fused = true;
                    self.cache.clear();
                    return None;
                }
                Some(Ok(record)) => record,
                Some(Err(err)) => {
                    self.fused = true;
                    return Some(Err(err));
                }
            };

            if let Err(err) = self.extend_from_record(&record) {
                self.fused = true;
                return Some(Err(err));
            }
        }
    }
}
