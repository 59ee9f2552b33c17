//! # Common Types and Traits

use core::{
    fmt::{Debug, Display},
    hash::Hash,
};

use num_traits::{FromPrimitive, PrimInt, ToPrimitive, Unsigned};
use serde::{Deserialize, Serialize};

/// A type that can be used as a token id in packed training examples.
///
/// These are constrained to be unsigned primitive integers;
/// such that the max token in a vocabulary is less than `T::max()`.
pub trait TokenType:
    'static
    + PrimInt
    + FromPrimitive
    + ToPrimitive
    + Unsigned
    + Hash
    + Default
    + Debug
    + Display
    + Send
    + Sync
{
}

impl<T> TokenType for T where
    T: 'static
        + PrimInt
        + FromPrimitive
        + ToPrimitive
        + Unsigned
        + Hash
        + Default
        + Debug
        + Display
        + Send
        + Sync
{
}

/// A key-value sample record with a designated text field.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One fixed-length training example.
///
/// The three arrays are parallel and all exactly `context_length` long:
/// the attention mask is all ones (no padding is ever present), and the
/// labels equal the input ids (self-supervised next-token prediction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedExample<T> {
    /// The packed token ids.
    pub input_ids: Vec<T>,

    /// All-ones attention mask.
    pub attention_mask: Vec<u8>,

    /// Training labels; identical to [`Self::input_ids`].
    pub labels: Vec<T>,
}

impl<T: TokenType> PackedExample<T> {
    /// Build an example from one full-length chunk.
    pub fn from_chunk(chunk: Vec<T>) -> Self {
        let mask = vec![1; chunk.len()];
        Self {
            input_ids: chunk.clone(),
            attention_mask: mask,
            labels: chunk,
        }
    }

    /// The number of tokens in the example.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// True if the example holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use core::marker::PhantomData;

    use super::*;

    #[test]
    fn test_common_token_types() {
        struct IsToken<T: TokenType>(PhantomData<T>);

        let _: IsToken<u16>;
        let _: IsToken<u32>;
        let _: IsToken<u64>;
        let _: IsToken<usize>;
    }

    #[test]
    fn test_from_chunk() {
        let example: PackedExample<u32> = PackedExample::from_chunk(vec![10, 11, 2]);

        assert_eq!(example.len(), 3);
        assert!(!example.is_empty());
        assert_eq!(example.input_ids, vec![10, 11, 2]);
        assert_eq!(example.attention_mask, vec![1, 1, 1]);
        assert_eq!(example.labels, example.input_ids);
    }
}
