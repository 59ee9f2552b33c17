//! # `ctxpack` Context-Window Packing
//!
//! Data preparation for padding-free continual pretraining of causal
//! language models.
//!
//! The core operation is [`packer::Packer`]: a lazy iterator which
//! concatenates tokenized text samples (with an end-of-sequence marker
//! between documents) and slices the resulting token stream into
//! fixed-length [`PackedExample`] chunks. Every emitted example is
//! exactly `context_length` tokens long; the trailing partial chunk at
//! end-of-stream is discarded, never padded.
//!
//! See:
//! * [`packer`] to pack sample records into training examples.
//! * [`tokenize`] for the tokenizer seam (and the `hf` adapter).
//! * [`plan`] to derive a training step schedule from a token budget.
//!
//! ## Crate Features
//!
//! #### feature: ``hf``
//!
//! Enables an adapter over the Hugging Face ``tokenizers`` crate for
//! loading ``tokenizer.json`` files.
#![warn(missing_docs, unused)]

pub mod errors;
pub mod packer;
pub mod plan;
pub mod tokenize;
pub mod types;

#[doc(inline)]
pub use errors::{CPResult, CtxpackError};
#[doc(inline)]
pub use packer::{PackOptions, Packer};
#[doc(inline)]
pub use plan::{TrainPlan, TrainPlanOptions};
#[doc(inline)]
pub use tokenize::SampleTokenizer;
#[doc(inline)]
pub use types::{PackedExample, Record, TokenType};
