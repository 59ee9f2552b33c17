//! # `ctxpack-data` Dataset I/O
//!
//! Dataset plumbing for the `ctxpack` packer:
//! * [`records`] for JSONL sample records.
//! * [`chat`] to filter and reformat chat datasets for re-publication.
//! * [`dataset`] to download and read hub-hosted parquet shards.
#![warn(missing_docs, unused)]

pub mod chat;
pub mod dataset;
pub mod records;
