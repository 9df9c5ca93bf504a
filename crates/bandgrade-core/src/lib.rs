//! bandgrade-core — content encoding and auto-grading for IELTS-style tests.
//!
//! This crate defines the marker grammar, question model, answer matching,
//! and band-score grading that the rest of bandgrade builds on. Everything
//! here is synchronous and I/O-free except the file loaders in [`parser`]
//! and [`report`].

pub mod bands;
pub mod document;
pub mod error;
pub mod grading;
pub mod markup;
pub mod matcher;
pub mod model;
pub mod numbering;
pub mod parser;
pub mod reconcile;
pub mod report;
pub mod student;
