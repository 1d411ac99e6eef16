//! Descriptive and comparative statistics over an insurance policy
//! dataset, built around a normalizer for its messy vehicle introduction
//! date column.
//!
//! The heart of the crate is [`intro_date::normalize`]: a total,
//! deterministic mapping from raw date tokens (including nulls, blanks,
//! and garbage) to either a canonical calendar date or an explicit
//! invalid marker. Everything else is a thin consumer of clean rows:
//! grouped premium/claims/loss-ratio summaries per province, gender, or
//! vehicle type, and a Welch two-sample test between portfolio segments.
//!
//! Rows enter through the [`source::RecordSource`] seam. Reading
//! delimited text, plotting, and persistence all live outside this
//! crate.

pub mod config;
pub mod intro_date;
pub mod record;
pub mod report;
pub mod source;
pub mod stats;
