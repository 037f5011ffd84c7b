//! Extraction: turns raw document text into candidate records.
//!
//! Leaves first: `normalizer` → `fields` / `experience` / `skills` (over the
//! fixed `vocabulary` and an optional `job` context) → `summary` → `pipeline`.
//! Everything below `handlers` is pure and synchronous.

pub mod experience;
pub mod fields;
pub mod handlers;
pub mod job;
pub mod normalizer;
pub mod pipeline;
pub mod sections;
pub mod skills;
pub mod summary;
pub mod vocabulary;
