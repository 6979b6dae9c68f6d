// src/analyze/mod.rs
//! Heuristics that rank raw items before they are mapped.

pub mod importance;

pub use importance::{select_hot, HOT_CAP, HOT_KEYWORDS, MIN_FLAGGED};
