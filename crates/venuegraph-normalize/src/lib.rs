//! Venue-name normalization for Venuegraph
//!
//! Turns noisy venue strings from bibliographic metadata into canonical node
//! identifiers for the venue graph:
//!
//! ```text
//! "3rd International Conference on Machine Learning (ICML) 2020"
//!        │  clean_phrase: parens, symbols, dates, ordinals, filler
//!        ▼
//! "international conference on machine learning"
//!        │  abbreviation cache hit, or extraction + initials scan
//!        ▼
//! "icml"
//! ```
//!
//! - [`VenueNormalizer::preprocess`] / [`VenueNormalizer::preprocess_venue`]
//!   produce a [`VenueToken`].
//! - [`AbbreviationCache`] is the learned phrase → abbreviation map.
//! - [`VenueNormalizer::postprocess`] folds full-name keys of a weight
//!   mapping into their abbreviations.

pub mod abbreviation;
pub mod cache;
pub mod error;
pub mod merge;
pub mod normalizer;
mod patterns;

pub use abbreviation::{extract_abbreviation, matches_initials, MIN_ABBREVIATION_LEN};
pub use cache::{AbbreviationCache, SEEDED_ABBREVIATIONS};
pub use error::{NormalizeError, Result};
pub use merge::{merge_abbreviated_keys, MergeOutcome, WeightMapping};
pub use normalizer::{clean_phrase, VenueNormalizer, VenueToken, SENTINEL_VENUES, WEEKDAY_ABBREVIATIONS};
