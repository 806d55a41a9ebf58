//! Insight cards.
//!
//! # Module Structure
//!
//! - `model`: [`InsightCard`] and the reference returned to callers
//! - `fallback`: Local keyword-matched quote pools
//! - `generator`: Remote-first card generation with local fallback
//! - `gallery`: Listing, pinning and deleting stored cards

mod fallback;
mod gallery;
mod generator;
mod model;

pub use fallback::{Topic, fallback_quote, quote_pool};
pub use gallery::InsightGallery;
pub use generator::{GeneratedInsight, InsightGenerator, InsightInput, QuoteSource};
pub use model::{InsightCard, InsightRef};
