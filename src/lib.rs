//! Travel Curator - handpicked travel itineraries from a language model
//!
//! A destination and free-text preferences become a prompt, the model's reply
//! is tidied up with a handful of regex passes (tone, day splitting, link
//! validation, Google Maps links, an Extra Details section) and rendered as
//! HTML.

pub mod cli;
pub mod config;
pub mod curator;
pub mod error;
pub mod llm;
pub mod logging;
pub mod models;
pub mod postprocess;
pub mod prompt;
pub mod render;
pub mod search;
pub mod web;

// Re-export core types for public API
pub use config::CuratorConfig;
pub use curator::Curator;
pub use error::CuratorError;
pub use llm::{CompletionProvider, CompletionRequest, OpenAiClient, SampleProvider};
pub use models::{DaySegment, Itinerary, ItinerarySource, TripRequest};
pub use search::{LinkFinder, NoLinkFinder, SearchLink, search_activities};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CuratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
