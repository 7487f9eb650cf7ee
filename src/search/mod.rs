//! Activity search helpers
//!
//! Search-page URL templates for the sources the curator trusts, in priority
//! order, plus the `LinkFinder` seam used to backfill links the model left out.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

pub mod scrape;

pub use scrape::ActivityScraper;

/// Where a search link points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    Tripadvisor,
    Viator,
    NomadicMatt,
    CnTraveler,
    TimeOut,
}

impl SearchSource {
    /// All sources, most trusted first
    pub const ALL: [SearchSource; 5] = [
        SearchSource::Tripadvisor,
        SearchSource::Viator,
        SearchSource::NomadicMatt,
        SearchSource::CnTraveler,
        SearchSource::TimeOut,
    ];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            SearchSource::Tripadvisor => "Tripadvisor",
            SearchSource::Viator => "Viator",
            SearchSource::NomadicMatt => "Nomadic Matt",
            SearchSource::CnTraveler => "CN Traveler",
            SearchSource::TimeOut => "Time Out",
        }
    }

    #[must_use]
    pub fn is_blog(self) -> bool {
        !matches!(self, SearchSource::Tripadvisor | SearchSource::Viator)
    }

    /// Scheme and host of the source's site, no trailing slash
    #[must_use]
    pub fn site_root(self) -> &'static str {
        match self {
            SearchSource::Tripadvisor => "https://www.tripadvisor.com",
            SearchSource::Viator => "https://www.viator.com",
            SearchSource::NomadicMatt => "https://www.nomadicmatt.com",
            SearchSource::CnTraveler => "https://www.cntraveler.com",
            SearchSource::TimeOut => "https://www.timeout.com",
        }
    }

    /// Path and query of the search page for a free-text query
    #[must_use]
    pub fn search_path(self, query: &str) -> String {
        let q = plus_encode(query);
        match self {
            SearchSource::Tripadvisor => format!("/Search?q={q}&searchSessionId="),
            SearchSource::Viator => format!("/searchResults/all?text={q}"),
            SearchSource::NomadicMatt => format!("/travel-blogs/?s={q}"),
            SearchSource::CnTraveler => format!("/search?q={q}"),
            SearchSource::TimeOut => format!("/search?query={q}"),
        }
    }

    /// Search page URL for a free-text query
    #[must_use]
    pub fn search_url(self, query: &str) -> String {
        format!("{}{}", self.site_root(), self.search_path(query))
    }
}

/// A search page for one destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLink {
    pub source: SearchSource,
    pub destination: String,
    pub url: String,
}

impl fmt::Display for SearchLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.is_blog() {
            write!(f, "Blog/Magazine search: {}", self.url)
        } else {
            write!(
                f,
                "{} search results for {}: {}",
                self.source.display_name(),
                self.destination,
                self.url
            )
        }
    }
}

/// Query-string encoding with spaces as `+`
pub fn plus_encode(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

/// Search pages for a destination: TripAdvisor, Viator, then blogs and magazines
pub fn search_activities(destination: &str) -> Vec<SearchLink> {
    let destination = destination.trim();
    SearchSource::ALL
        .iter()
        .map(|&source| SearchLink {
            source,
            destination: destination.to_string(),
            url: source.search_url(destination),
        })
        .collect()
}

/// Looks up a single link for a free-text query
#[async_trait]
pub trait LinkFinder: Send + Sync {
    async fn find(&self, query: &str) -> Result<Option<String>>;
}

/// Never finds anything; the default when scraping is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLinkFinder;

#[async_trait]
impl LinkFinder for NoLinkFinder {
    async fn find(&self, _query: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Try the official site, then CN Traveler / TripAdvisor, then a generic best-of query
pub async fn get_activity_link(
    finder: &dyn LinkFinder,
    name: &str,
    location: &str,
) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let queries = [
        format!("{name} official site {location}"),
        format!("{name} site:cntraveler.com OR site:tripadvisor.com {location}"),
        format!("best {name} {location}"),
    ];

    for query in &queries {
        debug!("Searching link for query: {}", query);
        match finder.find(query).await {
            Ok(Some(link)) => return Some(link),
            Ok(None) => {}
            Err(e) => warn!("Link search failed for '{}': {}", query, e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CuratorError;
    use std::sync::Mutex;

    #[test]
    fn test_search_activities_priority_order() {
        let links = search_activities("New York");
        assert_eq!(links.len(), 5);
        assert_eq!(links[0].source, SearchSource::Tripadvisor);
        assert_eq!(links[1].source, SearchSource::Viator);
        assert_eq!(
            links[0].url,
            "https://www.tripadvisor.com/Search?q=New+York&searchSessionId="
        );
        assert_eq!(
            links[1].url,
            "https://www.viator.com/searchResults/all?text=New+York"
        );
        assert_eq!(links[4].url, "https://www.timeout.com/search?query=New+York");
    }

    #[test]
    fn test_search_link_display() {
        let links = search_activities("Madrid");
        assert_eq!(
            links[0].to_string(),
            "Tripadvisor search results for Madrid: https://www.tripadvisor.com/Search?q=Madrid&searchSessionId="
        );
        assert_eq!(
            links[2].to_string(),
            "Blog/Magazine search: https://www.nomadicmatt.com/travel-blogs/?s=Madrid"
        );
    }

    #[test]
    fn test_plus_encode_escapes_reserved_characters() {
        assert_eq!(plus_encode("São Paulo & more"), "S%C3%A3o+Paulo+%26+more");
        assert_eq!(plus_encode("  Rome  "), "Rome");
    }

    struct RecordingFinder {
        queries: Mutex<Vec<String>>,
        answer_on: usize,
    }

    #[async_trait]
    impl LinkFinder for RecordingFinder {
        async fn find(&self, query: &str) -> Result<Option<String>> {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.to_string());
            if queries.len() == self.answer_on {
                Ok(Some("https://example.com/found".into()))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn test_get_activity_link_tries_queries_in_order() {
        let finder = RecordingFinder {
            queries: Mutex::new(Vec::new()),
            answer_on: 2,
        };
        let link = get_activity_link(&finder, "Prado Museum", "Madrid").await;
        assert_eq!(link.as_deref(), Some("https://example.com/found"));

        let queries = finder.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], "Prado Museum official site Madrid");
        assert!(queries[1].contains("site:cntraveler.com OR site:tripadvisor.com"));
    }

    #[tokio::test]
    async fn test_get_activity_link_blank_name() {
        assert_eq!(get_activity_link(&NoLinkFinder, "  ", "Madrid").await, None);
    }

    struct FailingFinder;

    #[async_trait]
    impl LinkFinder for FailingFinder {
        async fn find(&self, _query: &str) -> Result<Option<String>> {
            Err(CuratorError::search("blocked"))
        }
    }

    #[tokio::test]
    async fn test_get_activity_link_treats_errors_as_misses() {
        assert_eq!(get_activity_link(&FailingFinder, "Retiro Park", "Madrid").await, None);
    }
}
