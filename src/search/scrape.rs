//! Search-page scraping
//!
//! Unauthenticated GET of a TripAdvisor or Viator search page, result anchors
//! picked with a CSS selector. No pagination, retries or anti-bot handling:
//! when the markup changes the selector simply stops matching.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

use super::{LinkFinder, SearchSource};
use crate::config::SearchConfig;
use crate::{CuratorError, Result};

/// One anchor found on a search page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedActivity {
    pub title: String,
    pub url: String,
}

pub struct ActivityScraper {
    client: Client,
    tripadvisor: (String, Selector),
    viator: (String, Selector),
    max_results: usize,
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CuratorError::search(format!("Invalid selector '{css}': {e:?}")))
}

impl ActivityScraper {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CuratorError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            tripadvisor: (
                config.tripadvisor_url.trim_end_matches('/').to_string(),
                parse_selector(&config.tripadvisor_selector)?,
            ),
            viator: (
                config.viator_url.trim_end_matches('/').to_string(),
                parse_selector(&config.viator_selector)?,
            ),
            max_results: config.max_results,
        })
    }

    /// Site root and result selector of a scrapable source
    fn site_for(&self, source: SearchSource) -> Result<(&str, &Selector)> {
        match source {
            SearchSource::Tripadvisor => Ok((&self.tripadvisor.0, &self.tripadvisor.1)),
            SearchSource::Viator => Ok((&self.viator.0, &self.viator.1)),
            other => Err(CuratorError::search(format!(
                "Scraping is not supported for {}",
                other.display_name()
            ))),
        }
    }

    /// Fetch the search page for `query` and collect the result anchors
    #[instrument(skip(self))]
    pub async fn scrape(&self, source: SearchSource, query: &str) -> Result<Vec<ScrapedActivity>> {
        let (root, selector) = self.site_for(source)?;
        let url = format!("{root}{}", source.search_path(query));
        debug!("Scraping {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CuratorError::search(format!("Request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CuratorError::search(format!(
                "{} answered {}",
                source.display_name(),
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CuratorError::search(format!("Failed to read {url}: {e}")))?;

        let results = extract_results(&body, selector, &format!("{root}/"), self.max_results);
        info!(
            "Scraped {} results from {} for '{}'",
            results.len(),
            source.display_name(),
            query
        );
        Ok(results)
    }
}

/// Anchors matching `selector`, hrefs resolved against `base`, deduplicated by URL
pub fn extract_results(
    html: &str,
    selector: &Selector,
    base: &str,
    max_results: usize,
) -> Vec<ScrapedActivity> {
    let document = Html::parse_document(html);
    let base = Url::parse(base).ok();
    let mut seen = HashSet::new();

    document
        .select(selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let url = match &base {
                Some(base) => base.join(href).ok()?,
                None => Url::parse(href).ok()?,
            };
            if !matches!(url.scheme(), "http" | "https") {
                return None;
            }
            let title = element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if title.is_empty() {
                return None;
            }
            Some(ScrapedActivity {
                title,
                url: url.to_string(),
            })
        })
        .filter(|activity| seen.insert(activity.url.clone()))
        .take(max_results)
        .collect()
}

#[async_trait]
impl LinkFinder for ActivityScraper {
    async fn find(&self, query: &str) -> Result<Option<String>> {
        let results = self.scrape(SearchSource::Tripadvisor, query).await?;
        Ok(results.into_iter().next().map(|activity| activity.url))
    }
}
