//! Itinerary generation: prompt, completion, post-processing

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::CuratorConfig;
use crate::llm::{CompletionProvider, CompletionRequest, OpenAiClient, SAMPLE_ITINERARY};
use crate::models::{Itinerary, ItinerarySource, TripRequest};
use crate::postprocess::{
    add_google_maps_links, clean_to_days, correct_links, link_extra_details, polish_tone,
    prune_dead_links, split_days, validate_links,
};
use crate::prompt::build_messages;
use crate::search::{ActivityScraper, LinkFinder, NoLinkFinder};
use crate::{CuratorError, Result};

pub struct Curator {
    config: CuratorConfig,
    provider: Arc<dyn CompletionProvider>,
    finder: Arc<dyn LinkFinder>,
    link_checker: Option<reqwest::Client>,
}

impl Curator {
    pub fn new(
        config: CuratorConfig,
        provider: Arc<dyn CompletionProvider>,
        finder: Arc<dyn LinkFinder>,
    ) -> Self {
        Self {
            config,
            provider,
            finder,
            link_checker: None,
        }
    }

    /// OpenAI client plus the scraper when `search.scrape_enabled` is set
    pub fn from_config(config: CuratorConfig) -> Result<Self> {
        let provider: Arc<dyn CompletionProvider> = Arc::new(OpenAiClient::new(&config.llm)?);
        let finder: Arc<dyn LinkFinder> = if config.search.scrape_enabled {
            Arc::new(ActivityScraper::new(&config.search)?)
        } else {
            Arc::new(NoLinkFinder)
        };

        let link_checker = if config.search.check_links {
            Some(
                reqwest::Client::builder()
                    .timeout(Duration::from_secs(config.search.timeout_seconds.into()))
                    .user_agent(config.search.user_agent.as_str())
                    .build()
                    .map_err(|e| {
                        CuratorError::config(format!("Failed to create HTTP client: {e}"))
                    })?,
            )
        } else {
            None
        };

        Ok(Self {
            link_checker,
            ..Self::new(config, provider, finder)
        })
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    #[instrument(skip(self, request), fields(destination = %request.destination, days = request.days))]
    pub async fn generate(&self, request: TripRequest) -> Result<Itinerary> {
        let request = request.validate(self.config.defaults.max_days)?;

        let (raw, source) = if request.test_mode || self.config.llm.test_mode {
            info!("Test mode: using the sample itinerary");
            (SAMPLE_ITINERARY.to_string(), ItinerarySource::Sample)
        } else {
            self.complete(&request).await?
        };

        let markdown = self.process(&raw, &request).await;
        let days = split_days(&markdown)
            .into_iter()
            .map(|mut day| {
                day.date = request.date_of_day(day.number);
                day
            })
            .collect();

        Ok(Itinerary {
            destination: request.destination,
            start_date: request.start_date,
            markdown,
            days,
            source,
        })
    }

    async fn complete(&self, request: &TripRequest) -> Result<(String, ItinerarySource)> {
        let completion = CompletionRequest {
            model: self.config.llm.model.clone(),
            messages: build_messages(request),
            temperature: self.config.llm.temperature,
        };
        debug!("User prompt:\n{}", completion.messages[1].content);

        match self.provider.complete(&completion).await {
            Ok(text) => Ok((
                text,
                ItinerarySource::Live {
                    model: completion.model,
                },
            )),
            Err(e) if self.config.llm.fallback_to_sample => {
                warn!(
                    "{} provider failed, falling back to the sample itinerary: {}",
                    self.provider.name(),
                    e
                );
                Ok((
                    SAMPLE_ITINERARY.to_string(),
                    ItinerarySource::Fallback {
                        reason: e.user_message(),
                    },
                ))
            }
            Err(e) => Err(e),
        }
    }

    async fn process(&self, raw: &str, request: &TripRequest) -> String {
        let destination = request.destination.as_str();

        let text = polish_tone(raw);
        let text = clean_to_days(&text, request.days.into());
        let text = validate_links(&text);
        let mut text = correct_links(&text, destination, self.finder.as_ref()).await;
        if let Some(client) = &self.link_checker {
            text = prune_dead_links(&text, client).await;
        }
        let text = add_google_maps_links(&text, destination);
        link_extra_details(&text, destination)
    }
}
