//! Request and result types shared by the CLI, the web form and the API

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::CuratorError;

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    #[serde(default)]
    pub preferences: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default = "default_days")]
    pub days: u8,
    #[serde(default)]
    pub test_mode: bool,
}

fn default_days() -> u8 {
    1
}

impl TripRequest {
    pub fn new(destination: impl Into<String>, preferences: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            preferences: preferences.into(),
            start_date: None,
            days: default_days(),
            test_mode: false,
        }
    }

    #[must_use]
    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    #[must_use]
    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    #[must_use]
    pub fn in_test_mode(mut self) -> Self {
        self.test_mode = true;
        self
    }

    /// Trim the free-text fields and check the request against the day limit
    pub fn validate(mut self, max_days: u8) -> Result<Self, CuratorError> {
        self.destination = self.destination.trim().to_string();
        self.preferences = self.preferences.trim().to_string();

        if self.destination.is_empty() {
            return Err(CuratorError::validation("Please enter a destination."));
        }
        if self.days == 0 || self.days > max_days {
            return Err(CuratorError::validation(format!(
                "Number of days must be between 1 and {max_days}."
            )));
        }
        Ok(self)
    }

    /// Calendar date of the given 1-based day, when a start date is known
    #[must_use]
    pub fn date_of_day(&self, number: u32) -> Option<NaiveDate> {
        let offset = i64::from(number.checked_sub(1)?);
        self.start_date
            .and_then(|start| start.checked_add_signed(Duration::days(offset)))
    }
}

/// The text of one `Day N:` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySegment {
    pub number: u32,
    pub date: Option<NaiveDate>,
    pub text: String,
}

/// Where the itinerary text came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItinerarySource {
    /// Generated by the model
    Live { model: String },
    /// Test mode sample text
    Sample,
    /// The model call failed and the sample was substituted
    Fallback { reason: String },
}

impl ItinerarySource {
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, ItinerarySource::Live { .. })
    }
}

/// A processed itinerary, ready to render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub destination: String,
    pub start_date: Option<NaiveDate>,
    pub markdown: String,
    pub days: Vec<DaySegment>,
    pub source: ItinerarySource,
}
