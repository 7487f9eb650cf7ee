//! Prompt construction for the itinerary request

use serde::{Deserialize, Serialize};

use crate::models::TripRequest;

/// System prompt: the model plays a trusted local guide
pub const CURATOR_PROMPT: &str = r#"You are a trusted local guide and travel curator. Your mission is to create a handpicked itinerary of the best activities, attractions, and restaurants for the user, matching their request as closely as possible. Prioritize unique, authentic, and memorable experiences, as if you are personally guiding a friend.

**Your approach:**
1. Search widely across reliable sources, including travel blogs, local guides, travel magazines (e.g., CN Traveler), and review sites like TripAdvisor, before making recommendations.
2. If the user has niche requests (e.g., "see as many cats as possible"), creatively interpret this into related real-world activities (e.g., cat cafes, animal rescue centers, nature reserves).
3. Always provide at least one verified link for each recommendation:
   - Prefer official websites.
   - If unavailable, use reputable sources like CN Traveler or TripAdvisor.
4. If you cannot find an activity that matches exactly, fall back to a high-quality, generic recommendation that suits the tone of the itinerary.
5. Never invent details. Do not fabricate activities or links.
6. Write in the tone of a friendly local: conversational, warm, and trustworthy.

**Format:**
Morning:
[Activity + short, enticing description with a link]
Afternoon:
[Activity + short, enticing description with a link]
Evening:
[Activity + short, enticing description with a link]
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The curator prompt followed by the user's trip details
pub fn build_messages(request: &TripRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CURATOR_PROMPT),
        ChatMessage::user(user_prompt(request)),
    ]
}

pub fn user_prompt(request: &TripRequest) -> String {
    let preferences = if request.preferences.trim().is_empty() {
        "No particular preferences"
    } else {
        request.preferences.trim()
    };

    let mut prompt = format!(
        "Destination: {}\nPreferences: {}\n",
        request.destination.trim(),
        preferences
    );

    if let Some(start) = request.start_date {
        prompt.push_str(&format!("Start date: {}\n", start.format("%A %-d %B %Y")));
    }

    if request.days <= 1 {
        prompt.push_str("Create a one-day itinerary.");
        return prompt;
    }

    prompt.push_str(&format!(
        "Create a {}-day itinerary. Start each day on its own line with the literal marker ",
        request.days
    ));
    match request.date_of_day(1) {
        Some(first) => prompt.push_str(&format!(
            "\"Day N (date):\", for example \"Day 1 ({}):\".",
            day_label(first)
        )),
        None => prompt.push_str("\"Day N:\", for example \"Day 1:\"."),
    }
    prompt.push_str(" Use the Morning / Afternoon / Evening format inside every day.");
    prompt
}

/// Short date label used in day markers, e.g. `Mon 12 May`
pub fn day_label(date: chrono::NaiveDate) -> String {
    date.format("%a %-d %b").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_messages_have_system_then_user() {
        let messages = build_messages(&TripRequest::new("Madrid", "cats"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("trusted local guide"));
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("Destination: Madrid"));
        assert!(messages[1].content.contains("Preferences: cats"));
    }

    #[test]
    fn test_one_day_prompt() {
        let prompt = user_prompt(&TripRequest::new("Madrid", ""));
        assert!(prompt.contains("Preferences: No particular preferences"));
        assert!(prompt.ends_with("Create a one-day itinerary."));
        assert!(!prompt.contains("Day 1"));
    }

    #[test]
    fn test_multi_day_prompt_asks_for_markers() {
        let prompt = user_prompt(&TripRequest::new("Porto", "wine").with_days(3));
        assert!(prompt.contains("Create a 3-day itinerary"));
        assert!(prompt.contains("\"Day 1:\""));
    }

    #[test]
    fn test_multi_day_prompt_with_dates() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap();
        let prompt = user_prompt(&TripRequest::new("Porto", "").with_days(2).starting(start));
        assert!(prompt.contains("Start date: Monday 12 May 2025"));
        assert!(prompt.contains("\"Day 1 (Mon 12 May):\""));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
