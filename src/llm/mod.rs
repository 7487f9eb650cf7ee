//! Completion providers
//!
//! The curator only needs one thing from a language model: a block of text for
//! a list of chat messages. `OpenAiClient` talks to an OpenAI compatible
//! chat-completion endpoint, `SampleProvider` answers with a fixed itinerary
//! (test mode).

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::prompt::ChatMessage;

pub mod openai;

pub use openai::OpenAiClient;

/// Body of a chat-completion call
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Returns the text of the first choice
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Hard-coded itinerary used in test mode and as the fallback
pub const SAMPLE_ITINERARY: &str = r#"Here is a handpicked plan for your trip!

Day 1:
Morning:
Start with coffee at El Gato Cafe, a cosy spot in Lavapies where resident cats wander between the tables.
Afternoon:
Visit the Prado Museum for Velazquez and Goya, then stroll through Retiro Park and rent a rowing boat on the lake. [Prado Museum](https://www.museodelprado.es/en)
Evening:
Dine at Mercado de San Miguel and graze on jamon, croquetas and vermouth.

Day 2:
Morning:
Explore Madrid Rio along the Manzanares river and stop by the Casa de Campo lake.
Afternoon:
Swim at Piscina Lago in Casa de Campo, an open-air pool with skyline views.
Evening:
Enjoy tapas on Cava Baja in La Latina, hopping between tiny family-run bars.

Day 3:
Morning:
Head to the Royal Palace early to beat the queues. [Royal Palace](https://www.patrimonionacional.es/en/visita/royal-palace-madrid)
Afternoon:
Lunch at Sobrino de Botin, the oldest restaurant in the world.
Evening:
Catch the sunset at Temple of Debod, then finish with churros at San Gines.
"#;

/// Answers every request with `SAMPLE_ITINERARY`
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleProvider;

#[async_trait]
impl CompletionProvider for SampleProvider {
    fn name(&self) -> &str {
        "sample"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        Ok(SAMPLE_ITINERARY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ChatMessage;

    #[tokio::test]
    async fn test_sample_provider_returns_sample() {
        let request = CompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![ChatMessage::user("Destination: Madrid")],
            temperature: 0.7,
        };
        let text = SampleProvider.complete(&request).await.unwrap();
        assert_eq!(text, SAMPLE_ITINERARY);
        assert!(text.contains("Day 3:"));
    }

    #[test]
    fn test_completion_request_body_shape() {
        let request = CompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![ChatMessage::system("guide"), ChatMessage::user("Madrid")],
            temperature: 0.5,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Madrid");
        assert!((body["temperature"].as_f64().unwrap() - 0.5).abs() < 1e-6);
    }
}
