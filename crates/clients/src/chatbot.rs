//! Recycling assistant backed by the Gemini `generateContent` API.

use serde::Deserialize;
use serde_json::json;

use crate::{ensure_success, ClientError};

/// Reply used when no API key is configured.
pub const MISSING_KEY_REPLY: &str = "Chatbot unavailable (missing API key). Please try later.";

/// Reply used when the upstream call fails.
pub const ERROR_REPLY: &str = "Sorry, I had trouble answering. Please try again later.";

/// Reply used when the model answered without any text.
pub const EMPTY_REPLY: &str = "I couldn't generate a response.";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

pub struct ChatbotClient {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatbotClient {
    /// An empty `api_key` disables upstream calls.
    pub fn new(api_url: String, model: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            api_key: Some(api_key).filter(|k| !k.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Answer `message`, falling back to a fixed reply on any failure.
    pub async fn reply(&self, message: &str) -> String {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("Chatbot called without an API key");
            return MISSING_KEY_REPLY.to_string();
        };

        match self.generate(api_key, message).await {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_REPLY.to_string(),
            Err(e) => {
                tracing::error!(error = %e, model = %self.model, "Chatbot request failed");
                ERROR_REPLY.to_string()
            }
        }
    }

    async fn generate(&self, api_key: &str, message: &str) -> Result<Option<String>, ClientError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt_for(message) }] }],
        });

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.api_url, self.model
            ))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let parsed: GenerateResponse = ensure_success(response).await?.json().await?;
        Ok(extract_text(parsed))
    }
}

fn prompt_for(message: &str) -> String {
    format!(
        "You are EcoSortAI, an assistant that helps with waste management and recycling.\n\
         User: {message}\nAssistant:"
    )
}

/// Concatenated text of the first candidate, if it has any.
fn extract_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    Some(text).filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Option<String> {
        extract_text(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let body = r#"{"candidates":[
            {"content":{"parts":[{"text":"Rinse the can, "},{"text":"then recycle it."}]}},
            {"content":{"parts":[{"text":"ignored"}]}}
        ]}"#;
        assert_eq!(parse(body).as_deref(), Some("Rinse the can, then recycle it."));
    }

    #[test]
    fn no_candidates_means_no_text() {
        assert_eq!(parse(r#"{"candidates":[]}"#), None);
        assert_eq!(parse(r#"{}"#), None);
        assert_eq!(parse(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#), None);
    }

    #[test]
    fn prompt_carries_message() {
        let prompt = prompt_for("Where do batteries go?");
        assert!(prompt.starts_with("You are EcoSortAI"));
        assert!(prompt.ends_with("User: Where do batteries go?\nAssistant:"));
    }

    #[tokio::test]
    async fn missing_key_short_circuits() {
        let bot = ChatbotClient::new("http://127.0.0.1:1".into(), "m".into(), String::new());
        assert!(!bot.is_configured());
        assert_eq!(bot.reply("hi").await, MISSING_KEY_REPLY);
    }

    #[tokio::test]
    async fn upstream_failure_uses_apology() {
        let bot = ChatbotClient::new("http://127.0.0.1:1".into(), "m".into(), "key".into());
        assert_eq!(bot.reply("hi").await, ERROR_REPLY);
    }
}
