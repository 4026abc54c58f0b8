//! HTTP clients for the external services the API talks to: the object
//! detection backend, the Gemini chatbot API and the Google TTS endpoint.

pub mod chatbot;
pub mod detector;
pub mod tts;

pub use chatbot::ChatbotClient;
pub use detector::HttpDetector;
pub use tts::TtsClient;

/// Errors from the chatbot and TTS clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream API returned a non-2xx status code.
    #[error("upstream API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The upstream API answered 2xx with a body we could not use.
    #[error("unexpected upstream response: {0}")]
    InvalidResponse(String),

    #[error("no text to synthesize")]
    EmptyText,
}

/// Return the response unchanged on success, or an
/// [`ClientError::ApiError`] carrying the status and body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ClientError::ApiError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
