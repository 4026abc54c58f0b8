//! Text-to-speech through the Google Translate TTS endpoint.
//!
//! The endpoint only accepts short inputs, so text is split on whitespace
//! into chunks of at most [`MAX_CHUNK_CHARS`] characters. Each chunk comes
//! back as an MP3 stream; MP3 frames are self-delimiting, so the chunks are
//! simply concatenated.

use crate::{ensure_success, ClientError};

pub const MAX_CHUNK_CHARS: usize = 100;

pub struct TtsClient {
    client: reqwest::Client,
    api_url: String,
    language: String,
}

impl TtsClient {
    pub fn new(api_url: String, language: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            language,
        }
    }

    /// Synthesize `text` into a single MP3 byte stream.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ClientError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ClientError::EmptyText);
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let response = self
                .client
                .get(&self.api_url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.language.as_str()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.to_string().as_str()),
                    ("textlen", chunk.chars().count().to_string().as_str()),
                ])
                .send()
                .await?;
            let bytes = ensure_success(response).await?.bytes().await?;
            if bytes.is_empty() {
                return Err(ClientError::InvalidResponse(format!(
                    "empty audio for chunk {idx}"
                )));
            }
            audio.extend_from_slice(&bytes);
        }

        tracing::debug!(chunks = chunks.len(), bytes = audio.len(), "TTS synthesized");
        Ok(audio)
    }
}

/// Split `text` into whitespace-separated chunks of at most `max_chars`
/// characters. Words longer than `max_chars` are hard-split.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
