//! Round summaries from an external text-generation service.
//!
//! The service is best effort: callers use [`summarize_or_placeholder`] so a
//! failure never blocks round advancement.

use crate::config::SummaryConfig;
use crate::logic::RoundDigest;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::future::Future;
use std::time::Duration;

/// Stored in place of a summary when generation fails.
pub const SUMMARY_FAILURE_PLACEHOLDER: &str = "Summary generation failed.";

/// Errors from the summary service.
#[derive(Debug)]
pub enum SummaryError {
    /// No API key configured; nothing was sent.
    MissingCredential,
    Http(reqwest::Error),
    /// Service answered with a non-success status.
    Status(u16),
    /// Service answered without any text.
    EmptyResponse,
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::MissingCredential => {
                write!(f, "Summary service is not configured (SUMMARY_API_KEY is empty)")
            }
            SummaryError::Http(e) => write!(f, "Summary request failed: {}", e),
            SummaryError::Status(code) => write!(f, "Summary service returned status {}", code),
            SummaryError::EmptyResponse => write!(f, "Summary service returned no text"),
        }
    }
}

impl std::error::Error for SummaryError {}

impl From<reqwest::Error> for SummaryError {
    fn from(e: reqwest::Error) -> Self {
        SummaryError::Http(e)
    }
}

/// Something that can turn a finished round into prose.
pub trait RoundSummarizer {
    fn summarize(&self, digest: &RoundDigest) -> impl Future<Output = Result<String, SummaryError>> + Send;
}

/// Prompt describing the round for the text service.
pub fn build_prompt(digest: &RoundDigest) -> String {
    let mut prompt = String::new();
    let name = if digest.tournament.is_empty() {
        "the tournament"
    } else {
        digest.tournament.as_str()
    };
    let _ = writeln!(
        prompt,
        "Write a short, upbeat summary (3-4 sentences) of round {} of {} ({:?} format).",
        digest.round, name, digest.format
    );
    let _ = writeln!(prompt, "Results:");
    for r in &digest.results {
        let group = r.group.as_deref().map(|g| format!(" [group {}]", g)).unwrap_or_default();
        let _ = writeln!(
            prompt,
            "- {} {} - {} {}{}",
            r.player_1, r.score_1, r.score_2, r.player_2, group
        );
    }
    if !digest.advancing.is_empty() {
        let _ = writeln!(prompt, "Advancing: {}.", digest.advancing.join(", "));
    }
    if let Some(bye) = &digest.bye {
        let _ = writeln!(prompt, "{} receives a bye into the next round.", bye);
    }
    if let Some(champion) = &digest.champion {
        let _ = writeln!(prompt, "The tournament is over; the champion is {}.", champion);
    }
    prompt
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion style HTTP client.
#[derive(Clone)]
pub struct HttpSummarizer {
    client: reqwest::Client,
    config: SummaryConfig,
}

impl HttpSummarizer {
    pub fn new(config: SummaryConfig) -> Result<Self, SummaryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("racquet-league/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// True when an API key is present.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

impl RoundSummarizer for HttpSummarizer {
    fn summarize(&self, digest: &RoundDigest) -> impl Future<Output = Result<String, SummaryError>> + Send {
        let prompt = build_prompt(digest);
        let client = self.client.clone();
        let config = self.config.clone();
        async move {
            let api_key = config.api_key.as_deref().ok_or(SummaryError::MissingCredential)?;
            let request = ChatRequest {
                model: &config.model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: "You are a sports commentator for a racquet league.",
                    },
                    ChatMessage {
                        role: "user",
                        content: &prompt,
                    },
                ],
            };
            let response = client
                .post(&config.api_url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(SummaryError::Status(response.status().as_u16()));
            }
            let body: ChatResponse = response.json().await?;
            body.choices
                .into_iter()
                .find_map(|c| c.message.content)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .ok_or(SummaryError::EmptyResponse)
        }
    }
}

/// Ask for a summary; on any failure log it and return the placeholder.
pub async fn summarize_or_placeholder<S: RoundSummarizer>(summarizer: &S, digest: &RoundDigest) -> String {
    match summarizer.summarize(digest).await {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Round {} summary unavailable: {}", digest.round, e);
            SUMMARY_FAILURE_PLACEHOLDER.to_string()
        }
    }
}
