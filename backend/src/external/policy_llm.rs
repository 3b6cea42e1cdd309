//! Policy elaboration client
//!
//! Client for an OpenAI-compatible chat-completions endpoint. The model only
//! ever sees recommendations the rule engine already selected; it expands
//! them into prose and never chooses them.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{RecommendationSet, NOT_AVAILABLE};

use crate::config::ElaborationConfig;
use crate::error::{AppError, AppResult};

pub const SYSTEM_PROMPT: &str = "You are a climate policy expert.";

/// A prompt must mention at least one of these to be sent
pub const CLIMATE_KEYWORDS: [&str; 14] = [
    "climate",
    "weather",
    "environment",
    "sustainability",
    "policy",
    "green",
    "energy",
    "emission",
    "carbon",
    "pollution",
    "temperature",
    "precipitation",
    "flood",
    "drought",
];

const RESPONSE_TEMPLATE: &str = "\
1. Situation overview\n\
2. Policy measures (one paragraph per recommendation above, same order)\n\
3. Implementation timeline\n\
4. Monitoring indicators";

/// Client for the chat-completions elaboration service
#[derive(Clone)]
pub struct PolicyLlmClient {
    api_base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    http_client: Client,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Prose elaboration of a recommendation set
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PolicyNarrative {
    pub model: String,
    pub content: String,
}

/// Whether the prompt is on a climate topic
pub fn is_climate_prompt(prompt: &str) -> bool {
    let prompt = prompt.to_lowercase();
    CLIMATE_KEYWORDS.iter().any(|word| prompt.contains(word))
}

/// Build the conversation sent to the model
pub fn build_messages(prompt: &str, set: &RecommendationSet, outlook: &[String]) -> Vec<ChatMessage> {
    let snapshot = &set.snapshot;
    let mut context = format!(
        "Observed conditions for {} at {}:\n",
        snapshot.location,
        snapshot.observed_at.format("%Y-%m-%d %H:%M UTC")
    );
    for field in shared::SnapshotField::ALL {
        context.push_str(&format!(
            "- {}: {}\n",
            field.key(),
            shared::format_reading_with_unit(field.read(snapshot), field.unit())
        ));
    }
    let condition = match snapshot.condition {
        shared::ConditionCode::Unknown => NOT_AVAILABLE.to_string(),
        code => code.to_string(),
    };
    context.push_str(&format!("- condition: {}\n", condition));

    if !outlook.is_empty() {
        context.push_str("\nOutlook:\n");
        for line in outlook {
            context.push_str(&format!("- {}\n", line));
        }
    }

    context.push_str("\nSelected policy recommendations:\n");
    if set.is_empty() {
        context.push_str("- none were triggered\n");
    }
    for (i, rec) in set.iter().enumerate() {
        context.push_str(&format!(
            "{}. [{} / {}] {}\n",
            i + 1,
            rec.category.title(),
            rec.severity,
            rec.text
        ));
    }

    vec![
        ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: format!(
                "{}\n\n{}\nElaborate only on the recommendations listed above. \
                 Please provide a detailed climate policy response according to this template:\n\n{}",
                prompt.trim(),
                context,
                RESPONSE_TEMPLATE
            ),
        },
    ]
}

impl PolicyLlmClient {
    /// Create a new elaboration client
    pub fn new(config: &ElaborationConfig, api_key: String) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            http_client,
        })
    }

    /// Create a client when elaboration is enabled and a key is configured
    pub fn from_config(config: &ElaborationConfig) -> AppResult<Option<Self>> {
        match (&config.api_key, config.enabled) {
            (Some(key), true) if !key.trim().is_empty() => Ok(Some(Self::new(config, key.clone())?)),
            _ => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Expand the selected recommendations into a narrative
    pub async fn elaborate(
        &self,
        prompt: &str,
        set: &RecommendationSet,
        outlook: &[String],
    ) -> AppResult<PolicyNarrative> {
        if !is_climate_prompt(prompt) {
            return Err(AppError::PromptRejected(
                "This model is designed for climate-related problems. Please provide a climate-related prompt."
                    .to_string(),
            ));
        }

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: build_messages(prompt, set, outlook),
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_base_url))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalService(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::ExternalService("Response contained no choices".to_string()))?;

        Ok(PolicyNarrative {
            model: self.model.clone(),
            content,
        })
    }
}
