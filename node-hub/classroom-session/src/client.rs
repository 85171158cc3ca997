use std::time::Duration;

use classroom_scheduler::Message;
use eyre::{Result, eyre};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ParticipantConfig, ProviderConfig, get_env_or_value};

/// Produces the next utterance for a participant.
///
/// The session loop only decides *who* speaks; implementations decide *what*
/// they say, given the full transcript so far.
#[async_trait::async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, speaker: &ParticipantConfig, history: &[Message]) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            name: name.map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Build the chat request for one participant's turn.
///
/// The participant's own past lines become `assistant` messages; everyone
/// else's become `user` messages tagged with the speaker's id.
pub fn build_request(model: &str, speaker: &ParticipantConfig, history: &[Message]) -> ChatRequest {
    let mut messages = Vec::with_capacity(history.len() + 1);
    if !speaker.system_prompt.trim().is_empty() {
        messages.push(ChatMessage::new("system", speaker.system_prompt.trim(), None));
    }
    for message in history {
        if message.speaker == speaker.id {
            messages.push(ChatMessage::new("assistant", message.content.as_str(), None));
        } else {
            messages.push(ChatMessage::new(
                "user",
                message.content.as_str(),
                Some(message.speaker.as_str()),
            ));
        }
    }

    ChatRequest {
        model: speaker.model.clone().unwrap_or_else(|| model.to_string()),
        messages,
        temperature: speaker.temperature,
    }
}

fn parse_completion(text: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(text)
        .map_err(|e| eyre!("Failed to parse API response: {}. Response: {}", e, text))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| eyre!("API response contained no message content"))?;
    Ok(content.trim().to_string())
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
#[derive(Debug)]
pub struct OpenaiClient {
    id: String,
    api_key: String,
    api_url: String,
    model: String,
    client: HttpClient,
}

impl OpenaiClient {
    pub fn new(config: &ProviderConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let builder = HttpClient::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30));
        let builder = if config.proxy { builder } else { builder.no_proxy() };
        let client = builder.build().unwrap_or_else(|e| {
            warn!("[{}] Failed to build HTTP client, using defaults: {}", config.id, e);
            HttpClient::new()
        });

        Self {
            id: config.id.clone(),
            api_key: get_env_or_value(&config.api_key),
            api_url: get_env_or_value(&config.api_url)
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl ContentGenerator for OpenaiClient {
    async fn generate(&self, speaker: &ParticipantConfig, history: &[Message]) -> Result<String> {
        let request = build_request(&self.model, speaker, history);
        debug!(
            "[{}] Requesting turn for {} from {}/chat/completions ({} messages)",
            self.id,
            speaker.id,
            self.api_url,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!("[{}] Response status: {}", self.id, status);

        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(eyre!("API Error ({}): {}", status, error_text));
        }

        let text_data = response.text().await?;
        parse_completion(&text_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> ParticipantConfig {
        ParticipantConfig {
            id: "StudentA".to_string(),
            role: classroom_scheduler::Role::Student,
            system_prompt: "你是StudentA。\n".to_string(),
            temperature: Some(0.9),
            model: None,
        }
    }

    #[test]
    fn test_request_roles_follow_speaker() {
        let history = vec![
            Message::new(0, "Coordinator", "今天讨论牛顿第一定律。"),
            Message::new(1, "Teacher", "StudentA，你来说说看？"),
            Message::new(2, "StudentA", "我觉得物体会保持原来的状态。"),
            Message::new(3, "StudentB", "我同意，但是摩擦力呢？"),
        ];
        let request = build_request("gpt-4o-mini", &student(), &history);

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, Some(0.9));
        let roles: Vec<_> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "user", "assistant", "user"]);
        assert_eq!(request.messages[0].content, "你是StudentA。");
        assert_eq!(request.messages[2].name.as_deref(), Some("Teacher"));
        assert_eq!(request.messages[3].name, None);
    }

    #[test]
    fn test_request_model_override_and_serialization() {
        let mut speaker = student();
        speaker.model = Some("qwen-plus".to_string());
        speaker.temperature = None;
        speaker.system_prompt.clear();

        let request = build_request("gpt-4o-mini", &speaker, &[Message::new(0, "Teacher", "好")]);
        assert_eq!(request.model, "qwen-plus");

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["name"], "Teacher");
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  惯性和质量有关。 "}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "惯性和质量有关。");

        assert!(parse_completion(r#"{"choices":[]}"#).is_err());
        assert!(parse_completion("not json").is_err());
    }
}
