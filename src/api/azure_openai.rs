use super::ScriptGenerator;
use crate::config::GenerationConfig;
use crate::error::{Result, VideoError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are a scriptwriter for short-form anime trivia content. \
Write 60-second 'Did You Know?' style scripts about ONE specific anime (Naruto, One Piece, or Attack on Titan), \
built around a single surprising, strange, dark, or obscure fact. No summaries, life lessons or moral reflections. \
Structure the script as about 12 alternating lines: one image tag in square brackets, followed by one short narration sentence. \
Image tags must begin with the anime name (e.g. [naruto sakura punching], [one piece gear 5 luffy]). \
Narration must be direct and punchy. No 'Narrator:' labels, no intros, no outros, no recaps.";

const USER_PROMPT: &str = "Write a 60-second anime 'Did You Know?' script about one weird, dark, or obscure fact \
from Naruto, One Piece, or Attack on Titan. Use only one anime for the entire script. \
Use [image prompt] followed by one-sentence narration, alternating for about 12 lines total.";

#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    config: GenerationConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl AzureOpenAiClient {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        info!("Loaded Azure OpenAI config:");
        info!("  endpoint: {}", config.endpoint);
        info!("  version: {}", config.api_version);
        info!("  deployment: {}", config.deployment);

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

#[async_trait]
impl ScriptGenerator for AzureOpenAiClient {
    async fn generate_script(&self) -> Result<String> {
        info!("Requesting a new script from deployment {}", self.config.deployment);

        let request_body = json!({
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": USER_PROMPT }
            ],
            "max_tokens": 4096,
            "temperature": 1.0,
            "top_p": 1.0,
            "model": self.config.deployment
        });

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(VideoError::Api(format!(
                "Azure OpenAI error (HTTP {}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| VideoError::Api("Completion contained no message content".to_string()))?;

        debug!("Generated script text: {}", text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_deployment_url() {
        let client = AzureOpenAiClient::new(GenerationConfig {
            api_key: "k".into(),
            api_version: "2024-06-01".into(),
            endpoint: "https://example.openai.azure.com/".into(),
            deployment: "gpt-4o".into(),
        })
        .unwrap();
        assert_eq!(
            client.completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn parses_completion_payload() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"[a]\nb"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("[a]\nb"));
    }
}
