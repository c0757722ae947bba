use super::{SpeechBackend, SynthesisStatus};
use crate::config::SpeechConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const OUTPUT_FORMAT: &str = "audio-24khz-96kbitrate-mono-mp3";

/// Azure Speech text-to-speech over the REST endpoint.
#[derive(Debug, Clone)]
pub struct AzureSpeechClient {
    key: String,
    region: String,
    client: Client,
}

impl AzureSpeechClient {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self {
            key: config.key.clone(),
            region: config.region.clone(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn ssml(text: &str, voice: &str) -> String {
    // xml:lang is taken from the voice name, e.g. en-US-BrianMultilingualNeural
    let lang = voice.splitn(3, '-').take(2).collect::<Vec<_>>().join("-");
    format!(
        "<speak version='1.0' xml:lang='{lang}'><voice name='{}'>{}</voice></speak>",
        escape_xml(voice),
        escape_xml(text)
    )
}

#[async_trait]
impl SpeechBackend for AzureSpeechClient {
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<SynthesisStatus> {
        debug!("Synthesizing {} chars with voice {}", text.len(), voice);

        let response = self
            .client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", env!("CARGO_PKG_NAME"))
            .body(ssml(text, voice))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Ok(SynthesisStatus::Canceled {
                reason: format!("HTTP {}: {}", status, error_text.trim()),
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Ok(SynthesisStatus::Canceled {
                reason: "service returned no audio".to_string(),
            });
        }

        tokio::fs::write(output, &audio).await?;
        Ok(SynthesisStatus::Completed)
    }
}
