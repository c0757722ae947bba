use crate::error::{Result, VideoError};

pub const DEFAULT_VOICE: &str = "en-US-BrianMultilingualNeural";

/// Google Custom Search credentials.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub engine_id: String,
}

/// Azure Speech credentials and voice.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub key: String,
    pub region: String,
    pub voice: String,
}

/// Azure OpenAI chat deployment used for script generation.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub api_version: String,
    pub endpoint: String,
    pub deployment: String,
}

/// Process configuration, read once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub speech: SpeechConfig,
    pub generation: Option<GenerationConfig>,
}

impl Config {
    pub fn from_env(with_generation: bool) -> Result<Self> {
        Self::from_lookup(with_generation, |name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Every
    /// missing variable is collected so a single error names all of them.
    pub fn from_lookup<F>(with_generation: bool, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let voice = lookup("AZURE_TTS_VOICE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VOICE.to_string());
        let mut missing = Vec::new();
        let mut required = |name: &str| -> String {
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(value) => value,
                None => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        };

        let search = SearchConfig {
            api_key: required("GOOGLE_API_KEY"),
            engine_id: required("GOOGLE_CSE_ID"),
        };
        let speech = SpeechConfig {
            key: required("AZURE_TTS_KEY"),
            region: required("AZURE_TTS_REGION"),
            voice,
        };
        let generation = with_generation.then(|| GenerationConfig {
            api_key: required("AZURE_OPENAI_API_KEY"),
            api_version: required("AZURE_OPENAI_API_VERSION"),
            endpoint: required("AZURE_OPENAI_ENDPOINT"),
            deployment: required("AZURE_OPENAI_DEPLOYMENT"),
        });

        if !missing.is_empty() {
            return Err(VideoError::Configuration(missing));
        }

        Ok(Self {
            search,
            speech,
            generation,
        })
    }
}
