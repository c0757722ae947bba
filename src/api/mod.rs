//! External collaborators: script generation, image search/fetch and speech.
//!
//! Each one sits behind a trait so the pipeline can be driven by fakes.

mod azure_openai;
mod azure_tts;
mod google_search;

pub use azure_openai::AzureOpenAiClient;
pub use azure_tts::AzureSpeechClient;
pub use google_search::{GoogleImageSearch, HttpImageFetcher};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Produces raw script text.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate_script(&self) -> Result<String>;
}

/// Ranked image URLs for a query. No results is an empty list.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<String>>;
}

/// Raw bytes downloaded from a candidate URL.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    /// `Content-Type` as declared by the server, empty if absent
    pub content_type: String,
}

impl FetchedImage {
    pub fn is_image(&self) -> bool {
        self.content_type.trim().to_ascii_lowercase().starts_with("image/")
    }
}

#[async_trait]
pub trait ImageFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

/// Completion signal reported by a speech backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisStatus {
    Completed,
    Canceled { reason: String },
}

#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Writes the spoken `text` to `output`. Only `Completed` means the file
    /// is usable.
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<SynthesisStatus>;
}
