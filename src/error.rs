use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Configuration error: missing or empty environment variables: {}", .0.join(", "))]
    Configuration(Vec<String>),

    #[error("Malformed script: expected an even number of non-empty lines, got {line_count}")]
    MalformedScript { line_count: usize },

    #[error("Image resolution failed for segment {index} (query '{query}', {attempts} attempts)")]
    ImageResolution {
        index: usize,
        query: String,
        attempts: usize,
    },

    #[error("Speech synthesis failed for segment {index}: {reason}")]
    Synthesis { index: usize, reason: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Composition error: {0}")]
    Composition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VideoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_lists_every_variable() {
        let err = VideoError::Configuration(vec!["GOOGLE_API_KEY".into(), "AZURE_TTS_KEY".into()]);
        let msg = err.to_string();
        assert!(msg.contains("GOOGLE_API_KEY, AZURE_TTS_KEY"));
    }

    #[test]
    fn malformed_script_reports_line_count() {
        let err = VideoError::MalformedScript { line_count: 3 };
        assert!(err.to_string().contains("got 3"));
    }
}
