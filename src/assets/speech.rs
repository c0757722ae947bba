use crate::api::{SpeechBackend, SynthesisStatus};
use crate::error::{Result, VideoError};
use crate::scene::Segment;
use std::path::Path;
use tracing::{info, warn};

/// Narration to audio file, with the same bounded second chance the image
/// resolver gets from its fallback query.
pub struct SpeechSynthesizer {
    backend: Box<dyn SpeechBackend>,
    voice: String,
    max_attempts: usize,
}

impl SpeechSynthesizer {
    pub fn new(backend: Box<dyn SpeechBackend>, voice: impl Into<String>, max_attempts: usize) -> Self {
        Self {
            backend,
            voice: voice.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn synthesize(&self, segment: &Segment, target: &Path) -> Result<()> {
        if has_audio(target).await {
            info!(
                "Segment {} audio already present, skipping synthesis: {}",
                segment.index,
                target.display()
            );
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Generating TTS for line {}: {}", segment.index, segment.narration);
        let mut reason = String::new();
        for attempt in 1..=self.max_attempts {
            match self
                .backend
                .synthesize(&segment.narration, &self.voice, target)
                .await
            {
                Ok(SynthesisStatus::Completed) => {
                    info!("Generated TTS: {}", target.display());
                    return Ok(());
                }
                Ok(SynthesisStatus::Canceled { reason: why }) => reason = why,
                Err(e) => reason = e.to_string(),
            }
            warn!(
                "TTS failed for segment {} (attempt {}/{}): {}",
                segment.index, attempt, self.max_attempts, reason
            );
            if tokio::fs::metadata(target).await.is_ok() {
                tokio::fs::remove_file(target).await.ok();
            }
        }

        Err(VideoError::Synthesis {
            index: segment.index,
            reason,
        })
    }
}

async fn has_audio(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails `failures` times, then completes.
    #[derive(Clone, Default)]
    struct FlakyBackend {
        failures: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SpeechBackend for FlakyBackend {
        async fn synthesize(&self, text: &str, _voice: &str, output: &Path) -> Result<SynthesisStatus> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                tokio::fs::write(output, b"partial").await?;
                return Ok(SynthesisStatus::Canceled {
                    reason: "Canceled: quota exceeded".into(),
                });
            }
            tokio::fs::write(output, text.as_bytes()).await?;
            Ok(SynthesisStatus::Completed)
        }
    }

    /// Transport error on the first call, then completes.
    #[derive(Clone, Default)]
    struct DroppedConnection {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SpeechBackend for DroppedConnection {
        async fn synthesize(&self, text: &str, _voice: &str, output: &Path) -> Result<SynthesisStatus> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(VideoError::Api("connection reset by peer".into()));
            }
            tokio::fs::write(output, text.as_bytes()).await?;
            Ok(SynthesisStatus::Completed)
        }
    }

    fn segment() -> Segment {
        Segment::new(2, "luffy scar".into(), "Luffy has a scar under his eye.".into())
    }

    #[tokio::test]
    async fn writes_audio_on_completion() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("audio").join("step2.mp3");
        let backend = FlakyBackend::default();
        let synth = SpeechSynthesizer::new(Box::new(backend.clone()), "voice", 2);

        synth.synthesize(&segment(), &target).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "Luffy has a scar under his eye."
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn existing_audio_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("step2.mp3");
        std::fs::write(&target, b"cached").unwrap();
        let backend = FlakyBackend::default();
        let synth = SpeechSynthesizer::new(Box::new(backend.clone()), "voice", 2);

        synth.synthesize(&segment(), &target).await.unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&target).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn one_failure_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("step2.mp3");
        let backend = FlakyBackend {
            failures: 1,
            ..Default::default()
        };
        let synth = SpeechSynthesizer::new(Box::new(backend.clone()), "voice", 2);

        synth.synthesize(&segment(), &target).await.unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_error_counts_as_failed_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("step2.mp3");
        let backend = DroppedConnection::default();
        let synth = SpeechSynthesizer::new(Box::new(backend.clone()), "voice", 2);

        synth.synthesize(&segment(), &target).await.unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(!std::fs::read(&target).unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_error_on_last_attempt_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("step2.mp3");
        let backend = DroppedConnection::default();
        let synth = SpeechSynthesizer::new(Box::new(backend.clone()), "voice", 1);

        let err = synth.synthesize(&segment(), &target).await.unwrap_err();

        assert!(
            matches!(err, VideoError::Synthesis { index: 2, ref reason } if reason.contains("connection reset"))
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_completion_status_is_fatal_after_last_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("step2.mp3");
        let backend = FlakyBackend {
            failures: usize::MAX,
            ..Default::default()
        };
        let synth = SpeechSynthesizer::new(Box::new(backend.clone()), "voice", 2);

        let err = synth.synthesize(&segment(), &target).await.unwrap_err();

        match err {
            VideoError::Synthesis { index, reason } => {
                assert_eq!(index, 2);
                assert!(reason.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(!target.exists(), "partial audio must not survive a failure");
    }
}
