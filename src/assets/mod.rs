//! Per-segment media assets and the fixed on-disk layout they live in.

mod images;
mod speech;

pub use images::{ImageResolver, ResolverOptions};
pub use speech::SpeechSynthesizer;

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Relative file layout of a run, anchored at `root`.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn script(&self) -> PathBuf {
        self.root.join("input").join("script.txt")
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join("input").join("images")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    pub fn output(&self) -> PathBuf {
        self.root.join("output").join("final_video.mp4")
    }

    /// Scratch space for rendered segment clips.
    pub fn segment_dir(&self) -> PathBuf {
        self.root.join("output").join("segments")
    }

    pub fn image(&self, index: usize) -> PathBuf {
        self.image_dir().join(format!("step{index}.jpg"))
    }

    pub fn audio(&self, index: usize) -> PathBuf {
        self.audio_dir().join(format!("step{index}.mp3"))
    }

    pub fn clip(&self, index: usize) -> PathBuf {
        self.segment_dir().join(format!("step{index}.mp4"))
    }

    /// Deletes every downloaded image and synthesized audio file.
    pub async fn clear_generated(&self) -> Result<()> {
        for dir in [self.image_dir(), self.audio_dir()] {
            if tokio::fs::metadata(&dir).await.is_ok() {
                tokio::fs::remove_dir_all(&dir).await?;
                info!("Cleared existing directory: {}", dir.display());
            }
        }
        Ok(())
    }

    /// Creates every directory the run writes into.
    pub async fn prepare(&self) -> Result<()> {
        for dir in [
            self.image_dir(),
            self.audio_dir(),
            self.segment_dir(),
            parent_or_root(&self.script()),
            parent_or_root(&self.output()),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}

fn parent_or_root(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_fixed_layout() {
        let layout = Layout::new("run");
        assert_eq!(layout.script(), Path::new("run/input/script.txt"));
        assert_eq!(layout.image(3), Path::new("run/input/images/step3.jpg"));
        assert_eq!(layout.audio(12), Path::new("run/audio/step12.mp3"));
        assert_eq!(layout.output(), Path::new("run/output/final_video.mp4"));
        assert_eq!(layout.clip(1), Path::new("run/output/segments/step1.mp4"));
    }

    #[tokio::test]
    async fn clear_generated_keeps_script() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.prepare().await.unwrap();
        std::fs::write(layout.script(), "[a]\nb\n").unwrap();
        std::fs::write(layout.image(1), b"jpg").unwrap();
        std::fs::write(layout.audio(1), b"mp3").unwrap();

        layout.clear_generated().await.unwrap();

        assert!(layout.script().exists());
        assert!(!layout.image_dir().exists());
        assert!(!layout.audio_dir().exists());

        layout.prepare().await.unwrap();
        assert!(layout.image_dir().is_dir());
        assert!(layout.audio_dir().is_dir());
    }
}
