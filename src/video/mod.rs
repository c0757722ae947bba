mod clip;
mod generator;

pub use clip::{FrameStyle, SegmentClip};
pub use generator::FfmpegCompositor;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Local media work: measuring audio, rendering one segment, joining segments.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Length of an audio file in seconds.
    async fn probe_duration(&self, audio: &Path) -> Result<f64>;

    /// Renders one self-contained clip (still image, audio, optional caption).
    async fn render_segment(&self, clip: &SegmentClip, output: &Path) -> Result<()>;

    /// Joins rendered clips back to back, in the given order, into `output`.
    async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> Result<()>;
}
