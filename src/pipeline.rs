use crate::api::ScriptGenerator;
use crate::assets::{ImageResolver, Layout, SpeechSynthesizer};
use crate::error::Result;
use crate::scene::{normalize_generated_script, parse_script, Segment};
use crate::video::{Compositor, SegmentClip};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Wipe downloaded images and audio before starting
    pub fresh: bool,
    /// Burn the narration into each segment as a caption
    pub subtitles: bool,
}

/// Script → per-segment assets → segment clips → final video, strictly in
/// segment order.
pub struct Pipeline {
    layout: Layout,
    generator: Option<Box<dyn ScriptGenerator>>,
    images: ImageResolver,
    speech: SpeechSynthesizer,
    compositor: Box<dyn Compositor>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        layout: Layout,
        generator: Option<Box<dyn ScriptGenerator>>,
        images: ImageResolver,
        speech: SpeechSynthesizer,
        compositor: Box<dyn Compositor>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            layout,
            generator,
            images,
            speech,
            compositor,
            options,
        }
    }

    /// Runs every step and returns the path of the final video. Any fatal
    /// error stops the run before the final file is written.
    pub async fn run(&self) -> Result<PathBuf> {
        if self.options.fresh {
            self.layout.clear_generated().await?;
        }
        self.layout.prepare().await?;

        // A video from an earlier run must not outlive a failed one.
        let output = self.layout.output();
        if tokio::fs::metadata(&output).await.is_ok() {
            tokio::fs::remove_file(&output).await?;
        }

        if let Some(generator) = &self.generator {
            info!("Step 1/4: Generating script...");
            let raw = generator.generate_script().await?;
            let script = normalize_generated_script(&raw);
            tokio::fs::write(self.layout.script(), script).await?;
            info!("Generated script to {}", self.layout.script().display());
        } else {
            info!("Step 1/4: Using existing script {}", self.layout.script().display());
        }

        info!("Step 2/4: Parsing script...");
        let text = tokio::fs::read_to_string(self.layout.script()).await?;
        let segments = parse_script(&text)?;
        info!("Parsed {} segments", segments.len());

        info!("Step 3/4: Building segments...");
        let mut clips = Vec::with_capacity(segments.len());
        for segment in &segments {
            info!("Segment {}/{}: {}", segment.index, segments.len(), segment.image_prompt);
            clips.push(self.build_segment(segment).await?);
        }

        info!("Step 4/4: Assembling final video...");
        self.compositor.concatenate(&clips, &output).await?;

        for clip in &clips {
            tokio::fs::remove_file(clip).await.ok();
        }

        info!("Video written to {}", output.display());
        Ok(output)
    }

    async fn build_segment(&self, segment: &Segment) -> Result<PathBuf> {
        let audio = self.layout.audio(segment.index);
        self.speech.synthesize(segment, &audio).await?;

        let image = self.layout.image(segment.index);
        self.images.resolve(segment, &image).await?;

        let duration = self.compositor.probe_duration(&audio).await?;
        let clip = SegmentClip {
            index: segment.index,
            image,
            audio,
            caption: self.options.subtitles.then(|| segment.narration.clone()),
            duration,
        };

        let output = self.layout.clip(segment.index);
        self.compositor.render_segment(&clip, &output).await?;
        Ok(output)
    }
}
