use super::clip::{caption_line_budget, segment_args, wrap_caption, FrameStyle, SegmentClip};
use super::Compositor;
use crate::error::{Result, VideoError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Compositor backed by the system `ffmpeg` and `ffprobe` binaries.
pub struct FfmpegCompositor {
    style: FrameStyle,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfmpegCompositor {
    pub fn new(style: FrameStyle) -> Self {
        Self { style }
    }

    fn run(&self, program: &str, args: &[String], what: &str) -> Result<Vec<u8>> {
        debug!("{} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| VideoError::Composition(format!("Failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::Composition(format!(
                "{} failed: {}",
                what,
                error.trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Reads `format.duration` from `ffprobe -of json` output.
pub(crate) fn parse_probe_duration(json: &[u8]) -> Result<f64> {
    let probe: ProbeOutput = serde_json::from_slice(json)?;
    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| VideoError::Composition("ffprobe reported no usable duration".to_string()))?;
    Ok(duration)
}

/// Sibling file the concat writes into before it is moved over `output`.
pub(crate) fn partial_path(output: &Path) -> PathBuf {
    output.with_extension("partial.mp4")
}

/// Concat demuxer list with absolute paths, in the given order.
pub(crate) fn concat_list(clips: &[PathBuf]) -> Result<String> {
    let mut content = String::new();
    for clip in clips {
        let abs = clip.canonicalize().map_err(|e| {
            VideoError::Composition(format!(
                "Failed to get absolute path of {}: {}",
                clip.display(),
                e
            ))
        })?;
        let escaped = abs.to_string_lossy().replace('\'', "'\\''");
        content.push_str(&format!("file '{}'\n", escaped));
    }
    Ok(content)
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn probe_duration(&self, audio: &Path) -> Result<f64> {
        let args: Vec<String> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "json".into(),
            audio.to_string_lossy().into_owned(),
        ];
        let stdout = self.run("ffprobe", &args, "ffprobe duration probe")?;
        parse_probe_duration(&stdout)
    }

    async fn render_segment(&self, clip: &SegmentClip, output: &Path) -> Result<()> {
        info!(
            "Creating video segment {} ({:.2}s): {}",
            clip.index,
            clip.duration,
            output.display()
        );
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Caption text goes through a file so drawtext never sees raw narration.
        let caption_file = match &clip.caption {
            Some(text) => {
                let path = output.with_extension("txt");
                let wrapped = wrap_caption(text, caption_line_budget(&self.style));
                tokio::fs::write(&path, wrapped).await?;
                Some(path)
            }
            None => None,
        };

        let args = segment_args(clip, &self.style, caption_file.as_deref(), output);
        let result = self.run("ffmpeg", &args, "FFmpeg segment creation");

        if let Some(path) = caption_file {
            tokio::fs::remove_file(&path).await.ok();
        }
        result?;

        info!("Created segment: {}", output.display());
        Ok(())
    }

    async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> Result<()> {
        info!("Concatenating {} video segments...", clips.len());
        if clips.is_empty() {
            return Err(VideoError::Composition("No segments to concatenate".to_string()));
        }
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let concat_file = output.with_extension("concat.txt");
        tokio::fs::write(&concat_file, concat_list(clips)?).await?;
        let partial = partial_path(output);

        let args: Vec<String> = vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            concat_file.to_string_lossy().into_owned(),
            "-c".into(),
            "copy".into(),
            "-movflags".into(),
            "+faststart".into(),
            partial.to_string_lossy().into_owned(),
        ];
        let result = self.run("ffmpeg", &args, "FFmpeg concat");
        tokio::fs::remove_file(&concat_file).await.ok();
        if let Err(e) = result {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(e);
        }
        tokio::fs::rename(&partial, output).await?;

        info!("Concatenated video: {}", output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_duration_from_probe_json() {
        let json = br#"{ "format": { "duration": "3.456000" } }"#;
        assert!((parse_probe_duration(json).unwrap() - 3.456).abs() < 1e-9);
    }

    #[test]
    fn missing_or_zero_duration_is_an_error() {
        assert!(matches!(
            parse_probe_duration(br#"{ "format": {} }"#),
            Err(VideoError::Composition(_))
        ));
        assert!(parse_probe_duration(br#"{ "format": { "duration": "0.0" } }"#).is_err());
        assert!(parse_probe_duration(br#"{ "format": { "duration": "N/A" } }"#).is_err());
    }

    #[test]
    fn concat_list_keeps_order_with_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("step1.mp4");
        let b = dir.path().join("step2.mp4");
        std::fs::write(&a, b"").unwrap();
        std::fs::write(&b, b"").unwrap();

        let list = concat_list(&[a.clone(), b.clone()]).unwrap();
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("file '/") && lines[0].ends_with("step1.mp4'"));
        assert!(lines[1].ends_with("step2.mp4'"));
    }

    #[test]
    fn concat_writes_beside_the_final_file() {
        assert_eq!(
            partial_path(Path::new("output/final_video.mp4")),
            Path::new("output/final_video.partial.mp4")
        );
    }

    #[test]
    fn concat_list_rejects_missing_clip() {
        let err = concat_list(&[PathBuf::from("/definitely/not/here.mp4")]).unwrap_err();
        assert!(matches!(err, VideoError::Composition(_)));
    }
}
