use std::path::{Path, PathBuf};

/// Output frame settings shared by every segment.
#[derive(Debug, Clone)]
pub struct FrameStyle {
    /// Edge of the square canvas in pixels
    pub size: u32,
    /// Letterbox fill, any ffmpeg color name or hex value
    pub background: String,
    pub fps: u32,
    /// Fade in/out length in seconds
    pub fade: f64,
    pub font_size: u32,
    pub font_file: Option<PathBuf>,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            size: 1080,
            background: "black".to_string(),
            fps: 24,
            fade: 0.5,
            font_size: 40,
            font_file: None,
        }
    }
}

/// Everything needed to render one segment. Its length is the audio's.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentClip {
    pub index: usize,
    pub image: PathBuf,
    pub audio: PathBuf,
    pub caption: Option<String>,
    pub duration: f64,
}

impl SegmentClip {
    /// Start time of the closing fade, never negative.
    pub fn fade_out_start(&self, fade: f64) -> f64 {
        (self.duration - fade).max(0.0)
    }
}

/// Escapes a value for use inside a single-quoted filtergraph option.
pub(crate) fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "'\\''")
}

/// Greedy word wrap so a caption fits the frame width.
pub(crate) fn wrap_caption(text: &str, max_chars: usize) -> String {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Characters per caption line for the given frame, using an average glyph
/// width of 0.55 em and 5% side margins.
pub(crate) fn caption_line_budget(style: &FrameStyle) -> usize {
    let usable = style.size as f64 * 0.9;
    let glyph = (style.font_size.max(1) as f64) * 0.55;
    (usable / glyph).floor() as usize
}

/// Square letterboxed frame with fades, plus the caption on top when a
/// caption file is given.
pub(crate) fn video_filter(clip: &SegmentClip, style: &FrameStyle, caption_file: Option<&Path>) -> String {
    let size = style.size;
    let mut filter = format!(
        "scale={size}:{size}:force_original_aspect_ratio=decrease,\
         pad={size}:{size}:(ow-iw)/2:(oh-ih)/2:color={bg},setsar=1,format=yuv420p,\
         fade=t=in:st=0:d={fade},fade=t=out:st={out:.3}:d={fade}",
        bg = style.background,
        fade = style.fade,
        out = clip.fade_out_start(style.fade),
    );

    if let Some(file) = caption_file {
        filter.push_str(&format!(
            ",drawtext=textfile='{}':expansion=none:fontcolor=white:fontsize={}:borderw=3:bordercolor=black@0.8:\
             line_spacing=8:x=(w-text_w)/2:y=h-text_h-60",
            escape_filter_value(&file.to_string_lossy()),
            style.font_size
        ));
        if let Some(font) = &style.font_file {
            filter.push_str(&format!(
                ":fontfile='{}'",
                escape_filter_value(&font.to_string_lossy())
            ));
        }
    }

    filter
}

/// ffmpeg arguments that turn one clip into a standalone MP4.
pub(crate) fn segment_args(
    clip: &SegmentClip,
    style: &FrameStyle,
    caption_file: Option<&Path>,
    output: &Path,
) -> Vec<String> {
    let fps = style.fps.to_string();
    vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-loop".into(),
        "1".into(),
        "-framerate".into(),
        fps.clone(),
        "-i".into(),
        clip.image.to_string_lossy().into_owned(),
        "-i".into(),
        clip.audio.to_string_lossy().into_owned(),
        "-vf".into(),
        video_filter(clip, style, caption_file),
        "-t".into(),
        format!("{:.3}", clip.duration),
        "-r".into(),
        fps,
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "veryfast".into(),
        "-tune".into(),
        "stillimage".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "192k".into(),
        "-ar".into(),
        "48000".into(),
        "-ac".into(),
        "2".into(),
        output.to_string_lossy().into_owned(),
    ]
}
