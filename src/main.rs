mod api;
mod assets;
mod config;
mod error;
mod pipeline;
mod scene;
mod video;

use api::{AzureOpenAiClient, AzureSpeechClient, GoogleImageSearch, HttpImageFetcher, ScriptGenerator};
use assets::{ImageResolver, Layout, ResolverOptions, SpeechSynthesizer};
use clap::Parser;
use config::Config;
use pipeline::{Pipeline, PipelineOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use video::{FfmpegCompositor, FrameStyle};

#[derive(Parser, Debug)]
#[command(name = "auto-shorts")]
#[command(about = "Turn a generated narration script into a narrated slideshow video", long_about = None)]
struct Args {
    /// Directory holding input/, audio/ and output/
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Clear downloaded images and synthesized audio before running
    #[arg(long)]
    fresh: bool,

    /// Use the existing input/script.txt instead of generating a new one
    #[arg(long)]
    no_generate: bool,

    /// Burn narration captions into the video
    #[arg(long)]
    subtitles: bool,

    /// Image search candidates per query
    #[arg(long, default_value_t = 5)]
    results: usize,

    /// Query used when a segment's own prompt yields no image
    #[arg(long, default_value = "anime background")]
    fallback_query: String,

    /// Image acquisitions per segment before giving up
    #[arg(long, default_value_t = 5)]
    image_attempts: usize,

    /// Speech synthesis attempts per segment before giving up
    #[arg(long, default_value_t = 2)]
    synthesis_attempts: usize,

    /// Image download timeout in seconds
    #[arg(long, default_value_t = 10)]
    download_timeout: u64,

    /// Azure voice name, overrides AZURE_TTS_VOICE
    #[arg(long)]
    voice: Option<String>,

    /// Edge of the square output frame in pixels (even, for yuv420p)
    #[arg(long, default_value_t = 1080, value_parser = parse_frame_size)]
    frame_size: u32,

    /// Letterbox fill color
    #[arg(long, default_value = "black")]
    background: String,

    /// Font file for captions
    #[arg(long)]
    font_file: Option<PathBuf>,
}

fn parse_frame_size(value: &str) -> Result<u32, String> {
    let size: u32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a pixel count"))?;
    if size == 0 || size % 2 != 0 {
        return Err(format!("frame size must be a positive even number, got {size}"));
    }
    Ok(size)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    let config = match Config::from_env(!args.no_generate) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Starting video generation in {}", args.root.display());

    let pipeline = build_pipeline(&args, &config)?;
    match pipeline.run().await {
        Ok(output) => {
            info!("Video generation completed successfully: {}", output.display());
            Ok(())
        }
        Err(e) => {
            error!("Video generation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_pipeline(args: &Args, config: &Config) -> anyhow::Result<Pipeline> {
    let generator = match &config.generation {
        Some(generation) => {
            Some(Box::new(AzureOpenAiClient::new(generation.clone())?) as Box<dyn ScriptGenerator>)
        }
        None => None,
    };

    let images = ImageResolver::new(
        Box::new(GoogleImageSearch::new(config.search.clone())?),
        Box::new(HttpImageFetcher::new(Duration::from_secs(args.download_timeout))?),
        ResolverOptions {
            result_count: args.results,
            fallback_query: args.fallback_query.clone(),
            max_attempts: args.image_attempts,
        },
    );

    let voice = args.voice.clone().unwrap_or_else(|| config.speech.voice.clone());
    let speech = SpeechSynthesizer::new(
        Box::new(AzureSpeechClient::new(&config.speech)?),
        voice,
        args.synthesis_attempts,
    );

    let compositor = FfmpegCompositor::new(FrameStyle {
        size: args.frame_size,
        background: args.background.clone(),
        font_file: args.font_file.clone(),
        ..FrameStyle::default()
    });

    Ok(Pipeline::new(
        Layout::new(&args.root),
        generator,
        images,
        speech,
        Box::new(compositor),
        PipelineOptions {
            fresh: args.fresh,
            subtitles: args.subtitles,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_behaviour() {
        let args = Args::parse_from(["auto-shorts"]);
        assert_eq!(args.results, 5);
        assert_eq!(args.fallback_query, "anime background");
        assert_eq!(args.image_attempts, 5);
        assert_eq!(args.synthesis_attempts, 2);
        assert_eq!(args.frame_size, 1080);
        assert!(!args.fresh && !args.no_generate && !args.subtitles);
    }

    #[test]
    fn odd_frame_size_is_rejected() {
        assert!(Args::try_parse_from(["auto-shorts", "--frame-size", "1079"]).is_err());
        assert!(Args::try_parse_from(["auto-shorts", "--frame-size", "0"]).is_err());
        let args = Args::try_parse_from(["auto-shorts", "--frame-size", "720"]).unwrap();
        assert_eq!(args.frame_size, 720);
    }

    #[test]
    fn flags_parse() {
        let args = Args::parse_from([
            "auto-shorts",
            "--fresh",
            "--no-generate",
            "--subtitles",
            "--root",
            "/tmp/run",
            "--voice",
            "en-US-AvaNeural",
        ]);
        assert!(args.fresh && args.no_generate && args.subtitles);
        assert_eq!(args.root, PathBuf::from("/tmp/run"));
        assert_eq!(args.voice.as_deref(), Some("en-US-AvaNeural"));
    }
}
