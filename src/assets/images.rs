use crate::api::{ImageFetch, ImageSearch};
use crate::error::{Result, VideoError};
use crate::scene::Segment;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_FALLBACK_QUERY: &str = "anime background";

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Candidate URLs requested per search
    pub result_count: usize,
    /// Generic query used once the segment prompt has failed
    pub fallback_query: String,
    /// Upper bound on acquisitions per segment, the first one included.
    /// Never less than two, so the fallback query always gets its turn.
    pub max_attempts: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            result_count: 5,
            fallback_query: DEFAULT_FALLBACK_QUERY.to_string(),
            max_attempts: 5,
        }
    }
}

/// Outcome of one search + download pass.
#[derive(Debug)]
enum Acquisition {
    Stored { url: String },
    Empty,
}

/// Turns a segment's image prompt into a decodable image on disk.
pub struct ImageResolver {
    search: Box<dyn ImageSearch>,
    fetch: Box<dyn ImageFetch>,
    options: ResolverOptions,
}

impl ImageResolver {
    pub fn new(
        search: Box<dyn ImageSearch>,
        fetch: Box<dyn ImageFetch>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            search,
            fetch,
            options,
        }
    }

    /// Makes sure `target` holds a valid image for `segment`.
    ///
    /// The first acquisition uses the segment prompt; every later one uses
    /// the fallback query. A fallback pass that finds nothing at all ends
    /// the segment, as does reaching `max_attempts`.
    pub async fn resolve(&self, segment: &Segment, target: &Path) -> Result<()> {
        if is_valid_image(target) {
            info!(
                "Segment {} image already present, skipping search: {}",
                segment.index,
                target.display()
            );
            return Ok(());
        }
        remove_if_present(target).await;

        let max_attempts = self.options.max_attempts.max(2);
        for attempt in 1..=max_attempts {
            let on_fallback = attempt > 1;
            let query = if on_fallback {
                self.options.fallback_query.as_str()
            } else {
                segment.image_prompt.as_str()
            };

            info!("Searching and downloading image for: {}", query);
            match self.acquire(query, target).await? {
                Acquisition::Stored { url } => {
                    if is_valid_image(target) {
                        info!("Downloaded image to {} from {}", target.display(), url);
                        return Ok(());
                    }
                    warn!(
                        "Image from {} is not decodable, retrying with fallback query (attempt {}/{})",
                        url, attempt, max_attempts
                    );
                    remove_if_present(target).await;
                }
                Acquisition::Empty if on_fallback => {
                    return Err(VideoError::ImageResolution {
                        index: segment.index,
                        query: segment.image_prompt.clone(),
                        attempts: attempt,
                    });
                }
                Acquisition::Empty => {
                    warn!(
                        "No usable image for '{}', falling back to '{}'",
                        query, self.options.fallback_query
                    );
                }
            }
        }

        Err(VideoError::ImageResolution {
            index: segment.index,
            query: segment.image_prompt.clone(),
            attempts: max_attempts,
        })
    }

    /// Tries each ranked candidate until one declares an image content type.
    /// Search and download failures are logged and never escape.
    async fn acquire(&self, query: &str, target: &Path) -> Result<Acquisition> {
        let candidates = match self.search.search(query, self.options.result_count).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Failed to find image for '{}': {}", query, e);
                return Ok(Acquisition::Empty);
            }
        };
        if candidates.is_empty() {
            warn!("No image results found for '{}'", query);
            return Ok(Acquisition::Empty);
        }

        for (rank, url) in candidates.into_iter().enumerate() {
            info!("Found image (index {}): {}", rank, url);
            let fetched = match self.fetch.fetch(&url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("Failed to download {}: {}", url, e);
                    continue;
                }
            };
            if !fetched.is_image() {
                warn!(
                    "URL did not return image content: {} ({})",
                    url, fetched.content_type
                );
                continue;
            }

            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(target, &fetched.bytes).await?;
            return Ok(Acquisition::Stored { url });
        }

        Ok(Acquisition::Empty)
    }
}

/// True when the file exists and fully decodes as an image.
pub fn is_valid_image(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let decoded = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.decode());
    match decoded {
        Ok(_) => true,
        Err(e) => {
            warn!("Invalid image at {}: {}", path.display(), e);
            false
        }
    }
}

async fn remove_if_present(path: &Path) {
    if tokio::fs::metadata(path).await.is_ok() {
        tokio::fs::remove_file(path).await.ok();
    }
}
