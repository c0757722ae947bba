mod parser;

pub use parser::{normalize_generated_script, parse_script};

/// One (image prompt, narration) unit of the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 1-based position in the script
    pub index: usize,
    /// Search query for the segment's still image
    pub image_prompt: String,
    /// Sentence read by the speech synthesizer
    pub narration: String,
}

impl Segment {
    pub fn new(index: usize, image_prompt: String, narration: String) -> Self {
        Self {
            index,
            image_prompt,
            narration,
        }
    }
}
