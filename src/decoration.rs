//! Per-poem decoration tokens.
//!
//! A token names the background treatment the presentation layer renders
//! behind a poem. Tokens are independent of poem content.

use rand::seq::SliceRandom;

/// Background treatments understood by the presentation layer.
pub const DECORATIONS: &[&str] = &[
    "floating_particles",
    "gradient_waves",
    "geometric_patterns",
    "floating_hearts",
    "sparkling_stars",
    "flowing_lines",
    "colorful_bubbles",
    "mystical_aurora",
];

/// Token used if the vocabulary is ever empty.
const DEFAULT_DECORATION: &str = "floating_particles";

/// Picks decoration tokens uniformly from a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct DecorationPicker {
    vocabulary: Vec<String>,
}

impl Default for DecorationPicker {
    fn default() -> Self {
        Self::new(DECORATIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl DecorationPicker {
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self { vocabulary }
    }

    /// Returns exactly `count` tokens.
    pub fn pick(&self, count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|_| {
                self.vocabulary
                    .choose(&mut rng)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_DECORATION.to_string())
            })
            .collect()
    }
}
