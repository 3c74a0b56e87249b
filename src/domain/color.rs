// Color assignment for chart series
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_PALETTE: [&str; 6] = [
    "#ff6384", "#36a2eb", "#ffce56", "#4bc0c0", "#9966ff", "#ff9f40",
];

pub fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE.iter().map(|c| Color::new(*c)).collect()
}

/// Palette entry at `index % palette.len()`.
pub fn palette_color(palette: &[Color], index: usize) -> Option<Color> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[index % palette.len()].clone())
}

/// Uniform `#RRGGBB` color.
pub fn random_hex<R: Rng + ?Sized>(rng: &mut R) -> Color {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let hex: String = (0..6)
        .map(|_| DIGITS[rng.gen_range(0..16)] as char)
        .collect();
    Color(format!("#{}", hex))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPolicy {
    /// `index % palette_size`; repeats once the palette is exhausted.
    Palette,
    /// Palette for indices that fit, random hex beyond it.
    PaletteThenRandom,
    /// Random hex for every key.
    Random,
}

/// Assigns one color per key for the duration of a render pass.
///
/// The first color handed out for a key is returned again on later calls,
/// whatever index they pass.
pub struct ColorAssigner {
    palette: Vec<Color>,
    policy: ColorPolicy,
    rng: StdRng,
    assigned: HashMap<String, Color>,
}

impl ColorAssigner {
    pub fn new(palette: Vec<Color>, policy: ColorPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            palette,
            policy,
            rng,
            assigned: HashMap::new(),
        }
    }

    pub fn color_for(&mut self, key: &str, index: usize) -> Color {
        if let Some(color) = self.assigned.get(key) {
            return color.clone();
        }

        let fixed = match self.policy {
            ColorPolicy::Palette => palette_color(&self.palette, index),
            ColorPolicy::PaletteThenRandom if index < self.palette.len() => {
                palette_color(&self.palette, index)
            }
            _ => None,
        };
        // An empty palette falls through to random as well.
        let color = fixed.unwrap_or_else(|| random_hex(&mut self.rng));

        self.assigned.insert(key.to_string(), color.clone());
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_wraps() {
        let mut colors = ColorAssigner::new(default_palette(), ColorPolicy::Palette, None);
        assert_eq!(colors.color_for("a", 0).as_str(), "#ff6384");
        assert_eq!(colors.color_for("b", 6).as_str(), "#ff6384");
        assert_eq!(colors.color_for("c", 7).as_str(), "#36a2eb");
    }

    #[test]
    fn test_palette_then_random_beyond_palette() {
        let palette = vec![Color::new("#000000")];
        let mut colors = ColorAssigner::new(palette, ColorPolicy::PaletteThenRandom, Some(7));

        assert_eq!(colors.color_for("first", 0).as_str(), "#000000");
        let extra = colors.color_for("second", 1);
        assert_eq!(extra.as_str().len(), 7);
        assert!(extra.as_str().starts_with('#'));
        assert!(extra.as_str()[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = ColorAssigner::new(Vec::new(), ColorPolicy::Random, Some(42));
        let mut b = ColorAssigner::new(Vec::new(), ColorPolicy::Random, Some(42));

        for (i, key) in ["WW001", "WW002", "WW003"].iter().enumerate() {
            assert_eq!(a.color_for(key, i), b.color_for(key, i));
        }
    }

    #[test]
    fn test_key_keeps_its_color() {
        let mut colors = ColorAssigner::new(Vec::new(), ColorPolicy::Random, Some(1));
        let first = colors.color_for("WW001", 0);
        colors.color_for("WW002", 1);
        assert_eq!(colors.color_for("WW001", 5), first);
    }

    #[test]
    fn test_display_matches_css_value() {
        let color = Color::new("rgba(7,40,89,0.5)");
        assert_eq!(color.to_string(), color.as_str());
        assert_eq!(format!("{}", Color::new("#4caf50")), "#4caf50");
    }

    #[test]
    fn test_palette_color_empty() {
        assert_eq!(palette_color(&[], 3), None);
    }
}
