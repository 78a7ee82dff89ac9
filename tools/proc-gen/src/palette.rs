//! Distinct debug colors
//!
//! Consecutive indices step the hue by the golden-ratio conjugate, so neighbouring
//! material bands and successive bodies are easy to tell apart.

use tessera_shared::Color;

const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;
const SATURATIONS: [f32; 3] = [0.75, 0.55, 0.9];
const VALUES: [f32; 2] = [0.95, 0.75];

/// HSV to RGB conversion
///
/// `h` is in degrees, `s` and `v` in `[0, 1]`.
#[inline]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let h = h % 360.0;
    let h = if h < 0.0 { h + 360.0 } else { h };

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).clamp(0.0, 255.0) as u8,
        ((g + m) * 255.0).clamp(0.0, 255.0) as u8,
        ((b + m) * 255.0).clamp(0.0, 255.0) as u8,
    )
}

/// Deterministic, visually distinct color for an index
pub fn distinct_color(index: u32) -> Color {
    let hue = (index as f32 * GOLDEN_RATIO_CONJUGATE).fract() * 360.0;
    let s = SATURATIONS[index as usize % SATURATIONS.len()];
    let v = VALUES[(index as usize / SATURATIONS.len()) % VALUES.len()];
    let (r, g, b) = hsv_to_rgb(hue, s, v);
    Color::rgb(r, g, b)
}

/// Hands out [`distinct_color`]s in order, starting at index 0
#[derive(Clone, Debug, Default)]
pub struct ColorSequence {
    next: u32,
}

impl ColorSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_color(&mut self) -> Color {
        let color = distinct_color(self.next);
        self.next += 1;
        color
    }

    /// Number of colors handed out so far
    pub fn issued(&self) -> u32 {
        self.next
    }
}

impl Iterator for ColorSequence {
    type Item = Color;

    fn next(&mut self) -> Option<Color> {
        Some(self.next_color())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (255, 0, 0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), (0, 255, 0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), (0, 0, 255));
        assert_eq!(hsv_to_rgb(-120.0, 1.0, 1.0), (0, 0, 255));
    }

    #[test]
    fn test_distinct_colors_differ() {
        let colors: Vec<Color> = (0..16).map(distinct_color).collect();
        for (i, a) in colors.iter().enumerate() {
            assert_eq!(a.a, 255);
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_sequence_matches_indices() {
        let mut sequence = ColorSequence::new();
        assert_eq!(sequence.next_color(), distinct_color(0));
        assert_eq!(sequence.next_color(), distinct_color(1));
        assert_eq!(sequence.issued(), 2);
        assert_eq!(sequence.take(3).count(), 3);
    }
}
