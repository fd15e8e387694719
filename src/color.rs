use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Mix, Srgb};
use serde::Serialize;

use crate::data::model::GroupKey;

/// An sRGB colour handed to the renderer, serialised as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const GRAY: Rgb8 = Rgb8::new(0x80, 0x80, 0x80);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb8 { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn to_srgb(self) -> Srgb {
        Srgb::new(self.r, self.g, self.b).into_format()
    }

    fn from_srgb(c: Srgb) -> Self {
        let c: Srgb<u8> = c.into_format();
        Rgb8::new(c.red, c.green, c.blue)
    }
}

impl Serialize for Rgb8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb8> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Rgb8::from_srgb(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Group colours: group key → Rgb8
// ---------------------------------------------------------------------------

/// Maps group keys to distinct colours for legends and point fills.
#[derive(Debug, Clone)]
pub struct GroupColors {
    mapping: BTreeMap<GroupKey, Rgb8>,
    default_color: Rgb8,
}

impl GroupColors {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a GroupKey>) -> Self {
        let keys: Vec<&GroupKey> = keys.into_iter().collect();
        let palette = generate_palette(keys.len());
        let mapping = keys
            .into_iter()
            .zip(palette)
            .map(|(k, c)| (k.clone(), c))
            .collect();

        GroupColors {
            mapping,
            default_color: Rgb8::GRAY,
        }
    }

    /// Look up the colour for a given group.
    pub fn color_for(&self, key: &GroupKey) -> Rgb8 {
        self.mapping.get(key).copied().unwrap_or(self.default_color)
    }

    /// Legend entries (label, colour) in group order.
    pub fn legend_entries(&self) -> Vec<(String, Rgb8)> {
        self.mapping
            .iter()
            .map(|(k, c)| (k.to_string(), *c))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Diverging scale for correlation coefficients
// ---------------------------------------------------------------------------

/// Red (−1) → white (0) → blue (+1), with a neutral grey for undefined cells.
#[derive(Debug, Clone, Copy)]
pub struct DivergingScale {
    pub negative: Rgb8,
    pub midpoint: Rgb8,
    pub positive: Rgb8,
    pub undefined: Rgb8,
}

impl Default for DivergingScale {
    fn default() -> Self {
        DivergingScale {
            negative: Rgb8::new(0xd7, 0x30, 0x27),
            midpoint: Rgb8::new(0xff, 0xff, 0xff),
            positive: Rgb8::new(0x45, 0x75, 0xb4),
            undefined: Rgb8::new(0xbd, 0xbd, 0xbd),
        }
    }
}

impl DivergingScale {
    /// Colour for a coefficient; values outside `[-1, 1]` are clamped.
    pub fn color(&self, value: f64) -> Rgb8 {
        if value.is_nan() {
            return self.undefined;
        }
        let v = value.clamp(-1.0, 1.0) as f32;
        let (from, to, t) = if v < 0.0 {
            (self.negative, self.midpoint, v + 1.0)
        } else {
            (self.midpoint, self.positive, v)
        };
        Rgb8::from_srgb(from.to_srgb().mix(to.to_srgb(), t))
    }
}
