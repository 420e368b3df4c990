// Fixed palettes for discrete aesthetics, plus colour parsing for renderers

/// Category10 colours (D3-inspired).
pub const CATEGORY10: &[&str] = &[
    "#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B", "#E377C2", "#7F7F7F",
    "#BCBD22", "#17BECF",
];

pub const SHAPES: &[&str] = &["circle", "triangle", "square", "diamond", "cross", "star"];

pub const LINETYPES: &[&str] = &["solid", "dashed", "dotted", "dotdash", "longdash", "twodash"];

/// Colour used for values outside a scale's domain.
pub const NA_COLOR: &str = "#7F7F7F";

/// Default low/high of a continuous colour gradient.
pub const GRADIENT_LOW: &str = "#132B43";
pub const GRADIENT_HIGH: &str = "#56B1F7";

/// Fixed-length palette that cycles when indexed past its end.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclicPalette {
    values: Vec<String>,
}

impl CyclicPalette {
    pub fn new(values: Vec<String>) -> Self {
        CyclicPalette { values }
    }

    pub fn from_static(values: &[&str]) -> Self {
        CyclicPalette {
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        if self.values.is_empty() {
            return None;
        }
        Some(&self.values[index % self.values.len()])
    }
}

/// Evenly spaced values between `min` and `max`, one per level; a single
/// level gets the midpoint.
pub fn evenly_spaced(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![(min + max) / 2.0],
        _ => (0..n)
            .map(|i| min + (max - min) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Parse a `#RRGGBB` string or a common colour name.
pub fn parse_color(s: &str) -> Option<(u8, u8, u8)> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| hex.get(range).and_then(|c| u8::from_str_radix(c, 16).ok());
        let (r, g, b) = (channel(0..2)?, channel(2..4)?, channel(4..6)?);
        return Some((r, g, b));
    }
    let rgb = match s.to_ascii_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "brown" => (165, 42, 42),
        "pink" => (255, 192, 203),
        "gray" | "grey" => (128, 128, 128),
        "grey50" | "gray50" => (127, 127, 127),
        "olive" => (128, 128, 0),
        "cyan" => (0, 255, 255),
        "magenta" => (255, 0, 255),
        "yellow" => (255, 255, 0),
        "navy" => (0, 0, 128),
        "steelblue" => (70, 130, 180),
        "darkgreen" => (0, 100, 0),
        "darkred" => (139, 0, 0),
        "lightgray" | "lightgrey" => (211, 211, 211),
        _ => return None,
    };
    Some(rgb)
}

pub fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Linear interpolation between two colours in RGB, `t` in [0, 1].
pub fn interpolate(low: (u8, u8, u8), high: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    (lerp(low.0, high.0), lerp(low.1, high.1), lerp(low.2, high.2))
}
