use crate::data::{Column, Value};
use crate::palette::{self, CyclicPalette, CATEGORY10, LINETYPES, NA_COLOR, SHAPES};
use serde::Serialize;

/// Palette a discrete scale draws from.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscretePalette {
    /// Fixed list, cycled past its end.
    Cyclic(CyclicPalette),
    /// Numbers spread evenly over a range, one per level.
    Spaced(f64, f64),
}

impl DiscretePalette {
    pub fn for_aes(aes: &str) -> DiscretePalette {
        match aes {
            "shape" => DiscretePalette::Cyclic(CyclicPalette::from_static(SHAPES)),
            "linetype" => DiscretePalette::Cyclic(CyclicPalette::from_static(LINETYPES)),
            "size" => DiscretePalette::Spaced(3.0, 15.0),
            "linewidth" | "stroke" => DiscretePalette::Spaced(0.5, 3.0),
            "alpha" => DiscretePalette::Spaced(0.1, 1.0),
            _ => DiscretePalette::Cyclic(CyclicPalette::from_static(CATEGORY10)),
        }
    }
}

fn na_value(aes: &str) -> Value {
    match aes {
        "color" | "fill" => Value::Str(NA_COLOR.to_string()),
        "shape" | "linetype" => Value::Str(String::new()),
        _ => Value::Num(f64::NAN),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscreteScale {
    /// Explicit level order; replaces the trained levels when set.
    pub limits: Option<Vec<String>>,
    /// Manual palette values.
    pub values: Option<Vec<String>>,
    levels: Vec<String>,
    continuous_range: Option<(f64, f64)>,
}

impl DiscreteScale {
    /// Fold the column's levels into the ordered set, keeping first-seen order.
    pub fn train_levels(&mut self, col: &Column) {
        for level in col.observed_levels() {
            if !self.levels.contains(&level) {
                self.levels.push(level);
            }
        }
    }

    /// Position scales also track numbers placed on the axis, e.g. bar edges.
    pub fn train_continuous(&mut self, values: &[f64]) {
        for &v in values.iter().filter(|v| v.is_finite()) {
            self.continuous_range = Some(match self.continuous_range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }

    pub fn levels(&self) -> &[String] {
        self.limits.as_deref().unwrap_or(&self.levels)
    }

    pub fn continuous_range(&self) -> Option<(f64, f64)> {
        self.continuous_range
    }

    pub fn rank(&self, level: &str) -> Option<usize> {
        self.levels().iter().position(|l| l == level)
    }

    /// Level rank + 1 as a number; unknown levels become NaN.
    pub fn encode_position(&self, col: &Column) -> Column {
        match col {
            Column::Numeric(v) => Column::Numeric(v.clone()),
            _ => Column::Numeric(
                (0..col.len())
                    .map(|i| {
                        self.rank(&col.key(i))
                            .map(|r| (r + 1) as f64)
                            .unwrap_or(f64::NAN)
                    })
                    .collect(),
            ),
        }
    }

    pub fn palette(&self, aes: &str) -> DiscretePalette {
        match &self.values {
            Some(values) => DiscretePalette::Cyclic(CyclicPalette::new(values.clone())),
            None => DiscretePalette::for_aes(aes),
        }
    }

    /// Number of levels and palette entries when the palette must cycle.
    pub fn overflow(&self, aes: &str) -> Option<(usize, usize)> {
        match self.palette(aes) {
            DiscretePalette::Cyclic(p) if self.levels().len() > p.len() => {
                Some((self.levels().len(), p.len()))
            }
            _ => None,
        }
    }

    /// Visual value for `level`.
    pub fn map_visual(&self, aes: &str, level: &str) -> Value {
        let rank = match self.rank(level) {
            Some(r) => r,
            None => return na_value(aes),
        };
        match self.palette(aes) {
            DiscretePalette::Cyclic(p) => match p.get(rank) {
                Some(v) => match (aes, v.parse::<f64>()) {
                    ("size" | "alpha" | "linewidth" | "stroke", Ok(n)) => Value::Num(n),
                    _ => Value::Str(v.to_string()),
                },
                None => na_value(aes),
            },
            DiscretePalette::Spaced(lo, hi) => {
                let spaced = palette::evenly_spaced(lo, hi, self.levels().len());
                Value::Num(spaced[rank])
            }
        }
    }
}
