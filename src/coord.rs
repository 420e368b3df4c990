//! Coordinate systems: from scale-mapped positions to pixels.

use crate::aes::{X_AESTHETICS, Y_AESTHETICS};
use crate::data::{Column, DataTable};
use crate::error::Result;
use crate::render::Area;
use std::fmt;
use std::sync::Arc;

/// What a geom needs to know about the panel it draws into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelParams {
    /// Range of the x aesthetic in mapped units.
    pub x_range: (f64, f64),
    /// Range of the y aesthetic in mapped units.
    pub y_range: (f64, f64),
    /// Pixel rectangle of the panel.
    pub area: Area,
}

pub trait Coord: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the x aesthetic runs vertically.
    fn is_flipped(&self) -> bool {
        false
    }

    /// Pixel coordinate, along its own axis, of an x-family value.
    fn map_x(&self, v: f64, panel: &PanelParams) -> f64 {
        if self.is_flipped() {
            vertical(v, panel.x_range, &panel.area)
        } else {
            horizontal(v, panel.x_range, &panel.area)
        }
    }

    /// Pixel coordinate, along its own axis, of a y-family value.
    fn map_y(&self, v: f64, panel: &PanelParams) -> f64 {
        if self.is_flipped() {
            horizontal(v, panel.y_range, &panel.area)
        } else {
            vertical(v, panel.y_range, &panel.area)
        }
    }

    /// Screen point for an (x-axis pixel, y-axis pixel) pair.
    fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_flipped() {
            (y, x)
        } else {
            (x, y)
        }
    }

    /// Map every positional column of `data` into pixels.
    fn transform(&self, data: &DataTable, panel: &PanelParams) -> Result<DataTable> {
        let mut out = data.clone();
        for aes in X_AESTHETICS {
            if let Some(values) = data.numeric(aes) {
                let mapped = values.iter().map(|v| self.map_x(*v, panel)).collect();
                out = out.with_column(*aes, Column::Numeric(mapped))?;
            }
        }
        for aes in Y_AESTHETICS {
            if let Some(values) = data.numeric(aes) {
                let mapped = values.iter().map(|v| self.map_y(*v, panel)).collect();
                out = out.with_column(*aes, Column::Numeric(mapped))?;
            }
        }
        Ok(out)
    }
}

fn rescale(v: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi == lo {
        0.5
    } else {
        (v - lo) / (hi - lo)
    }
}

fn horizontal(v: f64, range: (f64, f64), area: &Area) -> f64 {
    area.left + rescale(v, range) * area.width()
}

fn vertical(v: f64, range: (f64, f64), area: &Area) -> f64 {
    area.bottom - rescale(v, range) * area.height()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoordCartesian;

impl Coord for CoordCartesian {
    fn name(&self) -> &'static str {
        "cartesian"
    }
}

/// Cartesian with x drawn vertically and y horizontally.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordFlip;

impl Coord for CoordFlip {
    fn name(&self) -> &'static str {
        "flip"
    }

    fn is_flipped(&self) -> bool {
        true
    }
}

pub fn coord_from_name(name: &str) -> Option<Arc<dyn Coord>> {
    match name {
        "cartesian" => Some(Arc::new(CoordCartesian)),
        "flip" => Some(Arc::new(CoordFlip)),
        _ => None,
    }
}
