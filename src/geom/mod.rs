//! Geometric objects.
//!
//! A geom declares its aesthetics and parameters, prepares data around the
//! stat ([`Geom::setup_data`] before it, [`Geom::reparameterise`] after it)
//! and draws one group at a time into a [`Backend`].

mod area;
mod bar;
mod boxplot;
mod line;
mod point;
mod rug;
mod text;

pub use area::GeomArea;
pub use bar::GeomBar;
pub use boxplot::GeomBoxplot;
pub(crate) use boxplot::{pack_outliers, unpack_outliers};
pub use line::{GeomLine, GeomPath, GeomSmooth};
pub use point::GeomPoint;
pub use rug::GeomRug;
pub use text::GeomText;

use crate::coord::{Coord, PanelParams};
use crate::data::{Column, DataTable, Value};
use crate::error::{PlotError, Result};
use crate::params::Params;
use crate::render::{Area, Backend, Fill, Stroke};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Pixels per unit of `linewidth`.
pub(crate) const LINE_SCALE: f64 = 2.0;
/// Pixels of radius per unit of point `size`.
pub(crate) const POINT_SCALE: f64 = 1.5;

/// Visual values of one legend key, per aesthetic.
pub type KeyValues = IndexMap<String, Value>;

pub trait Geom: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn required_aes(&self) -> &'static [&'static str];

    /// Constant visual values for aesthetics that are neither mapped nor set.
    fn default_aes(&self) -> Vec<(&'static str, Value)>;

    fn default_params(&self) -> Params {
        Params::new()
    }

    /// Aesthetics this geom draws; drives automatic legend membership.
    fn supported_aes(&self) -> &'static [&'static str];

    fn default_stat(&self) -> &'static str {
        "identity"
    }

    fn default_position(&self) -> &'static str {
        "identity"
    }

    /// Position implied by the geom's own parameters, e.g. text nudging.
    fn position_override(&self, _params: &Params) -> Option<(&'static str, Params)> {
        None
    }

    /// Prepare resolved data before the stat runs.
    fn setup_data(&self, data: DataTable, _params: &Params) -> Result<DataTable> {
        Ok(data)
    }

    /// Derive extents (`xmin`, `ymax`, ...) from the stat output before the
    /// position adjustment.
    fn reparameterise(&self, data: DataTable, _params: &Params) -> Result<DataTable> {
        Ok(data)
    }

    /// Draw one group. `data` holds mapped values; the geom converts
    /// positions to pixels through `coord`.
    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        params: &Params,
    ) -> anyhow::Result<()>;

    /// Draw the key glyph for a one-row `key` table inside `area`.
    fn draw_legend(
        &self,
        key: &DataTable,
        area: Area,
        params: &Params,
        backend: &mut dyn Backend,
    ) -> anyhow::Result<Area>;
}

/// Look up a geom by name.
pub fn geom_from_name(name: &str) -> Result<Arc<dyn Geom>> {
    let geom: Arc<dyn Geom> = match name {
        "point" => Arc::new(GeomPoint),
        "line" => Arc::new(GeomLine),
        "path" => Arc::new(GeomPath),
        "smooth" => Arc::new(GeomSmooth),
        "bar" => Arc::new(GeomBar::bar()),
        "col" => Arc::new(GeomBar::col()),
        "histogram" => Arc::new(GeomBar::histogram()),
        "text" => Arc::new(GeomText),
        "rug" => Arc::new(GeomRug),
        "area" => Arc::new(GeomArea),
        "boxplot" => Arc::new(GeomBoxplot),
        _ => {
            return Err(PlotError::UnknownComponent {
                kind: "geom",
                name: name.to_string(),
            })
        }
    };
    Ok(geom)
}

/// One-row table holding a legend key's values.
pub fn key_table(values: &KeyValues) -> Result<DataTable> {
    let mut table = DataTable::with_rows(1);
    for (aes, v) in values {
        table = table.with_column(aes.as_str(), Column::repeat(v, 1))?;
    }
    Ok(table)
}

pub(crate) fn num_at(data: &DataTable, aes: &str, i: usize, default: f64) -> f64 {
    data.column(aes)
        .map(|c| c.f64_at(i))
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

pub(crate) fn str_at(data: &DataTable, aes: &str, i: usize, default: &str) -> String {
    data.column(aes)
        .map(|c| c.key(i))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn is_blank(color: &str) -> bool {
    color.is_empty() || color.eq_ignore_ascii_case("na") || color.eq_ignore_ascii_case("none")
}

/// Outline of row `i` from `color`, `alpha`, `linewidth` and `linetype`.
pub(crate) fn stroke_at(data: &DataTable, i: usize) -> Option<Stroke> {
    let color = str_at(data, "color", i, "NA");
    if is_blank(&color) {
        return None;
    }
    Some(Stroke {
        color,
        alpha: num_at(data, "alpha", i, 1.0),
        width: num_at(data, "linewidth", i, 0.5) * LINE_SCALE,
        linetype: str_at(data, "linetype", i, "solid"),
    })
}

/// Interior of row `i` from `fill` and `alpha`.
pub(crate) fn fill_at(data: &DataTable, i: usize) -> Option<Fill> {
    let color = str_at(data, "fill", i, "NA");
    if is_blank(&color) {
        return None;
    }
    Some(Fill {
        color,
        alpha: num_at(data, "alpha", i, 1.0),
    })
}

/// Screen points of `(x, y)` column pairs after coord transformation.
pub(crate) fn screen_points(data: &DataTable, coord: &dyn Coord, x: &str, y: &str) -> Vec<(f64, f64)> {
    match (data.numeric(x), data.numeric(y)) {
        (Some(xs), Some(ys)) => xs
            .iter()
            .zip(ys)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(a, b)| coord.to_screen(*a, *b))
            .collect(),
        _ => Vec::new(),
    }
}

/// Screen rectangle spanned by two x and two y pixel positions.
pub(crate) fn screen_rect(coord: &dyn Coord, x0: f64, x1: f64, y0: f64, y1: f64) -> Area {
    let (ax, ay) = coord.to_screen(x0, y0);
    let (bx, by) = coord.to_screen(x1, y1);
    Area::new(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names() {
        for name in [
            "point", "line", "path", "smooth", "bar", "col", "histogram", "text", "rug", "area", "boxplot",
        ] {
            assert_eq!(geom_from_name(name).unwrap().name(), name);
        }
        assert!(matches!(
            geom_from_name("hexbin"),
            Err(PlotError::UnknownComponent { kind: "geom", .. })
        ));
    }

    #[test]
    fn test_blank_color_has_no_stroke() {
        let mut key = KeyValues::new();
        key.insert("color".to_string(), Value::Str("NA".to_string()));
        let table = key_table(&key).unwrap();
        assert!(stroke_at(&table, 0).is_none());
        key.insert("color".to_string(), Value::Str("red".to_string()));
        let table = key_table(&key).unwrap();
        assert_eq!(stroke_at(&table, 0).unwrap().color, "red");
    }
}
