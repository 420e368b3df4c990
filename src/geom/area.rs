use super::{fill_at, stroke_at, Geom};
use crate::coord::{Coord, PanelParams};
use crate::data::{Column, DataTable, Value};
use crate::error::Result;
use crate::params::Params;
use crate::render::{Area, Backend};

/// Filled region between zero (or the stack below) and `y`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeomArea;

impl Geom for GeomArea {
    fn name(&self) -> &'static str {
        "area"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("fill", Value::Str("#333333".into())),
            ("color", Value::Str("NA".into())),
            ("linewidth", Value::Num(0.5)),
            ("linetype", Value::Str("solid".into())),
            ("alpha", Value::Num(1.0)),
        ]
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        &["x", "y", "fill", "color", "linewidth", "linetype", "alpha"]
    }

    fn default_position(&self) -> &'static str {
        "stack"
    }

    fn reparameterise(&self, data: DataTable, _params: &Params) -> Result<DataTable> {
        let ys = match data.numeric("y") {
            Some(y) => y.to_vec(),
            None => return Ok(data),
        };
        let mut order: Vec<usize> = (0..data.nrow()).collect();
        if let Some(xs) = data.numeric("x") {
            order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));
        }
        data.with_column("ymin", Column::Numeric(vec![0.0; ys.len()]))?
            .with_column("ymax", Column::Numeric(ys))
            .map(|t| t.take(&order))
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        _params: &Params,
    ) -> anyhow::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let pixels = coord.transform(data, panel)?;
        let cols = ["x", "ymin", "ymax"].map(|c| pixels.numeric(c));
        let [Some(xs), Some(lo), Some(hi)] = cols else {
            return Ok(());
        };
        let rows: Vec<usize> = (0..pixels.nrow())
            .filter(|&i| xs[i].is_finite() && lo[i].is_finite() && hi[i].is_finite())
            .collect();
        if rows.len() < 2 {
            return Ok(());
        }
        let upper: Vec<(f64, f64)> = rows.iter().map(|&i| coord.to_screen(xs[i], hi[i])).collect();
        let mut outline = upper.clone();
        outline.extend(rows.iter().rev().map(|&i| coord.to_screen(xs[i], lo[i])));

        if let Some(fill) = fill_at(&pixels, 0) {
            backend.polygon(&outline, &fill, None)?;
        }
        if let Some(stroke) = stroke_at(&pixels, 0) {
            backend.polyline(&upper, &stroke)?;
        }
        Ok(())
    }

    fn draw_legend(
        &self,
        key: &DataTable,
        area: Area,
        _params: &Params,
        backend: &mut dyn Backend,
    ) -> anyhow::Result<Area> {
        super::bar::draw_rect_key(key, area, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::CoordCartesian;
    use crate::render::{DrawCommand, RecordingBackend};

    #[test]
    fn test_area_polygon_closes_on_baseline() {
        let data = DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![2.0, 0.0])),
            ("y", Column::Numeric(vec![2.0, 1.0])),
            ("fill", Column::Text(vec!["grey".into(); 2])),
        ])
        .unwrap();
        let data = GeomArea.reparameterise(data, &Params::new()).unwrap();
        assert_eq!(data.numeric("x").unwrap(), &[0.0, 2.0]);

        let panel = PanelParams {
            x_range: (0.0, 2.0),
            y_range: (0.0, 2.0),
            area: Area::new(0.0, 0.0, 2.0, 2.0),
        };
        let mut backend = RecordingBackend::new();
        GeomArea
            .draw_group(&data, &panel, &CoordCartesian, &mut backend, &Params::new())
            .unwrap();
        match &backend.commands[0] {
            DrawCommand::Polygon { points, .. } => {
                assert_eq!(points, &vec![(0.0, 1.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
