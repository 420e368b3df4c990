use super::{fill_at, num_at, str_at, Geom, POINT_SCALE};
use crate::coord::{Coord, PanelParams};
use crate::data::{DataTable, Value};
use crate::params::Params;
use crate::render::{Area, Backend, Fill, Marker, Stroke};

#[derive(Debug, Clone, Copy, Default)]
pub struct GeomPoint;

pub(crate) fn marker_at(data: &DataTable, i: usize) -> Marker {
    let shape = str_at(data, "shape", i, "circle");
    let color = str_at(data, "color", i, "black");
    let alpha = num_at(data, "alpha", i, 1.0);
    // Solid shapes take their fill from the outline colour unless one is set
    let fill = fill_at(data, i).unwrap_or_else(|| Fill {
        color: color.clone(),
        alpha,
    });
    Marker {
        shape,
        size: num_at(data, "size", i, 1.5) * POINT_SCALE,
        stroke: Stroke {
            color,
            alpha,
            width: num_at(data, "stroke", i, 0.5),
            linetype: "solid".to_string(),
        },
        fill: Some(fill),
    }
}

impl Geom for GeomPoint {
    fn name(&self) -> &'static str {
        "point"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("shape", Value::Str("circle".into())),
            ("color", Value::Str("black".into())),
            ("size", Value::Num(1.5)),
            ("fill", Value::Str("NA".into())),
            ("alpha", Value::Num(1.0)),
            ("stroke", Value::Num(0.5)),
        ]
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        &["x", "y", "color", "fill", "size", "shape", "alpha", "stroke"]
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        _params: &Params,
    ) -> anyhow::Result<()> {
        let data = coord.transform(data, panel)?;
        let (xs, ys) = match (data.numeric("x"), data.numeric("y")) {
            (Some(x), Some(y)) => (x, y),
            _ => return Ok(()),
        };
        for i in 0..data.nrow() {
            if !xs[i].is_finite() || !ys[i].is_finite() {
                continue;
            }
            backend.points(&[coord.to_screen(xs[i], ys[i])], &marker_at(&data, i))?;
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
        backend.points(&[area.center()], &marker_at(key, 0))?;
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::CoordCartesian;
    use crate::data::Column;
    use crate::render::{DrawCommand, RecordingBackend};

    #[test]
    fn test_one_marker_per_row() {
        let data = DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![0.0, 1.0, f64::NAN])),
            ("y", Column::Numeric(vec![0.0, 1.0, 1.0])),
            ("color", Column::Text(vec!["red".into(), "blue".into(), "red".into()])),
        ])
        .unwrap();
        let panel = PanelParams {
            x_range: (0.0, 1.0),
            y_range: (0.0, 1.0),
            area: Area::new(0.0, 0.0, 10.0, 10.0),
        };
        let mut backend = RecordingBackend::new();
        GeomPoint
            .draw_group(&data, &panel, &CoordCartesian, &mut backend, &Params::new())
            .unwrap();
        assert_eq!(backend.commands.len(), 2);
        match &backend.commands[1] {
            DrawCommand::Points { points, marker } => {
                assert_eq!(points, &vec![(10.0, 0.0)]);
                assert_eq!(marker.stroke.color, "blue");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
