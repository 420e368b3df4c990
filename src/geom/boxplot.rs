use super::point::marker_at;
use super::{fill_at, screen_rect, stroke_at, Geom};
use crate::coord::{Coord, PanelParams};
use crate::data::{Column, DataTable, Value};
use crate::error::Result;
use crate::params::Params;
use crate::render::{Area, Backend};

/// Box from the lower to the upper hinge with a median bar, whiskers to
/// `ymin`/`ymax` and the outliers as points.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeomBoxplot;

/// Pack outlier values as a comma-separated list at full precision.
pub(crate) fn pack_outliers(values: impl IntoIterator<Item = f64>) -> String {
    values.into_iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

/// Outlier values packed by [`pack_outliers`].
pub(crate) fn unpack_outliers(packed: &str) -> Vec<f64> {
    packed
        .split(',')
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .collect()
}

impl Geom for GeomBoxplot {
    fn name(&self) -> &'static str {
        "boxplot"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "lower", "upper", "middle", "ymin", "ymax"]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("color", Value::Str("#333333".into())),
            ("fill", Value::Str("white".into())),
            ("size", Value::Num(1.5)),
            ("alpha", Value::Num(1.0)),
            ("shape", Value::Str("circle".into())),
            ("linetype", Value::Str("solid".into())),
            ("linewidth", Value::Num(0.5)),
        ]
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        &["x", "y", "color", "fill", "size", "alpha", "shape", "linetype", "linewidth"]
    }

    fn default_stat(&self) -> &'static str {
        "boxplot"
    }

    fn default_position(&self) -> &'static str {
        "dodge"
    }

    fn reparameterise(&self, data: DataTable, params: &Params) -> Result<DataTable> {
        if data.has("xmin") && data.has("xmax") {
            return Ok(data);
        }
        let xs = match data.numeric("x") {
            Some(x) => x.to_vec(),
            None => return Ok(data),
        };
        let fallback = params.get_f64("width").unwrap_or(0.75);
        let widths: Vec<f64> = data
            .numeric("width")
            .map(<[f64]>::to_vec)
            .unwrap_or_else(|| vec![fallback; xs.len()]);
        let xmin = xs.iter().zip(&widths).map(|(x, w)| x - w / 2.0).collect();
        let xmax = xs.iter().zip(&widths).map(|(x, w)| x + w / 2.0).collect();
        data.with_column("xmin", Column::Numeric(xmin))?
            .with_column("xmax", Column::Numeric(xmax))
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        _params: &Params,
    ) -> anyhow::Result<()> {
        let px = coord.transform(data, panel)?;
        let cols = ["x", "xmin", "xmax", "lower", "middle", "upper", "ymin", "ymax"].map(|c| px.numeric(c));
        let [Some(x), Some(x0), Some(x1), Some(lower), Some(middle), Some(upper), Some(ymin), Some(ymax)] = cols
        else {
            return Ok(());
        };
        for i in 0..px.nrow() {
            let stroke = stroke_at(&px, i);
            if let Some(stroke) = &stroke {
                backend.segment(coord.to_screen(x[i], upper[i]), coord.to_screen(x[i], ymax[i]), stroke)?;
                backend.segment(coord.to_screen(x[i], lower[i]), coord.to_screen(x[i], ymin[i]), stroke)?;
            }
            let body = screen_rect(coord, x0[i], x1[i], lower[i], upper[i]);
            backend.rect(body, fill_at(&px, i).as_ref(), stroke.as_ref())?;
            if let Some(stroke) = &stroke {
                let mut median = stroke.clone();
                median.width *= 2.0;
                backend.segment(coord.to_screen(x0[i], middle[i]), coord.to_screen(x1[i], middle[i]), &median)?;
            }
            if let Some(packed) = px.column("outliers") {
                let outliers: Vec<(f64, f64)> = unpack_outliers(&packed.key(i))
                    .into_iter()
                    .map(|v| coord.to_screen(x[i], coord.map_y(v, panel)))
                    .collect();
                if !outliers.is_empty() {
                    backend.points(&outliers, &marker_at(&px, i))?;
                }
            }
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
        let inner = area.inset(area.width() / 5.0);
        let stroke = stroke_at(key, 0);
        backend.rect(inner, fill_at(key, 0).as_ref(), stroke.as_ref())?;
        if let Some(stroke) = &stroke {
            let (cx, cy) = inner.center();
            backend.segment((inner.left, cy), (inner.right, cy), stroke)?;
            backend.segment((cx, area.top), (cx, inner.top), stroke)?;
            backend.segment((cx, inner.bottom), (cx, area.bottom), stroke)?;
        }
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::CoordCartesian;
    use crate::render::{DrawCommand, RecordingBackend};

    #[test]
    fn test_unpack_outliers() {
        assert_eq!(unpack_outliers("1.5,40"), vec![1.5, 40.0]);
        assert!(unpack_outliers("").is_empty());
        let tiny = [1e-8, -2.5e-12, 123456.789];
        assert_eq!(unpack_outliers(&pack_outliers(tiny)), tiny.to_vec());
    }

    #[test]
    fn test_box_with_outlier() {
        let data = DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![1.0])),
            ("lower", Column::Numeric(vec![2.0])),
            ("middle", Column::Numeric(vec![3.0])),
            ("upper", Column::Numeric(vec![4.0])),
            ("ymin", Column::Numeric(vec![1.0])),
            ("ymax", Column::Numeric(vec![5.0])),
            ("outliers", Column::Text(vec!["9".into()])),
            ("width", Column::Numeric(vec![0.5])),
            ("color", Column::Text(vec!["black".into()])),
            ("fill", Column::Text(vec!["white".into()])),
        ])
        .unwrap();
        let data = GeomBoxplot.reparameterise(data, &Params::new()).unwrap();
        assert_eq!(data.numeric("xmin").unwrap(), &[0.75]);

        let panel = PanelParams {
            x_range: (0.0, 2.0),
            y_range: (0.0, 10.0),
            area: Area::new(0.0, 0.0, 100.0, 100.0),
        };
        let mut backend = RecordingBackend::new();
        GeomBoxplot
            .draw_group(&data, &panel, &CoordCartesian, &mut backend, &Params::new())
            .unwrap();
        assert_eq!(backend.count(|c| matches!(c, DrawCommand::Rect { .. })), 1);
        assert_eq!(backend.count(|c| matches!(c, DrawCommand::Segment { .. })), 3);
        let outlier = backend.commands.iter().find_map(|c| match c {
            DrawCommand::Points { points, .. } => Some(points.clone()),
            _ => None,
        });
        assert_eq!(outlier, Some(vec![(50.0, 10.0)]));
    }
}
