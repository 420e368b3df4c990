use super::{num_at, stroke_at, Geom, LINE_SCALE};
use crate::coord::{Coord, PanelParams};
use crate::data::{DataTable, Value};
use crate::params::Params;
use crate::render::{Area, Backend, Stroke};

/// Short ticks along the panel edges marking individual x and y values.
/// `sides` picks the edges: any of `t`, `b`, `l`, `r`. A `size` value sets
/// the tick width and takes precedence over `linewidth`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeomRug;

fn rug_stroke(data: &DataTable, i: usize) -> Option<Stroke> {
    let mut stroke = stroke_at(data, i)?;
    if data.has("size") {
        stroke.width = num_at(data, "size", i, 0.5) * LINE_SCALE;
    }
    Some(stroke)
}

impl Geom for GeomRug {
    fn name(&self) -> &'static str {
        "rug"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &[]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("color", Value::Str("black".into())),
            ("linewidth", Value::Num(0.5)),
            ("linetype", Value::Str("solid".into())),
            ("alpha", Value::Num(1.0)),
        ]
    }

    fn default_params(&self) -> Params {
        Params::new().with("sides", "bl").with("length", 0.03)
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        &["x", "y", "color", "size", "linewidth", "linetype", "alpha"]
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        params: &Params,
    ) -> anyhow::Result<()> {
        let sides = params.get_str("sides").unwrap_or("bl");
        let length = params.get_f64("length").unwrap_or(0.03);
        let pixels = coord.transform(data, panel)?;

        // Axis ends in pixel units along each aesthetic's own axis
        let (x_lo, x_hi) = (coord.map_x(panel.x_range.0, panel), coord.map_x(panel.x_range.1, panel));
        let (y_lo, y_hi) = (coord.map_y(panel.y_range.0, panel), coord.map_y(panel.y_range.1, panel));

        for i in 0..pixels.nrow() {
            let stroke = match rug_stroke(&pixels, i) {
                Some(s) => s,
                None => continue,
            };
            if let Some(px) = pixels.numeric("x").map(|x| x[i]).filter(|v| v.is_finite()) {
                let tick = (y_hi - y_lo) * length;
                if sides.contains('b') {
                    backend.segment(coord.to_screen(px, y_lo), coord.to_screen(px, y_lo + tick), &stroke)?;
                }
                if sides.contains('t') {
                    backend.segment(coord.to_screen(px, y_hi), coord.to_screen(px, y_hi - tick), &stroke)?;
                }
            }
            if let Some(py) = pixels.numeric("y").map(|y| y[i]).filter(|v| v.is_finite()) {
                let tick = (x_hi - x_lo) * length;
                if sides.contains('l') {
                    backend.segment(coord.to_screen(x_lo, py), coord.to_screen(x_lo + tick, py), &stroke)?;
                }
                if sides.contains('r') {
                    backend.segment(coord.to_screen(x_hi, py), coord.to_screen(x_hi - tick, py), &stroke)?;
                }
            }
        }
        Ok(())
    }

    fn draw_legend(
        &self,
        key: &DataTable,
        area: Area,
        params: &Params,
        backend: &mut dyn Backend,
    ) -> anyhow::Result<Area> {
        let sides = params.get_str("sides").unwrap_or("bl");
        if let Some(stroke) = rug_stroke(key, 0) {
            let tick = area.height() / 3.0;
            let (cx, cy) = area.center();
            if sides.contains('b') {
                backend.segment((cx, area.bottom), (cx, area.bottom - tick), &stroke)?;
            }
            if sides.contains('t') {
                backend.segment((cx, area.top), (cx, area.top + tick), &stroke)?;
            }
            if sides.contains('l') {
                backend.segment((area.left, cy), (area.left + tick, cy), &stroke)?;
            }
            if sides.contains('r') {
                backend.segment((area.right, cy), (area.right - tick, cy), &stroke)?;
            }
        }
        Ok(area)
    }
}
