use super::{num_at, str_at, Geom};
use crate::coord::{Coord, PanelParams};
use crate::data::{Column, DataTable, Value};
use crate::error::{PlotError, Result};
use crate::params::{ParamValue, Params};
use crate::render::{Area, Backend, TextStyle};

/// Text labels at (x, y).
///
/// `hjust`/`vjust` are parameters, not aesthetics. `nudge_x`/`nudge_y`
/// replace the layer position with a nudge. `format_string` rewrites each
/// label, `{}` standing for the original value.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeomText;

fn justification(value: Option<&ParamValue>, default: f64) -> f64 {
    match value {
        Some(ParamValue::Num(n)) => *n,
        Some(ParamValue::Str(s)) => match s.as_str() {
            "left" | "bottom" => 0.0,
            "right" | "top" => 1.0,
            _ => 0.5,
        },
        _ => default,
    }
}

fn text_style(data: &DataTable, i: usize, params: &Params) -> TextStyle {
    TextStyle {
        color: str_at(data, "color", i, "black"),
        alpha: num_at(data, "alpha", i, 1.0),
        size: num_at(data, "size", i, 11.0),
        angle: num_at(data, "angle", i, 0.0),
        hjust: justification(params.get("hjust"), 0.5),
        vjust: justification(params.get("vjust"), 0.5),
    }
}

impl Geom for GeomText {
    fn name(&self) -> &'static str {
        "text"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["label", "x", "y"]
    }

    fn default_aes(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("alpha", Value::Num(1.0)),
            ("angle", Value::Num(0.0)),
            ("color", Value::Str("black".into())),
            ("size", Value::Num(11.0)),
        ]
    }

    fn default_params(&self) -> Params {
        Params::new()
            .with("hjust", "center")
            .with("vjust", "center")
            .with("nudge_x", 0.0)
            .with("nudge_y", 0.0)
    }

    fn supported_aes(&self) -> &'static [&'static str] {
        &["x", "y", "label", "color", "size", "alpha", "angle"]
    }

    fn position_override(&self, params: &Params) -> Option<(&'static str, Params)> {
        if !params.contains("nudge_x") && !params.contains("nudge_y") {
            return None;
        }
        Some((
            "nudge",
            Params::new()
                .with("x", params.get_f64("nudge_x").unwrap_or(0.0))
                .with("y", params.get_f64("nudge_y").unwrap_or(0.0)),
        ))
    }

    fn setup_data(&self, data: DataTable, params: &Params) -> Result<DataTable> {
        let format = match params.get_str("format_string") {
            Some(f) => f.to_string(),
            None => return Ok(data),
        };
        if !format.contains("{}") {
            return Err(PlotError::InvalidData(format!(
                "geom_text format_string '{}' has no '{{}}' placeholder",
                format
            )));
        }
        let labels: Vec<String> = match data.column("label") {
            Some(col) => (0..col.len()).map(|i| format.replace("{}", &col.key(i))).collect(),
            None => return Ok(data),
        };
        data.with_column("label", Column::Text(labels))
    }

    fn draw_group(
        &self,
        data: &DataTable,
        panel: &PanelParams,
        coord: &dyn Coord,
        backend: &mut dyn Backend,
        params: &Params,
    ) -> anyhow::Result<()> {
        let pixels = coord.transform(data, panel)?;
        let (xs, ys, labels) = match (pixels.numeric("x"), pixels.numeric("y"), pixels.column("label")) {
            (Some(x), Some(y), Some(l)) => (x, y, l),
            _ => return Ok(()),
        };
        for i in 0..pixels.nrow() {
            if !xs[i].is_finite() || !ys[i].is_finite() {
                continue;
            }
            backend.text(coord.to_screen(xs[i], ys[i]), &labels.key(i), &text_style(&pixels, i, params))?;
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
        let style = text_style(key, 0, &Params::new()).aligned(0.5, 0.5);
        backend.text(area.center(), "a", &style)?;
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_string() {
        let data = DataTable::from_columns(vec![("label", Column::Numeric(vec![1.5, 2.0]))]).unwrap();
        let out = GeomText
            .setup_data(data, &Params::new().with("format_string", "{} kg"))
            .unwrap();
        assert_eq!(out.column("label").unwrap().key(0), "1.5 kg");
        assert_eq!(out.column("label").unwrap().key(1), "2 kg");
    }

    #[test]
    fn test_nudge_overrides_position() {
        assert!(GeomText.position_override(&Params::new()).is_none());
        let (name, params) = GeomText
            .position_override(&Params::new().with("nudge_y", 0.25))
            .unwrap();
        assert_eq!(name, "nudge");
        assert_eq!(params.get_f64("y"), Some(0.25));
        assert_eq!(params.get_f64("x"), Some(0.0));
    }

    #[test]
    fn test_justification_names() {
        assert_eq!(justification(Some(&ParamValue::from("left")), 0.5), 0.0);
        assert_eq!(justification(Some(&ParamValue::from(0.2)), 0.5), 0.2);
        assert_eq!(justification(None, 0.5), 0.5);
    }
}
