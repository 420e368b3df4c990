// Runtime executor: DSL plot specification → Plot → rendered bytes

use crate::aes::{canonical_aes, is_known_aes, is_position_aes, AestheticSpec, Variables};
use crate::data::{DataTable, Value};
use crate::facet::{Facet, FacetScales};
use crate::layer::{Layer, ShowLegend};
use crate::palette::{GRADIENT_HIGH, GRADIENT_LOW};
use crate::params::ParamValue;
use crate::parser::ast::{Arg, ArgValue, CoordSpec, FacetKind, FacetSpec, LayerSpec, PlotSpec, ScaleSpec};
use crate::plot::Plot;
use crate::render::PlottersTarget;
use crate::scale::{Scale, Transform};
use crate::{OutputFormat, RenderOptions};
use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

/// Render a plot specification with `data` to the bytes of `options.format`.
pub fn render_plot(
    spec: &PlotSpec,
    data: DataTable,
    options: &RenderOptions,
    variables: &Variables,
) -> Result<Vec<u8>> {
    let plot = build_plot(spec, data, variables)?;
    let built = plot.build().context("Failed to build plot")?;
    info!(
        records = built.records.len(),
        panels = built.panels.len(),
        warnings = built.warnings.len(),
        "plot built"
    );

    match options.format {
        OutputFormat::Png => PlottersTarget::Png
            .render(&built, &plot, options.width, options.height)
            .context("Failed to render PNG"),
        OutputFormat::Svg => PlottersTarget::Svg
            .render(&built, &plot, options.width, options.height)
            .context("Failed to render SVG"),
        OutputFormat::Json => serde_json::to_vec_pretty(&built).context("Failed to serialise build result"),
    }
}

/// Turn a parsed specification into a [`Plot`].
pub fn build_plot(spec: &PlotSpec, data: DataTable, variables: &Variables) -> Result<Plot> {
    if spec.layers.is_empty() {
        bail!("Plot requires at least one geometry layer (point, line, bar, ...)");
    }

    let mut plot = Plot::new()
        .data(data)
        .aes(global_mapping(&spec.aesthetics)?);
    for (name, value) in variables {
        plot = plot.variable(name, value.clone());
    }
    for (i, layer) in spec.layers.iter().enumerate() {
        let layer = build_layer(layer).with_context(|| format!("Invalid layer {} ({})", i + 1, layer.geom))?;
        plot = plot.layer(layer);
    }
    for scale in &spec.scales {
        let built = build_scale(scale)
            .with_context(|| format!("Invalid scale_{}_{}", scale.aesthetic, scale.kind))?;
        plot = plot.scale(built);
    }
    if let Some(facet) = &spec.facet {
        plot = plot.facet(build_facet(facet)?);
    }
    if let Some(CoordSpec { name, .. }) = &spec.coord {
        let coord = crate::coord::coord_from_name(name).ok_or_else(|| anyhow!("Unknown coord '{}'", name))?;
        plot = plot.coord(coord);
    }
    for arg in &spec.labels {
        let key = arg.key.as_deref().ok_or_else(|| anyhow!("labs() takes named arguments"))?;
        let text = literal_text(&arg.value).ok_or_else(|| anyhow!("Label '{}' must be a string", key))?;
        plot = match key {
            "title" => plot.title(&text),
            aes => plot.label(aes, &text),
        };
    }
    debug!(layers = spec.layers.len(), scales = spec.scales.len(), "plot specification converted");
    Ok(plot)
}

fn literal_text(value: &ArgValue) -> Option<String> {
    match value {
        ArgValue::Str(s) | ArgValue::Expr(s) => Some(s.clone()),
        ArgValue::Num(n) => Some(crate::data::format_number(*n)),
        _ => None,
    }
}

fn literal_value(value: &ArgValue) -> Option<Value> {
    match value {
        ArgValue::Num(n) => Some(Value::Num(*n)),
        ArgValue::Str(s) => Some(Value::Str(s.clone())),
        _ => None,
    }
}

fn param_value(value: &ArgValue) -> ParamValue {
    match value {
        ArgValue::Num(n) => ParamValue::Num(*n),
        ArgValue::Bool(b) => ParamValue::Bool(*b),
        ArgValue::Str(s) | ArgValue::Expr(s) => ParamValue::Str(s.clone()),
        ArgValue::List(items) => ParamValue::List(items.iter().map(param_value).collect()),
    }
}

fn numbers(value: &ArgValue) -> Result<Vec<f64>> {
    value
        .items()
        .into_iter()
        .map(|v| match v {
            ArgValue::Num(n) => Ok(*n),
            other => Err(anyhow!("Expected a number, got {:?}", other)),
        })
        .collect()
}

fn strings(value: &ArgValue) -> Result<Vec<String>> {
    value
        .items()
        .into_iter()
        .map(|v| literal_text(v).ok_or_else(|| anyhow!("Expected a string, got {:?}", v)))
        .collect()
}

fn pair(value: &ArgValue) -> Result<(f64, f64)> {
    match numbers(value)?.as_slice() {
        [lo, hi] => Ok((*lo, *hi)),
        other => Err(anyhow!("Expected two numbers, got {}", other.len())),
    }
}

fn flag(key: &str, value: &ArgValue) -> Result<bool> {
    match value {
        ArgValue::Bool(b) => Ok(*b),
        other => Err(anyhow!("'{}' must be true or false, got {:?}", key, other)),
    }
}

/// `aes(...)`: positional arguments are x then y.
fn global_mapping(args: &[Arg]) -> Result<AestheticSpec> {
    let mut mapping = AestheticSpec::new();
    let mut positional = ["x", "y"].into_iter();
    for arg in args {
        let aes = match &arg.key {
            Some(key) => canonical_aes(key).to_string(),
            None => positional
                .next()
                .ok_or_else(|| anyhow!("aes() takes at most two positional arguments"))?
                .to_string(),
        };
        mapping = match &arg.value {
            ArgValue::Expr(source) => mapping.map(&aes, source)?,
            other => {
                let value = literal_value(other)
                    .ok_or_else(|| anyhow!("Cannot map '{}' to {:?}", aes, other))?;
                mapping.constant(&aes, value)
            }
        };
    }
    Ok(mapping)
}

fn build_layer(spec: &LayerSpec) -> Result<Layer> {
    let mut layer = Layer::new(&spec.geom)?;
    let supported = layer.geom().supported_aes();
    for arg in &spec.args {
        let key = arg
            .key
            .as_deref()
            .ok_or_else(|| anyhow!("geom arguments must be named"))?;
        let aes = canonical_aes(key);
        layer = match key {
            "stat" => layer.stat(&literal_text(&arg.value).unwrap_or_default())?,
            "position" => layer.position(&literal_text(&arg.value).unwrap_or_default())?,
            "show_legend" | "show.legend" => layer.show_legend(ShowLegend::from(flag(key, &arg.value)?)),
            "na_rm" | "na.rm" => layer.na_rm(flag(key, &arg.value)?),
            "inherit_aes" | "inherit.aes" => layer.inherit_aes(flag(key, &arg.value)?),
            "seed" => layer.position_param("seed", param_value(&arg.value)),
            _ if key.starts_with("position_") => {
                let name = key.trim_start_matches("position_");
                layer.position_param(name, param_value(&arg.value))
            }
            _ if matches!(aes, "group" | "weight") || supported.contains(&aes) => match &arg.value {
                ArgValue::Expr(source) => layer.aes(aes, source)?,
                other => {
                    let value = literal_value(other)
                        .ok_or_else(|| anyhow!("Invalid value for aesthetic '{}': {:?}", aes, other))?;
                    if is_position_aes(aes) {
                        let mapping = layer.own_mapping().clone().constant(aes, value);
                        layer.mapping(mapping)
                    } else {
                        layer.fixed(aes, value)
                    }
                }
            },
            _ if is_known_aes(aes) => {
                bail!("geom_{} does not use the '{}' aesthetic", layer.geom().name(), aes)
            }
            _ => layer.param(key, param_value(&arg.value)),
        };
    }
    Ok(layer)
}

fn build_scale(spec: &ScaleSpec) -> Result<Scale> {
    let aes = spec.aesthetic.as_str();
    let mut scale = match spec.kind.as_str() {
        "discrete" | "manual" => Scale::discrete(aes),
        "identity" => Scale::identity(aes),
        "gradient" => Scale::continuous(aes).with_gradient(GRADIENT_LOW, GRADIENT_HIGH),
        kind => {
            let transform = Transform::from_name(kind).ok_or_else(|| anyhow!("Unknown scale kind '{}'", kind))?;
            Scale::continuous(aes).with_transform(transform)
        }
    };
    let (mut low, mut high) = (None, None);
    for arg in &spec.args {
        let key = arg
            .key
            .as_deref()
            .ok_or_else(|| anyhow!("scale arguments must be named"))?;
        scale = match key {
            "name" => scale.with_name(&literal_text(&arg.value).unwrap_or_default()),
            "limits" if scale.is_discrete() => scale.with_levels(strings(&arg.value)?),
            "limits" => {
                let (lo, hi) = pair(&arg.value)?;
                scale.with_limits(lo, hi)
            }
            "values" | "palette" => scale.with_values(strings(&arg.value)?),
            "range" => {
                let (lo, hi) = pair(&arg.value)?;
                scale.with_range(lo, hi)
            }
            "breaks" => scale.with_breaks(numbers(&arg.value)?),
            "guide" => {
                if flag(key, &arg.value)? {
                    scale
                } else {
                    scale.without_guide()
                }
            }
            "low" => {
                low = literal_text(&arg.value);
                scale
            }
            "high" => {
                high = literal_text(&arg.value);
                scale
            }
            other => bail!("Unknown scale argument '{}'", other),
        };
    }
    if low.is_some() || high.is_some() {
        let low = low.unwrap_or_else(|| GRADIENT_LOW.to_string());
        let high = high.unwrap_or_else(|| GRADIENT_HIGH.to_string());
        scale = scale.with_gradient(&low, &high);
    }
    Ok(scale)
}

fn facet_vars(value: &ArgValue) -> Result<Vec<String>> {
    value
        .items()
        .into_iter()
        .map(|v| v.as_source().ok_or_else(|| anyhow!("Facet variables must be column names")))
        .collect()
}

fn build_facet(spec: &FacetSpec) -> Result<Facet> {
    let mut vars: Vec<Vec<String>> = Vec::new();
    let (mut ncol, mut nrow) = (None, None);
    let (mut rows, mut cols) = (Vec::new(), Vec::new());
    let mut scales = FacetScales::Fixed;
    for arg in &spec.args {
        match arg.key.as_deref() {
            None => vars.push(facet_vars(&arg.value)?),
            Some("by" | "facets") => vars.insert(0, facet_vars(&arg.value)?),
            Some("rows") => rows = facet_vars(&arg.value)?,
            Some("cols") => cols = facet_vars(&arg.value)?,
            Some("ncol") => ncol = numbers(&arg.value)?.first().map(|n| *n as usize),
            Some("nrow") => nrow = numbers(&arg.value)?.first().map(|n| *n as usize),
            Some("scales") => {
                let name = literal_text(&arg.value).unwrap_or_default();
                scales = FacetScales::from_name(&name).ok_or_else(|| anyhow!("Unknown facet scales '{}'", name))?;
            }
            Some(other) => bail!("Unknown facet argument '{}'", other),
        }
    }
    match spec.kind {
        FacetKind::Wrap => {
            let vars = vars.into_iter().next().ok_or_else(|| anyhow!("facet_wrap() needs variables"))?;
            Ok(Facet::Wrap {
                vars,
                ncol,
                nrow,
                scales,
            })
        }
        FacetKind::Grid => {
            let mut positional = vars.into_iter();
            if rows.is_empty() {
                rows = positional.next().unwrap_or_default();
            }
            if cols.is_empty() {
                cols = positional.next().unwrap_or_default();
            }
            if rows.is_empty() && cols.is_empty() {
                bail!("facet_grid() needs rows or cols");
            }
            Ok(Facet::Grid { rows, cols, scales })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::parser::parse_plot_spec;

    fn table() -> DataTable {
        DataTable::from_columns(vec![
            ("a", Column::Numeric(vec![1.0, 2.0, 3.0, 4.0])),
            ("b", Column::Numeric(vec![2.0, 4.0, 6.0, 8.0])),
            ("g", Column::Text(vec!["u".into(), "u".into(), "v".into(), "v".into()])),
        ])
        .unwrap()
    }

    fn spec(dsl: &str) -> PlotSpec {
        parse_plot_spec(dsl).unwrap().1
    }

    #[test]
    fn test_build_point_plot() {
        let plot = build_plot(&spec("aes(a, b) | point(color: g, size: 3)"), table(), &Variables::new()).unwrap();
        let built = plot.build().unwrap();
        assert_eq!(built.records.len(), 2);
        assert_eq!(built.legend.blocks.len(), 1);
        assert_eq!(built.labels.x, "a");
    }

    #[test]
    fn test_fixed_values_bypass_legend() {
        let plot = build_plot(&spec(r#"aes(x: a, y: b) | point(color: "red")"#), table(), &Variables::new()).unwrap();
        let built = plot.build().unwrap();
        assert!(built.legend.is_empty());
        assert_eq!(
            built.records[0].data.column("color").unwrap().get(0),
            Value::Str("red".into())
        );
    }

    #[test]
    fn test_facet_scale_and_labels() {
        let dsl = r#"aes(x: a, y: b) | line() | facet_wrap(by: g, scales: "free_y") | scale_y_log10() | labs(title: "T", y: "B")"#;
        let plot = build_plot(&spec(dsl), table(), &Variables::new()).unwrap();
        let built = plot.build().unwrap();
        assert_eq!(built.panels.len(), 2);
        assert_eq!(built.labels.title.as_deref(), Some("T"));
        assert_eq!(built.labels.y, "B");
    }

    #[test]
    fn test_variables_reach_expressions() {
        let mut vars = Variables::new();
        vars.insert("k".into(), Value::Num(10.0));
        let plot = build_plot(&spec("aes(x: a, y: b * k) | point()"), table(), &vars).unwrap();
        let built = plot.build().unwrap();
        assert!(built.panels[0].y_range.1 > 70.0);
    }

    #[test]
    fn test_unknown_arguments_are_errors() {
        assert!(build_plot(&spec("point(stat: wobble)"), table(), &Variables::new()).is_err());
        assert!(build_plot(&spec("point() | scale_x_continuous(colour: 1)"), table(), &Variables::new()).is_err());
        assert!(build_plot(&spec("point() | facet_grid()"), table(), &Variables::new()).is_err());
        // size is not something a line draws
        assert!(build_plot(&spec("aes(a, b) | line(size: 2)"), table(), &Variables::new()).is_err());
        assert!(build_plot(&spec("aes(a, b) | rug(size: 2, sides: \"tr\")"), table(), &Variables::new()).is_ok());
    }

    #[test]
    fn test_json_output() {
        let options = RenderOptions {
            format: OutputFormat::Json,
            ..RenderOptions::default()
        };
        let bytes = render_plot(&spec("aes(x: a, y: b) | point()"), table(), &options, &Variables::new()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["records"].as_array().unwrap().len(), 1);
        assert_eq!(value["layout"]["nrow"], 1);
    }
}
