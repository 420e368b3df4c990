// Pipeline parser for the plot DSL
//
// A pipeline is a `|`-separated list of calls, each `name(key: value, ...)`.
// Argument values are literals, `[...]` lists or aesthetic expressions.

use super::ast::{Arg, ArgValue, CoordSpec, FacetKind, FacetSpec, LayerSpec, PlotSpec, ScaleSpec};
use super::lexer::{identifier, ws};
use crate::aes::expr::{expr, Expr};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{eof, map, opt},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, terminated},
    IResult,
};

/// Geoms the DSL accepts, with or without a `geom_` prefix
pub const GEOMS: &[&str] = &[
    "point", "line", "path", "bar", "col", "histogram", "text", "rug", "area", "smooth", "boxplot",
];

/// Scale kinds accepted in `scale_<aesthetic>_<kind>`
pub const SCALE_KINDS: &[&str] = &[
    "continuous", "discrete", "identity", "log10", "sqrt", "reverse", "manual", "gradient",
];

#[derive(Debug)]
enum PipelineComponent {
    Aes(Vec<Arg>),
    Layer(LayerSpec),
    Facet(FacetSpec),
    Scale(ScaleSpec),
    Coord(CoordSpec),
    Labels(Vec<Arg>),
}

/// Parse an argument value: a list, a literal or an expression
pub fn arg_value(input: &str) -> IResult<&str, ArgValue> {
    alt((list_value, scalar_value))(input)
}

fn list_value(input: &str) -> IResult<&str, ArgValue> {
    map(
        delimited(
            ws(char('[')),
            separated_list0(ws(char(',')), arg_value),
            ws(char(']')),
        ),
        ArgValue::List,
    )(input)
}

fn scalar_value(input: &str) -> IResult<&str, ArgValue> {
    let (rest, ast) = ws(expr)(input)?;
    let source = input[..input.len() - rest.len()].trim();
    let value = match ast {
        Expr::Number(n) => ArgValue::Num(n),
        Expr::Neg(inner) => match *inner {
            Expr::Number(n) => ArgValue::Num(-n),
            _ => ArgValue::Expr(source.to_string()),
        },
        Expr::Str(s) => ArgValue::Str(s),
        Expr::Name(name) if name == "true" => ArgValue::Bool(true),
        Expr::Name(name) if name == "false" => ArgValue::Bool(false),
        _ => ArgValue::Expr(source.to_string()),
    };
    Ok((rest, value))
}

/// Parse one argument, `key: value` or a positional `value`
fn argument(input: &str) -> IResult<&str, Arg> {
    let (input, key) = opt(terminated(ws(identifier), char(':')))(input)?;
    let (input, value) = arg_value(input)?;
    Ok((input, Arg { key, value }))
}

/// Parse `name(args...)`
fn call(input: &str) -> IResult<&str, (String, Vec<Arg>)> {
    let (input, name) = ws(identifier)(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), argument),
        ws(char(')')),
    )(input)?;
    Ok((input, (name, args)))
}

fn classify(name: &str, args: Vec<Arg>) -> Option<PipelineComponent> {
    let geom = name.strip_prefix("geom_").unwrap_or(name);
    if GEOMS.contains(&geom) {
        return Some(PipelineComponent::Layer(LayerSpec {
            geom: geom.to_string(),
            args,
        }));
    }
    if let Some(rest) = name.strip_prefix("scale_") {
        let (aesthetic, kind) = rest.rsplit_once('_')?;
        if aesthetic.is_empty() || !SCALE_KINDS.contains(&kind) {
            return None;
        }
        return Some(PipelineComponent::Scale(ScaleSpec {
            aesthetic: aesthetic.to_string(),
            kind: kind.to_string(),
            args,
        }));
    }
    match name {
        "aes" => Some(PipelineComponent::Aes(args)),
        "facet_wrap" => Some(PipelineComponent::Facet(FacetSpec {
            kind: FacetKind::Wrap,
            args,
        })),
        "facet_grid" => Some(PipelineComponent::Facet(FacetSpec {
            kind: FacetKind::Grid,
            args,
        })),
        "coord_flip" | "coord_cartesian" => Some(PipelineComponent::Coord(CoordSpec {
            name: name.trim_start_matches("coord_").to_string(),
            args,
        })),
        "labs" => Some(PipelineComponent::Labels(args)),
        _ => None,
    }
}

fn parse_pipeline_component(input: &str) -> IResult<&str, PipelineComponent> {
    let (rest, (name, args)) = call(input)?;
    match classify(&name, args) {
        Some(component) => Ok((rest, component)),
        // Unknown names are fatal so the error points at them
        None => Err(nom::Err::Failure(Error::new(input.trim_start(), ErrorKind::Tag))),
    }
}

/// Parse a complete plot specification
/// Format: component | component | ...
pub fn parse_plot_spec(input: &str) -> IResult<&str, PlotSpec> {
    // Optional: consume leading "df"
    let (input, _) = opt(ws(terminated(tag("df"), ws(char('|')))))(input)?;

    // If input starts with "|", consume it
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, components) = separated_list0(ws(tag("|")), parse_pipeline_component)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    let mut spec = PlotSpec::default();
    for component in components {
        match component {
            PipelineComponent::Aes(args) => spec.aesthetics.extend(args),
            PipelineComponent::Layer(layer) => spec.layers.push(layer),
            PipelineComponent::Facet(facet) => spec.facet = Some(facet),
            PipelineComponent::Scale(scale) => spec.scales.push(scale),
            PipelineComponent::Coord(coord) => spec.coord = Some(coord),
            PipelineComponent::Labels(args) => spec.labels.extend(args),
        }
    }

    // Validation: Must have at least one layer
    if spec.layers.is_empty() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }

    Ok((input, spec))
}
