// Abstract Syntax Tree for the plot pipeline DSL

/// Complete plot specification
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotSpec {
    /// Global mapping from `aes(...)`, later calls override earlier keys
    pub aesthetics: Vec<Arg>,
    pub layers: Vec<LayerSpec>,
    pub facet: Option<FacetSpec>,
    pub scales: Vec<ScaleSpec>,
    pub coord: Option<CoordSpec>,
    /// Entries of every `labs(...)` call, in order
    pub labels: Vec<Arg>,
}

/// One `name(key: value, ...)` argument. Positional arguments have no key.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub key: Option<String>,
    pub value: ArgValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Anything beyond a plain literal, kept as expression source
    Expr(String),
    Str(String),
    Num(f64),
    Bool(bool),
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Column or expression text for arguments naming data.
    pub fn as_source(&self) -> Option<String> {
        match self {
            ArgValue::Expr(s) | ArgValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Flatten a list (or a single value) into its items.
    pub fn items(&self) -> Vec<&ArgValue> {
        match self {
            ArgValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

/// Geometry layer: `point(...)`, `geom_bar(...)`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub geom: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FacetKind {
    Wrap,
    Grid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacetSpec {
    pub kind: FacetKind,
    pub args: Vec<Arg>,
}

/// `scale_<aesthetic>_<kind>(...)`
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSpec {
    pub aesthetic: String,
    pub kind: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordSpec {
    pub name: String,
    pub args: Vec<Arg>,
}
