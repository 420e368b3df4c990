//! A layer: one geom with its stat, position, mapping and data.

use crate::aes::{canonical_aes, AesValue, AestheticSpec};
use crate::data::{DataTable, Value};
use crate::error::{PlotError, Result};
use crate::geom::{geom_from_name, Geom};
use crate::params::{ParamValue, Params};
use crate::position::{position_from_name, Position};
use crate::stat::{stat_from_name, Stat};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// Whether a layer contributes keys to the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowLegend {
    True,
    False,
    /// Only for aesthetics the layer maps from data.
    #[default]
    Auto,
}

impl From<bool> for ShowLegend {
    fn from(v: bool) -> Self {
        if v {
            ShowLegend::True
        } else {
            ShowLegend::False
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    geom: Arc<dyn Geom>,
    stat: Arc<dyn Stat>,
    position: Arc<dyn Position>,
    position_params: Params,
    explicit_position: bool,
    mapping: AestheticSpec,
    data: Option<DataTable>,
    show_legend: ShowLegend,
    fixed: IndexMap<String, Value>,
    params: Params,
    na_rm: bool,
    inherit_aes: bool,
}

impl Layer {
    /// A layer drawing `geom` with the geom's default stat and position.
    pub fn new(geom: &str) -> Result<Layer> {
        let geom = geom_from_name(geom)?;
        Ok(Layer {
            stat: stat_from_name(geom.default_stat())?,
            position: position_from_name(geom.default_position())?,
            geom,
            position_params: Params::new(),
            explicit_position: false,
            mapping: AestheticSpec::new(),
            data: None,
            show_legend: ShowLegend::Auto,
            fixed: IndexMap::new(),
            params: Params::new(),
            na_rm: false,
            inherit_aes: true,
        })
    }

    pub fn stat(mut self, name: &str) -> Result<Self> {
        self.stat = stat_from_name(name)?;
        Ok(self)
    }

    pub fn position(mut self, name: &str) -> Result<Self> {
        self.position = position_from_name(name)?;
        self.explicit_position = true;
        Ok(self)
    }

    pub fn position_param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.position_params.set(name, value);
        self
    }

    pub fn mapping(mut self, mapping: AestheticSpec) -> Self {
        self.mapping = mapping;
        self
    }

    /// Map one aesthetic to an expression.
    pub fn aes(mut self, aes: &str, source: &str) -> Result<Self> {
        self.mapping = self.mapping.map(aes, source)?;
        Ok(self)
    }

    pub fn data(mut self, data: DataTable) -> Self {
        self.data = Some(data);
        self
    }

    pub fn show_legend(mut self, show: ShowLegend) -> Self {
        self.show_legend = show;
        self
    }

    /// Set an aesthetic to a visual value for every row, bypassing scales.
    pub fn fixed(mut self, aes: &str, value: Value) -> Self {
        self.fixed.insert(canonical_aes(aes).to_string(), value);
        self
    }

    /// A geom or stat parameter.
    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn na_rm(mut self, na_rm: bool) -> Self {
        self.na_rm = na_rm;
        self
    }

    pub fn inherit_aes(mut self, inherit: bool) -> Self {
        self.inherit_aes = inherit;
        self
    }

    pub fn geom(&self) -> &dyn Geom {
        self.geom.as_ref()
    }

    pub fn stat_ref(&self) -> &dyn Stat {
        self.stat.as_ref()
    }

    pub fn layer_data(&self) -> Option<&DataTable> {
        self.data.as_ref()
    }

    pub fn own_mapping(&self) -> &AestheticSpec {
        &self.mapping
    }

    pub fn legend(&self) -> ShowLegend {
        self.show_legend
    }

    pub fn fixed_values(&self) -> &IndexMap<String, Value> {
        &self.fixed
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Geom parameters: layer params over the geom defaults.
    pub fn geom_params(&self) -> Params {
        self.params.merged_over(&self.geom.default_params())
    }

    pub fn removes_na_silently(&self) -> bool {
        self.na_rm || self.params.get_bool("na_rm").unwrap_or(false)
    }

    /// The layer's mapping merged with the plot's, unless inheritance is off.
    pub fn effective_mapping(&self, global: &AestheticSpec) -> AestheticSpec {
        if self.inherit_aes {
            AestheticSpec::merge(global, &self.mapping)
        } else {
            self.mapping.clone()
        }
    }

    /// Whether `aes` is mapped from data, not from a constant.
    pub fn maps_from_data(&self, global: &AestheticSpec, aes: &str) -> bool {
        matches!(self.effective_mapping(global).get(aes), Some(AesValue::Expr(_)))
    }

    /// Position and its parameters. Geom parameters such as text nudges
    /// replace the default position but conflict with an explicit one.
    pub fn resolved_position(&self) -> Result<(Arc<dyn Position>, Params)> {
        match self.geom.position_override(&self.params) {
            Some(_) if self.explicit_position && self.position.name() != "identity" => {
                Err(PlotError::InvalidData(format!(
                    "geom_{} takes either a position or nudge parameters, not both",
                    self.geom.name()
                )))
            }
            Some((name, params)) => Ok((position_from_name(name)?, params.merged_over(&self.position_params))),
            None => Ok((self.position.clone(), self.position_params.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_geom() {
        let layer = Layer::new("histogram").unwrap();
        assert_eq!(layer.stat_ref().name(), "bin");
        let (position, _) = layer.resolved_position().unwrap();
        assert_eq!(position.name(), "stack");
    }

    #[test]
    fn test_unknown_components() {
        assert!(matches!(
            Layer::new("violin"),
            Err(PlotError::UnknownComponent { kind: "geom", .. })
        ));
        let layer = Layer::new("point").unwrap();
        assert!(layer.clone().stat("wiggle").is_err());
        assert!(matches!(
            layer.position("shuffle"),
            Err(PlotError::UnknownComponent { kind: "position", .. })
        ));
    }

    #[test]
    fn test_text_nudge_becomes_position() {
        let layer = Layer::new("text").unwrap().param("nudge_x", 0.5);
        let (position, params) = layer.resolved_position().unwrap();
        assert_eq!(position.name(), "nudge");
        assert_eq!(params.get_f64("x"), Some(0.5));

        let conflicting = Layer::new("text")
            .unwrap()
            .param("nudge_x", 0.5)
            .position("jitter")
            .unwrap();
        assert!(conflicting.resolved_position().is_err());
    }

    #[test]
    fn test_inherit_aes() {
        let global = AestheticSpec::new().map("x", "a").unwrap();
        let layer = Layer::new("point").unwrap().aes("y", "b").unwrap();
        assert_eq!(layer.effective_mapping(&global).len(), 2);
        let layer = layer.inherit_aes(false);
        assert_eq!(layer.effective_mapping(&global).len(), 1);
        assert!(layer.maps_from_data(&global, "y"));
        assert!(!layer.maps_from_data(&global, "x"));
    }
}
