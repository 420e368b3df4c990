//! The plot specification and its build pipeline.
//!
//! [`Plot::build`] runs, in order: facet layout, aesthetic resolution per
//! layer, discrete position encoding, stat and position per layer, scale
//! training over all layers, mapping, panel ranges, legend assembly and
//! finally draw records sorted by panel, layer and group.

use crate::aes::{aes_family, is_position_aes, AestheticSpec, Variables, X_AESTHETICS, Y_AESTHETICS};
use crate::coord::{Coord, CoordCartesian};
use crate::data::{Column, DataTable, Value, GROUP, PANEL};
use crate::error::{PlotError, Result, Warning};
use crate::facet::{Facet, Layout, PanelLayout};
use crate::geom::{pack_outliers, unpack_outliers};
use crate::ir::{BuiltPlot, DrawRecord, GridSize, Panel, PlotLabels};
use crate::layer::Layer;
use crate::legend::assemble_legend;
use crate::position::run_position;
use crate::resolve::{add_group_column, complete_rows, evaluate_mapping};
use crate::scale::{Scale, ScaleKind, ScaleSet, SCALED_AESTHETICS};
use crate::stat::run_stat;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Plot {
    data: Option<DataTable>,
    mapping: AestheticSpec,
    layers: Vec<Layer>,
    scales: Vec<Scale>,
    facet: Facet,
    coord: Arc<dyn Coord>,
    title: Option<String>,
    labels: IndexMap<String, String>,
    variables: Variables,
}

impl Default for Plot {
    fn default() -> Self {
        Plot {
            data: None,
            mapping: AestheticSpec::new(),
            layers: Vec::new(),
            scales: Vec::new(),
            facet: Facet::Null,
            coord: Arc::new(CoordCartesian),
            title: None,
            labels: IndexMap::new(),
            variables: Variables::new(),
        }
    }
}

impl Plot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default data for layers without their own.
    pub fn data(mut self, data: DataTable) -> Self {
        self.data = Some(data);
        self
    }

    /// Global mapping inherited by layers.
    pub fn aes(mut self, mapping: AestheticSpec) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Declare a scale. A second scale for the same aesthetic fails the build.
    pub fn scale(mut self, scale: Scale) -> Self {
        self.scales.push(scale);
        self
    }

    pub fn facet(mut self, facet: Facet) -> Self {
        self.facet = facet;
        self
    }

    pub fn coord(mut self, coord: Arc<dyn Coord>) -> Self {
        self.coord = coord;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Axis or guide title for an aesthetic.
    pub fn label(mut self, aes: &str, text: &str) -> Self {
        self.labels
            .insert(crate::aes::canonical_aes(aes).to_string(), text.to_string());
        self
    }

    /// Named value usable in mapping expressions.
    pub fn variable(mut self, name: &str, value: Value) -> Self {
        self.variables.insert(name.to_string(), value);
        self
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn coord_ref(&self) -> &dyn Coord {
        self.coord.as_ref()
    }

    pub fn mapping(&self) -> &AestheticSpec {
        &self.mapping
    }

    /// Run the whole pipeline on copies of the data.
    pub fn build(&self) -> Result<BuiltPlot> {
        let empty = DataTable::new();
        let datasets: Vec<&DataTable> = self
            .layers
            .iter()
            .map(|l| l.layer_data().or(self.data.as_ref()).unwrap_or(&empty))
            .collect();
        let layout = self.facet.layout(&datasets)?;
        let mut scales = ScaleSet::from_declared(&self.scales)?;
        let mut warnings = Vec::new();

        let mut resolved = Vec::with_capacity(self.layers.len());
        for (i, (layer, raw)) in self.layers.iter().zip(&datasets).enumerate() {
            resolved.push(self.resolve_layer(i, layer, raw, &layout, &mut warnings)?);
        }

        for data in &resolved {
            train_discrete_positions(&mut scales, data)?;
        }
        let mut computed = Vec::with_capacity(resolved.len());
        for (layer, data) in self.layers.iter().zip(resolved) {
            let encoded = encode_discrete_positions(&scales, data)?;
            computed.push(compute_layer(layer, &layer.effective_mapping(&self.mapping), encoded)?);
        }

        for data in &computed {
            train_scales(&mut scales, data)?;
        }
        for scale in scales.iter_mut() {
            if let Some(w) = scale.finish_training() {
                warn!("{}", w);
                warnings.push(w);
            }
        }

        let mut mapped = Vec::with_capacity(computed.len());
        for (i, (layer, data)) in self.layers.iter().zip(computed).enumerate() {
            let (data, removed) = map_layer(&mut scales, layer, data)?;
            if removed > 0 && !layer.removes_na_silently() {
                let w = Warning::RemovedRows {
                    layer: i,
                    geom: layer.geom().name().to_string(),
                    count: removed,
                };
                warn!("{}", w);
                warnings.push(w);
            }
            mapped.push(data);
        }

        let panels = self.panels(&layout, &mapped, &scales);
        let legend = assemble_legend(&self.layers, &self.mapping, &scales, &self.labels)?;
        let records = draw_records(&layout, &mapped);
        debug!(
            layers = self.layers.len(),
            panels = panels.len(),
            records = records.len(),
            warnings = warnings.len(),
            "plot built"
        );

        Ok(BuiltPlot {
            records,
            panels,
            layout: GridSize {
                nrow: layout.nrow,
                ncol: layout.ncol,
            },
            legend,
            labels: PlotLabels {
                title: self.title.clone(),
                x: self.axis_title("x", &scales),
                y: self.axis_title("y", &scales),
            },
            scales,
            warnings,
        })
    }

    /// Evaluate the mapping, drop incomplete rows, assign panels and groups.
    fn resolve_layer(
        &self,
        index: usize,
        layer: &Layer,
        raw: &DataTable,
        layout: &Layout,
        warnings: &mut Vec<Warning>,
    ) -> Result<DataTable> {
        let spec = layer.effective_mapping(&self.mapping);
        let evaluated = evaluate_mapping(&spec, raw, &self.variables)?;
        let keep = complete_rows(&evaluated);
        let removed = keep.iter().filter(|k| !**k).count();
        if removed > 0 && !layer.removes_na_silently() {
            let w = Warning::RemovedRows {
                layer: index,
                geom: layer.geom().name().to_string(),
                count: removed,
            };
            warn!("{}", w);
            warnings.push(w);
        }
        let evaluated = evaluated.filter(&keep);
        let (rows, panels) = self.facet.map_rows(&raw.filter(&keep), layout);
        let data = evaluated
            .take(&rows)
            .with_column(PANEL, Column::Numeric(panels))?;
        let data = add_group_column(data)?;
        debug!(layer = index, geom = layer.geom().name(), rows = data.nrow(), "layer resolved");
        layer.geom().setup_data(data, &layer.geom_params())
    }

    fn axis_title(&self, aes: &str, scales: &ScaleSet) -> String {
        if let Some(label) = self.labels.get(aes) {
            return label.clone();
        }
        if let Some(name) = scales.get(aes).and_then(|s| s.name.clone()) {
            return name;
        }
        for layer in &self.layers {
            if let Some(v) = layer.effective_mapping(&self.mapping).get(aes) {
                return v.label();
            }
            if let Some((_, column)) = layer.stat_ref().computed_aes().iter().find(|(a, _)| *a == aes) {
                return column.to_string();
            }
        }
        String::new()
    }

    fn panels(&self, layout: &Layout, mapped: &[DataTable], scales: &ScaleSet) -> Vec<Panel> {
        let x_ranges = axis_ranges(layout, mapped, scales, "x", |p| self.facet.x_range_key(p));
        let y_ranges = axis_ranges(layout, mapped, scales, "y", |p| self.facet.y_range_key(p));
        layout
            .panels
            .iter()
            .map(|p| {
                let x_range = x_ranges.get(&self.facet.x_range_key(p)).copied().unwrap_or((0.0, 1.0));
                let y_range = y_ranges.get(&self.facet.y_range_key(p)).copied().unwrap_or((0.0, 1.0));
                let mut panel = Panel::from_layout(p, x_range, y_range);
                if let Some(s) = scales.get("x") {
                    panel.x_breaks = s.axis_breaks(x_range);
                }
                if let Some(s) = scales.get("y") {
                    panel.y_breaks = s.axis_breaks(y_range);
                }
                panel
            })
            .collect()
    }
}

/// Stat, computed defaults, geom extents, required-aesthetic check, position.
fn compute_layer(layer: &Layer, mapping: &AestheticSpec, data: DataTable) -> Result<DataTable> {
    let stat = layer.stat_ref();
    let mut data = run_stat(stat, &data, layer.params())?;
    for (aes, source) in stat.computed_aes() {
        if data.has(aes) {
            continue;
        }
        if let Some(col) = data.column(source).cloned() {
            data = data.with_column(*aes, col)?;
        }
    }

    let geom = layer.geom();
    let data = geom.reparameterise(data, &layer.geom_params())?;
    // Checked against the declared sources too, so empty layers fail alike
    let defaults = geom.default_aes();
    for aes in geom.required_aes() {
        let present = data.has(aes)
            || mapping.contains(aes)
            || stat.computed_aes().iter().any(|(a, _)| a == aes)
            || layer.fixed_values().contains_key(*aes)
            || defaults.iter().any(|(a, _)| a == aes);
        if !present {
            return Err(PlotError::MissingAesthetic {
                component: format!("geom_{}", geom.name()),
                aesthetic: aes.to_string(),
            });
        }
    }

    let (position, params) = layer.resolved_position()?;
    run_position(position.as_ref(), &data, &params)
}

fn train_discrete_positions(scales: &mut ScaleSet, data: &DataTable) -> Result<()> {
    for (name, col) in data.columns() {
        if !is_position_aes(name) || !col.is_discrete() {
            continue;
        }
        scales.ensure_default(name, col)?;
        if let Some(scale) = scales.get_mut(name) {
            scale.train(col)?;
        }
    }
    Ok(())
}

/// Replace discrete x/y columns with level rank + 1.
fn encode_discrete_positions(scales: &ScaleSet, data: DataTable) -> Result<DataTable> {
    let mut out = data.clone();
    for (name, col) in data.columns() {
        if !is_position_aes(name) || !col.is_discrete() {
            continue;
        }
        if let Some(scale) = scales.get(name) {
            out = out.with_column(name, scale.encode_position(col))?;
        }
    }
    Ok(out)
}

fn outlier_values(col: &Column) -> Vec<f64> {
    (0..col.len()).flat_map(|i| unpack_outliers(&col.key(i))).collect()
}

fn train_scales(scales: &mut ScaleSet, data: &DataTable) -> Result<()> {
    for (name, col) in data.columns() {
        if name == PANEL || name == GROUP || !SCALED_AESTHETICS.contains(&aes_family(name)) {
            continue;
        }
        scales.ensure_default(name, col)?;
        if let Some(scale) = scales.get_mut(name) {
            scale.train(col)?;
        }
    }
    // Boxplot outliers live on the y axis
    if let (Some(col), Some(scale)) = (data.column("outliers"), scales.get_mut("y")) {
        scale.train(&Column::Numeric(outlier_values(col)))?;
    }
    Ok(())
}

/// Map scaled columns, then add fixed values and geom defaults. Rows with a
/// finite value that maps to a non-finite one are dropped; their count is
/// returned.
fn map_layer(scales: &mut ScaleSet, layer: &Layer, data: DataTable) -> Result<(DataTable, usize)> {
    let mut out = data.clone();
    let mut keep = vec![true; data.nrow()];
    for (name, col) in data.columns() {
        if name == PANEL || name == GROUP || !SCALED_AESTHETICS.contains(&aes_family(name)) {
            continue;
        }
        if let Some(scale) = scales.get_mut(name) {
            let mapped = scale.map_column(col)?;
            if let (Some(before), Some(after)) = (col.as_numeric(), mapped.as_numeric()) {
                for ((k, b), a) in keep.iter_mut().zip(before).zip(after) {
                    if b.is_finite() && !a.is_finite() {
                        *k = false;
                    }
                }
            }
            out = out.with_column(name, mapped)?;
        }
    }
    if let (Some(col), Some(scale)) = (data.column("outliers"), scales.get("y")) {
        let mut packed = Vec::with_capacity(col.len());
        for i in 0..col.len() {
            let mut values = Vec::new();
            for v in unpack_outliers(&col.key(i)) {
                if let Some(m) = scale.map_value(&Value::Num(v))?.as_f64().filter(|m| m.is_finite()) {
                    values.push(m);
                }
            }
            packed.push(pack_outliers(values));
        }
        out = out.with_column("outliers", Column::Text(packed))?;
    }

    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        debug!(geom = layer.geom().name(), removed, "dropped rows outside the scales");
        out = out.filter(&keep);
    }

    let n = out.nrow();
    for (aes, v) in layer.fixed_values() {
        out = out.with_column(aes.as_str(), Column::repeat(v, n))?;
    }
    for (aes, v) in layer.geom().default_aes() {
        if !out.has(aes) {
            out = out.with_column(aes, Column::repeat(&v, n))?;
        }
    }
    Ok((out, removed))
}

/// Finite range of the axis's primary column and of the whole family.
#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    primary: Option<(f64, f64)>,
    all: Option<(f64, f64)>,
}

fn grow(range: Option<(f64, f64)>, v: f64) -> Option<(f64, f64)> {
    if !v.is_finite() {
        return range;
    }
    Some(match range {
        Some((lo, hi)) => (lo.min(v), hi.max(v)),
        None => (v, v),
    })
}

fn union(a: Option<(f64, f64)>, b: (f64, f64)) -> Option<(f64, f64)> {
    grow(grow(a, b.0), b.1)
}

/// Expanded range: discrete axes ±0.6 around the level positions, continuous
/// axes 5% each side (±1 when degenerate).
fn expand(extent: Extent, scale: Option<&Scale>, shared: bool) -> (f64, f64) {
    match scale {
        Some(s) if s.is_discrete() => {
            let mut primary = extent.primary;
            if let (true, ScaleKind::Discrete(d)) = (shared, s.kind()) {
                if !d.levels().is_empty() {
                    primary = union(primary, (1.0, d.levels().len() as f64));
                }
            }
            let (lo, hi) = primary.or(extent.all).unwrap_or((1.0, 1.0));
            let (lo, hi) = (lo - 0.6, hi + 0.6);
            match extent.all {
                Some((a, b)) => (lo.min(a), hi.max(b)),
                None => (lo, hi),
            }
        }
        _ => {
            let limits = scale
                .filter(|s| matches!(s.kind(), ScaleKind::Continuous(_)))
                .and_then(Scale::position_limits);
            let (lo, hi) = limits.or(extent.all).unwrap_or((0.0, 1.0));
            if hi - lo <= 0.0 {
                (lo - 1.0, hi + 1.0)
            } else {
                let pad = (hi - lo) * 0.05;
                (lo - pad, hi + pad)
            }
        }
    }
}

fn axis_ranges(
    layout: &Layout,
    mapped: &[DataTable],
    scales: &ScaleSet,
    family: &str,
    key: impl Fn(&PanelLayout) -> usize,
) -> BTreeMap<usize, (f64, f64)> {
    let members = if family == "x" { X_AESTHETICS } else { Y_AESTHETICS };
    let key_of: HashMap<usize, usize> = layout.panels.iter().map(|p| (p.id, key(p))).collect();
    let mut extents: BTreeMap<usize, Extent> = layout.panels.iter().map(|p| (key(p), Extent::default())).collect();

    for data in mapped {
        let Some(panels) = data.numeric(PANEL) else { continue };
        let slot = |i: usize| key_of.get(&(panels[i] as usize)).copied();
        for aes in members {
            let Some(values) = data.numeric(aes) else { continue };
            for (i, v) in values.iter().enumerate() {
                if let Some(e) = slot(i).and_then(|k| extents.get_mut(&k)) {
                    e.all = grow(e.all, *v);
                    if *aes == family {
                        e.primary = grow(e.primary, *v);
                    }
                }
            }
        }
        if family == "y" {
            if let Some(col) = data.column("outliers") {
                for i in 0..col.len() {
                    if let Some(e) = slot(i).and_then(|k| extents.get_mut(&k)) {
                        for v in unpack_outliers(&col.key(i)) {
                            e.all = grow(e.all, v);
                        }
                    }
                }
            }
        }
    }

    let scale = scales.get(family);
    extents
        .into_iter()
        .map(|(k, e)| (k, expand(e, scale, k == 0)))
        .collect()
}

fn draw_records(layout: &Layout, mapped: &[DataTable]) -> Vec<DrawRecord> {
    let by_panel: Vec<HashMap<i64, Vec<usize>>> = mapped
        .iter()
        .map(|d| d.split_by_id(PANEL).into_iter().collect())
        .collect();
    let mut records = Vec::new();
    for panel in &layout.panels {
        for (layer, data) in mapped.iter().enumerate() {
            let Some(rows) = by_panel[layer].get(&(panel.id as i64)) else { continue };
            let subset = data.take(rows);
            for (group, group_rows) in subset.split_by_id(GROUP) {
                records.push(DrawRecord {
                    panel: panel.id,
                    layer,
                    group,
                    data: subset.take(&group_rows),
                });
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::FacetScales;

    fn xy() -> DataTable {
        DataTable::from_columns(vec![
            ("a", Column::Numeric(vec![1.0, 2.0, 3.0])),
            ("b", Column::Numeric(vec![2.0, 4.0, 6.0])),
            ("g", Column::Text(vec!["p".into(), "q".into(), "p".into()])),
        ])
        .unwrap()
    }

    fn mapping() -> AestheticSpec {
        AestheticSpec::new().map("x", "a").unwrap().map("y", "b").unwrap()
    }

    #[test]
    fn test_plot_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Plot>();
    }

    #[test]
    fn test_point_layer_records() {
        let plot = Plot::new()
            .data(xy())
            .aes(mapping().map("color", "g").unwrap())
            .layer(Layer::new("point").unwrap());
        let built = plot.build().unwrap();
        assert_eq!(built.records.len(), 2);
        assert_eq!(built.records[0].group, 1);
        assert_eq!(built.records[0].data.nrow(), 2);
        let colors = built.records[0].data.column("color").unwrap();
        assert_eq!(colors.key(0), "#1F77B4");
        // Defaults fill the remaining aesthetics
        assert_eq!(built.records[0].data.numeric("size").unwrap()[0], 1.5);
        assert_eq!(built.labels.x, "a");
        assert_eq!(built.legend.blocks.len(), 1);
    }

    #[test]
    fn test_ranges_expand_five_percent() {
        let built = Plot::new()
            .data(xy())
            .aes(mapping())
            .layer(Layer::new("point").unwrap())
            .build()
            .unwrap();
        let (lo, hi) = built.panels[0].x_range;
        assert!((lo - 0.9).abs() < 1e-12 && (hi - 3.1).abs() < 1e-12);
        assert!(!built.panels[0].x_breaks.is_empty());
    }

    #[test]
    fn test_discrete_axis_range() {
        let built = Plot::new()
            .data(xy())
            .aes(AestheticSpec::new().map("x", "g").unwrap())
            .layer(Layer::new("bar").unwrap())
            .build()
            .unwrap();
        let (lo, hi) = built.panels[0].x_range;
        assert!((lo - 0.4).abs() < 1e-12);
        assert!((hi - 2.6).abs() < 1e-12);
        assert_eq!(built.labels.y, "count");
        let tops: Vec<f64> = built.records.iter().map(|r| r.data.numeric("ymax").unwrap()[0]).collect();
        assert_eq!(tops, vec![2.0, 1.0]);
    }

    #[test]
    fn test_missing_geom_aesthetic() {
        let err = Plot::new()
            .data(xy())
            .aes(mapping())
            .layer(Layer::new("text").unwrap())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PlotError::MissingAesthetic {
                component: "geom_text".into(),
                aesthetic: "label".into()
            }
        );
    }

    #[test]
    fn test_missing_aesthetic_on_empty_layer() {
        let data = DataTable::from_columns(vec![
            ("a", Column::Numeric(vec![1.0, 2.0])),
            ("b", Column::Numeric(vec![f64::NAN, f64::NAN])),
        ])
        .unwrap();
        let err = Plot::new()
            .data(data.clone())
            .aes(mapping())
            .layer(Layer::new("text").unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, PlotError::MissingAesthetic { ref aesthetic, .. } if aesthetic == "label"));

        // A declared label passes even with no rows left
        let built = Plot::new()
            .data(data)
            .aes(mapping().map("label", "a").unwrap())
            .layer(Layer::new("text").unwrap())
            .build()
            .unwrap();
        assert!(built.records.is_empty());
    }

    #[test]
    fn test_rows_outside_log_domain_are_removed() {
        let data = DataTable::from_columns(vec![
            ("a", Column::Numeric(vec![0.0, 10.0, 100.0])),
            ("b", Column::Numeric(vec![1.0, 2.0, 3.0])),
        ])
        .unwrap();
        let plot = Plot::new()
            .data(data)
            .aes(mapping())
            .scale(Scale::continuous("x").with_transform(crate::scale::Transform::Log10));
        let built = plot.clone().layer(Layer::new("point").unwrap()).build().unwrap();
        assert_eq!(built.records[0].data.numeric("x").unwrap(), &[1.0, 2.0]);
        assert_eq!(
            built.warnings,
            vec![Warning::RemovedRows {
                layer: 0,
                geom: "point".into(),
                count: 1
            }]
        );

        let quiet = plot.layer(Layer::new("point").unwrap().na_rm(true)).build().unwrap();
        assert_eq!(quiet.records[0].data.nrow(), 2);
        assert!(quiet.warnings.is_empty());
    }

    #[test]
    fn test_out_of_limits_size_is_removed() {
        let built = Plot::new()
            .data(xy())
            .aes(mapping().map("size", "b").unwrap())
            .layer(Layer::new("point").unwrap())
            .scale(Scale::continuous("size").with_limits(0.0, 5.0))
            .build()
            .unwrap();
        let sizes = built.records[0].data.numeric("size").unwrap();
        assert_eq!(sizes.len(), 2);
        assert!(sizes.iter().all(|s| s.is_finite()));
        assert!(matches!(built.warnings.as_slice(), [Warning::RemovedRows { count: 1, .. }]));
    }

    #[test]
    fn test_fixed_values_are_not_scaled() {
        let built = Plot::new()
            .data(xy())
            .aes(mapping())
            .layer(Layer::new("point").unwrap().fixed("color", Value::Str("red".into())))
            .build()
            .unwrap();
        assert_eq!(built.records[0].data.column("color").unwrap().key(0), "red");
        assert!(built.scales.get("color").is_none());
        assert!(built.legend.is_empty());
    }

    #[test]
    fn test_free_y_wrap_ranges() {
        let built = Plot::new()
            .data(xy())
            .aes(mapping())
            .layer(Layer::new("point").unwrap())
            .facet(Facet::Wrap {
                vars: vec!["g".into()],
                ncol: None,
                nrow: None,
                scales: FacetScales::FreeY,
            })
            .build()
            .unwrap();
        assert_eq!(built.panels.len(), 2);
        assert_ne!(built.panels[0].y_range, built.panels[1].y_range);
        assert_eq!(built.panels[0].x_range, built.panels[1].x_range);
        // q has one point: degenerate range widens by one
        assert_eq!(built.panels[1].y_range, (3.0, 5.0));
    }

    #[test]
    fn test_boxplot_outliers_follow_y_scale() {
        let mut ys: Vec<f64> = (1..=9).map(f64::from).collect();
        ys.push(100.0);
        let data = DataTable::from_columns(vec![("v", Column::Numeric(ys))]).unwrap();
        let built = Plot::new()
            .data(data)
            .aes(AestheticSpec::new().map("y", "v").unwrap())
            .layer(Layer::new("boxplot").unwrap())
            .scale(Scale::continuous("y").with_transform(crate::scale::Transform::Log10))
            .build()
            .unwrap();
        let outliers = built.records[0].data.column("outliers").unwrap().key(0);
        assert_eq!(outliers, "2");
        assert!(built.panels[0].y_range.1 > 2.0);
    }
}
