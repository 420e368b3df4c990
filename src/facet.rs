//! Facets: splitting layer rows into panels laid out on a grid.

use crate::data::{compare_values, Column, DataTable, Value};
use crate::error::{PlotError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Which position ranges may differ between panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetScales {
    #[default]
    Fixed,
    FreeX,
    FreeY,
    Free,
}

impl FacetScales {
    pub fn from_name(name: &str) -> Option<FacetScales> {
        match name {
            "fixed" => Some(FacetScales::Fixed),
            "free_x" => Some(FacetScales::FreeX),
            "free_y" => Some(FacetScales::FreeY),
            "free" => Some(FacetScales::Free),
            _ => None,
        }
    }

    pub fn free_x(self) -> bool {
        matches!(self, FacetScales::FreeX | FacetScales::Free)
    }

    pub fn free_y(self) -> bool {
        matches!(self, FacetScales::FreeY | FacetScales::Free)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Facet {
    /// A single panel.
    #[default]
    Null,
    /// Observed combinations of `vars`, wrapped row-major onto a grid.
    Wrap {
        vars: Vec<String>,
        ncol: Option<usize>,
        nrow: Option<usize>,
        scales: FacetScales,
    },
    /// Every combination of the row values with the column values.
    Grid {
        rows: Vec<String>,
        cols: Vec<String>,
        scales: FacetScales,
    },
}

/// Grid position and facet values of one panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelLayout {
    /// 1-based panel id, also the value of the `PANEL` column.
    pub id: usize,
    /// 1-based grid row.
    pub row: usize,
    /// 1-based grid column.
    pub col: usize,
    /// Facet variable → value label.
    pub keys: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub nrow: usize,
    pub ncol: usize,
    pub panels: Vec<PanelLayout>,
}

/// Rows and columns for `n` wrapped panels: `ncol` wins, then `nrow`, then
/// a square-ish grid.
pub fn wrap_dimensions(n: usize, ncol: Option<usize>, nrow: Option<usize>) -> (usize, usize) {
    let n = n.max(1);
    match (ncol, nrow) {
        (Some(cols), _) if cols > 0 => (n.div_ceil(cols), cols),
        (None, Some(rows)) if rows > 0 => (rows, n.div_ceil(rows)),
        _ => {
            let cols = (n as f64).sqrt().ceil() as usize;
            (n.div_ceil(cols), cols)
        }
    }
}

/// Ordered distinct values of one facet variable across all layers.
#[derive(Debug, Clone)]
struct VarLevels {
    name: String,
    levels: Vec<String>,
    index: HashMap<String, usize>,
}

impl VarLevels {
    fn collect(name: &str, datasets: &[&DataTable]) -> VarLevels {
        let columns: Vec<&Column> = datasets.iter().filter_map(|d| d.column(name)).collect();
        let levels = if !columns.is_empty() && columns.iter().all(|c| matches!(c, Column::Categorical(_))) {
            let mut levels: Vec<String> = Vec::new();
            for col in &columns {
                for l in col.observed_levels() {
                    if !levels.contains(&l) {
                        levels.push(l);
                    }
                }
            }
            // Keep declared level order across factors
            if let Some(Column::Categorical(f)) = columns.first() {
                let declared = f.levels();
                levels.sort_by_key(|l| declared.iter().position(|d| d == l).unwrap_or(usize::MAX));
            }
            levels
        } else {
            let mut seen: HashMap<String, Value> = HashMap::new();
            for col in &columns {
                for i in 0..col.len() {
                    let v = match col {
                        Column::Numeric(_) => col.get(i),
                        _ => Value::Str(col.key(i)),
                    };
                    seen.entry(v.key()).or_insert(v);
                }
            }
            let mut values: Vec<Value> = seen.into_values().collect();
            if values.iter().all(|v| matches!(v, Value::Num(_))) {
                values.sort_by(compare_values);
            } else {
                values.sort_by_key(Value::key);
            }
            values.iter().map(Value::key).collect()
        };
        let index = levels.iter().enumerate().map(|(i, l)| (l.clone(), i)).collect();
        VarLevels {
            name: name.to_string(),
            levels,
            index,
        }
    }

    fn rank(&self, col: &Column, i: usize) -> Option<usize> {
        self.index.get(&col.key(i)).copied()
    }
}

/// Sorted distinct combinations of `vars` observed in layers carrying all of them.
fn observed_combinations(vars: &[VarLevels], datasets: &[&DataTable]) -> Vec<Vec<usize>> {
    let mut combos: BTreeSet<Vec<usize>> = BTreeSet::new();
    for data in datasets {
        let cols: Option<Vec<&Column>> = vars.iter().map(|v| data.column(&v.name)).collect();
        let Some(cols) = cols else { continue };
        for i in 0..data.nrow() {
            let combo: Option<Vec<usize>> = vars.iter().zip(&cols).map(|(v, c)| v.rank(c, i)).collect();
            if let Some(combo) = combo {
                combos.insert(combo);
            }
        }
    }
    if vars.is_empty() {
        combos.insert(Vec::new());
    }
    combos.into_iter().collect()
}

impl Facet {
    pub fn scales(&self) -> FacetScales {
        match self {
            Facet::Null => FacetScales::Fixed,
            Facet::Wrap { scales, .. } | Facet::Grid { scales, .. } => *scales,
        }
    }

    fn vars(&self) -> Vec<&str> {
        match self {
            Facet::Null => Vec::new(),
            Facet::Wrap { vars, .. } => vars.iter().map(String::as_str).collect(),
            Facet::Grid { rows, cols, .. } => rows.iter().chain(cols).map(String::as_str).collect(),
        }
    }

    /// Compute the panel layout from the raw data of every layer.
    pub fn layout(&self, datasets: &[&DataTable]) -> Result<Layout> {
        for var in self.vars() {
            if !datasets.iter().any(|d| d.has(var)) {
                return Err(PlotError::InvalidData(format!(
                    "facet variable '{}' is not present in any layer",
                    var
                )));
            }
        }
        let layout = match self {
            Facet::Null => Layout {
                nrow: 1,
                ncol: 1,
                panels: vec![PanelLayout {
                    id: 1,
                    row: 1,
                    col: 1,
                    keys: IndexMap::new(),
                }],
            },
            Facet::Wrap { vars, ncol, nrow, .. } => {
                let levels: Vec<VarLevels> = vars.iter().map(|v| VarLevels::collect(v, datasets)).collect();
                let combos = observed_combinations(&levels, datasets);
                let (rows, cols) = wrap_dimensions(combos.len(), *ncol, *nrow);
                let panels = combos
                    .iter()
                    .enumerate()
                    .map(|(i, combo)| PanelLayout {
                        id: i + 1,
                        row: i / cols + 1,
                        col: i % cols + 1,
                        keys: key_labels(&levels, combo),
                    })
                    .collect();
                Layout {
                    nrow: rows,
                    ncol: cols,
                    panels,
                }
            }
            Facet::Grid { rows, cols, .. } => {
                let row_levels: Vec<VarLevels> = rows.iter().map(|v| VarLevels::collect(v, datasets)).collect();
                let col_levels: Vec<VarLevels> = cols.iter().map(|v| VarLevels::collect(v, datasets)).collect();
                let row_combos = observed_combinations(&row_levels, datasets);
                let col_combos = observed_combinations(&col_levels, datasets);
                let mut panels = Vec::with_capacity(row_combos.len() * col_combos.len());
                for (r, rc) in row_combos.iter().enumerate() {
                    for (c, cc) in col_combos.iter().enumerate() {
                        let mut keys = key_labels(&row_levels, rc);
                        keys.extend(key_labels(&col_levels, cc));
                        panels.push(PanelLayout {
                            id: panels.len() + 1,
                            row: r + 1,
                            col: c + 1,
                            keys,
                        });
                    }
                }
                Layout {
                    nrow: row_combos.len().max(1),
                    ncol: col_combos.len().max(1),
                    panels,
                }
            }
        };
        debug!(panels = layout.panels.len(), nrow = layout.nrow, ncol = layout.ncol, "facet layout");
        Ok(layout)
    }

    /// Assign each row of a layer's raw data to its panels.
    ///
    /// Returns the source row of every output row and its panel id. A layer
    /// lacking some facet variable is repeated in every panel matching the
    /// variables it has.
    pub fn map_rows(&self, data: &DataTable, layout: &Layout) -> (Vec<usize>, Vec<f64>) {
        let vars: Vec<&str> = self.vars().into_iter().filter(|v| data.has(v)).collect();
        let mut by_key: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
        for panel in &layout.panels {
            let key: Vec<String> = vars.iter().map(|v| panel.keys.get(*v).cloned().unwrap_or_default()).collect();
            by_key.entry(key).or_default().push(panel.id);
        }
        let cols: Vec<&Column> = vars.iter().filter_map(|v| data.column(v)).collect();
        let mut rows = Vec::with_capacity(data.nrow());
        let mut ids = Vec::with_capacity(data.nrow());
        for i in 0..data.nrow() {
            let key: Vec<String> = cols.iter().map(|c| c.key(i)).collect();
            if let Some(panels) = by_key.get(&key) {
                for &id in panels {
                    rows.push(i);
                    ids.push(id as f64);
                }
            }
        }
        // Panel-major order keeps per-panel row order stable
        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by(|&a, &b| ids[a].total_cmp(&ids[b]));
        (
            order.iter().map(|&k| rows[k]).collect(),
            order.iter().map(|&k| ids[k]).collect(),
        )
    }

    /// Panels sharing an x range share this key.
    pub fn x_range_key(&self, panel: &PanelLayout) -> usize {
        match self {
            Facet::Wrap { scales, .. } if scales.free_x() => panel.id,
            Facet::Grid { scales, .. } if scales.free_x() => panel.col,
            _ => 0,
        }
    }

    /// Panels sharing a y range share this key.
    pub fn y_range_key(&self, panel: &PanelLayout) -> usize {
        match self {
            Facet::Wrap { scales, .. } if scales.free_y() => panel.id,
            Facet::Grid { scales, .. } if scales.free_y() => panel.row,
            _ => 0,
        }
    }
}

fn key_labels(levels: &[VarLevels], combo: &[usize]) -> IndexMap<String, String> {
    levels
        .iter()
        .zip(combo)
        .map(|(v, &i)| (v.name.clone(), v.levels[i].clone()))
        .collect()
}
