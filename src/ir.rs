// Build output: everything a renderer needs, in mapped units

use crate::data::DataTable;
use crate::error::Warning;
use crate::facet::PanelLayout;
use crate::geom::KeyValues;
use crate::scale::{Break, ScaleSet};
use indexmap::IndexMap;
use serde::Serialize;

// =============================================================================
// Panels
// =============================================================================

/// One panel of the built plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub id: usize,
    pub row: usize,
    pub col: usize,
    /// Facet variable → value label.
    pub keys: IndexMap<String, String>,
    /// Expanded x range in mapped units.
    pub x_range: (f64, f64),
    /// Expanded y range in mapped units.
    pub y_range: (f64, f64),
    pub x_breaks: Vec<Break>,
    pub y_breaks: Vec<Break>,
}

impl Panel {
    pub fn from_layout(layout: &PanelLayout, x_range: (f64, f64), y_range: (f64, f64)) -> Panel {
        Panel {
            id: layout.id,
            row: layout.row,
            col: layout.col,
            keys: layout.keys.clone(),
            x_range,
            y_range,
            x_breaks: Vec::new(),
            y_breaks: Vec::new(),
        }
    }

    /// Strip text, e.g. `a, x`.
    pub fn strip_label(&self) -> Option<String> {
        if self.keys.is_empty() {
            None
        } else {
            Some(self.keys.values().cloned().collect::<Vec<_>>().join(", "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSize {
    pub nrow: usize,
    pub ncol: usize,
}

// =============================================================================
// Draw records
// =============================================================================

/// Mapped rows of one group of one layer in one panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawRecord {
    pub panel: usize,
    pub layer: usize,
    pub group: i64,
    pub data: DataTable,
}

// =============================================================================
// Legend
// =============================================================================

/// One key of a legend block: the label and the visual value of every
/// aesthetic merged into the block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendKey {
    pub label: String,
    pub values: KeyValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendBlock {
    pub title: String,
    /// Aesthetics merged into this block, in scale order.
    pub aesthetics: Vec<String>,
    pub keys: Vec<LegendKey>,
    /// Layers drawing key glyphs, in layer order.
    pub layers: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Legend {
    pub blocks: Vec<LegendBlock>,
}

impl Legend {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn key_count(&self) -> usize {
        self.blocks.iter().map(|b| b.keys.len()).sum()
    }
}

// =============================================================================
// Whole plot
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotLabels {
    pub title: Option<String>,
    pub x: String,
    pub y: String,
}

/// Result of [`crate::plot::Plot::build`].
#[derive(Debug, Clone, Serialize)]
pub struct BuiltPlot {
    /// Sorted by panel, layer, group.
    pub records: Vec<DrawRecord>,
    pub panels: Vec<Panel>,
    pub layout: GridSize,
    pub legend: Legend,
    pub scales: ScaleSet,
    pub labels: PlotLabels,
    pub warnings: Vec<Warning>,
}

impl BuiltPlot {
    pub fn records_for(&self, panel: usize) -> impl Iterator<Item = &DrawRecord> {
        self.records.iter().filter(move |r| r.panel == panel)
    }

    pub fn panel(&self, id: usize) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }
}
