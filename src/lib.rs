// Library exports for gglayer

pub mod aes;
pub mod coord;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod facet;
pub mod geom;
pub mod ir;
pub mod layer;
pub mod legend;
pub mod palette;
pub mod params;
pub mod parser;
pub mod plot;
pub mod position;
pub mod render;
pub mod resolve;
pub mod runtime;
pub mod scale;
pub mod stat;

pub use error::{PlotError, Result, Warning};
pub use ir::BuiltPlot;
pub use layer::Layer;
pub use plot::Plot;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
    /// The full build result as JSON
    #[serde(rename = "json")]
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}
