// Plot pipeline DSL parser

pub mod ast;
pub mod lexer;
pub mod pipeline;

// Public API re-exports
pub use ast::{Arg, ArgValue, PlotSpec};
pub use pipeline::parse_plot_spec;
