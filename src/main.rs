use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gglayer::aes::Variables;
use gglayer::data::Value;
use gglayer::{csv_reader, parser, runtime, OutputFormat, RenderOptions};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gglayer")]
#[command(about = "Render layered grammar-of-graphics plots from CSV or JSON data", long_about = None)]
struct Args {
    /// Pipeline DSL string (e.g., 'aes(x: time, y: temp, color: site) | line() | point()')
    dsl: String,

    /// Image width in pixels [default: 800]
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels [default: 600]
    #[arg(long)]
    height: Option<u32>,

    /// Output format [default: png]
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JSON file with render options ({"width": .., "height": .., "type": "png|svg|json"})
    #[arg(long)]
    options: Option<PathBuf>,

    /// Data file (.csv or .json); CSV is read from stdin otherwise
    #[arg(long)]
    data: Option<PathBuf>,

    /// Expression variable, NAME=VALUE (repeatable)
    #[arg(long = "define", value_name = "NAME=VALUE")]
    defines: Vec<String>,

    /// Log pipeline progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_define(define: &str) -> Result<(String, Value)> {
    let (name, raw) = define
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid --define '{}', expected NAME=VALUE", define))?;
    let value = match raw.trim().parse::<f64>() {
        Ok(n) => Value::Num(n),
        Err(_) => Value::Str(raw.to_string()),
    };
    Ok((name.trim().to_string(), value))
}

fn render_options(args: &Args) -> Result<RenderOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file {}", path.display()))?;
            serde_json::from_str(&text).context("Failed to parse render options")?
        }
        None => RenderOptions::default(),
    };
    if let Some(width) = args.width {
        options.width = width;
    }
    if let Some(height) = args.height {
        options.height = height;
    }
    if let Some(format) = args.format {
        options.format = format;
    }
    Ok(options)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the image, logs go to stderr
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let options = render_options(&args)?;
    let mut variables = Variables::new();
    for define in &args.defines {
        let (name, value) = parse_define(define)?;
        variables.insert(name, value);
    }

    // Parse the DSL string before touching the data
    let plot_spec = match parser::parse_plot_spec(&args.dsl) {
        Ok((_, plot_spec)) => plot_spec,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    };

    let data = match &args.data {
        Some(path) => csv_reader::read_data_file(path)?,
        None => csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?,
    };

    let bytes = runtime::render_plot(&plot_spec, data, &options, &variables)
        .context("Failed to render plot")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(&bytes)
        .context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
