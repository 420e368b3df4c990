use gglayer::aes::{AestheticSpec, Variables};
use gglayer::data::{Column, DataTable, Value};
use gglayer::facet::{Facet, FacetScales};
use gglayer::parser::parse_plot_spec;
use gglayer::render::{render_plot, DrawCommand, RecordingBackend};
use gglayer::runtime::build_plot;
use gglayer::scale::{Scale, Transform};
use gglayer::{Layer, Plot, PlotError, Warning};
use std::io::Write;
use std::process::{Command, Stdio};

/// Helper function to run the gglayer binary with a DSL, extra flags and CSV input
fn run_gglayer(dsl: &str, flags: &[&str], csv_content: &str) -> Result<Vec<u8>, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_gglayer"))
        .arg(dsl)
        .args(flags)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    // Write CSV to stdin
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(csv_content.as_bytes())
            .map_err(|e| format!("Failed to write to stdin: {}", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

const TIMESERIES: &str = "day,temp,site\n1,10.5,north\n2,12.0,north\n3,11.2,north\n1,14.1,south\n2,15.3,south\n3,13.9,south\n";

fn num(values: &[f64]) -> Column {
    Column::Numeric(values.to_vec())
}

fn text(values: &[&str]) -> Column {
    Column::Text(values.iter().map(|s| s.to_string()).collect())
}

fn xy(x: &str, y: &str) -> AestheticSpec {
    AestheticSpec::new().map("x", x).unwrap().map("y", y).unwrap()
}

// =============================================================================
// CLI
// =============================================================================

#[test]
fn test_end_to_end_line_chart() {
    let result = run_gglayer("aes(x: day, y: temp, color: site) | line() | point()", &[], TIMESERIES);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_bar_chart() {
    let result = run_gglayer("aes(x: site) | bar()", &[], TIMESERIES);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_faceted_boxplot() {
    let result = run_gglayer(
        r#"aes(x: site, y: temp) | boxplot() | facet_wrap(by: site, scales: "free_y") | labs(title: "Temps")"#,
        &["--width", "400", "--height", "300"],
        TIMESERIES,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_svg() {
    let result = run_gglayer("aes(x: day, y: temp) | point()", &["--format", "svg"], TIMESERIES);
    let bytes = result.expect("svg render failed");
    let svg = String::from_utf8(bytes).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn test_end_to_end_json_with_define() {
    let result = run_gglayer(
        "aes(x: day, y: temp * k) | point()",
        &["--format", "json", "--define", "k=2"],
        TIMESERIES,
    );
    let bytes = result.expect("json render failed");
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let records = value["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert!(value["panels"][0]["y_range"][1].as_f64().unwrap() > 28.0);
}

#[test]
fn test_end_to_end_invalid_syntax() {
    let result = run_gglayer("invalid syntax here", &[], "x,y\n1,10\n");
    assert!(result.is_err(), "Should have failed with parse error");
    assert!(result.unwrap_err().contains("Parse error"));
}

#[test]
fn test_end_to_end_column_not_found() {
    let result = run_gglayer("aes(x: x, y: y) | line()", &[], "a,b\n1,10\n2,20\n");
    let err = result.expect_err("Should have failed with unknown column");
    assert!(err.contains("unknown column"), "{}", err);
}

#[test]
fn test_end_to_end_empty_csv() {
    let result = run_gglayer("aes(x: x, y: y) | line()", &[], "x,y\n");
    assert!(result.is_err(), "Should have failed with empty CSV error");
    assert!(result.unwrap_err().contains("at least one data row"));
}

// =============================================================================
// Library properties
// =============================================================================

#[test]
fn test_missing_required_aesthetic() {
    let data = DataTable::from_columns(vec![("a", num(&[1.0, 2.0]))]).unwrap();
    let plot = Plot::new()
        .data(data.clone())
        .aes(AestheticSpec::new().map("x", "a").unwrap())
        .layer(Layer::new("point").unwrap());
    match plot.build() {
        Err(PlotError::MissingAesthetic { aesthetic, .. }) => assert_eq!(aesthetic, "y"),
        other => panic!("expected MissingAesthetic, got {:?}", other.map(|b| b.records.len())),
    }

    // histogram computes its own y
    let plot = Plot::new()
        .data(data)
        .aes(AestheticSpec::new().map("x", "a").unwrap())
        .layer(Layer::new("histogram").unwrap().param("bins", 2.0));
    assert!(plot.build().is_ok());
}

#[test]
fn test_builds_are_idempotent() {
    let data = DataTable::from_columns(vec![
        ("x", num(&[1.0, 2.0, 3.0, 4.0])),
        ("y", num(&[3.0, 1.0, 4.0, 1.0])),
        ("g", text(&["b", "a", "c", "a"])),
    ])
    .unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(xy("x", "y").map("color", "g").unwrap())
        .layer(Layer::new("point").unwrap().position("jitter").unwrap().position_param("width", 0.3));
    let first = plot.build().unwrap();
    let second = plot.build().unwrap();
    assert_eq!(first.records, second.records);
    assert_eq!(first.legend, second.legend);
    let labels: Vec<&str> = first.legend.blocks[0].keys.iter().map(|k| k.label.as_str()).collect();
    assert_eq!(labels, vec!["b", "a", "c"]);
}

#[test]
fn test_reverse_scale_mapping_is_decreasing() {
    let data = DataTable::from_columns(vec![("x", num(&[1.0, 2.0, 3.0])), ("y", num(&[1.0, 2.0, 3.0]))]).unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(xy("x", "y"))
        .layer(Layer::new("point").unwrap())
        .scale(Scale::continuous("y").with_transform(Transform::Reverse));
    let built = plot.build().unwrap();
    let ys = built.records[0].data.column("y").unwrap().as_numeric().unwrap().to_vec();
    assert!(ys.windows(2).all(|w| w[0] > w[1]), "{:?}", ys);
}

#[test]
fn test_stack_heights_sum_to_values() {
    let data = DataTable::from_columns(vec![
        ("x", text(&["k", "k", "k"])),
        ("y", num(&[1.0, 2.0, 3.0])),
        ("g", text(&["a", "b", "c"])),
    ])
    .unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(xy("x", "y").map("fill", "g").unwrap())
        .layer(Layer::new("col").unwrap());
    let built = plot.build().unwrap();
    let mut heights = 0.0;
    let mut top: f64 = 0.0;
    for record in &built.records {
        let ymin = record.data.column("ymin").unwrap().as_numeric().unwrap()[0];
        let ymax = record.data.column("ymax").unwrap().as_numeric().unwrap()[0];
        heights += ymax - ymin;
        top = top.max(ymax);
    }
    assert!((heights - 6.0).abs() < 1e-9);
    assert!((top - 6.0).abs() < 1e-9);
}

#[test]
fn test_facet_puts_each_row_in_one_panel() {
    let data = DataTable::from_columns(vec![
        ("x", num(&[1.0, 2.0, 3.0, 4.0, 5.0])),
        ("y", num(&[1.0, 2.0, 3.0, 4.0, 5.0])),
        ("g", text(&["C", "A", "B", "A", "C"])),
    ])
    .unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(xy("x", "y"))
        .layer(Layer::new("point").unwrap())
        .facet(Facet::Wrap {
            vars: vec!["g".into()],
            ncol: None,
            nrow: None,
            scales: FacetScales::Fixed,
        });
    let built = plot.build().unwrap();
    let strips: Vec<String> = built.panels.iter().filter_map(|p| p.strip_label()).collect();
    assert_eq!(strips, vec!["A", "B", "C"]);
    let rows: usize = built.records.iter().map(|r| r.data.nrow()).sum();
    assert_eq!(rows, 5);
}

#[test]
fn test_palette_overflow_recycles_colours() {
    let data = DataTable::from_columns(vec![
        ("x", num(&[1.0, 2.0, 3.0, 4.0])),
        ("y", num(&[1.0, 2.0, 3.0, 4.0])),
        ("z", num(&[1.0, 2.0, 3.0, 4.0])),
    ])
    .unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(xy("x", "y").map("color", "factor(z)").unwrap())
        .layer(Layer::new("point").unwrap())
        .scale(Scale::discrete("color").with_values(vec!["red".into(), "green".into(), "blue".into()]));
    let built = plot.build().unwrap();
    let keys = &built.legend.blocks[0].keys;
    assert_eq!(keys.len(), 4);
    assert_eq!(keys[0].values["color"], keys[3].values["color"]);
    let overflows = built
        .warnings
        .iter()
        .filter(|w| matches!(w, Warning::PaletteOverflow { .. }))
        .count();
    assert_eq!(overflows, 1);
}

#[test]
fn test_non_finite_row_is_removed_with_warning() {
    let data = DataTable::from_columns(vec![("x", num(&[1.0, 2.0, 3.0])), ("y", num(&[1.0, f64::NAN, 3.0]))]).unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(xy("x", "y"))
        .layer(Layer::new("point").unwrap());
    let built = plot.build().unwrap();
    assert_eq!(built.records[0].data.nrow(), 2);
    assert!(built
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::RemovedRows { count: 1, .. })));
}

#[test]
fn test_na_rm_drops_rows_silently() {
    let data = DataTable::from_columns(vec![("x", num(&[1.0, 2.0, 3.0])), ("y", num(&[1.0, f64::NAN, 3.0]))]).unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(xy("x", "y"))
        .layer(Layer::new("point").unwrap().na_rm(true));
    let built = plot.build().unwrap();
    assert_eq!(built.records[0].data.nrow(), 2);
    assert!(built.warnings.is_empty());
}

#[test]
fn test_discrete_levels_follow_layer_order() {
    let first = DataTable::from_columns(vec![
        ("x", num(&[1.0, 2.0])),
        ("y", num(&[1.0, 2.0])),
        ("g", text(&["b", "a"])),
    ])
    .unwrap();
    let second = DataTable::from_columns(vec![
        ("x", num(&[3.0, 4.0])),
        ("y", num(&[3.0, 4.0])),
        ("g", text(&["c", "a"])),
    ])
    .unwrap();
    let plot = Plot::new()
        .data(first.clone())
        .aes(xy("x", "y").map("color", "g").unwrap())
        .layer(Layer::new("point").unwrap())
        .layer(Layer::new("point").unwrap().data(second.clone()));
    let built = plot.build().unwrap();
    let labels: Vec<&str> = built.legend.blocks[0].keys.iter().map(|k| k.label.as_str()).collect();
    assert_eq!(labels, vec!["b", "a", "c"]);

    // Swapping the layers swaps the first-seen order
    let swapped = Plot::new()
        .data(second)
        .aes(xy("x", "y").map("color", "g").unwrap())
        .layer(Layer::new("point").unwrap())
        .layer(Layer::new("point").unwrap().data(first));
    let built = swapped.build().unwrap();
    let labels: Vec<&str> = built.legend.blocks[0].keys.iter().map(|k| k.label.as_str()).collect();
    assert_eq!(labels, vec!["c", "a", "b"]);
}

#[test]
fn test_small_boxplot_outliers_stay_on_the_axis() {
    let mut ys: Vec<f64> = (1..=9).map(|i| i as f64 * 1e-10).collect();
    ys.push(1e-8);
    let data = DataTable::from_columns(vec![("v", num(&ys))]).unwrap();
    let built = Plot::new()
        .data(data)
        .aes(AestheticSpec::new().map("y", "v").unwrap())
        .layer(Layer::new("boxplot").unwrap())
        .build()
        .unwrap();
    let packed = built.records[0].data.column("outliers").unwrap().key(0);
    assert_eq!(packed.parse::<f64>().unwrap(), 1e-8);
    assert!(built.panels[0].y_range.1 > 1e-8);
}

#[test]
fn test_invalid_gradient_colour_falls_back() {
    let data = DataTable::from_columns(vec![
        ("x", num(&[1.0, 2.0])),
        ("y", num(&[1.0, 2.0])),
    ])
    .unwrap();
    let built = Plot::new()
        .data(data)
        .aes(xy("x", "y").map("color", "y").unwrap())
        .layer(Layer::new("point").unwrap())
        .scale(Scale::continuous("color").with_gradient("#aébcd", "red"))
        .build()
        .unwrap();
    assert_eq!(built.records[0].data.column("color").unwrap().key(1), "#FF0000");
}

#[test]
fn test_oversized_histogram_is_a_stat_error() {
    let data = DataTable::from_columns(vec![("a", num(&[1.0, 2.0, 3.0]))]).unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(AestheticSpec::new().map("x", "a").unwrap())
        .layer(Layer::new("histogram").unwrap().param("bins", 2e18));
    assert!(matches!(plot.build(), Err(PlotError::StatParameter { .. })));
}

#[test]
fn test_rug_layers_with_mapped_aesthetics() {
    let data = DataTable::from_columns(vec![
        ("x", num(&[1.0, 2.0, 3.0, 4.0])),
        ("y", num(&[1.0, 2.0, 3.0, 4.0])),
        ("z", num(&[1.0, 2.0, 3.0, 4.0])),
    ])
    .unwrap();
    let dsl = r#"rug(x: x, y: y, size: 2)
        | rug(x: x + 2*n, y: y + 2*n, alpha: z, size: 2, sides: "tr")
        | rug(x: x + 4*n, y: y + 4*n, linetype: factor(z), size: 2, sides: "t")
        | rug(x: x + 6*n, y: y + 6*n, color: factor(z), size: 2, sides: "b")
        | rug(x: x + 8*n, y: y + 8*n, size: z, sides: "tblr")"#;
    let (_, spec) = parse_plot_spec(dsl).unwrap();
    let mut variables = Variables::new();
    variables.insert("n".to_string(), Value::Num(4.0));
    let plot = build_plot(&spec, data, &variables).unwrap();
    let built = plot.build().unwrap();

    assert_eq!(built.records.iter().map(|r| r.layer).max(), Some(4));
    assert!((built.panels[0].x_range.1 - 36.0).abs() < 2.0);
    let legend_aes: Vec<&str> = built
        .legend
        .blocks
        .iter()
        .flat_map(|b| b.aesthetics.iter().map(String::as_str))
        .collect();
    for aes in ["alpha", "linetype", "color", "size"] {
        assert!(legend_aes.contains(&aes), "{} missing from {:?}", aes, legend_aes);
    }

    // The last layer maps size, the others fix it at 2
    let last = built.records.iter().find(|r| r.layer == 4).unwrap();
    let sizes = last.data.numeric("size").unwrap();
    assert!(sizes.windows(2).all(|w| w[0] < w[1]), "{:?}", sizes);
    let fixed = built.records.iter().find(|r| r.layer == 0).unwrap();
    assert!(fixed.data.numeric("size").unwrap().iter().all(|s| *s == 2.0));

    let mut backend = RecordingBackend::new();
    render_plot(&built, &plot, &mut backend, 600.0, 400.0).unwrap();
    let tick_widths: Vec<f64> = backend
        .commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Segment { stroke, .. } => Some(stroke.width),
            _ => None,
        })
        .collect();
    assert!(tick_widths.iter().any(|w| (*w - 4.0).abs() < 1e-9));
    assert!(tick_widths.iter().any(|w| *w > 4.0));
}

#[test]
fn test_unsupported_aesthetic_is_rejected() {
    let (_, spec) = parse_plot_spec("aes(x: x, y: y) | line(shape: x)").unwrap();
    let data = DataTable::from_columns(vec![("x", num(&[1.0])), ("y", num(&[1.0]))]).unwrap();
    let err = build_plot(&spec, data, &Variables::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("shape"), "{:#}", err);
}

#[test]
fn test_recording_backend_draws_every_layer() {
    let data = DataTable::from_columns(vec![("x", num(&[1.0, 2.0, 3.0])), ("y", num(&[2.0, 1.0, 3.0]))]).unwrap();
    let plot = Plot::new()
        .data(data)
        .aes(xy("x", "y"))
        .layer(Layer::new("line").unwrap())
        .layer(Layer::new("point").unwrap().fixed("color", Value::Str("red".into())));
    let built = plot.build().unwrap();
    let mut backend = RecordingBackend::new();
    let layout = render_plot(&built, &plot, &mut backend, 400.0, 300.0).unwrap();
    assert!(layout.legend.is_none());
    let json = serde_json::to_value(&backend).unwrap();
    let primitives: Vec<&str> = json["commands"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["primitive"].as_str())
        .collect();
    assert!(primitives.contains(&"polyline"));
    assert!(primitives.contains(&"points"));
}
