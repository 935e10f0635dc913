use crate::config::{Config, load_config};
use crate::export::ExportFormat;
use crate::geometry::Point;
use crate::ir::Automaton;
use crate::layout_dump::write_layout_dump;
use crate::render::write_output_svg;
use crate::view::DiagramView;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "autviz", version, about = "Automaton (NFA/DFA) diagram renderer")]
pub struct Args {
    /// Input automaton JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width in CSS pixels
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Viewport height in CSS pixels
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Device pixel ratio
    #[arg(long = "dpr")]
    pub dpr: Option<f32>,

    /// Pin a state center in world coordinates, e.g. `--pin q1=300,120`
    #[arg(long = "pin", value_parser = parse_pin)]
    pub pins: Vec<(String, Point)>,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Pdf,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = apply_args(load_config(args.config.as_deref())?, &args);

    let input = read_input(args.input.as_deref())?;
    let automaton = Automaton::from_json(&input).context("invalid automaton JSON")?;
    automaton.validate()?;

    let mut view = DiagramView::new(config);
    view.set_automaton(Some(automaton));
    for (id, position) in &args.pins {
        if view.automaton().is_some_and(|a| a.states.contains_key(id)) {
            view.set_override(id, *position);
        } else {
            tracing::warn!(state = %id, "ignoring pin for unknown state");
        }
    }

    if let Some(path) = args.dump_layout.as_deref() {
        let layout = view
            .layout()
            .ok_or_else(|| anyhow::anyhow!("no layout to dump"))?;
        write_layout_dump(path, layout)?;
    }

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&view.render(), args.output.as_deref()),
        OutputFormat::Png => export_to(&mut view, ExportFormat::Png, args.output.as_deref()),
        OutputFormat::Pdf => export_to(&mut view, ExportFormat::Pdf, args.output.as_deref()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_args(mut config: Config, args: &Args) -> Config {
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(dpr) = args.dpr {
        config.render.device_pixel_ratio = dpr;
    }
    config
}

fn export_to(view: &mut DiagramView, format: ExportFormat, output: Option<&Path>) -> Result<()> {
    let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for {:?} output", format))?;
    let artifact = match format {
        ExportFormat::Png => view.export_png(),
        ExportFormat::Pdf => view.export_pdf(),
    }
    .ok_or_else(|| anyhow::anyhow!("export failed, see log for details"))?;
    if artifact.format != format {
        tracing::warn!(path = %output.display(), "wrote PNG data instead of PDF");
    }
    std::fs::write(output, &artifact.bytes)?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn parse_pin(raw: &str) -> Result<(String, Point), String> {
    let (id, coords) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=X,Y, got `{raw}`"))?;
    let (x, y) = coords
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y after `=`, got `{coords}`"))?;
    let x: f32 = x.trim().parse().map_err(|_| format!("invalid x in `{raw}`"))?;
    let y: f32 = y.trim().parse().map_err(|_| format!("invalid y in `{raw}`"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("non-finite coordinate in `{raw}`"));
    }
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing state id in `{raw}`"));
    }
    Ok((id.to_string(), (x, y)))
}
