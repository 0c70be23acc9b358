// ============================================================================
// TypesetFE CLI: headless selection + typesetting test bench
// ============================================================================
//
// Usage examples:
//   TypesetFE -i photo.png --select flood:685,174 --text "Hello there" --font face.ttf -o out.png
//   TypesetFE -i photo.png --select rect:10,10;200,120 --select subtract:ellipse:40,40;80,90 -o out.png
//   TypesetFE -i photo.png --select brush:5,5;50,5;50,50 --undo 1 -o overlay.png
//
// Selection steps use `[mode:]tool:x,y[;x,y...]`. The first point starts the
// selector, every following point is a drag update.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{info, warn};

use crate::canvas::SelectionMode;
use crate::components::tools::SelectionTool;
use crate::io::{encode_and_write, load_font, SaveFormat};
use crate::project::Project;
use crate::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// TypesetFE headless selection and text fitting.
#[derive(Parser, Debug)]
#[command(
    name = "TypesetFE",
    about = "Select regions of an image and fit text inside them",
    long_about = "Load an image, build selections with rectangle, ellipse, flood-fill\n\
                  and brush tools, then typeset text inside the active selection.\n\n\
                  Example:\n  \
                  TypesetFE -i photo.png --select flood:685,174 --text \"Hi\" --font face.ttf -o out.png"
)]
pub struct CliArgs {
    /// Input image.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Selection step `[mode:]tool:x,y[;x,y...]`, repeatable.
    /// mode: replace, add, subtract, intersect. tool: rect, ellipse, flood, brush.
    #[arg(short, long = "select", value_name = "STEP")]
    pub select: Vec<String>,

    /// Start a fresh selection layer before applying the steps.
    #[arg(long)]
    pub new_layer: bool,

    /// Undo this many selections after the steps.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub undo: usize,

    /// Redo this many selections after undoing.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub redo: usize,

    /// Text to fit into the active selection.
    #[arg(short, long)]
    pub text: Option<String>,

    /// Font file (TTF/OTF), required with --text.
    #[arg(long, value_name = "FONT")]
    pub font: Option<PathBuf>,

    #[arg(long, value_name = "PX")]
    pub font_size: Option<f32>,

    #[arg(long, value_name = "PX")]
    pub line_gap: Option<f32>,

    /// Clearance between text and selection edge.
    #[arg(long, value_name = "PX")]
    pub margin: Option<u32>,

    #[arg(long, value_name = "1-100")]
    pub brush_radius: Option<u32>,

    /// Flood-fill colour tolerance (0.0 - 1.0).
    #[arg(long, value_name = "0-1")]
    pub flood_threshold: Option<f32>,

    /// Settings file to use instead of the per-user one.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Persist the effective settings to the per-user settings file.
    #[arg(long)]
    pub save_settings: bool,

    /// Output file. Format is inferred from the extension, defaulting to png.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JPEG quality (1-100).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Leave the selection overlay out of the output image.
    #[arg(long)]
    pub no_overlay: bool,

    /// Mirror the session log to stderr and print timings.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Load settings from `--config` or the user file, then apply flag overrides.
    pub fn settings(&self) -> AppSettings {
        let mut s = match &self.config {
            Some(path) => AppSettings::load_from(path),
            None => AppSettings::load(),
        };
        if let Some(r) = self.brush_radius {
            s.selection.set_brush_radius(r);
        }
        if let Some(t) = self.flood_threshold {
            s.selection.set_flood_threshold(t);
        }
        if let Some(size) = self.font_size {
            s.typeset.font_size = size;
        }
        if let Some(gap) = self.line_gap {
            s.typeset.line_gap = gap;
        }
        if let Some(margin) = self.margin {
            s.typeset.margin = margin;
        }
        s
    }
}

// ============================================================================
// Selection step grammar
// ============================================================================

/// One drag gesture: start at the first point, update through the rest.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionStep {
    /// `None` keeps the configured mode.
    pub mode: Option<SelectionMode>,
    pub tool: SelectionTool,
    pub points: Vec<(i32, i32)>,
}

impl std::str::FromStr for SelectionStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let (mode, tool, points) = match parts.as_slice() {
            [tool, points] => (None, *tool, *points),
            [mode, tool, points] => {
                let mode = SelectionMode::from_key(mode).ok_or_else(|| format!("unknown mode '{mode}'"))?;
                (Some(mode), *tool, *points)
            }
            _ => return Err(format!("expected [mode:]tool:x,y[;x,y...], got '{s}'")),
        };
        let tool = SelectionTool::from_key(tool).ok_or_else(|| format!("unknown tool '{tool}'"))?;
        let points = points
            .split(';')
            .filter(|p| !p.trim().is_empty())
            .map(parse_point)
            .collect::<Result<Vec<_>, _>>()?;
        if points.is_empty() {
            return Err(format!("step '{s}' has no points"));
        }
        Ok(Self { mode, tool, points })
    }
}

fn parse_point(p: &str) -> Result<(i32, i32), String> {
    let (x, y) = p.trim().split_once(',').ok_or_else(|| format!("bad point '{p}'"))?;
    let x = x.trim().parse().map_err(|_| format!("bad x in '{p}'"))?;
    let y = y.trim().parse().map_err(|_| format!("bad y in '{p}'"))?;
    Ok((x, y))
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the bench and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let start = Instant::now();
    match run_inner(&args) {
        Ok(()) => {
            if args.verbose {
                println!("done ({:.0}ms)", start.elapsed().as_secs_f64() * 1000.0);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_inner(args: &CliArgs) -> Result<(), String> {
    let steps = args
        .select
        .iter()
        .map(|s| s.parse::<SelectionStep>())
        .collect::<Result<Vec<_>, _>>()?;
    if args.text.is_some() && args.font.is_none() {
        return Err("--text needs --font".to_string());
    }

    let settings = args.settings();
    if args.save_settings
        && let Err(e) = settings.save()
    {
        warn!("could not save settings: {e}");
    }

    // -- Step 1: Load ----------------------------------------------------
    let mut project = Project::from_file(&args.input, settings).map_err(|e| format!("load failed: {}", e))?;
    info!("opened {}", project.display_title());
    if args.new_layer {
        let id = project.selections.add_layer();
        info!("started selection layer {id}");
    }

    // -- Step 2: Selections ----------------------------------------------
    let default_mode = project.selections.settings.active_mode;
    for step in &steps {
        apply_step(&mut project, step, default_mode)?;
    }
    for _ in 0..args.undo {
        match project.undo().map_err(|e| e.to_string())? {
            Some(desc) => println!("undo: {desc}"),
            None => break,
        }
    }
    for _ in 0..args.redo {
        match project.redo().map_err(|e| e.to_string())? {
            Some(desc) => println!("redo: {desc}"),
            None => break,
        }
    }
    if let Some(layer) = project.selections.active_layer() {
        println!("layer {}: {} px selected", layer.id(), layer.composite().count_selected());
    }

    // -- Step 3: Typeset -------------------------------------------------
    let font = match &args.font {
        Some(path) => Some(load_font(path).map_err(|e| e.to_string())?),
        None => None,
    };
    if let (Some(text), Some(font)) = (&args.text, &font) {
        match project.typeset_active(text, font) {
            Ok(placement) => {
                println!("center {:?}, line height {}, score {:.2}", placement.center, placement.line_height, placement.score);
                for line in &placement.lines {
                    println!("  {:>7.1} {:>7.1}  {}", line.origin_x, line.baseline_y, line.text);
                }
            }
            Err(e) if e.is_abort() => println!("no placement: {e}"),
            Err(e) => return Err(format!("typeset failed: {e}")),
        }
    }

    // -- Step 4: Save ----------------------------------------------------
    if let Some(output) = &args.output {
        let image = match &font {
            Some(font) => project.render(font, !args.no_overlay),
            None if args.no_overlay => project.image.clone(),
            None => project.compose_overlay(),
        };
        save(&image, output, args.quality)?;
    }
    Ok(())
}

fn apply_step(project: &mut Project, step: &SelectionStep, default_mode: SelectionMode) -> Result<(), String> {
    project.selections.settings.active_tool = step.tool;
    project.selections.settings.active_mode = step.mode.unwrap_or(default_mode);

    let Some((&(x, y), rest)) = step.points.split_first() else {
        return Ok(());
    };
    project.begin_selection(x, y).map_err(|e| e.to_string())?;
    for &(x, y) in rest {
        project.update_selection(x, y).map_err(|e| e.to_string())?;
    }
    let selected = project.finish_selection().map_err(|e| e.to_string())?;
    info!("{} ({}) -> {} px", step.tool, project.selections.settings.active_mode, selected);
    Ok(())
}

fn save(image: &image::RgbaImage, output: &Path, quality: u8) -> Result<(), String> {
    encode_and_write(image, output, SaveFormat::from_path(output), quality)
        .map_err(|e| format!("save failed: {}", e))
}
