/// LV3D Terminal - ASCII preview of STL models and G-code toolpaths
///
/// Controls:
///   - WASD / Arrow Keys: Rotate the model
///   - E/R: Roll rotation
///   - J/L/I/K: Orbit the camera
///   - +/-: Zoom
///   - [ / ]: Step through toolpath layers
///   - P: Toggle orthographic/perspective
///   - T: Toggle travel moves
///   - Space: Toggle auto-rotation
///   - Q/ESC: Quit
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use lv3d_core::{parse_gcode, stl, Mesh, Toolpath};
use lv3d_terminal::config::Projection;
use lv3d_terminal::{TerminalApp, ViewerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lv3d-terminal")]
#[command(author, version, about = "LV3D - terminal preview for 3D printing models")]
struct Args {
    /// STL model to show (binary or ASCII); a cube when omitted
    model: Option<PathBuf>,

    /// Slicer G-code to show as a layered toolpath
    #[arg(long, short = 'g')]
    gcode: Option<PathBuf>,

    /// Viewer configuration file
    #[arg(long, short = 'c', default_value = "lv3d.toml")]
    config: PathBuf,

    /// Write logs here instead of stderr (the preview owns the screen)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Vertical field of view in degrees
    #[arg(long)]
    fov: Option<f64>,

    /// Start in orthographic projection
    #[arg(long)]
    ortho: bool,

    /// Draw travel moves
    #[arg(long)]
    show_travel: bool,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn load_mesh(path: &Path) -> Result<Mesh> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mesh =
        stl::parse_stl(&data).with_context(|| format!("failed to parse STL {}", path.display()))?;
    tracing::info!("Loaded {} triangles from {}", mesh.len(), path.display());
    Ok(mesh)
}

fn load_toolpath(path: &Path) -> Result<Toolpath> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let toolpath =
        parse_gcode(&text).with_context(|| format!("failed to parse G-code {}", path.display()))?;
    tracing::info!(
        "Loaded {} moves in {} layers from {}",
        toolpath.len(),
        toolpath.layer_count(),
        path.display()
    );
    Ok(toolpath)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mut config = ViewerConfig::load(&args.config)?;
    if let Some(fov) = args.fov {
        config.camera.fov_y = fov;
    }
    if args.ortho {
        config.camera.projection = Projection::Orthographic;
    }
    if args.show_travel {
        config.display.show_travel = true;
    }

    let toolpath = args.gcode.as_deref().map(load_toolpath).transpose()?;
    let mesh = match &args.model {
        Some(path) => load_mesh(path)?,
        // Nothing to show at all: fall back to the demo cube
        None if toolpath.is_none() => Mesh::cube(2.0),
        None => Mesh::new(),
    };

    let mut app =
        TerminalApp::new(mesh, toolpath, config).context("failed to query the terminal size")?;
    app.run().context("terminal preview failed")?;
    Ok(())
}
