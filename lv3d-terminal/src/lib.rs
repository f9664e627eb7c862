/// Terminal-based ASCII preview of meshes and toolpaths
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use lv3d_core::{Aabb, Camera, MatrixError, Mesh, ModelPlacement, ProjectionMode, Toolpath};
use nalgebra::Point3;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub mod config;
pub mod renderer;

pub use config::ViewerConfig;
pub use renderer::AsciiRenderer;

/// Degrees per frame while auto-rotating
const AUTO_ROTATE_STEP: f64 = 0.6;

/// Something a key press asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Model rotation in steps about x, y and z
    Rotate(i8, i8, i8),
    /// Camera orbit in steps of yaw and pitch
    Orbit(i8, i8),
    ZoomIn,
    ZoomOut,
    PreviousLayer,
    NextLayer,
    ToggleProjection,
    ToggleTravel,
    ToggleAutoRotate,
}

impl Action {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        let action = match code {
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,
            KeyCode::Char('w') | KeyCode::Up => Self::Rotate(1, 0, 0),
            KeyCode::Char('s') | KeyCode::Down => Self::Rotate(-1, 0, 0),
            KeyCode::Char('a') | KeyCode::Left => Self::Rotate(0, -1, 0),
            KeyCode::Char('d') | KeyCode::Right => Self::Rotate(0, 1, 0),
            KeyCode::Char('e') => Self::Rotate(0, 0, 1),
            KeyCode::Char('r') => Self::Rotate(0, 0, -1),
            KeyCode::Char('j') => Self::Orbit(-1, 0),
            KeyCode::Char('l') => Self::Orbit(1, 0),
            KeyCode::Char('i') => Self::Orbit(0, 1),
            KeyCode::Char('k') => Self::Orbit(0, -1),
            KeyCode::Char('+') | KeyCode::Char('=') => Self::ZoomIn,
            KeyCode::Char('-') => Self::ZoomOut,
            KeyCode::Char('[') => Self::PreviousLayer,
            KeyCode::Char(']') => Self::NextLayer,
            KeyCode::Char('p') => Self::ToggleProjection,
            KeyCode::Char('t') => Self::ToggleTravel,
            KeyCode::Char(' ') => Self::ToggleAutoRotate,
            _ => return None,
        };
        Some(action)
    }
}

/// What is on screen and how it is viewed, independent of the terminal.
pub struct Viewer {
    mesh: Mesh,
    toolpath: Option<Toolpath>,
    placement: ModelPlacement,
    camera: Camera,
    config: ViewerConfig,
    layer: usize,
    show_travel: bool,
    auto_rotate: bool,
}

impl Viewer {
    /// Centers the scene on the origin and frames it for a `width` x `height` cell view.
    pub fn new(
        mesh: Mesh,
        toolpath: Option<Toolpath>,
        config: ViewerConfig,
        width: u16,
        height: u16,
    ) -> Self {
        let bounds = scene_bounds(&mesh, toolpath.as_ref());
        let center = bounds.map_or([0.0; 3], |b| {
            let c = b.center();
            [c.x as f64, c.y as f64, c.z as f64]
        });

        let mut camera = Camera::new(1, 1);
        set_viewport(&mut camera, width, height);
        camera.fov_y = config.camera.fov_y;
        camera.mode = config.camera.projection.into();
        if let Some(bounds) = bounds {
            camera.frame(&centered(&bounds));
        }
        if let Some(distance) = config.camera.distance.filter(|d| *d > 0.0) {
            camera.zoom(distance / camera.distance());
        }
        if let Some(near) = config.camera.near {
            camera.near = near;
        }
        if let Some(far) = config.camera.far {
            camera.far = far;
        }

        let layer = toolpath
            .as_ref()
            .map_or(0, |t| t.layer_count().saturating_sub(1));

        Self {
            auto_rotate: toolpath.is_none(),
            show_travel: config.display.show_travel,
            placement: ModelPlacement::centered_on(center),
            mesh,
            toolpath,
            camera,
            config,
            layer,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn placement(&self) -> &ModelPlacement {
        &self.placement
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        set_viewport(&mut self.camera, width, height);
    }

    /// Applies `action`; returns `false` once the viewer should close.
    pub fn apply(&mut self, action: Action) -> bool {
        let step = self.config.controls.rotation_step;
        match action {
            Action::Quit => return false,
            Action::Rotate(x, y, z) => {
                self.placement
                    .rotation
                    .rotate(x as f64 * step, y as f64 * step, z as f64 * step);
            }
            Action::Orbit(yaw, pitch) => self.camera.orbit(yaw as f64 * step, pitch as f64 * step),
            Action::ZoomIn => self.camera.zoom(1.0 / self.config.zoom_step()),
            Action::ZoomOut => self.camera.zoom(self.config.zoom_step()),
            Action::PreviousLayer => self.layer = self.layer.saturating_sub(1),
            Action::NextLayer => {
                let last = self
                    .toolpath
                    .as_ref()
                    .map_or(0, |t| t.layer_count().saturating_sub(1));
                self.layer = (self.layer + 1).min(last);
            }
            Action::ToggleProjection => self.camera.mode = self.camera.mode.toggled(),
            Action::ToggleTravel => self.show_travel = !self.show_travel,
            Action::ToggleAutoRotate => self.auto_rotate = !self.auto_rotate,
        }
        true
    }

    /// Advances per-frame animation.
    pub fn update(&mut self) {
        if self.auto_rotate {
            self.placement
                .rotation
                .rotate(AUTO_ROTATE_STEP * 0.66, AUTO_ROTATE_STEP, 0.0);
        }
    }

    pub fn render(&self, renderer: &mut AsciiRenderer) -> Result<(), MatrixError> {
        let model = self.placement.model_matrix();
        let mvp = self.camera.view_projection()? * model;

        renderer.clear();
        renderer.render_mesh(&self.mesh, &model, &mvp);
        if let Some(toolpath) = &self.toolpath {
            renderer.render_toolpath(toolpath.up_to_layer(self.layer), &mvp, self.show_travel);
        }
        Ok(())
    }

    pub fn status(&self, fps: f32) -> String {
        let mode = match self.camera.mode {
            ProjectionMode::Perspective => "persp",
            ProjectionMode::Orthographic => "ortho",
        };
        let layer = match &self.toolpath {
            Some(toolpath) if toolpath.layer_count() > 0 => format!(
                " | Layer {}/{} z={:.2}",
                self.layer + 1,
                toolpath.layer_count(),
                toolpath.layer_height(self.layer).unwrap_or(0.0)
            ),
            _ => String::new(),
        };
        format!(
            "LV3D | FPS: {fps:.1} | {mode}{layer} | \
             WASD/ER rotate JLIK orbit +/- zoom [] layer P proj T travel Q quit"
        )
    }
}

/// Terminal cells are about twice as tall as they are wide.
fn set_viewport(camera: &mut Camera, width: u16, height: u16) {
    camera.set_viewport(width as u32, height as u32 * 2);
}

fn scene_bounds(mesh: &Mesh, toolpath: Option<&Toolpath>) -> Option<Aabb> {
    let toolpath_bounds = toolpath.and_then(Toolpath::bounds);
    match (mesh.bounds(), toolpath_bounds) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, b) => a.or(b),
    }
}

fn centered(bounds: &Aabb) -> Aabb {
    let offset = bounds.center().coords;
    Aabb::new(
        Point3::from(bounds.min.coords - offset),
        Point3::from(bounds.max.coords - offset),
    )
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    viewer: Viewer,
    renderer: AsciiRenderer,
    target_frame_time: Duration,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    message: Option<String>,
}

impl TerminalApp {
    pub fn new(mesh: Mesh, toolpath: Option<Toolpath>, config: ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let target_frame_time = Duration::from_millis(1000 / config.target_fps() as u64);

        Ok(Self {
            viewer: Viewer::new(mesh, toolpath, config, width, height),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            target_frame_time,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            message: None,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        info!("terminal preview started");

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.viewer.update();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                if let Some(action) = Action::from_key(code) {
                    self.running = self.viewer.apply(action);
                }
            }
            Event::Resize(width, height) => {
                self.renderer.resize(width as usize, height as usize);
                self.viewer.resize(width, height);
            }
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        match self.viewer.render(&mut self.renderer) {
            Ok(()) => self.message = None,
            Err(err) => {
                if self.message.is_none() {
                    warn!(%err, "skipping frame");
                }
                self.message = Some(err.to_string());
            }
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let status = match &self.message {
            Some(message) => format!("LV3D | {message}"),
            None => self.viewer.status(self.fps),
        };
        let status: String = status.chars().take(self.renderer.width()).collect();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(status),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv3d_core::parse_gcode;

    const LAYERS: &str = "G1 Z0.2\nG1 X10 E1\nG1 Z0.4\nG1 X0 E2\nG1 Z0.6\nG1 X10 E3\n";

    fn viewer_with_toolpath() -> Viewer {
        let toolpath = parse_gcode(LAYERS).unwrap();
        Viewer::new(Mesh::new(), Some(toolpath), ViewerConfig::default(), 80, 24)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Action::from_key(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(Action::from_key(KeyCode::Up), Some(Action::Rotate(1, 0, 0)));
        assert_eq!(Action::from_key(KeyCode::Char('p')), Some(Action::ToggleProjection));
        assert_eq!(Action::from_key(KeyCode::Char('z')), None);
    }

    #[test]
    fn test_cube_is_centered_and_framed() {
        let viewer = Viewer::new(Mesh::cube(2.0), None, ViewerConfig::default(), 80, 24);
        assert!(viewer.auto_rotate());
        assert_eq!(viewer.camera().center, Point3::origin());
        assert!(viewer.camera().distance() > 1.0);
    }

    #[test]
    fn test_layer_stepping_clamps() {
        let mut viewer = viewer_with_toolpath();
        assert!(!viewer.auto_rotate());
        assert_eq!(viewer.layer(), 2);

        viewer.apply(Action::NextLayer);
        assert_eq!(viewer.layer(), 2);
        for _ in 0..5 {
            viewer.apply(Action::PreviousLayer);
        }
        assert_eq!(viewer.layer(), 0);
        assert!(viewer.status(30.0).contains("Layer 1/3"));
    }

    #[test]
    fn test_rotation_uses_configured_step() {
        let mut viewer = Viewer::new(Mesh::cube(1.0), None, ViewerConfig::default(), 80, 24);
        viewer.apply(Action::Rotate(0, 1, 0));
        viewer.apply(Action::Rotate(0, 1, 0));
        assert_eq!(viewer.placement().rotation.y, 10.0);
    }

    #[test]
    fn test_zoom_in_then_out_restores_distance() {
        let mut viewer = Viewer::new(Mesh::cube(1.0), None, ViewerConfig::default(), 80, 24);
        let before = viewer.camera().distance();
        viewer.apply(Action::ZoomIn);
        assert!(viewer.camera().distance() < before);
        viewer.apply(Action::ZoomOut);
        assert!((viewer.camera().distance() - before).abs() < 1e-9);
    }

    #[test]
    fn test_configured_distance() {
        let mut config = ViewerConfig::default();
        config.camera.distance = Some(20.0);
        let viewer = Viewer::new(Mesh::cube(1.0), None, config, 80, 24);
        assert!((viewer.camera().distance() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_quit_and_projection_toggle() {
        let mut viewer = Viewer::new(Mesh::cube(1.0), None, ViewerConfig::default(), 80, 24);
        assert!(viewer.apply(Action::ToggleProjection));
        assert_eq!(viewer.camera().mode, ProjectionMode::Orthographic);
        assert!(viewer.status(0.0).contains("ortho"));
        assert!(!viewer.apply(Action::Quit));
    }

    #[test]
    fn test_render_draws_the_cube() {
        let viewer = Viewer::new(Mesh::cube(2.0), None, ViewerConfig::default(), 40, 20);
        let mut renderer = AsciiRenderer::new(40, 20);
        viewer.render(&mut renderer).unwrap();
        assert_ne!(renderer.char_at(20, 10), Some(' '));
    }

    #[test]
    fn test_degenerate_clip_planes_are_reported() {
        let mut config = ViewerConfig::default();
        config.camera.projection = config::Projection::Orthographic;
        config.camera.near = Some(1.0);
        config.camera.far = Some(1.0);
        let viewer = Viewer::new(Mesh::cube(1.0), None, config, 40, 20);
        let mut renderer = AsciiRenderer::new(40, 20);
        assert!(viewer.render(&mut renderer).is_err());
    }
}
