/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use lv3d_core::{
    project_to_screen, Matrix4, Mesh, SegmentKind, ToolpathSegment, Triangle, Vector4,
};
use nalgebra::Vector3;
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glyph for deposited material
const EXTRUDE_GLYPH: char = 'o';
/// Glyph for non-extruding moves
const TRAVEL_GLYPH: char = '\'';

/// Lines sit slightly in front of coplanar faces.
const LINE_DEPTH_BIAS: f64 = 1e-4;

/// ASCII renderer that converts 3D meshes and toolpaths to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f64>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f64::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocates the buffers for a new terminal size.
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f64::INFINITY);
        self.char_buffer.fill(' ');
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        if x < self.width && y < self.height {
            Some(self.char_buffer[y * self.width + x])
        } else {
            None
        }
    }

    /// Rasterizes every triangle; `model` carries normals for shading and
    /// `mvp` carries positions to clip space.
    pub fn render_mesh(&mut self, mesh: &Mesh, model: &Matrix4, mvp: &Matrix4) {
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, model, mvp);
        }
    }

    fn render_triangle(&mut self, triangle: &Triangle, model: &Matrix4, mvp: &Matrix4) {
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match self.project(mvp, &vertex.position.coords) {
                Some(p) => *slot = p,
                // Triangle is clipped
                None => return,
            }
        }

        let character = shade(&triangle.calculate_normal(), model);
        self.rasterize_triangle(&screen_coords, character);
    }

    /// Draws toolpath moves as lines; travels only when `show_travel` is set.
    pub fn render_toolpath(
        &mut self,
        segments: &[ToolpathSegment],
        mvp: &Matrix4,
        show_travel: bool,
    ) {
        for segment in segments {
            let glyph = match segment.kind {
                SegmentKind::Extrude => EXTRUDE_GLYPH,
                SegmentKind::Travel if show_travel => TRAVEL_GLYPH,
                SegmentKind::Travel => continue,
            };
            let start = self.project(mvp, &segment.start.coords);
            let end = self.project(mvp, &segment.end.coords);
            if let (Some(start), Some(end)) = (start, end) {
                self.rasterize_line(start, end, glyph);
            }
        }
    }

    fn project(&self, mvp: &Matrix4, p: &Vector3<f32>) -> Option<(f64, f64, f64)> {
        project_to_screen(
            mvp,
            [p.x as f64, p.y as f64, p.z as f64],
            self.width as u32,
            self.height as u32,
        )
    }

    fn rasterize_triangle(&mut self, coords: &[(f64, f64, f64); 3], character: char) {
        let [v0, v1, v2] = *coords;

        // Bounding box, clipped to the screen
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i64).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i64).min(self.width as i64 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i64).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f64 + 0.5, y as f64 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p)
                else {
                    continue;
                };
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                    self.plot(x as usize, y as usize, depth, character);
                }
            }
        }
    }

    /// DDA line with depth interpolated along its length.
    fn rasterize_line(&mut self, start: (f64, f64, f64), end: (f64, f64, f64), glyph: char) {
        let (dx, dy) = (end.0 - start.0, end.1 - start.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = (start.0 + dx * t).floor();
            let y = (start.1 + dy * t).floor();
            if x < 0.0 || y < 0.0 || x >= self.width as f64 || y >= self.height as f64 {
                continue;
            }
            let depth = start.2 + (end.2 - start.2) * t - LINE_DEPTH_BIAS;
            self.plot(x as usize, y as usize, depth, glyph);
        }
    }

    fn plot(&mut self, x: usize, y: usize, depth: f64, character: char) {
        let idx = y * self.width + x;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    EXTRUDE_GLYPH => Color::Yellow,
                    TRAVEL_GLYPH => Color::DarkBlue,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Ramp character for a face lit head-on from +Z in world space.
fn shade(normal: &Vector3<f32>, model: &Matrix4) -> char {
    let world = *model * Vector4::direction(normal.x as f64, normal.y as f64, normal.z as f64);
    let world = Vector3::new(world.x(), world.y(), world.z());
    let brightness = world
        .try_normalize(f64::EPSILON)
        .map_or(0.0, |n| n.dot(&Vector3::z()).max(0.0));

    let index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f64) as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f64, f64),
    v1: (f64, f64),
    v2: (f64, f64),
    p: (f64, f64),
) -> Option<(f64, f64, f64)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-9 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv3d_core::{parse_gcode, Camera, Vertex};

    fn count(renderer: &AsciiRenderer, glyph: char) -> usize {
        renderer.char_buffer.iter().filter(|&&c| c == glyph).count()
    }

    fn front_facing_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_triangle(Triangle::new(
            Vertex::new(-1.0, -1.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::new(1.0, -1.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::new(0.0, 1.0, 0.0, 0.0, 0.0, 1.0),
        ));
        mesh
    }

    #[test]
    fn test_barycentric_vertices() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (0.0, 0.0)).unwrap();
        assert_eq!((w0, w1, w2), (1.0, 0.0, 0.0));
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }

    #[test]
    fn test_facing_triangle_is_brightest() {
        let camera = Camera::new(40, 20);
        let mvp = camera.view_projection().unwrap();
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_mesh(&front_facing_triangle(), &Matrix4::IDENTITY, &mvp);

        assert!(count(&renderer, '@') > 0);
        assert_eq!(renderer.char_at(20, 10), Some('@'));
        assert_eq!(renderer.char_at(0, 0), Some(' '));
    }

    #[test]
    fn test_model_rotation_changes_shading() {
        let camera = Camera::new(40, 20);
        let model = Matrix4::rotation(60.0, 0.0, 1.0, 0.0);
        let mvp = camera.view_projection().unwrap() * model;
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_mesh(&front_facing_triangle(), &model, &mvp);

        // cos 60 = 0.5 -> middle of the ramp
        assert_eq!(count(&renderer, '@'), 0);
        assert!(count(&renderer, '=') > 0);
    }

    #[test]
    fn test_triangle_behind_the_eye_is_clipped() {
        let camera = Camera::new(40, 20);
        let mvp = camera.view_projection().unwrap() * Matrix4::IDENTITY.translated(0.0, 0.0, 10.0);
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_mesh(&front_facing_triangle(), &Matrix4::IDENTITY, &mvp);
        assert_eq!(count(&renderer, ' '), 40 * 20);
    }

    #[test]
    fn test_toolpath_glyphs() {
        let toolpath = parse_gcode("G1 X-1 Y0 Z0\nG1 X1 E1\nG0 X1 Y1\n").unwrap();
        let camera = Camera::new(40, 20);
        let mvp = camera.view_projection().unwrap();

        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_toolpath(toolpath.segments(), &mvp, false);
        assert!(count(&renderer, EXTRUDE_GLYPH) > 0);
        assert_eq!(count(&renderer, TRAVEL_GLYPH), 0);

        renderer.clear();
        renderer.render_toolpath(toolpath.segments(), &mvp, true);
        assert!(count(&renderer, TRAVEL_GLYPH) > 0);
    }

    #[test]
    fn test_lines_win_over_coplanar_faces() {
        let camera = Camera::new(40, 20);
        let mvp = camera.view_projection().unwrap();
        let toolpath = parse_gcode("G1 X-0.5 Y-0.5 Z0\nG1 X0.5 E1\n").unwrap();

        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_mesh(&front_facing_triangle(), &Matrix4::IDENTITY, &mvp);
        renderer.render_toolpath(toolpath.segments(), &mvp, false);
        assert!(count(&renderer, EXTRUDE_GLYPH) > 0);
    }

    #[test]
    fn test_clear_and_draw() {
        let mut renderer = AsciiRenderer::new(3, 2);
        renderer.plot(1, 1, 0.5, '#');
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains('#'));
        assert!(text.contains("\r\n"));

        renderer.clear();
        assert_eq!(renderer.char_at(1, 1), Some(' '));
        assert_eq!(renderer.char_at(3, 0), None);
    }
}
