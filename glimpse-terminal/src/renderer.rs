/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use glimpse_core::{project_to_screen, Matrix4, MeshData, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light reaching faces turned away from the light
const AMBIENT: f32 = 0.15;

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    light_dir: Vector3,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            light_dir: Vector3::new(0.3, 1.0, 0.5).normalize(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self {
            light_dir: self.light_dir,
            ..Self::new(width, height)
        };
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at a cell, for inspection
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Rasterize a mesh. `mvp` maps model space to clip space; `model` is
    /// used to bring face normals into world space for shading.
    pub fn render_mesh(&mut self, mesh: &MeshData, mvp: &Matrix4, model: &Matrix4) {
        for triangle in mesh.triangles() {
            // Project vertices to screen space
            let [a, b, c] = triangle
                .vertices
                .map(|vertex| project_to_screen(mvp, vertex, self.width as u32, self.height as u32));
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                continue; // Triangle is clipped
            };

            // Calculate face normal for shading
            let normal = model.transform_vector(triangle.calculate_normal());
            let Some(normal) = normal.try_normalize() else {
                continue; // degenerate triangle
            };
            let brightness = AMBIENT + (1.0 - AMBIENT) * normal.dot(self.light_dir).max(0.0);

            // Map brightness to character
            let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
            let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);

            self.rasterize_triangle(&[a, b, c], LUMINOSITY_RAMP[char_index]);
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let [v0, v1, v2] = *coords;
        if self.width == 0 || self.height == 0 {
            return;
        }

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) = barycentric(
                    (v0.0, v0.1),
                    (v1.0, v1.1),
                    (v2.0, v2.1),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
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

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
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

    fn quad_scene() -> (MeshData, Matrix4, Matrix4) {
        let mesh = MeshData::quad();
        let model = Matrix4::identity();
        let view = Matrix4::look_at(Vector3::new(0.0, 0.0, 3.0), Vector3::ZERO, Vector3::Y);
        let projection = Matrix4::perspective(60.0, 1.0, 1.0, 10.0).unwrap();
        let mvp = model.pre_multiply(view).pre_multiply(projection);
        (mesh, mvp, model)
    }

    #[test]
    fn test_barycentric() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!((w0 - 0.5).abs() < 1e-6);
        assert!((w1 - 0.25).abs() < 1e-6);
        assert!((w2 - 0.25).abs() < 1e-6);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 0.0)).is_none());
    }

    #[test]
    fn test_render_quad_covers_center() {
        let (mesh, mvp, model) = quad_scene();
        let mut renderer = AsciiRenderer::new(40, 40);
        renderer.render_mesh(&mesh, &mvp, &model);

        let center = renderer.cell(20, 20).unwrap();
        assert_ne!(center, ' ');
        assert_eq!(renderer.cell(0, 0), Some(' '));
        assert_eq!(renderer.cell(40, 0), None);

        renderer.clear();
        assert_eq!(renderer.cell(20, 20), Some(' '));
    }

    #[test]
    fn test_triangle_behind_eye_is_skipped() {
        let (mesh, _, model) = quad_scene();
        let view = Matrix4::look_at(Vector3::new(0.0, 0.0, -3.0), Vector3::new(0.0, 0.0, -10.0), Vector3::Y);
        let projection = Matrix4::perspective(60.0, 1.0, 1.0, 10.0).unwrap();
        let mut renderer = AsciiRenderer::new(20, 20);
        renderer.render_mesh(&mesh, &model.pre_multiply(view).pre_multiply(projection), &model);
        assert!((0..20).all(|y| (0..20).all(|x| renderer.cell(x, y) == Some(' '))));
    }

    #[test]
    fn test_resize_and_draw() {
        let (mesh, mvp, model) = quad_scene();
        let mut renderer = AsciiRenderer::new(10, 10);
        renderer.resize(12, 6);
        assert_eq!((renderer.width(), renderer.height()), (12, 6));
        renderer.render_mesh(&mesh, &mvp, &model);

        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches("\r\n").count(), 5);
    }
}
