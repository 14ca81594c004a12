/// Terminal-based scene viewer
///
/// Renders a set of meshes with [`AsciiRenderer`] and steers the camera from
/// keyboard and mouse input. Input events only queue camera deltas; the view
/// is resolved once per frame.
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use glimpse_core::{Camera, InputSettings, MeshData, Projection, Transform, Vector3, ViewerConfig};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Approximate size of a terminal cell in pixels, so pointer sensitivities
/// tuned for pixel motion carry over
const CELL_WIDTH_PX: f32 = 8.0;
const CELL_HEIGHT_PX: f32 = 16.0;

/// Rows reserved for the status line
const STATUS_ROWS: u16 = 1;

/// A mesh placed in the world
pub struct SceneObject {
    pub mesh: MeshData,
    pub transform: Transform,
}

impl SceneObject {
    pub fn new(mesh: MeshData, transform: Transform) -> Self {
        Self { mesh, transform }
    }

    /// Place a mesh so its bounding box is centered on `target` and its
    /// largest extent equals `size`
    pub fn framed(mesh: MeshData, target: Vector3, size: f32) -> Self {
        let transform = match mesh.bounds() {
            Some((min, max)) => {
                let extent = max - min;
                let largest = extent.x.max(extent.y).max(extent.z);
                let scale = if largest > 0.0 { size / largest } else { 1.0 };
                let mid = (min + max) * 0.5;
                Transform::at(target - mid * scale).with_uniform_scale(scale)
            }
            None => Transform::at(target),
        };
        Self::new(mesh, transform)
    }
}

/// Convert a core error into the I/O error type the terminal loop uses
pub fn to_io_error(err: impl Into<glimpse_core::Error>) -> io::Error {
    let err: glimpse_core::Error = err.into();
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

/// Cells are about twice as tall as they are wide
fn aspect_ratio(width: u16, height: u16) -> f32 {
    width.max(1) as f32 / (height.max(1) as f32 * 2.0)
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    objects: Vec<SceneObject>,
    camera: Camera,
    projection: Projection,
    input: InputSettings,
    renderer: AsciiRenderer,
    running: bool,
    drag_origin: Option<(u16, u16)>,
    dolly_held: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(objects: Vec<SceneObject>, config: &ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Self::with_size(objects, config, width, height)
    }

    /// Build the app for a terminal of `width` x `height` cells
    pub fn with_size(
        objects: Vec<SceneObject>,
        config: &ViewerConfig,
        width: u16,
        height: u16,
    ) -> io::Result<Self> {
        let height = height.saturating_sub(STATUS_ROWS);
        let camera = config.build_camera().map_err(to_io_error)?;
        let projection = config
            .build_projection(aspect_ratio(width, height))
            .map_err(to_io_error)?;

        Ok(Self {
            objects,
            camera,
            projection,
            input: config.input,
            renderer: AsciiRenderer::new(width as usize, height as usize),
            running: true,
            drag_origin: None,
            dolly_held: false,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Drain every pending event; the camera batches them
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.update();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
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

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        let turn = self.input.key_rotation_step;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Up => self.camera.add_pitch_delta(turn),
            KeyCode::Down => self.camera.add_pitch_delta(-turn),
            KeyCode::Left => self.camera.add_yaw_delta(-turn),
            KeyCode::Right => self.camera.add_yaw_delta(turn),
            KeyCode::Char('w') => self.camera.move_forward(self.input.key_dolly_step),
            KeyCode::Char('s') => self.camera.move_backward(self.input.key_dolly_step),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        match kind {
            MouseEventKind::Down(MouseButton::Left) => self.drag_origin = Some((column, row)),
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((last_column, last_row)) = self.drag_origin {
                    let dx = (column as f32 - last_column as f32) * CELL_WIDTH_PX;
                    let dy = (row as f32 - last_row as f32) * CELL_HEIGHT_PX;
                    // dragging up looks up, dragging right turns right
                    self.camera.add_yaw_delta(dx * self.input.yaw_sensitivity);
                    self.camera.add_pitch_delta(-dy * self.input.pitch_sensitivity);
                }
                self.drag_origin = Some((column, row));
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag_origin = None,
            MouseEventKind::Down(MouseButton::Right) => self.dolly_held = true,
            MouseEventKind::Up(MouseButton::Right) => self.dolly_held = false,
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let height = height.saturating_sub(STATUS_ROWS);
        self.renderer.resize(width as usize, height as usize);
        if let Err(err) = self.projection.set_aspect(aspect_ratio(width, height)) {
            log::warn!("keeping previous projection after resize: {err}");
        }
    }

    fn update(&mut self) {
        if self.dolly_held {
            self.camera.move_forward(self.input.dolly_step);
        }
    }

    /// Resolve the camera and rasterize every object into the frame buffer
    pub fn render_frame(&mut self) -> &AsciiRenderer {
        let view = self.camera.resolve();
        let projection = self.projection.matrix();

        self.renderer.clear();
        for object in &self.objects {
            let model = object.transform.model_matrix();
            let mvp = model.pre_multiply(view).pre_multiply(projection);
            self.renderer.render_mesh(&object.mesh, &mvp, &model);
        }
        &self.renderer
    }

    fn render(&mut self) -> io::Result<()> {
        self.render_frame();

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, STATUS_ROWS))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let eye = self.camera.eye();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Glimpse | FPS: {:.1} | eye ({:.1}, {:.1}, {:.1}) | Drag=Look RightButton/W/S=Move Arrows=Turn Q=Quit",
                self.fps, eye.x, eye.y, eye.z
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn app() -> TerminalApp {
        let objects = vec![SceneObject::new(MeshData::cube(2.0), Transform::at(Vector3::new(0.0, 0.0, -10.0)))];
        TerminalApp::with_size(objects, &ViewerConfig::default(), 80, 25).unwrap()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        assert!(app.is_running());
        app.handle_event(key(KeyCode::Char('q')));
        assert!(!app.is_running());
    }

    #[test]
    fn test_keys_queue_camera_deltas() {
        let mut app = app();
        let eye = app.camera().eye();
        app.handle_event(key(KeyCode::Right));
        app.handle_event(key(KeyCode::Char('w')));
        assert!(app.camera().is_dirty());

        app.render_frame();
        assert!(!app.camera().is_dirty());
        assert_ne!(app.camera().eye(), eye);
        assert_eq!(app.camera().eye().y, eye.y);
    }

    #[test]
    fn test_drag_turns_camera() {
        let mut app = app();
        let forward = app.camera().forward();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 10, 10));
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 20, 10));
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 20, 10));
        app.render_frame();
        // turned right
        assert!(app.camera().forward().x > forward.x);

        // drags without a press are ignored
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 30, 10));
        assert!(!app.camera().is_dirty());
    }

    #[test]
    fn test_right_button_dollies_every_frame() {
        let mut app = app();
        let start = app.camera().eye();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Right), 0, 0));
        for _ in 0..10 {
            app.update();
            app.render_frame();
        }
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Right), 0, 0));
        app.update();
        assert!(!app.camera().is_dirty());
        let moved = start.sub(app.camera().eye()).magnitude();
        assert!((moved - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_render_frame_draws_object() {
        let mut app = app();
        let renderer = app.render_frame();
        let drawn = (0..renderer.height())
            .flat_map(|y| (0..renderer.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| renderer.cell(x, y) != Some(' '))
            .count();
        assert!(drawn > 0);
    }

    #[test]
    fn test_resize() {
        let mut app = app();
        app.handle_event(Event::Resize(100, 41));
        let renderer = app.render_frame();
        assert_eq!((renderer.width(), renderer.height()), (100, 40));
    }

    #[test]
    fn test_framed_object() {
        let object = SceneObject::framed(MeshData::cube(10.0), Vector3::new(0.0, 0.0, -20.0), 5.0);
        let model = object.transform.model_matrix();
        let (min, max) = object.mesh.bounds().unwrap();
        let center = model.transform_point((min + max) * 0.5);
        assert!((center.z + 20.0).abs() < 1e-4);
        let corner = model.transform_point(max);
        assert!((corner.x - 2.5).abs() < 1e-4);
    }
}
