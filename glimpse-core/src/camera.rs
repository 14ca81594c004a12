/// Interactive look-at camera with deferred updates
///
/// Input handlers call [`Camera::add_pitch_delta`], [`Camera::add_yaw_delta`]
/// and [`Camera::add_dolly`] as events arrive; they only accumulate. The view
/// matrix is recomputed once per frame by [`Camera::resolve`], so any number
/// of events between two frames costs a single rebuild.
///
/// Pitch and yaw are orbit angles around the fixed look-at frame of
/// `eye`/`center`/`up`: the view is `look_at(eye, center, up)` pre-multiplied
/// by the yaw rotation, then by the pitch rotation. They persist across
/// frames. A dolly walks `eye` along the horizontal heading of the current
/// view, re-aims `center` along that heading and resets yaw; pitch is kept.
use crate::error::CameraError;
use crate::matrix::Matrix4;
use crate::vector::Vector3;

/// Minimum sine of the angle between `up` and the view direction
const PARALLEL_TOLERANCE: f32 = 1e-4;

/// Whether the cached view matrix reflects all accumulated input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Clean,
    Dirty,
}

#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vector3,
    center: Vector3,
    up: Vector3,
    /// Radians
    pitch: f32,
    /// Radians
    yaw: f32,
    pending_dolly: f32,
    view: Matrix4,
    state: CameraState,
}

impl Camera {
    /// Camera at `eye` looking at `center`, with `up` fixing the roll
    pub fn new(eye: Vector3, center: Vector3, up: Vector3) -> Result<Self, CameraError> {
        if !(eye.is_finite() && center.is_finite() && up.is_finite()) {
            return Err(CameraError::NotFinite);
        }
        if eye == center {
            return Err(CameraError::EyeAtCenter);
        }
        if !aim_is_valid(eye, center, up) {
            return Err(CameraError::DegenerateUp);
        }

        Ok(Self {
            eye,
            center,
            up,
            pitch: 0.0,
            yaw: 0.0,
            pending_dolly: 0.0,
            view: Matrix4::look_at(eye, center, up),
            state: CameraState::Clean,
        })
    }

    pub fn eye(&self) -> Vector3 {
        self.eye
    }

    /// Look-at target the orbit angles are measured from
    pub fn center(&self) -> Vector3 {
        self.center
    }

    pub fn up(&self) -> Vector3 {
        self.up
    }

    /// Distance between eye and center
    pub fn distance(&self) -> f32 {
        self.center.sub(self.eye).magnitude()
    }

    /// Accumulated orbit pitch in radians
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Accumulated orbit yaw in radians
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// World-space view direction of the cached view matrix
    pub fn forward(&self) -> Vector3 {
        forward_of(&self.view)
    }

    /// View matrix as of the last [`Camera::resolve`]
    pub fn view_matrix(&self) -> Matrix4 {
        self.view
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == CameraState::Dirty
    }

    /// Queue a rotation about the camera's horizontal axis; positive looks up
    pub fn add_pitch_delta(&mut self, degrees: f32) {
        if accept("pitch", degrees) {
            self.pitch += degrees.to_radians();
            self.state = CameraState::Dirty;
        }
    }

    /// Queue a rotation about the camera's vertical axis; positive turns right
    pub fn add_yaw_delta(&mut self, degrees: f32) {
        if accept("yaw", degrees) {
            self.yaw += degrees.to_radians();
            self.state = CameraState::Dirty;
        }
    }

    /// Queue a horizontal move along the view direction; negative moves back
    pub fn add_dolly(&mut self, distance: f32) {
        if accept("dolly", distance) {
            self.pending_dolly += distance;
            self.state = CameraState::Dirty;
        }
    }

    pub fn move_forward(&mut self, step: f32) {
        self.add_dolly(step);
    }

    pub fn move_backward(&mut self, step: f32) {
        self.add_dolly(-step);
    }

    /// Apply all pending input and return the up-to-date view matrix.
    ///
    /// Calling this while clean returns the cached matrix untouched.
    pub fn resolve(&mut self) -> Matrix4 {
        if self.state == CameraState::Clean {
            return self.view;
        }

        let pitch = Matrix4::rotation_x_cw(self.pitch);
        self.view = self.orbit_view().pre_multiply(pitch);

        if self.pending_dolly != 0.0 {
            let step = self.pending_dolly;
            let forward = forward_of(&self.view);
            let horizontal = Vector3::new(forward.x, 0.0, forward.z);

            if horizontal.magnitude() <= PARALLEL_TOLERANCE {
                log::warn!("camera is looking straight up or down; dolly skipped");
            } else {
                let heading = horizontal.normalize();
                let offset = self.center.sub(self.eye);
                let reach = Vector3::new(offset.x, 0.0, offset.z).magnitude();

                let eye = self.eye.add(heading.scale(step));
                // same height offset and horizontal reach, along the new heading
                let center = eye.add(heading.scale(reach)).add(Vector3::new(0.0, offset.y, 0.0));

                if aim_is_valid(eye, center, self.up) {
                    self.eye = eye;
                    self.center = center;
                    self.yaw = 0.0;
                    self.view = Matrix4::look_at(eye, center, self.up).pre_multiply(pitch);
                } else {
                    log::warn!("dolly would align the view direction with up {}; skipped", self.up);
                }
            }
        }

        self.pending_dolly = 0.0;
        self.state = CameraState::Clean;

        log::trace!(
            "camera resolved: eye {} center {} pitch {} yaw {}",
            self.eye,
            self.center,
            self.pitch,
            self.yaw
        );
        self.view
    }

    fn orbit_view(&self) -> Matrix4 {
        Matrix4::look_at(self.eye, self.center, self.up).pre_multiply(Matrix4::rotation_y_ccw(self.yaw))
    }
}

// row 2 of a view matrix is the world-space backward axis
fn forward_of(view: &Matrix4) -> Vector3 {
    let [bx, by, bz, _] = view.row(2);
    Vector3::new(-bx, -by, -bz)
}

fn accept(kind: &str, delta: f32) -> bool {
    if !delta.is_finite() {
        log::warn!("ignoring non-finite camera {kind} delta {delta}");
        return false;
    }
    true
}

fn aim_is_valid(eye: Vector3, center: Vector3, up: Vector3) -> bool {
    match (center.sub(eye).try_normalize(), up.try_normalize()) {
        (Some(direction), Some(up)) => up.cross(direction).magnitude() > PARALLEL_TOLERANCE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn demo_camera() -> Camera {
        Camera::new(Vector3::new(0.0, 3.0, 0.0), Vector3::new(0.0, 0.0, -20.0), Vector3::Y).unwrap()
    }

    fn origin_camera() -> Camera {
        Camera::new(Vector3::ZERO, Vector3::new(0.0, 0.0, -10.0), Vector3::Y).unwrap()
    }

    fn orbit_matrix(camera: &Camera, yaw_deg: f32, pitch_deg: f32) -> Matrix4 {
        Matrix4::look_at(camera.eye(), camera.center(), camera.up())
            .pre_multiply(Matrix4::rotation_y_ccw(yaw_deg.to_radians()))
            .pre_multiply(Matrix4::rotation_x_cw(pitch_deg.to_radians()))
    }

    #[test]
    fn test_camera_creation() {
        let camera = demo_camera();
        assert_eq!(camera.state(), CameraState::Clean);
        assert!(!camera.is_dirty());
        assert_eq!(
            camera.view_matrix(),
            Matrix4::look_at(camera.eye(), camera.center(), camera.up())
        );
        assert_abs_diff_eq!(camera.forward(), Vector3::new(0.0, -3.0, -20.0).normalize(), epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_camera_is_rejected() {
        let up = Vector3::Y;
        assert_eq!(
            Camera::new(Vector3::X, Vector3::X, up).unwrap_err(),
            CameraError::EyeAtCenter
        );
        assert_eq!(
            Camera::new(Vector3::ZERO, Vector3::new(0.0, 5.0, 0.0), up).unwrap_err(),
            CameraError::DegenerateUp
        );
        assert_eq!(
            Camera::new(Vector3::ZERO, Vector3::Z, Vector3::ZERO).unwrap_err(),
            CameraError::DegenerateUp
        );
        assert_eq!(
            Camera::new(Vector3::new(f32::NAN, 0.0, 0.0), Vector3::Z, up).unwrap_err(),
            CameraError::NotFinite
        );
    }

    #[test]
    fn test_orbit_is_look_at_times_yaw_then_pitch() {
        let mut camera = demo_camera();
        let initial = camera.view_matrix();

        camera.add_yaw_delta(10.0);
        camera.add_pitch_delta(5.0);
        assert!(camera.is_dirty());

        let first = camera.resolve();
        assert_eq!(first, orbit_matrix(&camera, 10.0, 5.0));
        assert_ne!(first, initial);
        assert_eq!(camera.state(), CameraState::Clean);
        // the pitched base frame rolls the right axis out of the horizontal plane
        assert!(first.row(0)[1].abs() > 1e-3);
        // orbiting leaves the look-at frame alone
        assert_eq!(camera.eye(), Vector3::new(0.0, 3.0, 0.0));
        assert_eq!(camera.center(), Vector3::new(0.0, 0.0, -20.0));

        let second = camera.resolve();
        assert_eq!(first, second);
        assert_eq!(camera.view_matrix(), first);
    }

    #[test]
    fn test_orbit_accumulates_across_frames() {
        let mut stepped = demo_camera();
        stepped.add_yaw_delta(5.0);
        stepped.resolve();
        stepped.add_yaw_delta(5.0);
        stepped.add_pitch_delta(-3.0);
        stepped.resolve();

        let mut single = demo_camera();
        single.add_yaw_delta(10.0);
        single.add_pitch_delta(-3.0);

        assert_abs_diff_eq!(stepped.view_matrix(), single.resolve(), epsilon = 1e-6);
        assert_abs_diff_eq!(stepped.yaw(), 10.0f32.to_radians(), epsilon = 1e-6);
    }

    #[test]
    fn test_dolly_moves_horizontally() {
        let mut camera = demo_camera();
        let start = camera.eye();
        let target = camera.center();

        camera.add_dolly(1.0);
        camera.resolve();

        let eye = camera.eye();
        assert_eq!(eye.y, start.y);
        assert!(eye.square_distance(target) < start.square_distance(target));
        assert_abs_diff_eq!(eye, Vector3::new(0.0, 3.0, -1.0), epsilon = 1e-5);
        assert_abs_diff_eq!(camera.center(), Vector3::new(0.0, 0.0, -21.0), epsilon = 1e-4);
    }

    #[test]
    fn test_dolly_backward() {
        let mut camera = origin_camera();
        camera.move_backward(2.0);
        camera.resolve();
        assert_abs_diff_eq!(camera.eye(), Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-5);
        assert_abs_diff_eq!(camera.center(), Vector3::new(0.0, 0.0, -8.0), epsilon = 1e-5);
    }

    #[test]
    fn test_yaw_turns_right() {
        let mut camera = origin_camera();
        camera.add_yaw_delta(90.0);
        camera.resolve();
        assert_abs_diff_eq!(camera.forward(), Vector3::X, epsilon = 1e-6);
        assert_eq!(camera.eye(), Vector3::ZERO);
        assert_eq!(camera.center(), Vector3::new(0.0, 0.0, -10.0));
    }

    #[test]
    fn test_pitch_looks_up() {
        let mut camera = origin_camera();
        camera.add_pitch_delta(30.0);
        camera.resolve();
        let (sin, cos) = 30.0f32.to_radians().sin_cos();
        assert_abs_diff_eq!(camera.forward(), Vector3::new(0.0, sin, -cos), epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_past_vertical_keeps_rotating() {
        let mut camera = origin_camera();
        camera.add_pitch_delta(120.0);
        let view = camera.resolve();
        assert!(view.is_finite());
        assert_eq!(view, orbit_matrix(&camera, 0.0, 120.0));
        // over the top: looking backwards and upside down
        let (sin, cos) = 120.0f32.to_radians().sin_cos();
        assert_abs_diff_eq!(camera.forward(), Vector3::new(0.0, sin, -cos), epsilon = 1e-6);
        assert!(view.row(1)[1] < 0.0);
    }

    #[test]
    fn test_dolly_follows_heading_and_resets_yaw() {
        let mut camera = origin_camera();
        camera.add_yaw_delta(90.0);
        camera.add_dolly(3.0);
        camera.resolve();

        assert_abs_diff_eq!(camera.eye(), Vector3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(camera.center(), Vector3::new(13.0, 0.0, 0.0), epsilon = 1e-4);
        assert_eq!(camera.yaw(), 0.0);
        assert_abs_diff_eq!(camera.forward(), Vector3::X, epsilon = 1e-6);
        assert_abs_diff_eq!(
            camera.view_matrix(),
            Matrix4::look_at(camera.eye(), camera.center(), camera.up()),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_dolly_keeps_pitch() {
        let mut camera = origin_camera();
        camera.add_pitch_delta(20.0);
        camera.add_dolly(1.0);
        camera.resolve();

        assert_abs_diff_eq!(camera.eye(), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
        assert_abs_diff_eq!(camera.pitch(), 20.0f32.to_radians());
        assert_eq!(camera.view_matrix(), orbit_matrix(&camera, 0.0, 20.0));
        let (sin, cos) = 20.0f32.to_radians().sin_cos();
        assert_abs_diff_eq!(camera.forward(), Vector3::new(0.0, sin, -cos), epsilon = 1e-6);
    }

    #[test]
    fn test_dolly_while_looking_straight_up_is_skipped() {
        let mut camera = origin_camera();
        camera.add_pitch_delta(90.0);
        camera.add_dolly(1.0);
        let view = camera.resolve();
        assert!(view.is_finite());
        assert_eq!(camera.eye(), Vector3::ZERO);
        assert!(!camera.is_dirty());
    }

    #[test]
    fn test_deltas_are_batched() {
        let mut batched = demo_camera();
        batched.add_yaw_delta(5.0);
        batched.add_yaw_delta(5.0);
        batched.add_dolly(0.5);
        batched.add_dolly(0.5);

        let mut combined = demo_camera();
        combined.add_yaw_delta(10.0);
        combined.add_dolly(1.0);

        assert_abs_diff_eq!(batched.resolve(), combined.resolve(), epsilon = 1e-5);
    }

    #[test]
    fn test_non_finite_deltas_are_ignored() {
        let mut camera = demo_camera();
        camera.add_pitch_delta(f32::NAN);
        camera.add_yaw_delta(f32::INFINITY);
        camera.add_dolly(f32::NEG_INFINITY);
        assert!(!camera.is_dirty());
        assert!(camera.resolve().is_finite());
    }

    #[test]
    fn test_orbit_round_trip() {
        let mut camera = demo_camera();
        let start = camera.view_matrix();
        camera.add_yaw_delta(25.0);
        camera.add_pitch_delta(15.0);
        camera.resolve();
        camera.add_yaw_delta(-25.0);
        camera.add_pitch_delta(-15.0);
        camera.resolve();
        assert_abs_diff_eq!(camera.view_matrix(), start, epsilon = 1e-5);
    }
}
