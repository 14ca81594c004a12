/// Model transforms and matrix composition
use crate::matrix::Matrix4;
use crate::vector::Vector3;

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Rotation matrix applying X, then Y, then Z (counter-clockwise)
    pub fn matrix(&self) -> Matrix4 {
        Matrix4::identity()
            .rotate_x_ccw(self.x)
            .rotate_y_ccw(self.y)
            .rotate_z_ccw(self.z)
    }
}

/// Placement of a mesh in the world: scale, then rotate, then translate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3,
    pub scale: Vector3,
    pub rotation: RotationState,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::ZERO,
            scale: Vector3::splat(1.0),
            rotation: RotationState::zero(),
        }
    }

    pub fn at(position: Vector3) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vector3::splat(scale))
    }

    pub fn with_rotation(mut self, rotation: RotationState) -> Self {
        self.rotation = rotation;
        self
    }

    /// Model (world) matrix
    pub fn model_matrix(&self) -> Matrix4 {
        Matrix4::identity()
            .scale(self.scale.x, self.scale.y, self.scale.z)
            .pre_multiply(self.rotation.matrix())
            .translate(self.position.x, self.position.y, self.position.z)
    }

    /// Inverse-transpose of the model matrix's upper 3x3 block (column-major),
    /// which keeps normals perpendicular under non-uniform scaling
    pub fn normal_matrix(&self) -> [f32; 9] {
        self.model_matrix().inverse().transpose().upper_left_3x3()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a model-view-projection matrix
pub fn mvp_matrix(model: &Matrix4, view: &Matrix4, projection: &Matrix4) -> Matrix4 {
    model.pre_multiply(*view).pre_multiply(*projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_transform() {
        assert_eq!(Transform::default().model_matrix(), Matrix4::IDENTITY);
        assert_eq!(RotationState::zero().matrix(), Matrix4::IDENTITY);
    }

    #[test]
    fn test_scale_rotate_translate_order() {
        let transform = Transform::at(Vector3::new(10.0, 0.0, 0.0))
            .with_uniform_scale(2.0)
            .with_rotation(RotationState::new(0.0, FRAC_PI_2, 0.0));
        // (1,0,0) -> scale (2,0,0) -> rotate about Y (0,0,-2) -> translate (10,0,-2)
        assert_abs_diff_eq!(
            transform.model_matrix().transform_point(Vector3::X),
            Vector3::new(10.0, 0.0, -2.0),
            epsilon = 1e-5
        );
        assert!(transform.model_matrix().is_affine());
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let transform = Transform::new().with_scale(Vector3::new(1.0, 4.0, 1.0));
        let n = transform.normal_matrix();
        assert_abs_diff_eq!(n[0], 1.0);
        assert_abs_diff_eq!(n[4], 0.25);
        assert_abs_diff_eq!(n[8], 1.0);
    }

    #[test]
    fn test_mvp_matches_chained_pre_multiply() {
        let model = Transform::at(Vector3::new(1.0, 2.0, 3.0)).model_matrix();
        let view = Matrix4::look_at(Vector3::new(0.0, 5.0, 10.0), Vector3::ZERO, Vector3::Y);
        let projection = Matrix4::perspective(60.0, 1.5, 1.0, 100.0).unwrap();
        assert_eq!(mvp_matrix(&model, &view, &projection), projection * (view * model));
    }
}
