/// 4x4 transformation matrices
///
/// Storage is column-major and vectors are pre-multiplied (`M * v`), the
/// layout OpenGL-style shaders expect:
///
/// ```text
///  sx  0  0  tx      index:  0  4  8 12
///   0 sy  0  ty              1  5  9 13
///   0  0 sz  tz              2  6 10 14
///   0  0  0   1              3  7 11 15
/// ```
///
/// Chained calls compose right-to-left: in
/// `Matrix4::identity().scale(..).rotate_y_ccw(..).translate(..).pre_multiply(view).pre_multiply(projection)`
/// the scale is the first transform a vertex sees and the projection the last.
use std::fmt;
use std::ops::Mul;

use approx::{AbsDiffEq, RelativeEq};

use crate::error::ProjectionError;
use crate::vector::{Vector3, EPSILON};

/// Below this absolute determinant a matrix is treated as singular
pub const SINGULAR_THRESHOLD: f64 = 1e-6;

/// Closest near plane accepted by the perspective builders; closer planes
/// collapse depth-buffer precision and are clamped to this value
pub const MIN_NEAR: f32 = 0.1;

#[derive(Clone, Copy, PartialEq)]
pub struct Matrix4 {
    m: [f32; 16],
}

impl Matrix4 {
    pub const IDENTITY: Self = Self::from_cols_array([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Build from 16 floats in column-major order
    pub const fn from_cols_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    /// Matrix with every element set to NaN, the sentinel for undefined results
    pub const fn nan() -> Self {
        Self { m: [f32::NAN; 16] }
    }

    pub fn to_cols_array(&self) -> [f32; 16] {
        self.m
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.m
    }

    pub fn element(&self, row: usize, col: usize) -> f32 {
        self.m[row + col * 4]
    }

    pub fn with_element(mut self, row: usize, col: usize, value: f32) -> Self {
        self.m[row + col * 4] = value;
        self
    }

    pub fn row(&self, row: usize) -> [f32; 4] {
        [
            self.element(row, 0),
            self.element(row, 1),
            self.element(row, 2),
            self.element(row, 3),
        ]
    }

    pub fn column(&self, col: usize) -> [f32; 4] {
        [
            self.element(0, col),
            self.element(1, col),
            self.element(2, col),
            self.element(3, col),
        ]
    }

    /// Upper-left 3x3 block in column-major order (rotation and scale part)
    pub fn upper_left_3x3(&self) -> [f32; 9] {
        let m = &self.m;
        [m[0], m[1], m[2], m[4], m[5], m[6], m[8], m[9], m[10]]
    }

    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|v| v.is_finite())
    }

    /// True when the last row is `[0, 0, 0, 1]`
    pub fn is_affine(&self) -> bool {
        self.row(3) == [0.0, 0.0, 0.0, 1.0]
    }

    fn product(a: &Self, b: &Self) -> Self {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[row + col * 4] = (0..4)
                    .map(|k| a.m[row + k * 4] * b.m[k + col * 4])
                    .sum();
            }
        }
        Self::from_cols_array(out)
    }

    /// `other * self`: `other` is applied after `self`
    pub fn pre_multiply(self, other: Self) -> Self {
        Self::product(&other, &self)
    }

    /// `self * other`: `other` is applied before `self`
    pub fn post_multiply(self, other: Self) -> Self {
        Self::product(&self, &other)
    }

    /* Builders */

    pub fn scaling(sx: f32, sy: f32, sz: f32) -> Self {
        let mut m = Self::IDENTITY.m;
        m[0] = sx;
        m[5] = sy;
        m[10] = sz;
        Self::from_cols_array(m)
    }

    pub fn translation(tx: f32, ty: f32, tz: f32) -> Self {
        let mut m = Self::IDENTITY.m;
        m[12] = tx;
        m[13] = ty;
        m[14] = tz;
        Self::from_cols_array(m)
    }

    pub fn rotation_x_ccw(angle_rad: f32) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        let mut m = Self::IDENTITY.m;
        m[5] = cos;
        m[6] = sin;
        m[9] = -sin;
        m[10] = cos;
        Self::from_cols_array(m)
    }

    pub fn rotation_x_cw(angle_rad: f32) -> Self {
        Self::rotation_x_ccw(-angle_rad)
    }

    pub fn rotation_y_ccw(angle_rad: f32) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        let mut m = Self::IDENTITY.m;
        m[0] = cos;
        m[2] = -sin;
        m[8] = sin;
        m[10] = cos;
        Self::from_cols_array(m)
    }

    pub fn rotation_y_cw(angle_rad: f32) -> Self {
        Self::rotation_y_ccw(-angle_rad)
    }

    pub fn rotation_z_ccw(angle_rad: f32) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        let mut m = Self::IDENTITY.m;
        m[0] = cos;
        m[1] = sin;
        m[4] = -sin;
        m[5] = cos;
        Self::from_cols_array(m)
    }

    pub fn rotation_z_cw(angle_rad: f32) -> Self {
        Self::rotation_z_ccw(-angle_rad)
    }

    /* Chaining */

    pub fn scale(self, sx: f32, sy: f32, sz: f32) -> Self {
        self.pre_multiply(Self::scaling(sx, sy, sz))
    }

    pub fn translate(self, tx: f32, ty: f32, tz: f32) -> Self {
        self.pre_multiply(Self::translation(tx, ty, tz))
    }

    pub fn rotate_x_ccw(self, angle_rad: f32) -> Self {
        self.pre_multiply(Self::rotation_x_ccw(angle_rad))
    }

    pub fn rotate_x_cw(self, angle_rad: f32) -> Self {
        self.pre_multiply(Self::rotation_x_cw(angle_rad))
    }

    pub fn rotate_y_ccw(self, angle_rad: f32) -> Self {
        self.pre_multiply(Self::rotation_y_ccw(angle_rad))
    }

    pub fn rotate_y_cw(self, angle_rad: f32) -> Self {
        self.pre_multiply(Self::rotation_y_cw(angle_rad))
    }

    pub fn rotate_z_ccw(self, angle_rad: f32) -> Self {
        self.pre_multiply(Self::rotation_z_ccw(angle_rad))
    }

    pub fn rotate_z_cw(self, angle_rad: f32) -> Self {
        self.pre_multiply(Self::rotation_z_cw(angle_rad))
    }

    /// Overwrite the translation column
    pub fn with_translation(mut self, tx: f32, ty: f32, tz: f32) -> Self {
        self.m[12] = tx;
        self.m[13] = ty;
        self.m[14] = tz;
        self
    }

    /// Add to the translation column
    pub fn add_translation(mut self, tx: f32, ty: f32, tz: f32) -> Self {
        self.m[12] += tx;
        self.m[13] += ty;
        self.m[14] += tz;
        self
    }

    /* Matrix operations */

    /// Determinant by cofactor expansion along the last row.
    ///
    /// For affine transforms that row is `[0, 0, 0, 1]`, so three of the four
    /// minors are skipped.
    pub fn determinant(&self) -> f32 {
        let a = |row: usize, col: usize| f64::from(self.element(row, col));

        let mut det = 0.0;
        for j in 0..4 {
            let entry = a(3, j);
            if entry == 0.0 {
                continue;
            }
            let mut cols = [0usize; 3];
            let mut k = 0;
            for col in (0..4).filter(|&col| col != j) {
                cols[k] = col;
                k += 1;
            }
            let [c0, c1, c2] = cols;
            let minor = a(0, c0) * (a(1, c1) * a(2, c2) - a(1, c2) * a(2, c1))
                - a(0, c1) * (a(1, c0) * a(2, c2) - a(1, c2) * a(2, c0))
                + a(0, c2) * (a(1, c0) * a(2, c1) - a(1, c1) * a(2, c0));
            // cofactor sign of (3, j) is (-1)^(3 + j)
            if j % 2 == 0 {
                det -= entry * minor;
            } else {
                det += entry * minor;
            }
        }
        det as f32
    }

    /// Inverse by the adjugate (cofactor) method, or `None` when
    /// `|det| <= SINGULAR_THRESHOLD`
    pub fn try_inverse(&self) -> Option<Self> {
        let a: [f64; 16] = self.m.map(f64::from);
        let [a00, a01, a02, a03, a10, a11, a12, a13, a20, a21, a22, a23, a30, a31, a32, a33] = a;

        let b00 = a00 * a11 - a01 * a10;
        let b01 = a00 * a12 - a02 * a10;
        let b02 = a00 * a13 - a03 * a10;
        let b03 = a01 * a12 - a02 * a11;
        let b04 = a01 * a13 - a03 * a11;
        let b05 = a02 * a13 - a03 * a12;
        let b06 = a20 * a31 - a21 * a30;
        let b07 = a20 * a32 - a22 * a30;
        let b08 = a20 * a33 - a23 * a30;
        let b09 = a21 * a32 - a22 * a31;
        let b10 = a21 * a33 - a23 * a31;
        let b11 = a22 * a33 - a23 * a32;

        let det = b00 * b11 - b01 * b10 + b02 * b09 + b03 * b08 - b04 * b07 + b05 * b06;
        if det.abs() <= SINGULAR_THRESHOLD || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;

        let out = [
            a11 * b11 - a12 * b10 + a13 * b09,
            a02 * b10 - a01 * b11 - a03 * b09,
            a31 * b05 - a32 * b04 + a33 * b03,
            a22 * b04 - a21 * b05 - a23 * b03,
            a12 * b08 - a10 * b11 - a13 * b07,
            a00 * b11 - a02 * b08 + a03 * b07,
            a32 * b02 - a30 * b05 - a33 * b01,
            a20 * b05 - a22 * b02 + a23 * b01,
            a10 * b10 - a11 * b08 + a13 * b06,
            a01 * b08 - a00 * b10 - a03 * b06,
            a30 * b04 - a31 * b02 + a33 * b00,
            a21 * b02 - a20 * b04 - a23 * b00,
            a11 * b07 - a10 * b09 - a12 * b06,
            a00 * b09 - a01 * b07 + a02 * b06,
            a31 * b01 - a30 * b03 - a32 * b00,
            a20 * b03 - a21 * b01 + a22 * b00,
        ];
        Some(Self::from_cols_array(out.map(|v| (v * inv_det) as f32)))
    }

    /// Inverse matrix; a (near) singular input yields [`Matrix4::nan`] and a
    /// logged warning
    pub fn inverse(&self) -> Self {
        self.try_inverse().unwrap_or_else(|| {
            log::warn!("inverting a singular matrix (|det| <= {SINGULAR_THRESHOLD}); result is NaN");
            Self::nan()
        })
    }

    pub fn transpose(&self) -> Self {
        let mut out = [0.0f32; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[col + row * 4] = self.m[row + col * 4];
            }
        }
        Self::from_cols_array(out)
    }

    /* Vectors */

    pub fn mul_vec4(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for (row, value) in out.iter_mut().enumerate() {
            *value = (0..4).map(|k| self.m[row + k * 4] * v[k]).sum();
        }
        out
    }

    /// Transform a point (w = 1), applying the homogeneous divide when w != 1
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        let [x, y, z, w] = self.mul_vec4([p.x, p.y, p.z, 1.0]);
        if w == 1.0 {
            Vector3::new(x, y, z)
        } else {
            Vector3::new(x / w, y / w, z / w)
        }
    }

    /// Transform a direction (w = 0), ignoring translation
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        let [x, y, z, _] = self.mul_vec4([v.x, v.y, v.z, 0.0]);
        Vector3::new(x, y, z)
    }

    /* View matrices */

    /// Right-handed look-at view matrix.
    ///
    /// `up` need not be orthogonal to the view direction; it is
    /// re-orthogonalized. Coincident `eye`/`center` or an `up` parallel to the
    /// view direction produce NaN (see [`Vector3::normalize`]).
    pub fn look_at(eye: Vector3, center: Vector3, up: Vector3) -> Self {
        let forward = eye.sub(center).normalize();
        let right = up.cross(forward).normalize();
        let up = forward.cross(right).normalize();
        Self::from_basis(right, up, forward, eye)
    }

    /// First-person view matrix from Euler angles in degrees
    pub fn fps_view(eye: Vector3, pitch_deg: f32, yaw_deg: f32) -> Self {
        let (sin_pitch, cos_pitch) = pitch_deg.to_radians().sin_cos();
        let (sin_yaw, cos_yaw) = yaw_deg.to_radians().sin_cos();

        let x_axis = Vector3::new(cos_yaw, 0.0, -sin_yaw);
        let y_axis = Vector3::new(sin_yaw * sin_pitch, cos_pitch, cos_yaw * sin_pitch);
        let z_axis = Vector3::new(sin_yaw * cos_pitch, -sin_pitch, cos_pitch * cos_yaw);
        Self::from_basis(x_axis, y_axis, z_axis, eye)
    }

    // rows are the camera axes, translation moves `eye` to the origin
    fn from_basis(x_axis: Vector3, y_axis: Vector3, z_axis: Vector3, eye: Vector3) -> Self {
        Self::from_cols_array([
            x_axis.x, y_axis.x, z_axis.x, 0.0, //
            x_axis.y, y_axis.y, z_axis.y, 0.0, //
            x_axis.z, y_axis.z, z_axis.z, 0.0, //
            -x_axis.dot(eye), -y_axis.dot(eye), -z_axis.dot(eye), 1.0,
        ])
    }

    /* Projection matrices */

    /// Perspective projection for the view volume bounded by six planes.
    ///
    /// The eye sits at the origin looking down -Z; `near` and `far` are
    /// positive distances along that axis.
    pub fn frustum(
        right: f32,
        left: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, ProjectionError> {
        check_finite(&[
            ("right", right),
            ("left", left),
            ("top", top),
            ("bottom", bottom),
            ("far", far),
        ])?;
        let near = clamp_near(near)?;
        if far <= near {
            return Err(ProjectionError::FarNotBeyondNear { near, far });
        }
        check_extents(right, left, top, bottom)?;

        let (r_l, r_plus_l) = (right - left, right + left);
        let (t_b, t_plus_b) = (top - bottom, top + bottom);
        let (f_n, f_plus_n) = (far - near, far + near);

        let mut m = [0.0; 16];
        m[0] = 2.0 * near / r_l;
        m[5] = 2.0 * near / t_b;
        m[8] = r_plus_l / r_l;
        m[9] = t_plus_b / t_b;
        m[10] = -f_plus_n / f_n;
        m[11] = -1.0;
        m[14] = -2.0 * far * near / f_n;
        Ok(Self::from_cols_array(m))
    }

    /// Symmetric perspective projection from a vertical field of view
    pub fn perspective(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Result<Self, ProjectionError> {
        check_finite(&[("fov_y", fov_y_deg), ("aspect", aspect), ("far", far)])?;
        if fov_y_deg <= 0.0 || fov_y_deg >= 180.0 {
            return Err(ProjectionError::FieldOfView(fov_y_deg));
        }
        if aspect <= 0.0 {
            return Err(ProjectionError::AspectRatio(aspect));
        }
        let near = clamp_near(near)?;

        let half_height = (fov_y_deg / 2.0).to_radians().tan() * near;
        let half_width = half_height * aspect;
        Self::frustum(half_width, -half_width, half_height, -half_height, near, far)
    }

    /// Perspective projection with the far plane at infinity
    pub fn infinite_perspective(
        right: f32,
        left: f32,
        top: f32,
        bottom: f32,
        near: f32,
    ) -> Result<Self, ProjectionError> {
        check_finite(&[("right", right), ("left", left), ("top", top), ("bottom", bottom)])?;
        let near = clamp_near(near)?;
        check_extents(right, left, top, bottom)?;

        let mut m = [0.0; 16];
        m[0] = 2.0 * near / (right - left);
        m[5] = 2.0 * near / (top - bottom);
        m[8] = (right + left) / (right - left);
        m[9] = (top + bottom) / (top - bottom);
        m[10] = -1.0;
        m[11] = -1.0;
        m[14] = -2.0 * near;
        Ok(Self::from_cols_array(m))
    }

    /// Symmetric orthographic projection of the box `[-right, right] x [-top, top] x [-near, -far]`
    pub fn orthographic(right: f32, top: f32, near: f32, far: f32) -> Result<Self, ProjectionError> {
        check_finite(&[("right", right), ("top", top), ("near", near), ("far", far)])?;
        if far <= near {
            return Err(ProjectionError::FarNotBeyondNear { near, far });
        }
        if right <= 0.0 || top <= 0.0 {
            return Err(ProjectionError::DegenerateVolume("width and height must be positive"));
        }

        let mut m = Self::IDENTITY.m;
        m[0] = 1.0 / right;
        m[5] = 1.0 / top;
        m[10] = -2.0 / (far - near);
        m[14] = -(far + near) / (far - near);
        Ok(Self::from_cols_array(m))
    }
}

fn check_finite(params: &[(&'static str, f32)]) -> Result<(), ProjectionError> {
    match params.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, _)) => Err(ProjectionError::NotFinite(*name)),
        None => Ok(()),
    }
}

fn clamp_near(near: f32) -> Result<f32, ProjectionError> {
    if !near.is_finite() {
        return Err(ProjectionError::NotFinite("near"));
    }
    if near < MIN_NEAR {
        log::warn!("near plane {near} is too close to the eye; clamping to {MIN_NEAR} to keep depth precision");
        return Ok(MIN_NEAR);
    }
    Ok(near)
}

fn check_extents(right: f32, left: f32, top: f32, bottom: f32) -> Result<(), ProjectionError> {
    if right == left {
        return Err(ProjectionError::DegenerateVolume("right equals left"));
    }
    if top == bottom {
        return Err(ProjectionError::DegenerateVolume("top equals bottom"));
    }
    Ok(())
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::product(&self, &rhs)
    }
}

impl fmt::Debug for Matrix4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries((0..4).map(|row| self.row(row))).finish()
    }
}

impl fmt::Display for Matrix4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            let [a, b, c, d] = self.row(row);
            writeln!(f, "{a:>10.4} {b:>10.4} {c:>10.4} {d:>10.4}")?;
        }
        Ok(())
    }
}

impl From<[f32; 16]> for Matrix4 {
    fn from(m: [f32; 16]) -> Self {
        Self::from_cols_array(m)
    }
}

impl From<nalgebra::Matrix4<f32>> for Matrix4 {
    fn from(m: nalgebra::Matrix4<f32>) -> Self {
        let mut out = [0.0f32; 16];
        out.copy_from_slice(m.as_slice());
        Self::from_cols_array(out)
    }
}

impl From<Matrix4> for nalgebra::Matrix4<f32> {
    fn from(m: Matrix4) -> Self {
        nalgebra::Matrix4::from_column_slice(&m.m)
    }
}

impl AbsDiffEq for Matrix4 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl RelativeEq for Matrix4 {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}
