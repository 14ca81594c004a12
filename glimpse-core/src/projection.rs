/// Projection parameters and screen mapping
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::matrix::Matrix4;
use crate::vector::Vector3;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    Perspective,
    /// Perspective with the far plane at infinity; `far` is ignored
    InfinitePerspective,
    Orthographic,
}

/// User-facing projection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    pub mode: ProjectionMode,
    /// Vertical field of view in degrees (perspective modes)
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Height of the visible volume in world units (orthographic mode)
    pub ortho_height: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::Perspective,
            fov_y: 60.0,
            near: 1.0,
            far: 100.0,
            ortho_height: 20.0,
        }
    }
}

impl ProjectionSettings {
    /// Build the projection matrix for a viewport aspect ratio (width / height)
    pub fn matrix(&self, aspect: f32) -> Result<Matrix4, ProjectionError> {
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(ProjectionError::AspectRatio(aspect));
        }
        match self.mode {
            ProjectionMode::Perspective => Matrix4::perspective(self.fov_y, aspect, self.near, self.far),
            ProjectionMode::InfinitePerspective => {
                if !self.fov_y.is_finite() || self.fov_y <= 0.0 || self.fov_y >= 180.0 {
                    return Err(ProjectionError::FieldOfView(self.fov_y));
                }
                let near = self.near.max(crate::matrix::MIN_NEAR);
                let top = (self.fov_y / 2.0).to_radians().tan() * near;
                let right = top * aspect;
                Matrix4::infinite_perspective(right, -right, top, -top, self.near)
            }
            ProjectionMode::Orthographic => {
                if self.ortho_height <= 0.0 {
                    return Err(ProjectionError::DegenerateVolume("orthographic height must be positive"));
                }
                let top = self.ortho_height / 2.0;
                Matrix4::orthographic(top * aspect, top, self.near, self.far)
            }
        }
    }
}

/// Validated projection for one viewport, cached until the viewport changes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    settings: ProjectionSettings,
    aspect: f32,
    matrix: Matrix4,
}

impl Projection {
    pub fn new(settings: ProjectionSettings, aspect: f32) -> Result<Self, ProjectionError> {
        let matrix = settings.matrix(aspect)?;
        Ok(Self {
            settings,
            aspect,
            matrix,
        })
    }

    pub fn matrix(&self) -> Matrix4 {
        self.matrix
    }

    pub fn settings(&self) -> &ProjectionSettings {
        &self.settings
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Rebuild for a new aspect ratio; on error the previous projection is kept
    pub fn set_aspect(&mut self, aspect: f32) -> Result<(), ProjectionError> {
        if aspect != self.aspect {
            self.matrix = self.settings.matrix(aspect)?;
            self.aspect = aspect;
        }
        Ok(())
    }

    /// Switch projection parameters; on error the previous projection is kept
    pub fn set_settings(&mut self, settings: ProjectionSettings) -> Result<(), ProjectionError> {
        self.matrix = settings.matrix(self.aspect)?;
        self.settings = settings;
        Ok(())
    }
}

/// Project a point through a model-view-projection matrix to screen space.
///
/// Returns `(x, y, depth)` with `x` in `[0, width]` and `y` in `[0, height]`
/// (y grows downwards) for points inside the clip volume's depth range.
/// Points behind the eye or outside `[-1, 1]` depth are rejected; points
/// outside the horizontal bounds are kept so partially visible triangles
/// can still be clipped by the rasterizer.
pub fn project_to_screen(mvp: &Matrix4, point: Vector3, width: u32, height: u32) -> Option<(f32, f32, f32)> {
    let [x, y, z, w] = mvp.mul_vec4([point.x, point.y, point.z, 1.0]);

    // Prevent division by near-zero or negative w (behind the eye)
    if w <= 1e-6 {
        return None;
    }

    let ndc_x = x / w;
    let ndc_y = y / w;
    let depth = z / w;

    if !(-1.0..=1.0).contains(&depth) {
        return None;
    }

    let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

    Some((screen_x, screen_y, depth))
}
