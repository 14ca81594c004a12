/// Glimpse Core Library - Math, meshes and camera logic for the scene viewer
///
/// This library provides the renderer-independent core: vector and matrix
/// algebra, mesh buffers, procedural terrain, OBJ parsing, the interactive
/// camera, projection setup and viewer configuration.

pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod matrix;
pub mod obj;
pub mod projection;
pub mod terrain;
pub mod transform;
pub mod vector;

// Re-export commonly used types
pub use camera::{Camera, CameraState};
pub use config::{CameraSettings, InputSettings, ViewerConfig};
pub use error::{CameraError, ConfigError, Error, MeshError, ObjError, ProjectionError, Result, TerrainError};
pub use geometry::{MeshData, Triangle};
pub use matrix::Matrix4;
pub use projection::{project_to_screen, Projection, ProjectionMode, ProjectionSettings};
pub use terrain::TerrainParams;
pub use transform::{mvp_matrix, RotationState, Transform};
pub use vector::{Vector2, Vector3};
