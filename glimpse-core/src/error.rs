/// Error types for mesh construction, asset loading and camera setup
use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Any error produced by glimpse-core
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Obj(#[from] ObjError),
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Violations of the [`MeshData`](crate::MeshData) invariants
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("position buffer length {0} is not a multiple of 3")]
    PositionLength(usize),
    #[error("normal buffer holds {found} floats, expected 0 or {expected}")]
    NormalLength { found: usize, expected: usize },
    #[error("texture coordinate buffer holds {found} floats, expected 0 or {expected}")]
    TexCoordLength { found: usize, expected: usize },
    #[error("index count {0} is not a multiple of 3 (triangles only)")]
    IndexCount(usize),
    #[error("index {index} at position {at} references a mesh with {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        at: usize,
        vertex_count: usize,
    },
}

/// Failures while reading a Wavefront OBJ source
#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}:{line}: {reason}")]
    Malformed {
        file: String,
        line: usize,
        reason: String,
    },
    #[error("{file}:{line}: {kind} index {index} is out of range (file has {count} {kind} entries)")]
    IndexOutOfRange {
        file: String,
        line: usize,
        kind: &'static str,
        index: i64,
        count: usize,
    },
    #[error("{file}: no faces found")]
    NoFaces { file: String },
    #[error("{file}: {source}")]
    Mesh {
        file: String,
        #[source]
        source: MeshError,
    },
}

/// Rejected terrain parameters
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    #[error("terrain needs at least 2 slices per side, got {0}")]
    TooFewSlices(u32),
    #[error("terrain with {0} slices per side exceeds the supported maximum")]
    TooManySlices(u32),
    #[error("not enough memory for a terrain with {0} slices per side")]
    OutOfMemory(u32),
    #[error("terrain size must be finite and positive, got {0}")]
    InvalidSize(f32),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Rejected projection parameters
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("far plane ({far}) must be greater than near plane ({near})")]
    FarNotBeyondNear { near: f32, far: f32 },
    #[error("vertical field of view must lie in (0, 180) degrees, got {0}")]
    FieldOfView(f32),
    #[error("aspect ratio must be finite and positive, got {0}")]
    AspectRatio(f32),
    #[error("degenerate view volume: {0}")]
    DegenerateVolume(&'static str),
    #[error("projection parameter {0} is not finite")]
    NotFinite(&'static str),
}

/// Rejected camera placement
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CameraError {
    #[error("eye and center coincide; the view direction is undefined")]
    EyeAtCenter,
    #[error("up vector is zero or parallel to the view direction")]
    DegenerateUp,
    #[error("camera vectors must be finite")]
    NotFinite,
}

/// Failures loading a viewer configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}
