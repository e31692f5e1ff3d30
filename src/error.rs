use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the papercraft pipeline.
#[derive(Debug, Error)]
pub enum PaperfoldError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Bake(#[from] BakeError),

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to mesh and layout geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("mesh has no triangles")]
    EmptyMesh,

    #[error("vertex index {index} out of range for {count} vertices")]
    IndexOutOfRange { index: u32, count: usize },

    #[error("layout has {layout} triangles but shell has {shell}")]
    LayoutMismatch { layout: usize, shell: usize },
}

/// Errors raised while building the containment hierarchy.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("hierarchy node not found")]
    NodeNotFound,

    #[error("structure '{0}' is not enclosed by the root shell")]
    NoEnclosingShell(String),

    #[error("cannot generate a shell for an empty structure set")]
    EmptyStructureSet,
}

/// Errors raised by a rasterizer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("degenerate camera: {0}")]
    DegenerateCamera(String),

    #[error("texture {0} is not registered in the scene")]
    MissingTexture(usize),
}

/// Errors raised by the atlas baker.
#[derive(Debug, Error)]
pub enum BakeError {
    #[error("invalid bake parameters: {0}")]
    InvalidParameters(String),

    #[error("no triangle of {triangles} could be baked")]
    NothingBaked { triangles: usize },
}

/// Errors raised while compositing the flat printable image.
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("layout has no triangles")]
    EmptyLayout,

    #[error("rendered layout contains no foreground pixels")]
    EmptyRender,

    #[error("uv mapping refers to triangle {triangle} but layout has {count}")]
    UvOutOfRange { triangle: usize, count: usize },
}

/// Errors related to reading and writing files.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode image {path}: {details}")]
    Image { path: PathBuf, details: String },
}

/// Convenience type alias for results using [`PaperfoldError`].
pub type Result<T> = std::result::Result<T, PaperfoldError>;
