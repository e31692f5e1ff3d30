use image::Rgb;

use super::TriangleMesh;

/// How a structure is captured when its shell is baked.
///
/// `Inflate` structures sit close under a generously offset shell and are
/// rendered with a deep clipping range; `Clipping` structures only admit
/// geometry near the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMethod {
    #[default]
    Inflate,
    Clipping,
}

/// An immutable input mesh with an identity and a display colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    name: String,
    mesh: TriangleMesh,
    color: Rgb<u8>,
    projection: ProjectionMethod,
}

impl Structure {
    /// Creates a structure with a neutral grey colour.
    #[must_use]
    pub fn new(name: impl Into<String>, mesh: TriangleMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            color: Rgb([128, 128, 128]),
            projection: ProjectionMethod::default(),
        }
    }

    /// Creates a structure coloured by its load index: cyan, magenta and
    /// yellow in turn.
    #[must_use]
    pub fn indexed(name: impl Into<String>, mesh: TriangleMesh, index: usize) -> Self {
        Self::new(name, mesh).with_color(index_color(index))
    }

    /// Sets the display colour.
    #[must_use]
    pub fn with_color(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }

    /// Sets the projection method.
    #[must_use]
    pub fn with_projection(mut self, projection: ProjectionMethod) -> Self {
        self.projection = projection;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    #[must_use]
    pub fn color(&self) -> Rgb<u8> {
        self.color
    }

    #[must_use]
    pub fn projection(&self) -> ProjectionMethod {
        self.projection
    }
}

fn index_color(index: usize) -> Rgb<u8> {
    match index % 3 {
        0 => Rgb([0, 255, 255]),
        1 => Rgb([255, 0, 255]),
        _ => Rgb([255, 255, 0]),
    }
}
