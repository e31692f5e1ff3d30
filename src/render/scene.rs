use image::{Rgb, RgbImage};

use super::WHITE;
use crate::geometry::{Structure, TriangleMesh};
use crate::math::{Point2, Point3};

/// Index of a texture registered with [`Scene::add_texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// A drawable element.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Flat-coloured triangle.
    Triangle {
        corners: [Point3; 3],
        color: Rgb<u8>,
    },
    /// Triangle sampled from a texture; `uvs` have their origin at the
    /// bottom-left of the texture with `v` growing upward.
    TexturedTriangle {
        corners: [Point3; 3],
        uvs: [Point2; 3],
        texture: TextureId,
    },
    /// Square splat of `size` pixels, unaffected by distance.
    Point {
        position: Point3,
        color: Rgb<u8>,
        size: u32,
    },
}

/// A set of primitives and the textures they sample, drawn over a
/// background colour.
#[derive(Debug, Clone)]
pub struct Scene {
    primitives: Vec<Primitive>,
    textures: Vec<RgbImage>,
    background: Rgb<u8>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(WHITE)
    }
}

impl Scene {
    #[must_use]
    pub fn new(background: Rgb<u8>) -> Self {
        Self {
            primitives: Vec::new(),
            textures: Vec::new(),
            background,
        }
    }

    /// Builds a scene showing the given structures in their own colours.
    #[must_use]
    pub fn from_structures<'a, I>(structures: I, background: Rgb<u8>) -> Self
    where
        I: IntoIterator<Item = &'a Structure>,
    {
        let mut scene = Self::new(background);
        for s in structures {
            scene.add_mesh(s.mesh(), s.color());
        }
        scene
    }

    pub fn add_triangle(&mut self, corners: [Point3; 3], color: Rgb<u8>) {
        self.primitives.push(Primitive::Triangle { corners, color });
    }

    /// Adds every triangle of `mesh` in a single colour.
    pub fn add_mesh(&mut self, mesh: &TriangleMesh, color: Rgb<u8>) {
        self.primitives.extend(
            mesh.triangles()
                .map(|corners| Primitive::Triangle { corners, color }),
        );
    }

    pub fn add_textured_triangle(&mut self, corners: [Point3; 3], uvs: [Point2; 3], texture: TextureId) {
        self.primitives.push(Primitive::TexturedTriangle {
            corners,
            uvs,
            texture,
        });
    }

    pub fn add_point(&mut self, position: Point3, color: Rgb<u8>, size: u32) {
        self.primitives.push(Primitive::Point {
            position,
            color,
            size,
        });
    }

    /// Registers a texture and returns its id.
    pub fn add_texture(&mut self, texture: RgbImage) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    #[must_use]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    #[must_use]
    pub fn texture(&self, id: TextureId) -> Option<&RgbImage> {
        self.textures.get(id.0)
    }

    #[must_use]
    pub fn background(&self) -> Rgb<u8> {
        self.background
    }
}
