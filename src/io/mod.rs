//! Mesh and image file I/O: STL in and out, OFF out, PNG out.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use image::RgbImage;
use tracing::{debug, info};

use crate::error::{GeometryError, IoError, Result};
use crate::geometry::{Layout, Structure, TriangleMesh};
use crate::math::{triangle_normal, Point3};

fn read_error(path: &Path, source: std::io::Error) -> IoError {
    IoError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path, source: std::io::Error) -> IoError {
    IoError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Loads a triangle mesh from a binary or ASCII STL file.
///
/// # Errors
///
/// Returns `IoError::Read` if the file cannot be opened or parsed, and
/// `GeometryError::EmptyMesh` if it holds no triangles.
pub fn read_stl(path: &Path) -> Result<TriangleMesh> {
    info!("Loading mesh from {:?}", path);
    let file = File::open(path).map_err(|e| read_error(path, e))?;
    let mut reader = BufReader::new(file);
    let stl = stl_io::read_stl(&mut reader).map_err(|e| read_error(path, e))?;
    debug!(
        "STL contains {} vertices, {} triangles",
        stl.vertices.len(),
        stl.faces.len()
    );

    let vertices: Vec<Point3> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(f64::from(v.0[0]), f64::from(v.0[1]), f64::from(v.0[2])))
        .collect();
    let mut indices = Vec::with_capacity(stl.faces.len());
    for face in &stl.faces {
        let mut tri = [0_u32; 3];
        for (slot, &index) in tri.iter_mut().zip(&face.vertices) {
            *slot = u32::try_from(index).map_err(|_| GeometryError::IndexOutOfRange {
                index: u32::MAX,
                count: vertices.len(),
            })?;
        }
        indices.push(tri);
    }

    let mesh = TriangleMesh::new(vertices, indices)?;
    if mesh.is_empty() {
        return Err(GeometryError::EmptyMesh.into());
    }
    info!(
        "Loaded mesh: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Loads the `index`-th input structure, named after the file stem and
/// coloured by its index.
///
/// # Errors
///
/// Same as [`read_stl`].
pub fn read_structure(path: &Path, index: usize) -> Result<Structure> {
    let mesh = read_stl(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map_or_else(|| format!("structure{index}"), String::from);
    Ok(Structure::indexed(name, mesh, index))
}

/// Saves a mesh as binary STL.
///
/// # Errors
///
/// Returns `IoError::Write` if the file cannot be created or written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_stl(mesh: &TriangleMesh, path: &Path) -> Result<()> {
    info!("Saving mesh to {:?}", path);
    let file = File::create(path).map_err(|e| write_error(path, e))?;
    let mut writer = BufWriter::new(file);

    let vertex = |p: &Point3| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|tri| {
            let n = triangle_normal(&tri).map_or([0.0; 3], |n| [n.x as f32, n.y as f32, n.z as f32]);
            stl_io::Triangle {
                normal: stl_io::Normal::new(n),
                vertices: [vertex(&tri[0]), vertex(&tri[1]), vertex(&tri[2])],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| write_error(path, e))?;
    writer.flush().map_err(|e| write_error(path, e))?;
    info!("Saved {} triangles to {:?}", triangles.len(), path);
    Ok(())
}

/// Saves a mesh in OFF format.
///
/// # Errors
///
/// Returns `IoError::Write` if the file cannot be created or written.
pub fn write_off(mesh: &TriangleMesh, path: &Path) -> Result<()> {
    let points: Vec<[f64; 3]> = mesh.vertices.iter().map(|p| [p.x, p.y, p.z]).collect();
    write_off_raw(&points, &mesh.indices, path)
}

/// Saves an unfolded layout in OFF format, one vertex triple per triangle on
/// the `z = 0` plane.
///
/// # Errors
///
/// Returns `IoError::Write` if the file cannot be created or written.
pub fn write_layout_off(layout: &Layout, path: &Path) -> Result<()> {
    let points: Vec<[f64; 3]> = layout
        .triangles()
        .iter()
        .flat_map(|tri| tri.iter().map(|p| [p.x, p.y, 0.0]))
        .collect();
    let mut faces = Vec::with_capacity(layout.triangle_count());
    let mut next = 0_u32;
    for _ in layout.triangles() {
        faces.push([next, next + 1, next + 2]);
        next += 3;
    }
    write_off_raw(&points, &faces, path)
}

fn write_off_raw(points: &[[f64; 3]], faces: &[[u32; 3]], path: &Path) -> Result<()> {
    info!("Saving mesh to {:?} (OFF format)", path);
    let file = File::create(path).map_err(|e| write_error(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut emit = || -> std::io::Result<()> {
        writeln!(writer, "OFF")?;
        writeln!(writer, "{} {} 0", points.len(), faces.len())?;
        for [x, y, z] in points {
            writeln!(writer, "{x} {y} {z}")?;
        }
        for [a, b, c] in faces {
            writeln!(writer, "3 {a} {b} {c}")?;
        }
        writer.flush()
    };
    emit().map_err(|e| write_error(path, e))?;
    debug!("Saved {} vertices, {} faces", points.len(), faces.len());
    Ok(())
}

/// Saves an image as PNG.
///
/// # Errors
///
/// Returns `IoError::Image` if encoding or writing fails.
pub fn write_png(image: &RgbImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| IoError::Image {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
    info!(
        "Saved {}x{} image to {:?}",
        image.width(),
        image.height(),
        path
    );
    Ok(())
}
