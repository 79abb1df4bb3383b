//! Wavefront OBJ loading.
//!
//! Parsing is done by `tobj` with its GPU preset (single index buffer,
//! polygons triangulated). Each face gets a flat normal. A mesh whose
//! material carries a diffuse colour is drawn in that colour, everything
//! else in the configured one.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use glam::Vec3;
use thiserror::Error;

use crate::mesh::{Mesh, Topology};

/// Errors that can occur while loading a model.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("invalid model content: {message}")]
    InvalidContent { message: String },

    #[error("model contains no faces")]
    Empty,

    #[error("failed to parse OBJ: {0}")]
    Obj(#[from] tobj::LoadError),
}

/// Load an OBJ file (and its MTL library, if any) as a triangle mesh.
pub fn load_obj<P: AsRef<Path>>(path: P, color: [f32; 3]) -> Result<Mesh, ModelLoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ModelLoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
    let materials = materials.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Failed to load materials");
        Vec::new()
    });

    let mesh = build_mesh(&models, &materials, color)?;
    tracing::info!(
        path = %path.display(),
        objects = models.len(),
        materials = materials.len(),
        triangles = mesh.indices.len() / 3,
        "Loaded model"
    );
    Ok(mesh)
}

/// Parse OBJ text from a buffered reader.
///
/// `load_material` resolves `mtllib` references; pass
/// `|_| Ok(Default::default())` to ignore them.
pub fn parse_obj<R, ML>(
    reader: &mut R,
    color: [f32; 3],
    load_material: ML,
) -> Result<Mesh, ModelLoadError>
where
    R: BufRead,
    ML: Fn(&Path) -> tobj::MTLLoadResult,
{
    let (models, materials) =
        tobj::load_obj_buf(reader, &tobj::GPU_LOAD_OPTIONS, load_material)?;
    let materials = materials.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load materials");
        Vec::new()
    });
    build_mesh(&models, &materials, color)
}

fn build_mesh(
    models: &[tobj::Model],
    materials: &[tobj::Material],
    fallback: [f32; 3],
) -> Result<Mesh, ModelLoadError> {
    let mut out = Mesh::new(Topology::Triangles);

    for model in models {
        let mesh = &model.mesh;
        let color = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .and_then(|m| m.diffuse)
            .unwrap_or(fallback);

        let vertex_count = mesh.positions.len() / 3;
        let position = |i: u32| -> Result<Vec3, ModelLoadError> {
            let i = i as usize;
            if i >= vertex_count {
                return Err(ModelLoadError::InvalidContent {
                    message: format!(
                        "object '{}' index {i} out of range ({vertex_count} vertices)",
                        model.name
                    ),
                });
            }
            Ok(Vec3::from_slice(&mesh.positions[i * 3..i * 3 + 3]))
        };

        for tri in mesh.indices.chunks_exact(3) {
            out.push_triangle(position(tri[0])?, position(tri[1])?, position(tri[2])?, color);
        }
    }

    if out.is_empty() {
        return Err(ModelLoadError::Empty);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const GREEN: [f32; 3] = [0.1, 0.3, 0.1];

    fn parse(text: &str) -> Result<Mesh, ModelLoadError> {
        parse_obj(&mut Cursor::new(text), GREEN, |_| Ok(Default::default()))
    }

    #[test]
    fn single_triangle() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.indices.len(), 3);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert!(mesh.vertices.iter().all(|v| v.color == GREEN));
    }

    #[test]
    fn quad_is_triangulated() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = parse(text).unwrap();
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn slash_forms_and_negative_indices() {
        let text = "\
# comment
o body
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vn 0 0 1
f 1/1/1 2/1/1 3/1/1
f -3/-1/-1 -2/-1/-1 -1/-1/-1
";
        let mesh = parse(text).unwrap();
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.vertices[3].position, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[5].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn material_diffuse_overrides_configured_color() {
        let obj = "\
mtllib paint.mtl
o plain
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o red
v 0 0 1
v 1 0 1
v 0 1 1
usemtl red
f 4 5 6
";
        let mtl = "newmtl red\nKd 0.8 0.1 0.1\n";
        let mesh = parse_obj(&mut Cursor::new(obj), GREEN, |_| {
            tobj::load_mtl_buf(&mut Cursor::new(mtl))
        })
        .unwrap();

        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices[..3].iter().all(|v| v.color == GREEN));
        assert!(mesh.vertices[3..].iter().all(|v| v.color == [0.8, 0.1, 0.1]));
    }

    #[test]
    fn missing_material_library_keeps_configured_color() {
        let obj = "mtllib gone.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl x\nf 1 2 3\n";
        let mesh = parse_obj(&mut Cursor::new(obj), GREEN, |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .unwrap();
        assert!(mesh.vertices.iter().all(|v| v.color == GREEN));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        assert!(parse("v 0 0 0\nv 1 0 0\nf 1 2 3\n").is_err());
    }

    #[test]
    fn bad_coordinate_is_a_parse_error() {
        let err = parse("v 0 zero 0\nf 1 1 1\n").unwrap_err();
        assert!(matches!(err, ModelLoadError::Obj(_)));
    }

    #[test]
    fn no_faces_is_empty() {
        assert!(matches!(parse("v 0 0 0\n"), Err(ModelLoadError::Empty)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("teapot-renderer-missing-model.obj");
        let err = load_obj(&path, GREEN).unwrap_err();
        assert!(matches!(err, ModelLoadError::NotFound { path: p } if p == path));
    }

    #[test]
    fn loads_obj_and_mtl_from_disk() {
        let dir = std::env::temp_dir().join(format!("teapot-renderer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tint.mtl"), "newmtl tint\nKd 0.2 0.4 0.6\n").unwrap();
        std::fs::write(
            dir.join("tri.obj"),
            "mtllib tint.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl tint\nf 1 2 3\n",
        )
        .unwrap();

        let mesh = load_obj(dir.join("tri.obj"), GREEN).unwrap();
        assert_eq!(mesh.indices.len(), 3);
        assert_eq!(mesh.vertices[0].color, [0.2, 0.4, 0.6]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
