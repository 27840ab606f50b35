//! Mesh buffers handed to the viewport.
//!
//! Only the geometry needed for display is read: vertex positions and
//! triangulated faces. Normals, texture coordinates and materials in the
//! source file are skipped. OBJ and binary glTF (`.glb`) are supported.

use std::fs;
use std::path::Path;

use gltf::Gltf;
use gltf::buffer;
use gltf::mesh::Mode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vertex and triangle buffers of a loaded mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
}

impl MeshBuffers {
    pub const fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub const fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(mut lo, mut hi), v| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(v[axis]);
                hi[axis] = hi[axis].max(v[axis]);
            }
            (lo, hi)
        }))
    }
}

/// Errors from reading a mesh file.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Failed to read mesh {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Unsupported mesh format '{0}' (expected .obj or .glb)")]
    UnsupportedFormat(String),

    #[error("Invalid glTF binary: {0}")]
    Gltf(String),

    #[error("Malformed OBJ at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Load an `.obj` or `.glb` file into display buffers.
pub fn load_mesh(path: &Path) -> Result<MeshBuffers, MeshError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let read_err = |e: std::io::Error| MeshError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    match extension.as_str() {
        "obj" => parse_obj(&fs::read_to_string(path).map_err(read_err)?),
        "glb" => parse_glb(&fs::read(path).map_err(read_err)?),
        _ => Err(MeshError::UnsupportedFormat(extension)),
    }
}

/// Parse a binary glTF container.
///
/// Triangle primitives of every mesh are concatenated. Node transforms are
/// not applied.
pub fn parse_glb(bytes: &[u8]) -> Result<MeshBuffers, MeshError> {
    let gltf = Gltf::from_slice(bytes).map_err(|e| MeshError::Gltf(e.to_string()))?;
    let blob = gltf.blob.as_deref();
    let mut mesh = MeshBuffers::default();

    for primitive in gltf.meshes().flat_map(|m| m.primitives()) {
        if primitive.mode() != Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|buffer| match buffer.source() {
            buffer::Source::Bin => blob,
            buffer::Source::Uri(_) => None,
        });
        let Some(positions) = reader.read_positions() else {
            continue;
        };

        let base = u32::try_from(mesh.vertices.len())
            .map_err(|_| MeshError::Gltf("too many vertices".to_string()))?;
        let before = mesh.vertices.len();
        mesh.vertices.extend(positions);
        let count = u32::try_from(mesh.vertices.len() - before)
            .map_err(|_| MeshError::Gltf("too many vertices".to_string()))?;

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count).collect(),
        };
        if let Some(bad) = indices.iter().find(|&&i| i >= count) {
            return Err(MeshError::Gltf(format!(
                "index {bad} out of range ({count} vertices)"
            )));
        }
        mesh.faces.extend(
            indices
                .chunks_exact(3)
                .map(|tri| [base + tri[0], base + tri[1], base + tri[2]]),
        );
    }

    Ok(mesh)
}

/// Parse OBJ text. Polygons are fan-triangulated.
pub fn parse_obj(text: &str) -> Result<MeshBuffers, MeshError> {
    let mut mesh = MeshBuffers::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or_default().trim();
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut position = [0.0_f32; 3];
                for slot in &mut position {
                    let token = parts.next().ok_or_else(|| MeshError::Malformed {
                        line: line_no,
                        reason: "vertex needs three coordinates".to_string(),
                    })?;
                    *slot = token.parse().map_err(|_| MeshError::Malformed {
                        line: line_no,
                        reason: format!("invalid coordinate '{token}'"),
                    })?;
                }
                mesh.vertices.push(position);
            }
            Some("f") => {
                let corners = parts
                    .map(|token| resolve_index(token, mesh.vertices.len(), line_no))
                    .collect::<Result<Vec<u32>, MeshError>>()?;
                if corners.len() < 3 {
                    return Err(MeshError::Malformed {
                        line: line_no,
                        reason: "face needs at least three vertices".to_string(),
                    });
                }
                for pair in corners[1..].windows(2) {
                    mesh.faces.push([corners[0], pair[0], pair[1]]);
                }
            }
            _ => {}
        }
    }

    Ok(mesh)
}

/// Convert a face corner (`7`, `7/1`, `7//3`, `-1`) into a zero-based index.
fn resolve_index(token: &str, vertex_count: usize, line: usize) -> Result<u32, MeshError> {
    let position = token.split('/').next().unwrap_or_default();
    let malformed = |reason: String| MeshError::Malformed { line, reason };

    let raw: i64 = position
        .parse()
        .map_err(|_| malformed(format!("invalid face index '{token}'")))?;
    let count = i64::try_from(vertex_count).map_err(|_| malformed("too many vertices".into()))?;

    let zero_based = match raw {
        0 => return Err(malformed("face index 0 is not valid".to_string())),
        r if r > 0 => r - 1,
        r => count + r,
    };
    if !(0..count).contains(&zero_based) {
        return Err(malformed(format!(
            "face index {raw} out of range ({vertex_count} vertices)"
        )));
    }
    u32::try_from(zero_based).map_err(|_| malformed(format!("face index {raw} too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

    #[test]
    fn fan_triangulates_polygons() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.bounds(), Some(([0.0, 0.0, 0.0], [1.0, 1.0, 0.0])));
    }

    #[test]
    fn negative_indices_are_relative() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3/1 -2/2 -1/3\n").unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn out_of_range_index_is_reported_with_line() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(matches!(err, MeshError::Malformed { line: 2, .. }));
    }

    #[test]
    fn load_rejects_other_formats() {
        let err = load_mesh(Path::new("model.ply")).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat(ext) if ext == "ply"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        fs::write(&path, QUAD).unwrap();
        assert_eq!(load_mesh(&path).unwrap().face_count(), 2);
    }

    /// A single-triangle GLB with `u16` indices.
    fn triangle_glb() -> Vec<u8> {
        let json = r#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":44}],"bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":36},{"buffer":0,"byteOffset":36,"byteLength":6}],"accessors":[{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]},{"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}],"meshes":[{"primitives":[{"attributes":{"POSITION":0},"indices":1}]}]}"#;
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let mut bin = Vec::new();
        for v in [[0.0_f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0_u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin.extend_from_slice(&[0, 0]);

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::new();
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2_u32.to_le_bytes());
        glb.extend_from_slice(&u32::try_from(total).unwrap().to_le_bytes());
        glb.extend_from_slice(&u32::try_from(json.len()).unwrap().to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&u32::try_from(bin.len()).unwrap().to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }

    #[test]
    fn glb_triangles_are_read() {
        let mesh = parse_glb(&triangle_glb()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.bounds(), Some(([0.0, 0.0, 0.0], [1.0, 1.0, 0.0])));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.GLB");
        fs::write(&path, triangle_glb()).unwrap();
        assert_eq!(load_mesh(&path).unwrap().face_count(), 1);

        let broken = dir.path().join("broken.glb");
        fs::write(&broken, b"not a glb").unwrap();
        assert!(matches!(load_mesh(&broken), Err(MeshError::Gltf(_))));
    }
}
