//! Domain types shared by every adapter.

mod mesh;
mod request;

pub use mesh::{MeshBuffers, MeshError, load_mesh, parse_glb, parse_obj};
pub use request::{GenerationRequest, ImageInput, ModelId, RequestError, ViewTag};
