pub mod catalog;
pub mod meshes;
pub mod primitives;
pub mod scene_renderer;
pub mod shaders;
pub mod textures;
pub mod vertex;

pub use meshes::{MeshEntry, MeshLibrary};
pub use scene_renderer::SceneRenderer;
pub use shaders::ShaderLibrary;
pub use textures::{TextureEntry, TextureLibrary};
pub use vertex::VertexLayout;
