pub mod camera;
pub mod mesh;
pub mod model;
pub mod pipeline;
pub mod renderer;
pub mod scene;

pub use camera::Camera;
pub use mesh::{axes_mesh, slab_mesh, Mesh, ModelVertex, Topology};
pub use model::{load_obj, parse_obj, ModelLoadError};
pub use renderer::ModelRenderer;
pub use scene::ScenePose;
