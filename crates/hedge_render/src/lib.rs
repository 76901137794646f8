pub mod batch;
pub mod camera;
pub mod gpu_context;
pub mod mesh;
pub mod mesh_pipeline;
pub mod texture;
pub mod vertex;
