/// Label volume to mesh set pipeline
pub mod extractor;
/// Meshing parameters
pub mod params;
/// Surface nets extraction of a single label
pub mod surface_nets;
pub use extractor::{extract_meshes, extract_meshes_with};
pub use params::MeshingParams;
