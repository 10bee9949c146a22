/// Quadric error decimation
pub mod decimate;
/// Input/Ouput functions
pub mod io;
/// Indexed triangle mesh
pub mod mesh3d;
/// Mesh operations
pub mod mesh_operations;
pub use decimate::{decimate_mesh, DecimateParams, DecimationResult};
pub use mesh3d::{Face, Mesh3D, MeshSet, Vertex};
