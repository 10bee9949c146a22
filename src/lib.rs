/// Crop window selection and volume cropping
pub mod crop;
/// Label validation errors
pub mod errors;
/// Label resolution and semantic schemes
pub mod labels;
/// Mesh object and operations
pub mod mesh3d;
/// Label volume meshing
pub mod meshing;
/// Segment metadata and raw label volumes
pub mod segmentation;
