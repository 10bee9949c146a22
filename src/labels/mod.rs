/// Resolution of raw annotations into canonical instance labels
pub mod resolver;
/// Semantic label schemes
pub mod scheme;
/// Anatomy lookup tables
pub mod tables;
pub use resolver::{resolve, CanonicalLabelVolume};
pub use scheme::{InstanceToSemanticMap, LabelScheme};
pub use tables::LabelTables;
