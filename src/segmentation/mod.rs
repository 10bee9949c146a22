/// Json label cases used by the command line tools
pub mod io;
/// Segment metadata parsing
pub mod segment;
/// Raw label volumes and spatial metadata
pub mod volume;
pub use segment::{bone_token, parse_segments, MetaDictionary, SegmentDescriptor, SegmentTable};
pub use volume::{RawLabelVolume, VolumeGeometry};
