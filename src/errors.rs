//! Validation errors raised while resolving annotation labels

use thiserror::Error;

/// Input validation failures.
///
/// All of them are fatal for the case being processed and carry the
/// offending id, label or name so the caller can report it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// Two metadata keys resolve to the same segment id
    #[error("duplicate segment id {id} in metadata")]
    DuplicateSegment { id: u32 },

    /// A declared segment has a missing or unreadable field
    #[error("segment {id}: field `{field}` {reason}")]
    MalformedSegment {
        id: u32,
        field: &'static str,
        reason: String,
    },

    /// Components per pixel disagree with the layers referenced by the segments
    #[error("volume has {components} components but metadata references {layers} distinct layers")]
    LayerMismatch { components: usize, layers: usize },

    /// A volume without segment metadata holds a value outside the legacy range
    #[error("label {label} outside legacy range 1..={max} in volume without segment metadata")]
    UnrecognizedLegacyLabel { label: u32, max: u32 },

    /// A voxel value has no entry in the instance table
    #[error("label {label} not found in instance table")]
    UnmappedLabel { label: u32 },

    /// A bone name is not in the anatomy table
    #[error("unknown anatomy `{name}`")]
    UnknownAnatomy { name: String },

    /// The mask holds no foreground voxel
    #[error("no annotation found")]
    EmptyAnnotation,

    /// Unrecognized label scheme name
    #[error("unknown label scheme `{0}` (expected `binary` or `multiclass`)")]
    UnknownScheme(String),

    /// In-memory inputs with inconsistent dimensions
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}
