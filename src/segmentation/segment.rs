use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::errors::LabelError;

/// Embedded key/value metadata of an annotation volume
///
/// Keys iterate in lexicographic order, which is the order segments are
/// considered declared in.
pub type MetaDictionary = BTreeMap<String, String>;

/// One declared annotation segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// Segment index recovered from the metadata key
    pub id: u32,
    /// Layer (last data axis) holding the segment
    pub layer: usize,
    /// Raw voxel value of the segment within its layer
    pub label_value: u32,
    /// Display name, spaces replaced by underscores
    pub name: String,
}

impl SegmentDescriptor {
    /// Bone name: token before the first separator of the display name
    pub fn bone_name(&self) -> &str {
        bone_token(&self.name)
    }
}

/// Token of a display name before the first `_` or space
pub fn bone_token(name: &str) -> &str {
    name.split(|c: char| c == '_' || c == ' ')
        .next()
        .unwrap_or(name)
}

/// Segments declared by one volume, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    segments: Vec<SegmentDescriptor>,
    components: usize,
}

#[derive(Default)]
struct SegmentFields {
    label_value: Option<u32>,
    layer: Option<usize>,
    name: Option<String>,
}

fn segment_key_regex() -> &'static Regex {
    static SEGMENT_KEY: OnceLock<Regex> = OnceLock::new();
    SEGMENT_KEY.get_or_init(|| {
        Regex::new(r"^Segment(\d+)_([A-Za-z]+)$").expect("segment key pattern is valid")
    })
}

fn parse_field<T: std::str::FromStr>(
    id: u32,
    field: &'static str,
    value: &str,
) -> Result<T, LabelError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| LabelError::MalformedSegment {
            id,
            field,
            reason: format!("has non-integer value `{}`", value),
        })
}

fn set_once<T>(slot: &mut Option<T>, id: u32, value: T) -> Result<(), LabelError> {
    if slot.is_some() {
        return Err(LabelError::DuplicateSegment { id });
    }
    *slot = Some(value);
    Ok(())
}

/// Parses the declared segments of a volume
///
/// `components` is the number of components per pixel of the volume the
/// metadata belongs to (1 for single-layer volumes). A segment is declared
/// by its `Segment<N>_LabelValue` key; `Segment<N>_Name` is required and
/// `Segment<N>_Layer` is required for multi-layer volumes.
pub fn parse_segments(
    metadata: &MetaDictionary,
    components: usize,
) -> Result<SegmentTable, LabelError> {
    if components == 0 {
        return Err(LabelError::ShapeMismatch(
            "volume has zero components per pixel".to_string(),
        ));
    }

    let regex = segment_key_regex();
    let mut order = Vec::new();
    let mut fields: BTreeMap<u32, SegmentFields> = BTreeMap::new();

    for (key, value) in metadata.iter() {
        let Some(caps) = regex.captures(key) else {
            continue;
        };
        let field = &caps[2];
        if !matches!(field, "LabelValue" | "Layer" | "Name") {
            continue;
        }
        let id = caps[1]
            .parse::<u32>()
            .map_err(|_| LabelError::MalformedSegment {
                id: u32::MAX,
                field: "index",
                reason: format!("in key `{}` is out of range", key),
            })?;
        let entry = fields.entry(id).or_default();
        match field {
            "LabelValue" => {
                set_once(&mut entry.label_value, id, parse_field(id, "LabelValue", value)?)?;
                order.push(id);
            }
            "Layer" => set_once(&mut entry.layer, id, parse_field(id, "Layer", value)?)?,
            _ => set_once(&mut entry.name, id, value.replace(' ', "_"))?,
        }
    }

    if let Some((&id, _)) = fields.iter().find(|(_, f)| f.label_value.is_none()) {
        return Err(LabelError::MalformedSegment {
            id,
            field: "LabelValue",
            reason: "is missing".to_string(),
        });
    }

    let mut segments = Vec::with_capacity(order.len());
    for id in order {
        let Some(entry) = fields.remove(&id) else {
            continue;
        };
        let name = entry.name.ok_or(LabelError::MalformedSegment {
            id,
            field: "Name",
            reason: "is missing".to_string(),
        })?;
        let layer = match entry.layer {
            Some(layer) => layer,
            None if components == 1 => 0,
            None => {
                return Err(LabelError::MalformedSegment {
                    id,
                    field: "Layer",
                    reason: "is missing in a multi-layer volume".to_string(),
                })
            }
        };
        segments.push(SegmentDescriptor {
            id,
            layer,
            label_value: entry.label_value.unwrap_or_default(),
            name,
        });
    }

    let layers: BTreeSet<usize> = segments.iter().map(|s| s.layer).collect();
    let out_of_range = layers.iter().any(|&l| l >= components);
    let count_mismatch = components > 1 && layers.len() != components;
    if out_of_range || count_mismatch {
        return Err(LabelError::LayerMismatch {
            components,
            layers: layers.len(),
        });
    }

    log::debug!(
        "parsed {} segments over {} component(s)",
        segments.len(),
        components
    );

    Ok(SegmentTable {
        segments,
        components,
    })
}

impl SegmentTable {
    /// Table without any declared segment
    pub fn empty(components: usize) -> SegmentTable {
        SegmentTable {
            segments: Vec::new(),
            components,
        }
    }

    /// Segments in declaration order
    pub fn segments(&self) -> &[SegmentDescriptor] {
        &self.segments
    }

    /// Number of declared segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Checks if no segment is declared
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Components per pixel of the source volume
    pub fn components(&self) -> usize {
        self.components
    }

    /// Checks if the source volume is multi-layer
    pub fn is_multilayer(&self) -> bool {
        self.components > 1
    }

    /// Distinct layers in order of first declaration
    pub fn layers(&self) -> Vec<usize> {
        let mut layers = Vec::new();
        for seg in self.segments.iter() {
            if !layers.contains(&seg.layer) {
                layers.push(seg.layer);
            }
        }
        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare(meta: &mut MetaDictionary, n: u32, layer: Option<usize>, value: u32, name: &str) {
        meta.insert(format!("Segment{}_LabelValue", n), value.to_string());
        meta.insert(format!("Segment{}_Name", n), name.to_string());
        meta.insert(format!("Segment{}_Color", n), "0.5 0.5 0.5".to_string());
        if let Some(layer) = layer {
            meta.insert(format!("Segment{}_Layer", n), layer.to_string());
        }
    }

    #[test]
    fn test_single_layer() {
        let mut meta = MetaDictionary::new();
        declare(&mut meta, 0, None, 3, "Tibia left");
        declare(&mut meta, 1, None, 7, "Talus");
        meta.insert("Segmentation_MasterRepresentation".to_string(), "Binary".to_string());

        let table = parse_segments(&meta, 1).unwrap();
        assert_eq!(table.len(), 2);
        assert!(!table.is_multilayer());
        let seg = &table.segments()[0];
        assert_eq!(seg.id, 0);
        assert_eq!(seg.layer, 0);
        assert_eq!(seg.label_value, 3);
        assert_eq!(seg.name, "Tibia_left");
        assert_eq!(seg.bone_name(), "Tibia");
    }

    #[test]
    fn test_declaration_order_is_key_order() {
        let mut meta = MetaDictionary::new();
        for n in [2, 10, 1] {
            declare(&mut meta, n, None, n, "Fibula");
        }
        let table = parse_segments(&meta, 1).unwrap();
        let ids: Vec<u32> = table.segments().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![10, 1, 2]);
    }

    #[test]
    fn test_duplicate_ids() {
        let mut meta = MetaDictionary::new();
        declare(&mut meta, 1, None, 1, "Tibia");
        meta.insert("Segment01_LabelValue".to_string(), "2".to_string());
        assert_eq!(
            parse_segments(&meta, 1),
            Err(LabelError::DuplicateSegment { id: 1 })
        );
    }

    #[test]
    fn test_multilayer() {
        let mut meta = MetaDictionary::new();
        declare(&mut meta, 0, Some(1), 1, "Tibia");
        declare(&mut meta, 1, Some(0), 1, "Fibula");
        declare(&mut meta, 2, Some(1), 2, "Talus");
        let table = parse_segments(&meta, 2).unwrap();
        assert!(table.is_multilayer());
        assert_eq!(table.layers(), vec![1, 0]);
    }

    #[test]
    fn test_layer_mismatch() {
        let mut meta = MetaDictionary::new();
        declare(&mut meta, 0, Some(0), 1, "Tibia");
        declare(&mut meta, 1, Some(1), 1, "Fibula");
        assert_eq!(
            parse_segments(&meta, 3),
            Err(LabelError::LayerMismatch {
                components: 3,
                layers: 2
            })
        );

        let mut meta = MetaDictionary::new();
        declare(&mut meta, 0, Some(1), 1, "Tibia");
        assert!(matches!(
            parse_segments(&meta, 1),
            Err(LabelError::LayerMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed() {
        let mut meta = MetaDictionary::new();
        meta.insert("Segment0_LabelValue".to_string(), "one".to_string());
        meta.insert("Segment0_Name".to_string(), "Tibia".to_string());
        assert!(matches!(
            parse_segments(&meta, 1),
            Err(LabelError::MalformedSegment { id: 0, field: "LabelValue", .. })
        ));

        let mut meta = MetaDictionary::new();
        meta.insert("Segment4_Name".to_string(), "Tibia".to_string());
        assert!(matches!(
            parse_segments(&meta, 1),
            Err(LabelError::MalformedSegment { id: 4, field: "LabelValue", .. })
        ));

        // the smallest id without a label value is reported
        let mut meta = MetaDictionary::new();
        for n in [9, 2, 7] {
            meta.insert(format!("Segment{}_Name", n), "Tibia".to_string());
        }
        declare(&mut meta, 0, None, 1, "Fibula");
        for _ in 0..5 {
            assert!(matches!(
                parse_segments(&meta, 1),
                Err(LabelError::MalformedSegment { id: 2, field: "LabelValue", .. })
            ));
        }

        let mut meta = MetaDictionary::new();
        declare(&mut meta, 0, None, 1, "Tibia");
        declare(&mut meta, 1, Some(1), 1, "Fibula");
        assert!(matches!(
            parse_segments(&meta, 2),
            Err(LabelError::MalformedSegment { id: 0, field: "Layer", .. })
        ));
    }

    #[test]
    fn test_no_segments() {
        let meta = MetaDictionary::new();
        let table = parse_segments(&meta, 1).unwrap();
        assert!(table.is_empty());
        assert!(matches!(
            parse_segments(&meta, 2),
            Err(LabelError::LayerMismatch { .. })
        ));
    }
}
