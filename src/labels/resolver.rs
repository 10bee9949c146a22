use ndarray::{Array3, ArrayView3, Zip};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::LabelError;
use crate::labels::{InstanceToSemanticMap, LabelScheme, LabelTables};
use crate::segmentation::{RawLabelVolume, SegmentTable};

/// Single-layer volume of globally unique instance labels
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalLabelVolume {
    labels: Array3<u32>,
    instance_names: BTreeMap<u32, String>,
}

impl CanonicalLabelVolume {
    /// Instance labels
    pub fn labels(&self) -> &Array3<u32> {
        &self.labels
    }

    /// Instance label -> display name
    pub fn instance_names(&self) -> &BTreeMap<u32, String> {
        &self.instance_names
    }

    /// Distinct positive labels present in the volume
    pub fn present_labels(&self) -> BTreeSet<u32> {
        present_labels(&self.labels.view())
    }

    pub fn into_parts(self) -> (Array3<u32>, BTreeMap<u32, String>) {
        (self.labels, self.instance_names)
    }
}

fn present_labels(labels: &ArrayView3<u32>) -> BTreeSet<u32> {
    labels.iter().copied().filter(|&v| v > 0).collect()
}

/// Raw value -> instance label table of one layer
struct LayerRemap {
    layer: usize,
    table: HashMap<u32, u32>,
}

impl LayerRemap {
    fn new(layer: usize) -> LayerRemap {
        LayerRemap {
            layer,
            table: HashMap::from([(0, 0)]),
        }
    }

    fn insert(&mut self, raw: u32, instance: u32) {
        if let Some(previous) = self.table.insert(raw, instance) {
            log::warn!(
                "layer {}: raw label {} already assigned to instance {}, reassigned to {}",
                self.layer,
                raw,
                previous,
                instance
            );
        }
    }

    fn get(&self, raw: u32) -> Option<u32> {
        self.table.get(&raw).copied()
    }

    fn remap(&self, layer: &ArrayView3<u32>) -> Result<Array3<u32>, LabelError> {
        if let Some(&label) = layer.iter().find(|&&v| self.get(v).is_none()) {
            return Err(LabelError::UnmappedLabel { label });
        }
        Ok(layer.mapv(|v| self.get(v).unwrap_or(0)))
    }
}

/// Resolves a raw annotation volume into canonical instance labels
///
/// Segments get dense instance labels 1, 2, 3, ... in declaration order.
/// Every layer is remapped on its own, then layers are merged by voxel-wise
/// maximum, so a voxel claimed by two segments keeps the larger instance
/// label. A volume without declared segments is taken as already canonical
/// and must only hold legacy labels.
pub fn resolve(
    raw: &RawLabelVolume,
    segments: &SegmentTable,
    scheme: LabelScheme,
    tables: &LabelTables,
) -> Result<(CanonicalLabelVolume, InstanceToSemanticMap), LabelError> {
    if raw.components() != segments.components() {
        return Err(LabelError::LayerMismatch {
            components: raw.components(),
            layers: segments.components(),
        });
    }

    let (labels, instance_names) = if segments.is_empty() {
        resolve_legacy(raw, tables)?
    } else {
        resolve_declared(raw, segments)?
    };

    for label in present_labels(&labels.view()) {
        if !instance_names.contains_key(&label) {
            return Err(LabelError::UnmappedLabel { label });
        }
    }

    let semantic = InstanceToSemanticMap::build(scheme, &instance_names, tables)?;
    log::info!(
        "resolved {} instance labels ({} scheme)",
        instance_names.len(),
        scheme
    );

    Ok((
        CanonicalLabelVolume {
            labels,
            instance_names,
        },
        semantic,
    ))
}

fn resolve_legacy(
    raw: &RawLabelVolume,
    tables: &LabelTables,
) -> Result<(Array3<u32>, BTreeMap<u32, String>), LabelError> {
    let layer = match raw {
        RawLabelVolume::Single(arr) => arr.view(),
        RawLabelVolume::Layered(_) => {
            return Err(LabelError::LayerMismatch {
                components: raw.components(),
                layers: 0,
            })
        }
    };
    if let Some(&label) = layer.iter().find(|&&v| v > tables.legacy_max_label) {
        return Err(LabelError::UnrecognizedLegacyLabel {
            label,
            max: tables.legacy_max_label,
        });
    }
    log::warn!(
        "no segment metadata, assuming legacy labels 1..={}",
        tables.legacy_max_label
    );
    Ok((layer.to_owned(), tables.legacy_instance_names()))
}

fn resolve_declared(
    raw: &RawLabelVolume,
    segments: &SegmentTable,
) -> Result<(Array3<u32>, BTreeMap<u32, String>), LabelError> {
    let mut remaps: Vec<LayerRemap> = Vec::new();
    let mut instance_names = BTreeMap::new();

    for (ind, seg) in segments.segments().iter().enumerate() {
        let instance = ind as u32 + 1;
        let pos = match remaps.iter().position(|r| r.layer == seg.layer) {
            Some(pos) => pos,
            None => {
                remaps.push(LayerRemap::new(seg.layer));
                remaps.len() - 1
            }
        };
        remaps[pos].insert(seg.label_value, instance);
        instance_names.insert(instance, seg.name.clone());
    }

    let [d0, d1, d2] = raw.spatial_shape();
    let mut merged = Array3::<u32>::zeros((d0, d1, d2));
    for remap in remaps.iter() {
        let layer = raw.layer(remap.layer).ok_or(LabelError::LayerMismatch {
            components: raw.components(),
            layers: segments.layers().len(),
        })?;
        let remapped = remap.remap(&layer)?;
        log::debug!("merging layer {}", remap.layer);
        Zip::from(&mut merged)
            .and(&remapped)
            .for_each(|m, &r| *m = (*m).max(r));
    }

    Ok((merged, instance_names))
}
