use anyhow::Result;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};

use crate::segmentation::{MetaDictionary, RawLabelVolume, VolumeGeometry};

/// Label volume exchanged by the command line tools
///
/// Voxels are flattened in row-major order over `shape`; a fourth axis, if
/// any, is the layer index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCase {
    pub shape: Vec<usize>,
    #[serde(default)]
    pub geometry: VolumeGeometry,
    #[serde(default)]
    pub metadata: MetaDictionary,
    pub voxels: Vec<u32>,
}

impl LabelCase {
    /// Case holding a single-layer volume
    pub fn from_volume(
        volume: &Array3<u32>,
        geometry: VolumeGeometry,
        metadata: MetaDictionary,
    ) -> LabelCase {
        LabelCase {
            shape: volume.shape().to_vec(),
            geometry,
            metadata,
            voxels: volume.iter().copied().collect(),
        }
    }

    /// Raw volume described by the case
    pub fn raw_volume(&self) -> Result<RawLabelVolume> {
        Ok(RawLabelVolume::from_shape_vec(
            &self.shape,
            self.voxels.clone(),
        )?)
    }

    /// Single-layer volume described by the case
    pub fn single_volume(&self) -> Result<Array3<u32>> {
        match self.raw_volume()? {
            RawLabelVolume::Single(arr) => Ok(arr),
            RawLabelVolume::Layered(arr) => Err(anyhow::Error::msg(format!(
                "single_volume(): expected one layer, case has {}",
                arr.shape()[3]
            ))),
        }
    }
}

/// Loads a label case from a json file
pub fn load_case(filename: &str) -> Result<LabelCase> {
    let file = File::open(filename)?;
    let case: LabelCase = serde_json::from_reader(BufReader::new(file))?;
    let expected: usize = case.shape.iter().product();
    if expected != case.voxels.len() {
        return Err(anyhow::Error::msg(format!(
            "load_case(): {} voxels for shape {:?}",
            case.voxels.len(),
            case.shape
        )));
    }
    Ok(case)
}

/// Saves a label case as json file
pub fn save_case(filename: &str, case: &LabelCase) -> Result<()> {
    let file = File::create(filename)?;
    serde_json::to_writer(BufWriter::new(file), case)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_file() -> Result<()> {
        let mut volume = Array3::<u32>::zeros((2, 3, 4));
        volume[[1, 2, 3]] = 7;
        let mut metadata = MetaDictionary::new();
        metadata.insert("Segment0_LabelValue".to_string(), "7".to_string());
        let case = LabelCase::from_volume(&volume, VolumeGeometry::with_spacing([2.0, 1.0, 1.0]), metadata);

        let path = std::env::temp_dir().join(format!("seg_mesh_case_{}.json", std::process::id()));
        let path_str = path.to_str().unwrap_or("");
        save_case(path_str, &case)?;
        let loaded = load_case(path_str)?;
        std::fs::remove_file(&path)?;

        assert_eq!(loaded, case);
        assert_eq!(loaded.single_volume()?, volume);
        Ok(())
    }

    #[test]
    fn test_layered_case_is_not_single() {
        let case = LabelCase {
            shape: vec![1, 1, 2, 2],
            geometry: VolumeGeometry::default(),
            metadata: MetaDictionary::new(),
            voxels: vec![0, 1, 2, 0],
        };
        assert_eq!(case.raw_volume().unwrap().components(), 2);
        assert!(case.single_volume().is_err());
    }
}
