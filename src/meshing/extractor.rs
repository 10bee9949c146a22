use anyhow::Result;
use ndarray::ArrayView3;
use std::collections::{BTreeMap, HashMap};

use crate::errors::LabelError;
use crate::mesh3d::decimate::decimate_mesh;
use crate::mesh3d::mesh_operations::{center_meshes, split_components};
use crate::mesh3d::MeshSet;
use crate::meshing::surface_nets::{extract_label_mesh, label_bounds};
use crate::meshing::MeshingParams;

/// Extracts one mesh per connected component of every label, without reduction
///
/// See [`extract_meshes_with`].
pub fn extract_meshes(
    volume: &ArrayView3<u32>,
    spacing: [f64; 3],
    names: &BTreeMap<u32, String>,
) -> Result<MeshSet> {
    extract_meshes_with(volume, spacing, names, &MeshingParams::default())
}

/// Extracts one mesh per connected component of every label
///
/// Meshes are keyed `"{name}_{index}"`, `name` being the entry of the label
/// in `names` and `index` counting the components of that name in discovery
/// order. Every mesh is then moved so that the mean of all vertices of all
/// meshes is the origin. A volume holding only background gives an empty set.
pub fn extract_meshes_with(
    volume: &ArrayView3<u32>,
    spacing: [f64; 3],
    names: &BTreeMap<u32, String>,
    params: &MeshingParams,
) -> Result<MeshSet> {
    if spacing.iter().any(|&s| !s.is_finite() || s <= 0.0) {
        return Err(LabelError::ShapeMismatch(format!(
            "voxel spacing {:?} must be positive",
            spacing
        ))
        .into());
    }

    let bounds = label_bounds(volume);
    let mut meshes = MeshSet::new();
    if bounds.is_empty() {
        log::info!("No label to mesh");
        return Ok(meshes);
    }
    for label in bounds.keys() {
        if !names.contains_key(label) {
            return Err(LabelError::UnmappedLabel { label: *label }.into());
        }
    }

    log::info!(
        "Generating meshes for labels {:?}",
        bounds.keys().collect::<Vec<_>>()
    );
    let decimate_params = params.decimate_params();
    let mut counters: HashMap<&str, usize> = HashMap::new();

    for (label, label_bounds) in bounds.iter() {
        let name = names
            .get(label)
            .ok_or(LabelError::UnmappedLabel { label: *label })?;
        let mut mesh = extract_label_mesh(
            volume,
            *label,
            label_bounds,
            spacing,
            params.close_boundaries,
        )?;
        if let Some(decimate_params) = decimate_params.as_ref() {
            let result = decimate_mesh(&mesh, decimate_params)?;
            log::debug!("label {}: {}", label, result);
            mesh = result.mesh;
        }

        let components = split_components(&mesh)?;
        log::info!("{}: {} components", name, components.len());
        let counter = counters.entry(name.as_str()).or_insert(0);
        for component in components {
            meshes.insert(format!("{}_{}", name, counter), component);
            *counter += 1;
        }
    }

    if let Some(centroid) = center_meshes(meshes.values_mut()) {
        log::debug!(
            "centered {} meshes on ({}, {}, {})",
            meshes.len(),
            centroid[0],
            centroid[1],
            centroid[2]
        );
    }

    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{s, Array3};

    fn names(entries: &[(u32, &str)]) -> BTreeMap<u32, String> {
        entries.iter().map(|&(l, n)| (l, n.to_string())).collect()
    }

    #[test]
    fn test_background_only() {
        let volume = Array3::<u32>::zeros((4, 4, 4));
        let meshes = extract_meshes(&volume.view(), [1.0; 3], &BTreeMap::new()).unwrap();
        assert!(meshes.is_empty());
    }

    #[test]
    fn test_component_keys() {
        let mut volume = Array3::<u32>::zeros((10, 6, 6));
        volume.slice_mut(s![1..3, 1..4, 1..4]).fill(1);
        volume.slice_mut(s![6..9, 1..4, 1..4]).fill(1);
        volume.slice_mut(s![4..5, 1..5, 1..5]).fill(2);
        let meshes = extract_meshes(
            &volume.view(),
            [1.0; 3],
            &names(&[(1, "tibia"), (2, "fibula")]),
        )
        .unwrap();
        let keys: Vec<&String> = meshes.keys().collect();
        assert_eq!(keys, vec!["fibula_0", "tibia_0", "tibia_1"]);

        let centroid = crate::mesh3d::mesh_operations::joint_centroid(meshes.values()).unwrap();
        assert_abs_diff_eq!(centroid[0], 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(centroid[1], 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(centroid[2], 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_shared_names_keep_counting() {
        let mut volume = Array3::<u32>::zeros((8, 4, 4));
        volume.slice_mut(s![1..3, 1..3, 1..3]).fill(1);
        volume.slice_mut(s![5..7, 1..3, 1..3]).fill(2);
        let meshes = extract_meshes(
            &volume.view(),
            [1.0; 3],
            &names(&[(1, "bone"), (2, "bone")]),
        )
        .unwrap();
        assert_eq!(meshes.len(), 2);
        assert!(meshes.contains_key("bone_0"));
        assert!(meshes.contains_key("bone_1"));
    }

    #[test]
    fn test_errors() {
        let mut volume = Array3::<u32>::zeros((4, 4, 4));
        volume[[1, 1, 1]] = 7;
        let err = extract_meshes(&volume.view(), [1.0; 3], &names(&[(1, "tibia")])).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LabelError>(),
            Some(&LabelError::UnmappedLabel { label: 7 })
        );

        let err = extract_meshes(&volume.view(), [1.0, 0.0, 1.0], &names(&[(7, "x")])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LabelError>(),
            Some(LabelError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_reduction() {
        let mut volume = Array3::<u32>::zeros((12, 12, 12));
        volume.slice_mut(s![1..11, 1..11, 1..11]).fill(1);
        let names = names(&[(1, "bone")]);
        let full = extract_meshes(&volume.view(), [1.0; 3], &names).unwrap();
        let params = MeshingParams::default().with_reduction_factor(10);
        let reduced = extract_meshes_with(&volume.view(), [1.0; 3], &names, &params).unwrap();
        assert_eq!(reduced.len(), 1);
        assert!(reduced["bone_0"].get_nb_faces() * 5 < full["bone_0"].get_nb_faces());
        assert!(crate::mesh3d::mesh_operations::is_closed(&reduced["bone_0"]));
    }
}
