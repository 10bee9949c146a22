use anyhow::Result;
use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::mesh3d::{Mesh3D, MeshSet};

/// Saves mesh as obj file
pub fn save_obj(filename: &str, mesh: &Mesh3D) -> Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);

    for vert in mesh.vertices.iter() {
        writeln!(file, "v {} {} {}", vert[0], vert[1], vert[2])?;
    }

    for face in mesh.faces.iter() {
        writeln!(
            file,
            "f {}// {}// {}//",
            face[0] + 1,
            face[1] + 1,
            face[2] + 1
        )?;
    }

    Ok(())
}

fn random_colors(nb_colors: usize) -> Vec<[u8; 3]> {
    let mut vec_col = Vec::new();
    let mut rng = rand::thread_rng();
    for _ in 0..nb_colors {
        let rand_r = rng.gen_range(0..11) as f64;
        let rand_g = rng.gen_range(0..11) as f64;
        let rand_b = rng.gen_range(0..11) as f64;
        let col_r = (255.0 * rand_r / 10.0) as u8;
        let col_g = (255.0 * rand_g / 10.0) as u8;
        let col_b = (255.0 * rand_b / 10.0) as u8;
        vec_col.push([col_r, col_g, col_b]);
    }
    vec_col
}

/// Saves a mesh set as a single ply file, one label and color per mesh
///
/// Labels follow the key order of the set. Random colors are drawn when
/// none (or too few) are given; the colors used are returned.
pub fn save_ply(
    filename: &str,
    meshes: &MeshSet,
    colors: Option<Vec<[u8; 3]>>,
) -> Result<Vec<[u8; 3]>> {
    let vec_col = match colors {
        Some(col) if col.len() >= meshes.len() => col,
        _ => random_colors(meshes.len()),
    };

    let nb_vertices: usize = meshes.values().map(|m| m.get_nb_vertices()).sum();
    let nb_faces: usize = meshes.values().map(|m| m.get_nb_faces()).sum();

    let mut file = BufWriter::new(File::create(filename)?);

    writeln!(file, "ply")?;
    writeln!(file, "format ascii 1.0")?;
    for name in meshes.keys() {
        writeln!(file, "comment mesh {}", name)?;
    }

    writeln!(file, "element vertex {}", nb_vertices)?;
    writeln!(file, "property float x")?;
    writeln!(file, "property float y")?;
    writeln!(file, "property float z")?;

    writeln!(file, "element face {}", nb_faces)?;
    writeln!(file, "property list uchar int vertex_index")?;
    writeln!(file, "property uint label")?;
    writeln!(file, "property uchar red")?;
    writeln!(file, "property uchar green")?;
    writeln!(file, "property uchar blue")?;

    writeln!(file, "end_header")?;

    for mesh in meshes.values() {
        for vert in mesh.vertices.iter() {
            writeln!(file, "{} {} {}", vert[0], vert[1], vert[2])?;
        }
    }

    let mut offset = 0;
    for (lab, mesh) in meshes.values().enumerate() {
        for face in mesh.faces.iter() {
            write!(file, "{} ", face.len())?;
            for i in face {
                write!(file, "{} ", i + offset)?;
            }
            writeln!(
                file,
                "{} {} {} {}",
                lab, vec_col[lab][0], vec_col[lab][1], vec_col[lab][2]
            )?;
        }
        offset += mesh.get_nb_vertices();
    }

    Ok(vec_col)
}

/// Saves a mesh set as json mapping key -> {vertices, faces}
pub fn save_json(filename: &str, meshes: &MeshSet) -> Result<()> {
    let file = File::create(filename)?;
    serde_json::to_writer(BufWriter::new(file), meshes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("seg_mesh_{}_{}", std::process::id(), name))
    }

    fn triangle_pair() -> Mesh3D {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.5, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, -2.0],
        ];
        Mesh3D::from_buffers(&positions, &[0, 1, 2, 0, 3, 1]).unwrap()
    }

    #[test]
    fn test_obj_file() -> Result<()> {
        let mesh = triangle_pair();
        let path = temp_path("mesh.obj");
        let path_str = path.to_str().unwrap_or("");
        save_obj(path_str, &mesh)?;
        let content = std::fs::read_to_string(&path)?;
        std::fs::remove_file(&path)?;

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "v 1.5 0 0");
        assert_eq!(lines[3], "v 0 0 -2");
        assert_eq!(lines[4], "f 1// 2// 3//");
        assert_eq!(lines[5], "f 1// 4// 2//");
        Ok(())
    }

    #[test]
    fn test_ply_file() -> Result<()> {
        let mut meshes = MeshSet::new();
        meshes.insert("talus_0".to_string(), triangle_pair());
        meshes.insert("tibia_0".to_string(), triangle_pair());
        let path = temp_path("meshes.ply");
        let path_str = path.to_str().unwrap_or("");
        let colors = save_ply(path_str, &meshes, Some(vec![[255, 0, 0], [0, 0, 255]]))?;
        let content = std::fs::read_to_string(&path)?;
        std::fs::remove_file(&path)?;

        assert_eq!(colors, vec![[255, 0, 0], [0, 0, 255]]);
        assert!(content.contains("element vertex 8\n"));
        assert!(content.contains("element face 4\n"));
        assert!(content.contains("3 4 5 6 1 0 0 255\n"));
        Ok(())
    }

    #[test]
    fn test_random_colors() {
        let allowed: Vec<u8> = (0..11).map(|k| (255.0 * k as f64 / 10.0) as u8).collect();
        let colors = random_colors(5);
        assert_eq!(colors.len(), 5);
        for col in colors {
            for c in col {
                assert!(allowed.contains(&c));
            }
        }
    }

    #[test]
    fn test_json_file() -> Result<()> {
        let mut meshes = MeshSet::new();
        meshes.insert("bone_0".to_string(), triangle_pair());
        let path = temp_path("meshes.json");
        let path_str = path.to_str().unwrap_or("");
        save_json(path_str, &meshes)?;
        let value: serde_json::Value = serde_json::from_reader(File::open(&path)?)?;
        std::fs::remove_file(&path)?;

        assert_eq!(value["bone_0"]["faces"], serde_json::json!([[0, 1, 2], [0, 3, 1]]));
        assert_eq!(value["bone_0"]["vertices"].as_array().map(|v| v.len()), Some(4));
        Ok(())
    }
}
