use anyhow::Result;
use clap::Parser;
use env_logger;
use std::fs;
use std::time::Instant;

use seg_mesh_3d::labels::{LabelScheme, LabelTables};
use seg_mesh_3d::mesh3d;
use seg_mesh_3d::meshing::{self, MeshingParams};
use seg_mesh_3d::segmentation;

#[derive(Parser)]
struct Cli {
    #[arg(long = "casefile")]
    case_path: std::path::PathBuf,
    #[arg(default_value = "multiclass", long = "scheme")]
    scheme: String,
    #[arg(default_value_t = 100, long = "reduction")]
    reduction_factor: u32,
    #[arg(long = "maxerror")]
    max_error: Option<f64>,
    #[arg(long = "open")]
    open_boundaries: bool,
    #[arg(default_value = "./output/", long = "pathout")]
    out_path: std::path::PathBuf,
    #[arg(default_value = "meshes.json", long = "jsonoutfile")]
    json_out_name: std::path::PathBuf,
    #[arg(long = "plyoutfile")]
    ply_out_name: Option<std::path::PathBuf>,
    #[arg(long = "obj")]
    write_obj: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let case_path_str = args.case_path.to_str().unwrap_or("");
    let scheme: LabelScheme = args.scheme.parse()?;
    let names = scheme.class_names(&LabelTables::default());
    let params = MeshingParams::default()
        .with_reduction_factor(args.reduction_factor)
        .with_close_boundaries(!args.open_boundaries);
    let params = match args.max_error {
        Some(max_error) => params.with_max_error(max_error),
        None => params,
    };

    println!("Loading label case");
    let case = segmentation::io::load_case(case_path_str)?;
    let volume = case.single_volume()?;

    println!("Extracting meshes");
    let now = Instant::now();
    let meshes = meshing::extract_meshes_with(&volume.view(), case.geometry.spacing, &names, &params)?;
    let duration = now.elapsed();
    let sec = duration.as_secs();
    let min = sec / 60;
    let sec = sec - min * 60;
    println!("{} meshes extracted in {}m{}s", meshes.len(), min, sec);
    for (name, mesh) in meshes.iter() {
        println!(
            "  {}: {} vertices, {} faces",
            name,
            mesh.get_nb_vertices(),
            mesh.get_nb_faces()
        );
    }

    fs::create_dir_all(&args.out_path)?;

    println!("Save meshes");
    let json_path = args.out_path.join(&args.json_out_name);
    mesh3d::io::save_json(json_path.to_str().unwrap_or(""), &meshes)?;

    if let Some(ply_out_name) = args.ply_out_name {
        let ply_path = args.out_path.join(ply_out_name);
        mesh3d::io::save_ply(ply_path.to_str().unwrap_or(""), &meshes, None)?;
    }

    if args.write_obj {
        for (name, mesh) in meshes.iter() {
            let obj_path = args.out_path.join(format!("{}.obj", name));
            mesh3d::io::save_obj(obj_path.to_str().unwrap_or(""), mesh)?;
        }
    }

    Ok(())
}
