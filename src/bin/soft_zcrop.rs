use anyhow::Result;
use clap::Parser;
use env_logger;
use std::fs;

use seg_mesh_3d::crop;
use seg_mesh_3d::segmentation::{self, io::LabelCase};

#[derive(Parser)]
struct Cli {
    #[arg(long = "casefile")]
    case_path: std::path::PathBuf,
    #[arg(long = "zstart")]
    z_start: Option<usize>,
    #[arg(long = "zend")]
    z_end: Option<usize>,
    #[arg(long = "split")]
    split: bool,
    #[arg(default_value = "./output/", long = "pathout")]
    out_path: std::path::PathBuf,
    #[arg(default_value = "case", long = "name")]
    name: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let case_path_str = args.case_path.to_str().unwrap_or("");

    println!("Loading label case");
    let case = segmentation::io::load_case(case_path_str)?;
    let volume = case.single_volume()?;
    println!("Shape: {:?}", volume.shape());

    let window = crop::select_z_window(&volume.view(), args.z_start, args.z_end)?;
    println!(
        "Power-of-2 z-crop from slice {} to {} ({} slices)",
        window.start, window.end, window.size
    );

    let pieces = crop::crop_and_split(&volume.view(), &case.geometry, &window, args.split)?;

    fs::create_dir_all(&args.out_path)?;
    let suffixes: &[&str] = if args.split {
        &["_first-leg", "_second-leg"]
    } else {
        &[""]
    };
    for (piece, suffix) in pieces.iter().zip(suffixes.iter()) {
        let out_case = LabelCase::from_volume(&piece.voxels, piece.geometry, case.metadata.clone());
        let out_path = args.out_path.join(format!("{}{}.json", args.name, suffix));
        segmentation::io::save_case(out_path.to_str().unwrap_or(""), &out_case)?;
        println!("Saved: {} {:?}", out_path.display(), piece.voxels.shape());
    }

    Ok(())
}
