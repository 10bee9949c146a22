use anyhow::Result;
use clap::Parser;
use env_logger;
use std::fs;
use std::time::Instant;

use seg_mesh_3d::labels::{self, LabelScheme, LabelTables};
use seg_mesh_3d::segmentation::{self, io::LabelCase};

#[derive(Parser)]
struct Cli {
    #[arg(long = "casefile")]
    case_path: std::path::PathBuf,
    #[arg(default_value = "./output/labels.json", long = "caseoutfile")]
    case_out_path: std::path::PathBuf,
    #[arg(default_value = "multiclass", long = "scheme")]
    scheme: String,
    #[arg(long = "instances")]
    keep_instances: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let case_path_str = args.case_path.to_str().unwrap_or("");
    let case_out_path_str = args.case_out_path.to_str().unwrap_or("");
    let scheme: LabelScheme = args.scheme.parse()?;
    let tables = LabelTables::default();

    println!("Loading label case");
    let case = segmentation::io::load_case(case_path_str)?;
    let raw = case.raw_volume()?;
    let segments = segmentation::parse_segments(&case.metadata, raw.components())?;
    println!(
        "{} segments over {} layers",
        segments.len(),
        raw.components()
    );

    println!("Resolving labels");
    let now = Instant::now();
    let (canonical, semantic) = labels::resolve(&raw, &segments, scheme, &tables)?;
    let duration = now.elapsed();
    println!("Labels resolved in {}ms", duration.as_millis());

    for (instance, name) in canonical.instance_names().iter() {
        println!(
            "  {} {} -> {}",
            instance,
            name,
            semantic.get(*instance).unwrap_or(0)
        );
    }

    let out_volume = if args.keep_instances {
        canonical.labels().clone()
    } else {
        semantic.apply(canonical.labels())?
    };

    println!("Save labels");
    if let Some(parent) = args.case_out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let out_case = LabelCase::from_volume(&out_volume, case.geometry, Default::default());
    segmentation::io::save_case(case_out_path_str, &out_case)?;

    Ok(())
}
