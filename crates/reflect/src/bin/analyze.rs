//! Shader unit analysis tool
//!
//! Reflects one shader unit from its stage source files and dumps the
//! resolved binding-layout model to stdout as JSON. Bytecode artifacts are
//! compiled (or reused from cache) next to the sources.

use shader_reflect::provider::{GlslcCompiler, StageSourceProvider};
use shader_reflect::{ReflectConfig, reflect_unit_from_files};
use std::env;
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <stage-file>...", args[0]);
        eprintln!("Reflects the given stage source files as one shader unit and dumps the resolved layout to stdout");
        process::exit(1);
    }

    let stage_paths: Vec<PathBuf> = args[1..].iter().map(PathBuf::from).collect();

    for path in &stage_paths {
        if !path.exists() {
            eprintln!("Error: stage file '{}' does not exist", path.display());
            process::exit(1);
        }
    }

    let config = ReflectConfig::default();
    let provider = StageSourceProvider::new(GlslcCompiler::from_config(&config), &config);

    match reflect_unit_from_files(&stage_paths, &provider, &config) {
        Ok(unit) => match serde_json::to_string_pretty(&unit) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing resolved layout: {e}");
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error reflecting shader unit: {e}");
            process::exit(1);
        }
    }
}
