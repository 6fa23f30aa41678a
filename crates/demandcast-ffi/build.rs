//! Build script for demandcast-ffi.
//!
//! Generates the C header with cbindgen. A failure to generate the header is
//! reported as a warning so the Rust library itself still builds.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, skipping header generation");
        return;
    };
    let out_dir = PathBuf::from(&crate_dir).join("include");

    // Create output directory if it doesn't exist
    std::fs::create_dir_all(&out_dir).ok();

    let config = match cbindgen::Config::from_file(PathBuf::from(&crate_dir).join("cbindgen.toml")) {
        Ok(config) => config,
        Err(e) => {
            println!("cargo:warning=failed to read cbindgen.toml: {}", e);
            return;
        }
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(out_dir.join("demandcast.h"));
        }
        Err(e) => println!("cargo:warning=unable to generate C header: {}", e),
    }
}
