//! Copies the workspace `config.toml` next to the built binary, where
//! `load_config` looks for it at runtime.

use std::env;
use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    let out_dir = env::var("OUT_DIR").unwrap();
    let profile = env::var("PROFILE").unwrap();

    // OUT_DIR is target/<profile>/build/farm-backend-xxx/out
    let Some(target_dir) = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
    else {
        println!("cargo:warning=target profile directory not found, config.toml not copied");
        return;
    };

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let source_config = workspace_root.join("config.toml");
    if !source_config.exists() {
        return;
    }

    if let Err(e) = fs::copy(&source_config, target_dir.join("config.toml")) {
        println!("cargo:warning=failed to copy config.toml: {}", e);
    }
}
