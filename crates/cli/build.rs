//! Build script for the gdexpr CLI binary.
//!
//! Embeds `data/catalog.jsonc` into the binary so that `gdexpr parse` works
//! without a `--catalog` flag. If the file is missing the binary is built
//! without a catalog and commands that need one require `--catalog <PATH>`.

use std::path::Path;

fn main() {
    println!("cargo::rustc-check-cfg=cfg(has_embedded_catalog)");

    let catalog = Path::new("data/catalog.jsonc");
    println!("cargo:rerun-if-changed=data/catalog.jsonc");
    if !catalog.exists() {
        return;
    }

    println!("cargo:rustc-cfg=has_embedded_catalog");

    // Copy into OUT_DIR so include_str! has a stable, absolute path.
    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest = Path::new(&out_dir).join("catalog.jsonc");
    std::fs::copy(catalog, &dest).expect("failed to copy catalog.jsonc to OUT_DIR");
}
