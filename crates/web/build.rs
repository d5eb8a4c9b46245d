//! Build script for the web crate.
//!
//! Fingerprints `static/css/main.css` so the stylesheet URL changes whenever
//! its content does, and copies it to `static/css/derived/main.<hash>.css`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Hex characters of the SHA-256 kept in the file name.
const HASH_LEN: usize = 8;

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR is not set");
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };

    let hash = fingerprint_stylesheet(Path::new(&manifest_dir)).unwrap_or_else(|message| {
        println!("cargo:warning={message}");
        String::new()
    });

    // Read by the `css_hash` template filter
    println!("cargo:rustc-env=CSS_HASH={hash}");
}

/// Hash `main.css` and write the fingerprinted copy. Returns the short hash.
fn fingerprint_stylesheet(manifest_dir: &Path) -> Result<String, String> {
    let source = manifest_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", source.display());

    let content = fs::read(&source).map_err(|e| format!("Could not read main.css: {e}"))?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let hash = digest[..HASH_LEN].to_string();

    let derived: PathBuf = manifest_dir.join("static/css/derived");
    fs::create_dir_all(&derived).map_err(|e| format!("Could not create {}: {e}", derived.display()))?;
    fs::copy(&source, derived.join(format!("main.{hash}.css")))
        .map_err(|e| format!("Could not copy main.css: {e}"))?;

    Ok(hash)
}
