// Regenerates include/pixelsynth.h with `cbindgen` when it is installed,
// otherwise copies the checked-in header to $OUT_DIR.

use std::{env, fs, path::PathBuf, process::Command};

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=include/pixelsynth.h");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("cargo sets OUT_DIR"));
    let header_repo = crate_dir.join("include").join("pixelsynth.h");
    let header_out = out_dir.join("pixelsynth.h");

    let generated = Command::new("cbindgen")
        .args(["--crate", "pixelsynth-ffi", "--lang", "C", "--output"])
        .arg(&header_out)
        .current_dir(&crate_dir)
        .status()
        .map(|s| s.success())
        .unwrap_or(false);

    if generated {
        let _ = fs::copy(&header_out, &header_repo);
        return;
    }
    if header_repo.exists() {
        fs::copy(&header_repo, &header_out).expect("copy include/pixelsynth.h to OUT_DIR");
    }
}
