//! Build script for cfgdiff - links a system DuckDB when the bundled build is off

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=DUCKDB_LIB_PATH");

    // Cargo exposes enabled features to build scripts through the environment
    if env::var_os("CARGO_FEATURE_BUNDLED").is_some() {
        return;
    }

    match find_duckdb_library() {
        Some(lib_path) => {
            println!("cargo:rustc-link-search=native={}", lib_path.display());
            println!("cargo:rustc-link-lib=duckdb");
        }
        None => {
            eprintln!("DuckDB library not found.");
            eprintln!("Install DuckDB, set DUCKDB_LIB_PATH, or build with --features bundled");
            panic!("DuckDB library not found");
        }
    }
}

fn find_duckdb_library() -> Option<PathBuf> {
    if let Ok(path) = env::var("DUCKDB_LIB_PATH") {
        let path = PathBuf::from(path);
        if has_duckdb(&path) {
            return Some(path);
        }
    }

    if let Ok(output) = Command::new("pkg-config")
        .args(["--libs-only-L", "duckdb"])
        .output()
    {
        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let found = stdout
                .split_whitespace()
                .filter_map(|flag| flag.strip_prefix("-L"))
                .map(PathBuf::from)
                .find(|path| has_duckdb(path));
            if found.is_some() {
                return found;
            }
        }
    }

    ["/opt/homebrew/lib", "/usr/local/lib", "/usr/lib", "/usr/lib/x86_64-linux-gnu", "/usr/lib64"]
        .iter()
        .map(PathBuf::from)
        .find(|path| has_duckdb(path))
}

fn has_duckdb(dir: &Path) -> bool {
    ["libduckdb.so", "libduckdb.dylib", "duckdb.lib", "libduckdb.a"]
        .iter()
        .any(|name| dir.join(name).exists())
}
