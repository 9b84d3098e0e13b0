use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::types::Result;

/// Writes the rendered page where the static site is served from:
/// `<output_dir>/index.html`, plus the `.nojekyll` marker so GitHub
/// Pages serves the files untouched. This page is the only artifact
/// kept between runs; each run overwrites it.
pub fn store_latest(output_dir: &Path, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let index = output_dir.join("index.html");
    fs::write(&index, html)?;
    fs::write(output_dir.join(".nojekyll"), "")?;
    info!("Wrote digest page to {}", index.display());
    Ok(index)
}
