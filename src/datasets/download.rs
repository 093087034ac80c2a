//! Raw-file acquisition.

use crate::{Error, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Download `url` into `dest`, idempotently.
///
/// Skips the request entirely when `dest` already exists. Writes to a
/// sibling `.part` file first so an interrupted download never leaves a
/// truncated file behind at `dest`.
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    if dest.exists() {
        debug!("{} already present, skipping download", dest.display());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    info!("downloading {url} -> {}", dest.display());
    let response = reqwest::blocking::get(url).map_err(|e| Error::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !response.status().is_success() {
        return Err(Error::Download {
            url: url.to_string(),
            reason: format!("HTTP status {}", response.status()),
        });
    }
    let bytes = response.bytes().map_err(|e| Error::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let partial = dest.with_extension("part");
    fs::write(&partial, &bytes)?;
    fs::rename(&partial, dest)?;
    Ok(())
}
