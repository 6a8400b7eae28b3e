//! Locating model output files for a set of variables.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};

/// Build the file-name pattern for the requested variables.
///
/// A file matches when its name contains `<variable>_<YYYYMMDDHH>` for one
/// of the variables, with the variable not glued to a preceding letter or
/// digit. Matching ignores case.
pub fn variables_pattern(variables: &[&str]) -> NetCdfResult<Regex> {
    let alternatives = variables
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"(?:^|[^A-Za-z0-9])(?:{})_\d{{10}}", alternatives))
        .case_insensitive(true)
        .build()
        .map_err(|e| NetCdfError::InvalidFormat(format!("variable pattern: {}", e)))
}

/// All `*.nc` files in `folder`, sorted by name.
pub fn list_netcdf_files(folder: &Path) -> NetCdfResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file() && path.extension().map_or(false, |ext| ext == "nc")
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Files in `folder` holding any of `variables`, sorted by name.
pub fn find_variable_files(folder: &Path, variables: &[&str]) -> NetCdfResult<Vec<PathBuf>> {
    let pattern = variables_pattern(variables)?;
    let all = list_netcdf_files(folder)?;
    debug!(folder = %folder.display(), candidates = all.len(), "Scanning data folder");

    let matched: Vec<PathBuf> = all
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |name| pattern.is_match(name))
        })
        .collect();

    if matched.is_empty() {
        return Err(NetCdfError::NoMatchingFiles {
            folder: folder.display().to_string(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
        });
    }
    info!(files = matched.len(), ?variables, "Found model files");
    Ok(matched)
}
