//! Write a signed push package to disk.

use courier_safari::{SafariOptions, SigningMaterial, build_package};
use std::path::Path;

use crate::error::CliResult;
use crate::settings::CourierSettings;

/// Build the package and return its size in bytes.
pub fn run(settings: &CourierSettings, output: &Path) -> CliResult<usize> {
    let safari = settings.safari()?;
    let signing = SigningMaterial::from_files(&safari.cert_path, &safari.apple_root_path)?;
    let options = SafariOptions::new(safari.website, signing, safari.icons_dir);

    let package = build_package(&options)?;
    std::fs::write(output, &package)?;
    Ok(package.len())
}
