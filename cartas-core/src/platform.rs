//! OS-specific application directories.
//!
//! Both resolve under a `Cartas` folder: `%APPDATA%` on Windows,
//! `~/Library/Application Support` on macOS and the XDG dirs elsewhere.

use std::path::PathBuf;

use crate::error::{CtError, CtResult};

const DIR_NAME: &str = "Cartas";

/// Where the local store and logs live.
pub fn data_dir() -> CtResult<PathBuf> {
    dirs::data_dir()
        .map(|base| base.join(DIR_NAME))
        .ok_or_else(|| CtError::Config("could not determine data directory".into()))
}

/// Where `config.toml` is looked up by default.
pub fn config_dir() -> CtResult<PathBuf> {
    dirs::config_dir()
        .map(|base| base.join(DIR_NAME))
        .ok_or_else(|| CtError::Config("could not determine config directory".into()))
}
