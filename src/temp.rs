//! Absolute temp locations for staging directories
//!
//! Staging never lands under the current directory, even with `TMPDIR=tmp`.

use std::env;
use std::path::PathBuf;

/// The system temp directory, forced absolute
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        return t;
    }
    #[cfg(windows)]
    {
        env::var("TEMP")
            .or_else(|_| env::var("TMP"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/tmp")
    }
}

/// Default parent of per-target staging directories
pub fn default_staging_root() -> PathBuf {
    temp_dir_base().join(format!("{}-staging", env!("CARGO_PKG_NAME")))
}
