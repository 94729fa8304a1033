use std::path::{Path, PathBuf};

/// Platform-specific operations abstracted behind a common interface.
/// Each OS provides its own `NativePlatform` implementation so call sites
/// remain free of `#[cfg]` blocks.
pub trait Platform {
    /// Set restrictive *directory* permissions (0o700 on Unix, no-op on Windows).
    fn restrict_dir_permissions(path: &Path);

    /// Set restrictive *file* permissions (0o600 on Unix, no-op on Windows).
    fn restrict_file_permissions(path: &Path);

    /// Open options for a truncating write that creates the file owner-only
    /// (0o600 on Unix), so secrets are never readable at the umask default.
    fn private_file_options() -> tokio::fs::OpenOptions;

    /// Binary filename for this platform (`"bankops"` / `"bankops.exe"`).
    fn binary_name() -> &'static str;

    /// Root data directory for bankops.
    /// Unix: `~/.bankops`, Windows: `%APPDATA%\bankops`.
    fn data_dir() -> PathBuf;
}

/// `BANKOPS_DATA_DIR` wins over the platform default so tests and
/// multi-profile setups can point the console somewhere else.
pub(crate) fn resolve_data_dir(default: PathBuf) -> PathBuf {
    match std::env::var("BANKOPS_DATA_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => default,
    }
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::NativePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativePlatform;
