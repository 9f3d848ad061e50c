//! File access for `include`.
//!
//! The interpreter never touches the file system itself.  Hosts that want
//! `include` hand it a [`FileLoader`]; without one, `include` fails with
//! [`ErrorKind::IncludeUnsupported`](crate::error::ErrorKind::IncludeUnsupported)
//! and everything else keeps working.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

/// Resolves an (already resolved) path to the file's contents.
pub type FileLoader = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

/// A loader backed by the local file system.
pub fn fs_loader() -> FileLoader {
    Arc::new(|path: &str| {
        debug!(path, "reading include");
        std::fs::read_to_string(path).map_err(|e| e.to_string())
    })
}

/// A loader serving files from memory, keyed by resolved path.  Handy for
/// tests and for hosts that bundle their documents.
pub fn memory_loader<I, K, V>(files: I) -> FileLoader
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let files: std::collections::HashMap<String, String> = files
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    Arc::new(move |path: &str| {
        files
            .get(path)
            .cloned()
            .ok_or_else(|| format!("no such file: {path}"))
    })
}

/// Resolve `target` against the directory of `current` (the including file).
///
/// Absolute targets are returned unchanged.  `.` components are dropped and
/// `..` pops a preceding normal component where there is one, so that
/// diagnostics show tidy paths.
pub fn resolve_path(current: &str, target: &str) -> String {
    let target_path = Path::new(target);
    if target_path.is_absolute() {
        return target.to_owned();
    }
    let base = Path::new(current).parent().unwrap_or_else(|| Path::new(""));
    normalize(&base.join(target_path)).to_string_lossy().into_owned()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
