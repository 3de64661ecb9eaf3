//! Path mapping between the local filesystem and object keys
//!
//! Object keys are always `/`-separated. A synced file keeps the name of the
//! directory being synced as its first segment after the sync prefix, so
//! `/home/me/proj/sub/b.txt` synced from `proj` becomes `sync/proj/sub/b.txt`.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Make `path` absolute against the current directory without touching the
/// filesystem
///
/// `.` and `..` are folded lexically, so `proj/..` names the parent of `proj`
/// even when `proj` is a symlink.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| Error::PathResolution {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Split a path into `/`-normalized segments, dropping empty ones
fn normalized_segments(path: &Path) -> Vec<String> {
    path.to_string_lossy()
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map a local file to its object key
///
/// Looks for the first segment equal to `root_dir_name` and keeps everything
/// from there on. When the root name never appears the whole normalized path
/// is used instead.
pub fn map_to_object_key(
    root_dir_name: &str,
    absolute_file_path: &Path,
    base_prefix: &str,
) -> Result<String> {
    let absolute = absolutize(absolute_file_path)?;
    let segments = normalized_segments(&absolute);

    let relative = match segments.iter().position(|s| s == root_dir_name) {
        Some(idx) => segments[idx..].join("/"),
        None => {
            tracing::warn!(
                root = root_dir_name,
                path = %absolute.display(),
                "Root directory not found in path, using full path as key"
            );
            segments
                .iter()
                .skip_while(|s| s.ends_with(':'))
                .cloned()
                .collect::<Vec<_>>()
                .join("/")
        }
    };

    Ok(format!("{base_prefix}{relative}"))
}

/// Last segment of an object key, used as the local file name on download
pub fn key_base_name(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Name of the directory being synced
pub fn root_dir_name(root: &Path) -> Result<String> {
    let absolute = absolutize(root)?;
    let name = absolute
        .components()
        .next_back()
        .and_then(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .ok_or_else(|| Error::PathResolution {
            path: root.to_path_buf(),
            reason: "path has no final component".into(),
        })?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_keeps_root_segment() {
        let key = map_to_object_key("proj", Path::new("/home/me/proj/sub/b.txt"), "sync/").unwrap();
        assert_eq!(key, "sync/proj/sub/b.txt");
    }

    #[test]
    fn test_map_uses_first_match() {
        let key =
            map_to_object_key("proj", Path::new("/data/proj/nested/proj/a.txt"), "sync/").unwrap();
        assert_eq!(key, "sync/proj/nested/proj/a.txt");
    }

    #[test]
    fn test_map_normalizes_backslashes() {
        let key =
            map_to_object_key("proj", Path::new("/c/Users/me\\proj\\sub\\b.txt"), "sync/").unwrap();
        assert_eq!(key, "sync/proj/sub/b.txt");
    }

    #[test]
    fn test_map_is_idempotent() {
        let path = Path::new("/srv/files/proj/a.txt");
        let first = map_to_object_key("proj", path, "sync/").unwrap();
        let second = map_to_object_key("proj", path, "sync/").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_map_fallback_when_root_missing() {
        // Degenerate: the root name never appears in the walked path
        let key = map_to_object_key("elsewhere", Path::new("/srv/files/a.txt"), "sync/").unwrap();
        assert_eq!(key, "sync/srv/files/a.txt");
    }

    #[test]
    fn test_map_relative_path_is_absolutized() {
        let cwd = std::env::current_dir().unwrap();
        let root = root_dir_name(&cwd).unwrap();
        let key = map_to_object_key(&root, Path::new("some_file.txt"), "").unwrap();
        assert_eq!(key, format!("{root}/some_file.txt"));
    }

    #[test]
    fn test_key_base_name() {
        assert_eq!(key_base_name("sync/proj/a.txt"), "a.txt");
        assert_eq!(key_base_name("a.txt"), "a.txt");
        assert_eq!(key_base_name("sync/proj/"), "proj");
    }

    #[test]
    fn test_root_dir_name() {
        assert_eq!(root_dir_name(Path::new("/home/me/proj")).unwrap(), "proj");
        assert_eq!(root_dir_name(Path::new("/home/me/proj/")).unwrap(), "proj");
        assert!(root_dir_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_absolutize_folds_dot_segments() {
        assert_eq!(
            absolutize(Path::new("/a/b/../c/./d")).unwrap(),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(absolutize(Path::new("/..")).unwrap(), PathBuf::from("/"));
    }

    #[test]
    fn test_root_dir_name_of_parent_reference() {
        assert_eq!(root_dir_name(Path::new("/home/me/proj/..")).unwrap(), "me");
        assert_eq!(root_dir_name(Path::new("/home/me/proj/.")).unwrap(), "proj");

        let cwd = std::env::current_dir().unwrap();
        let parent = cwd.parent().and_then(|p| p.file_name());
        if let Some(parent) = parent {
            assert_eq!(
                root_dir_name(Path::new("..")).unwrap(),
                parent.to_string_lossy()
            );
        }
    }

    #[test]
    fn test_map_through_parent_reference() {
        let key =
            map_to_object_key("proj", Path::new("/home/me/proj/sub/../b.txt"), "sync/").unwrap();
        assert_eq!(key, "sync/proj/b.txt");
    }
}
