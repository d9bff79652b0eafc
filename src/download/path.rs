//! Key to local path mapping

use std::path::{Component, Path, PathBuf};

use crate::error::DownloadError;

/// Relative local path for `key` listed under `prefix`.
///
/// The prefix is stripped, then at most one leading `/`. A key equal to the
/// prefix maps to `""` for a directory marker (the destination root itself)
/// and to its last path segment otherwise, so that downloading a single
/// object by its full key lands the file directly under the destination.
pub fn relative_path(key: &str, prefix: &str) -> Result<String, DownloadError> {
    let invalid = || DownloadError::InvalidKey {
        key: key.to_string(),
        prefix: prefix.to_string(),
    };

    if key.len() > prefix.len() {
        let rest = key.strip_prefix(prefix).ok_or_else(invalid)?;
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        return Ok(rest.to_string());
    }

    if key != prefix {
        return Err(invalid());
    }

    if key.ends_with('/') {
        return Ok(String::new());
    }
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(invalid()),
    }
}

/// Join the mapped key onto `root`, refusing anything that would escape it.
///
/// A leading `/` left over from a doubled separator is dropped, since every
/// component is pushed onto `root` anyway.
pub fn local_path(root: &Path, key: &str, prefix: &str) -> Result<PathBuf, DownloadError> {
    let relative = relative_path(key, prefix)?;

    let mut path = root.to_path_buf();
    for component in Path::new(&relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(DownloadError::InvalidKey {
                    key: key.to_string(),
                    prefix: prefix.to_string(),
                });
            }
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_with_trailing_slash() {
        assert_eq!(
            relative_path("photos/2020/a.jpg", "photos/").unwrap(),
            "2020/a.jpg"
        );
    }

    #[test]
    fn strips_exactly_one_separator_after_prefix() {
        assert_eq!(relative_path("photos/a.jpg", "photos").unwrap(), "a.jpg");
        assert_eq!(relative_path("photos//a.jpg", "photos").unwrap(), "/a.jpg");
    }

    #[test]
    fn empty_prefix_keeps_key() {
        assert_eq!(relative_path("a/b.txt", "").unwrap(), "a/b.txt");
    }

    #[test]
    fn directory_marker_for_prefix_maps_to_root() {
        assert_eq!(relative_path("photos/", "photos/").unwrap(), "");
        let root = Path::new("/out");
        assert_eq!(local_path(root, "photos/", "photos/").unwrap(), root);
    }

    #[test]
    fn exact_object_key_maps_to_file_name() {
        assert_eq!(
            relative_path("reports/2024.csv", "reports/2024.csv").unwrap(),
            "2024.csv"
        );
    }

    #[test]
    fn key_outside_prefix_is_rejected() {
        let err = relative_path("other/a.txt", "photos/").unwrap_err();
        assert_eq!(err.kind(), "invalid_key");
        assert!(relative_path("ph", "photos/").is_err());
    }

    #[test]
    fn parent_components_are_rejected() {
        let root = Path::new("/out");
        assert!(local_path(root, "d/../../etc/passwd", "d/").is_err());
        assert_eq!(
            local_path(root, "d/./x/y.txt", "d/").unwrap(),
            PathBuf::from("/out/x/y.txt")
        );
    }

    #[test]
    fn doubled_separator_stays_under_root() {
        assert_eq!(
            local_path(Path::new("/out"), "d//a.txt", "d").unwrap(),
            PathBuf::from("/out/a.txt")
        );
        assert!(local_path(Path::new("/out"), "d//../a.txt", "d").is_err());
    }

    #[test]
    fn nested_directory_marker_maps_inside_root() {
        assert_eq!(
            local_path(Path::new("/out"), "d/empty/", "d/").unwrap(),
            PathBuf::from("/out/empty")
        );
    }
}
