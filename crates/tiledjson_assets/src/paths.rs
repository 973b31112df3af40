//! Relative path arithmetic for files referenced from Tiled documents.
//!
//! Tiled stores every reference (tileset `source`, tileset `image`, image
//! layer `image`) relative to the file that contains it. These helpers turn
//! such a reference into a path usable by the document and image
//! collaborators.

use std::path::{Component, Path, PathBuf};

use normalize_path::NormalizePath;

/// Marker returned by [`directory_of`] for paths without a directory part.
pub const CURRENT_DIR: &str = ".";

/// Resolve `relative_path` against the file `base_path` it was read from.
///
/// If `base_path` has no directory component the reference is returned
/// unchanged. Otherwise the reference is joined onto the base file's
/// directory and `.`/`..` components are folded, unless folding would climb
/// above the start of the joined path.
///
/// ```
/// use std::path::Path;
/// use tiledjson_assets::paths::resolve_relative;
///
/// assert_eq!(
///     resolve_relative("maps/level1.json", "tilesets/forest.json"),
///     Path::new("maps/tilesets/forest.json"),
/// );
/// assert_eq!(resolve_relative("level1.json", "forest.json"), Path::new("forest.json"));
/// ```
pub fn resolve_relative(base_path: impl AsRef<Path>, relative_path: impl AsRef<Path>) -> PathBuf {
    let relative_path = relative_path.as_ref();
    match base_path.as_ref().parent() {
        Some(dir) if !dir.as_os_str().is_empty() => join_normalized(dir, relative_path),
        _ => relative_path.to_path_buf(),
    }
}

/// Resolve `relative_path` against a directory (as opposed to a file).
pub fn resolve_in_dir(base_dir: impl AsRef<Path>, relative_path: impl AsRef<Path>) -> PathBuf {
    let base_dir = base_dir.as_ref();
    let relative_path = relative_path.as_ref();
    if base_dir.as_os_str().is_empty() || base_dir == Path::new(CURRENT_DIR) {
        return relative_path.to_path_buf();
    }
    join_normalized(base_dir, relative_path)
}

/// Directory portion of `path`, or [`CURRENT_DIR`] when there is none.
pub fn directory_of(path: impl AsRef<Path>) -> PathBuf {
    match path.as_ref().parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from(CURRENT_DIR),
    }
}

fn join_normalized(dir: &Path, relative_path: &Path) -> PathBuf {
    let joined = dir.join(relative_path);
    if climbs_above_start(&joined) {
        joined
    } else {
        joined.normalize()
    }
}

fn climbs_above_start(path: &Path) -> bool {
    let mut depth = 0i32;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            // Rooted paths cannot climb above the root.
            Component::RootDir | Component::Prefix(_) => return false,
            Component::CurDir => {}
        }
    }
    false
}
