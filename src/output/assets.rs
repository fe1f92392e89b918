//! Static asset mirroring into `<out>/assets`.
//!
//! The initial build copies the whole asset tree; in dev, each changed
//! path is mirrored on its own.

use std::fs;
use std::io;
use std::path::Path;

/// Copy `src_dir` into `dest_dir` recursively.
///
/// Files whose copy is at least as new as the source are skipped unless
/// `clean` is set. Returns the number of files copied.
pub fn copy_assets(src_dir: &Path, dest_dir: &Path, clean: bool) -> io::Result<usize> {
    if !src_dir.is_dir() {
        return Ok(0);
    }
    let mut count = 0;
    copy_dir_recursive(src_dir, dest_dir, clean, &mut count)?;
    Ok(count)
}

fn copy_dir_recursive(
    src_dir: &Path,
    dest_dir: &Path,
    clean: bool,
    count: &mut usize,
) -> io::Result<()> {
    for entry in fs::read_dir(src_dir)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest_dir.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path, clean, count)?;
            continue;
        }
        if !clean && dest_path.exists() && !is_newer_than(&src_path, &dest_path) {
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&src_path, &dest_path)?;
        *count += 1;
    }
    Ok(())
}

/// Mirror one changed path under `src_root` into `dest_root`.
///
/// Present files and directories are copied, vanished ones are removed
/// from the mirror. Returns `false` for paths outside `src_root`.
pub fn sync_asset(src_root: &Path, dest_root: &Path, path: &Path) -> io::Result<bool> {
    let Ok(rel) = path.strip_prefix(src_root) else {
        return Ok(false);
    };
    let dest = dest_root.join(rel);

    if path.is_dir() {
        copy_assets(path, &dest, false)?;
    } else if path.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &dest)?;
    } else if dest.is_dir() {
        fs::remove_dir_all(&dest)?;
    } else if dest.exists() {
        fs::remove_file(&dest)?;
    }
    Ok(true)
}

fn is_newer_than(src: &Path, dest: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(src), modified(dest)) {
        (Some(src), Some(dest)) => src > dest,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_copy_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("web/assets");
        let dest = temp.path().join("out/assets");
        write(&src, "logo.svg", "<svg/>");
        write(&src, "fonts/inter.woff2", "font");

        assert_eq!(copy_assets(&src, &dest, false).unwrap(), 2);
        assert_eq!(fs::read_to_string(dest.join("logo.svg")).unwrap(), "<svg/>");
        assert!(dest.join("fonts/inter.woff2").is_file());

        // Up to date: nothing copied unless forced.
        assert_eq!(copy_assets(&src, &dest, false).unwrap(), 0);
        assert_eq!(copy_assets(&src, &dest, true).unwrap(), 2);
    }

    #[test]
    fn test_missing_source_copies_nothing() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        assert_eq!(copy_assets(&temp.path().join("nope"), &dest, false).unwrap(), 0);
        assert!(!dest.exists());
    }

    #[test]
    fn test_sync_single_path() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("assets");
        let dest = temp.path().join("out");
        write(&src, "img/a.png", "v1");

        let file = src.join("img/a.png");
        assert!(sync_asset(&src, &dest, &file).unwrap());
        assert_eq!(fs::read_to_string(dest.join("img/a.png")).unwrap(), "v1");

        fs::remove_file(&file).unwrap();
        assert!(sync_asset(&src, &dest, &file).unwrap());
        assert!(!dest.join("img/a.png").exists());

        assert!(!sync_asset(&src, &dest, &temp.path().join("pages/Home.jsx")).unwrap());
    }
}
