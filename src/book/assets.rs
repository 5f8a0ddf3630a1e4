use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Copy files and their directory structure from `static_dir` into the
/// destination, returning the relative paths written.
///
/// Directories are created only where files land, so empty source
/// directories never reach the destination (reconciliation would clear
/// them again anyway). A destination entry of the wrong kind, like a file
/// where a directory is needed or a directory where a file lands, is
/// replaced.
pub fn copy_static(static_dir: &Path, destination: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut copied = BTreeSet::new();
    if !static_dir.is_dir() {
        info!("no static dir found at \"{}\"", static_dir.display());
        return Ok(copied);
    }

    for entry in WalkDir::new(static_dir).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to walk {}", static_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(static_dir)
            .with_context(|| format!("failed to walk {}", static_dir.display()))?
            .to_path_buf();
        let out_path = destination.join(&relative);

        if let Some(parent) = out_path.parent()
            && !parent.is_dir()
        {
            if parent.exists() {
                fs::remove_file(parent)
                    .with_context(|| format!("failed to replace {}", parent.display()))?;
            }
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        if out_path.is_dir() {
            fs::remove_dir_all(&out_path)
                .with_context(|| format!("failed to replace {}", out_path.display()))?;
        }
        fs::copy(entry.path(), &out_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                entry.path().display(),
                out_path.display()
            )
        })?;
        copied.insert(relative);
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_files_and_reports_relative_paths() {
        let tmp = tempdir().expect("tempdir");
        let src = tmp.path().join("static");
        let dest = tmp.path().join("site");
        fs::create_dir_all(src.join("css")).expect("mkdir");
        fs::write(src.join("css/style.css"), "body {}").expect("write");
        fs::write(src.join("favicon.ico"), "icon").expect("write");

        let copied = copy_static(&src, &dest).expect("copy");
        let expected: BTreeSet<PathBuf> =
            [PathBuf::from("css/style.css"), PathBuf::from("favicon.ico")]
                .into_iter()
                .collect();
        assert_eq!(copied, expected);
        assert_eq!(
            fs::read_to_string(dest.join("css/style.css")).expect("read"),
            "body {}"
        );
    }

    #[test]
    fn empty_directories_are_not_created() {
        let tmp = tempdir().expect("tempdir");
        let src = tmp.path().join("static");
        let dest = tmp.path().join("site");
        fs::create_dir_all(src.join("empty")).expect("mkdir");
        fs::create_dir_all(src.join("full")).expect("mkdir");
        fs::write(src.join("full/a.txt"), "a").expect("write");

        copy_static(&src, &dest).expect("copy");
        assert!(!dest.join("empty").exists());
        assert!(dest.join("full/a.txt").is_file());
    }

    #[test]
    fn missing_static_dir_copies_nothing() {
        let tmp = tempdir().expect("tempdir");
        let copied =
            copy_static(&tmp.path().join("static"), &tmp.path().join("site")).expect("copy");
        assert!(copied.is_empty());
    }

    #[test]
    fn a_directory_in_the_way_of_a_file_is_replaced() {
        let tmp = tempdir().expect("tempdir");
        let src = tmp.path().join("static");
        let dest = tmp.path().join("site");
        fs::create_dir_all(&src).expect("mkdir");
        fs::write(src.join("page.html"), "static page").expect("write");
        fs::create_dir_all(dest.join("page.html")).expect("mkdir conflict");

        copy_static(&src, &dest).expect("copy");
        assert_eq!(
            fs::read_to_string(dest.join("page.html")).expect("read"),
            "static page"
        );
    }
}
