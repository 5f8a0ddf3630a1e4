use crate::book::category::CategoryRegistry;
use crate::book::index::SlugIndex;
use crate::book::link;
use crate::book::paths::SitePaths;
use crate::book::song::{SONG_EXTENSION, SongRecord};
use crate::book::tagtext;
use crate::error::SetupError;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A fully loaded and linked collection of songs.
#[derive(Debug)]
pub struct Songbook {
    pub songs: Vec<SongRecord>,
    pub index: SlugIndex,
    pub categories: CategoryRegistry,
}

fn ensure_layout(paths: &SitePaths) -> Result<(), SetupError> {
    if !paths.source_root.exists() {
        return Err(SetupError::SourceMissing(paths.source_root.clone()));
    }
    if !paths.source_root.is_dir() {
        return Err(SetupError::SourceNotADirectory(paths.source_root.clone()));
    }
    for required in [&paths.songs_dir, &paths.templates_dir] {
        if !required.is_dir() {
            let name = required
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(SetupError::SubdirMissing(name));
        }
    }
    Ok(())
}

/// Read every song file directly inside `dir`, sorted lexicographically by
/// file name so slug uniquification and tie-breaks are stable across
/// platforms. Subdirectories and other extensions are ignored.
fn songs_from_directory(dir: &Path) -> Result<Vec<SongRecord>> {
    let mut files: Vec<PathBuf> = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        let path = entry.path();
        let is_song = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(SONG_EXTENSION));
        if path.is_file() && is_song {
            files.push(path);
        }
    }
    files.sort();

    let mut songs = Vec::with_capacity(files.len());
    for path in files {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let filename = path.file_name().and_then(|name| name.to_str());
        songs.push(SongRecord::from_parsed(tagtext::parse(&text), filename));
    }
    Ok(songs)
}

/// One load-parse-link pass: check the source layout, parse every song,
/// assign slugs, discover categories, and resolve cross-references. The
/// result carries no state from earlier passes.
pub fn load(paths: &SitePaths) -> Result<Songbook> {
    ensure_layout(paths)?;

    let mut songs = songs_from_directory(&paths.songs_dir)?;
    info!("parsed {} songs", songs.len());

    let index = SlugIndex::build(&mut songs);
    let mut categories = CategoryRegistry::discover(&songs);
    link::link_all(&mut songs, &index, &mut categories);

    Ok(Songbook {
        songs,
        index,
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn site(root: &Path) -> SitePaths {
        SitePaths::resolve(root, &root.join("site"))
    }

    #[test]
    fn load_reads_only_song_files_in_sorted_order() {
        let tmp = tempdir().expect("tempdir");
        let paths = site(tmp.path());
        fs::create_dir_all(&paths.songs_dir).expect("mkdir songs");
        fs::create_dir_all(&paths.templates_dir).expect("mkdir templates");
        fs::write(paths.songs_dir.join("b.txt"), "Title: B\n\nx\n").expect("write");
        fs::write(paths.songs_dir.join("a.txt"), "Title: A\n\nx\n").expect("write");
        fs::write(paths.songs_dir.join("notes.md"), "not a song").expect("write");
        fs::create_dir_all(paths.songs_dir.join("nested")).expect("mkdir nested");

        let book = load(&paths).expect("load");
        let titles: Vec<&str> = book.songs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn missing_source_root_is_a_setup_error() {
        let tmp = tempdir().expect("tempdir");
        let paths = site(&tmp.path().join("nope"));
        let err = load(&paths).expect_err("must fail");
        match err.downcast_ref::<SetupError>() {
            Some(SetupError::SourceMissing(_)) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_required_subdirectory_is_a_setup_error() {
        let tmp = tempdir().expect("tempdir");
        let paths = site(tmp.path());
        fs::create_dir_all(&paths.songs_dir).expect("mkdir songs");

        let err = load(&paths).expect_err("must fail");
        match err.downcast_ref::<SetupError>() {
            Some(SetupError::SubdirMissing(name)) => assert_eq!(name, "templates"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
