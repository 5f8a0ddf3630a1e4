use crate::book::tagtext::ParsedFile;
use std::collections::BTreeSet;
use tracing::warn;

pub const SONG_EXTENSION: &str = ".txt";

/// Index of a song within one load's `Songbook::songs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SongId(pub usize);

/// Index of a category within one load's `CategoryRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryId(pub usize);

/// One song with its recognized metadata.
///
/// Created once per source file; `slug` is assigned by the slug index and
/// `see_refs`/`memberships` are filled in by the single linking pass. The
/// record is not mutated after that.
#[derive(Debug, Clone, Default)]
pub struct SongRecord {
    pub title: String,
    pub copyright: Option<String>,
    pub source: Option<String>,
    pub tune: Option<String>,
    pub aka: Vec<String>,
    pub see: Vec<String>,
    pub tags: Vec<String>,
    pub raw_body: String,
    pub rendered_body: String,
    pub slug: String,
    /// `see` titles paired with the song they resolved to, if any.
    pub see_refs: Vec<(String, Option<SongId>)>,
    /// Original tag spellings paired with the category they resolved to.
    pub memberships: Vec<(String, Option<CategoryId>)>,
}

/// Split a multi-valued tag on commas, trimming each segment and dropping
/// empties. Order and duplicates are preserved.
pub fn split_values(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

impl SongRecord {
    /// Build a record from parsed file content.
    ///
    /// Tag keys are matched case-insensitively; unrecognized keys and
    /// repeats of an already-accepted key are diagnosed and dropped. A
    /// missing title falls back on the filename (underscores become
    /// spaces, the song extension is stripped), or "Unknown" without one.
    pub fn from_parsed(parsed: ParsedFile, filename: Option<&str>) -> Self {
        let label = filename.unwrap_or("<no file>");
        let mut record = SongRecord {
            raw_body: parsed.body,
            ..SongRecord::default()
        };
        let mut title = None;
        let mut seen = BTreeSet::new();

        for (key, value) in parsed.tags {
            let tag = key.to_lowercase();
            if !matches!(
                tag.as_str(),
                "copyright" | "source" | "title" | "tune" | "aka" | "see" | "tags"
            ) {
                warn!("ignoring unrecognized tag \"{key}\" in file \"{label}\"");
                continue;
            }
            if !seen.insert(tag.clone()) {
                warn!("ignoring duplicate tag \"{tag}\" found in file \"{label}\"");
                continue;
            }
            match tag.as_str() {
                "copyright" => record.copyright = Some(value),
                "source" => record.source = Some(value),
                "title" => title = Some(value),
                "tune" => record.tune = Some(value),
                "aka" => record.aka = split_values(&value),
                "see" => record.see = split_values(&value),
                "tags" => record.tags = split_values(&value),
                _ => {}
            }
        }

        record.title = match title {
            Some(title) => title,
            None => {
                let fallback = match filename {
                    Some(name) => {
                        let mut spaced = name.replace('_', " ");
                        if spaced.ends_with(SONG_EXTENSION) {
                            spaced.truncate(spaced.len() - SONG_EXTENSION.len());
                        }
                        spaced
                    }
                    None => "Unknown".to_string(),
                };
                warn!("no title found in file \"{label}\", falling back on \"{fallback}\"");
                fallback
            }
        };

        record
    }
}
