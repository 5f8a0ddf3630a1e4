use crate::book::slug::slugify;
use crate::book::song::{SongId, SongRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Base slug for a title, never empty: a title with no sluggable
/// characters at all still needs a working page URL.
fn base_slug(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        warn!("title \"{title}\" has no sluggable characters; using \"untitled\"");
        "untitled".to_string()
    } else {
        slug
    }
}

/// Lookup table from slugs to candidate songs.
///
/// Building the index also assigns every song its final, globally unique
/// slug. The lookup side is deliberately looser than the assignment side:
/// a slug maps to every song whose primary title slugifies to it plus every
/// song registered under it by an `AKA:` alias, so one slug can carry
/// several candidates. Disambiguation is the linker's job.
#[derive(Debug, Default)]
pub struct SlugIndex {
    by_slug: BTreeMap<String, Vec<SongId>>,
}

impl SlugIndex {
    /// Assign collision-free slugs and build the alias-aware lookup index.
    ///
    /// Songs are grouped by the slug of their primary title in input order.
    /// The first member of a group keeps the bare slug; each later member
    /// gets `{slug}-{n}` with n counting up from 2, skipping any candidate
    /// that is already a group slug or was already assigned. Checking
    /// against the full set makes the outcome independent of group
    /// iteration order.
    pub fn build(songs: &mut [SongRecord]) -> SlugIndex {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, song) in songs.iter().enumerate() {
            groups.entry(base_slug(&song.title)).or_default().push(index);
        }

        let mut taken: BTreeSet<String> = groups.keys().cloned().collect();
        for (slug, members) in &groups {
            let mut number = 2u32;
            for (position, &index) in members.iter().enumerate() {
                if position == 0 {
                    songs[index].slug = slug.clone();
                    continue;
                }
                loop {
                    let candidate = format!("{slug}-{number}");
                    number += 1;
                    if taken.contains(&candidate) {
                        continue;
                    }
                    info!(
                        "multiple songs with the slug \"{slug}\": \"{}\" is using \"{candidate}\" instead",
                        songs[index].title
                    );
                    taken.insert(candidate.clone());
                    songs[index].slug = candidate;
                    break;
                }
            }
        }

        let mut by_slug: BTreeMap<String, Vec<SongId>> = BTreeMap::new();
        for (slug, members) in groups {
            by_slug.insert(slug, members.into_iter().map(SongId).collect());
        }
        // Aliases share the lookup space without consuming a slug.
        for (index, song) in songs.iter().enumerate() {
            for alias in &song.aka {
                by_slug.entry(slugify(alias)).or_default().push(SongId(index));
            }
        }

        SlugIndex { by_slug }
    }

    /// All songs reachable under `slug`, primary titles before aliases,
    /// each list in input order.
    pub fn candidates(&self, slug: &str) -> &[SongId] {
        self.by_slug.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }
}
