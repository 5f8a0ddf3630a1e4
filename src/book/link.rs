use crate::book::category::CategoryRegistry;
use crate::book::index::SlugIndex;
use crate::book::slug::slugify;
use crate::book::song::{CategoryId, SongId, SongRecord};
use tracing::{debug, info, warn};

/// Outcome of a fuzzy title lookup.
///
/// Ambiguity is data, not control flow: the caller always gets a usable
/// pick plus enough information to diagnose what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleMatch {
    Resolved(SongId),
    /// More than one song survived every narrowing stage; the first is the
    /// deterministic pick, the rest are the alternatives.
    Ambiguous(SongId, Vec<SongId>),
    Unresolved,
}

impl TitleMatch {
    pub fn best(&self) -> Option<SongId> {
        match self {
            Self::Resolved(id) | Self::Ambiguous(id, _) => Some(*id),
            Self::Unresolved => None,
        }
    }
}

/// Find the song a title refers to.
///
/// Titles may differ slightly (capitalization, punctuation) as long as they
/// share a slug. When several songs share the slug, narrow to exact title
/// matches, then to exact-title-or-alias matches. An alias match never
/// outweighs a direct title match: if both exist, the direct titles win and
/// the overlap is diagnosed.
pub fn song_for_title(title: &str, songs: &[SongRecord], index: &SlugIndex) -> TitleMatch {
    let slug = slugify(title);
    let candidates = index.candidates(&slug);
    match candidates {
        [] => return TitleMatch::Unresolved,
        [only] => return TitleMatch::Resolved(*only),
        _ => {}
    }

    let title_matches: Vec<SongId> = candidates
        .iter()
        .copied()
        .filter(|id| songs[id.0].title == title)
        .collect();
    let alias_matches: Vec<SongId> = candidates
        .iter()
        .copied()
        .filter(|id| {
            let song = &songs[id.0];
            song.title == title || song.aka.iter().any(|alias| alias == title)
        })
        .collect();

    let narrowed = if !title_matches.is_empty() && alias_matches.len() > title_matches.len() {
        warn!(
            "title \"{title}\" is the title of a song and the alternate title of another (AKA: tag); only using the direct title"
        );
        title_matches
    } else {
        alias_matches
    };

    match narrowed.split_first() {
        None => {
            warn!(
                "title \"{title}\" has no exact matching song, but multiple songs share the slug \"{slug}\""
            );
            TitleMatch::Unresolved
        }
        Some((first, [])) => TitleMatch::Resolved(*first),
        Some((first, rest)) => {
            warn!(
                "title \"{title}\" matches {} songs; picking one deterministically",
                narrowed.len()
            );
            TitleMatch::Ambiguous(*first, rest.to_vec())
        }
    }
}

/// Find the category a tag value refers to. A miss is a normal
/// "uncategorized" outcome, not an error.
pub fn category_for_tag(name: &str, registry: &CategoryRegistry) -> Option<CategoryId> {
    let found = registry.lookup(&slugify(name));
    if found.is_none() {
        debug!("tag \"{name}\" does not match any discovered category");
    }
    found
}

/// Resolve every song's `see` and `tags` values into direct references.
///
/// Runs exactly once, after all songs and categories exist. Each song's
/// `see` list becomes `see_refs`, its `tags` list becomes `memberships`,
/// and every resolved category gains the song in its member list.
pub fn link_all(songs: &mut [SongRecord], index: &SlugIndex, registry: &mut CategoryRegistry) {
    for current in 0..songs.len() {
        let see = std::mem::take(&mut songs[current].see);
        let mut see_refs = Vec::with_capacity(see.len());
        for title in see {
            let resolved = song_for_title(&title, songs, index).best();
            if resolved.is_none() {
                info!(
                    "\"{}\" references song \"{title}\" ({}), but no matching song found",
                    songs[current].title,
                    slugify(&title)
                );
            }
            see_refs.push((title, resolved));
        }
        songs[current].see_refs = see_refs;

        let tags = std::mem::take(&mut songs[current].tags);
        let mut memberships = Vec::with_capacity(tags.len());
        for tag in tags {
            let category = category_for_tag(&tag, registry);
            if let Some(id) = category {
                registry.get_mut(id).members.push(SongId(current));
            }
            memberships.push((tag, category));
        }
        songs[current].memberships = memberships;
    }

    if !registry.is_empty() {
        let sizes: Vec<String> = registry
            .iter()
            .map(|(_, category)| format!("{}={}", category.slug, category.members.len()))
            .collect();
        info!("songs in {} categories: {}", registry.len(), sizes.join(" "));
    }
    let uncategorized: Vec<&str> = songs
        .iter()
        .filter(|song| song.memberships.is_empty())
        .map(|song| song.title.as_str())
        .collect();
    if !uncategorized.is_empty() {
        info!(
            "{} songs have no categories: {}",
            uncategorized.len(),
            uncategorized.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::category::CategoryRegistry;
    use crate::book::index::SlugIndex;
    use crate::book::tagtext;

    fn build_book(texts: &[&str]) -> (Vec<SongRecord>, SlugIndex, CategoryRegistry) {
        let mut songs: Vec<SongRecord> = texts
            .iter()
            .map(|text| SongRecord::from_parsed(tagtext::parse(text), None))
            .collect();
        let index = SlugIndex::build(&mut songs);
        let mut registry = CategoryRegistry::discover(&songs);
        link_all(&mut songs, &index, &mut registry);
        (songs, index, registry)
    }

    #[test]
    fn near_duplicate_spelling_resolves_through_the_slug() {
        let (songs, index, _) = build_book(&["Title: Scarborough Fair!\n\nx\n"]);
        let got = song_for_title("scarborough fair", &songs, &index);
        assert_eq!(got, TitleMatch::Resolved(SongId(0)));
    }

    #[test]
    fn unknown_title_is_unresolved() {
        let (songs, index, _) = build_book(&["Title: A\n\nx\n"]);
        assert_eq!(
            song_for_title("Missing", &songs, &index),
            TitleMatch::Unresolved
        );
    }

    #[test]
    fn exact_alias_match_outranks_a_loose_slug_match() {
        // "foo" is another song's primary title slug (case-only difference),
        // but the alias owner matches the query string exactly.
        let (songs, index, _) = build_book(&[
            "Title: FOO\n\nx\n",
            "Title: Something Else\nAKA: Foo\n\ny\n",
        ]);
        let got = song_for_title("Foo", &songs, &index);
        assert_eq!(got, TitleMatch::Resolved(SongId(1)));
        assert_eq!(songs[1].title, "Something Else");
    }

    #[test]
    fn direct_title_wins_over_an_alias_with_the_same_name() {
        let (songs, index, _) = build_book(&[
            "Title: Foo\n\nx\n",
            "Title: Bar\nAKA: Foo\n\ny\n",
        ]);
        let got = song_for_title("Foo", &songs, &index);
        assert_eq!(got, TitleMatch::Resolved(SongId(0)));
        assert_eq!(songs[0].title, "Foo");
    }

    #[test]
    fn shared_slug_without_exact_match_is_unresolved() {
        let (songs, index, _) = build_book(&["Title: FOO\n\nx\n", "Title: foo\n\ny\n"]);
        assert_eq!(
            song_for_title("Foo!", &songs, &index),
            TitleMatch::Unresolved
        );
    }

    #[test]
    fn duplicate_exact_titles_are_ambiguous_but_deterministic() {
        let (songs, index, _) = build_book(&["Title: Foo\n\nx\n", "Title: Foo\n\ny\n"]);
        match song_for_title("Foo", &songs, &index) {
            TitleMatch::Ambiguous(first, rest) => {
                assert_eq!(first, SongId(0));
                assert_eq!(rest, vec![SongId(1)]);
            }
            other => panic!("expected ambiguous match, got {other:?}"),
        }
    }

    #[test]
    fn linking_fills_see_refs_and_memberships() {
        let (songs, _, registry) = build_book(&[
            "Title: A\nTags: Hymns, Classics\nSee: B, Nowhere\n\nx\n",
            "Title: B\n\ny\n",
        ]);
        assert_eq!(
            songs[0].see_refs,
            vec![
                ("B".to_string(), Some(SongId(1))),
                ("Nowhere".to_string(), None),
            ]
        );
        assert_eq!(songs[0].memberships.len(), 2);
        for (_, category) in songs[0].memberships.iter() {
            let id = category.expect("tag resolves to a discovered category");
            assert_eq!(registry.get(id).members, vec![SongId(0)]);
        }
    }

    #[test]
    fn members_are_appended_in_song_order() {
        let (_, _, registry) = build_book(&[
            "Title: A\nTags: Hymns\n\nx\n",
            "Title: B\nTags: hymns\n\ny\n",
        ]);
        let id = registry.lookup("hymns").expect("category exists");
        assert_eq!(registry.get(id).members, vec![SongId(0), SongId(1)]);
    }
}
