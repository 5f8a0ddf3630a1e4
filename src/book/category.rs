use crate::book::slug::slugify;
use crate::book::song::{CategoryId, SongId, SongRecord};
use std::collections::BTreeMap;
use tracing::warn;

/// A named grouping of songs discovered from their `Tags:` values.
#[derive(Debug, Clone)]
pub struct Category {
    /// Canonical spelling: the most frequent one among the songs that
    /// reference this category's slug.
    pub name: String,
    pub slug: String,
    /// Appended during linking, in song-processing order.
    pub members: Vec<SongId>,
}

/// One category per distinct tag slug.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    by_slug: BTreeMap<String, CategoryId>,
}

impl CategoryRegistry {
    /// Scan every song's tag values and create one category per distinct
    /// slug, named by the most frequent original spelling. Frequency ties
    /// go to the spelling first encountered in load order. All categories
    /// exist before any membership is resolved.
    pub fn discover(songs: &[SongRecord]) -> CategoryRegistry {
        // Spelling counts per slug, spellings kept in first-seen order so
        // the tie-break stays deterministic.
        let mut spellings_by_slug: BTreeMap<String, Vec<(String, usize)>> = BTreeMap::new();
        for song in songs {
            for spelling in &song.tags {
                let slug = slugify(spelling);
                if slug.is_empty() {
                    warn!("tag \"{spelling}\" has no sluggable characters; skipping it");
                    continue;
                }
                let spellings = spellings_by_slug.entry(slug).or_default();
                match spellings.iter_mut().find(|(s, _)| s == spelling) {
                    Some((_, count)) => *count += 1,
                    None => spellings.push((spelling.clone(), 1)),
                }
            }
        }

        let mut registry = CategoryRegistry::default();
        for (slug, spellings) in spellings_by_slug {
            let mut name = "";
            let mut best = 0usize;
            for (spelling, count) in &spellings {
                if *count > best {
                    best = *count;
                    name = spelling.as_str();
                }
            }
            let id = CategoryId(registry.categories.len());
            registry.by_slug.insert(slug.clone(), id);
            registry.categories.push(Category {
                name: name.to_string(),
                slug,
                members: Vec::new(),
            });
        }
        registry
    }

    pub fn lookup(&self, slug: &str) -> Option<CategoryId> {
        self.by_slug.get(slug).copied()
    }

    pub fn get(&self, id: CategoryId) -> &Category {
        &self.categories[id.0]
    }

    pub fn get_mut(&mut self, id: CategoryId) -> &mut Category {
        &mut self.categories[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &Category)> {
        self.categories
            .iter()
            .enumerate()
            .map(|(index, category)| (CategoryId(index), category))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::tagtext;

    fn songs_from(texts: &[&str]) -> Vec<SongRecord> {
        texts
            .iter()
            .map(|text| SongRecord::from_parsed(tagtext::parse(text), None))
            .collect()
    }

    #[test]
    fn most_frequent_spelling_becomes_the_canonical_name() {
        let songs = songs_from(&[
            "Title: A\nTags: Hymns\n\nx\n",
            "Title: B\nTags: hymns\n\nx\n",
            "Title: C\nTags: Hymns\n\nx\n",
        ]);
        let registry = CategoryRegistry::discover(&songs);
        assert_eq!(registry.len(), 1);
        let id = registry.lookup("hymns").expect("category exists");
        assert_eq!(registry.get(id).name, "Hymns");
        assert_eq!(registry.get(id).slug, "hymns");
    }

    #[test]
    fn frequency_ties_go_to_the_first_spelling_seen() {
        let songs = songs_from(&[
            "Title: A\nTags: sea shanties\n\nx\n",
            "Title: B\nTags: Sea Shanties\n\nx\n",
        ]);
        let registry = CategoryRegistry::discover(&songs);
        let id = registry.lookup("sea-shanties").expect("category exists");
        assert_eq!(registry.get(id).name, "sea shanties");
    }

    #[test]
    fn one_category_per_distinct_slug() {
        let songs = songs_from(&[
            "Title: A\nTags: Hymns, Classics\n\nx\n",
            "Title: B\nTags: classics!\n\nx\n",
        ]);
        let registry = CategoryRegistry::discover(&songs);
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("hymns").is_some());
        assert!(registry.lookup("classics").is_some());
        assert!(registry.lookup("ballads").is_none());
    }
}
