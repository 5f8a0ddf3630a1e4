use crate::book::load::Songbook;
use crate::book::song::SongRecord;
use crate::error::SetupError;
use anyhow::{Context, Result, anyhow};
use pulldown_cmark::{Event, Options, Parser};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Templates every site needs. A missing one aborts the pass.
const REQUIRED_TEMPLATES: &[&str] = &["songs.html", "categories.html", "category.html", "song.html"];
/// Rendered to the destination root only when present.
const INDEX_TEMPLATE: &str = "index.html";

const SONGS_DIR: &str = "songs";
const CATEGORIES_DIR: &str = "categories";

/// Render a lyric body to HTML.
///
/// Soft line breaks become hard breaks so lyric lines survive as written,
/// and smart punctuation turns straight quotes and dashes into their
/// typographic forms.
pub fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events);
    html
}

pub fn render_song_bodies(songs: &mut [SongRecord]) {
    for song in songs {
        song.rendered_body = markdown_to_html(&song.raw_body);
    }
}

/// The Mustache templates of one source tree.
pub struct TemplateSet {
    dir: PathBuf,
}

impl TemplateSet {
    /// Required template names missing from `dir`.
    pub fn missing_required(dir: &Path) -> Vec<&'static str> {
        REQUIRED_TEMPLATES
            .iter()
            .copied()
            .filter(|name| !dir.join(name).is_file())
            .collect()
    }

    pub fn open(dir: &Path) -> Result<TemplateSet, SetupError> {
        if let Some(name) = Self::missing_required(dir).first() {
            return Err(SetupError::TemplateMissing((*name).to_string()));
        }
        Ok(TemplateSet {
            dir: dir.to_path_buf(),
        })
    }

    fn compile(&self, name: &str) -> Result<mustache::Template> {
        mustache::compile_path(self.dir.join(name))
            .map_err(|err| anyhow!("failed to compile template \"{name}\": {err}"))
    }
}

#[derive(Debug, Clone, Serialize)]
struct SongSummary {
    title: String,
    slug: String,
}

#[derive(Debug, Clone, Serialize)]
struct CategorySummary {
    name: String,
    slug: String,
    size: usize,
}

#[derive(Debug, Serialize)]
struct SeeRef {
    title: String,
    /// Slug of the resolved song; absent when the reference stayed
    /// unresolved.
    slug: Option<String>,
    resolved: bool,
}

#[derive(Debug, Serialize)]
struct MembershipRef {
    tag: String,
    name: Option<String>,
    slug: Option<String>,
}

#[derive(Debug, Serialize)]
struct SongPage {
    title: String,
    slug: String,
    body: String,
    copyright: Option<String>,
    source: Option<String>,
    tune: Option<String>,
    aka: Vec<String>,
    see: Vec<SeeRef>,
    categories: Vec<MembershipRef>,
}

#[derive(Debug, Serialize)]
struct SongsContext {
    songs: Vec<SongSummary>,
}

#[derive(Debug, Serialize)]
struct CategoriesContext {
    categories: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
struct CategoryContext {
    category: CategoryPage,
}

#[derive(Debug, Serialize)]
struct CategoryPage {
    name: String,
    slug: String,
    songs: Vec<SongSummary>,
}

#[derive(Debug, Serialize)]
struct SongContext {
    song: SongPage,
}

#[derive(Debug, Serialize)]
struct IndexContext {
    songs: Vec<SongSummary>,
    categories: Vec<CategorySummary>,
}

fn song_summary(song: &SongRecord) -> SongSummary {
    SongSummary {
        title: song.title.clone(),
        slug: song.slug.clone(),
    }
}

fn song_page(book: &Songbook, song: &SongRecord) -> SongPage {
    SongPage {
        title: song.title.clone(),
        slug: song.slug.clone(),
        body: song.rendered_body.clone(),
        copyright: song.copyright.clone(),
        source: song.source.clone(),
        tune: song.tune.clone(),
        aka: song.aka.clone(),
        see: song
            .see_refs
            .iter()
            .map(|(title, resolved)| SeeRef {
                title: title.clone(),
                slug: resolved.map(|id| book.songs[id.0].slug.clone()),
                resolved: resolved.is_some(),
            })
            .collect(),
        categories: song
            .memberships
            .iter()
            .map(|(tag, category)| MembershipRef {
                tag: tag.clone(),
                name: category.map(|id| book.categories.get(id).name.clone()),
                slug: category.map(|id| book.categories.get(id).slug.clone()),
            })
            .collect(),
    }
}

/// Render every site page into the destination, returning the set of
/// relative paths written.
pub fn render_site(
    book: &Songbook,
    templates: &TemplateSet,
    destination: &Path,
) -> Result<BTreeSet<PathBuf>> {
    for dir in ["", SONGS_DIR, CATEGORIES_DIR] {
        let path = destination.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
    }

    let song_summaries: Vec<SongSummary> = book.songs.iter().map(song_summary).collect();
    let category_summaries: Vec<CategorySummary> = book
        .categories
        .iter()
        .map(|(_, category)| CategorySummary {
            name: category.name.clone(),
            slug: category.slug.clone(),
            size: category.members.len(),
        })
        .collect();

    let mut generated = BTreeSet::new();

    let songs_index = templates.compile("songs.html")?;
    write_page(
        destination,
        PathBuf::from("songs.html"),
        &songs_index,
        &SongsContext {
            songs: song_summaries.clone(),
        },
        &mut generated,
    )?;

    let categories_index = templates.compile("categories.html")?;
    write_page(
        destination,
        PathBuf::from("categories.html"),
        &categories_index,
        &CategoriesContext {
            categories: category_summaries.clone(),
        },
        &mut generated,
    )?;

    let category_template = templates.compile("category.html")?;
    for (_, category) in book.categories.iter() {
        write_page(
            destination,
            Path::new(CATEGORIES_DIR).join(format!("{}.html", category.slug)),
            &category_template,
            &CategoryContext {
                category: CategoryPage {
                    name: category.name.clone(),
                    slug: category.slug.clone(),
                    songs: category
                        .members
                        .iter()
                        .map(|id| song_summary(&book.songs[id.0]))
                        .collect(),
                },
            },
            &mut generated,
        )?;
    }

    let song_template = templates.compile("song.html")?;
    for song in &book.songs {
        write_page(
            destination,
            Path::new(SONGS_DIR).join(format!("{}.html", song.slug)),
            &song_template,
            &SongContext {
                song: song_page(book, song),
            },
            &mut generated,
        )?;
    }

    if templates.dir.join(INDEX_TEMPLATE).is_file() {
        let index_template = templates.compile(INDEX_TEMPLATE)?;
        write_page(
            destination,
            PathBuf::from(INDEX_TEMPLATE),
            &index_template,
            &IndexContext {
                songs: song_summaries,
                categories: category_summaries,
            },
            &mut generated,
        )?;
    } else {
        debug!("no optional {INDEX_TEMPLATE} template, skipping");
    }

    Ok(generated)
}

fn write_page<T: Serialize>(
    destination: &Path,
    relative: PathBuf,
    template: &mustache::Template,
    data: &T,
    generated: &mut BTreeSet<PathBuf>,
) -> Result<()> {
    let html = template
        .render_to_string(data)
        .map_err(|err| anyhow!("failed to render page {}: {err}", relative.display()))?;
    let full = destination.join(&relative);
    fs::write(&full, html).with_context(|| format!("failed to write {}", full.display()))?;
    generated.insert(relative);
    Ok(())
}
