use crate::book::load;
use crate::book::paths::SitePaths;
use crate::book::render::TemplateSet;
use crate::commands::CommandReport;
use crate::config;
use anyhow::Result;
use std::path::Path;

/// Parse and link the songbook without writing any output. Structural
/// problems with the source still abort, but a missing template is only
/// reported, since nothing is being rendered.
pub fn run(source: &Path) -> Result<CommandReport> {
    let mut report = CommandReport::new("check");

    let cfg = config::load(source)?;
    let destination = cfg.destination(source, None);
    let paths = SitePaths::resolve(source, &destination);
    report.detail(format!("source={}", paths.source_root.display()));

    let book = load::load(&paths)?;
    report.detail(format!("songs={}", book.songs.len()));
    report.detail(format!("categories={}", book.categories.len()));

    let unresolved: Vec<String> = book
        .songs
        .iter()
        .flat_map(|song| {
            song.see_refs
                .iter()
                .filter(|(_, resolved)| resolved.is_none())
                .map(move |(title, _)| format!("\"{}\" -> \"{title}\"", song.title))
        })
        .collect();
    report.detail(format!("unresolved_see_refs={}", unresolved.len()));
    for reference in unresolved {
        report.issue(format!("unresolved see reference: {reference}"));
    }

    let uncategorized = book
        .songs
        .iter()
        .filter(|song| song.memberships.is_empty())
        .count();
    report.detail(format!("uncategorized_songs={uncategorized}"));

    for name in TemplateSet::missing_required(&paths.templates_dir) {
        report.issue(format!("required template \"{name}\" not found"));
    }

    Ok(report)
}
