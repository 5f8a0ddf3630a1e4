use crate::book::paths::SitePaths;
use crate::book::{assets, load, reconcile, render};
use crate::commands::CommandReport;
use crate::config::{self, ShadowPolicy};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub keep: Vec<String>,
}

/// One full generation pass: load and link the songbook, render pages,
/// copy static assets, then reconcile the destination so nothing stale
/// survives.
pub fn run(opts: &BuildOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("build");

    let cfg = config::load(&opts.source)?;
    config::validate_keep(&opts.keep)?;
    let destination = cfg.destination(&opts.source, opts.destination.as_deref());
    let paths = SitePaths::resolve(&opts.source, &destination);
    report.detail(format!("source={}", paths.source_root.display()));
    report.detail(format!("destination={}", paths.destination.display()));

    let mut book = load::load(&paths)?;
    // Check the templates before the destination is touched: a missing
    // required template aborts with no partial output.
    let templates = render::TemplateSet::open(&paths.templates_dir)?;
    render::render_song_bodies(&mut book.songs);

    fs::create_dir_all(&paths.destination)
        .with_context(|| format!("failed to create {}", paths.destination.display()))?;

    // The shadow policy decides who writes last when a generated page and
    // a static asset land on the same path.
    let (generated, copied) = match cfg.build.shadow {
        ShadowPolicy::Generated => {
            let copied = assets::copy_static(&paths.static_dir, &paths.destination)?;
            let generated = render::render_site(&book, &templates, &paths.destination)?;
            (generated, copied)
        }
        ShadowPolicy::Static => {
            let generated = render::render_site(&book, &templates, &paths.destination)?;
            let copied = assets::copy_static(&paths.static_dir, &paths.destination)?;
            (generated, copied)
        }
    };

    let winner = match cfg.build.shadow {
        ShadowPolicy::Generated => "the generated page",
        ShadowPolicy::Static => "the static file",
    };
    for path in reconcile::shadowed(&generated, &copied) {
        let message = format!(
            "\"{}\" is produced by both a template and a static file; {winner} wins",
            path.display()
        );
        warn!("{message}");
        report.issue(message);
    }

    let mut preserve: BTreeSet<PathBuf> = BTreeSet::new();
    preserve.extend(generated.iter().cloned());
    preserve.extend(copied.iter().cloned());
    for keep in cfg.build.keep.iter().chain(opts.keep.iter()) {
        preserve.insert(PathBuf::from(keep));
    }

    let outcome = reconcile::reconcile(&paths.destination, &preserve)?;

    report.detail(format!("songs={}", book.songs.len()));
    report.detail(format!("categories={}", book.categories.len()));
    report.detail(format!("generated={}", generated.len()));
    report.detail(format!("copied={}", copied.len()));
    report.detail(format!("removed={}", outcome.removed));
    if outcome.failed > 0 {
        report.issue(format!(
            "{} stale entries could not be deleted from the destination",
            outcome.failed
        ));
    }

    Ok(report)
}
