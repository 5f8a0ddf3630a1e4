use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Which collaborator owns the destination bytes when a template and a
/// static file produce the same path. The collision itself is always
/// diagnosed; this only decides who writes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowPolicy {
    Generated,
    Static,
}

impl ShadowPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "generated" => Some(Self::Generated),
            "static" => Some(Self::Static),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub destination: String,
    pub keep: Vec<String>,
    pub shadow: ShadowPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            destination: "site".to_string(),
            keep: Vec::new(),
            shadow: ShadowPolicy::Generated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PartialSiteConfig {
    build: Option<PartialBuildConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PartialBuildConfig {
    destination: Option<String>,
    keep: Option<Vec<String>>,
    shadow: Option<ShadowPolicy>,
}

impl SiteConfig {
    /// Resolve the output directory. A `--destination` flag wins as typed;
    /// the configured value resolves relative to the source root.
    pub fn destination(&self, source_root: &Path, flag: Option<&Path>) -> PathBuf {
        if let Some(flag) = flag {
            return flag.to_path_buf();
        }
        let raw = Path::new(&self.build.destination);
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            source_root.join(raw)
        }
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_csv(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() { fallback.to_vec() } else { out }
        }
        Err(_) => fallback.to_vec(),
    }
}

fn env_or_shadow(var: &str, fallback: ShadowPolicy) -> ShadowPolicy {
    match env::var(var) {
        Ok(v) => ShadowPolicy::parse(&v).unwrap_or(fallback),
        Err(_) => fallback,
    }
}

/// Keep paths are interpreted relative to the destination; anything that
/// could point outside it is rejected up front.
pub fn validate_keep(keep: &[String]) -> Result<()> {
    for entry in keep {
        let path = Path::new(entry);
        if path.is_absolute() {
            return Err(anyhow!(
                "invalid keep path \"{entry}\": must be relative to the destination"
            ));
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(anyhow!(
                "invalid keep path \"{entry}\": must not traverse outside the destination"
            ));
        }
    }
    Ok(())
}

fn validate(cfg: &SiteConfig) -> Result<()> {
    if cfg.build.destination.trim().is_empty() {
        return Err(anyhow!("invalid destination: cannot be empty"));
    }
    validate_keep(&cfg.build.keep)
}

fn resolve_config_path(source_root: &Path) -> Option<PathBuf> {
    if let Ok(custom) = env::var("SONGBOOK_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let local = source_root.join("songbook.toml");
    if local.exists() {
        return Some(local);
    }

    let home = dirs::home_dir()?;
    Some(home.join(".config").join("songbook").join("songbook.toml"))
}

fn merge_file_config(base: &mut SiteConfig, source_root: &Path) -> Result<()> {
    let Some(path) = resolve_config_path(source_root) else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialSiteConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(build) = parsed.build {
        if let Some(destination) = build.destination {
            base.build.destination = destination;
        }
        if let Some(keep) = build.keep {
            base.build.keep = keep;
        }
        if let Some(shadow) = build.shadow {
            base.build.shadow = shadow;
        }
    }
    Ok(())
}

/// Defaults, then `songbook.toml`, then `SONGBOOK_*` environment overrides.
/// CLI flags are applied by the caller on top of the result.
pub fn load(source_root: &Path) -> Result<SiteConfig> {
    let mut cfg = SiteConfig::default();
    merge_file_config(&mut cfg, source_root)?;

    cfg.build.destination = env_or_string("SONGBOOK_DESTINATION", &cfg.build.destination);
    cfg.build.keep = env_or_csv("SONGBOOK_KEEP", &cfg.build.keep);
    cfg.build.shadow = env_or_shadow("SONGBOOK_SHADOW", cfg.build.shadow);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_absolute_keep_paths() {
        let mut cfg = SiteConfig::default();
        cfg.build.keep = vec!["/etc/passwd".to_string()];
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn validate_rejects_parent_traversal_in_keep_paths() {
        let mut cfg = SiteConfig::default();
        cfg.build.keep = vec!["../outside".to_string()];
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn destination_flag_wins_over_config() {
        let cfg = SiteConfig::default();
        let got = cfg.destination(Path::new("book"), Some(Path::new("out")));
        assert_eq!(got, PathBuf::from("out"));
    }

    #[test]
    fn configured_destination_resolves_against_source_root() {
        let cfg = SiteConfig::default();
        let got = cfg.destination(Path::new("book"), None);
        assert_eq!(got, PathBuf::from("book/site"));
    }

    #[test]
    fn shadow_parse_accepts_known_values_only() {
        assert_eq!(ShadowPolicy::parse("generated"), Some(ShadowPolicy::Generated));
        assert_eq!(ShadowPolicy::parse(" static "), Some(ShadowPolicy::Static));
        assert_eq!(ShadowPolicy::parse("both"), None);
    }
}
