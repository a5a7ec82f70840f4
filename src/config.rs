use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Extra gold-standard entries, tested before the built-in table.
    #[serde(default)]
    pub corrections: Vec<CorrectionEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest essay upload accepted by `POST /sessions/{id}/audit`.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Idle time after which a session and its data are dropped.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}
fn default_session_ttl_secs() -> u64 {
    4 * 60 * 60
}

/// Bounds for the in-text citation scanner.
#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    /// Minimum characters between `(` and the year.
    #[serde(default = "default_min_lead")]
    pub min_lead: usize,
    /// Maximum characters between `(` and the year.
    #[serde(default = "default_max_lead")]
    pub max_lead: usize,
    /// Maximum characters between the year and `)` (page qualifiers etc).
    #[serde(default = "default_max_trailing")]
    pub max_trailing: usize,
    /// Longest bracketed span, parentheses included, accepted as a citation.
    #[serde(default = "default_max_span")]
    pub max_span: usize,
    #[serde(default = "default_true")]
    pub quote_check: bool,
    #[serde(default = "default_quote_chars")]
    pub quote_chars: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            min_lead: default_min_lead(),
            max_lead: default_max_lead(),
            max_trailing: default_max_trailing(),
            max_span: default_max_span(),
            quote_check: true,
            quote_chars: default_quote_chars(),
        }
    }
}

fn default_min_lead() -> usize {
    2
}
fn default_max_lead() -> usize {
    100
}
fn default_max_trailing() -> usize {
    30
}
fn default_max_span() -> usize {
    120
}
fn default_true() -> bool {
    true
}
fn default_quote_chars() -> String {
    "\"\u{201C}\u{201D}".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size_pt")]
    pub font_size_pt: f32,
    /// PNG banner placed at the top of exported documents.
    #[serde(default)]
    pub banner: Option<PathBuf>,
    #[serde(default = "default_banner_width_inches")]
    pub banner_width_inches: f32,
    #[serde(default = "default_bibliography_heading")]
    pub bibliography_heading: String,
    #[serde(default = "default_report_heading")]
    pub report_heading: String,
    #[serde(default)]
    pub footer: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size_pt: default_font_size_pt(),
            banner: None,
            banner_width_inches: default_banner_width_inches(),
            bibliography_heading: default_bibliography_heading(),
            report_heading: default_report_heading(),
            footer: None,
        }
    }
}

fn default_font_family() -> String {
    "Arial".to_string()
}
fn default_font_size_pt() -> f32 {
    12.0
}
fn default_banner_width_inches() -> f32 {
    6.0
}
fn default_bibliography_heading() -> String {
    "Bibliography".to_string()
}
fn default_report_heading() -> String {
    "Referencing Report".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// A keyword and the canonical reference (in `*markup*`) that replaces any
/// entry mentioning it.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CorrectionEntry {
    pub keyword: String,
    pub citation: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Loads `path` if it exists, otherwise returns the defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }
    if config.server.session_ttl_secs == 0 {
        anyhow::bail!("server.session_ttl_secs must be > 0");
    }

    let audit = &config.audit;
    if audit.max_lead < audit.min_lead {
        anyhow::bail!("audit.max_lead must be >= audit.min_lead");
    }
    // "(" + lead + 4-digit year + ")"
    if audit.max_span < audit.min_lead + 6 {
        anyhow::bail!("audit.max_span is too small to hold any citation");
    }
    if config.audit.quote_check && audit.quote_chars.is_empty() {
        anyhow::bail!("audit.quote_chars must not be empty when quote_check is enabled");
    }

    let export = &config.export;
    if !(1.0..=96.0).contains(&export.font_size_pt) {
        anyhow::bail!("export.font_size_pt must be in [1, 96]");
    }
    if export.font_family.trim().is_empty() {
        anyhow::bail!("export.font_family must not be empty");
    }
    if export.banner_width_inches <= 0.0 {
        anyhow::bail!("export.banner_width_inches must be > 0");
    }

    for entry in &config.corrections {
        if crate::text::clean_text(&entry.keyword).is_empty() {
            anyhow::bail!("corrections: keyword must contain letters or digits");
        }
        if entry.citation.trim().is_empty() {
            anyhow::bail!(
                "corrections: citation for keyword '{}' must not be empty",
                entry.keyword
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.audit.max_lead, 100);
        assert_eq!(cfg.export.font_family, "Arial");
        assert!(cfg.corrections.is_empty());
    }

    #[test]
    fn parses_corrections_table() {
        let cfg: Config = toml::from_str(
            r#"
[audit]
max_trailing = 50

[[corrections]]
keyword = "HCPC"
citation = "Health and Care Professions Council (2016) *Standards*. London: HCPC."
"#,
        )
        .unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.audit.max_trailing, 50);
        assert_eq!(cfg.corrections.len(), 1);
        assert_eq!(cfg.corrections[0].keyword, "HCPC");
    }

    #[test]
    fn rejects_inverted_bounds() {
        let cfg: Config = toml::from_str("[audit]\nmin_lead = 10\nmax_lead = 5\n").unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_blank_keyword() {
        let cfg: Config =
            toml::from_str("[[corrections]]\nkeyword = \"..\"\ncitation = \"X\"\n").unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn example_config_is_valid() {
        let cfg: Config = toml::from_str(include_str!("../config/lhr.example.toml")).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.audit.quote_chars.chars().count(), 3);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_or_default(Path::new("/nonexistent/lhr.toml")).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:7341");
        assert_eq!(cfg.server.session_ttl_secs, 14400);
    }

    #[test]
    fn rejects_zero_session_ttl() {
        let cfg: Config = toml::from_str("[server]\nsession_ttl_secs = 0\n").unwrap();
        assert!(validate(&cfg).is_err());
    }
}
