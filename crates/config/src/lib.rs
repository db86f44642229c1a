//! Configuration for folio.
//!
//! Settings are layered with [`figment`], later sources overriding earlier
//! ones:
//!
//! 1. Built-in defaults.
//! 2. `config.{toml,yaml,yml,json}` in the user's configuration directory.
//! 3. An explicitly requested file (format chosen by extension).
//! 4. `FOLIO_`-prefixed environment variables, with `__` separating nested
//!    keys (`FOLIO_BATCH__CONCURRENCY=8`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use folio_compile::Compiler;
use folio_compile::facets::{FacetKind, PrefixClassifier};
use folio_compile::resolve::DEFAULT_MAX_REDIRECT_DEPTH;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "FOLIO_";
const DEFAULT_FILE_NAMES: [&str; 4] = ["config.toml", "config.yaml", "config.yml", "config.json"];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub compiler: CompilerConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Redirect hops followed before a chain is treated as a cycle
    pub max_redirect_depth: usize,
    pub facets: FacetConfig,
}
impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_redirect_depth: DEFAULT_MAX_REDIRECT_DEPTH,
            facets: FacetConfig::default(),
        }
    }
}

/// Tag prefixes that assign subject strings to each facet category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetConfig {
    pub subject: Vec<String>,
    pub place: Vec<String>,
    pub time: Vec<String>,
    pub person: Vec<String>,
    /// Report untagged strings instead of treating them as subjects
    pub strict: bool,
}
impl FacetConfig {
    fn prefixes(&self) -> [(FacetKind, &[String]); 4] {
        [
            (FacetKind::Subject, self.subject.as_slice()),
            (FacetKind::Place, self.place.as_slice()),
            (FacetKind::Time, self.time.as_slice()),
            (FacetKind::Person, self.person.as_slice()),
        ]
    }
}
impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            subject: vec!["subject:".to_string()],
            place: vec!["place:".to_string()],
            time: vec!["time:".to_string()],
            person: vec!["person:".to_string()],
            strict: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of works compiled at the same time
    pub concurrency: usize,
}
impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: folio_batch::DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    /// The first default configuration file that exists in the user's
    /// configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "folio")?;
        DEFAULT_FILE_NAMES.iter().map(|name| dirs.config_dir().join(name)).find(|path| path.is_file())
    }

    /// Load and validate configuration, reading `path` on top of the
    /// user's default configuration file.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(Self::default_path().as_deref(), path)
    }

    /// Like [`load`](Self::load), with the default file given explicitly.
    pub fn load_from(default: Option<&Path>, path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(default) = default.filter(|default| default.is_file()) {
            tracing::debug!(path = %default.display(), "Reading default configuration file");
            figment = merge_file(figment, default)?;
        }
        if let Some(path) = path {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Reading configuration file");
            figment = merge_file(figment, path)?;
        }
        let config: Config = figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the compiler can't run with.
    pub fn validate(&self) -> Result<()> {
        if self.compiler.max_redirect_depth == 0 {
            exn::bail!(invalid("compiler.max_redirect_depth", "must be at least 1"));
        }
        if self.batch.concurrency == 0 {
            exn::bail!(invalid("batch.concurrency", "must be at least 1"));
        }
        for (kind, prefixes) in self.compiler.facets.prefixes() {
            if prefixes.iter().any(|prefix| prefix.trim().is_empty()) {
                exn::bail!(invalid(format!("compiler.facets.{}", kind), "prefixes must not be empty"));
            }
        }
        Ok(())
    }

    /// A compiler built from these settings.
    pub fn compiler(&self) -> Compiler<PrefixClassifier> {
        let facets = &self.compiler.facets;
        let classifier = facets
            .prefixes()
            .into_iter()
            .flat_map(|(kind, prefixes)| prefixes.iter().map(move |prefix| (kind, prefix)))
            .fold(PrefixClassifier::empty(), |classifier, (kind, prefix)| classifier.with_prefix(prefix.as_str(), kind));
        let classifier = if facets.strict { classifier.strict() } else { classifier };
        Compiler::new().with_max_redirect_depth(self.compiler.max_redirect_depth).with_classifier(classifier)
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ErrorKind {
    ErrorKind::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(OsStr::to_str).map(str::to_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
