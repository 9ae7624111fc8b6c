//! Harvest configuration and resolution.
//!
//! Each setting comes from an explicit CLI value, then the environment, then
//! a built-in default.

use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use handbook_requisites::InherentBoilerplate;
use url::Url;

use crate::acquisition::{HarvestError, HarvestResult};

pub const DEFAULT_BASE_URL: &str = "https://handbook.unimelb.edu.au";
pub const DEFAULT_WORKERS: usize = 12;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const ENV_BASE_URL: &str = "HANDBOOK_BASE_URL";
pub const ENV_WORKERS: &str = "HANDBOOK_WORKERS";
pub const ENV_INHERENT_FILE: &str = "HANDBOOK_INHERENT_FILE";

/// Which listing pages to harvest. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRange {
    #[default]
    All,
    Span { start: u32, end: Option<u32> },
}

impl PageRange {
    /// Pages to visit once the listing is known to have `page_count` pages.
    /// Empty when the requested span lies entirely past the last page.
    pub fn clamp(&self, page_count: u32) -> RangeInclusive<u32> {
        match *self {
            PageRange::All => 1..=page_count,
            PageRange::Span { start, end } => {
                let end = end.map_or(page_count, |e| e.min(page_count));
                start.max(1)..=end
            }
        }
    }
}

impl FromStr for PageRange {
    type Err = String;

    /// Accepts `N`, `A-B` and `A-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let page = |t: &str| -> Result<u32, String> {
            match t.trim().parse::<u32>() {
                Ok(0) => Err("pages are numbered from 1".to_string()),
                Ok(n) => Ok(n),
                Err(_) => Err(format!("invalid page number {t:?}")),
            }
        };

        let span = match s.split_once('-') {
            None => {
                let n = page(s)?;
                PageRange::Span {
                    start: n,
                    end: Some(n),
                }
            }
            Some((a, b)) if b.trim().is_empty() => PageRange::Span {
                start: page(a)?,
                end: None,
            },
            Some((a, b)) => {
                let (start, end) = (page(a)?, page(b)?);
                if end < start {
                    return Err(format!("page range {s:?} ends before it starts"));
                }
                PageRange::Span {
                    start,
                    end: Some(end),
                }
            }
        };
        Ok(span)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRange::All => write!(f, "all"),
            PageRange::Span {
                start,
                end: Some(end),
            } if start == end => write!(f, "{start}"),
            PageRange::Span {
                start,
                end: Some(end),
            } => write!(f, "{start}-{end}"),
            PageRange::Span { start, end: None } => write!(f, "{start}-"),
        }
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub workers: Option<usize>,
    pub pages: Option<PageRange>,
    pub inherent_path: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
    pub include_incomplete: bool,
}

/// Fully resolved settings for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub base_url: Url,
    /// Upper bound on in-flight requests. Always at least 1.
    pub max_workers: usize,
    pub pages: PageRange,
    pub inherent_path: Option<PathBuf>,
    pub timeout_ms: u64,
    /// Extra attempts per fetch on transient errors. 0 means single-shot.
    pub max_retries: u32,
    /// Keep records whose harvest failed, tagged with their error.
    pub include_incomplete: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            max_workers: DEFAULT_WORKERS,
            pages: PageRange::All,
            inherent_path: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: 0,
            include_incomplete: false,
        }
    }
}

impl HarvestConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> HarvestResult<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with<F>(overrides: ConfigOverrides, env: F) -> HarvestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = match overrides.base_url.or_else(|| env(ENV_BASE_URL)) {
            Some(raw) => Url::parse(&raw)
                .map_err(|e| HarvestError::Config(format!("invalid base URL {raw:?}: {e}")))?,
            None => defaults.base_url,
        };

        let max_workers = match overrides.workers {
            Some(n) => n,
            None => match env(ENV_WORKERS) {
                Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                    HarvestError::Config(format!("{ENV_WORKERS} must be a number, got {raw:?}"))
                })?,
                None => defaults.max_workers,
            },
        }
        .max(1);

        let inherent_path = overrides
            .inherent_path
            .or_else(|| env(ENV_INHERENT_FILE).map(PathBuf::from));

        Ok(Self {
            base_url,
            max_workers,
            pages: overrides.pages.unwrap_or(defaults.pages),
            inherent_path,
            timeout_ms: overrides.timeout_ms.unwrap_or(defaults.timeout_ms),
            max_retries: overrides.retries.unwrap_or(defaults.max_retries),
            include_incomplete: overrides.include_incomplete,
        })
    }

    /// The boilerplate allow-list, empty when no file is configured.
    pub fn load_boilerplate(&self) -> HarvestResult<InherentBoilerplate> {
        match &self.inherent_path {
            Some(path) => Ok(InherentBoilerplate::load(path)?),
            None => Ok(InherentBoilerplate::empty()),
        }
    }
}
