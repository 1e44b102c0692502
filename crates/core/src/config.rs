//! Broker runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! broker by value; nothing reads process-wide environment variables during
//! request handling, which keeps behaviour consistent across multi-threaded
//! runtimes and test harnesses.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;

use crate::error::{ConfigError, ConfigResult};

const SITES_FILE: &str = "sites.json";
const REGISTRY_FILE: &str = "shared/patient_registry.json";
const SITE_DATA_DIR: &str = "sites";
const FIXTURE_DIR: &str = "fixtures";

/// Simulated processing-latency window in milliseconds.
///
/// Purely cosmetic: the delay mimics the round-trip feel of the legacy
/// system and must never affect correctness or ordering.
#[derive(Clone, Copy, Debug)]
pub struct LatencyWindow {
    min_ms: u64,
    max_ms: u64,
}

impl LatencyWindow {
    pub fn new(min_ms: u64, max_ms: u64) -> ConfigResult<Self> {
        if min_ms > max_ms {
            return Err(ConfigError::InvalidInput(format!(
                "latency window min ({min_ms}ms) exceeds max ({max_ms}ms)"
            )));
        }
        Ok(Self { min_ms, max_ms })
    }

    /// Draw a uniformly random delay from the window.
    pub fn sample(&self) -> Duration {
        let millis = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(millis)
    }

    pub fn min_ms(&self) -> u64 {
        self.min_ms
    }

    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }
}

/// Broker configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    fixture_dir: PathBuf,
    latency: Option<LatencyWindow>,
}

impl BrokerConfig {
    /// Create a new `BrokerConfig`.
    ///
    /// The fixture directory must exist and contain the site-list resource;
    /// everything else inside it is validated when the broker loads.
    pub fn new(fixture_dir: PathBuf, latency: Option<LatencyWindow>) -> ConfigResult<Self> {
        if !fixture_dir.is_dir() {
            return Err(ConfigError::InvalidInput(format!(
                "fixture directory does not exist: {}",
                fixture_dir.display()
            )));
        }
        if !fixture_dir.join(SITES_FILE).is_file() {
            return Err(ConfigError::InvalidInput(format!(
                "fixture directory has no {SITES_FILE}: {}",
                fixture_dir.display()
            )));
        }
        Ok(Self {
            fixture_dir,
            latency,
        })
    }

    pub fn fixture_dir(&self) -> &Path {
        &self.fixture_dir
    }

    /// Path of the site-list resource.
    pub fn sites_path(&self) -> PathBuf {
        self.fixture_dir.join(SITES_FILE)
    }

    /// Path of the shared patient registry.
    pub fn registry_path(&self) -> PathBuf {
        self.fixture_dir.join(REGISTRY_FILE)
    }

    /// Directory holding one site's domain fixture collections.
    pub fn site_data_dir(&self, sta3n: &str) -> PathBuf {
        self.fixture_dir.join(SITE_DATA_DIR).join(sta3n)
    }

    pub fn latency(&self) -> Option<LatencyWindow> {
        self.latency
    }
}

/// Resolve the fixture directory without reading environment variables.
///
/// If `override_dir` is provided, it must be a directory containing
/// `sites.json`. Otherwise this tries `fixtures/` relative to the current
/// working directory and then walks up from `CARGO_MANIFEST_DIR`, so the
/// binaries work from a checkout without configuration.
pub fn resolve_fixture_dir(override_dir: Option<PathBuf>) -> ConfigResult<PathBuf> {
    fn looks_like_fixture_dir(path: &Path) -> bool {
        path.join(SITES_FILE).is_file()
    }

    if let Some(fixture_dir) = override_dir {
        if fixture_dir.is_dir() && looks_like_fixture_dir(&fixture_dir) {
            return Ok(fixture_dir);
        }
        return Err(ConfigError::InvalidInput(format!(
            "fixture directory override is not valid (must contain {SITES_FILE}): {}",
            fixture_dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(FIXTURE_DIR);
    if cwd_relative.is_dir() && looks_like_fixture_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(FIXTURE_DIR);
        if candidate.is_dir() && looks_like_fixture_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ConfigError::InvalidInput(format!(
        "could not locate a {FIXTURE_DIR}/ directory containing {SITES_FILE}"
    )))
}
