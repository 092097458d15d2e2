//! Per-invocation context
//!
//! Resolves the state directory, loads settings and turns the optional
//! root arguments into an absolute source/target pair, falling back to the
//! pair remembered from the last scan.

use std::path::{Path, PathBuf};

use mirror_core::{ActionExecutor, ReconciliationManager};
use mirror_fs::NormalizedPath;

use crate::error::{CliError, Result};
use crate::settings::Settings;
use crate::state::LastRoots;

const STATE_DIR_NAME: &str = "mirror";
const CONFIG_FILE: &str = "config.toml";
const ROOTS_FILE: &str = "last_roots.txt";

#[derive(Debug)]
pub struct Context {
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub settings: Settings,
    pub last_roots: LastRoots,
}

impl Context {
    /// Build the context from the global CLI options.
    pub fn load(state_dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
        let state_dir = match state_dir {
            Some(dir) => dir,
            None => dirs::config_dir()
                .map(|dir| dir.join(STATE_DIR_NAME))
                .ok_or_else(|| CliError::user("could not determine a configuration directory"))?,
        };
        let config_path = config.unwrap_or_else(|| state_dir.join(CONFIG_FILE));
        tracing::debug!(
            state_dir = %state_dir.display(),
            config = %config_path.display(),
            "Loading settings"
        );
        let settings = Settings::load(&config_path)?;
        let last_roots = LastRoots::new(state_dir.join(ROOTS_FILE));

        Ok(Self {
            state_dir,
            config_path,
            settings,
            last_roots,
        })
    }

    /// Resolve the roots for a command.
    ///
    /// Both or neither must be given. Given roots are canonicalized, so
    /// they must exist; with neither, the remembered pair is used.
    pub fn resolve_roots(
        &self,
        source: Option<&Path>,
        target: Option<&Path>,
    ) -> Result<(PathBuf, PathBuf)> {
        match (source, target) {
            (Some(source), Some(target)) => Ok((
                NormalizedPath::canonical(source)?.to_native(),
                NormalizedPath::canonical(target)?.to_native(),
            )),
            (Some(_), None) | (None, Some(_)) => Err(CliError::user(
                "give both a source and a target, or neither to reuse the last pair",
            )),
            (None, None) => self.last_roots.load()?.ok_or_else(|| {
                CliError::user("no roots given and none remembered; run `mirror scan SOURCE TARGET`")
            }),
        }
    }

    /// A manager wired to the configured trash and session log.
    pub fn manager(&self, deep: bool) -> Result<ReconciliationManager> {
        let executor = ActionExecutor::new(self.settings.trash_store());
        Ok(ReconciliationManager::new(executor, self.settings.scan_options(deep))
            .with_log(self.settings.session_log()?))
    }

    pub fn remember(&self, source: &Path, target: &Path) -> Result<()> {
        self.last_roots.save(source, target)
    }
}
