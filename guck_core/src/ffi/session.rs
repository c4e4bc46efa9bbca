use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::{
    Cancellation, ComparisonRequest, DiffConfig, DiffEngine, FileChange, Repository,
    RepositoryInfo,
};

use super::CoreError;

type Result<T> = std::result::Result<T, CoreError>;

/// Repository handle exposed to the desktop wrapper via `UniFFI`.
#[derive(Debug)]
pub struct CoreSession {
    repository: Arc<Mutex<Repository>>,
    engine: DiffEngine,
    in_flight: Mutex<Cancellation>,
}

impl CoreSession {
    fn new(repository: Repository, config: DiffConfig) -> Self {
        Self {
            repository: Arc::new(Mutex::new(repository)),
            engine: DiffEngine::with_config(config),
            in_flight: Mutex::new(Cancellation::new()),
        }
    }

    /// Compute the file list for `request`.
    ///
    /// Each call gets a fresh cancellation handle once it holds the
    /// repository, so [`CoreSession::cancel`] only affects the comparison
    /// currently running and never one still waiting for the lock.
    ///
    /// # Errors
    ///
    /// Returns an error when the comparison fails, is cancelled or the
    /// session lock is poisoned.
    pub fn compute_diff(&self, request: ComparisonRequest) -> Result<Vec<FileChange>> {
        let repository = self.repository.lock()?;
        let cancellation = self.engine.config().cancellation();
        *self.in_flight.lock()? = cancellation.clone();
        self.engine
            .compute(&repository, &request, &cancellation)
            .map_err(|err| {
                if !err.is_cancelled() {
                    warn!(mode = %request.mode, error = %err, "diff request failed");
                }
                CoreError::from(err)
            })
    }

    /// Fetch repository metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if repository information cannot be read.
    pub fn repository_info(&self) -> Result<RepositoryInfo> {
        let repository = self.repository.lock()?;
        repository.info().map_err(CoreError::from)
    }

    /// Best guess at the repository's primary branch.
    #[must_use]
    pub fn default_branch(&self) -> String {
        self.repository.lock().map_or_else(
            |_| DiffConfig::default().base_branch,
            |repository| repository.default_branch(),
        )
    }

    /// Abort the comparison currently running, if any.
    pub fn cancel(&self) {
        match self.in_flight.lock() {
            Ok(cancellation) => {
                debug!("cancelling in-flight diff");
                cancellation.cancel();
            }
            Err(poisoned) => poisoned.into_inner().cancel(),
        }
    }
}

/// Open a repository session via the `UniFFI` namespace function.
///
/// Engine options come from the `GUCK_*` environment variables.
///
/// # Errors
///
/// Returns an error when the path is not inside a non-bare repository.
pub fn open(path: String) -> Result<Arc<CoreSession>> {
    let repository = Repository::open(path).map_err(CoreError::from)?;
    Ok(Arc::new(CoreSession::new(repository, DiffConfig::from_env())))
}
