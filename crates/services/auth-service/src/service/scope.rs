//! Task scope with shared cancellation and first-error-wins joining.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use common::{AppError, AppResult};

/// Group of tasks that live and die together.
///
/// The first task to fail records its error and cancels the scope token.
/// Later errors are dropped. Dropping the scope aborts any task still running.
pub struct TaskScope {
    token: CancellationToken,
    first_error: Arc<Mutex<Option<AppError>>>,
    tasks: JoinSet<()>,
}

impl TaskScope {
    /// Create a scope that is cancelled whenever `parent` is.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            first_error: Arc::new(Mutex::new(None)),
            tasks: JoinSet::new(),
        }
    }

    /// Cancellation token shared by every task of this scope
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run `task` concurrently with the rest of the scope.
    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        let token = self.token.clone();
        let first_error = self.first_error.clone();

        self.tasks.spawn(async move {
            if let Err(err) = task.await {
                debug!("Task {} failed: {}", name, err);
                record_error(&first_error, err);
                token.cancel();
            }
        });
    }

    /// Wait for every task, then return the first recorded error if any.
    pub async fn wait(mut self) -> AppResult<()> {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(join_err) = joined {
                record_error(
                    &self.first_error,
                    AppError::internal(format!("task aborted: {}", join_err)),
                );
                self.token.cancel();
            }
        }

        // Release anything still waiting on the scope
        self.token.cancel();

        let first_error = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn record_error(slot: &Mutex<Option<AppError>>, err: AppError) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_none() {
        *slot = Some(err);
    } else {
        debug!("Dropping later error: {}", err);
    }
}
