use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::domain::value_objects::deadline::DeadlineCodec;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub examined: usize,
    pub rewritten: usize,
    pub unparseable: usize,
}

/// One-shot maintenance job that rewrites legacy deadline values into the
/// canonical form, using the same codec the write gate uses. Idempotent:
/// already-canonical rows are left untouched, so running it twice is a no-op.
/// It never deletes anything; rows the codec cannot make sense of are logged
/// and left alone.
pub struct DeadlineBackfill {
    task_repo: Arc<dyn TaskRepository>,
    codec: DeadlineCodec,
}

impl DeadlineBackfill {
    pub fn new(task_repo: Arc<dyn TaskRepository>, codec: DeadlineCodec) -> Self {
        Self { task_repo, codec }
    }

    pub async fn run(&self) -> Result<BackfillReport, RepositoryError> {
        let tasks = self.task_repo.list_all().await?;
        let mut report = BackfillReport {
            examined: tasks.len(),
            ..Default::default()
        };

        for task in tasks {
            if DeadlineCodec::is_canonical(&task.deadline) {
                continue;
            }
            match self.codec.canonicalize(&task.deadline) {
                Ok(canonical) => {
                    info!(
                        task_id = task.id,
                        from = %task.deadline,
                        to = %canonical,
                        "Rewriting legacy deadline"
                    );
                    self.task_repo
                        .update_deadline(task.id, canonical.as_str())
                        .await?;
                    report.rewritten += 1;
                }
                Err(_) => {
                    warn!(
                        task_id = task.id,
                        deadline = %task.deadline,
                        "Deadline cannot be canonicalized, leaving row untouched"
                    );
                    report.unparseable += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            rewritten = report.rewritten,
            unparseable = report.unparseable,
            "Deadline backfill finished"
        );
        Ok(report)
    }
}
