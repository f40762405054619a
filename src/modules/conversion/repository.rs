use super::model::{ConversionJob, Direction, JobState};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobStoreError {
    #[error("job {0} not found")]
    NotFound(Uuid),
    #[error("job {0} already reached a terminal state")]
    AlreadyTerminal(Uuid),
}

/// In-memory registry of conversion jobs. Cloning shares the same registry.
///
/// Every mutation takes the write lock, so mutations to one job are sequenced
/// and readers always see the last committed state.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, ConversionJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, direction: Direction, source_name: &str, display_name: &str) -> Uuid {
        let mut jobs = self.jobs.write().await;

        let mut id = Uuid::new_v4();
        while jobs.contains_key(&id) {
            id = Uuid::new_v4();
        }

        jobs.insert(
            id,
            ConversionJob::new(id, direction, source_name.to_string(), display_name.to_string()),
        );
        debug!(job_id = %id, "job created");
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<ConversionJob> {
        self.jobs.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Progress only moves forward and is capped at 100. Updates to terminal
    /// jobs are rejected.
    pub async fn update_progress(&self, id: Uuid, percent: u8) -> Result<(), JobStoreError> {
        self.mutate_processing(id, |job| {
            let percent = percent.min(100);
            if percent > job.progress {
                job.progress = percent;
            }
        })
        .await
    }

    pub async fn mark_completed(
        &self,
        id: Uuid,
        output_location: PathBuf,
        display_name: &str,
    ) -> Result<(), JobStoreError> {
        self.mutate_processing(id, |job| {
            job.progress = 100;
            job.display_name = display_name.to_string();
            job.state = JobState::Completed { output_location };
        })
        .await
    }

    pub async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<(), JobStoreError> {
        self.mutate_processing(id, |job| {
            job.state = JobState::Failed {
                reason: reason.to_string(),
            };
        })
        .await
    }

    async fn mutate_processing<F>(&self, id: Uuid, apply: F) -> Result<(), JobStoreError>
    where
        F: FnOnce(&mut ConversionJob),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;

        if job.state.is_terminal() {
            warn!(job_id = %id, status = ?job.status(), "ignoring mutation of terminal job");
            return Err(JobStoreError::AlreadyTerminal(id));
        }

        apply(job);
        job.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::conversion::model::JobStatus;

    async fn store_with_job() -> (JobStore, Uuid) {
        let store = JobStore::new();
        let id = store.create(Direction::DocxToPdf, "report.docx", "report.pdf").await;
        (store, id)
    }

    #[tokio::test]
    async fn create_registers_processing_job() {
        let (store, id) = store_with_job().await;
        let job = store.get(id).await.expect("job exists");

        assert_eq!(job.status(), JobStatus::Processing);
        assert_eq!(job.progress, 0);
        assert_eq!(job.display_name, "report.pdf");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let (store, _) = store_with_job().await;
        assert!(store.get(Uuid::new_v4()).await.is_none());
        assert_eq!(
            store.update_progress(Uuid::nil(), 10).await,
            Err(JobStoreError::NotFound(Uuid::nil()))
        );
    }

    #[tokio::test]
    async fn progress_never_decreases() {
        let (store, id) = store_with_job().await;

        store.update_progress(id, 30).await.unwrap();
        store.update_progress(id, 10).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().progress, 30);

        store.update_progress(id, 250).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().progress, 100);
    }

    #[tokio::test]
    async fn completion_sets_output_and_is_final() {
        let (store, id) = store_with_job().await;
        store
            .mark_completed(id, PathBuf::from("converted/x_report.pdf"), "report.pdf")
            .await
            .unwrap();

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.output_location(), Some(&PathBuf::from("converted/x_report.pdf")));

        assert_eq!(
            store.mark_failed(id, "late failure").await,
            Err(JobStoreError::AlreadyTerminal(id))
        );
        assert_eq!(store.get(id).await.unwrap(), job);
    }

    #[tokio::test]
    async fn failure_records_reason_without_output() {
        let (store, id) = store_with_job().await;
        store.mark_failed(id, "converter exploded").await.unwrap();

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.failure_reason(), Some("converter exploded"));
        assert!(job.output_location().is_none());

        assert!(store
            .mark_completed(id, PathBuf::from("x.pdf"), "x.pdf")
            .await
            .is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_issue_distinct_ids() {
        let store = JobStore::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(Direction::PdfToDocx, &format!("{i}.pdf"), &format!("{i}.docx"))
                    .await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 32);
        assert_eq!(store.len().await, 32);
    }
}
