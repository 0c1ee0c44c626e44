//! The embedding worker pool: claims jobs, embeds, writes results back
//! (spec §4.3). Process-wide state with an explicit `start`/`stop` lifecycle
//! per spec §9 — no implicit singletons.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use sqlx::{Postgres, Transaction};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use nectra_nlp_engine::EmbeddingClient;

use crate::db::chunk_store::NewChunk;
use crate::db::{asset_store, box_fut, chunk_store, job_store, knowledge_store, Db};
use crate::models::EmbeddingJob;

use super::text::{asset_embedding_text, knowledge_embedding_text};
use crate::services::chunking::{chunk_body, ChunkConfig};

/// Tunables for the worker pool (spec §4.3 defaults).
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub workers: usize,
    pub batch_size: i64,
    pub max_retries: i32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub poll_interval: Duration,
    pub chunking: ChunkConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_size: 10,
            max_retries: 5,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 60_000,
            poll_interval: Duration::from_millis(500),
            chunking: ChunkConfig::default(),
        }
    }
}

/// `base * 2^retries + rand(0..base)`, capped at `backoff_cap_ms`.
pub fn backoff_duration(retries: i32, base_ms: u64, cap_ms: u64) -> Duration {
    let shift = retries.max(0) as u32;
    let exp = base_ms.saturating_mul(1u64.checked_shl(shift).unwrap_or(u64::MAX).max(1));
    let jitter = rand::thread_rng().gen_range(0..=base_ms.max(1));
    Duration::from_millis(exp.saturating_add(jitter).min(cap_ms))
}

/// Process-wide pool of embedding workers. `start` spawns `config.workers`
/// tasks; `stop` cancels them and waits for each worker's in-flight job to
/// finish before returning, so no claim transaction is ever abandoned
/// mid-flight.
pub struct WorkerPool {
    db: Db,
    client: Arc<dyn EmbeddingClient>,
    config: PipelineConfig,
    token: CancellationToken,
    handles: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(db: Db, client: Arc<dyn EmbeddingClient>, config: PipelineConfig) -> Self {
        Self {
            db,
            client,
            config,
            token: CancellationToken::new(),
            handles: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Spawn `config.workers` long-lived loops.
    pub async fn start(self: &Arc<Self>) {
        let mut handles = self.handles.lock().await;
        for worker_id in 0..self.config.workers {
            let pool = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                pool.run_worker(worker_id).await;
            }));
        }
    }

    /// Cancel all workers and join them.
    pub async fn stop(&self) {
        self.token.cancel();
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    async fn run_worker(&self, worker_id: usize) {
        tracing::debug!(worker_id, "embedding worker started");
        loop {
            if self.token.is_cancelled() {
                break;
            }

            let claimed = match job_store::claim_pending(self.db.pool(), self.config.batch_size).await {
                Ok(jobs) => jobs,
                Err(err) => {
                    tracing::error!(worker_id, error = %err, "failed to claim embedding jobs");
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                        _ = self.token.cancelled() => break,
                    }
                    continue;
                }
            };

            if claimed.is_empty() {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                    _ = self.token.cancelled() => break,
                }
                continue;
            }

            for job in claimed {
                self.process_job(job).await;
            }
        }
        tracing::debug!(worker_id, "embedding worker stopped");
    }

    async fn process_job(&self, job: EmbeddingJob) {
        let job_id = job.id;
        match self.try_process(&job).await {
            Ok(()) => {
                if let Err(err) = job_store::mark_completed(self.db.pool(), job_id).await {
                    tracing::error!(%job_id, error = %err, "failed to mark job completed");
                }
            }
            Err(err) => {
                let retries = job.retries;
                let message = err.to_string();
                if retries + 1 >= self.config.max_retries {
                    if let Err(e) = job_store::mark_failed(self.db.pool(), job_id, &message).await {
                        tracing::error!(%job_id, error = %e, "failed to mark job failed");
                    }
                    tracing::warn!(%job_id, error = %message, "embedding job permanently failed");
                } else {
                    if let Err(e) = job_store::requeue_with_error(self.db.pool(), job_id, &message).await {
                        tracing::error!(%job_id, error = %e, "failed to requeue job");
                    }
                    let delay = backoff_duration(retries, self.config.backoff_base_ms, self.config.backoff_cap_ms);
                    tracing::debug!(%job_id, ?delay, "embedding job requeued after failure");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn try_process(&self, job: &EmbeddingJob) -> Result<(), anyhow::Error> {
        if let Some(knowledge_id) = job.knowledge_id {
            return self.process_knowledge_job(knowledge_id).await;
        }
        if let Some(asset_id) = job.asset_id {
            return self.process_asset_job(asset_id).await;
        }
        anyhow::bail!("embedding job has neither knowledge_id nor asset_id set")
    }

    async fn process_knowledge_job(&self, knowledge_id: Uuid) -> Result<(), anyhow::Error> {
        let knowledge = match knowledge_store::get_by_id_any_org(self.db.pool(), knowledge_id).await? {
            Some(k) => k,
            // Target deleted out from under the job: terminate as a no-op.
            None => return Ok(()),
        };

        let text = knowledge_embedding_text(&knowledge);
        let chunks = chunk_body(&knowledge.body, &self.config.chunking);

        if chunks.is_empty() {
            // Open question resolution: an empty-body job completes
            // immediately with no chunks and no model call.
            return Ok(());
        }

        let document_embedding = self.client.generate(&text).await?;
        let mut new_chunks = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self.client.generate(&chunk.content).await?;
            new_chunks.push(NewChunk {
                chunk_index: chunk.index,
                content: chunk.content,
                embedding,
            });
        }

        self.db
            .with_tx(move |tx: &mut Transaction<'_, Postgres>| {
                box_fut(async move {
                    knowledge_store::store_embedding(&mut *tx, knowledge.id, &document_embedding).await?;
                    chunk_store::replace_all(
                        &mut *tx,
                        knowledge.id,
                        knowledge.org_id,
                        knowledge.project_id,
                        knowledge.knowledge_type,
                        knowledge.status,
                        &knowledge.title,
                        &knowledge.summary,
                        &knowledge.scope,
                        &new_chunks,
                    )
                    .await?;
                    Ok(())
                })
            })
            .await?;

        Ok(())
    }

    async fn process_asset_job(&self, asset_id: Uuid) -> Result<(), anyhow::Error> {
        let asset = match asset_store::get_by_id_any_org(self.db.pool(), asset_id).await? {
            Some(a) => a,
            None => return Ok(()),
        };

        if !asset.has_embeddable_text() {
            return Ok(());
        }

        let text = asset_embedding_text(&asset);
        let embedding = self.client.generate(&text).await?;
        asset_store::store_embedding(self.db.pool(), asset.id, &embedding).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_and_respects_cap() {
        let d0 = backoff_duration(0, 1000, 60_000);
        let d3 = backoff_duration(3, 1000, 60_000);
        assert!(d0.as_millis() >= 1000 && d0.as_millis() <= 2000);
        assert!(d3.as_millis() >= 8000);
        let capped = backoff_duration(20, 1000, 60_000);
        assert_eq!(capped.as_millis(), 60_000);
    }
}
