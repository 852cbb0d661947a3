//! README search indexing.
//!
//! [`ReadmeCollator`] walks every entity in the directory, resolves its
//! README through the shared [`ReadmeService`] (so the cache is honoured)
//! and maps it to a [`ReadmeDocument`]. Documents are handed to a
//! [`DocumentSink`]; [`JsonLinesSink`] writes them to a file, one JSON
//! object per line, replacing the previous run's output.
//!
//! Entities without a README are skipped quietly. Infrastructure failures
//! for one entity are logged and skipped so a single broken repository
//! does not stall the index.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use readme_harness_core::strip_markdown;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ScheduleConfig;
use crate::service::{ReadmeResponse, ReadmeService};

/// One README as a search document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadmeDocument {
    pub title: String,
    pub text: String,
    pub location: String,
    pub entity_ref: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub file_name: String,
    pub content_type: String,
    pub indexed_at: DateTime<Utc>,
}

/// Destination for a full set of collated documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Replace the published document set with `docs`.
    async fn publish(&self, docs: &[ReadmeDocument]) -> Result<()>;
}

/// Writes documents as JSON lines, swapping the file in atomically.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSink for JsonLinesSink {
    async fn publish(&self, docs: &[ReadmeDocument]) -> Result<()> {
        let tmp = self.path.with_extension("jsonl.tmp");
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .with_context(|| format!("Failed to create {}", tmp.display()))?;

        for doc in docs {
            let mut line = serde_json::to_vec(doc)?;
            line.push(b'\n');
            file.write_all(&line).await?;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Keeps the most recently published set in memory.
#[derive(Default)]
pub struct MemorySink {
    docs: Mutex<Vec<ReadmeDocument>>,
    publishes: Mutex<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<ReadmeDocument> {
        self.docs.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn publish_count(&self) -> usize {
        self.publishes.lock().map(|n| *n).unwrap_or_default()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn publish(&self, docs: &[ReadmeDocument]) -> Result<()> {
        let mut stored = self
            .docs
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?;
        *stored = docs.to_vec();
        let mut publishes = self
            .publishes
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?;
        *publishes += 1;
        Ok(())
    }
}

pub struct ReadmeCollator {
    service: Arc<ReadmeService>,
    strip_markdown: bool,
}

impl ReadmeCollator {
    pub fn new(service: Arc<ReadmeService>, strip_markdown: bool) -> Self {
        Self {
            service,
            strip_markdown,
        }
    }

    /// Resolve every entity's README into a document.
    ///
    /// Fails only when the entity list itself cannot be read.
    pub async fn collate(&self) -> Result<Vec<ReadmeDocument>> {
        let entities = self
            .service
            .directory()
            .list_entities()
            .await
            .context("Failed to list entities")?;

        let mut docs = Vec::new();
        for entity in &entities {
            match self.service.get_readme_for_entity(entity).await {
                Ok(readme) => docs.push(self.to_document(entity.display_title(), readme)),
                Err(e) if e.is_not_found() => {
                    debug!(entity = %entity.entity_ref(), "no README, skipping");
                }
                Err(e) => {
                    warn!(entity = %entity.entity_ref(), error = %e, "skipping entity");
                }
            }
        }

        info!(
            entities = entities.len(),
            documents = docs.len(),
            "README collation complete"
        );
        Ok(docs)
    }

    fn to_document(&self, title: &str, readme: ReadmeResponse) -> ReadmeDocument {
        let text = if self.strip_markdown && readme.file.is_markdown() {
            strip_markdown(&readme.file.content)
        } else {
            readme.file.content
        };
        let r = &readme.entity_ref;

        ReadmeDocument {
            title: title.to_string(),
            text,
            location: format!("/catalog/{}/{}/{}", r.namespace, r.kind, r.name),
            entity_ref: r.to_string(),
            kind: r.kind.clone(),
            namespace: r.namespace.clone(),
            name: r.name.clone(),
            file_name: readme.file.name,
            content_type: readme.file.content_type,
            indexed_at: Utc::now(),
        }
    }
}

/// Collate once and publish. Returns the number of documents published.
pub async fn run_once(collator: &ReadmeCollator, sink: &dyn DocumentSink) -> Result<usize> {
    let docs = collator.collate().await?;
    sink.publish(&docs).await?;
    Ok(docs.len())
}

/// Resolved schedule for [`run_scheduled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSchedule {
    pub frequency: Duration,
    pub timeout: Duration,
    pub initial_delay: Duration,
}

impl IndexSchedule {
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Ok(Self {
            frequency: config.frequency.to_duration()?,
            timeout: config.timeout.to_duration()?,
            initial_delay: config.initial_delay.to_duration()?,
        })
    }
}

/// Wait `initial_delay`, then index every `frequency` until `shutdown`
/// resolves. A run exceeding `timeout` is abandoned and logged.
pub async fn run_scheduled<F>(
    collator: &ReadmeCollator,
    sink: &dyn DocumentSink,
    schedule: IndexSchedule,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    tokio::select! {
        _ = tokio::time::sleep(schedule.initial_delay) => {}
        _ = &mut shutdown => return,
    }

    let mut ticker = tokio::time::interval(schedule.frequency);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => return,
        }

        match tokio::time::timeout(schedule.timeout, run_once(collator, sink)).await {
            Ok(Ok(count)) => info!(documents = count, "README index published"),
            Ok(Err(e)) => error!(error = %e, "README indexing failed"),
            Err(_) => error!(timeout = ?schedule.timeout, "README indexing timed out"),
        }
    }
}
