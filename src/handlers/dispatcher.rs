//! Effect dispatcher
//!
//! Executes the effects of a transition in order against the user's locked
//! session, the content repository and the reply sink. The first failing
//! effect stops execution and its error is returned; mutations already
//! applied stay applied. Failed replies are logged and skipped.

use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use tracing::{debug, info};
use crate::config::TimeoutConfig;
use crate::database::repositories::ContentRepository;
use crate::models::{ContentRecord, Reply};
use crate::services::ReplySink;
use crate::state::{Bucket, Effect, SessionHandle};
use crate::utils::errors::{QuickyError, Result};
use crate::utils::helpers::{format_timestamp, with_timeout};
use crate::utils::logging::{log_reply_failure, log_storage_operation, log_transition};

/// What happened while dispatching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub effects_applied: usize,
    pub replies_sent: usize,
    pub replies_failed: usize,
}

pub struct EffectDispatcher {
    repository: Arc<dyn ContentRepository>,
    replies: Arc<dyn ReplySink>,
    timeouts: TimeoutConfig,
}

impl EffectDispatcher {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        replies: Arc<dyn ReplySink>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            repository,
            replies,
            timeouts,
        }
    }

    pub fn repository(&self) -> &Arc<dyn ContentRepository> {
        &self.repository
    }

    pub async fn dispatch(&self, session: &mut SessionHandle, effects: Vec<Effect>) -> Result<DispatchReport> {
        let mut report = DispatchReport::default();

        for effect in effects {
            debug!(user_id = session.user_id(), effect = effect.name(), "Applying effect");

            match effect {
                Effect::Reply(reply) => self.reply(session.user_id(), &reply, &mut report).await,
                Effect::SetState(state) => {
                    let from = session.get_state();
                    session.set_state(state);
                    log_transition(session.user_id(), from.as_str(), state.as_str());
                }
                Effect::CreateBucket { name } => self.create_bucket(session, name).await?,
                Effect::SelectBucket { index } => {
                    session.select_bucket(index)?;
                }
                Effect::RemoveBucket { index } => {
                    let removed = session.remove_bucket_at(index)?;
                    info!(user_id = session.user_id(), bucket = removed.name(), "Storage removed from session");
                }
                Effect::ShowRecords { index } => self.show_records(session, index, &mut report).await?,
                Effect::PersistRecord { payload } => self.persist_record(session, &payload).await?,
            }

            report.effects_applied += 1;
        }

        Ok(report)
    }

    /// Send a reply outside of any transition, e.g. a failure notice
    pub async fn notify(&self, user_id: &str, reply: &Reply) -> DispatchReport {
        let mut report = DispatchReport::default();
        self.reply(user_id, reply, &mut report).await;
        report
    }

    async fn reply(&self, user_id: &str, reply: &Reply, report: &mut DispatchReport) {
        let sent = with_timeout(
            self.timeouts.reply(),
            self.replies.send(user_id, reply),
            || QuickyError::ReplyTimeout,
        )
        .await;

        match sent {
            Ok(()) => report.replies_sent += 1,
            Err(e) => {
                report.replies_failed += 1;
                log_reply_failure(user_id, reply.kind(), &e.to_string());
            }
        }
    }

    /// Add and select a bucket. A name that already has a storage row, e.g.
    /// one removed from the session earlier, reopens that row.
    async fn create_bucket(&self, session: &mut SessionHandle, name: String) -> Result<()> {
        let user_id = session.user_id().to_string();
        let started = Instant::now();
        let found = with_timeout(
            self.timeouts.storage(),
            self.repository.find_bucket(&user_id, &name),
            || QuickyError::StorageTimeout { operation: "find_bucket" },
        )
        .await;
        log_storage_operation("find_bucket", &user_id, started.elapsed().as_millis() as u64, found.is_ok());

        let bucket = match found? {
            Some(_) => Bucket::persisted(name.clone()),
            None => Bucket::new(name.clone()),
        };
        let reopened = bucket.is_persisted();
        let index = session.add_bucket(bucket)?;
        session.select_bucket(index)?;
        info!(user_id = %user_id, bucket = %name, reopened, "Storage created in session");
        Ok(())
    }

    /// Load, cache and reply the records of one bucket. A bucket that was
    /// never written to storage is shown as empty.
    async fn show_records(&self, session: &mut SessionHandle, index: usize, report: &mut DispatchReport) -> Result<()> {
        let bucket = session.bucket(index)?;
        let name = bucket.name().to_string();
        let persisted = bucket.is_persisted();
        let user_id = session.user_id().to_string();

        let records = if persisted {
            let started = Instant::now();
            let loaded = with_timeout(
                self.timeouts.storage(),
                self.repository.list_records(&user_id, &name),
                || QuickyError::StorageTimeout { operation: "list_records" },
            )
            .await;
            log_storage_operation("list_records", &user_id, started.elapsed().as_millis() as u64, loaded.is_ok());

            match loaded {
                Ok(records) => records,
                Err(QuickyError::BucketNotFound { .. }) => Vec::new(),
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };

        session.replace_records(index, records.clone())?;

        self.reply(&user_id, &Reply::storage_header(&name), report).await;
        if records.is_empty() {
            self.reply(&user_id, &Reply::no_data(&name), report).await;
        }
        for record in &records {
            let reply = Reply::record(&format_timestamp(record.recorded_at), &record.payload);
            self.reply(&user_id, &reply, report).await;
        }

        Ok(())
    }

    /// Store a payload in the selected bucket, creating the bucket row on
    /// first write
    async fn persist_record(&self, session: &mut SessionHandle, payload: &str) -> Result<()> {
        let index = session.selected_bucket().ok_or(QuickyError::SelectionOutOfRange {
            index: 0,
            available: session.bucket_count(),
        })?;
        let name = session.bucket(index)?.name().to_string();
        let user_id = session.user_id().to_string();
        let started = Instant::now();

        let stored = async {
            let handle = with_timeout(
                self.timeouts.storage(),
                self.repository.ensure_bucket(&user_id, &name),
                || QuickyError::StorageTimeout { operation: "ensure_bucket" },
            )
            .await?;

            let recorded_at = Utc::now();
            let id = with_timeout(
                self.timeouts.storage(),
                self.repository.append_record(&handle, recorded_at, payload),
                || QuickyError::StorageTimeout { operation: "append_record" },
            )
            .await?;

            Ok::<_, QuickyError>(ContentRecord {
                id,
                recorded_at,
                payload: payload.to_string(),
            })
        }
        .await;

        log_storage_operation("append_record", &user_id, started.elapsed().as_millis() as u64, stored.is_ok());

        session.record_stored(index, stored?)
    }
}
