/// Asynchronous audit trail dispatch
///
/// Mutating handlers record audit entries through a bounded in-process
/// channel; a single background task drains it and writes to the database.
/// Enqueueing never blocks the request path and never fails the request:
/// a full queue drops the entry with a warning, and a failed write is
/// logged by the writer task. The mutation's outcome is already committed
/// by the time the entry is queued, so the trail is best-effort by
/// contract, not by accident.

use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::mpsc;
use uuid::Uuid;

use taskforge_shared::models::audit_log::{AuditLog, AuditOperation, NewAuditLog};

/// Handle for enqueueing audit entries. Cheap to clone; all clones feed
/// the same writer task.
#[derive(Clone)]
pub struct AuditDispatcher {
    tx: mpsc::Sender<NewAuditLog>,
}

impl AuditDispatcher {
    /// Starts the writer task and returns the dispatch handle.
    pub fn spawn(pool: PgPool, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        tokio::spawn(write_loop(pool, rx));
        Self { tx }
    }

    /// Builds a dispatcher around an existing sender. Lets tests observe
    /// the queue without standing up a writer task.
    pub fn from_sender(tx: mpsc::Sender<NewAuditLog>) -> Self {
        Self { tx }
    }

    /// Enqueues one entry. A full queue drops the entry and warns.
    pub fn record(&self, entry: NewAuditLog) {
        if let Err(err) = self.tx.try_send(entry) {
            let reason = match &err {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "writer stopped",
            };
            let (mpsc::error::TrySendError::Full(entry)
            | mpsc::error::TrySendError::Closed(entry)) = err;
            tracing::warn!(
                entity_type = %entry.entity_type,
                entity_id = %entry.entity_id,
                operation = entry.operation.as_str(),
                "audit entry dropped: {reason}"
            );
        }
    }

    /// Serializes `change_data` and enqueues an entry for it.
    ///
    /// Serialization failure skips the entry with a warning instead of
    /// surfacing to the caller; the mutation itself already succeeded.
    pub fn record_entity<T: Serialize>(
        &self,
        user_id: Uuid,
        entity_type: &str,
        entity_id: Uuid,
        operation: AuditOperation,
        change_data: &T,
    ) {
        let change_data = match serde_json::to_string(change_data) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(
                    entity_type,
                    %entity_id,
                    "audit entry skipped, change data failed to serialize: {err}"
                );
                return;
            }
        };

        self.record(NewAuditLog {
            user_id,
            entity_type: entity_type.to_string(),
            entity_id,
            change_data,
            operation,
        });
    }
}

/// Drains the queue until every dispatcher clone is dropped.
async fn write_loop(pool: PgPool, mut rx: mpsc::Receiver<NewAuditLog>) {
    while let Some(entry) = rx.recv().await {
        let entity_type = entry.entity_type.clone();
        let entity_id = entry.entity_id;
        if let Err(err) = AuditLog::create(&pool, entry).await {
            tracing::warn!(
                entity_type = %entity_type,
                %entity_id,
                "audit write failed: {err}"
            );
        }
    }
    tracing::debug!("audit writer stopped");
}
