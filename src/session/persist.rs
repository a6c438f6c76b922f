use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::state::PersistedSession;
use crate::storage::LocalStorage;

enum Command {
    Write(PersistedSession),
    Flush(oneshot::Sender<()>),
}

/// Background writer for the persisted session record.
///
/// Saves are queued and applied in order by a single task, so the caller
/// never waits on disk and an older record can never overwrite a newer one.
pub struct Persister {
    tx: mpsc::UnboundedSender<Command>,
}

impl Persister {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn spawn(storage: LocalStorage, key: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    // A signed-out session leaves nothing on disk
                    Command::Write(record) if record == PersistedSession::default() => {
                        storage.remove_item(&key).await;
                        debug!("Removed persisted session");
                    }
                    Command::Write(record) => {
                        storage.set_item(&key, &record).await;
                        debug!("Persisted session (authenticated: {})", record.is_authenticated);
                    }
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

        Self { tx }
    }

    /// Queue a record for writing
    pub fn save(&self, record: PersistedSession) {
        if self.tx.send(Command::Write(record)).is_err() {
            warn!("Session writer has stopped, state will not be persisted");
        }
    }

    /// Wait until every queued record has been written
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
