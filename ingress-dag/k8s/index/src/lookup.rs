use ingress_dag_core::Dag;
use std::sync::Arc;
use tokio::sync::watch;

/// Publishes graph snapshots. Owned by the index.
#[derive(Debug)]
pub(crate) struct Writer(watch::Sender<Arc<Dag>>);

/// Reads the most recently published graph.
///
/// Snapshots are never modified after publication, so a reader may keep
/// traversing an old snapshot while newer ones are published.
#[derive(Clone, Debug)]
pub struct Reader(watch::Receiver<Arc<Dag>>);

pub(crate) fn pair() -> (Writer, Reader) {
    let (tx, rx) = watch::channel(Arc::new(Dag::default()));
    (Writer(tx), Reader(rx))
}

// === impl Writer ===

impl Writer {
    /// Replaces the current snapshot. Publishing never fails, even when there
    /// are no readers.
    pub(crate) fn publish(&self, dag: Dag) {
        self.0.send_replace(Arc::new(dag));
    }

    pub(crate) fn subscribe(&self) -> Reader {
        Reader(self.0.subscribe())
    }
}

// === impl Reader ===

impl Reader {
    pub fn get(&self) -> Arc<Dag> {
        self.0.borrow().clone()
    }

    /// Waits for a snapshot newer than the last one this reader observed.
    ///
    /// Fails once the index has been dropped.
    pub async fn changed(&mut self) -> Result<Arc<Dag>, watch::error::RecvError> {
        self.0.changed().await?;
        Ok(self.0.borrow_and_update().clone())
    }
}
