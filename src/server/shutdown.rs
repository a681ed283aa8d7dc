//! Coordination of graceful shutdown between the server and its tasks.

use tokio::sync::{broadcast, mpsc};
use tokio::sync::{Mutex, RwLock};

// Notifier broadcasts the shutdown signal to accept loops and sessions, and
// can wait for all of them to finish.
#[derive(Debug)]
pub struct Notifier {
    shutdown_tx: RwLock<Option<broadcast::Sender<()>>>,
    complete_tx: RwLock<Option<mpsc::Sender<()>>>,
    complete_rx: Mutex<mpsc::Receiver<()>>,
}

impl Notifier {
    pub fn new() -> Notifier {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (complete_tx, complete_rx) = mpsc::channel(1);
        Notifier {
            shutdown_tx: RwLock::new(Some(shutdown_tx)),
            complete_tx: RwLock::new(Some(complete_tx)),
            complete_rx: Mutex::new(complete_rx),
        }
    }

    // Signals shutdown. Dropping the broadcast sender wakes every
    // subscribed listener; tasks acknowledge completion by letting their
    // Listener go out of scope.
    pub async fn notify(&self) {
        drop(self.shutdown_tx.write().await.take());
        drop(self.complete_tx.write().await.take());
    }

    // Waits until every task holding a Listener has finished. The channel
    // closes once the last completion sender clone is dropped.
    pub async fn linger(&self) {
        let _ = self.complete_rx.lock().await.recv().await;
    }

    pub async fn subscribe(&self) -> Listener {
        let shutdown = self.shutdown_tx.read().await;
        let complete = self.complete_tx.read().await;
        Listener {
            notified: shutdown.is_none(),
            shutdown_rx: shutdown.as_ref().map(|tx| tx.subscribe()),
            _complete_tx: complete.clone(),
        }
    }
}

// One task's subscription to the shutdown signal. Holding it keeps
// Notifier::linger waiting; dropping it signals completion.
#[derive(Debug)]
pub struct Listener {
    notified: bool,
    shutdown_rx: Option<broadcast::Receiver<()>>,
    _complete_tx: Option<mpsc::Sender<()>>,
}

impl Listener {
    pub fn is_shutdown(&self) -> bool {
        self.notified
    }

    /// Waits for the shutdown signal, returning immediately if it was
    /// already observed.
    pub async fn listen(&mut self) {
        if self.notified {
            return;
        }
        match self.shutdown_rx.as_mut() {
            // Only one value is ever sent, so a lag error cannot occur.
            Some(rx) => {
                let _ = rx.recv().await;
            }
            None => {}
        }
        self.notified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listeners_wake_and_linger_completes() {
        let notifier = std::sync::Arc::new(Notifier::new());
        let mut listener = notifier.subscribe().await;

        let task = tokio::spawn(async move {
            listener.listen().await;
            assert!(listener.is_shutdown());
        });

        notifier.notify().await;
        tokio::time::timeout(Duration::from_secs(1), notifier.linger()).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn subscribing_after_notify_is_immediate() {
        let notifier = Notifier::new();
        notifier.notify().await;
        let mut listener = notifier.subscribe().await;
        assert!(listener.is_shutdown());
        listener.listen().await;
    }
}
