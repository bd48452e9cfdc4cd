// Shutdown signal shared by the poll loop and in-flight cycles

use tokio::sync::watch;

/// Receiving side. Cheap to clone; every clone observes the same signal.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested or the sender is gone
    pub async fn wait(&mut self) {
        // A dropped sender can never signal again, which is as final as a stop
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Stop the poll loop. Idempotent.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }

    /// Extra token for a late subscriber (e.g. the API server)
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
