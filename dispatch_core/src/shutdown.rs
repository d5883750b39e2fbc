use tokio::sync::watch;

/// A cooperative termination signal shared by every accept loop in a
/// binary. Flipping it unblocks each loop at its next iteration (spec §5's
/// cancellation model, resolving Open Question (b): the original had no
/// explicit shutdown mechanism at all).
#[derive(Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Shutdown { tx, rx }
    }

    pub fn signal(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `signal()` has been called. Intended for use inside a
    /// `tokio::select!` alongside a listener's `accept()`.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_unblocks_after_signal() {
        let shutdown = Shutdown::new();
        let mut waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        shutdown.signal();

        tokio::time::timeout(tokio::time::Duration::from_secs(1), handle)
            .await
            .expect("should not time out")
            .expect("task should not panic");
    }
}
