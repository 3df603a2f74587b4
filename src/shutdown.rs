use tokio::sync::watch;

/// Fires the shutdown signal for every [`Shutdown`] handle created from it.
pub struct ShutdownTrigger {
  tx: watch::Sender<bool>,
}

/// Cloneable handle observing a cooperative shutdown signal.
#[derive(Clone)]
pub struct Shutdown {
  rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
  let (tx, rx) = watch::channel(false);
  (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
  pub fn cancel(&self) {
    self.tx.send_replace(true);
  }
}

impl Shutdown {
  pub fn is_cancelled(&self) -> bool {
    *self.rx.borrow()
  }

  /// Resolves once the trigger fires, or immediately if it already has.
  /// A dropped trigger counts as cancellation.
  pub async fn cancelled(&self) {
    let mut rx = self.rx.clone();
    let _ = rx.wait_for(|cancelled| *cancelled).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::time::{Duration, timeout};

  #[tokio::test]
  async fn cancel_wakes_every_handle() {
    let (trigger, shutdown) = channel();
    let other = shutdown.clone();
    assert!(!shutdown.is_cancelled());

    let waiter = tokio::spawn(async move { other.cancelled().await });
    trigger.cancel();

    timeout(Duration::from_secs(1), waiter)
      .await
      .expect("waiter should wake")
      .unwrap();
    assert!(shutdown.is_cancelled());
    shutdown.cancelled().await;
  }

  #[tokio::test]
  async fn dropped_trigger_releases_waiters() {
    let (trigger, shutdown) = channel();
    drop(trigger);
    timeout(Duration::from_secs(1), shutdown.cancelled())
      .await
      .expect("dropping the trigger should release waiters");
  }
}
