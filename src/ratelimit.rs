use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::time::{Duration, sleep};

/// Single-slot request gate. Holding a [`RatePermit`] blocks other callers;
/// dropping it hands the slot back only after `spacing` has elapsed.
#[derive(Clone)]
pub struct RateLimiter {
  slot: Arc<Semaphore>,
  spacing: Duration,
}

pub struct RatePermit {
  permit: Option<OwnedSemaphorePermit>,
  spacing: Duration,
}

impl RateLimiter {
  pub fn new(spacing: Duration) -> Self {
    Self {
      slot: Arc::new(Semaphore::new(1)),
      spacing,
    }
  }

  pub async fn acquire(&self) -> Result<RatePermit, AcquireError> {
    let permit = Arc::clone(&self.slot).acquire_owned().await?;
    Ok(RatePermit {
      permit: Some(permit),
      spacing: self.spacing,
    })
  }
}

impl Drop for RatePermit {
  fn drop(&mut self) {
    let Some(permit) = self.permit.take() else {
      return;
    };
    let spacing = self.spacing;

    match tokio::runtime::Handle::try_current() {
      Ok(handle) => {
        handle.spawn(async move {
          sleep(spacing).await;
          drop(permit);
        });
      }
      // Outside a runtime there is nothing left to pace.
      Err(_) => drop(permit),
    }
  }
}
