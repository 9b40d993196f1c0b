//! Store readiness probing.
//!
//! A freshly provisioned store may still be starting when the loader runs.
//! The probe retries a connect-and-ping round trip a bounded number of times
//! before giving up. It does not reconnect mid-load.

use std::{fmt::Display, future::Future, time::Duration};

use pitchload_core::store::StatStore;

/// Retry budget for the readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
  /// Total attempts; zero is treated as one.
  pub attempts: u32,
  /// Pause after each failed attempt except the last.
  pub interval: Duration,
}

impl Default for ProbePolicy {
  fn default() -> Self { Self { attempts: 15, interval: Duration::from_secs(5) } }
}

#[derive(Debug)]
pub enum ProbeOutcome<S> {
  /// The store answered; the open handle is handed back.
  Ready { store: S, attempts: u32 },
  /// Every attempt failed.
  Unavailable { attempts: u32 },
}

/// Connect with `connect` and ping the result until one attempt succeeds or
/// the budget is spent.
pub async fn wait_for_store<S, E, F, Fut>(policy: ProbePolicy, mut connect: F) -> ProbeOutcome<S>
where
  S: StatStore,
  E: Display,
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<S, E>>,
{
  let attempts = policy.attempts.max(1);

  for attempt in 1..=attempts {
    let error = match connect().await {
      Ok(store) => match store.ping().await {
        Ok(()) => {
          tracing::info!(attempt, "store is ready");
          return ProbeOutcome::Ready { store, attempts: attempt };
        }
        Err(e) => e.to_string(),
      },
      Err(e) => e.to_string(),
    };

    tracing::warn!(attempt, attempts, %error, "store not ready");
    if attempt < attempts {
      tokio::time::sleep(policy.interval).await;
    }
  }

  ProbeOutcome::Unavailable { attempts }
}
