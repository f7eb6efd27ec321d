//! Background loops every broker instance runs next to its receive loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, warn};

use super::Broker;
use crate::transport::FrameSink;
use crate::utils::BrokerError;

/// `interval` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Send at most one queued frame to each endpoint this broker owns.
/// Returns the number of frames sent.
pub async fn drain_once(broker: &Broker, sink: &dyn FrameSink) -> Result<usize, BrokerError> {
    let mut sent = 0;
    for endpoint in broker.sessions().owned_endpoints().await? {
        let Some(frame) = broker.queue().pop(&endpoint).await? else {
            continue;
        };
        match sink.send_frame(&frame, &endpoint).await {
            Ok(()) => {
                debug!(%endpoint, len = frame.len(), "sent frame");
                sent += 1;
            }
            Err(e) => warn!(%endpoint, error = %e, "send failed; frame lost"),
        }
    }
    Ok(sent)
}

/// Drain outbound queues forever, one pass per `period`.
pub async fn drain_queues(broker: Arc<Broker>, sink: Arc<dyn FrameSink>, period: Duration) {
    let mut ticker = interval(period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = drain_once(&broker, sink.as_ref()).await {
            error!(error = %e, "drain pass failed");
        }
    }
}

/// Renew this broker's liveness record, sweep expired endpoints and purge
/// expired keys from the store. Returns how many endpoints were swept.
pub async fn keepalive_once(broker: &Broker, period: Duration) -> Result<usize, BrokerError> {
    let swept = broker.sessions().renew_liveness(period).await?;
    let purged = broker.store().purge_expired().await?;
    if purged > 0 {
        debug!(purged, "purged expired keys");
    }
    Ok(swept)
}

/// Run `keepalive_once` every `period`, starting immediately.
pub async fn keepalive(broker: Arc<Broker>, period: Duration) {
    let mut ticker = interval(period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = keepalive_once(&broker, period).await {
            error!(error = %e, "liveness renewal failed");
        }
    }
}
