use std::time::Duration;

use super::diff::ChangeEvent;
use crate::alerts::{AlertError, AlertSink};

/// Sends one alert per change, in order, stopping at the first failure.
pub async fn dispatch(
    sink: &dyn AlertSink,
    events: &[ChangeEvent],
    timeout: Duration,
) -> Result<(), AlertError> {
    for event in events {
        let text = event.describe();
        match tokio::time::timeout(timeout, sink.send(&text)).await {
            Ok(Ok(())) => log::info!("Sent alert: {text}"),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(AlertError::Timeout(timeout)),
        }
    }
    Ok(())
}
