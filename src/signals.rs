use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` on the first SIGINT or SIGTERM so the ingestion loops
/// finish their current message and return.
pub fn handle_shutdown(cancel: CancellationToken) -> std::io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    std::thread::spawn(move || {
        for signal in signals.forever() {
            if cancel.is_cancelled() {
                log::info!("Received signal {signal}, already shutting down");
                continue;
            }
            log::info!("Received signal {signal}, shutting down");
            let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
            cancel.cancel();
        }
    });

    Ok(())
}
