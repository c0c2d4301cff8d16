//! Debounce of change signals into autosave triggers

use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: Duration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait for a change signal, then for `window` to pass without another
    /// one. Returns `false` once the signal channel is closed; a burst cut
    /// short by the close does not fire.
    pub async fn settle(&self, signals: &mut mpsc::UnboundedReceiver<()>) -> bool {
        if signals.recv().await.is_none() {
            return false;
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.window) => return true,
                signal = signals.recv() => {
                    if signal.is_none() {
                        return false;
                    }
                }
            }
        }
    }
}
