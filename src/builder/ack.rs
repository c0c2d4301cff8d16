//! Save requests and their single-shot acknowledgments

use super::session::SaveTrigger;
use tokio::sync::oneshot;

/// Outcome reported back to whoever raised a save request
pub type AckResult = Result<(), String>;

/// Completion handle for one save request
///
/// Resolving consumes the handle, so a request is acknowledged at most once.
/// A handle dropped unresolved reads as a failure on the receiving side.
#[derive(Debug)]
pub struct SaveAck {
    sender: oneshot::Sender<AckResult>,
}

/// Receiving side of a [`SaveAck`]
#[derive(Debug)]
pub struct SaveReceipt {
    receiver: oneshot::Receiver<AckResult>,
}

impl SaveAck {
    pub fn channel() -> (SaveAck, SaveReceipt) {
        let (sender, receiver) = oneshot::channel();
        (SaveAck { sender }, SaveReceipt { receiver })
    }

    pub fn resolve(self, result: AckResult) {
        // Requester may have stopped listening
        let _ = self.sender.send(result);
    }

    pub fn success(self) {
        self.resolve(Ok(()))
    }

    pub fn failure(self, message: impl Into<String>) {
        self.resolve(Err(message.into()))
    }
}

impl SaveReceipt {
    pub async fn outcome(self) -> AckResult {
        self.receiver
            .await
            .unwrap_or_else(|_| Err("save request was dropped".to_string()))
    }
}

/// A request to persist the designer's current document
#[derive(Debug)]
pub struct SaveRequest {
    pub sequence: u64,
    pub trigger: SaveTrigger,
    pub ack: SaveAck,
}

impl SaveRequest {
    pub fn new(sequence: u64, trigger: SaveTrigger) -> (Self, SaveReceipt) {
        let (ack, receipt) = SaveAck::channel();
        (Self { sequence, trigger, ack }, receipt)
    }
}
