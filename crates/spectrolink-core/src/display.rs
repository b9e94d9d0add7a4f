use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{trace, warn};
use spectrolink_decode::Frame;

/// Live view of decoded frames. Fire-and-forget; may drop frames.
pub trait DisplaySink: Send {
    fn on_frame(&mut self, frame: &Frame);
}

impl<F: FnMut(&Frame) + Send> DisplaySink for F {
    fn on_frame(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// Forwards frames to another thread, dropping them when the consumer lags.
pub struct ChannelDisplay {
    tx: Sender<Frame>,
    dropped: u64,
}

impl ChannelDisplay {
    pub fn new(capacity: usize) -> (Self, Receiver<Frame>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx, dropped: 0 }, rx)
    }

}

impl Drop for ChannelDisplay {
    fn drop(&mut self) {
        if self.dropped > 0 {
            warn!("display skipped {} frames", self.dropped);
        }
    }
}

impl DisplaySink for ChannelDisplay {
    fn on_frame(&mut self, frame: &Frame) {
        match self.tx.try_send(frame.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                trace!("display lagging, {} frames dropped", self.dropped);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
