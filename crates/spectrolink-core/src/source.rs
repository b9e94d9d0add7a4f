use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Byte(u8),
    /// Nothing arrived within the source's read timeout.
    Timeout,
}

/// Blocking, bounded-wait supplier of raw device bytes.
///
/// Implementations must return within roughly one read timeout so the
/// acquisition loop can observe mode changes and shutdown.
pub trait ByteSource {
    fn read_byte(&mut self) -> ReadOutcome;
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn read_byte(&mut self) -> ReadOutcome {
        (**self).read_byte()
    }
}

/// Bytes pushed from another thread, e.g. a simulator or a replayed capture.
pub struct ChannelSource {
    rx: Receiver<u8>,
    timeout: Duration,
}

impl ChannelSource {
    pub fn new(rx: Receiver<u8>, timeout: Duration) -> Self {
        Self { rx, timeout }
    }

    pub fn pair(timeout: Duration) -> (Sender<u8>, Self) {
        let (tx, rx) = unbounded();
        (tx, Self::new(rx, timeout))
    }
}

impl ByteSource for ChannelSource {
    fn read_byte(&mut self) -> ReadOutcome {
        match self.rx.recv_timeout(self.timeout) {
            Ok(byte) => ReadOutcome::Byte(byte),
            Err(RecvTimeoutError::Timeout) => ReadOutcome::Timeout,
            Err(RecvTimeoutError::Disconnected) => {
                // Keep the bounded-wait contract once every sender is gone.
                std::thread::sleep(self.timeout);
                ReadOutcome::Timeout
            }
        }
    }
}
