use std::num::NonZeroUsize;

use crate::frame::Frame;

/// A frame boundary fires when the previous byte was this...
pub const SYNC_A: u8 = b'$';
/// ...or when the current byte is this one.
pub const SYNC_B: u8 = b'D';
pub const LINE_FEED: u8 = 0x0A;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    Idle,
    ExpectLowByte,
    ExpectHighByte,
}

/// Why an accumulated run was not surfaced as a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardKind {
    Short,
    Long,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    CompleteFrame(Frame),
    DiscardedFrame { kind: DiscardKind, len: usize },
}

/// Byte-at-a-time reassembly of sample frames.
///
/// The boundary test is `prev == '$' || byte == 'D'`, so a `D` inside the
/// payload closes the frame early and shows up as a discarded frame. Read
/// timeouts and line feeds only drop the state back to [`DecoderState::Idle`];
/// whatever was accumulated stays in the buffer until the next boundary
/// evaluates it.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    sample_count: NonZeroUsize,
    state: DecoderState,
    buffer: Vec<u16>,
    low: u8,
    prev: Option<u8>,
}

impl FrameDecoder {
    pub fn new(sample_count: NonZeroUsize) -> Self {
        Self {
            sample_count,
            state: DecoderState::Idle,
            buffer: Vec::with_capacity(sample_count.get()),
            low: 0,
            prev: None,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count.get()
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Samples accumulated since the last boundary.
    pub fn pending_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn feed(&mut self, byte: u8) -> Option<DecoderEvent> {
        let event = if self.prev == Some(SYNC_A) || byte == SYNC_B {
            self.state = DecoderState::ExpectLowByte;
            self.close_frame()
        } else {
            if byte == LINE_FEED {
                self.state = DecoderState::Idle;
            } else {
                match self.state {
                    DecoderState::ExpectLowByte => {
                        self.low = byte;
                        self.state = DecoderState::ExpectHighByte;
                    }
                    DecoderState::ExpectHighByte => {
                        self.buffer.push(u16::from_le_bytes([self.low, byte]));
                        self.state = DecoderState::ExpectLowByte;
                    }
                    DecoderState::Idle => {}
                }
            }
            None
        };
        self.prev = Some(byte);
        event
    }

    /// The source had nothing within its read timeout.
    ///
    /// Also forgets the previous byte, so a `$` right before the gap does not
    /// arm a boundary on the next byte.
    pub fn timeout(&mut self) {
        self.state = DecoderState::Idle;
        self.prev = None;
    }

    fn close_frame(&mut self) -> Option<DecoderEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let expected = self.sample_count.get();
        let len = self.buffer.len();
        let event = if len == expected {
            let samples = std::mem::replace(&mut self.buffer, Vec::with_capacity(expected));
            DecoderEvent::CompleteFrame(Frame::new(samples))
        } else {
            self.buffer.clear();
            let kind = if len < expected {
                DiscardKind::Short
            } else {
                DiscardKind::Long
            };
            DecoderEvent::DiscardedFrame { kind, len }
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(samples: usize) -> FrameDecoder {
        FrameDecoder::new(NonZeroUsize::new(samples).unwrap())
    }

    fn feed_all(dec: &mut FrameDecoder, bytes: &[u8]) -> Vec<DecoderEvent> {
        bytes.iter().filter_map(|&b| dec.feed(b)).collect()
    }

    #[test]
    fn complete_frame_on_next_boundary() {
        let mut dec = decoder(2);
        let events = feed_all(&mut dec, &[b'$', b'D', 0x01, 0x00, 0x02, 0x00]);
        assert!(events.is_empty());
        assert_eq!(dec.pending_samples(), 2);

        let events = feed_all(&mut dec, &[b'D']);
        assert_eq!(events, vec![DecoderEvent::CompleteFrame(Frame::new(vec![1, 2]))]);
    }

    #[test]
    fn short_frame_is_discarded() {
        let mut dec = decoder(2);
        let events = feed_all(&mut dec, &[b'$', b'D', 0x01, 0x00, b'D']);
        assert_eq!(
            events,
            vec![DecoderEvent::DiscardedFrame { kind: DiscardKind::Short, len: 1 }]
        );
    }

    #[test]
    fn long_frame_is_discarded() {
        let mut dec = decoder(1);
        let events = feed_all(&mut dec, &[b'D', 0x01, 0x00, 0x02, 0x00, b'D']);
        assert_eq!(
            events,
            vec![DecoderEvent::DiscardedFrame { kind: DiscardKind::Long, len: 2 }]
        );
    }

    #[test]
    fn samples_are_little_endian() {
        let mut dec = decoder(1);
        let events = feed_all(&mut dec, &[b'D', 0x34, 0x12, b'D']);
        assert_eq!(events, vec![DecoderEvent::CompleteFrame(Frame::new(vec![0x1234]))]);
        assert_eq!(0x1234, 4660);
    }

    #[test]
    fn boundary_resets_buffer_and_state() {
        let mut dec = decoder(1);
        feed_all(&mut dec, &[b'D', 0x05, 0x00, 0x06]);
        assert_eq!(dec.state(), DecoderState::ExpectHighByte);

        assert!(dec.feed(b'D').is_some());
        assert_eq!(dec.pending_samples(), 0);
        assert_eq!(dec.state(), DecoderState::ExpectLowByte);

        feed_all(&mut dec, &[0x01, 0x00, 0x02, 0x00]);
        assert!(matches!(dec.feed(b'D'), Some(DecoderEvent::DiscardedFrame { .. })));
        assert_eq!(dec.pending_samples(), 0);
        assert_eq!(dec.state(), DecoderState::ExpectLowByte);
    }

    #[test]
    fn boundary_with_empty_buffer_emits_nothing() {
        let mut dec = decoder(1);
        assert_eq!(dec.feed(b'D'), None);
        assert_eq!(dec.feed(b'D'), None);
        assert_eq!(dec.state(), DecoderState::ExpectLowByte);
    }

    #[test]
    fn dollar_arms_boundary_on_following_byte() {
        let mut dec = decoder(2);
        feed_all(&mut dec, &[b'D', 0x01, 0x00, 0x02, 0x00]);
        // '$' lands as a low byte, the byte after it closes the frame.
        assert_eq!(dec.feed(b'$'), None);
        assert_eq!(dec.state(), DecoderState::ExpectHighByte);
        assert_eq!(
            dec.feed(0x07),
            Some(DecoderEvent::CompleteFrame(Frame::new(vec![1, 2])))
        );
    }

    #[test]
    fn stray_d_in_payload_closes_frame_early() {
        let mut dec = decoder(3);
        let events = feed_all(&mut dec, &[b'D', 0x01, 0x00, b'D', 0x00, 0x03, 0x00]);
        assert_eq!(
            events,
            vec![DecoderEvent::DiscardedFrame { kind: DiscardKind::Short, len: 1 }]
        );
        assert_eq!(dec.pending_samples(), 1);
    }

    #[test]
    fn timeout_keeps_partial_buffer() {
        let mut dec = decoder(2);
        feed_all(&mut dec, &[b'D', 0x01, 0x00]);
        dec.timeout();
        assert_eq!(dec.state(), DecoderState::Idle);
        assert_eq!(dec.pending_samples(), 1);

        // Idle ignores payload, the stale sample is evaluated at the next boundary.
        assert!(feed_all(&mut dec, &[0x05, 0x00]).is_empty());
        assert_eq!(dec.pending_samples(), 1);
        assert_eq!(
            dec.feed(b'D'),
            Some(DecoderEvent::DiscardedFrame { kind: DiscardKind::Short, len: 1 })
        );
    }

    #[test]
    fn timeout_forgets_previous_byte() {
        let mut dec = decoder(1);
        feed_all(&mut dec, &[b'D', 0x01, 0x00, b'$']);
        dec.timeout();
        assert_eq!(dec.feed(0x05), None);
        assert_eq!(dec.pending_samples(), 1);
    }

    #[test]
    fn line_feed_resets_state_only() {
        let mut dec = decoder(2);
        feed_all(&mut dec, &[b'D', 0x01, 0x00, 0x02]);
        assert_eq!(dec.feed(LINE_FEED), None);
        assert_eq!(dec.state(), DecoderState::Idle);
        assert_eq!(dec.pending_samples(), 1);

        assert_eq!(
            dec.feed(b'D'),
            Some(DecoderEvent::DiscardedFrame { kind: DiscardKind::Short, len: 1 })
        );
    }

    #[test]
    fn idle_ignores_payload() {
        let mut dec = decoder(1);
        assert!(feed_all(&mut dec, &[0x01, 0x00, 0x02, 0x00]).is_empty());
        assert_eq!(dec.pending_samples(), 0);
        assert_eq!(dec.state(), DecoderState::Idle);
    }

    #[test]
    fn events_match_nonempty_boundaries() {
        let mut dec = decoder(4);
        let mut seed: u32 = 0x2545_f491;
        let mut boundaries = 0;
        let mut complete = 0;
        let mut discarded = 0;
        let mut prev = None;

        for i in 0..20_000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            // Bias towards marker bytes so boundaries are frequent.
            let byte = match (seed >> 16) % 16 {
                0 => SYNC_A,
                1 => SYNC_B,
                2 => LINE_FEED,
                _ => (seed >> 8) as u8,
            };
            if i % 997 == 0 {
                dec.timeout();
                prev = None;
                continue;
            }

            let pending = dec.pending_samples();
            if (prev == Some(SYNC_A) || byte == SYNC_B) && pending > 0 {
                boundaries += 1;
            }
            match dec.feed(byte) {
                Some(DecoderEvent::CompleteFrame(frame)) => {
                    assert_eq!(frame.len(), 4);
                    complete += 1;
                }
                Some(DecoderEvent::DiscardedFrame { len, .. }) => {
                    assert_ne!(len, 4);
                    assert_eq!(len, pending);
                    discarded += 1;
                }
                None => {}
            }
            prev = Some(byte);
        }

        assert!(boundaries > 0);
        assert_eq!(complete + discarded, boundaries);
    }
}
