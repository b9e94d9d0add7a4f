//! Byte-stream framing for the spectrum analyzer link.
//!
//! The device streams little-endian 16-bit amplitude samples separated by a
//! `$D` marker. [`FrameDecoder`] turns that stream back into [`Frame`]s one
//! byte at a time and never fails: malformed runs surface as
//! [`DecoderEvent::DiscardedFrame`].

pub mod decoder;
pub mod frame;

pub use decoder::{DecoderEvent, DecoderState, DiscardKind, FrameDecoder, LINE_FEED, SYNC_A, SYNC_B};
pub use frame::Frame;

/// Number of samples per frame the analyzer firmware ships with.
pub const DEFAULT_SAMPLE_COUNT: usize = 132;
