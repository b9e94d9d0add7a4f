//! Core functionalities: serial byte source, acquisition loop, recording and playback.

pub mod acquisition;
pub mod display;
pub mod error;
pub mod mode;
pub mod playback;
pub mod recorder;
pub mod serial_service;
pub mod source;

pub use acquisition::{AcquisitionConfig, AcquisitionHandle, Status};
pub use display::{ChannelDisplay, DisplaySink};
pub use error::{AcquireError, ModeError, RecordError};
pub use mode::{Mode, ModeRequest};
pub use playback::Playback;
pub use recorder::{CsvRecorder, RecordingSink};
pub use serial_service::{list_ports, PortInfo, SerialByteSource, SerialConfig};
pub use source::{ByteSource, ChannelSource, ReadOutcome};

pub use spectrolink_decode::{Frame, FrameDecoder};
