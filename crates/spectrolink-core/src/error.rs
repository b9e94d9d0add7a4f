use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use crate::mode::{Mode, ModeRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("cannot {request} while {from}")]
    InvalidTransition { from: Mode, request: ModeRequest },
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to create recording {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },
    #[error("failed to open record {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("record line {line}: {source}")]
    Parse { line: usize, source: ParseIntError },
    #[error("record I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("failed to open serial port {port}: {source}")]
    Open { port: String, source: serialport::Error },
    #[error(transparent)]
    Mode(#[from] ModeError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("failed to start acquisition thread: {0}")]
    Spawn(io::Error),
    #[error("acquisition loop is not running")]
    Disconnected,
    #[error("acquisition thread panicked")]
    Panicked,
}
