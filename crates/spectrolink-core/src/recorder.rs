use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

use spectrolink_decode::Frame;

use crate::error::RecordError;

/// Destination for frames captured while recording.
///
/// Only ever driven from the acquisition thread.
pub trait RecordingSink: Send {
    fn append(&mut self, frame: &Frame) -> Result<(), RecordError>;
    fn close(&mut self) -> Result<(), RecordError>;
}

/// One frame per line, decimal samples joined by commas.
pub struct CsvRecorder<W: Write = BufWriter<File>> {
    writer: W,
    frames: u64,
}

impl CsvRecorder {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| RecordError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> CsvRecorder<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer, frames: 0 }
    }
}

impl<W: Write + Send> RecordingSink for CsvRecorder<W> {
    fn append(&mut self, frame: &Frame) -> Result<(), RecordError> {
        writeln!(self.writer, "{frame}")?;
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), RecordError> {
        self.writer.flush()?;
        debug!("recording closed after {} frames", self.frames);
        Ok(())
    }
}
