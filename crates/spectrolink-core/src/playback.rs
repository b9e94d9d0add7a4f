use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use spectrolink_decode::Frame;

use crate::error::RecordError;

/// A previously recorded session, reviewed one frame at a time.
#[derive(Debug, Clone, Default)]
pub struct Playback {
    records: Vec<Frame>,
    index: usize,
}

impl Playback {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RecordError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Blank lines are skipped; line numbers in errors are 1-based.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, RecordError> {
        let mut records = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let frame = line
                .parse::<Frame>()
                .map_err(|source| RecordError::Parse { line: n + 1, source })?;
            records.push(frame);
        }
        Ok(Self { records, index: 0 })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Zero-based index of the current record, `None` when nothing was loaded.
    pub fn position(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.index)
    }

    pub fn current(&self) -> Option<&Frame> {
        self.records.get(self.index)
    }

    /// Moves to the next record; returns false at the last one.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 < self.records.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Moves to the previous record; returns false at the first one.
    pub fn backward(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// `"3/10"` style position, `"0 / 0"` for an empty record.
    pub fn label(&self) -> String {
        match self.position() {
            Some(i) => format!("{}/{}", i + 1, self.len()),
            None => "0 / 0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn navigates_within_bounds() {
        let mut pb = Playback::from_reader(Cursor::new("1,2\n3,4\n5,6\n")).unwrap();
        assert_eq!(pb.len(), 3);
        assert_eq!(pb.label(), "1/3");
        assert!(!pb.backward());

        assert!(pb.forward());
        assert!(pb.forward());
        assert!(!pb.forward());
        assert_eq!(pb.current().unwrap().samples(), &[5, 6]);
        assert_eq!(pb.label(), "3/3");

        assert!(pb.backward());
        assert_eq!(pb.position(), Some(1));
        assert_eq!(pb.current().unwrap().samples(), &[3, 4]);
    }

    #[test]
    fn empty_record() {
        let mut pb = Playback::from_reader(Cursor::new("")).unwrap();
        assert!(pb.is_empty());
        assert_eq!(pb.current(), None);
        assert_eq!(pb.position(), None);
        assert_eq!(pb.label(), "0 / 0");
        assert!(!pb.forward());
        assert!(!pb.backward());
    }

    #[test]
    fn parse_error_names_line() {
        let err = Playback::from_reader(Cursor::new("1,2\n\n3,oops\n")).unwrap_err();
        match err {
            RecordError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file() {
        let path = std::env::temp_dir().join("spectrolink-no-such-record.csv");
        assert!(matches!(Playback::load(&path), Err(RecordError::Open { .. })));
    }
}
