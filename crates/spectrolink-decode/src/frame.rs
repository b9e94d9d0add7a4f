use serde::Serialize;
use std::fmt;
use std::num::ParseIntError;
use std::ops::Deref;
use std::str::FromStr;

/// One sweep of amplitude samples, in the order the device sent them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Frame {
    samples: Vec<u16>,
}

impl Frame {
    pub fn new(samples: Vec<u16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Largest sample and its index, `None` for an empty frame.
    pub fn peak(&self) -> Option<(usize, u16)> {
        self.samples
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|&(_, v)| v)
    }
}

impl Deref for Frame {
    type Target = [u16];

    fn deref(&self) -> &[u16] {
        &self.samples
    }
}

/// Comma-separated decimal values, no trailing newline.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for value in &self.samples {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Frame {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(|v| v.trim().parse::<u16>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}
