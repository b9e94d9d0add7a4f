use std::path::PathBuf;
use std::str::FromStr;

/// File name used by `record` when none is given.
pub const DEFAULT_RECORD_FILE: &str = "tmp.csv";

/// A line typed at the acquisition prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Record(PathBuf),
    Stop,
    Load(PathBuf),
    Next,
    Prev,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().ok_or_else(|| "empty command".to_string())?;
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments to `{verb}`"));
        }
        let cmd = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("record" | "r", file) => {
                Command::Record(PathBuf::from(file.unwrap_or(DEFAULT_RECORD_FILE)))
            }
            ("load" | "l", Some(file)) => Command::Load(PathBuf::from(file)),
            ("load" | "l", None) => return Err("usage: load <file>".to_string()),
            ("stop" | "s", None) => Command::Stop,
            ("next" | "n" | "forward", None) => Command::Next,
            ("prev" | "p" | "backward", None) => Command::Prev,
            ("status", None) => Command::Status,
            ("help" | "?", None) => Command::Help,
            ("quit" | "q" | "exit", None) => Command::Quit,
            (_, Some(_)) if is_known(verb) => return Err(format!("`{verb}` takes no argument")),
            _ => return Err(format!("unknown command `{verb}`, try `help`")),
        };
        Ok(cmd)
    }
}

fn is_known(verb: &str) -> bool {
    matches!(
        verb.to_ascii_lowercase().as_str(),
        "stop"
            | "s"
            | "next"
            | "n"
            | "forward"
            | "prev"
            | "p"
            | "backward"
            | "status"
            | "help"
            | "?"
            | "quit"
            | "q"
            | "exit"
    )
}

pub const HELP: &str = "\
commands:
  record [file]   start recording frames (default tmp.csv)
  stop            stop recording or playback
  load <file>     review a recorded file, live bytes are drained meanwhile
  next | prev     step through the loaded record
  status          show mode and frame counters
  quit            shut down";
