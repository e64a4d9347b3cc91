use std::fmt;
use std::str::FromStr;

use super::Error;

const NAMED_SIGNALS: &[(&str, i32)] = &[
    ("HUP", 1),
    ("INT", 2),
    ("QUIT", 3),
    ("KILL", 9),
    ("USR1", 10),
    ("USR2", 12),
    ("TERM", 15),
    ("CONT", 18),
    ("STOP", 19),
    ("WINCH", 28),
];

/// A POSIX signal number to deliver to a container.
///
/// Parses from a number (`"1"`) or a name with or without the `SIG` prefix (`"SIGHUP"`, `"hup"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "RawSignal")]
pub struct Signal(i32);

impl Signal {
    pub const SIGHUP: Signal = Signal(1);

    pub fn new(number: i32) -> Result<Self, Error> {
        if number <= 0 {
            return Err(Error::InvalidSignal(number.to_string()));
        }
        Ok(Self(number))
    }

    pub fn number(&self) -> i32 {
        self.0
    }
}

impl FromStr for Signal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<i32>() {
            return Signal::new(number);
        }
        let upper = trimmed.to_ascii_uppercase();
        let name = upper.strip_prefix("SIG").unwrap_or(&upper);
        NAMED_SIGNALS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, number)| Signal(*number))
            .ok_or_else(|| Error::InvalidSignal(s.to_owned()))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawSignal {
    Number(i32),
    Name(String),
}

impl TryFrom<RawSignal> for Signal {
    type Error = Error;

    fn try_from(raw: RawSignal) -> Result<Self, Self::Error> {
        match raw {
            RawSignal::Number(number) => Signal::new(number),
            RawSignal::Name(name) => name.parse(),
        }
    }
}
