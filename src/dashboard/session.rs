//! Operator-controlled, session-scoped dashboard state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(
        "window must be between {min} and {max} minutes, got {0}",
        min = WindowMinutes::MIN,
        max = WindowMinutes::MAX
    )]
    WindowOutOfRange(u32),

    #[error("unknown refresh interval '{0}', expected one of: off, 10s, 30s, 1m, 5m")]
    UnknownRefresh(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// The trailing time span shown by the dashboard, bounded to 1..=120 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WindowMinutes(u32);

impl WindowMinutes {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 120;

    pub fn new(minutes: u32) -> Result<Self, SessionError> {
        if (Self::MIN..=Self::MAX).contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(SessionError::WindowOutOfRange(minutes))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.0))
    }
}

impl Default for WindowMinutes {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<u32> for WindowMinutes {
    type Error = SessionError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<WindowMinutes> for u32 {
    fn from(window: WindowMinutes) -> Self {
        window.0
    }
}

impl fmt::Display for WindowMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The auto-refresh selector. `Off` means manual refresh only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RefreshInterval {
    Off,
    #[default]
    TenSeconds,
    ThirtySeconds,
    OneMinute,
    FiveMinutes,
}

impl RefreshInterval {
    pub const ALL: [RefreshInterval; 5] = [
        RefreshInterval::Off,
        RefreshInterval::TenSeconds,
        RefreshInterval::ThirtySeconds,
        RefreshInterval::OneMinute,
        RefreshInterval::FiveMinutes,
    ];

    /// The delay between renders, or `None` in manual mode.
    pub fn period(self) -> Option<Duration> {
        match self {
            RefreshInterval::Off => None,
            RefreshInterval::TenSeconds => Some(Duration::from_secs(10)),
            RefreshInterval::ThirtySeconds => Some(Duration::from_secs(30)),
            RefreshInterval::OneMinute => Some(Duration::from_secs(60)),
            RefreshInterval::FiveMinutes => Some(Duration::from_secs(300)),
        }
    }

    fn label(self) -> &'static str {
        match self {
            RefreshInterval::Off => "off",
            RefreshInterval::TenSeconds => "10s",
            RefreshInterval::ThirtySeconds => "30s",
            RefreshInterval::OneMinute => "1m",
            RefreshInterval::FiveMinutes => "5m",
        }
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RefreshInterval {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.label() == wanted)
            .ok_or_else(|| SessionError::UnknownRefresh(s.to_string()))
    }
}

impl TryFrom<String> for RefreshInterval {
    type Error = SessionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RefreshInterval> for String {
    fn from(refresh: RefreshInterval) -> Self {
        refresh.to_string()
    }
}

/// The operator's current choices. Lives only as long as the dashboard process.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Session {
    pub window: WindowMinutes,
    pub refresh: RefreshInterval,
}

impl Session {
    pub fn new(window: WindowMinutes, refresh: RefreshInterval) -> Self {
        Self { window, refresh }
    }

    /// Applies a command, returning whether the session should keep running.
    pub fn apply(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Refresh => true,
            SessionCommand::SetRefresh(refresh) => {
                self.refresh = refresh;
                true
            }
            SessionCommand::SetWindow(window) => {
                self.window = window;
                true
            }
            SessionCommand::Quit => false,
        }
    }
}

/// One line of operator input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    /// Render now.
    Refresh,
    SetRefresh(RefreshInterval),
    SetWindow(WindowMinutes),
    Quit,
}

impl FromStr for SessionCommand {
    type Err = SessionError;

    /// Parses `r` (or an empty line), `a <interval>`, `w <minutes>` or `q`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or("r");
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(SessionError::UnknownCommand(line.trim().to_string()));
        }

        match (verb, arg) {
            ("r", None) => Ok(SessionCommand::Refresh),
            ("q", None) => Ok(SessionCommand::Quit),
            ("a", Some(interval)) => interval.parse().map(SessionCommand::SetRefresh),
            ("w", Some(minutes)) => {
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| SessionError::UnknownCommand(line.trim().to_string()))?;
                WindowMinutes::new(minutes).map(SessionCommand::SetWindow)
            }
            _ => Err(SessionError::UnknownCommand(line.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        assert!(WindowMinutes::new(0).is_err());
        assert_eq!(WindowMinutes::new(1).unwrap().get(), 1);
        assert_eq!(WindowMinutes::new(120).unwrap().get(), 120);
        assert_eq!(
            WindowMinutes::new(121),
            Err(SessionError::WindowOutOfRange(121))
        );
    }

    #[test]
    fn test_refresh_labels_round_trip() {
        for refresh in RefreshInterval::ALL {
            assert_eq!(refresh.to_string().parse::<RefreshInterval>(), Ok(refresh));
        }
        assert_eq!("5M".parse(), Ok(RefreshInterval::FiveMinutes));
        assert_eq!(RefreshInterval::Off.period(), None);
        assert_eq!(
            RefreshInterval::OneMinute.period(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("".parse(), Ok(SessionCommand::Refresh));
        assert_eq!(" r ".parse(), Ok(SessionCommand::Refresh));
        assert_eq!("q".parse(), Ok(SessionCommand::Quit));
        assert_eq!(
            "a off".parse(),
            Ok(SessionCommand::SetRefresh(RefreshInterval::Off))
        );
        assert_eq!(
            "w 45".parse(),
            Ok(SessionCommand::SetWindow(WindowMinutes::new(45).unwrap()))
        );
        assert!("w 500".parse::<SessionCommand>().is_err());
        assert!("w abc".parse::<SessionCommand>().is_err());
        assert!("x".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn test_trailing_arguments_are_rejected() {
        assert_eq!(
            "a 10s junk".parse::<SessionCommand>(),
            Err(SessionError::UnknownCommand("a 10s junk".to_string()))
        );
        assert!("w 5 6".parse::<SessionCommand>().is_err());
        assert!("q now".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn test_apply_updates_session() {
        let mut session = Session::default();
        assert!(session.apply(SessionCommand::SetRefresh(RefreshInterval::Off)));
        assert!(session.apply(SessionCommand::SetWindow(WindowMinutes::new(60).unwrap())));
        assert_eq!(session.refresh, RefreshInterval::Off);
        assert_eq!(session.window.get(), 60);
        assert!(!session.apply(SessionCommand::Quit));
    }
}
