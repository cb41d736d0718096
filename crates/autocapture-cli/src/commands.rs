//! Console commands read from stdin.

use std::str::FromStr;
use std::time::Duration;

use autocapture_core::Strategy;
use autocapture_core::domain::{AreaId, StrategyError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Status,
    Strategy(Strategy),
    /// `None` clears the override.
    Area(Option<AreaId>),
    Duration(Duration),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),

    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid duration `{0}`, expected whole seconds")]
    InvalidDuration(String),

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

pub const HELP: &str = "\
commands:
  pause               stop the automation
  resume              start the automation
  status              show phase, join state and player
  strategy <flags>    set strategy flags (comma separated)
  area <id|none>      force a target area, or clear it
  duration <secs>     set the round duration
  quit                stop and exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let arg = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest)
            }
        };

        match name.to_ascii_lowercase().as_str() {
            "pause" | "stop" => Ok(Command::Pause),
            "resume" | "start" => Ok(Command::Resume),
            "status" => Ok(Command::Status),
            "strategy" => Ok(Command::Strategy(arg("strategy")?.parse()?)),
            "area" => {
                let raw = arg("area")?;
                let area = if raw.eq_ignore_ascii_case("none") {
                    None
                } else {
                    AreaId::parse_active(Some(raw))
                };
                Ok(Command::Area(area))
            }
            "duration" => {
                let raw = arg("duration")?;
                raw.parse()
                    .map(|secs| Command::Duration(Duration::from_secs(secs)))
                    .map_err(|_| CommandError::InvalidDuration(raw.to_string()))
            }
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocapture_core::StrategyFlag;
    use rstest::rstest;

    #[rstest]
    #[case("pause", Command::Pause)]
    #[case("  RESUME ", Command::Resume)]
    #[case("status", Command::Status)]
    #[case("area 4", Command::Area(Some(AreaId::new("4"))))]
    #[case("area none", Command::Area(None))]
    #[case("area 0", Command::Area(None))]
    #[case("duration 90", Command::Duration(Duration::from_secs(90)))]
    #[case("quit", Command::Quit)]
    fn parses(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>(), Ok(expected));
    }

    #[test]
    fn strategy_takes_the_rest_of_the_line() {
        let command: Command = "strategy bottom-up, FocusRandomArea".parse().unwrap();
        let expected =
            Strategy::from_flags([StrategyFlag::BottomUp, StrategyFlag::FocusRandomArea]).unwrap();
        assert_eq!(command, Command::Strategy(expected));
    }

    #[rstest]
    #[case("jump", CommandError::Unknown("jump".into()))]
    #[case("area", CommandError::MissingArgument("area"))]
    #[case("duration soon", CommandError::InvalidDuration("soon".into()))]
    fn rejects(#[case] line: &str, #[case] expected: CommandError) {
        assert_eq!(line.parse::<Command>(), Err(expected));
    }

    #[test]
    fn conflicting_strategy_is_an_error() {
        assert!(matches!(
            "strategy TopDown,BottomUp".parse::<Command>(),
            Err(CommandError::Strategy(StrategyError::Conflict(..)))
        ));
    }
}
