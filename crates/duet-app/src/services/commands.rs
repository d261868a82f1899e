//! Text commands read from stdin.

use std::str::FromStr;

use duet_core::Error;

/// A user command for the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    CycleLoop,
    BoundaryA,
    BoundaryB,
    ClearRegion,
    Region(f64, f64),
    Seek(f64),
    Skip(f64),
    Rate(f64),
    Volume(f32),
    Select(usize),
    Search(String),
    Online(bool),
    RetryLyrics,
    Status,
    Quit,
}

fn number<T: FromStr>(arg: Option<&str>, command: &str) -> Result<T, Error> {
    arg.and_then(|a| a.parse().ok())
        .ok_or_else(|| Error::InvalidArgument(format!("`{command}` needs a numeric argument")))
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        let command = match name.to_lowercase().as_str() {
            "play" => Self::Play,
            "pause" => Self::Pause,
            "toggle" | "space" => Self::Toggle,
            "next" | "n" => Self::Next,
            "prev" | "previous" | "p" => Self::Previous,
            "loop" => Self::CycleLoop,
            "a" => Self::BoundaryA,
            "b" => Self::BoundaryB,
            "clear" => Self::ClearRegion,
            "region" => {
                let start = number(args.next(), name)?;
                let end = number(args.next(), name)?;
                Self::Region(start, end)
            }
            "seek" => Self::Seek(number(args.next(), name)?),
            "skip" => Self::Skip(number(args.next(), name)?),
            "rate" => Self::Rate(number(args.next(), name)?),
            "vol" | "volume" => Self::Volume(number(args.next(), name)?),
            "select" => Self::Select(number(args.next(), name)?),
            "search" if !rest.is_empty() => Self::Search(rest.to_string()),
            "online" => Self::Online(true),
            "offline" => Self::Online(false),
            "lyrics" => Self::RetryLyrics,
            "status" | "" => Self::Status,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return Err(Error::InvalidArgument(format!("Unknown command: {line}"))),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("play".parse::<Command>().unwrap(), Command::Play);
        assert_eq!("  NEXT ".parse::<Command>().unwrap(), Command::Next);
        assert_eq!("loop".parse::<Command>().unwrap(), Command::CycleLoop);
        assert_eq!("".parse::<Command>().unwrap(), Command::Status);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!("seek 42.5".parse::<Command>().unwrap(), Command::Seek(42.5));
        assert_eq!("skip -10".parse::<Command>().unwrap(), Command::Skip(-10.0));
        assert_eq!("select 2".parse::<Command>().unwrap(), Command::Select(2));
        assert_eq!(
            "region 5 15".parse::<Command>().unwrap(),
            Command::Region(5.0, 15.0)
        );
        assert_eq!(
            "search night drive".parse::<Command>().unwrap(),
            Command::Search("night drive".to_string())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("seek".parse::<Command>().is_err());
        assert!("rate fast".parse::<Command>().is_err());
        assert!("search".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }
}
