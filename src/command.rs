//! Text commands: `F a b`, `V row col color`, `A`, `B`, `<`, `>`, empty line, `Q`.

use crate::grid::GridError;
use crate::piece::Color;
use crate::session::GameState;
use std::str::FromStr;
use thiserror::Error;

/// One player or driver command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Empty line: let one unit of time pass.
    Tick,
    CreateFaller(Color, Color),
    CreateVirus { row: usize, col: usize, color: Color },
    RotateCw,
    RotateCcw,
    MoveLeft,
    MoveRight,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("{command} expects {expected} argument(s), got {found}")]
    Arity {
        command: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("invalid colour {0:?}: expected a single letter")]
    InvalidColor(String),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

fn color(token: &str) -> Result<Color, CommandError> {
    Color::parse(token).ok_or_else(|| CommandError::InvalidColor(token.to_string()))
}

fn index(token: &str) -> Result<usize, CommandError> {
    token
        .parse()
        .map_err(|_| CommandError::InvalidNumber(token.to_string()))
}

fn expect_args<'a>(
    command: &'static str,
    args: &'a [&'a str],
    expected: usize,
) -> Result<&'a [&'a str], CommandError> {
    if args.len() == expected {
        Ok(args)
    } else {
        Err(CommandError::Arity {
            command,
            expected,
            found: args.len(),
        })
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, args)) = tokens.split_first() else {
            return Ok(Self::Tick);
        };
        match head {
            "Q" | "q" => Ok(Self::Quit),
            "F" => {
                let args = expect_args("F", args, 2)?;
                Ok(Self::CreateFaller(color(args[0])?, color(args[1])?))
            }
            "V" => {
                let args = expect_args("V", args, 3)?;
                Ok(Self::CreateVirus {
                    row: index(args[0])?,
                    col: index(args[1])?,
                    color: color(args[2])?,
                })
            }
            "A" => expect_args("A", args, 0).map(|_| Self::RotateCw),
            "B" => expect_args("B", args, 0).map(|_| Self::RotateCcw),
            "<" => expect_args("<", args, 0).map(|_| Self::MoveLeft),
            ">" => expect_args(">", args, 0).map(|_| Self::MoveRight),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

impl Command {
    /// Run the command against a session. `Quit` is left to the caller.
    pub fn apply(self, state: &mut GameState) -> Result<(), GridError> {
        match self {
            Self::Tick => state.tick(),
            Self::CreateFaller(left, right) => state.create_faller(left, right),
            Self::CreateVirus { row, col, color } => {
                state.create_virus(row, col, color);
                Ok(())
            }
            Self::RotateCw => state.rotate_clockwise(),
            Self::RotateCcw => state.rotate_counterclockwise(),
            Self::MoveLeft => state.move_left(),
            Self::MoveRight => state.move_right(),
            Self::Quit => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("".parse::<Command>(), Ok(Command::Tick));
        assert_eq!("   ".parse::<Command>(), Ok(Command::Tick));
        assert_eq!("Q".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("A".parse::<Command>(), Ok(Command::RotateCw));
        assert_eq!("B".parse::<Command>(), Ok(Command::RotateCcw));
        assert_eq!("<".parse::<Command>(), Ok(Command::MoveLeft));
        assert_eq!(">".parse::<Command>(), Ok(Command::MoveRight));
    }

    #[test]
    fn test_parse_faller_and_virus() {
        assert_eq!(
            "F R y".parse::<Command>(),
            Ok(Command::CreateFaller(Color::RED, Color::YELLOW))
        );
        assert_eq!(
            "V 4 2 b".parse::<Command>(),
            Ok(Command::CreateVirus {
                row: 4,
                col: 2,
                color: Color::BLUE
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "X".parse::<Command>(),
            Err(CommandError::Unknown("X".into()))
        );
        assert_eq!(
            "F R".parse::<Command>(),
            Err(CommandError::Arity {
                command: "F",
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            "F RR B".parse::<Command>(),
            Err(CommandError::InvalidColor("RR".into()))
        );
        assert_eq!(
            "V -1 0 r".parse::<Command>(),
            Err(CommandError::InvalidNumber("-1".into()))
        );
        assert!("A now".parse::<Command>().is_err());
    }

    #[test]
    fn test_apply_drives_session() {
        let mut state = GameState::new(4, 4).unwrap();
        Command::CreateVirus {
            row: 3,
            col: 3,
            color: Color::YELLOW,
        }
        .apply(&mut state)
        .unwrap();
        Command::CreateFaller(Color::RED, Color::BLUE)
            .apply(&mut state)
            .unwrap();
        Command::MoveLeft.apply(&mut state).unwrap();
        Command::Tick.apply(&mut state).unwrap();

        let faller = state.faller().unwrap();
        let [pivot, _] = state.pieces().pair_halves(faller.pair).unwrap();
        assert_eq!(pivot.pos(), (2, 0));
        assert!(!state.is_level_cleared());
    }
}
