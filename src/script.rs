//! Line-oriented driver: read a field description and commands, print the field after each.

use crate::command::Command;
use crate::render::{self, GAME_OVER, LEVEL_CLEARED};
use crate::session::GameState;
use anyhow::{Context, Result, bail};
use std::io::{BufRead, Lines, Write};

fn next_line<R: BufRead>(lines: &mut Lines<R>, what: &str) -> Result<String> {
    lines
        .next()
        .with_context(|| format!("unexpected end of input, expected {what}"))?
        .with_context(|| format!("failed to read {what}"))
}

fn read_number<R: BufRead>(lines: &mut Lines<R>, what: &str) -> Result<usize> {
    let line = next_line(lines, what)?;
    line.trim()
        .parse()
        .with_context(|| format!("{what} must be a non-negative integer, got {line:?}"))
}

/// Header: row count, column count, then `EMPTY` or `CONTENTS` followed by one line per row.
fn read_field<R: BufRead>(lines: &mut Lines<R>) -> Result<GameState> {
    let rows = read_number(lines, "row count")?;
    let columns = read_number(lines, "column count")?;
    let setting = next_line(lines, "field setting")?;

    let state = match setting.trim().to_ascii_uppercase().as_str() {
        "EMPTY" => GameState::new(rows, columns),
        "CONTENTS" => {
            let contents = (0..rows)
                .map(|r| next_line(lines, &format!("field row {}", r + 1)))
                .collect::<Result<Vec<_>>>()?;
            GameState::from_contents(rows, columns, &contents)
        }
        other => bail!("field setting must be EMPTY or CONTENTS, got {other:?}"),
    };
    state.context("invalid field")
}

fn print_field<W: Write>(output: &mut W, state: &GameState) -> Result<()> {
    for line in render::field_lines(state) {
        writeln!(output, "{line}")?;
    }
    Ok(())
}

/// Run a whole session. Stops on `Q`, end of input, or a faller that cannot spawn.
pub fn run_script<R: BufRead, W: Write>(input: R, mut output: W) -> Result<()> {
    let mut lines = input.lines();
    let mut state = read_field(&mut lines)?;

    loop {
        print_field(&mut output, &state)?;
        if state.is_level_cleared() {
            writeln!(output, "{LEVEL_CLEARED}")?;
        }

        let Some(line) = lines.next() else { break };
        let line = line.context("failed to read command")?;
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("ignoring {line:?}: {err}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        command
            .apply(&mut state)
            .with_context(|| format!("command {line:?} failed"))?;
        if state.is_game_over() {
            print_field(&mut output, &state)?;
            writeln!(output, "{GAME_OVER}")?;
            break;
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(input: &str) -> String {
        let mut out = Vec::new();
        run_script(input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_field_faller_and_tick() {
        let out = transcript("3\n3\nEMPTY\nV 2 0 y\nF R B\n\nQ\n");
        let expected = [
            // initial
            "|         |",
            "|         |",
            "|         |",
            " --------- ",
            "LEVEL CLEARED",
            // V 2 0 y
            "|         |",
            "|         |",
            "| y       |",
            " --------- ",
            // F R B
            "|         |",
            "|   [R--B]|",
            "| y       |",
            " --------- ",
            // tick
            "|         |",
            "|         |",
            "| y |R--B||",
            " --------- ",
        ];
        assert_eq!(out, expected.join("\n") + "\n");
    }

    #[test]
    fn test_contents_and_blocked_spawn() {
        let out = transcript("3\n3\ncontents\n   \nrby\n   \nF R B\n>\n");
        let field = ["|         |", "| r  b  y |", "|         |", " --------- "].join("\n");
        assert_eq!(out, format!("{field}\n{field}\nGAME OVER\n"));
    }

    #[test]
    fn test_matches_shown_then_cleared() {
        let out = transcript("2\n4\nCONTENTS\n    \nRRRr\n\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "|*R**R**R**r*|");
        assert_eq!(lines[4], "|            |");
        assert_eq!(lines[6], "LEVEL CLEARED");
    }

    #[test]
    fn test_bad_command_is_skipped() {
        let out = transcript("1\n1\nEMPTY\nZ\nF R\n");
        assert_eq!(out.matches(" --- ").count(), 3);
        assert!(!out.contains(GAME_OVER));
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let out = transcript("1\n2\nEMPTY\n");
        assert_eq!(out, "|      |\n ------ \nLEVEL CLEARED\n");
    }

    #[test]
    fn test_header_errors() {
        let mut sink = Vec::new();
        assert!(run_script("3\n".as_bytes(), &mut sink).is_err());
        assert!(run_script("3\nx\nEMPTY\n".as_bytes(), &mut sink).is_err());
        assert!(run_script("1\n1\nFULL\n".as_bytes(), &mut sink).is_err());
        assert!(run_script("2\n2\nCONTENTS\nRR\nR\n".as_bytes(), &mut sink).is_err());
        assert!(run_script("0\n2\nEMPTY\n".as_bytes(), &mut sink).is_err());
    }
}
