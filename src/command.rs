//! User input parsing. Positions typed by the user are 1-based; everything
//! past this module is 0-based.

use crate::{
    settings::{DateFormat, SizeField},
    store::Direction,
};
use anyhow::{anyhow, bail, Context};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Search(String),
    /// Save the nth search result
    Add(usize),
    /// Remove immediately (search view)
    Remove(usize),
    /// Remove after confirmation (dashboard)
    Delete(usize),
    Move(usize, Direction),
    SetSize(SizeField, f64),
    SetDateFormat(DateFormat),
    ShowSettings,
    List,
    Dashboard,
    Back,
    /// Answer to a pending yes/no question
    Confirm(bool),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (word, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let rest = rest.trim();

        let command = match word.to_lowercase().as_str() {
            "search" | "s" => {
                if rest.is_empty() {
                    bail!("Usage: search <city>");
                }
                Self::Search(rest.to_owned())
            }
            "add" | "a" => Self::Add(parse_position(rest)?),
            "remove" | "rm" => Self::Remove(parse_position(rest)?),
            "del" | "delete" => Self::Delete(parse_position(rest)?),
            "left" => Self::Move(parse_position(rest)?, Direction::Left),
            "right" => Self::Move(parse_position(rest)?, Direction::Right),
            "set" => parse_set(rest)?,
            "settings" => Self::ShowSettings,
            "list" | "ls" => Self::List,
            "dash" | "dashboard" => Self::Dashboard,
            "back" => Self::Back,
            "y" | "yes" => Self::Confirm(true),
            "n" | "no" => Self::Confirm(false),
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            "" => bail!("Empty command"),
            other => bail!("Unknown command `{other}`, try `help`"),
        };
        Ok(command)
    }
}

/// Parse a 1-based position into a 0-based index
fn parse_position(s: &str) -> anyhow::Result<usize> {
    let position: usize = s
        .parse()
        .with_context(|| format!("Expected a number, got `{s}`"))?;
    position
        .checked_sub(1)
        .ok_or_else(|| anyhow!("Positions start at 1"))
}

fn parse_set(s: &str) -> anyhow::Result<Command> {
    let Some((field, value)) = s.split_once(char::is_whitespace) else {
        bail!("Usage: set <city|country|time|date> <size> | set format <format>");
    };
    let value = value.trim();
    if field == "format" {
        return Ok(Command::SetDateFormat(value.parse()?));
    }
    let field: SizeField = field.parse()?;
    let size: f64 = value
        .parse()
        .with_context(|| format!("Invalid size `{value}`"))?;
    if !(size.is_finite() && size > 0.0) {
        bail!("Size must be a positive number");
    }
    Ok(Command::SetSize(field, size))
}

pub const HELP: &str = "\
Search view:
  search <city>     look up a city
  add <n>           save the nth search result
  remove <n>        remove the nth saved city
  list              show saved cities
  dash              open the live dashboard
Dashboard:
  left <n>          move the nth card left
  right <n>         move the nth card right
  del <n>           remove the nth card (asks first)
  back              return to the search view
Anywhere:
  set <city|country|time|date> <size>
  set format <std|full|us|intl|short|day>
  settings          show current settings
  help, quit";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(s: &str) -> Command {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse("search  New York "), Command::Search("New York".into()));
        assert_eq!(parse("add 1"), Command::Add(0));
        assert_eq!(parse("rm 3"), Command::Remove(2));
        assert_eq!(parse("del 2"), Command::Delete(1));
        assert_eq!(parse("left 2"), Command::Move(1, Direction::Left));
        assert_eq!(parse("RIGHT 1"), Command::Move(0, Direction::Right));
        assert_eq!(parse("set time 3.5"), Command::SetSize(SizeField::Time, 3.5));
        assert_eq!(
            parse("set format intl"),
            Command::SetDateFormat(DateFormat::Intl)
        );
        assert_eq!(parse("dash"), Command::Dashboard);
        assert_eq!(parse("y"), Command::Confirm(true));
        assert_eq!(parse("quit"), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        for input in [
            "",
            "search",
            "add",
            "add 0",
            "add one",
            "set",
            "set time",
            "set time -2",
            "set time big",
            "set volume 2",
            "set format iso",
            "launch",
        ] {
            assert!(input.parse::<Command>().is_err(), "{input:?} should fail");
        }
    }
}
