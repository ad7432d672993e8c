//! Player commands read from stdin.

use std::path::PathBuf;
use std::str::FromStr;

/// Help text listing every command.
pub const HELP: &str = "\
commands:
  status          show stats, body state and mood
  feed <photo>    offer a photo file
  pet             pet the khulark
  snack           hand over a snack
  sound on|off    toggle sound effects
  reset           start over with a fresh khulark
  help            show this help
  quit            save and exit";

/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the current snapshot.
    Status,
    /// Offer the photo at this path.
    Feed(PathBuf),
    /// Pet the creature.
    Pet,
    /// Give a snack.
    Snack,
    /// Turn sound on or off.
    Sound(bool),
    /// Start over.
    Reset,
    /// Print the command list.
    Help,
    /// Save and exit.
    Quit,
}

/// Why a line could not be read as a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,

    /// First word is not a command.
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),

    /// `feed` without a file.
    #[error("usage: feed <photo>")]
    MissingPhoto,

    /// `sound` with something other than on/off.
    #[error("usage: sound on|off")]
    BadSoundSetting,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        match word.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "status" | "s" => Ok(Self::Status),
            "feed" | "f" if rest.is_empty() => Err(CommandError::MissingPhoto),
            "feed" | "f" => Ok(Self::Feed(PathBuf::from(rest))),
            "pet" | "p" => Ok(Self::Pet),
            "snack" => Ok(Self::Snack),
            "sound" => match rest.to_lowercase().as_str() {
                "on" => Ok(Self::Sound(true)),
                "off" => Ok(Self::Sound(false)),
                _ => Err(CommandError::BadSoundSetting),
            },
            "reset" => Ok(Self::Reset),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_owned())),
        }
    }
}
