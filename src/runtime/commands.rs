use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use crate::player::Command;

/// One line of host input.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Player(Command),
    Quit,
}

/// Parse a command line such as `next`, `scrub 42.5` or `select ch-3`.
pub fn parse_command(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?.to_ascii_lowercase();
    let arg = parts.next();

    let cmd = match (verb.as_str(), arg) {
        ("quit" | "q" | "exit", _) => return Some(Input::Quit),
        ("play", _) => Command::Play,
        ("pause", _) => Command::Pause,
        ("toggle" | "p", _) => Command::TogglePlay,
        ("next" | "n", _) => Command::Next,
        ("prev" | "previous", _) => Command::Previous,
        ("immersive" | "360", _) => Command::SwitchToImmersive,
        ("audio", _) => Command::SwitchToAudio,
        ("mute" | "m", _) => Command::ToggleMute,
        ("retry", _) => Command::Retry,
        ("grab", _) => Command::BeginScrub,
        ("scrub" | "seek", Some(pos)) => Command::Scrub(pos.parse().ok()?),
        ("select", Some(id)) => Command::SelectTrack(id.to_string()),
        _ => return None,
    };
    Some(Input::Player(cmd))
}

/// Read stdin on its own thread and forward parsed commands. The channel
/// closes when stdin does.
pub fn spawn_stdin_reader() -> Receiver<Input> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(input) => {
                    let quit = input == Input::Quit;
                    if tx.send(input).is_err() || quit {
                        break;
                    }
                }
                None => tracing::warn!(line = %line.trim(), "unrecognised command"),
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbs_and_arguments() {
        assert_eq!(parse_command("next"), Some(Input::Player(Command::Next)));
        assert_eq!(parse_command("  Q "), Some(Input::Quit));
        assert_eq!(
            parse_command("scrub 42.5"),
            Some(Input::Player(Command::Scrub(42.5)))
        );
        assert_eq!(
            parse_command("select ch-3"),
            Some(Input::Player(Command::SelectTrack("ch-3".into())))
        );
    }

    #[test]
    fn rejects_unknown_or_incomplete_lines() {
        assert_eq!(parse_command("dance"), None);
        assert_eq!(parse_command("scrub"), None);
        assert_eq!(parse_command("scrub soon"), None);
        assert_eq!(parse_command(""), None);
    }
}
