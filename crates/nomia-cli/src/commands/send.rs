//! One-shot command sender.

use nomia_core::{Command, Direction};
use nomia_link::CommandClient;

use super::link_config;

pub fn run(host: &str, port: u16, action: &str, value: Option<&str>) {
    let command = match build_command(action, value) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let client = CommandClient::new(&link_config(host, port, 0));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };
    match rt.block_on(client.send(&command)) {
        Ok(()) => println!("sent {command} to {}", client.url()),
        Err(e) => {
            eprintln!("Error sending {command}: {e}");
            std::process::exit(1);
        }
    }
}

/// Turn `mode AUTO`, `move w`, `move left`, `terminate` into a command.
pub fn build_command(action: &str, value: Option<&str>) -> Result<Command, String> {
    match action {
        "mode" => {
            let label = value.ok_or("mode needs a value, e.g. AUTO")?;
            Ok(Command::mode(label.to_ascii_uppercase()))
        }
        "move" => {
            let raw = value.ok_or("move needs a direction: w/a/s/d or fwd/bwd/left/right")?;
            parse_direction(raw)
                .map(Command::movement)
                .ok_or_else(|| format!("unknown direction {raw:?}"))
        }
        "terminate" | "stop" => Ok(Command::terminate()),
        other => Err(format!("unknown action {other:?}")),
    }
}

fn parse_direction(s: &str) -> Option<Direction> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Direction::from_key(c);
    }
    match s.to_ascii_lowercase().as_str() {
        "fwd" | "forward" => Some(Direction::Forward),
        "bwd" | "back" | "backward" => Some(Direction::Backward),
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_mode_commands() {
        assert_eq!(build_command("mode", Some("auto")), Ok(Command::mode("AUTO")));
        assert!(build_command("mode", None).is_err());
    }

    #[test]
    fn builds_move_commands_from_keys_and_names() {
        assert_eq!(
            build_command("move", Some("w")),
            Ok(Command::movement(Direction::Forward))
        );
        assert_eq!(
            build_command("move", Some("LEFT")),
            Ok(Command::movement(Direction::Left))
        );
        assert_eq!(
            build_command("move", Some("bwd")),
            Ok(Command::movement(Direction::Backward))
        );
        assert!(build_command("move", Some("up")).is_err());
        assert!(build_command("move", Some("q")).is_err());
    }

    #[test]
    fn terminate_takes_no_value() {
        let c = build_command("terminate", None).unwrap();
        assert_eq!(c.action, "CMD_TERMINATE");
        assert_eq!(c.value, None);
        assert!(build_command("dance", None).is_err());
    }
}
