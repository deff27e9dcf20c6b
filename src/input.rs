//! Parsing raw input lines into runtime commands.
//!
//! Grammar:
//! - blank line → abstain
//! - `exit` / `quit` → terminate
//! - `spawn NAME` → spawn a worker agent
//! - `@TARGETS[#CAP] PAYLOAD` → send; TARGETS is `all`, a name, or `a,b,c`
//! - `a TEXT` / `b TEXT` / `both TEXT` → shorthand for `@A` / `@B` / `@A,B`
//! - anything else → stdin line to agent A with capability 1
//!
//! Anything that looks like a command but does not parse abstains.

use regex::Regex;

use crate::protocol::{MessageKind, Target};

/// Name of the agent plain stdin lines go to.
pub const STDIN_AGENT: &str = "A";

/// Target list that addresses every registered agent.
pub const BROADCAST_TARGET: &str = "all";

/// Capability attached when a line does not name one.
pub const DEFAULT_CAPABILITY: u64 = 1;

/// What a line of input asks the runtime to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send {
        target: Target,
        capability: u64,
        kind: MessageKind,
        payload: String,
    },
    Spawn(String),
    Terminate,
    Abstain,
}

const SEND_PATTERN: &str = r"^@(\w+(?:,\w+)*)(?:#(\d+))?\s+(\S.*)$";
const SPAWN_PATTERN: &str = r"^spawn\s+(\w+)$";

/// Parse one line of input.
pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Abstain;
    }

    match line {
        "exit" | "quit" => return Command::Terminate,
        _ => {}
    }

    if line.starts_with('@') {
        return parse_send(line);
    }

    if line.starts_with("spawn") && (line.len() == 5 || line[5..].starts_with(char::is_whitespace)) {
        let re = match Regex::new(SPAWN_PATTERN) {
            Ok(re) => re,
            Err(_) => return Command::Abstain,
        };
        return match re.captures(line) {
            Some(caps) => Command::Spawn(caps[1].to_string()),
            None => Command::Abstain,
        };
    }

    if let Some((head, rest)) = line.split_once(char::is_whitespace) {
        let target = match head {
            "a" => Some(Target::agent("A")),
            "b" => Some(Target::agent("B")),
            "both" => Some(Target::group(["A", "B"])),
            _ => None,
        };
        if let Some(target) = target {
            return Command::Send {
                target,
                capability: DEFAULT_CAPABILITY,
                kind: MessageKind::App,
                payload: rest.trim_start().to_string(),
            };
        }
    }

    Command::Send {
        target: Target::agent(STDIN_AGENT),
        capability: DEFAULT_CAPABILITY,
        kind: MessageKind::StdinLine,
        payload: line.to_string(),
    }
}

fn parse_send(line: &str) -> Command {
    let re = match Regex::new(SEND_PATTERN) {
        Ok(re) => re,
        Err(_) => return Command::Abstain,
    };
    let caps = match re.captures(line) {
        Some(caps) => caps,
        None => return Command::Abstain,
    };

    let capability = match caps.get(2) {
        Some(m) => match m.as_str().parse::<u64>() {
            Ok(cap) => cap,
            Err(_) => return Command::Abstain,
        },
        None => DEFAULT_CAPABILITY,
    };

    let targets: Vec<&str> = caps[1].split(',').collect();
    let target = match targets.as_slice() {
        [BROADCAST_TARGET] => Target::Broadcast,
        [single] => Target::agent(*single),
        many => Target::group(many.iter().copied()),
    };

    Command::Send {
        target,
        capability,
        kind: MessageKind::App,
        payload: caps[3].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(target: Target, capability: u64, kind: MessageKind, payload: &str) -> Command {
        Command::Send {
            target,
            capability,
            kind,
            payload: payload.to_string(),
        }
    }

    #[test]
    fn test_blank_and_control() {
        assert_eq!(parse_line(""), Command::Abstain);
        assert_eq!(parse_line("   \t "), Command::Abstain);
        assert_eq!(parse_line("exit"), Command::Terminate);
        assert_eq!(parse_line("  quit  "), Command::Terminate);
    }

    #[test]
    fn test_plain_text_goes_to_a() {
        assert_eq!(
            parse_line("  hello there"),
            send(Target::agent("A"), 1, MessageKind::StdinLine, "hello there")
        );
        assert_eq!(
            parse_line("spawned"),
            send(Target::agent("A"), 1, MessageKind::StdinLine, "spawned")
        );
    }

    #[test]
    fn test_shorthands() {
        assert_eq!(parse_line("a hi"), send(Target::agent("A"), 1, MessageKind::App, "hi"));
        assert_eq!(parse_line("b  yo"), send(Target::agent("B"), 1, MessageKind::App, "yo"));
        assert_eq!(
            parse_line("both hey you"),
            send(Target::group(["A", "B"]), 1, MessageKind::App, "hey you")
        );
    }

    #[test]
    fn test_at_targets() {
        assert_eq!(parse_line("@B#2 hi 小弟."), send(Target::agent("B"), 2, MessageKind::App, "hi 小弟."));
        assert_eq!(parse_line("@all hi Tony."), send(Target::Broadcast, 1, MessageKind::App, "hi Tony."));
        assert_eq!(
            parse_line("@A,B,C#3 go"),
            send(Target::group(["A", "B", "C"]), 3, MessageKind::App, "go")
        );
    }

    #[test]
    fn test_malformed_abstains() {
        assert_eq!(parse_line("@"), Command::Abstain);
        assert_eq!(parse_line("@A"), Command::Abstain);
        assert_eq!(parse_line("@A#x hi"), Command::Abstain);
        assert_eq!(parse_line("@A#99999999999999999999999 hi"), Command::Abstain);
        assert_eq!(parse_line("spawn"), Command::Abstain);
        assert_eq!(parse_line("spawn two words"), Command::Abstain);
    }

    #[test]
    fn test_spawn() {
        assert_eq!(parse_line("spawn C"), Command::Spawn("C".to_string()));
    }
}
