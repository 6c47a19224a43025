#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Limit(Option<u32>),  // /limit <n> | /limit
    BadLimit(String),    // /limit <not a number>
    Debug,               // /debug
    Help,                // /help
    Quit,                // /quit or /exit
    Unknown(String),
}

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Command::Unknown(trimmed.to_string());
    }
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match verb {
        "/limit" => match rest {
            None => Command::Limit(None),
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) => Command::Limit(Some(n)),
                Err(_) => Command::BadLimit(raw.to_string()),
            },
        },
        "/debug" => Command::Debug,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_limit_forms() {
        assert_eq!(parse_command("/limit 7"), Command::Limit(Some(7)));
        assert_eq!(parse_command("  /limit   "), Command::Limit(None));
        assert_eq!(parse_command("/limit many"), Command::BadLimit("many".into()));
        assert_eq!(parse_command("/limit -2"), Command::BadLimit("-2".into()));
    }

    #[test]
    fn parses_simple_verbs() {
        assert_eq!(parse_command("/debug"), Command::Debug);
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/search x"), Command::Unknown("/search x".into()));
    }
}
