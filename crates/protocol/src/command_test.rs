//! Tests for the command grammar

use super::*;

#[test]
fn test_parse_filter_commands() {
    assert_eq!(
        Command::parse("hosts ^web"),
        Command::SetPattern {
            field: FilterField::Hosts,
            pattern: "^web".into()
        }
    );
    assert_eq!(
        Command::parse("categories Processor|Memory"),
        Command::SetPattern {
            field: FilterField::Categories,
            pattern: "Processor|Memory".into()
        }
    );
    assert_eq!(
        Command::parse("counters ^% Processor.*"),
        Command::SetPattern {
            field: FilterField::Counters,
            pattern: "^% Processor.*".into()
        }
    );
    assert_eq!(
        Command::parse("instances _Total"),
        Command::SetPattern {
            field: FilterField::Instances,
            pattern: "_Total".into()
        }
    );
}

#[test]
fn test_pattern_keeps_rest_of_line_verbatim() {
    assert_eq!(
        Command::parse("counters  Bytes Sent "),
        Command::SetPattern {
            field: FilterField::Counters,
            pattern: " Bytes Sent ".into()
        }
    );
    assert_eq!(
        Command::parse("hosts "),
        Command::SetPattern {
            field: FilterField::Hosts,
            pattern: String::new()
        }
    );
}

#[test]
fn test_filter_keywords_are_case_sensitive() {
    assert_eq!(
        Command::parse("HOSTS .*"),
        Command::Unknown("HOSTS .*".into())
    );
    assert_eq!(Command::parse("hosts"), Command::Unknown("hosts".into()));
}

#[test]
fn test_bare_keywords_ignore_case() {
    assert_eq!(Command::parse("start"), Command::Start);
    assert_eq!(Command::parse("START"), Command::Start);
    assert_eq!(Command::parse("Stop"), Command::Stop);
    assert_eq!(Command::parse("qUiT"), Command::Quit);
}

#[test]
fn test_unknown_input() {
    assert_eq!(Command::parse(""), Command::Unknown(String::new()));
    assert_eq!(Command::parse("start now"), Command::Unknown("start now".into()));
    assert_eq!(Command::parse("help"), Command::Unknown("help".into()));
}

#[test]
fn test_to_line_parses_back() {
    for command in [
        Command::Start,
        Command::Stop,
        Command::Quit,
        Command::SetPattern {
            field: FilterField::Instances,
            pattern: "^eth".into(),
        },
    ] {
        let line = command.to_line();
        assert!(line.ends_with('\n'));
        assert_eq!(Command::parse(line.trim_end_matches('\n')), command);
    }
}

#[test]
fn test_replies() {
    assert_eq!(pattern_ack(FilterField::Hosts, "^h1$"), "Hosts pattern:^h1$");
    assert_eq!(info_line("Huh?"), "I Huh?\n");
    assert!(USAGE.starts_with("Use commands: start, stop"));
}
