#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Tui,
    Refine,
    History,
    Config,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "tui" => CliVerb::Tui,
        "refine" => CliVerb::Refine,
        "history" => CliVerb::History,
        "config" => CliVerb::Config,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  tui                                  Open the interactive prompt perfecter (default)"
            .to_string(),
        "  refine [--language <lang>] <idea>    Refine one idea and print the result".to_string(),
        "  history list                         List saved prompts, newest first".to_string(),
        "  history show <id>                    Print a saved prompt in full".to_string(),
        "  history delete <id>                  Delete a saved prompt".to_string(),
        "  history copy <id>                    Copy a saved refined prompt to the clipboard"
            .to_string(),
        "  config                               Show resolved configuration".to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    let mut lines = cli_help_lines();
    lines.push(String::new());
    lines.push("Languages: english, bangla".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_parse_and_unknown_falls_through() {
        assert_eq!(parse_cli_verb("refine"), CliVerb::Refine);
        assert_eq!(parse_cli_verb("history"), CliVerb::History);
        assert_eq!(parse_cli_verb("--help"), CliVerb::Help);
        assert_eq!(parse_cli_verb("generate"), CliVerb::Unknown);
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for verb in ["tui", "refine", "history list", "history copy", "config", "help"] {
            assert!(help.contains(verb), "missing `{verb}` in:\n{help}");
        }
    }
}
