use crate::app::cli::{help_text, parse_cli_verb, CliVerb};

pub mod config;
pub mod history;
pub mod refine;
pub mod tui;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return tui::cmd_tui();
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Tui => tui::cmd_tui(),
        CliVerb::Refine => refine::cmd_refine(&args[1..]),
        CliVerb::History => history::cmd_history(&args[1..]),
        CliVerb::Config => config::cmd_config(),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!(
            "unknown command `{}`\n\n{}",
            args[0],
            help_text()
        )),
    }
}
