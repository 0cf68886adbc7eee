use crate::config::{load_settings, ConfigError, Settings, StatePaths};
use crate::history::HistoryController;
use crate::language::Language;
use crate::refine::GeminiClient;
use crate::session::Session;
use crate::shared::logging::EventLog;
use crate::store::FileStore;

/// Everything a command needs, resolved once from `HOME` and the process env.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub paths: StatePaths,
    pub settings: Settings,
    pub log: EventLog,
}

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn resolve_context() -> Result<AppContext, String> {
    let paths = StatePaths::from_home().map_err(map_config_err)?;
    let settings = load_settings(&paths).map_err(map_config_err)?;
    let log = EventLog::at(paths.event_log_path());
    Ok(AppContext {
        paths,
        settings,
        log,
    })
}

impl AppContext {
    pub fn open_store(&self) -> Result<FileStore, String> {
        FileStore::open(&self.settings.store_dir(&self.paths)).map_err(|e| e.to_string())
    }

    pub fn load_history(&self) -> Result<HistoryController<FileStore>, String> {
        Ok(HistoryController::load(self.open_store()?, &self.log))
    }

    pub fn open_session(&self, language: Language) -> Result<Session<FileStore>, String> {
        Ok(Session::with_history(
            self.load_history()?,
            language,
            self.log.clone(),
        ))
    }

    pub fn gemini_client(&self) -> GeminiClient {
        GeminiClient::new(
            self.settings
                .gemini_options(|key| std::env::var(key).ok()),
        )
    }
}

/// Splits `--language <lang>` / `--language=<lang>` out of the remaining
/// words. The other words are joined with single spaces.
pub fn parse_refine_args(
    args: &[String],
    default_language: Language,
) -> Result<(Language, String), String> {
    let mut language = default_language;
    let mut words = Vec::new();
    let mut index = 0;
    while index < args.len() {
        let arg = args[index].as_str();
        if arg == "--language" || arg == "-l" {
            let value = args
                .get(index + 1)
                .ok_or_else(|| format!("`{arg}` requires a value (english|bangla)"))?;
            language = Language::parse(value)?;
            index += 2;
            continue;
        }
        if let Some(value) = arg.strip_prefix("--language=") {
            language = Language::parse(value)?;
        } else {
            words.push(arg);
        }
        index += 1;
    }
    Ok((language, words.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn refine_args_collect_words_and_language() {
        let (language, idea) = parse_refine_args(
            &args(&["a", "logo", "--language", "bangla", "for", "tea"]),
            Language::English,
        )
        .expect("parse");
        assert_eq!(language, Language::Bangla);
        assert_eq!(idea, "a logo for tea");

        let (language, idea) =
            parse_refine_args(&args(&["--language=en", "cat"]), Language::Bangla).expect("parse");
        assert_eq!(language, Language::English);
        assert_eq!(idea, "cat");
    }

    #[test]
    fn refine_args_default_language_and_errors() {
        let (language, idea) = parse_refine_args(&args(&[]), Language::Bangla).expect("parse");
        assert_eq!(language, Language::Bangla);
        assert_eq!(idea, "");

        assert!(parse_refine_args(&args(&["--language"]), Language::English).is_err());
        assert!(parse_refine_args(&args(&["-l", "klingon", "x"]), Language::English).is_err());
    }
}
