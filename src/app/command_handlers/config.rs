use crate::app::command_support::resolve_context;

pub fn cmd_config() -> Result<String, String> {
    let context = resolve_context()?;
    let settings = &context.settings;
    let api_key = match std::env::var(&settings.api_key_env) {
        Ok(value) if !value.trim().is_empty() => "set (redacted)",
        _ => "unset",
    };
    let timeout = settings
        .request_timeout_secs
        .map(|secs| secs.to_string())
        .unwrap_or_else(|| "none".to_string());

    let lines = [
        format!("state_root={}", context.paths.root.display()),
        format!("config_file={}", context.paths.settings_path().display()),
        format!("api_base={}", settings.api_base),
        format!("model={}", settings.model),
        format!("api_key_env={}", settings.api_key_env),
        format!("api_key={api_key}"),
        format!("default_language={}", settings.default_language),
        format!("request_timeout_secs={timeout}"),
        format!(
            "history_dir={}",
            settings.store_dir(&context.paths).display()
        ),
        format!("event_log={}", context.paths.event_log_path().display()),
    ];
    Ok(lines.join("\n"))
}
