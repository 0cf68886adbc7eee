use crate::app::command_support::resolve_context;
use crate::clipboard::{copy_history_output, SystemClipboard};
use crate::history::{HistoryEntry, EMPTY_HISTORY_MESSAGE};
use crate::shared::{format_local_millis, truncate_chars};

pub fn cmd_history(args: &[String]) -> Result<String, String> {
    match args {
        [sub] if sub == "list" => cmd_history_list(),
        [sub, id] if sub == "show" => cmd_history_show(id),
        [sub, id] if sub == "delete" => cmd_history_delete(id),
        [sub, id] if sub == "copy" => cmd_history_copy(id),
        _ => Err("usage: history list | history show <id> | history delete <id> | history copy <id>"
            .to_string()),
    }
}

fn cmd_history_list() -> Result<String, String> {
    let context = resolve_context()?;
    let history = context.load_history()?;
    if history.is_empty() {
        return Ok(EMPTY_HISTORY_MESSAGE.to_string());
    }
    let lines = history
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "{}\t{}\t{}\t{}",
                entry.id(),
                format_local_millis(entry.timestamp()),
                entry.language(),
                truncate_chars(entry.input_prompt(), 60)
            )
        })
        .collect::<Vec<_>>();
    Ok(lines.join("\n"))
}

fn render_entry(entry: &HistoryEntry) -> String {
    [
        format!("id={}", entry.id()),
        format!("created_at={}", format_local_millis(entry.timestamp())),
        format!("language={}", entry.language()),
        "input:".to_string(),
        entry.input_prompt().to_string(),
        "output:".to_string(),
        entry.output_prompt().to_string(),
    ]
    .join("\n")
}

fn cmd_history_show(id: &str) -> Result<String, String> {
    let context = resolve_context()?;
    let history = context.load_history()?;
    history
        .find(id)
        .map(render_entry)
        .ok_or_else(|| format!("history entry `{id}` not found"))
}

fn cmd_history_delete(id: &str) -> Result<String, String> {
    let context = resolve_context()?;
    let mut history = context.load_history()?;
    let deleted = history.delete(id).map_err(|e| e.to_string())?;
    Ok(format!("deleted={deleted}\nid={id}"))
}

fn cmd_history_copy(id: &str) -> Result<String, String> {
    let context = resolve_context()?;
    let session = context.open_session(context.settings.default_language)?;
    if !copy_history_output(&session, id, &mut SystemClipboard)? {
        return Err(format!("history entry `{id}` not found"));
    }
    Ok(format!("copied=true\nid={id}"))
}
