use crate::app::command_support::resolve_context;
use crate::clipboard::SystemClipboard;
use crate::tui::run_prompt_tui;
use std::sync::Arc;

pub fn cmd_tui() -> Result<String, String> {
    let context = resolve_context()?;
    let session = context.open_session(context.settings.default_language)?;
    let refiner = Arc::new(context.gemini_client());
    let session = run_prompt_tui(session, refiner, SystemClipboard)?;
    Ok(format!("saved_prompts={}", session.history().len()))
}
