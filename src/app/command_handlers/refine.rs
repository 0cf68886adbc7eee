use crate::app::command_support::{parse_refine_args, resolve_context};
use crate::session::Phase;

pub fn cmd_refine(args: &[String]) -> Result<String, String> {
    let context = resolve_context()?;
    let (language, idea) = parse_refine_args(args, context.settings.default_language)?;
    let mut session = context.open_session(language)?;
    session.set_input(idea);

    let client = context.gemini_client();
    match session.generate(&client) {
        Phase::Succeeded => Ok(session.output().to_string()),
        _ => Err(session
            .error()
            .unwrap_or("refinement did not complete")
            .to_string()),
    }
}
