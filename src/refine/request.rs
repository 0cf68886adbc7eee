use crate::language::Language;

pub fn system_instruction(language: Language) -> String {
    format!(
        "You are an expert prompt engineer. The user gives you a short, rough idea. \
Rewrite it as one detailed, well-structured prompt that an AI generation system can act on: \
state the subject, the intended style or tone, the important details, and any constraints. \
Write the refined prompt in {language}. \
Reply with the refined prompt only, as a single block of text, with no preamble, \
no explanation, no headings and no surrounding quotes."
    )
}

/// Everything sent for one refinement. No context is carried between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefineRequest {
    pub system_instruction: String,
    pub user_text: String,
    pub language: Language,
}

impl RefineRequest {
    pub fn new(input: &str, language: Language) -> Self {
        Self {
            system_instruction: system_instruction(language),
            user_text: format!("Idea: {}", input.trim()),
            language,
        }
    }
}
