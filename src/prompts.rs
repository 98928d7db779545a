//! Prompts for transcription and website synthesis.
//!
//! Callers can override the transcription instruction via
//! [`crate::config::ScribeConfig::transcription_prompt`]; the constants here
//! are used only when no override is provided.

use crate::output::Recipe;

/// Default instruction sent alongside each recipe photo.
pub const TRANSCRIPTION_PROMPT: &str = "Transcribe the following handwritten recipe into markdown format. \
Start with the recipe name as a level-one heading (# Name), then list the ingredients and the steps. \
Output ONLY the markdown: no commentary, no explanations, and do not wrap it in code fences.";

/// System message for the website request.
pub const WEBSITE_SYSTEM_PROMPT: &str = "You are an expert front-end developer. \
You write complete, valid, self-contained HTML5 documents.";

/// Requirements appended after the recipe data in the website request.
const WEBSITE_REQUIREMENTS: &str = r#"Requirements:
1. NAVIGATION
   - A table of contents at the top linking to every recipe by title
   - Each recipe in its own section with a stable anchor id
   - A "back to top" link after each recipe

2. STYLING
   - Responsive layout that reads well on phones and desktops
   - Support dark mode via the prefers-color-scheme media query
   - Render each recipe's markdown content as proper HTML (headings, lists, emphasis)

3. SINGLE FILE
   - Embed ALL CSS (and any JavaScript) inline; no external stylesheets, fonts, scripts or images
   - Start with <!DOCTYPE html>

4. OUTPUT FORMAT
   - Return the complete document inside one ```html fenced code block
   - Do NOT add commentary before or after the block"#;

/// Build the user message for the website request.
///
/// The recipes are embedded as pretty-printed JSON so titles and content
/// containing quotes or newlines survive intact.
pub fn website_prompt(recipes: &[Recipe], site_name: &str) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string_pretty(recipes)?;
    Ok(format!(
        "Create a standalone recipe website named \"{site_name}\" from the following recipes \
(JSON array of objects with \"title\" and markdown \"content\"):\n\n{data}\n\n{WEBSITE_REQUIREMENTS}"
    ))
}
