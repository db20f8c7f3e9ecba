//! Chat page
//!
//! A single static page rendered with two server-side substitutions: the
//! role color style sheet and the list of missing configuration keys.

use crate::types::MessageRole;

const CHAT_TEMPLATE: &str = include_str!("../assets/chat.html");
const ROLE_STYLES_SLOT: &str = "/*ROLE_STYLES*/";
const MISSING_KEYS_SLOT: &str = "/*MISSING_KEYS*/[]";

/// One CSS rule per message role, e.g. `.role-user { color: black; }`.
pub fn role_styles() -> String {
    MessageRole::ALL
        .iter()
        .map(|role| format!(".role-{} {{ color: {}; }}\n", role.as_str(), role.color()))
        .collect()
}

/// Render the page for the given missing configuration keys.
pub fn render_chat_page(missing_keys: &[&str]) -> String {
    let keys = serde_json::to_string(missing_keys).unwrap_or_else(|_| "[]".to_string());
    // Keys are plain identifiers; `<` is escaped so the JSON cannot close the script tag.
    let keys = keys.replace('<', "\\u003c");
    CHAT_TEMPLATE
        .replace(ROLE_STYLES_SLOT, &role_styles())
        .replace(MISSING_KEYS_SLOT, &keys)
}
