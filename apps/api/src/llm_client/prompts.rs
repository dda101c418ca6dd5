// Prompt files and their built-in defaults.
// A file in the configured prompts dir wins, then `prompts/` in the working
// directory, then the constant compiled in here.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

pub const CHAT_SYSTEM_FILE: &str = "chat_system.txt";
pub const CHAT_HUMAN_FILE: &str = "chat_human.txt";

const FALLBACK_PROMPTS_DIR: &str = "prompts";

/// System prompt for HR question answering over retrieved candidate chunks.
pub const DEFAULT_CHAT_SYSTEM: &str = "You are an HR assistant that answers questions about job candidates. \
    Use ONLY the provided context. Every candidate you mention must be cited by its CandidateId. \
    Prefer candidates marked prepared and with a higher English level when the question asks for a ranking. \
    If the context does not contain the answer, say so plainly. Do NOT invent candidates or skills.";

/// Human turn template. `{context}` and `{input}` are substituted.
pub const DEFAULT_CHAT_HUMAN: &str =
    "Context:\n{context}\n\nQuestion:\n{input}\n\nAnswer (cite CandidateId/section):";

/// Reads `name` from `primary_dir`, then from `prompts/`, falling back to `default`.
pub async fn load_prompt(primary_dir: &Path, name: &str, default: &str) -> String {
    for dir in [primary_dir.to_path_buf(), PathBuf::from(FALLBACK_PROMPTS_DIR)] {
        let path = dir.join(name);
        if let Ok(text) = tokio::fs::read_to_string(&path).await {
            debug!("Loaded prompt {}", path.display());
            return text;
        }
    }
    default.to_string()
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(context|input)\}").expect("placeholder pattern is valid")
});

/// Fills the human template with retrieved context and the user question.
/// Placeholders are only recognised in the template, never inside the inserted text.
pub fn render_human_prompt(template: &str, context: &str, question: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "context" => context.to_string(),
            _ => question.to_string(),
        })
        .into_owned()
}
