use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

// Optional indentation, then a run of bullet stars mixed with spaces
static LEADING_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\*[* \t]*").unwrap());

/// Strip markdown bold markers and leading bullet stars from model output
pub fn clean_model_output(text: &str) -> String {
    let unbolded = BOLD.replace_all(text, "$1");
    LEADING_BULLET.replace_all(&unbolded, "").into_owned()
}
