//! Lightweight markdown to display markup.
//!
//! This is a single ordered pass over model prose. Bold runs before italics
//! so `**` is not consumed as two single stars, and paragraph splitting runs
//! after inline emphasis. Input is not escaped.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern compiles"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern compiles"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,3}\s+(.+)$").expect("heading pattern compiles"));

pub fn format_for_display(raw: &str) -> String {
    let formatted = BOLD.replace_all(raw, "<strong>${1}</strong>");
    let formatted = ITALIC.replace_all(&formatted, "<em>${1}</em>");
    let formatted = HEADING.replace_all(&formatted, "<h3>${1}</h3>");
    let formatted = formatted.replace("\n\n", "</p><p>").replace('\n', "<br>");
    format!("<p>{formatted}</p>")
}
