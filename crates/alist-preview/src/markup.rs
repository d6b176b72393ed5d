//! Minimal markdown → HTML renderer.
//!
//! The renderer is an ordered list of pure `&str → String` stages. Escaping
//! is always the first stage, so every later stage works on text that can
//! no longer contain raw markup from the input. Code content is rewritten
//! into numeric entities as soon as it is recognised, which keeps the
//! emphasis, link and list stages from touching it.
//!
//! This is a best-effort renderer: nested lists, overlapping emphasis and
//! reference-style links are not supported.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::html;

type Stage = fn(&str) -> String;

/// Stages in execution order.
const PIPELINE: [(&str, Stage); 10] = [
    ("escape", escape),
    ("headings", headings),
    ("code blocks", code_blocks),
    ("inline code", inline_code),
    ("bold", bold),
    ("italic", italic),
    ("links", links),
    ("list items", list_items),
    ("lists", lists),
    ("paragraphs", paragraphs),
];

/// Link schemes that are rendered as anchors. Anything else with an
/// explicit scheme is rendered as plain text.
const SAFE_SCHEMES: [&str; 4] = ["http", "https", "mailto", "alist"];

/// Render `markdown` to an HTML fragment.
///
/// ```
/// let html = alist_preview::markup::render("**bold** and `code`");
/// assert_eq!(html, "<p><strong>bold</strong> and <code>code</code></p>");
/// ```
pub fn render(markdown: &str) -> String {
    let normalized = markdown.replace("\r\n", "\n").replace('\r', "\n");
    PIPELINE
        .iter()
        .fold(normalized, |text, (_, stage)| stage(&text))
}

/// Stage names in execution order.
pub fn stages() -> impl Iterator<Item = &'static str> {
    PIPELINE.iter().map(|(name, _)| *name)
}

fn regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("invalid built-in pattern {pattern:?}: {e}"),
    }
}

static HEADING: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)^(#{1,3})[ \t]+(.+?)[ \t]*$"));
static FENCE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?ms)^```[ \t]*([\w+-]*)[ \t]*\n(.*?)^```[ \t]*$"));
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| regex(r"`([^`\n]+)`"));
static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| regex(r"\*\*([^*\n]+?)\*\*"));
static BOLD_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| regex(r"__([^_\n]+?)__"));
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| regex(r"\*([^*\n]+?)\*"));
static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| regex(r"\b_([^_\n]+?)_\b"));
static LINK: LazyLock<Regex> = LazyLock::new(|| regex(r"\[([^\]\n]+)\]\(([^)\s]+)\)"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)^[ \t]*[-*+][ \t]+(.+)$"));
static LIST_RUN: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^<li>.*</li>$(?:\n<li>.*</li>$)*"));

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn escape(text: &str) -> String {
    html::escape(text)
}

fn headings(text: &str) -> String {
    HEADING
        .replace_all(text, |caps: &Captures| {
            let level = caps[1].len();
            format!("<h{level}>{}</h{level}>", &caps[2])
        })
        .into_owned()
}

/// Rewrite characters that later stages react to as numeric entities.
fn protect(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for c in code.chars() {
        match c {
            '*' => out.push_str("&#42;"),
            '_' => out.push_str("&#95;"),
            '`' => out.push_str("&#96;"),
            '[' => out.push_str("&#91;"),
            ']' => out.push_str("&#93;"),
            '(' => out.push_str("&#40;"),
            ')' => out.push_str("&#41;"),
            '#' => out.push_str("&#35;"),
            '\n' => out.push_str("&#10;"),
            _ => out.push(c),
        }
    }
    out
}

fn code_blocks(text: &str) -> String {
    FENCE
        .replace_all(text, |caps: &Captures| {
            let body = protect(caps[2].trim_end_matches('\n'));
            match &caps[1] {
                "" => format!("<pre><code>{body}</code></pre>"),
                lang => format!("<pre><code class=\"language-{lang}\">{body}</code></pre>"),
            }
        })
        .into_owned()
}

fn inline_code(text: &str) -> String {
    INLINE_CODE
        .replace_all(text, |caps: &Captures| format!("<code>{}</code>", protect(&caps[1])))
        .into_owned()
}

fn bold(text: &str) -> String {
    let text = BOLD_STARS.replace_all(text, "<strong>$1</strong>");
    BOLD_UNDERSCORES
        .replace_all(&text, "<strong>$1</strong>")
        .into_owned()
}

fn italic(text: &str) -> String {
    let text = ITALIC_STAR.replace_all(text, "<em>$1</em>");
    ITALIC_UNDERSCORE
        .replace_all(&text, "<em>$1</em>")
        .into_owned()
}

fn is_safe_url(url: &str) -> bool {
    match url.split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => SAFE_SCHEMES
            .iter()
            .any(|safe| scheme.eq_ignore_ascii_case(safe)),
        // No scheme: relative path or fragment.
        _ => true,
    }
}

fn links(text: &str) -> String {
    LINK.replace_all(text, |caps: &Captures| {
        let (label, url) = (&caps[1], &caps[2]);
        if is_safe_url(url) {
            format!("<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{label}</a>")
        } else {
            label.to_string()
        }
    })
    .into_owned()
}

fn list_items(text: &str) -> String {
    LIST_ITEM.replace_all(text, "<li>$1</li>").into_owned()
}

fn lists(text: &str) -> String {
    LIST_RUN
        .replace_all(text, |caps: &Captures| format!("<ul>\n{}\n</ul>", &caps[0]))
        .into_owned()
}

const BLOCK_TAGS: [&str; 6] = ["<h1>", "<h2>", "<h3>", "<pre>", "<ul>", "<li>"];

fn is_block_line(line: &str) -> bool {
    line == "</ul>" || BLOCK_TAGS.iter().any(|tag| line.starts_with(tag))
}

fn paragraphs(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    let flush = |pending: &mut Vec<&str>, out: &mut Vec<String>| {
        if !pending.is_empty() {
            out.push(format!("<p>{}</p>", pending.join("<br>")));
            pending.clear();
        }
    };

    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            flush(&mut pending, &mut out);
        } else if is_block_line(line) {
            flush(&mut pending, &mut out);
            out.push(line.to_string());
        } else {
            pending.push(line);
        }
    }
    flush(&mut pending, &mut out);
    out.join("\n")
}
