//! Repairs for artifacts left in AsciiDoc by lossy format conversion.
//!
//! [`cleanup`] applies four repairs:
//!
//! - a trailing ` +` continuation marker after content is stripped;
//! - a line holding only [`PLACEHOLDER`] becomes a bare `+`;
//! - inside `--` open blocks, leading and trailing blank lines are dropped, the
//!   first line loses its leading whitespace and the last its trailing
//!   whitespace, and runs of blank lines collapse to one;
//! - outside open blocks, a line of three or more `-` becomes `---` with
//!   exactly one blank line on each side.
//!
//! Repairs work on line content only. Each line keeps its own ending (`\n`,
//! `\r\n` or none), so CRLF documents stay CRLF. The repairs never produce
//! input for one another, so cleanup is idempotent.

use std::sync::LazyLock;

use regex::Regex;

/// Token converters emit where a literal `+` continuation line belongs.
pub const PLACEHOLDER: &str = "%%PLUS%%";

const THEMATIC_BREAK: &str = "---";

static TRAILING_CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?\S)(?:\s+\+)+\s*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Delimiter,
    Thematic,
    Placeholder,
    Content,
}

fn classify(content: &str) -> LineKind {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed == "--" {
        LineKind::Delimiter
    } else if trimmed.len() >= 3 && trimmed.bytes().all(|b| b == b'-') {
        LineKind::Thematic
    } else if trimmed == PLACEHOLDER {
        LineKind::Placeholder
    } else {
        LineKind::Content
    }
}

/// One line of input: its content and the ending that followed it.
#[derive(Debug, Clone)]
struct Line<'a> {
    content: String,
    ending: &'a str,
}

impl<'a> Line<'a> {
    fn split(raw: &'a str) -> Self {
        let content = raw.trim_end_matches(['\r', '\n']);
        Self {
            content: repair_line(content),
            ending: &raw[content.len()..],
        }
    }

    const fn blank(ending: &'a str) -> Self {
        Self {
            content: String::new(),
            ending,
        }
    }

    fn kind(&self) -> LineKind {
        classify(&self.content)
    }

    fn is_blank(&self) -> bool {
        self.kind() == LineKind::Blank
    }
}

/// Normalises converted AsciiDoc text.
///
/// ```
/// use dmforge::document::cleanup;
///
/// let text = "Intro +\n%%PLUS%%\n----\nMore";
/// assert_eq!(cleanup(text), "Intro\n+\n\n---\n\nMore");
/// ```
#[must_use]
pub fn cleanup(text: &str) -> String {
    let lines: Vec<Line<'_>> = text.split_inclusive('\n').map(Line::split).collect();

    let mut out: Vec<Line<'_>> = Vec::with_capacity(lines.len());
    let mut index = 0;
    while index < lines.len() {
        let line = &lines[index];
        match line.kind() {
            LineKind::Delimiter => {
                let close = lines[index + 1..]
                    .iter()
                    .position(|line| line.kind() == LineKind::Delimiter)
                    .map(|offset| index + 1 + offset);
                let Some(close) = close else {
                    // An unclosed block is left as written.
                    out.extend_from_slice(&lines[index..]);
                    break;
                };
                out.push(line.clone());
                out.extend(tidy_block(&lines[index + 1..close]));
                out.push(lines[close].clone());
                index = close + 1;
            }
            LineKind::Thematic => {
                while out.last().is_some_and(Line::is_blank) {
                    out.pop();
                }
                let newline = if line.ending.is_empty() {
                    out.last().map_or("\n", |previous| previous.ending)
                } else {
                    line.ending
                };
                if !out.is_empty() {
                    out.push(Line::blank(newline));
                }
                out.push(Line {
                    content: THEMATIC_BREAK.to_string(),
                    ending: line.ending,
                });
                index += 1;
                while index < lines.len() && lines[index].is_blank() {
                    index += 1;
                }
                if index < lines.len() {
                    out.push(Line::blank(newline));
                }
            }
            _ => {
                out.push(line.clone());
                index += 1;
            }
        }
    }

    let mut text = String::with_capacity(text.len());
    for line in &out {
        text.push_str(&line.content);
        text.push_str(line.ending);
    }
    text
}

/// Applies the single-line repairs to a line's content.
fn repair_line(content: &str) -> String {
    if classify(content) == LineKind::Placeholder {
        return "+".to_string();
    }
    if let Some(caps) = TRAILING_CONTINUATION.captures(content) {
        let stripped = &caps[1];
        // Stripping must not turn content into a structural line.
        if classify(stripped) == LineKind::Content {
            return stripped.to_string();
        }
    }
    content.to_string()
}

/// Tidies the lines between a pair of `--` delimiters.
fn tidy_block<'a>(lines: &[Line<'a>]) -> Vec<Line<'a>> {
    let Some(first) = lines.iter().position(|line| !line.is_blank()) else {
        return Vec::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !line.is_blank())
        .unwrap_or(first);

    let mut out: Vec<Line<'a>> = Vec::with_capacity(last - first + 1);
    for line in &lines[first..=last] {
        if line.is_blank() {
            if out.last().is_some_and(|line| line.content.is_empty()) {
                continue;
            }
            out.push(Line::blank(line.ending));
        } else {
            out.push(line.clone());
        }
    }

    if let Some(line) = out.first_mut() {
        line.content = line.content.trim_start().to_string();
    }
    if let Some(line) = out.last_mut() {
        line.content = line.content.trim_end().to_string();
    }
    out
}
