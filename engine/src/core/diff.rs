//! Line-resynchronizing character diff.
//!
//! The report is a rendering of the *expected* text with the divergent part of
//! each line highlighted. Whenever either side reaches a newline the other side
//! skips ahead to its own next newline, so one early mismatch stays confined to
//! its line instead of shifting every following comparison.

use crate::core::style::{HIGHLIGHT, RESET};

/// Glyph shown in place of a non-printable character inside a highlighted region.
pub fn glyph(ch: char) -> &'static str {
    match ch {
        '\t' => "→",
        '\n' => "↵",
        '\r' => "↩",
        '\u{8}' => "←",
        '\u{b}' => "↓",
        '\u{7}' => "🕭",
        '\0' => "␀",
        '\u{1b}' => "␛",
        _ => "•",
    }
}

fn is_printable(ch: char) -> bool {
    !ch.is_control()
}

/// Append an expected character to the report.
///
/// Inside a highlighted region non-printable characters become glyphs; a
/// newline keeps its line break after the glyph.
fn push_expected(out: &mut String, ch: char, highlighted: bool) {
    if highlighted && !is_printable(ch) {
        out.push_str(glyph(ch));
        if ch == '\n' {
            out.push('\n');
        }
        return;
    }
    out.push(ch);
}

/// Compare `actual` against `expected`, returning a highlighted rendering of
/// `expected`, or an empty string when the two are identical.
pub fn compare_diff(actual: &str, expected: &str) -> String {
    let actual: Vec<char> = actual.chars().collect();
    let expected: Vec<char> = expected.chars().collect();
    let (len1, len2) = (actual.len(), expected.len());
    let (mut i1, mut i2) = (0usize, 0usize);
    let mut error_on_line = false;
    let mut diverged = false;
    let mut out = String::new();

    while i1 < len1 && i2 < len2 {
        if actual[i1] != expected[i2] && !error_on_line {
            error_on_line = true;
            diverged = true;
            out.push_str(HIGHLIGHT);
        }
        push_expected(&mut out, expected[i2], error_on_line);

        if actual[i1] == '\n' {
            // Actual line ended: copy the rest of the expected line.
            while i2 < len2 && expected[i2] != '\n' {
                i2 += 1;
                if i2 < len2 {
                    push_expected(&mut out, expected[i2], error_on_line);
                }
            }
            error_on_line = false;
            out.push_str(RESET);
        } else if expected[i2] == '\n' {
            // Expected line ended: drop the rest of the actual line.
            while i1 < len1 && actual[i1] != '\n' {
                i1 += 1;
            }
            error_on_line = false;
            out.push_str(RESET);
        }

        if i1 < len1 {
            i1 += 1;
        }
        if i2 < len2 {
            i2 += 1;
        }
    }

    if i2 < len2 {
        out.push_str(HIGHLIGHT);
        out.push_str(&format!("...[{} more chars]", len2 - i2));
        diverged = true;
    } else if i1 < len1 {
        out.push_str(HIGHLIGHT);
        out.push_str(&format!("...[{} unexpected chars]", len1 - i1));
        diverged = true;
    }

    if !diverged {
        return String::new();
    }
    if !out.ends_with(RESET) {
        out.push_str(RESET);
    }
    out
}
