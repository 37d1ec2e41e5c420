// src/pipeline/js.rs

//! JavaScript transforms: debug-statement stripping and minification.
//!
//! Both work on a light segmentation of the source into code, literals
//! (strings, template literals, regular expressions) and comments. Nothing
//! inside a literal is ever rewritten.

use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use regex::Regex;

static DEBUG_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"\bconsole\s*\.\s*[A-Za-z_$][\w$]*\s*\(|\bwindow\s*\.\s*alert\s*\(|\balert\s*\(|\bdebugger\b",
    )
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Code,
    Literal,
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, Copy)]
struct Segment<'a> {
    kind: Kind,
    start: usize,
    text: &'a str,
}

/// Keywords after which a `/` starts a regular expression, not a division.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "case", "do", "else", "in", "of", "new", "delete", "void",
    "throw", "yield", "await",
];

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn scan_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    if quote == b'`' {
        return scan_template(bytes, start);
    }
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            c if c == quote => return j + 1,
            b'\n' => return j,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End of a template literal, including any `${ .. }` substitutions and the
/// templates nested inside them.
fn scan_template(bytes: &[u8], start: usize) -> usize {
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'`' => return j + 1,
            b'$' if bytes.get(j + 1) == Some(&b'{') => j = scan_substitution(bytes, j + 2),
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End of a `${ .. }` body starting at `start` (just past the `{`).
fn scan_substitution(bytes: &[u8], start: usize) -> usize {
    let mut depth = 1usize;
    let mut j = start;
    while j < bytes.len() {
        match bytes[j] {
            q @ (b'\'' | b'"' | b'`') => j = scan_quoted(bytes, j, q),
            b'{' => {
                depth += 1;
                j += 1;
            }
            b'}' => {
                depth -= 1;
                j += 1;
                if depth == 0 {
                    return j;
                }
            }
            _ => j += 1,
        }
    }
    bytes.len()
}

fn scan_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| start + p)
}

fn scan_block_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |p| start + 2 + p + 2)
}

/// End of a regex literal starting at `start`, or `None` if the line ends
/// before the closing slash (then it was a division after all).
fn scan_regex(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start + 1;
    let mut in_class = false;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => {
                j += 2;
                continue;
            }
            b'\n' => return None,
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => {
                j += 1;
                while j < bytes.len() && bytes[j].is_ascii_alphabetic() {
                    j += 1;
                }
                return Some(j);
            }
            _ => {}
        }
        j += 1;
    }
    None
}

/// Whether a `/` following `code` starts a regex literal.
fn regex_allowed_after(code: &str) -> Option<bool> {
    let trimmed = code.trim_end();
    let last = trimmed.bytes().last()?;
    if is_ident_byte(last) {
        let word_start = trimmed
            .bytes()
            .rposition(|b| !is_ident_byte(b))
            .map_or(0, |p| p + 1);
        return Some(REGEX_PREFIX_KEYWORDS.contains(&&trimmed[word_start..]));
    }
    Some(!matches!(last, b')' | b']'))
}

fn segments(src: &str) -> Vec<Segment<'_>> {
    let bytes = src.as_bytes();
    let mut out: Vec<Segment<'_>> = Vec::new();
    let mut code_start = 0;
    let mut i = 0;
    // Whether a regex may start after everything pushed to `out` so far.
    let mut regex_ok = true;

    while i < bytes.len() {
        let found = match bytes[i] {
            q @ (b'\'' | b'"' | b'`') => Some((Kind::Literal, scan_quoted(bytes, i, q))),
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                Some((Kind::LineComment, scan_line_comment(bytes, i)))
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                Some((Kind::BlockComment, scan_block_comment(bytes, i)))
            }
            b'/' if regex_allowed_after(&src[code_start..i]).unwrap_or(regex_ok) => {
                scan_regex(bytes, i).map(|end| (Kind::Literal, end))
            }
            _ => None,
        };

        match found {
            Some((kind, end)) => {
                if code_start < i {
                    let text = &src[code_start..i];
                    regex_ok = regex_allowed_after(text).unwrap_or(regex_ok);
                    out.push(Segment {
                        kind: Kind::Code,
                        start: code_start,
                        text,
                    });
                }
                if kind == Kind::Literal {
                    regex_ok = false;
                }
                out.push(Segment {
                    kind,
                    start: i,
                    text: &src[i..end],
                });
                i = end;
                code_start = end;
            }
            None => i += 1,
        }
    }

    if code_start < bytes.len() {
        out.push(Segment {
            kind: Kind::Code,
            start: code_start,
            text: &src[code_start..],
        });
    }
    out
}

fn code_mask(src: &str, segs: &[Segment<'_>]) -> Vec<bool> {
    let mut mask = vec![false; src.len()];
    for seg in segs.iter().filter(|s| s.kind == Kind::Code) {
        mask[seg.start..seg.start + seg.text.len()].fill(true);
    }
    mask
}

/// What precedes a position once whitespace and comments are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Literal,
    /// Index of a non-whitespace code byte.
    Code(usize),
}

/// Segment containing byte `pos`. Segments are sorted and contiguous.
fn segment_at<'s, 'a>(segs: &'s [Segment<'a>], pos: usize) -> Option<&'s Segment<'a>> {
    let idx = segs.partition_point(|s| s.start <= pos).checked_sub(1)?;
    segs.get(idx).filter(|s| pos < s.start + s.text.len())
}

fn previous_significant(src: &str, mask: &[bool], segs: &[Segment<'_>], pos: usize) -> Prev {
    let bytes = src.as_bytes();
    let mut j = pos;
    while j > 0 {
        j -= 1;
        if mask[j] {
            if !bytes[j].is_ascii_whitespace() {
                return Prev::Code(j);
            }
            continue;
        }
        match segment_at(segs, j) {
            Some(seg) if matches!(seg.kind, Kind::LineComment | Kind::BlockComment) => j = seg.start,
            _ => return Prev::Literal,
        }
    }
    Prev::Start
}

/// The identifier ending at code byte `end` (inclusive), if any.
fn word_ending_at<'a>(src: &'a str, mask: &[bool], end: usize) -> Option<&'a str> {
    let bytes = src.as_bytes();
    if !is_ident_byte(bytes[end]) {
        return None;
    }
    let mut begin = end;
    while begin > 0 && mask[begin - 1] && is_ident_byte(bytes[begin - 1]) {
        begin -= 1;
    }
    Some(&src[begin..=end])
}

/// First non-whitespace byte at or after `pos`.
fn next_significant(bytes: &[u8], pos: usize) -> Option<u8> {
    bytes[pos.min(bytes.len())..]
        .iter()
        .copied()
        .find(|b| !b.is_ascii_whitespace())
}

/// Modifiers that may precede a method name in a class body.
const METHOD_MODIFIERS: &[&str] = &["static", "async", "get", "set"];

/// Index just past the `)` matching the `(` at `open`, counting only code.
fn matching_paren(src: &str, mask: &[bool], open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    for (j, &b) in bytes.iter().enumerate().skip(open) {
        if !mask[j] {
            continue;
        }
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove `console.*(..)`, `alert(..)` and `debugger` statements.
///
/// A call at the start of a statement is dropped together with its `;`.
/// Anywhere else (e.g. the body of a brace-less `if`, or inside an
/// expression) it is replaced by `void 0` so the surrounding code keeps
/// its shape.
pub fn strip_debug(src: &str) -> Result<String> {
    let pattern = DEBUG_PATTERN
        .as_ref()
        .map_err(|e| anyhow!("compiling debug statement pattern: {e}"))?;

    let segs = segments(src);
    let mask = code_mask(src, &segs);
    let bytes = src.as_bytes();

    let mut edits: Vec<(usize, usize, &str)> = Vec::new();
    let mut covered_until = 0;

    for m in pattern.find_iter(src) {
        let start = m.start();
        if start < covered_until || !mask[start] {
            continue;
        }
        if src[..start].trim_end().ends_with('.') {
            continue;
        }
        // Part of a longer identifier such as `$debugger` or `debugger$`.
        if (start > 0 && bytes[start - 1] == b'$') || bytes.get(m.end()) == Some(&b'$') {
            continue;
        }

        let is_call = m.as_str().ends_with('(');
        let mut end = if is_call {
            match matching_paren(src, &mask, m.end() - 1) {
                Some(end) => end,
                None => continue,
            }
        } else {
            m.end()
        };

        let prev = previous_significant(src, &mask, &segs, start);
        let prev_word = match prev {
            Prev::Code(j) => word_ending_at(src, &mask, j),
            _ => None,
        };
        if prev_word == Some("function") {
            continue;
        }

        let statement_start = match prev {
            Prev::Start => true,
            Prev::Code(j) => matches!(bytes[j], b';' | b'{' | b'}'),
            Prev::Literal => false,
        };

        if is_call {
            // `alert(msg) { .. }` in a class body or object literal is a
            // method definition, not a call.
            let method_position = statement_start
                || matches!(prev, Prev::Code(j) if bytes[j] == b',')
                || prev_word.is_some_and(|w| METHOD_MODIFIERS.contains(&w));
            if method_position && next_significant(bytes, end) == Some(b'{') {
                continue;
            }
        } else if matches!(next_significant(bytes, end), Some(b'(' | b':' | b'=')) {
            // `debugger` used as a method or property name.
            continue;
        }

        let mut after = end;
        while after < bytes.len() && matches!(bytes[after], b' ' | b'\t') {
            after += 1;
        }
        let followed_by_semicolon = after < bytes.len() && bytes[after] == b';' && mask[after];

        if statement_start && followed_by_semicolon {
            end = after + 1;
            edits.push((start, end, ""));
        } else {
            edits.push((start, end, "void 0"));
        }
        covered_until = end;
    }

    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for (start, end, replacement) in edits {
        out.push_str(&src[last..start]);
        out.push_str(replacement);
        last = end;
    }
    out.push_str(&src[last..]);
    Ok(out)
}

/// Characters after which a line break can be dropped without changing how
/// statements are split.
fn joins_after(c: char) -> bool {
    matches!(c, '{' | ';' | ',' | '(' | '[' | ':' | '=' | '?' | '&' | '|' | '*' | '%' | '<' | '>' | '!' | '~' | '^')
}

/// Characters before which a line break can be dropped.
fn joins_before(c: char) -> bool {
    matches!(c, '}' | ')' | ']' | ',' | ';' | '.' | ':' | '?' | '&' | '|' | '=')
}

fn needs_space(prev: char, next: char) -> bool {
    (is_ident_char(prev) && is_ident_char(next))
        || (prev == next && matches!(prev, '+' | '-' | '/'))
}

struct Minifier {
    out: String,
    pending_ws: bool,
    pending_newline: bool,
}

impl Minifier {
    fn whitespace(&mut self, newline: bool) {
        self.pending_ws = true;
        self.pending_newline |= newline;
    }

    fn emit(&mut self, text: &str) {
        let Some(next) = text.chars().next() else {
            return;
        };
        if self.pending_ws {
            if let Some(prev) = self.out.chars().last() {
                if self.pending_newline && !joins_after(prev) && !joins_before(next) {
                    self.out.push('\n');
                } else if needs_space(prev, next) {
                    self.out.push(' ');
                }
            }
        }
        self.pending_ws = false;
        self.pending_newline = false;
        self.out.push_str(text);
    }
}

/// Remove comments and collapsible whitespace.
///
/// Line breaks are kept where automatic semicolon insertion might depend on
/// them. `/*! ... */` comments (licence banners) are preserved.
pub fn minify_js(src: &str) -> String {
    let mut m = Minifier {
        out: String::with_capacity(src.len()),
        pending_ws: false,
        pending_newline: false,
    };

    for seg in segments(src) {
        match seg.kind {
            Kind::Literal => m.emit(seg.text),
            Kind::LineComment => m.whitespace(true),
            Kind::BlockComment if seg.text.starts_with("/*!") => {
                m.emit(seg.text);
                m.whitespace(true);
            }
            Kind::BlockComment => m.whitespace(seg.text.contains('\n')),
            Kind::Code => {
                let mut buf = [0u8; 4];
                for c in seg.text.chars() {
                    if c.is_whitespace() {
                        m.whitespace(c == '\n');
                    } else {
                        m.emit(c.encode_utf8(&mut buf));
                    }
                }
            }
        }
    }

    m.out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_statement_level_debug_calls() {
        let src = "var a = 1;\nconsole.log(\"a;b\", fn(a));\nalert('x');\ndebugger;\nrun(a);\n";
        let out = strip_debug(src).unwrap();
        assert!(!out.contains("console"));
        assert!(!out.contains("alert"));
        assert!(!out.contains("debugger"));
        assert!(out.contains("var a = 1;"));
        assert!(out.contains("run(a);"));
    }

    #[test]
    fn keeps_shape_of_non_statement_calls() {
        let out = strip_debug("if (x) console.warn(x);\nvar y = console.log(1) || 2;").unwrap();
        assert_eq!(out, "if (x) void 0;\nvar y = void 0 || 2;");
    }

    #[test]
    fn leaves_strings_comments_and_members_alone() {
        let src = "var s = \"console.log(1)\"; // console.log(2)\nlogger.console.log(3);";
        assert_eq!(strip_debug(src).unwrap(), src);
    }

    #[test]
    fn keeps_declarations_named_like_debug_calls() {
        let src = "function alert(msg) { log(msg); }\nalert('x');\n";
        assert_eq!(
            strip_debug(src).unwrap(),
            "function alert(msg) { log(msg); }\n\n"
        );
    }

    #[test]
    fn keeps_methods_named_like_debug_calls() {
        let class = "class Notifier { alert(msg) { show(msg); } static alert(m) { show(m); } }";
        assert_eq!(strip_debug(class).unwrap(), class);

        let object = "var n = { size: 1, alert(msg) { show(msg); } };";
        assert_eq!(strip_debug(object).unwrap(), object);
    }

    #[test]
    fn keeps_identifiers_that_contain_debugger() {
        let src = "var $debugger = 1;\nvar debugger$ = $debugger;\nopts.debugger = true;";
        assert_eq!(strip_debug(src).unwrap(), src);
    }

    #[test]
    fn strips_calls_after_many_comments() {
        let mut src = String::new();
        for i in 0..2000 {
            src.push_str(&format!("/* note {i} */ // line {i}\n"));
        }
        src.push_str("console.log(1);\nrun();\n");

        let out = strip_debug(&src).unwrap();
        assert!(!out.contains("console"));
        assert!(out.ends_with("\nrun();\n"));
        assert_eq!(minify_js(&out), "run();");
    }

    #[test]
    fn nested_template_literals_stay_whole() {
        assert_eq!(minify_js("var s = `${`a  b`}`;"), "var s=`${`a  b`}`;");
        assert_eq!(
            minify_js("var t = `x ${ f({ k: `y  ${z}` }) }  w`;"),
            "var t=`x ${ f({ k: `y  ${z}` }) }  w`;"
        );
    }

    #[test]
    fn debug_calls_inside_templates_are_left_alone() {
        let src = "var s = `${`console.log(1)`}`;";
        assert_eq!(strip_debug(src).unwrap(), src);
    }

    #[test]
    fn minify_drops_comments_and_whitespace() {
        let src = "/* header */\nfunction add(a, b) {\n  // sum\n  return a + b;\n}\n";
        assert_eq!(minify_js(src), "function add(a,b){return a+b;}");
    }

    #[test]
    fn minify_keeps_line_breaks_needed_for_asi() {
        let src = "var a = 1\nvar b = a\nb++\nc()";
        assert_eq!(minify_js(src), "var a=1\nvar b=a\nb++\nc()");
    }

    #[test]
    fn minify_preserves_literals_and_separating_spaces() {
        let src = "var s = 'a  b', r = /a  b\\/c/g; x = y / z; k = i - -j; return typeof s;";
        assert_eq!(
            minify_js(src),
            "var s='a  b',r=/a  b\\/c/g;x=y/z;k=i- -j;return typeof s;"
        );
    }

    #[test]
    fn minify_keeps_licence_banners() {
        assert_eq!(minify_js("/*! MIT */\nvar a = 1;"), "/*! MIT */\nvar a=1;");
    }
}
