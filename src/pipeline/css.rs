// src/pipeline/css.rs

//! Stylesheet minification.

/// Characters after which whitespace is never significant.
fn tight_after(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | ':' | ',' | '>' | '(')
}

/// Characters before which whitespace is never significant.
///
/// Not `:`, since `a :hover` and `a:hover` are different
/// selectors.
fn tight_before(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | ',' | '>' | ')')
}

/// Remove comments and collapsible whitespace, and the last `;` of each
/// block. Strings and `/*! ... */` banners are copied verbatim.
pub fn minify_css(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut pending_ws = false;
    let mut chars = src.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '/' && src[i..].starts_with("/*") {
            let end = src[i + 2..].find("*/").map_or(src.len(), |p| i + 2 + p + 2);
            if src[i..].starts_with("/*!") {
                out.push_str(&src[i..end]);
            } else {
                pending_ws = true;
            }
            while chars.peek().is_some_and(|&(j, _)| j < end) {
                chars.next();
            }
            continue;
        }

        if c.is_whitespace() {
            pending_ws = true;
            continue;
        }

        if pending_ws {
            if let Some(prev) = out.chars().last() {
                if !tight_after(prev) && !tight_before(c) {
                    out.push(' ');
                }
            }
            pending_ws = false;
        }

        if c == '}' && out.ends_with(';') {
            out.pop();
        }

        if c == '"' || c == '\'' {
            let mut end = src.len();
            let mut escaped = false;
            for (j, d) in src[i + 1..].char_indices() {
                if escaped {
                    escaped = false;
                } else if d == '\\' {
                    escaped = true;
                } else if d == c {
                    end = i + 1 + j + 1;
                    break;
                }
            }
            out.push_str(&src[i..end]);
            while chars.peek().is_some_and(|&(j, _)| j < end) {
                chars.next();
            }
            continue;
        }

        out.push(c);
    }

    out
}
