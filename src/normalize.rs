//! Whitespace and line-break canonicalization for extracted text.
//!
//! The rules run in a fixed order; later rules assume the earlier ones ran:
//!
//! 1. runs of two or more horizontal whitespace characters become one space,
//! 2. runs of three or more newlines become exactly two,
//! 3. every line is trimmed and lines left empty are dropped,
//! 4. the whole result is trimmed.
//!
//! [`normalize`] is total and idempotent.

/// Canonicalize whitespace in `text`.
pub fn normalize(text: &str) -> String {
    let spaced = collapse_horizontal(text);
    let capped = cap_newlines(&spaced);

    let joined = capped
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    joined.trim().to_string()
}

fn is_horizontal(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}

fn collapse_horizontal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run: Option<char> = None;
    let mut run_len = 0usize;

    for c in text.chars() {
        if is_horizontal(c) {
            if run_len == 0 {
                run = Some(c);
            }
            run_len += 1;
            continue;
        }
        flush_run(&mut out, run.take(), run_len);
        run_len = 0;
        out.push(c);
    }
    flush_run(&mut out, run, run_len);
    out
}

fn flush_run(out: &mut String, first: Option<char>, len: usize) {
    match (first, len) {
        (Some(c), 1) => out.push(c),
        (Some(_), _) => out.push(' '),
        (None, _) => {}
    }
}

fn cap_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;

    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out
}
