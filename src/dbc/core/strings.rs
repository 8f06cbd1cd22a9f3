// String helpers shared by the parser, the header generator and the decode listing.
//
// Quoted DBC strings may contain escaped quotes (\") and span several lines,
// which happens mostly in CM_ comments.

// Count unescaped double quotes in a string.
// A quote is escaped if immediately preceded by an odd number of backslashes.
pub(crate) fn count_unescaped_quotes(s: &str) -> usize {
    let mut count: usize = 0;
    let mut backslashes: usize = 0;
    for ch in s.chars() {
        if ch == '\\' {
            backslashes += 1;
            continue;
        }
        if ch == '"' && backslashes % 2 == 0 {
            count += 1;
        }
        backslashes = 0;
    }
    count
}

// True while a quoted segment is still open, i.e. the text holds an odd number of
// unescaped quotes. A record without any quote is never open.
pub(crate) fn has_open_quoted_segment(s: &str) -> bool {
    count_unescaped_quotes(s) % 2 == 1
}

// Number rendering for headers and listings: integral values without a fraction,
// everything else in shortest round-trip form.
pub(crate) fn format_f64(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

// Escape text for a C string literal.
pub(crate) fn escape_c_string(input: &str) -> String {
    let mut escaped: String = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// Flatten text so it can sit inside a single-line /* ... */ comment.
pub(crate) fn c_comment_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .replace("*/", "* /")
}
