/// Returns `true` if the string consists only of (Unicode) whitespace.
pub fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Drops every blank line, keeping the line endings of the lines that remain.
pub fn remove_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if !is_blank(line) {
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        let cases = [
            ("", true),
            (" ", true),
            ("   ", true),
            ("\t", true),
            ("\t\n\u{000B}\u{000C}\r\u{0085}\u{00A0}", true),
            ("a", false),
            (" a ", false),
            ("a ", false),
            (" a", false),
            ("日本語", false),
        ];
        for (input, expected) in cases {
            assert_eq!(is_blank(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_remove_blank_lines() {
        let cases = [
            ("", ""),
            ("\r\n\r\n", ""),
            ("line1\nline2", "line1\nline2"),
            ("line1\n\nline2", "line1\nline2"),
            ("\n\n\n\nline1\n\nline2", "line1\nline2"),
            ("\n\n\n\n\n  \n \n \n", ""),
            ("line1\r\nline2", "line1\r\nline2"),
            ("line1\r\n\r\nline2", "line1\r\nline2"),
            ("line1\n", "line1\n"),
            ("line1\r\n", "line1\r\n"),
        ];
        for (input, expected) in cases {
            assert_eq!(remove_blank_lines(input), expected, "input: {input:?}");
        }
    }
}
