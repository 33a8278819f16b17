use std::sync::OnceLock;

use regex::Regex;

fn inline_specials() -> &'static Regex {
    static INLINE_SPECIALS: OnceLock<Regex> = OnceLock::new();
    INLINE_SPECIALS
        .get_or_init(|| Regex::new(r"[\\`*_\[\]<>|~]").expect("Invalid inline escape regex"))
}

fn block_start() -> &'static Regex {
    static BLOCK_START: OnceLock<Regex> = OnceLock::new();
    BLOCK_START.get_or_init(|| {
        Regex::new(r"^(\s*)(#|=+\s*$|-+\s*$|[-+]\s|\+$|(\d{1,9})([.)])(\s|$))")
            .expect("Invalid block start regex")
    })
}

/// Backslash-escape characters that would otherwise open inline markup.
pub fn escape_inline(text: &str) -> String {
    inline_specials().replace_all(text, r"\$0").into_owned()
}

/// Escape a leading marker that would turn a line of paragraph text into a
/// different block (heading, list item, setext underline).
pub fn escape_line_starts(text: &str) -> String {
    text.split('\n')
        .map(escape_line_start)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_line_start(line: &str) -> String {
    let Some(caps) = block_start().captures(line) else {
        return line.to_string();
    };
    let lead = caps.get(1).map_or("", |m| m.as_str());
    let rest = &line[lead.len()..];
    match (caps.get(3), caps.get(4)) {
        // `12. item` becomes `12\. item`
        (Some(digits), Some(_)) => format!("{lead}{}\\{}", digits.as_str(), &rest[digits.len()..]),
        _ => format!("{lead}\\{rest}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain text", "plain text")]
    #[case("a * b", r"a \* b")]
    #[case("snake_case", r"snake\_case")]
    #[case("[not a link]", r"\[not a link\]")]
    #[case("x | y", r"x \| y")]
    #[case(r"back\slash", r"back\\slash")]
    #[case("<div>", r"\<div\>")]
    fn escapes_inline_specials(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_inline(input), expected);
    }

    #[rstest]
    #[case("# not a heading", r"\# not a heading")]
    #[case("- not a bullet", r"\- not a bullet")]
    #[case("1. not ordered", r"1\. not ordered")]
    #[case("===", r"\===")]
    #[case("first\n+ second", "first\n\\+ second")]
    #[case("a - b", "a - b")]
    #[case("2024 was fine", "2024 was fine")]
    fn escapes_block_markers_at_line_start(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_line_starts(input), expected);
    }
}
