use folio_engine::BlockRegistry;
use folio_engine::markdown::{canonicalize, parse};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn canonical(src: &str) -> String {
    canonicalize(&BlockRegistry::with_builtin(), src).unwrap_or_default()
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.md",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

/// The canonical form is a fixed point of parse + serialize.
fn assert_idempotent(src: &str) {
    let first = canonical(src);
    let second = canonical(&first);
    assert_eq!(second, first, "canonical form changed on the second pass");
}

#[rstest]
#[case::recipe("recipe")]
#[case::edge_cases("edge_cases")]
fn fixture_round_trip_is_idempotent(#[case] name: &str) {
    assert_idempotent(&fixture(name));
}

#[rstest]
#[case::heading("## Heading")]
#[case::setext_heading("Title\n=====")]
#[case::paragraph("Just a paragraph.")]
#[case::soft_break("one line\nnext line")]
#[case::hard_break("one line  \nnext line")]
#[case::strong("**bold**")]
#[case::emphasis("_em_")]
#[case::strikethrough("~~gone~~")]
#[case::nested_styles("**bold *and em* too**")]
#[case::codespan("use `Vec<T>` here")]
#[case::codespan_with_ticks("`` a`b ``")]
#[case::link("[text](https://example.com)")]
#[case::link_with_title("[text](https://example.com \"Title\")")]
#[case::image("![alt](/a.png \"Caption\")")]
#[case::bullet_list("* a\n* b\n* c")]
#[case::ordered_list("3. three\n4. four")]
#[case::nested_list("- a\n  - b\n    - c\n- d")]
#[case::loose_list("- a\n\n- b")]
#[case::multi_paragraph_item("1. first\n\n   more\n2. second")]
#[case::task_list("- [x] done\n- [ ] todo")]
#[case::code_fence("```rust\nfn main() {}\n```")]
#[case::indented_code("    indented code")]
#[case::empty_code_fence("```\n```")]
#[case::blockquote("> quoted\n> text")]
#[case::nested_blockquote("> outer\n>\n> > inner")]
#[case::table("| a | b |\n|---|:-:|\n| 1 | 2 |")]
#[case::rule("___")]
#[case::html_block("<details>\n<summary>More</summary>\n</details>")]
#[case::inline_html("a <kbd>Ctrl</kbd> key")]
#[case::escaped_marker("\\# not a heading")]
#[case::ordered_lookalike("2024\\. was a year")]
#[case::special_characters("a * b _ c [d] e | f ~ g")]
#[case::blocks_with_spacing("# A\n\n\n\ntext\n- list")]
fn round_trip_is_idempotent(#[case] src: &str) {
    assert_idempotent(src);
}

#[test]
fn mixed_document_canonical_form() {
    let src = "# Shopping\n\nBuy *fresh* bread and **good** cheese.\n\n- [x] bread\n- [ ] cheese\n";
    insta::assert_snapshot!(canonical(src), @r"
    # Shopping

    Buy *fresh* bread and **good** cheese.

    - [x] bread
    - [ ] cheese
    ");
}

#[test]
fn alternative_syntax_is_normalized() {
    let src = "Title\n=====\n\n* one\n* two\n\n1) a\n2) b\n";
    insta::assert_snapshot!(canonical(src), @r"
    # Title

    - one
    - two

    1. a
    2. b
    ");
}

#[test]
fn nested_list_canonical_form() {
    let src = "* fruit\n    * apple\n    * pear\n* bread";
    assert_eq!(canonical(src), "- fruit\n  - apple\n  - pear\n- bread");
}

#[test]
fn code_fence_grows_past_inner_fences() {
    let src = "````\n```\ninner\n```\n````";
    assert_eq!(canonical(src), src);
}

#[test]
fn literal_markup_is_escaped() {
    assert_eq!(canonical("a \\*b\\* c"), "a \\*b\\* c");
}

#[test]
fn empty_document_has_no_canonical_form() {
    assert_eq!(canonicalize(&BlockRegistry::with_builtin(), "\n\n"), None);
}

#[test]
fn parsed_records_match_block_kinds() {
    let record = parse("# A\n\n- b").unwrap();
    let kinds: Vec<&str> = record.children.iter().map(|c| c.kind.as_str()).collect();
    assert_eq!(record.kind, "item");
    assert_eq!(kinds, vec!["heading", "separator", "list"]);
}

#[test]
fn unknown_kinds_survive_load_and_save() {
    let registry = BlockRegistry::with_builtin();
    let mut record = parse("text").unwrap();
    record.kind = "chart".to_string();

    let block = registry.create(record.clone());

    assert_eq!(block.behavior_kind(), "unknown");
    assert_eq!(block.to_record(), record);
}
