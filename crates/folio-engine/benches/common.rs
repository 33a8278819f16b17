// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with *some* **content** and `code`.\n\n- Bullet point\n  - Nested item\n- [x] Done item\n\n> Quoted [link](https://example.com)\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_article(sections: usize) -> String {
    let mut content = String::new();

    for section in 0..sections {
        content.push_str(&format!("## Section {section}\n\n"));
        content.push_str("Some paragraph content with multiple sentences. It has _emphasis_ too.\n\n");
        for i in 0..3 {
            content.push_str(&format!("{}. Step {i} of section {section}\n", i + 1));
        }
        content.push('\n');
    }

    content
}
