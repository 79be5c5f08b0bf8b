// tests/print_prefix.rs

use proptest::prelude::*;
use shelltask::output::{render_print_chunk, MemorySink, OutputOption};

fn render_all(chunks: &[&str], prefix: Option<&str>) -> String {
    let mut out = String::new();
    let mut received = false;
    for chunk in chunks {
        if let Some(text) = render_print_chunk(chunk.as_bytes(), prefix, !received) {
            out.push_str(&text);
        }
        if !chunk.is_empty() {
            received = true;
        }
    }
    out
}

#[test]
fn prefix_tags_every_line_across_chunks() {
    let out = render_all(&["line1\n", "line2\nline3", ""], Some("[x]"));
    assert_eq!(out, "[x] line1\n[x] line2\n[x] line3\n");
}

#[test]
fn no_prefix_is_verbatim_with_newline_on_eof() {
    let out = render_all(&["line1\n", "line2\nline3", ""], None);
    assert_eq!(out, "line1\nline2\nline3\n");
}

#[test]
fn eof_chunk_renders_a_single_newline() {
    assert_eq!(render_print_chunk(b"", Some("[x]"), true).as_deref(), Some("\n"));
    assert_eq!(render_print_chunk(b"", None, false).as_deref(), Some("\n"));
}

#[test]
fn only_the_first_chunk_gets_a_leading_prefix() {
    assert_eq!(
        render_print_chunk(b"abc", Some("P"), true).as_deref(),
        Some("P abc")
    );
    assert_eq!(render_print_chunk(b"abc", Some("P"), false).as_deref(), Some("abc"));
}

#[test]
fn trailing_newline_leaves_a_dangling_prefix() {
    let out = render_all(&["done\n", ""], Some(">"));
    assert_eq!(out, "> done\n> \n");
}

#[test]
fn invalid_utf8_is_dropped() {
    assert_eq!(render_print_chunk(&[0xff, 0xfe, b'\n'], Some("[x]"), true), None);
    assert_eq!(render_print_chunk(&[0xc3], None, false), None);
}

#[test]
fn print_option_writes_to_the_sink_and_handle_sees_raw_bytes() {
    let sink = MemorySink::new();
    let print = OutputOption::print(Some("[err]".to_string()));
    print.process(b"boom\n", true, &sink);
    print.process(b"", false, &sink);
    assert_eq!(sink.contents(), "[err] boom\n[err] \n");

    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorder = std::sync::Arc::clone(&seen);
    let handle = OutputOption::handle(move |chunk| recorder.lock().unwrap().push(chunk.to_vec()));
    handle.process(&[0xff, 0x00], true, &sink);
    handle.process(b"", false, &sink);
    assert_eq!(*seen.lock().unwrap(), vec![vec![0xff, 0x00], Vec::new()]);
    // Handle options never write to the text sink.
    assert_eq!(sink.contents(), "[err] boom\n[err] \n");
}

proptest! {
    #[test]
    fn unprefixed_output_is_the_concatenation(chunks in proptest::collection::vec("[a-z\n ]{1,16}", 0..8)) {
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let mut with_eof = refs.clone();
        with_eof.push("");

        let expected = format!("{}\n", chunks.concat());
        prop_assert_eq!(render_all(&with_eof, None), expected);
    }

    #[test]
    fn prefixed_output_does_not_depend_on_chunking(
        chunks in proptest::collection::vec("[a-z\n]{1,16}", 1..8),
        prefix in "[A-Z\\[\\]]{1,4}",
    ) {
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let tag = format!("{prefix} ");
        let expected = format!("{tag}{}", chunks.concat()).replace('\n', &format!("\n{tag}"));

        prop_assert_eq!(render_all(&refs, Some(prefix.as_str())), expected);
    }
}
