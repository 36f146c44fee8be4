use crate::parsers::text;

#[test]
fn test_normalize_whitespace() {
    assert_eq!(text::normalize_whitespace(""), "");
    assert_eq!(text::normalize_whitespace("   \n   \t   \r\n   "), "");
    assert_eq!(
        text::normalize_whitespace("  Line 1  \n\n  Line 2  \t\r\n  Line 3  "),
        "Line 1 Line 2 Line 3"
    );
    assert_eq!(
        text::normalize_whitespace("Hello    world!    This    is    a    test."),
        "Hello world! This is a test."
    );
}

#[test]
fn test_truncate_chars() {
    assert_eq!(text::truncate_chars("hello", 3), "hel");
    assert_eq!(text::truncate_chars("hello", 5), "hello");
    assert_eq!(text::truncate_chars("hello", 50), "hello");
    assert_eq!(text::truncate_chars("", 3), "");
}

#[test]
fn test_truncate_chars_multibyte() {
    let input = "héllo wörld";
    assert_eq!(text::truncate_chars(input, 2), "hé");
    assert_eq!(text::truncate_chars(input, 8).chars().count(), 8);

    let long = "ü".repeat(4000);
    let excerpt = text::truncate_chars(&long, 3000);
    assert_eq!(excerpt.chars().count(), 3000);
    assert_eq!(excerpt.len(), 6000);
}
