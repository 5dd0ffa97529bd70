// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn splits_on_whitespace() {
    assert_eq!(tokenize("cargo test --release").unwrap(), vec!["cargo", "test", "--release"]);
}

#[test]
fn single_quotes_are_literal() {
    assert_eq!(tokenize(r#"echo 'a  b\c'"#).unwrap(), vec!["echo", r#"a  b\c"#]);
}

#[test]
fn double_quotes_process_escapes() {
    assert_eq!(tokenize(r#"echo "a \"b\" c""#).unwrap(), vec!["echo", r#"a "b" c"#]);
}

#[test]
fn unterminated_single_quote_is_an_error() {
    assert_eq!(tokenize("echo 'oops"), Err(TokenizeError::UnterminatedQuote("single")));
}

#[test]
fn unterminated_double_quote_is_an_error() {
    assert_eq!(tokenize(r#"echo "oops"#), Err(TokenizeError::UnterminatedQuote("double")));
}

#[test]
fn empty_command_is_an_error() {
    assert_eq!(tokenize("   "), Err(TokenizeError::Empty));
}

#[test]
fn adjacent_quoted_and_bare_segments_join_into_one_word() {
    assert_eq!(tokenize(r#"echo foo"bar baz"qux"#).unwrap(), vec!["echo", "foobar bazqux"]);
}
