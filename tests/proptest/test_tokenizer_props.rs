//! Property-based tests for command tokenization

use ffrunner::command::{join_command, split_command};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_split_never_panics(s in "\\PC*") {
        let _ = split_command(&s);
    }

    #[test]
    fn test_empty_tokens_only_come_from_quotes(s in "\\PC*") {
        // Only a quoted empty span may produce an empty token
        for token in split_command(&s) {
            if token.is_empty() {
                prop_assert!(s.contains('"'));
            }
        }
    }

    #[test]
    fn test_plain_words_split_on_whitespace(
        words in prop::collection::vec("[a-zA-Z0-9:=./_-]{1,16}", 1..10),
    ) {
        let command = words.join(" ");
        prop_assert_eq!(split_command(&command), words);
    }

    #[test]
    fn test_join_split_round_trip_simple_args(
        args in prop::collection::vec("[a-zA-Z0-9:=./_-]{1,16}", 0..10),
    ) {
        prop_assert_eq!(split_command(&join_command(&args)), args);
    }

    #[test]
    fn test_join_split_round_trip_args_with_spaces(
        args in prop::collection::vec("[a-zA-Z0-9]{1,6}( [a-zA-Z0-9]{1,6}){0,3}", 1..6),
    ) {
        // Arguments containing interior spaces survive the quote/split cycle
        prop_assert_eq!(split_command(&join_command(&args)), args);
    }

    #[test]
    fn test_join_split_round_trip_hostile_args(
        args in prop::collection::vec(r#"[a-z"\\ ]{1,12}"#, 1..6),
    ) {
        // Quotes and backslashes in arguments are escaped on join
        let args: Vec<String> = args
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| a.trim().to_string())
            .collect();
        prop_assert_eq!(split_command(&join_command(&args)), args);
    }

    #[test]
    fn test_token_count_bounded_by_separators(s in "[a-z ]{0,100}") {
        let tokens = split_command(&s);
        let words = s.split_whitespace().count();
        prop_assert_eq!(tokens.len(), words);
    }

    #[test]
    fn test_quoting_preserves_content(inner in "[a-z ]{1,20}") {
        let command = format!("-i \"{}\"", inner);
        let tokens = split_command(&command);
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[1].as_str(), inner.as_str());
    }
}
