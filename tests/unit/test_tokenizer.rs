//! Unit tests for command-string tokenization

use ffrunner::command::{join_command, split_command};

#[cfg(test)]
mod tokenizer_tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_arguments() {
        assert_eq!(
            split_command("-i input.mp4 -c:v libx264 output.mp4"),
            args(&["-i", "input.mp4", "-c:v", "libx264", "output.mp4"])
        );
    }

    #[test]
    fn test_double_quoted_path_with_spaces() {
        assert_eq!(
            split_command(r#"-i "My Videos/clip 1.mp4" out.mp4"#),
            args(&["-i", "My Videos/clip 1.mp4", "out.mp4"])
        );
    }

    #[test]
    fn test_quotes_adjacent_to_text() {
        // Quotes toggle mid-token without separating
        assert_eq!(
            split_command(r#"-vf scale="640:480""#),
            args(&["-vf", "scale=640:480"])
        );
    }

    #[test]
    fn test_escaped_space_outside_quotes() {
        assert_eq!(split_command(r"a\ b c"), args(&["a b", "c"]));
    }

    #[test]
    fn test_escaped_quote_is_literal() {
        assert_eq!(split_command(r#"title=\"x\""#), args(&[r#"title="x""#]));
    }

    #[test]
    fn test_whitespace_variants() {
        assert_eq!(split_command("a \t b\n c"), args(&["a", "b", "c"]));
        assert!(split_command("").is_empty());
        assert!(split_command(" \t\n").is_empty());
    }

    #[test]
    fn test_unterminated_quote_takes_rest_of_line() {
        assert_eq!(
            split_command(r#"-metadata "title=unfinished"#),
            args(&["-metadata", "title=unfinished"])
        );
    }

    #[test]
    fn test_trailing_backslash_dropped() {
        assert_eq!(split_command(r"abc\"), args(&["abc"]));
    }

    #[test]
    fn test_quoted_empty_string_is_a_token() {
        // Quote stripping keeps an empty quoted span as an empty token
        assert_eq!(split_command(r#"a "" b"#), args(&["a", "", "b"]));
        assert_eq!(split_command(&join_command(&args(&["", "x"]))), args(&["", "x"]));
    }

    #[test]
    fn test_join_quotes_whitespace_arguments() {
        let original = args(&["-i", "a b.mp4", "-y", "out.mp4"]);
        let joined = join_command(&original);
        assert_eq!(joined, r#"-i "a b.mp4" -y out.mp4"#);
        assert_eq!(split_command(&joined), original);
    }

    #[test]
    fn test_join_escapes_quotes_and_backslashes() {
        let original = args(&[r#"say "hi""#, r"back\slash"]);
        assert_eq!(split_command(&join_command(&original)), original);
    }

    #[test]
    fn test_realistic_transcode_command_round_trips() {
        let original = args(&[
            "-y",
            "-i",
            "/videos/input file.mov",
            "-c:v",
            "libx265",
            "-preset",
            "medium",
            "-crf",
            "28",
            "-metadata",
            "comment=two words",
            "/videos/out.mp4",
        ]);
        assert_eq!(split_command(&join_command(&original)), original);
    }
}
