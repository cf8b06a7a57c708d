//! Command-string tokenization
//!
//! FFmpeg commands arrive as a single free-form string of arguments
//! (the binary name itself is never part of it). This module splits that
//! string into an argument vector with shell-like quoting rules, and can
//! re-join a vector into an equivalent string.
//!
//! Normative rules: tokens are separated by unescaped whitespace, a double
//! quote toggles an in-quotes mode in which whitespace does not separate,
//! and a backslash escapes the following character literally. Quotes are
//! stripped from the produced tokens, but a quoted empty string (`""`)
//! still yields an empty token. Malformed input is tolerated: an
//! unterminated quote treats the remaining input as quoted.

/// Split a command string into an argument vector.
///
/// ```
/// use ffrunner::command::split_command;
///
/// let args = split_command(r#"-i "a b.mp4" -y out.mp4"#);
/// assert_eq!(args, vec!["-i", "a b.mp4", "-y", "out.mp4"]);
/// ```
pub fn split_command(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    // A quoted token is pushed even when empty, so `""` survives a round trip
    let mut saw_quotes = false;
    let mut escape_next = false;

    for ch in command.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
        } else if ch == '\\' {
            escape_next = true;
        } else if ch == '"' {
            in_quotes = !in_quotes;
            saw_quotes = true;
        } else if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || saw_quotes {
                args.push(std::mem::take(&mut current));
            }
            saw_quotes = false;
        } else {
            current.push(ch);
        }
    }

    // A trailing backslash escapes nothing and is dropped
    if !current.is_empty() || saw_quotes {
        args.push(current);
    }

    args
}

/// Join an argument vector back into a command string.
///
/// Inserts quoting and escaping such that `split_command(&join_command(args))`
/// reproduces `args` exactly.
pub fn join_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| quote_arg(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }

    let needs_quotes = arg.chars().any(|c| c.is_whitespace());
    let mut quoted = String::with_capacity(arg.len() + 2);

    if needs_quotes {
        quoted.push('"');
    }
    for ch in arg.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    if needs_quotes {
        quoted.push('"');
    }

    quoted
}
