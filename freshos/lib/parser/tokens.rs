//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where the tokenizer is within the current `key[=value]` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Collecting the key.
    Key,

    /// A key ended with whitespace; an `=` may still follow.
    AfterKey,

    /// Saw `=`, waiting for the first character of the value.
    ValueStart,

    /// Collecting the value, until whitespace (`None`) or the closing quote.
    Value(Option<char>),
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

/// Splits text into `(key, value)` pairs.
///
/// Tokens are separated by blanks. A bare word yields `(word, "")`. A value is either
/// unquoted and runs to the next blank, or single/double quoted and runs to the matching
/// quote; nothing is escaped inside quotes. `key = value` with blanks around `=` is accepted.
///
/// The parser never fails: input that ends inside a token (including an unterminated quote)
/// still emits that token with whatever was collected. Tokens without a key, such as a lone
/// `=` or `=value`, are dropped.
///
/// ```
/// use freshos::parser::parse_tokens;
///
/// let tokens = parse_tokens(r#"quiet fresh_os=1234/live label="My Disk""#);
/// assert_eq!(tokens[0], ("quiet".to_string(), String::new()));
/// assert_eq!(tokens[1], ("fresh_os".to_string(), "1234/live".to_string()));
/// assert_eq!(tokens[2], ("label".to_string(), "My Disk".to_string()));
/// ```
pub fn parse_tokens(data: &str) -> Vec<(String, String)> {
    let mut result = Vec::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut state = State::Key;

    for c in data.chars() {
        match state {
            State::Key => {
                if is_separator(c) {
                    if !key.is_empty() {
                        state = State::AfterKey;
                    }
                } else if c == '=' {
                    state = State::ValueStart;
                } else {
                    key.push(c);
                }
            }
            State::AfterKey => {
                if c == '=' {
                    state = State::ValueStart;
                } else if !is_separator(c) {
                    result.push((std::mem::take(&mut key), String::new()));
                    key.push(c);
                    state = State::Key;
                }
            }
            State::ValueStart => {
                if c == '\'' || c == '"' {
                    state = State::Value(Some(c));
                } else if !is_separator(c) {
                    value.push(c);
                    state = State::Value(None);
                }
            }
            State::Value(None) => {
                if is_separator(c) {
                    result.push((std::mem::take(&mut key), std::mem::take(&mut value)));
                    state = State::Key;
                } else {
                    value.push(c);
                }
            }
            State::Value(Some(quote)) => {
                if c == quote {
                    result.push((std::mem::take(&mut key), std::mem::take(&mut value)));
                    state = State::Key;
                } else {
                    value.push(c);
                }
            }
        }
    }

    match state {
        State::Key | State::AfterKey => {
            if !key.is_empty() {
                result.push((key, String::new()));
            }
        }
        State::ValueStart => result.push((key, String::new())),
        State::Value(_) => result.push((key, value)),
    }

    result.retain(|(key, _)| !key.is_empty());
    result
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
