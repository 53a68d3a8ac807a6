//! Splitting a raw command line into tokens, and merging tokens back.

use thiserror::Error;

/// Errors that can occur while tokenizing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("malformed quoting in '{line}': missing closing quote")]
    MalformedQuoting { line: String },
}

/// Lexer state while scanning a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    /// Outside any quote: whitespace separates tokens.
    Normal,
    /// Inside `"..."`.
    DoubleQuote,
    /// Inside `'...'`.
    SingleQuote,
}

impl QuoteState {
    /// Characters a backslash escapes in this state. `None` means every character.
    fn escapable(self) -> Option<&'static [char]> {
        match self {
            QuoteState::Normal => None,
            QuoteState::DoubleQuote => Some(&['\\', '"']),
            QuoteState::SingleQuote => Some(&['\\']),
        }
    }

    fn escapes(self, c: char) -> bool {
        match self.escapable() {
            None => true,
            Some(set) => set.contains(&c),
        }
    }

    /// The state entered when `c` is read unescaped, if `c` is a quote in this state.
    fn transition(self, c: char) -> Option<QuoteState> {
        match (self, c) {
            (QuoteState::Normal, '"') => Some(QuoteState::DoubleQuote),
            (QuoteState::Normal, '\'') => Some(QuoteState::SingleQuote),
            (QuoteState::DoubleQuote, '"') => Some(QuoteState::Normal),
            (QuoteState::SingleQuote, '\'') => Some(QuoteState::Normal),
            _ => None,
        }
    }

    fn is_separator(self, c: char) -> bool {
        self == QuoteState::Normal && is_blank(c)
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Split a command line into tokens.
///
/// Spaces and tabs separate tokens outside quotes. Quotes may appear in the
/// middle of a token (`ab"cd ef"gh` is the single token `abcd efgh`) and an
/// empty pair of quotes yields an empty token. A backslash escapes any
/// character outside quotes, only `\` and `"` inside double quotes, and only
/// `\` inside single quotes. A trailing unpaired backslash is dropped.
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut in_token = false;
    let mut state = QuoteState::Normal;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                None => {}
                Some(&next) if state.escapes(next) => {
                    chars.next();
                    buf.push(next);
                    in_token = true;
                }
                Some(_) => {
                    buf.push(c);
                    in_token = true;
                }
            }
            continue;
        }

        if let Some(next_state) = state.transition(c) {
            state = next_state;
            in_token = true;
        } else if state.is_separator(c) {
            if in_token {
                tokens.push(std::mem::take(&mut buf));
                in_token = false;
            }
        } else {
            buf.push(c);
            in_token = true;
        }
    }

    if state != QuoteState::Normal {
        return Err(TokenizeError::MalformedQuoting {
            line: line.to_string(),
        });
    }

    if in_token {
        tokens.push(buf);
    }

    Ok(tokens)
}

/// Join tokens into a single command line.
///
/// Every embedded `"` is escaped as `\"`. Tokens containing a space or tab
/// are wrapped in double quotes, and an empty token is written as `""`.
pub fn merge<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut line = String::new();

    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        if i > 0 {
            line.push(' ');
        }
        let escaped = token.replace('"', "\\\"");
        if token.is_empty() || token.chars().any(is_blank) {
            line.push('"');
            line.push_str(&escaped);
            line.push('"');
        } else {
            line.push_str(&escaped);
        }
    }

    line
}
