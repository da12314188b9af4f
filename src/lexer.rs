//! Character scanner turning source text into classified tokens.
//!
//! The scanner has three states: outside any string, inside a
//! double-quoted string and inside a single-quoted string. Parentheses are
//! always tokens of their own, whitespace separates atoms, and a quoted
//! string stays a single token (quotes included) even when it contains
//! whitespace or parentheses. Each token borrows its text from the input.

use nom::{
    IResult, Parser,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, opt, recognize},
    sequence::pair,
};

use crate::{LexError, LexErrorKind};

/// Lexer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexConfig {
    /// Emit a string that is still open at end of input as an ordinary
    /// atom instead of failing with `UnterminatedString`
    pub allow_unterminated_strings: bool,
}

/// Token classification, decided when the token is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Open,
    Close,
    Number,
    Quoted,
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token in the input
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InDoubleQuote,
    InSingleQuote,
}

/// Numeral grammar: optional sign, digits, optional fractional part
fn numeral(input: &str) -> IResult<&str, &str> {
    recognize((opt(one_of("+-")), digit1, opt(pair(char('.'), digit1)))).parse(input)
}

pub(crate) fn is_numeral(text: &str) -> bool {
    all_consuming(numeral).parse(text).is_ok()
}

fn is_quoted(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first @ ('"' | '\'')), Some(last)) => first == last,
        _ => false,
    }
}

fn classify(text: &str) -> TokenKind {
    if is_quoted(text) {
        TokenKind::Quoted
    } else if is_numeral(text) {
        TokenKind::Number
    } else {
        TokenKind::Symbol
    }
}

/// Tokenize with default settings (unterminated strings are rejected).
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    tokenize_with_config(input, LexConfig::default())
}

pub fn tokenize_with_config<'a>(
    input: &'a str,
    config: LexConfig,
) -> Result<Vec<Token<'a>>, LexError> {
    let mut tokens = Vec::new();
    let mut state = ScanState::Normal;
    // Start offset of the pending atom. Atoms are contiguous in the input,
    // so the pending text is always `input[start..current]`.
    let mut pending: Option<usize> = None;

    let flush = |tokens: &mut Vec<Token<'a>>, pending: &mut Option<usize>, end: usize| {
        if let Some(start) = pending.take() {
            let text = &input[start..end];
            tokens.push(Token {
                kind: classify(text),
                text,
                offset: start,
            });
        }
    };

    for (index, ch) in input.char_indices() {
        match state {
            ScanState::Normal => match ch {
                '(' | ')' => {
                    flush(&mut tokens, &mut pending, index);
                    tokens.push(Token {
                        kind: if ch == '(' {
                            TokenKind::Open
                        } else {
                            TokenKind::Close
                        },
                        text: &input[index..index + 1],
                        offset: index,
                    });
                }
                c if c.is_whitespace() => flush(&mut tokens, &mut pending, index),
                '"' | '\'' => {
                    state = if ch == '"' {
                        ScanState::InDoubleQuote
                    } else {
                        ScanState::InSingleQuote
                    };
                    pending.get_or_insert(index);
                }
                _ => {
                    pending.get_or_insert(index);
                }
            },
            ScanState::InDoubleQuote | ScanState::InSingleQuote => {
                let closing = if state == ScanState::InDoubleQuote {
                    '"'
                } else {
                    '\''
                };
                let start = *pending.get_or_insert(index);
                if ch == closing && !input[start..index].ends_with('\\') {
                    let end = index + ch.len_utf8();
                    flush(&mut tokens, &mut pending, end);
                    state = ScanState::Normal;
                }
            }
        }
    }

    if state != ScanState::Normal && !config.allow_unterminated_strings {
        let start = pending.unwrap_or(input.len());
        return Err(LexError::with_context(
            LexErrorKind::UnterminatedString,
            "Unterminated string",
            input,
            start,
        ));
    }
    flush(&mut tokens, &mut pending, input.len());

    log::trace!("tokenized {} bytes into {} tokens", input.len(), tokens.len());
    Ok(tokens)
}
