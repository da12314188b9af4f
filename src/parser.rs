//! Token stream to syntax tree conversion.
//!
//! A single left-to-right scan keeps a stack of enclosing lists and the list
//! currently being filled. Closing brackets always close the innermost open
//! list. The scan is iterative, so nesting depth is limited only by memory.

use crate::ast::Node;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::{Error, MAX_EVAL_DEPTH, ParseError, ParseErrorKind};

/// Convert a non-bracket token into an atom node
fn atom(token: &Token<'_>) -> Node {
    match token.kind {
        TokenKind::Number => match token.text.parse() {
            Ok(n) => Node::Number(n),
            Err(_) => Node::Symbol(token.text.to_owned()),
        },
        TokenKind::Quoted => Node::Str(token.text.to_owned()),
        TokenKind::Symbol | TokenKind::Open | TokenKind::Close => {
            Node::Symbol(token.text.to_owned())
        }
    }
}

/// Parse a token sequence into the ordered sequence of top-level
/// expressions, allowing at most [`MAX_EVAL_DEPTH`] nested lists.
pub fn parse(tokens: &[Token<'_>]) -> Result<Vec<Node>, ParseError> {
    parse_with_max_depth(tokens, MAX_EVAL_DEPTH)
}

/// Same as [`parse`] with an explicit nesting limit. A list opened at
/// `max_depth` enclosing lists is a `TooDeeplyNested` error.
pub fn parse_with_max_depth(
    tokens: &[Token<'_>],
    max_depth: usize,
) -> Result<Vec<Node>, ParseError> {
    let mut expressions = Vec::new();
    let mut stack: Vec<Vec<Node>> = Vec::new();
    let mut current: Option<Vec<Node>> = None;

    for token in tokens {
        match token.kind {
            TokenKind::Open => {
                let depth = stack.len() + usize::from(current.is_some());
                if depth >= max_depth {
                    return Err(ParseError::new(
                        ParseErrorKind::TooDeeplyNested,
                        format!(
                            "Expression too deeply nested at offset {} (max depth: {max_depth})",
                            token.offset
                        ),
                        None,
                    ));
                }
                if let Some(open) = current.take() {
                    stack.push(open);
                }
                current = Some(Vec::new());
            }
            TokenKind::Close => {
                let Some(closed) = current.take() else {
                    return Err(ParseError::new(
                        ParseErrorKind::UnbalancedClose,
                        format!("Unexpected ')' at offset {}", token.offset),
                        Some(token.text.to_owned()),
                    ));
                };
                match stack.pop() {
                    Some(mut parent) => {
                        parent.push(Node::List(closed));
                        current = Some(parent);
                    }
                    None => expressions.push(Node::List(closed)),
                }
            }
            TokenKind::Number | TokenKind::Quoted | TokenKind::Symbol => match current.as_mut() {
                Some(open) => open.push(atom(token)),
                None => expressions.push(atom(token)),
            },
        }
    }

    if current.is_some() || !stack.is_empty() {
        let open = stack.len() + usize::from(current.is_some());
        return Err(ParseError::new(
            ParseErrorKind::UnterminatedList,
            format!("Missing ')': {open} list(s) still open at end of input"),
            None,
        ));
    }

    Ok(expressions)
}

/// Lex and parse source text with default lexer settings.
pub fn parse_str(input: &str) -> Result<Vec<Node>, Error> {
    let tokens = tokenize(input)?;
    Ok(parse(&tokens)?)
}
