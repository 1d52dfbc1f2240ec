//! # Parser
//!
//! Turns the token stream into a `Listing` (see `crate::cst`): one `Line`
//! per source line, each holding its tokens converted into well-typed
//! `Node`s. This stage never rejects a whole line for one bad token — a
//! token it cannot make sense of becomes `Node::Invalid` and parsing moves
//! on, so the analyzer still sees every line in the file.

#[cfg(test)]
mod tests;

use crate::cst::{Line, Listing, Node};
use crate::error::ErrorList;
use crate::lexer::token::TokenKind;
use crate::lexer::TokenStream;

/// Parse `source` into a `Listing`, accumulating lexical and syntactic
/// errors into a single `ErrorList` tagged `"Syntax"`.
pub fn parse(source: impl Into<String>, file_name: impl Into<String>) -> (Listing, ErrorList) {
    let file_name = file_name.into();
    let mut stream = TokenStream::new(source, file_name);
    let mut errors = ErrorList::new("Syntax");
    let mut listing = Listing::default();

    loop {
        while stream.peek(&mut errors).kind == TokenKind::Newline {
            stream.next(&mut errors);
        }
        if stream.peek(&mut errors).kind == TokenKind::Eof {
            break;
        }
        listing.lines.push(parse_line(&mut stream, &mut errors));
    }

    (listing, errors)
}

fn parse_line(stream: &mut TokenStream, errors: &mut ErrorList) -> Line {
    let location = stream.peek(errors).location.clone();
    let mut nodes = Vec::new();
    loop {
        let kind = stream.peek(errors).kind.clone();
        if matches!(kind, TokenKind::Newline | TokenKind::Eof) {
            break;
        }
        nodes.push(parse_node(stream, errors));
    }
    Line { nodes, location }
}

fn parse_node(stream: &mut TokenStream, errors: &mut ErrorList) -> Node {
    let token = stream.next(errors);
    match token.kind {
        TokenKind::Symbol => {
            if stream.peek(errors).kind == TokenKind::Colon {
                stream.next(errors);
                Node::Label {
                    name: token.lexeme,
                    location: token.location,
                }
            } else {
                Node::Symbol {
                    name: token.lexeme,
                    location: token.location,
                }
            }
        }
        TokenKind::Register => match parse_register(&token.lexeme) {
            Some(index) => Node::Register {
                index,
                location: token.location,
            },
            None => Node::Invalid {
                message: format!("malformed register operand: {:?}", token.lexeme),
                location: token.location,
            },
        },
        TokenKind::DecimalNumber => match parse_decimal(&token.lexeme) {
            Some(value) => Node::DecimalNumber {
                value,
                location: token.location,
            },
            None => Node::Invalid {
                message: format!("malformed decimal literal: {:?}", token.lexeme),
                location: token.location,
            },
        },
        TokenKind::HexNumber => match parse_hex(&token.lexeme) {
            Some(value) => Node::HexNumber {
                value,
                location: token.location,
            },
            None => Node::Invalid {
                message: format!("malformed hex literal: {:?}", token.lexeme),
                location: token.location,
            },
        },
        TokenKind::String => Node::Str {
            value: strip_quotes(&token.lexeme),
            location: token.location,
        },
        TokenKind::RightParen => {
            errors.push(token.location.clone(), "unmatched ')'");
            Node::Invalid {
                message: "unmatched ')'".into(),
                location: token.location,
            }
        }
        TokenKind::Colon => {
            errors.push(token.location.clone(), "unexpected ':' with no preceding label");
            Node::Invalid {
                message: "stray ':'".into(),
                location: token.location,
            }
        }
        TokenKind::LeftParen
        | TokenKind::Caret
        | TokenKind::SingleQuote
        | TokenKind::Char
        | TokenKind::Error => {
            let message = format!("unexpected token: {:?}", token.kind);
            errors.push(token.location.clone(), message.clone());
            Node::Invalid {
                message,
                location: token.location,
            }
        }
        TokenKind::Newline | TokenKind::Eof => {
            unreachable!("line boundaries are consumed by the caller")
        }
    }
}

fn parse_register(lexeme: &str) -> Option<u32> {
    lexeme.get(1..)?.parse().ok()
}

fn parse_decimal(lexeme: &str) -> Option<i32> {
    let stripped = lexeme.strip_prefix('#').unwrap_or(lexeme);
    stripped.parse().ok()
}

fn parse_hex(lexeme: &str) -> Option<u16> {
    let stripped = lexeme
        .strip_prefix("0x")
        .or_else(|| lexeme.strip_prefix("0X"))
        .or_else(|| lexeme.strip_prefix('x'))
        .or_else(|| lexeme.strip_prefix('X'))
        .unwrap_or(lexeme);
    i64::from_str_radix(stripped, 16)
        .ok()
        .map(|v| (v & 0xFFFF) as u16)
}

fn strip_quotes(lexeme: &str) -> String {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
        .to_string()
}
