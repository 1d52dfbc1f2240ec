//! # Scanner
//!
//! Converts source text into a stream of tokens from the closed
//! `TokenKind` alphabet (see `token.rs`). The scanner runs on a background
//! thread and hands tokens to the parser over a rendezvous channel —
//! `std::sync::mpsc::sync_channel(0)`. A synchronous pull-based cursor
//! would be equally correct; the channel costs nothing extra on top of
//! `std` and keeps scanning decoupled from the parser's pace.
//!
//! Lexical errors do not stop scanning: an `Error` event is reported
//! alongside the raw `Error` token and the scanner continues, so a single
//! pass can surface every lexical problem in a file instead of just the
//! first.

pub mod cursor;
pub mod token;

#[cfg(test)]
mod tests;

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread;

use crate::error::{ErrorList, Location};
use cursor::Cursor;
use token::{Token, TokenKind};

enum LexEvent {
    Token(Token),
    Error(Location, String),
}

/// A pull-based token stream with the two-token lookahead the parser
/// needs. Lexical errors surfacing while pulling tokens are appended to
/// the caller-supplied `ErrorList` as they arrive, preserving source
/// order between tokens and errors.
pub struct TokenStream {
    rx: Receiver<LexEvent>,
    lookahead: Vec<Token>,
    done: bool,
}

impl TokenStream {
    pub fn new(source: impl Into<String>, file_name: impl Into<String>) -> Self {
        let (tx, rx) = sync_channel(0);
        let source = source.into();
        let file_name = file_name.into();
        thread::spawn(move || run_scanner(&source, &file_name, &tx));
        Self {
            rx,
            lookahead: Vec::with_capacity(2),
            done: false,
        }
    }

    fn pull(&mut self, errors: &mut ErrorList) -> Token {
        loop {
            match self.rx.recv() {
                Ok(LexEvent::Token(t)) => return t,
                Ok(LexEvent::Error(loc, msg)) => errors.push(loc, msg),
                Err(_) => {
                    // Channel closed without a trailing EOF only if the
                    // scanner thread panicked; surface an EOF so the
                    // parser can still terminate cleanly.
                    self.done = true;
                    return Token {
                        kind: TokenKind::Eof,
                        lexeme: String::new(),
                        location: Location::new("", 0, 0),
                    };
                }
            }
        }
    }

    fn fill(&mut self, n: usize, errors: &mut ErrorList) {
        while self.lookahead.len() < n {
            let t = self.pull(errors);
            self.lookahead.push(t);
        }
    }

    pub fn peek(&mut self, errors: &mut ErrorList) -> &Token {
        self.fill(1, errors);
        &self.lookahead[0]
    }

    pub fn peek2(&mut self, errors: &mut ErrorList) -> &Token {
        self.fill(2, errors);
        &self.lookahead[1]
    }

    pub fn next(&mut self, errors: &mut ErrorList) -> Token {
        if self.lookahead.is_empty() {
            self.pull(errors)
        } else {
            self.lookahead.remove(0)
        }
    }
}

fn run_scanner(source: &str, file_name: &str, tx: &SyncSender<LexEvent>) {
    let mut cur = Cursor::new(source);
    let mut line = 1usize;

    while !cur.is_at_end() {
        match scan_one(&mut cur, &mut line, file_name) {
            Some(event) => {
                if tx.send(event).is_err() {
                    return;
                }
            }
            None => {}
        }
    }

    let _ = tx.send(LexEvent::Token(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        location: Location::new(file_name, line, cur.pos()),
    }));
}

fn loc(file_name: &str, line: usize, pos: usize) -> Location {
    Location::new(file_name, line, pos)
}

/// Scan exactly one token (or error) starting at the cursor's current
/// position, or return `None` after consuming pure whitespace/comment.
fn scan_one(cur: &mut Cursor, line: &mut usize, file_name: &str) -> Option<LexEvent> {
    while matches!(cur.peek(), Some(b' ') | Some(b'\t')) {
        cur.advance();
    }
    if cur.is_at_end() {
        return None;
    }

    let start = cur.pos();
    let start_line = *line;
    let ch = cur.peek().unwrap();

    match ch {
        b'\r' | b'\n' => {
            cur.advance();
            *line += 1;
            Some(tok(TokenKind::Newline, cur, start, start_line, file_name))
        }
        b';' => {
            while !matches!(cur.peek(), None | Some(b'\r') | Some(b'\n')) {
                cur.advance();
            }
            None
        }
        b'(' => {
            cur.advance();
            Some(tok(TokenKind::LeftParen, cur, start, start_line, file_name))
        }
        b')' => {
            cur.advance();
            Some(tok(TokenKind::RightParen, cur, start, start_line, file_name))
        }
        b'^' => {
            cur.advance();
            Some(tok(TokenKind::Caret, cur, start, start_line, file_name))
        }
        b'\'' => {
            cur.advance();
            Some(tok(TokenKind::SingleQuote, cur, start, start_line, file_name))
        }
        b':' => {
            cur.advance();
            Some(tok(TokenKind::Colon, cur, start, start_line, file_name))
        }
        b'\\' => Some(scan_char(cur, start, start_line, file_name)),
        b'"' => Some(scan_string(cur, start, start_line, file_name)),
        b'x' => Some(scan_hex(cur, start, start_line, file_name)),
        b'0' if cur.peek_at(1) == Some(b'x') => Some(scan_hex(cur, start, start_line, file_name)),
        b'0'..=b'9' | b'#' | b'+' | b'-' => Some(scan_decimal(cur, start, start_line, file_name)),
        b'r' | b'R' if is_ascii_digit(cur.peek_at(1)) => {
            Some(scan_register(cur, start, start_line, file_name))
        }
        c if is_symbolic(c) => Some(scan_symbol(cur, start, start_line, file_name)),
        _ => {
            cur.advance();
            Some(LexEvent::Error(
                loc(file_name, start_line, start),
                format!("unrecognized character: '{}'", ch as char),
            ))
        }
    }
}

fn tok(kind: TokenKind, cur: &Cursor, start: usize, start_line: usize, file_name: &str) -> LexEvent {
    LexEvent::Token(Token {
        kind,
        lexeme: cur.slice(start, cur.pos()).to_string(),
        location: loc(file_name, start_line, start),
    })
}

fn scan_string(cur: &mut Cursor, start: usize, start_line: usize, file_name: &str) -> LexEvent {
    cur.advance(); // opening quote
    loop {
        match cur.peek() {
            None => {
                return LexEvent::Error(
                    loc(file_name, start_line, start),
                    "unterminated string literal".into(),
                )
            }
            Some(b'"') => {
                cur.advance();
                return tok(TokenKind::String, cur, start, start_line, file_name);
            }
            Some(_) => {
                cur.advance();
            }
        }
    }
}

fn scan_char(cur: &mut Cursor, start: usize, start_line: usize, file_name: &str) -> LexEvent {
    cur.advance(); // backslash
    cur.advance(); // first character in the literal
    while matches!(cur.peek(), Some(c) if c.is_ascii_alphabetic()) {
        cur.advance();
    }
    tok(TokenKind::Char, cur, start, start_line, file_name)
}

fn scan_register(cur: &mut Cursor, start: usize, start_line: usize, file_name: &str) -> LexEvent {
    while matches!(cur.peek(), Some(c) if is_symbolic(c)) {
        cur.advance();
    }
    tok(TokenKind::Register, cur, start, start_line, file_name)
}

fn scan_symbol(cur: &mut Cursor, start: usize, start_line: usize, file_name: &str) -> LexEvent {
    while matches!(cur.peek(), Some(c) if is_symbolic(c)) {
        cur.advance();
    }
    tok(TokenKind::Symbol, cur, start, start_line, file_name)
}

fn scan_hex(cur: &mut Cursor, start: usize, start_line: usize, file_name: &str) -> LexEvent {
    if cur.peek() == Some(b'0') {
        cur.advance();
    }
    if cur.peek() == Some(b'x') || cur.peek() == Some(b'X') {
        cur.advance();
    }
    while matches!(cur.peek(), Some(c) if c.is_ascii_hexdigit()) {
        cur.advance();
    }
    finish_number(cur, start, start_line, file_name, TokenKind::HexNumber, "hex")
}

fn scan_decimal(cur: &mut Cursor, start: usize, start_line: usize, file_name: &str) -> LexEvent {
    if cur.peek() == Some(b'#') {
        cur.advance();
    }
    if matches!(cur.peek(), Some(b'+') | Some(b'-')) {
        cur.advance();
    }
    while matches!(cur.peek(), Some(c) if c.is_ascii_digit()) {
        cur.advance();
    }
    if cur.peek() == Some(b'.') {
        cur.advance();
        while matches!(cur.peek(), Some(c) if c.is_ascii_digit()) {
            cur.advance();
        }
    }
    if matches!(cur.peek(), Some(b'e') | Some(b'E')) {
        cur.advance();
        if matches!(cur.peek(), Some(b'+') | Some(b'-')) {
            cur.advance();
        }
        while matches!(cur.peek(), Some(c) if c.is_ascii_digit()) {
            cur.advance();
        }
    }
    if cur.peek() == Some(b'i') {
        cur.advance();
    }
    finish_number(
        cur,
        start,
        start_line,
        file_name,
        TokenKind::DecimalNumber,
        "decimal",
    )
}

fn finish_number(
    cur: &mut Cursor,
    start: usize,
    start_line: usize,
    file_name: &str,
    kind: TokenKind,
    what: &str,
) -> LexEvent {
    if matches!(cur.peek(), Some(c) if c.is_ascii_alphanumeric()) {
        cur.advance();
        LexEvent::Error(
            loc(file_name, start_line, start),
            format!(
                "bad {} number syntax: {:?}",
                what,
                cur.slice(start, cur.pos())
            ),
        )
    } else {
        tok(kind, cur, start, start_line, file_name)
    }
}

fn is_ascii_digit(b: Option<u8>) -> bool {
    matches!(b, Some(c) if c.is_ascii_digit())
}

fn is_symbolic(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'?' | b'+' | b'-' | b'*' | b'/' | b'=' | b'<' | b'>' | b'!' | b'&' | b'_' | b'.'
        )
}
