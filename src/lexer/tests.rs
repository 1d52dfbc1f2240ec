use super::*;
use crate::error::ErrorList;

fn scan_all(source: &str) -> (Vec<Token>, ErrorList) {
    let mut stream = TokenStream::new(source, "test.asm");
    let mut errors = ErrorList::new("Syntax");
    let mut tokens = Vec::new();
    loop {
        let t = stream.next(&mut errors);
        let is_eof = t.kind == TokenKind::Eof;
        tokens.push(t);
        if is_eof {
            break;
        }
    }
    (tokens, errors)
}

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind.clone()).collect()
}

#[test]
fn number_discrimination_distinguishes_decimal_from_hex() {
    // `5 -5 #5 #-5 xf0 0xf0` → Decimal, Decimal, Decimal, Decimal, Hex, Hex
    let (tokens, errors) = scan_all("5 -5 #5 #-5 xf0 0xf0");
    assert!(errors.is_empty(), "unexpected errors: {}", errors);
    let nums: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind.clone())
        .collect();
    assert_eq!(
        nums,
        vec![
            TokenKind::DecimalNumber,
            TokenKind::DecimalNumber,
            TokenKind::DecimalNumber,
            TokenKind::DecimalNumber,
            TokenKind::HexNumber,
            TokenKind::HexNumber,
        ]
    );
}

#[test]
fn register_vs_symbol_disambiguation() {
    // `ADD R2 R0 R1 ROUGH` → first four tokens Register, last one Symbol
    let (tokens, errors) = scan_all("ADD R2 R0 R1 ROUGH");
    assert!(errors.is_empty());
    let ks = kinds(&tokens);
    assert_eq!(
        ks,
        vec![
            TokenKind::Symbol, // ADD
            TokenKind::Register,
            TokenKind::Register,
            TokenKind::Register,
            TokenKind::Symbol, // ROUGH
            TokenKind::Eof,
        ]
    );
}

#[test]
fn newline_and_comment_handling() {
    let (tokens, errors) = scan_all("ADD ; a comment\nAND");
    assert!(errors.is_empty());
    let ks = kinds(&tokens);
    assert_eq!(
        ks,
        vec![
            TokenKind::Symbol,
            TokenKind::Newline,
            TokenKind::Symbol,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn string_literal_drops_nothing_at_lex_time() {
    let (tokens, errors) = scan_all("\"hello world\"");
    assert!(errors.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].lexeme, "\"hello world\"");
}

#[test]
fn unterminated_string_is_lexical_error() {
    let (_, errors) = scan_all("\"hello");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("unterminated string literal"));
}

#[test]
fn bad_number_syntax_is_recoverable() {
    let (tokens, errors) = scan_all("5x AND");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("bad decimal number syntax"));
    // scanning continues after the bad token
    let ks = kinds(&tokens);
    assert!(ks.contains(&TokenKind::Symbol));
}

#[test]
fn unrecognized_character_is_recoverable() {
    let (tokens, errors) = scan_all("AND @ OR");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("unrecognized character"));
    assert_eq!(kinds(&tokens).iter().filter(|k| **k == TokenKind::Symbol).count(), 2);
}

#[test]
fn colon_after_label_is_distinguished_from_stray_colon() {
    let (tokens, _) = scan_all("LOOP: ADD");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Symbol,
            TokenKind::Colon,
            TokenKind::Symbol,
            TokenKind::Eof
        ]
    );
}

#[test]
fn two_token_lookahead_does_not_consume() {
    let mut stream = TokenStream::new("ADD R0 R1", "test.asm");
    let mut errors = ErrorList::new("Syntax");
    let first = stream.peek(&mut errors).clone();
    let second = stream.peek2(&mut errors).clone();
    assert_eq!(first.kind, TokenKind::Symbol);
    assert_eq!(second.kind, TokenKind::Register);
    // next() still yields the same first token
    let popped = stream.next(&mut errors);
    assert_eq!(popped.kind, TokenKind::Symbol);
}
