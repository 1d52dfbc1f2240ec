use super::parse;
use crate::cst::Node;

#[test]
fn label_followed_by_instruction() {
    let (listing, errors) = parse("LOOP: ADD R0 R1 R2", "t.asm");
    assert!(errors.is_empty(), "{}", errors);
    assert_eq!(listing.lines.len(), 1);
    let nodes = &listing.lines[0].nodes;
    assert!(matches!(&nodes[0], Node::Label { name, .. } if name == "LOOP"));
    assert!(matches!(&nodes[1], Node::Symbol { name, .. } if name == "ADD"));
    assert!(matches!(nodes[2], Node::Register { index: 0, .. }));
    assert!(matches!(nodes[3], Node::Register { index: 1, .. }));
    assert!(matches!(nodes[4], Node::Register { index: 2, .. }));
}

#[test]
fn blank_and_comment_only_lines_are_skipped() {
    let (listing, errors) = parse("\n; just a comment\n\nADD R0 R1 R2\n", "t.asm");
    assert!(errors.is_empty());
    assert_eq!(listing.lines.len(), 1);
}

#[test]
fn decimal_literal_variants_parse_to_matching_values() {
    let (listing, errors) = parse("5 -5 #5 #-5", "t.asm");
    assert!(errors.is_empty());
    let nodes = &listing.lines[0].nodes;
    for n in nodes {
        assert!(matches!(n, Node::DecimalNumber { value: 5, .. } | Node::DecimalNumber { value: -5, .. }));
    }
}

#[test]
fn hex_literal_variants_parse_to_the_same_value() {
    let (listing, errors) = parse("xf0 0xf0", "t.asm");
    assert!(errors.is_empty());
    let nodes = &listing.lines[0].nodes;
    assert!(matches!(nodes[0], Node::HexNumber { value: 0xf0, .. }));
    assert!(matches!(nodes[1], Node::HexNumber { value: 0xf0, .. }));
}

#[test]
fn string_literal_has_its_quotes_stripped() {
    let (listing, errors) = parse("\"hi there\"", "t.asm");
    assert!(errors.is_empty());
    assert!(matches!(&listing.lines[0].nodes[0], Node::Str { value, .. } if value == "hi there"));
}

#[test]
fn unmatched_right_paren_is_reported_and_kept_as_invalid() {
    let (listing, errors) = parse(")", "t.asm");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("unmatched ')'"));
    assert!(matches!(listing.lines[0].nodes[0], Node::Invalid { .. }));
}

#[test]
fn stray_colon_is_reported_and_kept_as_invalid() {
    let (listing, errors) = parse(": ADD", "t.asm");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("stray ':'") || errors.to_string().contains("no preceding label"));
}

#[test]
fn multiple_lines_each_become_their_own_listing_line() {
    let (listing, errors) = parse("ADD R0 R1 R2\nAND R0 R1 R2\n", "t.asm");
    assert!(errors.is_empty());
    assert_eq!(listing.lines.len(), 2);
}
