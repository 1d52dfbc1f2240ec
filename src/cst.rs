//! # Concrete syntax tree
//!
//! Preserves every surface token that carries meaning — comments and blank
//! lines are already dropped by the scanner — so that diagnostics further
//! down the pipeline can quote source-faithful text. Collapsing this and
//! the AST into one tree, as a first cut might be tempted to, loses that:
//! the AST only keeps semantic fields, the CST keeps lexical shape
//! (distinct decimal/hex literals, labels as their own node kind).

use crate::error::Location;

/// The concrete-syntax top-level container: a sequence of `Line`s, one per
/// source line.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub lines: Vec<Line>,
}

/// One source line's worth of CST nodes (its trailing `Newline` is not
/// included).
#[derive(Debug, Clone)]
pub struct Line {
    pub nodes: Vec<Node>,
    pub location: Location,
}

impl Line {
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A bare identifier, e.g. an opcode mnemonic, directive name, or a
    /// label reference.
    Symbol { name: String, location: Location },
    /// A defining occurrence of a label: a `Symbol` immediately followed by
    /// `:`.
    Label { name: String, location: Location },
    /// `R0`..`R7`. Out-of-range register text (e.g. `R9`) still reaches
    /// here as a `Register` node with its raw numeric suffix — range
    /// checking is a semantic concern, not a syntactic one.
    Register { index: u32, location: Location },
    DecimalNumber { value: i32, location: Location },
    HexNumber { value: u16, location: Location },
    Str { value: String, location: Location },
    /// Stands in for a token that could not be turned into a well-typed
    /// node, so later passes still see a well-formed tree.
    Invalid { message: String, location: Location },
}

impl Node {
    pub fn location(&self) -> &Location {
        match self {
            Node::Symbol { location, .. }
            | Node::Label { location, .. }
            | Node::Register { location, .. }
            | Node::DecimalNumber { location, .. }
            | Node::HexNumber { location, .. }
            | Node::Str { location, .. }
            | Node::Invalid { location, .. } => location,
        }
    }
}
