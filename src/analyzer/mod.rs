//! # Analyzer
//!
//! Turns a `Listing` (CST) into a `Program` (AST): collects labels into a
//! symbol table as it assigns each line an address, and validates each
//! instruction's operands against its mnemonic's shape.

#[cfg(test)]
mod tests;

use crate::ast::{AddrMode, BranchFlags, FillValue, Program, Statement, SymbolTable};
use crate::cst::{Line, Listing, Node};
use crate::error::{ErrorList, Location};
use crate::isa;

pub fn analyze(listing: &Listing, errors: &mut ErrorList) -> Program {
    let mut analyzer = Analyzer {
        errors,
        symbol_table: SymbolTable::new(),
        origin: isa::DEFAULT_ORIGIN,
    };
    let statements = analyzer.analyze_lines(listing);
    Program {
        origin: analyzer.origin,
        statements,
        symbol_table: analyzer.symbol_table,
    }
}

struct Analyzer<'a> {
    errors: &'a mut ErrorList,
    symbol_table: SymbolTable,
    origin: u16,
}

impl<'a> Analyzer<'a> {
    fn analyze_lines(&mut self, listing: &Listing) -> Vec<Statement> {
        let mut statements = Vec::new();
        let mut line_index: u16 = 0;
        for line in &listing.lines {
            let (statement, size) = self.analyze_line(line_index, line);
            if let Some(statement) = statement {
                statements.push(statement);
            }
            line_index = line_index.wrapping_add(size);
        }
        statements
    }

    fn analyze_line(&mut self, line_index: u16, line: &Line) -> (Option<Statement>, u16) {
        let mut nodes = line.nodes.as_slice();
        if nodes.is_empty() {
            return (None, 0);
        }

        if let Node::Label { name, location } = &nodes[0] {
            let address = self.origin.wrapping_add(line_index);
            if self.symbol_table.insert(name.clone(), address).is_err() {
                // Trailing ':' quotes the label's defining-occurrence surface form.
                self.errors
                    .push(location.clone(), format!("label redefined: {}:", name));
            }
            nodes = &nodes[1..];
            if nodes.is_empty() {
                return (None, 0);
            }
        }

        let location = nodes[0].location().clone();
        let name = match &nodes[0] {
            Node::Symbol { name, .. } => name.clone(),
            other => {
                self.errors.push(
                    location.clone(),
                    format!("unrecognized statement syntax: {:?}", other),
                );
                return (
                    Some(Statement::InvalidStatement {
                        info: "unrecognized statement syntax".into(),
                        location,
                    }),
                    1,
                );
            }
        };

        let upper = name.to_uppercase();
        match upper.as_str() {
            "ADD" => (Some(self.analyze_add_or_and(isa::OP_ADD, nodes, &location)), 1),
            "AND" => (Some(self.analyze_add_or_and(isa::OP_AND, nodes, &location)), 1),
            "NOT" => (Some(self.analyze_not(nodes, &location)), 1),
            "LD" => (Some(self.analyze_ld(nodes, &location)), 1),
            "TRAP" => (Some(self.analyze_trap(nodes, &location)), 1),
            "HALT" => (Some(self.analyze_halt(nodes, &location)), 1),
            ".FILL" => (Some(self.analyze_fill(nodes, &location)), 1),
            ".ORIG" => {
                self.analyze_orig(nodes, line_index, &location);
                (None, 0)
            }
            _ if upper.starts_with("BR") => {
                (Some(self.analyze_br(&upper, nodes, &location)), 1)
            }
            _ => {
                self.errors
                    .push(location.clone(), format!("unrecognized operation name: {}", name));
                (
                    Some(Statement::InvalidStatement {
                        info: format!("unrecognized operation name: {}", name),
                        location,
                    }),
                    1,
                )
            }
        }
    }

    fn ensure_line_args(&mut self, nodes: &[Node], operand_count: usize, location: &Location) -> bool {
        if nodes.len() != operand_count + 1 {
            self.errors.push(
                location.clone(),
                format!(
                    "expected {} arguments, got: {}",
                    operand_count,
                    nodes.len() - 1
                ),
            );
            false
        } else {
            true
        }
    }

    fn analyze_add_or_and(&mut self, opcode: u16, nodes: &[Node], location: &Location) -> Statement {
        if !self.ensure_line_args(nodes, 3, location) {
            return Statement::InvalidStatement {
                info: "malformed operands".into(),
                location: location.clone(),
            };
        }

        let dr = self.analyze_register(&nodes[1]);
        let sr1 = self.analyze_register(&nodes[2]);

        match &nodes[3] {
            Node::Register { index, .. } => Statement::Instruction {
                opcode,
                dr: Some(dr),
                sr1: Some(sr1),
                sr2: Some(*index),
                mode: Some(AddrMode::Register),
                imm5: None,
                offset6: None,
                pc_offset9: None,
                trapvect8: None,
                label_ref: None,
                branch_flags: None,
                location: location.clone(),
            },
            other => {
                let mnemonic = if opcode == isa::OP_ADD { "ADD" } else { "AND" };
                let imm5 = self.analyze_number(other, mnemonic);
                self.check_signed_range_for(imm5, 5, mnemonic, other.location());
                Statement::Instruction {
                    opcode,
                    dr: Some(dr),
                    sr1: Some(sr1),
                    sr2: None,
                    mode: Some(AddrMode::Immediate),
                    imm5: Some(imm5),
                    offset6: None,
                    pc_offset9: None,
                    trapvect8: None,
                    label_ref: None,
                    branch_flags: None,
                    location: location.clone(),
                }
            }
        }
    }

    fn analyze_not(&mut self, nodes: &[Node], location: &Location) -> Statement {
        if !self.ensure_line_args(nodes, 2, location) {
            return Statement::InvalidStatement {
                info: "malformed operands".into(),
                location: location.clone(),
            };
        }
        let dr = self.analyze_register(&nodes[1]);
        let sr1 = self.analyze_register(&nodes[2]);
        Statement::Instruction {
            opcode: isa::OP_NOT,
            dr: Some(dr),
            sr1: Some(sr1),
            sr2: None,
            mode: None,
            imm5: None,
            offset6: None,
            pc_offset9: None,
            trapvect8: None,
            label_ref: None,
            branch_flags: None,
            location: location.clone(),
        }
    }

    fn analyze_ld(&mut self, nodes: &[Node], location: &Location) -> Statement {
        if !self.ensure_line_args(nodes, 2, location) {
            return Statement::InvalidStatement {
                info: "malformed operands".into(),
                location: location.clone(),
            };
        }
        let dr = self.analyze_register(&nodes[1]);
        let label_ref = match &nodes[2] {
            Node::Symbol { name, .. } => Some(name.clone()),
            other => {
                self.errors.push(
                    other.location().clone(),
                    format!("expected symbol, got: {:?}", other),
                );
                None
            }
        };
        Statement::Instruction {
            opcode: isa::OP_LD,
            dr: Some(dr),
            sr1: None,
            sr2: None,
            mode: None,
            imm5: None,
            offset6: None,
            pc_offset9: None,
            trapvect8: None,
            label_ref,
            branch_flags: None,
            location: location.clone(),
        }
    }

    fn analyze_br(&mut self, mnemonic: &str, nodes: &[Node], location: &Location) -> Statement {
        let suffix = &mnemonic[2..];
        let flags = match parse_branch_flags(suffix) {
            Some(flags) => flags,
            None => {
                self.errors.push(
                    location.clone(),
                    format!("invalid branch condition flags: {}", suffix),
                );
                BranchFlags::default()
            }
        };

        if !self.ensure_line_args(nodes, 1, location) {
            return Statement::InvalidStatement {
                info: "malformed operands".into(),
                location: location.clone(),
            };
        }
        // BR's operand is either a label or a literal signed 9-bit offset.
        let (label_ref, pc_offset9) = match &nodes[1] {
            Node::Symbol { name, .. } => (Some(name.clone()), None),
            Node::DecimalNumber { .. } | Node::HexNumber { .. } => {
                let value = self.analyze_number(&nodes[1], "BR");
                self.check_signed_range_for(value, 9, "BR", nodes[1].location());
                (None, Some(value))
            }
            other => {
                self.errors.push(
                    other.location().clone(),
                    format!("expected label or number, got: {:?}", other),
                );
                (None, None)
            }
        };
        Statement::Instruction {
            opcode: isa::OP_BR,
            dr: None,
            sr1: None,
            sr2: None,
            mode: None,
            imm5: None,
            offset6: None,
            pc_offset9,
            trapvect8: None,
            label_ref,
            branch_flags: Some(flags),
            location: location.clone(),
        }
    }

    fn analyze_trap(&mut self, nodes: &[Node], location: &Location) -> Statement {
        if !self.ensure_line_args(nodes, 1, location) {
            return Statement::InvalidStatement {
                info: "malformed operands".into(),
                location: location.clone(),
            };
        }
        let value = self.analyze_number(&nodes[1], "TRAP");
        if !(0..=0xFF).contains(&value) {
            self.errors.push(
                nodes[1].location().clone(),
                format!("TRAP vector {} is too large to fit in 8 bits", value),
            );
        }
        Statement::Instruction {
            opcode: isa::OP_TRAP,
            dr: None,
            sr1: None,
            sr2: None,
            mode: None,
            imm5: None,
            offset6: None,
            pc_offset9: None,
            trapvect8: Some(value as u8),
            label_ref: None,
            branch_flags: None,
            location: location.clone(),
        }
    }

    fn analyze_halt(&mut self, nodes: &[Node], location: &Location) -> Statement {
        if !self.ensure_line_args(nodes, 0, location) {
            return Statement::InvalidStatement {
                info: "malformed operands".into(),
                location: location.clone(),
            };
        }
        Statement::Instruction {
            opcode: isa::OP_TRAP,
            dr: None,
            sr1: None,
            sr2: None,
            mode: None,
            imm5: None,
            offset6: None,
            pc_offset9: None,
            trapvect8: Some(isa::TRAPVECT_HALT),
            label_ref: None,
            branch_flags: None,
            location: location.clone(),
        }
    }

    fn analyze_fill(&mut self, nodes: &[Node], location: &Location) -> Statement {
        if !self.ensure_line_args(nodes, 1, location) {
            return Statement::InvalidStatement {
                info: "malformed operands".into(),
                location: location.clone(),
            };
        }
        let value = match &nodes[1] {
            Node::DecimalNumber { value, .. } => FillValue::Immediate(*value as u16),
            Node::HexNumber { value, .. } => FillValue::Immediate(*value),
            Node::Symbol { name, .. } => FillValue::Label(name.clone()),
            other => {
                self.errors.push(
                    other.location().clone(),
                    format!("expected integer or label, got: {:?}", other),
                );
                FillValue::Immediate(0)
            }
        };
        Statement::FillDirective {
            value,
            location: location.clone(),
        }
    }

    fn analyze_orig(&mut self, nodes: &[Node], line_index: u16, location: &Location) {
        if line_index != 0 {
            self.errors.push(
                location.clone(),
                "'.ORIG' directive must appear before any instructions".to_string(),
            );
        }
        if !self.ensure_line_args(nodes, 1, location) {
            return;
        }
        let value = self.analyze_number(&nodes[1], ".ORIG");
        self.origin = value as u16;
    }

    fn analyze_register(&mut self, node: &Node) -> u32 {
        match node {
            Node::Register { index, .. } if *index <= 7 => *index,
            Node::Register { index, location } => {
                self.errors
                    .push(location.clone(), format!("register out of range: R{}", index));
                0
            }
            other => {
                self.errors.push(
                    other.location().clone(),
                    format!("expected register, got: {:?}", other),
                );
                0
            }
        }
    }

    fn analyze_number(&mut self, node: &Node, context: &str) -> i32 {
        match node {
            Node::DecimalNumber { value, .. } => *value,
            Node::HexNumber { value, .. } => *value as i32,
            other => {
                self.errors.push(
                    other.location().clone(),
                    format!("{} expected number, got: {:?}", context, other),
                );
                0
            }
        }
    }

    fn check_signed_range_for(&mut self, value: i32, bits: u32, mnemonic: &str, location: &Location) -> bool {
        let min = -(1i32 << (bits - 1));
        let max = (1i32 << (bits - 1)) - 1;
        if value < min || value > max {
            self.errors.push(
                location.clone(),
                format!(
                    "number argument to {} is too large to fit in {} bits: {}",
                    mnemonic, bits, value
                ),
            );
            false
        } else {
            true
        }
    }
}

/// Parses the `nzp` suffix of a `BR`/`BRn`/`BRzp`/… mnemonic. A bare `BR`
/// means unconditional, matching the LC-3 convention of treating no suffix
/// as `BRnzp`.
fn parse_branch_flags(suffix: &str) -> Option<BranchFlags> {
    if suffix.is_empty() {
        return Some(BranchFlags {
            n: true,
            z: true,
            p: true,
        });
    }
    let mut flags = BranchFlags::default();
    for c in suffix.chars() {
        match c {
            'N' => flags.n = true,
            'Z' => flags.z = true,
            'P' => flags.p = true,
            _ => return None,
        }
    }
    Some(flags)
}
