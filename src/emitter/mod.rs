//! # Emitter
//!
//! Turns a `Program` into the words of an LC-3 object image: a 2-byte
//! origin header followed by one big-endian `u16` per statement — the
//! field the VM's loader (and the real LC-3 `.obj` format) expects.


use byteorder::{BigEndian, WriteBytesExt};

use crate::ast::{AddrMode, FillValue, Program, Statement, SymbolTable};
use crate::error::{ErrorList, Location};
use crate::isa;

pub struct EmitResult {
    pub origin: u16,
    /// Program words only; does not include the origin header.
    pub words: Vec<u16>,
}

impl EmitResult {
    /// The full object image: origin header followed by program words, each
    /// word big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.words.len() + 1) * 2);
        bytes.write_u16::<BigEndian>(self.origin).expect("Vec write is infallible");
        for word in &self.words {
            bytes.write_u16::<BigEndian>(*word).expect("Vec write is infallible");
        }
        bytes
    }
}

pub fn emit(program: &Program, errors: &mut ErrorList) -> EmitResult {
    let mut emitter = Emitter {
        symbol_table: &program.symbol_table,
        current_address: program.origin,
        words: Vec::with_capacity(program.statements.len()),
        errors,
    };
    for statement in &program.statements {
        emitter.emit_statement(statement);
    }
    EmitResult {
        origin: program.origin,
        words: emitter.words,
    }
}

struct Emitter<'a> {
    symbol_table: &'a SymbolTable,
    current_address: u16,
    words: Vec<u16>,
    errors: &'a mut ErrorList,
}

impl<'a> Emitter<'a> {
    fn emit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Instruction {
                opcode,
                dr,
                sr1,
                sr2,
                mode,
                imm5,
                pc_offset9,
                trapvect8,
                label_ref,
                branch_flags,
                location,
                ..
            } => {
                let word = self.encode_instruction(
                    *opcode,
                    *dr,
                    *sr1,
                    *sr2,
                    *mode,
                    *imm5,
                    *pc_offset9,
                    *trapvect8,
                    label_ref.as_deref(),
                    *branch_flags,
                    location,
                );
                self.push(word);
            }
            Statement::FillDirective { value, location } => {
                let word = match value {
                    FillValue::Immediate(v) => *v,
                    FillValue::Label(name) => self.resolve_label(name, location),
                };
                self.push(word);
            }
            Statement::InvalidStatement { .. } => {
                // Already reported by the analyzer; still occupies a word so
                // later labels keep the addresses the analyzer assigned them.
                self.push(0);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_instruction(
        &mut self,
        opcode: u16,
        dr: Option<u32>,
        sr1: Option<u32>,
        sr2: Option<u32>,
        mode: Option<AddrMode>,
        imm5: Option<i32>,
        pc_offset9: Option<i32>,
        trapvect8: Option<u8>,
        label_ref: Option<&str>,
        branch_flags: Option<crate::ast::BranchFlags>,
        location: &Location,
    ) -> u16 {
        let dr = dr.unwrap_or(0) as u16;
        let sr1 = sr1.unwrap_or(0) as u16;

        match opcode {
            isa::OP_ADD | isa::OP_AND => {
                let base = (opcode << 12) | (dr << 9) | (sr1 << 6);
                match mode {
                    Some(AddrMode::Register) => base | sr2.unwrap_or(0) as u16,
                    _ => {
                        let imm = mask_bits(imm5.unwrap_or(0), 5);
                        base | (1 << 5) | imm
                    }
                }
            }
            isa::OP_NOT => (opcode << 12) | (dr << 9) | (sr1 << 6) | 0b111111,
            isa::OP_LD => {
                let offset = self.resolve_pc_offset9(label_ref, pc_offset9, location);
                (opcode << 12) | (dr << 9) | offset
            }
            isa::OP_BR => {
                let flags = branch_flags.unwrap_or_default().as_bits();
                let offset = self.resolve_pc_offset9(label_ref, pc_offset9, location);
                (opcode << 12) | (flags << 9) | offset
            }
            isa::OP_TRAP => (opcode << 12) | (trapvect8.unwrap_or(0) as u16),
            _ => {
                self.errors
                    .push(location.clone(), format!("unrecognized opcode: {:#06b}", opcode));
                0
            }
        }
    }

    /// `LD`/`BR` carry either a label (resolved against the symbol table) or,
    /// for `BR` only, a literal signed offset supplied directly by the
    /// analyzer.
    fn resolve_pc_offset9(
        &mut self,
        label_ref: Option<&str>,
        pc_offset9: Option<i32>,
        location: &Location,
    ) -> u16 {
        if let Some(value) = pc_offset9 {
            return mask_bits(value, 9);
        }
        self.calc_pc_offset(label_ref, 9, location)
    }

    fn resolve_label(&mut self, name: &str, location: &Location) -> u16 {
        match self.symbol_table.get(name) {
            Some(addr) => addr,
            None => {
                self.errors
                    .push(location.clone(), format!("undefined label: {}", name));
                0
            }
        }
    }

    /// Offset from the instruction following `self.current_address` to
    /// `label`'s address, masked to `bits` regardless of whether it fits —
    /// a range violation is still reported, but the field is always filled.
    fn calc_pc_offset(&mut self, label: Option<&str>, bits: u32, location: &Location) -> u16 {
        let label = match label {
            Some(label) => label,
            None => return 0,
        };
        let target = match self.symbol_table.get(label) {
            Some(addr) => addr,
            None => {
                self.errors
                    .push(location.clone(), format!("undefined label: {}", label));
                return 0;
            }
        };
        let pc = self.current_address.wrapping_add(1);
        let offset = target as i32 - pc as i32;
        let max = (1i32 << (bits - 1)) - 1;
        let min = -(1i32 << (bits - 1));
        if offset < min || offset > max {
            self.errors.push(
                location.clone(),
                format!(
                    "label '{}' is too far: offset {} exceeds {}-bit range [{}, {}]",
                    label, offset, bits, min, max
                ),
            );
        }
        mask_bits(offset, bits)
    }

    fn push(&mut self, word: u16) {
        self.words.push(word);
        self.current_address = self.current_address.wrapping_add(1);
    }
}

fn mask_bits(value: i32, bits: u32) -> u16 {
    (value as u16) & ((1u16 << bits) - 1)
}
