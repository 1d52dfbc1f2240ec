//! # Virtual machine execution core
//!
//! Loads a bit-exact object image and interprets it: fetch, pre-increment
//! `PC`, decode, dispatch. `ADD`/`AND`/`NOT`/`LD`/`TRAP` are the opcodes this
//! VM actually executes; every other opcode in the ISA is decoded (its
//! mnemonic is known) but not implemented, and executing one stops the loop
//! with [`VmError::UnimplementedOpcode`] rather than silently doing nothing.

pub mod console;


use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::isa;
use console::ConsoleIo;

/// A fatal condition that stops the execution loop. Unlike the assembler's
/// accumulating `ErrorList`, execution has no "keep going and report more"
/// mode: the loop is the sole mutator of machine state and a bad opcode
/// means that state can no longer be trusted.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum VmError {
    #[error("opcode not implemented: {mnemonic} ({opcode:#06b} at PC={pc:#06x})")]
    UnimplementedOpcode {
        opcode: u16,
        mnemonic: &'static str,
        pc: u16,
    },
    #[error("trap vector not implemented: {vector:#04x} (at PC={pc:#06x})")]
    UnimplementedTrap { vector: u8, pc: u16 },
    /// A `ConsoleIo` read or write failed (closed stdout, EOF/failed stdin,
    /// …) while servicing a console trap. `io::Error` isn't `PartialEq`/
    /// `Clone`, so the message is captured as text rather than the error
    /// itself.
    #[error("console I/O failed (at PC={pc:#06x}): {message}")]
    ConsoleIo { message: String, pc: u16 },
}

/// Why the execution loop stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// `TRAP x25` (`HALT`) executed.
    Trap,
    /// `PC` reached the top of memory.
    EndOfMemory,
}

/// `memory[0..65536]` plus the ten-register file (`R0`..`R7`, `PC`, `COND`).
/// Allocated once; the execution loop never reallocates it.
pub struct Machine {
    pub memory: Box<[u16; 65536]>,
    pub registers: [u16; isa::NUM_REGISTERS],
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            memory: Box::new([0u16; 65536]),
            registers: [0u16; isa::NUM_REGISTERS],
        }
    }
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies big-endian 16-bit `words` into memory starting at
    /// `load_address`. Callers are expected to have already stripped (or to
    /// be passing around) the object file's 2-byte origin header
    /// themselves — the loader only ever sees the program words.
    pub fn load_memory(&mut self, words: &[u8], load_address: u16) {
        let mut addr = load_address;
        for chunk in words.chunks(2) {
            let word = if chunk.len() == 2 {
                BigEndian::read_u16(chunk)
            } else {
                (chunk[0] as u16) << 8
            };
            self.memory[addr as usize] = word;
            addr = addr.wrapping_add(1);
        }
    }

    /// Reads registers `R0`..`R7` as an array, for a register-dump caller.
    pub fn general_registers(&self) -> [u16; 8] {
        let mut regs = [0u16; 8];
        regs.copy_from_slice(&self.registers[0..8]);
        regs
    }

    pub fn pc(&self) -> u16 {
        self.registers[isa::R_PC]
    }

    pub fn cond(&self) -> u16 {
        self.registers[isa::R_COND]
    }

    fn write_register(&mut self, index: usize, value: u16) {
        self.registers[index] = value;
        self.registers[isa::R_COND] = if value == 0 {
            isa::FL_ZRO
        } else if value & 0x8000 != 0 {
            isa::FL_NEG
        } else {
            isa::FL_POS
        };
    }

    /// Runs from the current `PC` until a trap halts execution or `PC`
    /// walks off the top of memory. An opcode this VM does not execute
    /// aborts the loop immediately; state up to (but not including) that
    /// instruction's effects is left exactly as the loop produced it.
    pub fn run(&mut self, console: &mut dyn ConsoleIo) -> Result<HaltReason, VmError> {
        loop {
            if let Some(reason) = self.step(console)? {
                return Ok(reason);
            }
        }
    }

    /// Executes exactly one instruction. Returns `Ok(Some(reason))` if that
    /// instruction halted the machine, `Ok(None)` if execution should
    /// continue, or `Err` if the instruction cannot be executed at all.
    pub fn step(&mut self, console: &mut dyn ConsoleIo) -> Result<Option<HaltReason>, VmError> {
        let pc = self.registers[isa::R_PC];
        if pc as u32 >= 65535 {
            return Ok(Some(HaltReason::EndOfMemory));
        }

        let instr = self.memory[pc as usize];
        self.registers[isa::R_PC] = pc.wrapping_add(1);
        let op = instr >> 12;

        match op {
            isa::OP_ADD => {
                self.exec_add_and(instr, |a, b| a.wrapping_add(b));
                Ok(None)
            }
            isa::OP_AND => {
                self.exec_add_and(instr, |a, b| a & b);
                Ok(None)
            }
            isa::OP_NOT => {
                let dr = ((instr >> 9) & 0x7) as usize;
                let sr = ((instr >> 6) & 0x7) as usize;
                self.write_register(dr, !self.registers[sr]);
                Ok(None)
            }
            isa::OP_LD => {
                let dr = ((instr >> 9) & 0x7) as usize;
                let offset = isa::sign_extend(instr & 0x1FF, 9);
                let addr = self.registers[isa::R_PC].wrapping_add(offset);
                let value = self.memory[addr as usize];
                self.write_register(dr, value);
                Ok(None)
            }
            isa::OP_TRAP => self.exec_trap(instr, pc, console),
            other => Err(VmError::UnimplementedOpcode {
                opcode: instr,
                mnemonic: isa::OPCODE_NAMES[other as usize],
                pc,
            }),
        }
    }

    fn exec_add_and(&mut self, instr: u16, op: impl Fn(u16, u16) -> u16) {
        let dr = ((instr >> 9) & 0x7) as usize;
        let sr1 = ((instr >> 6) & 0x7) as usize;
        let mode = (instr >> 5) & 0x1;
        let operand = if mode == 1 {
            isa::sign_extend(instr & 0x1F, 5)
        } else {
            self.registers[(instr & 0x7) as usize]
        };
        let value = op(self.registers[sr1], operand);
        self.write_register(dr, value);
    }

    fn exec_trap(
        &mut self,
        instr: u16,
        pc: u16,
        console: &mut dyn ConsoleIo,
    ) -> Result<Option<HaltReason>, VmError> {
        let vector = (instr & 0xFF) as u8;
        match vector {
            isa::TRAPVECT_HALT => Ok(Some(HaltReason::Trap)),
            isa::TRAPVECT_GETC => {
                let byte = console_read(console, pc)?;
                self.write_register(isa::R_R0, byte as u16);
                Ok(None)
            }
            isa::TRAPVECT_OUT => {
                let byte = (self.registers[isa::R_R0] & 0xFF) as u8;
                console_write(console, byte, pc)?;
                Ok(None)
            }
            isa::TRAPVECT_IN => {
                let byte = console_read(console, pc)?;
                console_write(console, byte, pc)?;
                self.write_register(isa::R_R0, byte as u16);
                Ok(None)
            }
            isa::TRAPVECT_PUTS => {
                let mut addr = self.registers[isa::R_R0];
                loop {
                    let word = self.memory[addr as usize];
                    if word == 0 {
                        break;
                    }
                    console_write(console, (word & 0xFF) as u8, pc)?;
                    addr = addr.wrapping_add(1);
                }
                Ok(None)
            }
            isa::TRAPVECT_PUTSP => {
                let mut addr = self.registers[isa::R_R0];
                'outer: loop {
                    let word = self.memory[addr as usize];
                    for byte in [word & 0xFF, word >> 8] {
                        if byte == 0 {
                            break 'outer;
                        }
                        console_write(console, byte as u8, pc)?;
                    }
                    addr = addr.wrapping_add(1);
                }
                Ok(None)
            }
            other => Err(VmError::UnimplementedTrap { vector: other, pc }),
        }
    }
}

fn console_read(console: &mut dyn ConsoleIo, pc: u16) -> Result<u8, VmError> {
    console.read_byte().map_err(|err| VmError::ConsoleIo {
        message: err.to_string(),
        pc,
    })
}

fn console_write(console: &mut dyn ConsoleIo, byte: u8, pc: u16) -> Result<(), VmError> {
    console.write_byte(byte).map_err(|err| VmError::ConsoleIo {
        message: err.to_string(),
        pc,
    })
}

/// Register dump for golden testing: `R0=<u16> ... PC=<u16> COND=<u16>`, each
/// value plain base-10 with no leading zeros or sign character.
pub fn format_register_dump(machine: &Machine) -> String {
    let mut parts = Vec::with_capacity(10);
    for (i, name) in isa::REGISTER_NAMES.iter().enumerate() {
        parts.push(format!("{}={}", name, machine.registers[i]));
    }
    parts.join(" ")
}
