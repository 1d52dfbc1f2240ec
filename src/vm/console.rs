//! # Console I/O
//!
//! Isolates the VM core from `std::io` so golden tests can drive execution
//! against an in-memory double instead of a real terminal. Both methods
//! return `io::Result` so a closed stdout or an EOF/failed stdin read
//! surfaces to the caller instead of being silently treated as success.

use std::io::{self, Read, Write};

pub trait ConsoleIo {
    fn read_byte(&mut self) -> io::Result<u8>;
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

/// The default `ConsoleIo` for interactive use: real stdin/stdout.
#[derive(Default)]
pub struct StdConsoleIo;

impl ConsoleIo for StdConsoleIo {
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        std::io::stdin().read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        std::io::stdout().write_all(&[byte])?;
        std::io::stdout().flush()
    }
}

/// A scripted, in-memory `ConsoleIo` for deterministic tests: reads come
/// from a fixed input queue, writes accumulate into a buffer. Exhausting the
/// input queue is a failure (`UnexpectedEof`), matching real stdin's EOF
/// behavior rather than silently returning `0`.
#[derive(Default)]
pub struct MemoryConsoleIo {
    input: std::collections::VecDeque<u8>,
    pub output: Vec<u8>,
}

impl MemoryConsoleIo {
    pub fn with_input(input: impl IntoIterator<Item = u8>) -> Self {
        Self {
            input: input.into_iter().collect(),
            output: Vec::new(),
        }
    }
}

impl ConsoleIo for MemoryConsoleIo {
    fn read_byte(&mut self) -> io::Result<u8> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more scripted input"))
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }
}
