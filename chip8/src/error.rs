//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::MAX_PROGRAM_SIZE;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram(usize),
    Fmt(fmt::Error),
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeProgram(len) => write!(
                f,
                "program of {len} bytes is too large for VM memory, maximum is {MAX_PROGRAM_SIZE}"
            ),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}
