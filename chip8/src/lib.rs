mod bytecode;
pub mod constants;
mod cpu;
mod decode;
mod devices;
mod error;
mod interp;
mod vm;

pub use self::{
    decode::Instr,
    devices::{InvalidKeyCode, KeyCode},
    error::{Chip8Error, Chip8Result},
    interp::Flow,
};

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Row-major monochrome pixels, `true` is lit.
pub type Chip8DisplayBuffer<'a> = &'a [bool; constants::DISPLAY_BUFFER_SIZE];

pub mod prelude {
    pub use super::{
        devices::KeyCode,
        error::{Chip8Error, Chip8Result},
        interp::Flow,
        vm::{Chip8Conf, Chip8Vm},
    };
}
