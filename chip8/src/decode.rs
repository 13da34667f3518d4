//! Opcode classification.
//!
//! Opcodes are classified once, when a program is compiled into the VM,
//! and the resulting [`Instr`] is stored in the shadow table beside memory.
//! The variants carry no operands. Handlers extract those from the raw
//! opcode bytes in memory each time they execute.
use crate::constants::Opcode;

/// Instruction handlers, in numerical opcode order.
///
/// Mnemonics from Cowgod's Chip-8 technical reference.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instr {
    /// Any unrecognised bit pattern. Executes as a no-op.
    #[default]
    Illegal,
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1nnn
    Jp,
    /// 2nnn
    Call,
    /// 3xkk
    SeVxImm,
    /// 4xkk
    SneVxImm,
    /// 5xy0
    SeVxVy,
    /// 6xkk
    LdVxImm,
    /// 7xkk
    AddVxImm,
    /// 8xy0
    LdVxVy,
    /// 8xy1
    OrVxVy,
    /// 8xy2
    AndVxVy,
    /// 8xy3
    XorVxVy,
    /// 8xy4
    AddVxVy,
    /// 8xy5
    SubVxVy,
    /// 8xy6
    ShrVx,
    /// 8xy7
    SubnVxVy,
    /// 8xyE
    ShlVx,
    /// 9xy0
    SneVxVy,
    /// Annn
    LdIAddr,
    /// Bnnn
    JpV0Addr,
    /// Cxkk
    RndVxImm,
    /// Dxyn
    DrwVxVyN,
    /// Ex9E
    SkpVx,
    /// ExA1
    SknpVx,
    /// Fx07
    LdVxDt,
    /// Fx0A
    LdVxK,
    /// Fx15
    LdDtVx,
    /// Fx18
    LdStVx,
    /// Fx1E
    AddIVx,
    /// Fx29
    LdFVx,
    /// Fx33
    LdBVx,
    /// Fx55
    LdIVx,
    /// Fx65
    LdVxI,
}

impl Instr {
    /// Classify a raw opcode.
    ///
    /// Matches on the high nibble first. The `0x0`, `0x8`, `0xE` and `0xF`
    /// families are further distinguished by their low byte or low nibble.
    /// `5xy0` and `9xy0` require a zero low nibble. Everything else is
    /// [`Instr::Illegal`].
    pub fn decode(opcode: Opcode) -> Self {
        use Instr::*;

        match opcode & 0xF000 {
            0x0000 => match opcode {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => Illegal,
            },
            0x1000 => Jp,
            0x2000 => Call,
            0x3000 => SeVxImm,
            0x4000 => SneVxImm,
            0x5000 if opcode & 0x000F == 0x0 => SeVxVy,
            0x6000 => LdVxImm,
            0x7000 => AddVxImm,
            0x8000 => match opcode & 0x000F {
                0x0 => LdVxVy,
                0x1 => OrVxVy,
                0x2 => AndVxVy,
                0x3 => XorVxVy,
                0x4 => AddVxVy,
                0x5 => SubVxVy,
                0x6 => ShrVx,
                0x7 => SubnVxVy,
                0xE => ShlVx,
                _ => Illegal,
            },
            0x9000 if opcode & 0x000F == 0x0 => SneVxVy,
            0xA000 => LdIAddr,
            0xB000 => JpV0Addr,
            0xC000 => RndVxImm,
            0xD000 => DrwVxVyN,
            0xE000 => match opcode & 0x00FF {
                0x9E => SkpVx,
                0xA1 => SknpVx,
                _ => Illegal,
            },
            0xF000 => match opcode & 0x00FF {
                0x07 => LdVxDt,
                0x0A => LdVxK,
                0x15 => LdDtVx,
                0x18 => LdStVx,
                0x1E => AddIVx,
                0x29 => LdFVx,
                0x33 => LdBVx,
                0x55 => LdIVx,
                0x65 => LdVxI,
                _ => Illegal,
            },
            _ => Illegal,
        }
    }

    /// Assembly mnemonic with its operand pattern.
    #[rustfmt::skip]
    pub fn mnemonic(&self) -> &'static str {
        use Instr::*;

        match self {
            Illegal  => "???",
            Cls      => "CLS",
            Ret      => "RET",
            Jp       => "JP addr",
            Call     => "CALL addr",
            SeVxImm  => "SE Vx, byte",
            SneVxImm => "SNE Vx, byte",
            SeVxVy   => "SE Vx, Vy",
            LdVxImm  => "LD Vx, byte",
            AddVxImm => "ADD Vx, byte",
            LdVxVy   => "LD Vx, Vy",
            OrVxVy   => "OR Vx, Vy",
            AndVxVy  => "AND Vx, Vy",
            XorVxVy  => "XOR Vx, Vy",
            AddVxVy  => "ADD Vx, Vy",
            SubVxVy  => "SUB Vx, Vy",
            ShrVx    => "SHR Vx",
            SubnVxVy => "SUBN Vx, Vy",
            ShlVx    => "SHL Vx",
            SneVxVy  => "SNE Vx, Vy",
            LdIAddr  => "LD I, addr",
            JpV0Addr => "JP V0, addr",
            RndVxImm => "RND Vx, byte",
            DrwVxVyN => "DRW Vx, Vy, nibble",
            SkpVx    => "SKP Vx",
            SknpVx   => "SKNP Vx",
            LdVxDt   => "LD Vx, DT",
            LdVxK    => "LD Vx, K",
            LdDtVx   => "LD DT, Vx",
            LdStVx   => "LD ST, Vx",
            AddIVx   => "ADD I, Vx",
            LdFVx    => "LD F, Vx",
            LdBVx    => "LD B, Vx",
            LdIVx    => "LD [I], Vx",
            LdVxI    => "LD Vx, [I]",
        }
    }
}
