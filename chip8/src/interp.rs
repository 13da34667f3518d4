//! Instruction semantics.
//!
//! Each handler reads its operands from the opcode bytes at the program
//! counter, applies its effect, and moves the program counter itself.
use log::trace;
use rand::Rng;

use crate::{
    constants::*,
    cpu::{Chip8Cpu, RunState},
    decode::Instr,
};

/// Outcome of executing instructions, reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Ok,
    /// The display buffer was modified by `CLS` or `DRW`.
    Draw,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// Execute a single compiled instruction against the CPU state.
pub(crate) fn exec<R: Rng>(instr: Instr, cpu: &mut Chip8Cpu, rng: &mut R) -> Flow {
    use Instr::*;

    let mut control_flow = Flow::Ok;

    match instr {
        // xxxx
        //
        // Unrecognised opcode, skipped without extracting any operands.
        Illegal => {
            cpu.advance(2);
        }
        // 00E0 (CLS)
        Cls => {
            cpu.clear_display();
            cpu.advance(2);
            control_flow = Flow::Draw;
        }
        // 00EE (RET)
        //
        // Return from a subroutine to the address at the top of the stack.
        Ret => {
            cpu.pc = cpu.pop();
        }
        // 1nnn (JP addr)
        Jp => {
            cpu.pc = cpu.op_nnn();
        }
        // 2nnn (CALL addr)
        //
        // The return address is the instruction following the call.
        Call => {
            let target = cpu.op_nnn();
            cpu.push(cpu.pc.wrapping_add(2));
            cpu.pc = target;
        }
        // 3xkk (SE Vx, byte)
        SeVxImm => {
            let (vx, nn) = cpu.op_xnn();
            let condition = cpu.registers[vx as usize] == nn;
            skip_if(cpu, condition);
        }
        // 4xkk (SNE Vx, byte)
        SneVxImm => {
            let (vx, nn) = cpu.op_xnn();
            let condition = cpu.registers[vx as usize] != nn;
            skip_if(cpu, condition);
        }
        // 5xy0 (SE Vx, Vy)
        SeVxVy => {
            let (vx, vy) = cpu.op_xy();
            let condition = cpu.registers[vx as usize] == cpu.registers[vy as usize];
            skip_if(cpu, condition);
        }
        // 6xkk (LD Vx, byte)
        LdVxImm => {
            let (vx, nn) = cpu.op_xnn();
            cpu.registers[vx as usize] = nn;
            cpu.advance(2);
        }
        // 7xkk (ADD Vx, byte)
        //
        // Carry flag is not set.
        AddVxImm => {
            let (vx, nn) = cpu.op_xnn();
            let x = cpu.registers[vx as usize];
            cpu.registers[vx as usize] = x.wrapping_add(nn);
            cpu.advance(2);
        }
        // Arithmetic instructions, identified by the low nibble
        LdVxVy | OrVxVy | AndVxVy | XorVxVy | AddVxVy | SubVxVy | ShrVx | SubnVxVy | ShlVx => {
            exec_math(instr, cpu);
            cpu.advance(2);
        }
        // 9xy0 (SNE Vx, Vy)
        SneVxVy => {
            let (vx, vy) = cpu.op_xy();
            let condition = cpu.registers[vx as usize] != cpu.registers[vy as usize];
            skip_if(cpu, condition);
        }
        // Annn (LD I, addr)
        LdIAddr => {
            cpu.address = cpu.op_nnn();
            cpu.advance(2);
        }
        // Bnnn (JP V0, addr)
        //
        // The target is not wrapped, the fetch masks the program counter.
        JpV0Addr => {
            cpu.pc = cpu.op_nnn() + cpu.registers[0] as Address;
        }
        // Cxkk (RND Vx, byte)
        //
        // Set register VX to the result of bitwise AND between a random number and NN.
        RndVxImm => {
            let (vx, nn) = cpu.op_xnn();
            cpu.registers[vx as usize] = nn & rng.gen::<u8>();
            cpu.advance(2);
        }
        // Dxyn (DRW Vx, Vy, nibble)
        DrwVxVyN => {
            draw_sprite(cpu);
            cpu.advance(2);
            control_flow = Flow::Draw;
        }
        // Ex9E (SKP Vx)
        SkpVx => {
            let vx = cpu.op_x();
            let condition = cpu.key_state(cpu.registers[vx as usize]);
            skip_if(cpu, condition);
        }
        // ExA1 (SKNP Vx)
        SknpVx => {
            let vx = cpu.op_x();
            let condition = !cpu.key_state(cpu.registers[vx as usize]);
            skip_if(cpu, condition);
        }
        // Fx07 (LD Vx, DT)
        LdVxDt => {
            let vx = cpu.op_x();
            cpu.registers[vx as usize] = cpu.delay_timer;
            cpu.advance(2);
        }
        // Fx0A (LD Vx, K)
        //
        // Wait for a key press, store the value of the key in Vx.
        // The program counter stays put while blocked, so this same
        // instruction runs again once the host reports a key.
        LdVxK => match cpu.last_key.take() {
            Some(key) => {
                let vx = cpu.op_x();
                cpu.registers[vx as usize] = key.as_u8();
                cpu.run_state = RunState::Running;
                cpu.advance(2);
                trace!("key wait satisfied by {key}");
            }
            None => {
                if !cpu.is_blocked() {
                    trace!("{:04X}: blocked waiting for key", cpu.pc);
                }
                cpu.run_state = RunState::Blocked;
                control_flow = Flow::KeyWait;
            }
        },
        // Fx15 (LD DT, Vx)
        LdDtVx => {
            let vx = cpu.op_x();
            cpu.delay_timer = cpu.registers[vx as usize];
            cpu.advance(2);
        }
        // Fx18 (LD ST, Vx)
        LdStVx => {
            let vx = cpu.op_x();
            cpu.sound_timer = cpu.registers[vx as usize];
            cpu.advance(2);
        }
        // Fx1E (ADD I, Vx)
        //
        // No overflow flag.
        AddIVx => {
            let vx = cpu.op_x();
            let x = cpu.registers[vx as usize] as Address;
            cpu.address = cpu.address.wrapping_add(x);
            cpu.advance(2);
        }
        // Fx29 (LD F, Vx)
        //
        // Set I = location of sprite for digit Vx.
        LdFVx => {
            let vx = cpu.op_x();
            let x = cpu.registers[vx as usize] as Address;
            cpu.address = FONTSET_START + x * FONTSET_HEIGHT as Address;
            cpu.advance(2);
        }
        // Fx33 (LD B, Vx)
        //
        // Store the binary-coded decimal representation of Vx
        // in the memory locations I, I+1, and I+2.
        #[rustfmt::skip]
        LdBVx => {
            let vx = cpu.op_x();
            let addr = cpu.address as usize;
            let x = cpu.registers[vx as usize];
            cpu.ram[addr       & ADDRESS_MASK] = x / 100 % 10;
            cpu.ram[(addr + 1) & ADDRESS_MASK] = x / 10  % 10;
            cpu.ram[(addr + 2) & ADDRESS_MASK] = x       % 10;
            cpu.advance(2);
        }
        // Fx55 (LD [I], Vx)
        //
        // Store registers V0 through Vx in memory starting at location I.
        LdIVx => {
            let vx = cpu.op_x() as usize;
            let addr = cpu.address as usize;
            for v in 0..=vx {
                cpu.ram[(addr + v) & ADDRESS_MASK] = cpu.registers[v];
            }
            cpu.advance(2);
        }
        // Fx65 (LD Vx, [I])
        //
        // Read registers V0 through Vx from memory starting at location I.
        LdVxI => {
            let vx = cpu.op_x() as usize;
            let addr = cpu.address as usize;
            for v in 0..=vx {
                cpu.registers[v] = cpu.ram[(addr + v) & ADDRESS_MASK];
            }
            cpu.advance(2);
        }
    }

    control_flow
}

/// Advance past the next instruction when the condition holds.
#[inline(always)]
fn skip_if(cpu: &mut Chip8Cpu, condition: bool) {
    cpu.advance(if condition { 4 } else { 2 });
}

/// Execute an arithmetic instruction on Vx and Vy.
///
/// Flag results are computed from the operands before Vx is overwritten,
/// and VF is written last.
#[inline]
fn exec_math(instr: Instr, cpu: &mut Chip8Cpu) {
    let (vx, vy) = cpu.op_xy();
    let (vx, vy) = (vx as usize, vy as usize);
    let (x, y) = (cpu.registers[vx], cpu.registers[vy]);

    match instr {
        // 8xy0 (LD Vx, Vy)
        Instr::LdVxVy => cpu.registers[vx] = y,
        // 8xy1 (OR Vx, Vy)
        Instr::OrVxVy => cpu.registers[vx] = x | y,
        // 8xy2 (AND Vx, Vy)
        Instr::AndVxVy => cpu.registers[vx] = x & y,
        // 8xy3 (XOR Vx, Vy)
        Instr::XorVxVy => cpu.registers[vx] = x ^ y,
        // 8xy4 (ADD Vx, Vy)
        //
        // If the sum overflows 8 bits, set VF to 1, else 0.
        Instr::AddVxVy => {
            let result = x as u16 + y as u16;
            cpu.registers[vx] = (result & 0xFF) as u8; // Overflow wrap
            cpu.registers[FLAG_REGISTER] = (result > 0xFF) as u8;
        }
        // 8xy5 (SUB Vx, Vy)
        //
        // VF is set to 1 when Vx > Vy (no borrow), otherwise 0.
        Instr::SubVxVy => {
            cpu.registers[vx] = x.wrapping_sub(y);
            cpu.registers[FLAG_REGISTER] = (x > y) as u8;
        }
        // 8xy6 (SHR Vx)
        //
        // VF receives the bit shifted out. VY is unused.
        Instr::ShrVx => {
            cpu.registers[vx] = x >> 1;
            cpu.registers[FLAG_REGISTER] = x & 1;
        }
        // 8xy7 (SUBN Vx, Vy)
        //
        // VF is set to 1 when Vy > Vx (no borrow), otherwise 0.
        Instr::SubnVxVy => {
            cpu.registers[vx] = y.wrapping_sub(x);
            cpu.registers[FLAG_REGISTER] = (y > x) as u8;
        }
        // 8xyE (SHL Vx)
        //
        // VF receives the bit shifted out. VY is unused.
        Instr::ShlVx => {
            cpu.registers[vx] = x << 1;
            cpu.registers[FLAG_REGISTER] = (x >> 7) & 1;
        }
        _ => unreachable!("{} is not an arithmetic instruction", instr.mnemonic()),
    }
}

/// Dxyn (DRW Vx, Vy, nibble)
///
/// Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
/// Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
/// memory pointed to by address register I.
///
/// If the sprite is drawn outside of the display area, it is wrapped around to the other side.
///
/// If the drawing operation erases existing pixels in the display buffer, register VF is set to
/// 1, and set to 0 if no display bits are unset. This is used for collision detection.
fn draw_sprite(cpu: &mut Chip8Cpu) {
    let (vx, vy, n) = cpu.op_xyn();
    let (x, y) = (
        cpu.registers[vx as usize] as usize,
        cpu.registers[vy as usize] as usize,
    );
    let addr = cpu.address as usize;
    let mut is_erased = false;

    for r in 0..n as usize {
        let row = cpu.ram[(addr + r) & ADDRESS_MASK];
        let py = (y + r) & DISPLAY_HEIGHT_MASK;

        // Each row is 8 bits representing the 8 pixels of the sprite.
        for c in 0..SPRITE_WIDTH {
            if (row >> (7 - c)) & 1 == 0 {
                continue;
            }

            let d = ((x + c) & DISPLAY_WIDTH_MASK) + py * DISPLAY_WIDTH;

            // XOR erases a pixel when both the old and new values are both 1.
            is_erased |= cpu.display[d];
            cpu.display[d] = !cpu.display[d];
        }
    }

    // If a pixel was erased, then a collision occurred.
    cpu.registers[FLAG_REGISTER] = is_erased as u8;
}
