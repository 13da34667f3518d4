//! CPU and memory state.
use crate::{bytecode::*, constants::*, devices::KeyCode};

/// Execution state of the interpreter loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Running,
    /// Suspended on `Fx0A` (`LD Vx, K`) until a key is pressed.
    Blocked,
}

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the current position in the bytecode.
    ///
    /// A 16-bit register, so jumps may set it past the end of memory.
    /// The fetch wraps it into the address space.
    pub(crate) pc: Address,
    /// Stack pointer, indexing the next free slot in the stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0.
    pub(crate) sound_timer: u8,
    /// Keyboard input state. Pressed is a 1 bit, released is a 0 bit.
    pub(crate) key_state: u16,
    /// Most recently pressed key, consumed by `LD Vx, K`.
    pub(crate) last_key: Option<KeyCode>,
    pub(crate) run_state: RunState,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn too.
    pub(crate) display: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        let mut cpu = Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            key_state: 0,
            last_key: None,
            run_state: RunState::Running,

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: Box::new([false; DISPLAY_BUFFER_SIZE]),
        };
        cpu.load_font();
        cpu
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return every register, buffer and input state to its startup value.
    pub(crate) fn reset(&mut self) {
        self.pc = MEM_START as Address;
        self.sp = 0;
        self.registers.fill(0);
        self.address = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.clear_keys();
        self.last_key = None;
        self.run_state = RunState::Running;

        self.clear_memory();
        self.load_font();
    }

    /// Erase the contents of the memory buffers `ram`, `stack` and `display`.
    pub(crate) fn clear_memory(&mut self) {
        self.ram.fill(0);
        self.stack.fill(0);
        self.display.fill(false);
    }

    fn load_font(&mut self) {
        let start = FONTSET_START as usize;
        self.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
    }

    pub fn clear_display(&mut self) {
        self.display.fill(false);
    }

    /// Move the program counter forward, wrapping at 16 bits.
    #[inline(always)]
    pub(crate) fn advance(&mut self, len: Address) {
        self.pc = self.pc.wrapping_add(len);
    }

    // ------------------------------------------------------------------------
    // Stack

    /// Push a return address, wrapping around to the bottom of the stack when full.
    #[inline]
    pub(crate) fn push(&mut self, address: Address) {
        self.stack[self.sp] = address;
        self.sp = (self.sp + 1) & STACK_MASK;
    }

    /// Pop a return address, wrapping around to the top of the stack when empty.
    #[inline]
    pub(crate) fn pop(&mut self) -> Address {
        self.sp = self.sp.wrapping_sub(1) & STACK_MASK;
        self.stack[self.sp]
    }

    // ------------------------------------------------------------------------
    // Keyboard

    pub fn set_key_state(&mut self, key: KeyCode, state: bool) {
        if state {
            self.key_state |= key.mask();
        } else {
            self.key_state &= !key.mask();
        }
    }

    /// Whether the key identified by the raw value is held down.
    ///
    /// Values outside the keypad are never pressed.
    pub fn key_state(&self, key_id: u8) -> bool {
        match KeyCode::try_from(key_id) {
            Ok(key) => self.key_state & key.mask() != 0,
            Err(_) => false,
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any_key(&self) -> bool {
        self.key_state > 0
    }

    /// Clear the keyboard input state, setting all keys to up.
    #[inline(always)]
    pub fn clear_keys(&mut self) {
        self.key_state = 0;
    }

    #[inline(always)]
    pub fn is_blocked(&self) -> bool {
        self.run_state == RunState::Blocked
    }

    // ------------------------------------------------------------------------
    // Timers

    /// Count down the delay timer.
    #[inline]
    pub fn tick_delay(&mut self) {
        // The checked_sub implementation uses `unlikely!()` which degrades performance.
        let (val, underflow) = self.delay_timer.overflowing_sub(1);
        if !underflow {
            self.delay_timer = val;
        }
    }

    #[inline]
    pub fn tick_sound(&mut self) {
        let (val, underflow) = self.sound_timer.overflowing_sub(1);
        if !underflow {
            self.sound_timer = val;
        }
    }

    // ------------------------------------------------------------------------
    // Operands

    /// Extract operand NNN from the current program counter.
    #[inline(always)]
    pub fn op_nnn(&self) -> u16 {
        op_nnn(&*self.ram, self.pc as usize)
    }

    /// Extract operands VX and NN from the current program counter.
    #[inline(always)]
    pub fn op_xnn(&self) -> (u8, u8) {
        op_xnn(&*self.ram, self.pc as usize)
    }

    /// Extract operands VX, VY and N from the current program counter.
    #[inline(always)]
    pub fn op_xyn(&self) -> (u8, u8, u8) {
        op_xyn(&*self.ram, self.pc as usize)
    }

    /// Extract operands VX and VY from the current program counter.
    #[inline(always)]
    pub fn op_xy(&self) -> (u8, u8) {
        op_xy(&*self.ram, self.pc as usize)
    }

    /// Extract operand VX from the current program counter.
    #[inline(always)]
    pub fn op_x(&self) -> u8 {
        op_x(&*self.ram, self.pc as usize)
    }
}
