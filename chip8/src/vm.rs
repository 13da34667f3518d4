//! Virtual machine.
use std::fmt::{self, Write};

use log::{debug, trace};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    bytecode::op_word,
    constants::*,
    cpu::{Chip8Cpu, RunState},
    decode::Instr,
    devices::KeyCode,
    error::{Chip8Error, Chip8Result},
    interp::{self, Flow},
    Chip8DisplayBuffer,
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    /// Shadow memory holding the compiled instruction for each address in `ram`.
    ///
    /// Only addresses where an opcode was compiled hold a real instruction,
    /// every other entry is [`Instr::Illegal`]. Writes to `ram` made by the
    /// running program are not reflected here.
    shadow: Box<[Instr; MEM_SIZE]>,
    /// Write cursor used by [`Chip8Vm::compile`].
    here: usize,
    rng: StdRng,
    conf: Chip8Conf,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
pub struct Chip8Conf {
    /// Fixed seed for the random number generator, applied on every reset.
    ///
    /// When `None`, the generator is seeded from system entropy.
    pub rng_seed: Option<u64>,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        let mut vm = Chip8Vm {
            cpu: Chip8Cpu::new(),
            shadow: Box::new([Instr::Illegal; MEM_SIZE]),
            here: MEM_START,
            rng: seed_rng(&conf),
            conf,
        };
        vm.reset();
        vm
    }

    /// Clear internal state in preparation for a fresh startup.
    ///
    /// Memory is wiped and the font rewritten, every shadow entry becomes
    /// [`Instr::Illegal`], and the program counter and compile cursor
    /// return to [`MEM_START`].
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.shadow.fill(Instr::Illegal);
        self.here = MEM_START;
        self.rng = seed_rng(&self.conf);

        debug!("reset");
    }

    /// Reset the VM and compile the program image into memory from [`MEM_START`].
    ///
    /// The image is read as big-endian 16-bit opcodes. A trailing odd byte
    /// does not form an opcode and is ignored.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if !check_program_size(bytecode) {
            return Err(Chip8Error::LargeProgram(bytecode.len()));
        }

        self.reset();

        for pair in bytecode.chunks_exact(2) {
            self.compile(op_word(pair, 0));
        }

        debug!(
            "loaded {} bytes, compiled {} opcodes",
            bytecode.len(),
            bytecode.len() / 2
        );

        Ok(())
    }

    /// Write one opcode into memory at the compile cursor, store its decoded
    /// instruction in the shadow table, and advance the cursor.
    ///
    /// The cursor wraps around the end of memory.
    pub fn compile(&mut self, opcode: Opcode) {
        let here = self.here & ADDRESS_MASK;
        let instr = Instr::decode(opcode);

        self.cpu.ram[here] = (opcode >> 8) as u8;
        self.cpu.ram[(here + 1) & ADDRESS_MASK] = (opcode & 0xFF) as u8;
        self.shadow[here] = instr;

        if instr == Instr::Illegal {
            trace!("{here:04X}: {opcode:04X} is not a known instruction");
        }

        self.here = (here + 2) & ADDRESS_MASK;
    }

    pub fn display_buffer(&self) -> Chip8DisplayBuffer {
        &self.cpu.display
    }
}

fn seed_rng(conf: &Chip8Conf) -> StdRng {
    match conf.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn check_program_size(bytecode: &[u8]) -> bool {
    bytecode.len() <= MAX_PROGRAM_SIZE
}

/// Interpreter
impl Chip8Vm {
    /// Execute up to `step_count` instructions.
    ///
    /// Stops as soon as the machine blocks on a key wait, and does nothing
    /// if it is already blocked.
    ///
    /// Returns [`Flow::KeyWait`] if the machine is blocked afterwards,
    /// [`Flow::Draw`] if the display changed, and [`Flow::Ok`] otherwise.
    pub fn step(&mut self, step_count: usize) -> Flow {
        let mut control_flow = Flow::Ok;

        for _ in 0..step_count {
            if self.cpu.is_blocked() {
                break;
            }

            let instr = self.shadow[self.cpu.pc as usize & ADDRESS_MASK];

            match interp::exec(instr, &mut self.cpu, &mut self.rng) {
                Flow::Draw => control_flow = Flow::Draw,
                Flow::KeyWait => break,
                Flow::Ok => {}
            }
        }

        if self.cpu.is_blocked() {
            Flow::KeyWait
        } else {
            control_flow
        }
    }

    /// Count down the delay and sound timers.
    ///
    /// Expected to be called at [`DELAY_FREQUENCY`] by the host.
    pub fn tick(&mut self) {
        self.cpu.tick_delay();
        self.cpu.tick_sound();
    }

    /// Notify the VM that a key went down.
    ///
    /// The key is recorded as the most recent key press, and a VM that is
    /// waiting for input is resumed. `None` is ignored.
    pub fn key_pressed(&mut self, key: impl Into<Option<KeyCode>>) {
        if let Some(key) = key.into() {
            trace!("key pressed: {key}");
            self.cpu.set_key_state(key, true);
            self.cpu.last_key = Some(key);
            self.cpu.run_state = RunState::Running;
        }
    }

    /// Notify the VM that a key went up.
    ///
    /// Does not affect a pending key wait. `None` is ignored.
    pub fn key_released(&mut self, key: impl Into<Option<KeyCode>>) {
        if let Some(key) = key.into() {
            trace!("key released: {key}");
            self.cpu.set_key_state(key, false);
        }
    }
}

/// State inspection
impl Chip8Vm {
    #[inline]
    pub fn pc(&self) -> Address {
        self.cpu.pc
    }

    #[inline]
    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.cpu.registers
    }

    /// The address register `I`.
    #[inline]
    pub fn address(&self) -> Address {
        self.cpu.address
    }

    #[inline]
    pub fn sp(&self) -> usize {
        self.cpu.sp
    }

    #[inline]
    pub fn stack(&self) -> &[Address; STACK_SIZE] {
        &self.cpu.stack
    }

    #[inline]
    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer
    }

    #[inline]
    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer
    }

    /// Whether a host buzzer should be sounding.
    #[inline]
    pub fn is_buzzing(&self) -> bool {
        self.cpu.sound_timer > 0
    }

    #[inline]
    pub fn memory(&self) -> &[u8; MEM_SIZE] {
        &self.cpu.ram
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.cpu.is_blocked()
    }

    #[inline]
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.cpu.key_state(key.as_u8())
    }

    /// The compiled instruction in the shadow table at the given address.
    #[inline]
    pub fn instr_at(&self, address: usize) -> Instr {
        self.shadow[address & ADDRESS_MASK]
    }
}

/// Machine state setup, for tests and tooling.
#[doc(hidden)]
impl Chip8Vm {
    pub fn set_register(&mut self, vx: usize, value: u8) {
        self.cpu.registers[vx & 0xF] = value;
    }

    pub fn set_address(&mut self, address: Address) {
        self.cpu.address = address;
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.cpu.delay_timer = value;
    }

    /// Copy raw data into memory without compiling it.
    pub fn write_memory(&mut self, address: usize, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.cpu.ram[(address + i) & ADDRESS_MASK] = *byte;
        }
    }
}

/// Troubleshooting
#[doc(hidden)]
impl Chip8Vm {
    /// Returns the contents of the memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let iter = self
            .cpu
            .ram
            .iter()
            .enumerate()
            .skip(MEM_START)
            .take(count)
            .step_by(2);
        let mut buf = String::new();

        for (i, op) in iter {
            let lo = self.cpu.ram[(i + 1) & ADDRESS_MASK];
            let instr = self.shadow[i].mnemonic();
            writeln!(buf, "{i:04X}: {op:02X}{lo:02X} {instr}")?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.cpu.display[x + y * DISPLAY_WIDTH] {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        if self.cpu.any_key() {
            write!(buf, "keys: ")?;
            for key in KeyCode::ALL {
                if self.cpu.key_state(key.as_u8()) {
                    write!(buf, "{key}")?;
                }
            }
        }

        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn vm() -> Chip8Vm {
        Chip8Vm::new(Chip8Conf { rng_seed: Some(7) })
    }

    #[test]
    fn test_startup() {
        let vm = vm();

        assert_eq!(vm.pc(), 0x200);
        assert_eq!(vm.sp(), 0);
        assert!(!vm.is_blocked());
        assert_eq!(&vm.memory()[..FONTSET_DATA_LENGTH], &FONTSET[..]);
        assert!(vm.shadow.iter().all(|instr| *instr == Instr::Illegal));
    }

    #[test]
    fn test_compile_writes_memory_and_shadow() {
        let mut vm = vm();

        vm.compile(0x6188);
        vm.compile(0xFFFF);

        assert_eq!(vm.memory()[0x200], 0x61);
        assert_eq!(vm.memory()[0x201], 0x88);
        assert_eq!(vm.memory()[0x202], 0xFF);
        assert_eq!(vm.memory()[0x203], 0xFF);
        assert_eq!(vm.instr_at(0x200), Instr::LdVxImm);
        // The odd address inside an opcode is never compiled.
        assert_eq!(vm.instr_at(0x201), Instr::Illegal);
        assert_eq!(vm.instr_at(0x202), Instr::Illegal);
        assert_eq!(vm.here, 0x204);
    }

    #[test]
    fn test_load_resets_previous_program() {
        let mut vm = vm();
        vm.load_bytecode(&[0x61, 0x88, 0x62, 0x99]).unwrap();
        vm.step(2);
        assert_eq!(vm.registers()[1], 0x88);

        vm.load_bytecode(&[0x00, 0xE0]).unwrap();
        assert_eq!(vm.pc(), 0x200);
        assert_eq!(vm.registers()[1], 0);
        assert_eq!(vm.memory()[0x202], 0);
        assert_eq!(vm.instr_at(0x200), Instr::Cls);
        assert_eq!(vm.instr_at(0x202), Instr::Illegal);
    }

    #[test]
    fn test_load_ignores_trailing_byte() {
        let mut vm = vm();
        vm.load_bytecode(&[0x61, 0x88, 0x62]).unwrap();

        assert_eq!(vm.instr_at(0x200), Instr::LdVxImm);
        assert_eq!(vm.instr_at(0x202), Instr::Illegal);
        assert_eq!(vm.memory()[0x202], 0);
    }

    #[test]
    fn test_load_rejects_large_program() {
        let mut vm = vm();
        vm.compile(0x6188);

        let rom = vec![0; MAX_PROGRAM_SIZE + 2];
        assert!(matches!(
            vm.load_bytecode(&rom),
            Err(Chip8Error::LargeProgram(len)) if len == MAX_PROGRAM_SIZE + 2
        ));

        // Rejected before the reset, so the previous program survives.
        assert_eq!(vm.instr_at(0x200), Instr::LdVxImm);

        let rom = vec![0; MAX_PROGRAM_SIZE];
        assert!(vm.load_bytecode(&rom).is_ok());
    }

    /// Fx0A (LD Vx, K)
    ///
    /// Wait for a keypress, then store the key value in Vx.
    /// The VM must stall while waiting, and signal the state to the outer executer.
    #[test]
    #[rustfmt::skip]
    fn test_key_wait() {
        let mut vm = vm();
        vm.load_bytecode(&[
            0xF1, 0x0A, // LD v1, K
            0x62, 0x42  // LD v2, 0x42  ; sentinal
        ]).unwrap();

        // machine must stall
        for _ in 0..6 {
            assert_eq!(vm.step(1), Flow::KeyWait);
            assert_eq!(vm.cpu.pc, 0x200);
            assert!(vm.is_blocked());
        }

        // machine has yielded, waiting for any key to be pressed.
        vm.key_pressed(KeyCode::Key5);
        assert!(!vm.is_blocked());

        // machine will now advance
        assert_eq!(vm.step(1), Flow::Ok);
        assert_eq!(vm.cpu.pc, 0x202);
        assert!(vm.cpu.key_state(0x05));
        assert_eq!(vm.cpu.registers[1], 0x05);
        assert_eq!(vm.cpu.last_key, None);

        // Ensure the machine is continuing
        vm.step(1);
        assert_eq!(vm.cpu.pc, 0x204);
        assert_eq!(vm.cpu.registers[2], 0x42); // sentinal
    }

    #[test]
    fn test_step_stops_when_blocked() {
        let mut vm = vm();
        vm.compile(0x6001); // LD V0, 1
        vm.compile(0xF30A); // LD V3, K
        vm.compile(0x6102); // LD V1, 2

        assert_eq!(vm.step(10), Flow::KeyWait);
        assert_eq!(vm.pc(), 0x202);
        assert_eq!(vm.registers()[0], 1);
        assert_eq!(vm.registers()[1], 0);
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut vm = vm();
        vm.compile(0x2202); // CALL 0x202
        vm.compile(0xA321); // LD I, 0x321
        vm.compile(0xF30A); // LD V3, K
        vm.compile(0x6102); // LD V1, 2

        assert_eq!(vm.step(10), Flow::KeyWait);
        assert_eq!(vm.sp(), 1);
        assert_eq!(vm.address(), 0x321);

        // Reset while blocked.
        vm.reset();
        assert!(!vm.is_blocked());
        assert_eq!(vm.sp(), 0);

        vm.compile(0x2202); // CALL 0x202
        vm.compile(0xA321); // LD I, 0x321
        vm.compile(0xF30A); // LD V3, K
        assert_eq!(vm.step(10), Flow::KeyWait);
        vm.set_delay_timer(5);
        vm.set_register(1, 9);

        // Press while blocked, then reset before the wait consumes it.
        vm.key_pressed(KeyCode::Key2);
        vm.reset();

        assert!(!vm.is_blocked());
        assert_eq!(vm.pc(), 0x200);
        assert_eq!(vm.here, MEM_START);
        assert_eq!(vm.sp(), 0);
        assert!(vm.stack().iter().all(|addr| *addr == 0));
        assert_eq!(vm.address(), 0);
        assert_eq!(vm.delay_timer(), 0);
        assert_eq!(vm.registers(), &[0; REGISTER_COUNT]);
        assert!(!vm.is_key_pressed(KeyCode::Key2));
        assert_eq!(vm.cpu.last_key, None);
        assert!(vm.shadow.iter().all(|instr| *instr == Instr::Illegal));

        // A fresh key wait blocks again, the old press is gone.
        vm.compile(0xF30A);
        assert_eq!(vm.step(1), Flow::KeyWait);
        assert_eq!(vm.pc(), 0x200);
    }

    /// The program counter is a 16-bit register, and the return address
    /// pushed by CALL is taken from that same register.
    #[test]
    fn test_pc_is_sixteen_bit() {
        let mut vm = vm();
        vm.here = 0x0FE;
        vm.compile(0x2100); // CALL 0x100
        vm.compile(0x00EE); // RET

        // Past the end of memory, fetched from 0x0FE.
        vm.cpu.pc = 0x10FE;
        vm.step(1);
        assert_eq!(vm.pc(), 0x100);
        assert_eq!(vm.stack()[0], 0x1100);

        vm.step(1);
        assert_eq!(vm.pc(), 0x1100);

        vm.cpu.pc = 0xFFFE;
        vm.step(1);
        assert_eq!(vm.pc(), 0x0000);
    }

    #[test]
    fn test_none_key_is_ignored() {
        let mut vm = vm();
        vm.compile(0xF30A); // LD V3, K
        vm.step(1);

        vm.key_pressed(None);
        assert!(vm.is_blocked());
        assert_eq!(vm.cpu.key_state, 0);

        vm.key_released(None);
        assert!(vm.is_blocked());
    }

    #[test]
    fn test_tick_counts_down_timers() {
        let mut vm = vm();
        vm.cpu.delay_timer = 2;
        vm.cpu.sound_timer = 1;
        assert!(vm.is_buzzing());

        vm.tick();
        assert_eq!(vm.delay_timer(), 1);
        assert_eq!(vm.sound_timer(), 0);
        assert!(!vm.is_buzzing());

        vm.tick();
        vm.tick();
        assert_eq!(vm.delay_timer(), 0);
        assert_eq!(vm.sound_timer(), 0);
    }

    #[test]
    fn test_step_reports_draw() {
        let mut vm = vm();
        vm.compile(0x00E0); // CLS
        vm.compile(0x6001); // LD V0, 1

        assert_eq!(vm.step(2), Flow::Draw);
        assert_eq!(vm.step(1), Flow::Ok);
    }

    #[test]
    fn test_seeded_rng_repeats_after_reset() {
        let mut vm = vm();
        let program = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF];

        vm.load_bytecode(&program).unwrap();
        vm.step(3);
        let first = *vm.registers();

        vm.load_bytecode(&program).unwrap();
        vm.step(3);
        assert_eq!(&first[..3], &vm.registers()[..3]);
    }

    /// Self-modifying code is not recompiled.
    #[test]
    fn test_ram_writes_do_not_recompile() {
        let mut vm = vm();
        vm.compile(0xA204); // LD I, 0x204
        vm.compile(0xF155); // LD [I], V1
        vm.cpu.registers[0] = 0x61;
        vm.cpu.registers[1] = 0x88;

        vm.step(2);
        assert_eq!(vm.memory()[0x204], 0x61);
        assert_eq!(vm.memory()[0x205], 0x88);
        assert_eq!(vm.instr_at(0x204), Instr::Illegal);
    }

    #[test]
    fn test_dump_display() {
        let mut vm = vm();
        vm.cpu.display[0] = true;
        vm.cpu.display[DISPLAY_WIDTH + 1] = true;

        let dump = vm.dump_display().unwrap();
        let mut lines = dump.lines();
        assert_eq!(lines.next().map(|l| &l[..3]), Some("#.."));
        assert_eq!(lines.next().map(|l| &l[..3]), Some(".#."));
        assert_eq!(dump.lines().count(), DISPLAY_HEIGHT);
    }

    #[test]
    fn test_dump_keys() {
        let mut vm = vm();
        assert_eq!(vm.dump_keys().unwrap(), "");

        vm.key_pressed(KeyCode::Key1);
        vm.key_pressed(KeyCode::KeyC);
        assert_eq!(vm.dump_keys().unwrap(), "keys: k1kc");
    }

    #[test]
    fn test_dump_ram() {
        let mut vm = vm();
        vm.compile(0x00E0);
        vm.compile(0x1200);

        let dump = vm.dump_ram(4).unwrap();
        assert_eq!(dump, "0200: 00E0 CLS\n0202: 1200 JP addr\n");
    }
}
