//! Entrypoint for CLI
mod clock;
mod config;
mod error;

use std::{env, error::Error, fs};

use chip8::{constants::*, prelude::*, IMPL_VERSION};
use log::{debug, info};

use self::{
    clock::{Clock, Hz},
    config::CliConf,
    error::CliError,
};

static USAGE: &str = r#"
usage: chip8 run ROM [CONF]

commands:
    run     Run the target ROM file and print the final display

config (YAML, every field optional):
    frames: 600             frames to run at 60 Hz
    steps_per_frame: 10     instructions per frame
    throttle: true          pace frames against the wall clock
    rng_seed: 42            fixed seed for RND
    keys:                   scripted keypad input
      - { frame: 30, key: 5, pressed: true }

examples:
    chip8 run maze.rom
    chip8 run breakout.rom breakout.yaml
"#;

fn run_bytecode(filepath: &str, confpath: Option<&str>) -> Result<(), CliError> {
    let conf = match confpath {
        Some(path) => CliConf::from_yaml(&fs::read_to_string(path)?)?,
        None => CliConf::default(),
    };
    debug!("{conf:?}");

    info!("loading {filepath}");
    let bytecode = fs::read(filepath)?;

    let mut vm = Chip8Vm::new(conf.vm_conf());
    vm.load_bytecode(bytecode.as_slice())?;

    let mut clock = conf.throttle.then(|| Clock::new(Hz(DELAY_FREQUENCY)));
    let frames = run_frames(&mut vm, &conf, || {
        if let Some(clock) = clock.as_mut() {
            clock.wait();
        }
    });

    info!("ran {frames} frames, stopped at {:04X}", vm.pc());
    if vm.is_blocked() {
        info!("still waiting for a key");
    }

    println!("{}", vm.dump_display()?);
    println!("{}", vm.dump_keys()?);

    Ok(())
}

/// Drive the VM for the configured number of frames.
///
/// Each frame applies the scripted key events for that frame, counts down
/// the timers, then executes a batch of instructions. The `wait` callback
/// runs at the end of every frame.
fn run_frames(vm: &mut Chip8Vm, conf: &CliConf, mut wait: impl FnMut()) -> usize {
    for frame in 0..conf.frames {
        for event in conf.keys_at(frame) {
            debug!(
                "frame {frame}: {} {}",
                event.key,
                if event.pressed { "down" } else { "up" }
            );
            if event.pressed {
                vm.key_pressed(event.key);
            } else {
                vm.key_released(event.key);
            }
        }

        vm.tick();
        vm.step(conf.steps_per_frame);

        wait();
    }

    conf.frames
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    match parse_args() {
        Some(Cmd::Run { filepath, confpath }) => {
            run_bytecode(&filepath, confpath.as_deref())?
        }
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    parse_cmd(env::args().skip(1)).ok()
}

fn parse_cmd(mut args: impl Iterator<Item = String>) -> Result<Cmd, CliError> {
    match args.next().as_deref() {
        Some("run") => Ok(Cmd::Run {
            filepath: args.next().ok_or_else(CliError::usage)?,
            confpath: args.next(),
        }),
        _ => Err(CliError::usage()),
    }
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

#[derive(Debug, PartialEq, Eq)]
enum Cmd {
    /// Run file
    Run {
        filepath: String,
        confpath: Option<String>,
    },
}
