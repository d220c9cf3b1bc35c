// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Line based rumble console: type keys and press Enter, an empty line sends the command.

use xjoy::ff::{HidRaw, Motor, NoRemediation, PulseParam, RumbleCommand};

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

const HELP: &str = "\
--[  MotorEnable  ]---------------[ Strength in % ][  10ms ][cnt]--
   STR WEA LTR RTR  -   -   -   -  STR WEA LTR RTR  SUS REL  LOP
   [1] [2] [3] [4]                 q/a w/s e/d r/f  h/j k/l  u/i
   <-- keys, empty line = SEND, x = EXIT";

fn edit(cmd: &mut RumbleCommand, key: char) -> bool {
    match key {
        '1' => cmd.enable.toggle(Motor::Strong),
        '2' => cmd.enable.toggle(Motor::Weak),
        '3' => cmd.enable.toggle(Motor::Left),
        '4' => cmd.enable.toggle(Motor::Right),
        'q' => cmd.strength.raise(Motor::Strong),
        'a' => cmd.strength.lower(Motor::Strong),
        'w' => cmd.strength.raise(Motor::Weak),
        's' => cmd.strength.lower(Motor::Weak),
        'e' => cmd.strength.raise(Motor::Left),
        'd' => cmd.strength.lower(Motor::Left),
        'r' => cmd.strength.raise(Motor::Right),
        'f' => cmd.strength.lower(Motor::Right),
        'h' => cmd.pulse.lower(PulseParam::Sustain),
        'j' => cmd.pulse.raise(PulseParam::Sustain),
        'k' => cmd.pulse.lower(PulseParam::Release),
        'l' => cmd.pulse.raise(PulseParam::Release),
        'u' => cmd.pulse.lower(PulseParam::Loop),
        'i' => cmd.pulse.raise(PulseParam::Loop),
        _ => return false,
    }
    true
}

fn main() {
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: rumble /dev/hidraw##");
            process::exit(1);
        }
    };

    let mut hid = match HidRaw::open(&path, &NoRemediation) {
        Ok(hid) => hid,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let mut cmd = RumbleCommand::console_default();
    println!("{}\n{}", HELP, cmd);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("{}", e);
                break;
            }
        };
        let line = line.trim();

        if line == "x" {
            break;
        }

        if line.is_empty() {
            match hid.send(&cmd) {
                Ok(()) => println!("sent {}", cmd),
                Err(e) => eprintln!("{}", e),
            }
            continue;
        }

        for key in line.chars() {
            if !edit(&mut cmd, key) {
                eprintln!("unknown key {:?}", key);
            }
        }
        println!("{}", cmd);
        let _ = io::stdout().flush();
    }
}
