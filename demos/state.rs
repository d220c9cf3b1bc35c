// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Opens joystick described by YAML configuration. Enter prints state, `r` rumbles, `q` quits.

use xjoy::XboxJoystick;

use std::env;
use std::io::{self, BufRead};
use std::process;

fn main() {
    env_logger::init();

    let path = env::args().nth(1).unwrap_or_else(|| "xjoy.yaml".to_owned());
    let mut js = match XboxJoystick::from_config_file(&path) {
        Ok(js) => js,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            process::exit(1);
        }
    };

    if let Err(e) = js.open() {
        eprintln!("{}", e);
        process::exit(1);
    }
    if let Some(info) = js.device_info() {
        println!("{}", info);
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        match line.trim() {
            "q" => break,
            "r" => {
                if let Err(e) = js.rumble() {
                    eprintln!("{}", e);
                }
            }
            _ => {
                let stdout = io::stdout();
                if let Err(e) = js.print_state(&mut stdout.lock()) {
                    eprintln!("{}", e);
                }
            }
        }

        if let Some(reason) = js.stop_reason() {
            eprintln!("reader stopped: {}", reason);
            break;
        }
    }

    if let Err(e) = js.close() {
        eprintln!("{}", e);
    }
}
