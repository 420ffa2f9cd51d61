//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use atty::Stream;
use std::io::Read;

fn get_current_settings() -> Option<libc::termios> {
    // zeroed because termios has additional members on some systems
    let mut settings = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut settings) };
    if result < 0 {
        return None;
    }
    Some(settings)
}

fn set_terminal_settings(settings: &libc::termios) {
    unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, settings) };
}

#[derive(Clone)]
pub struct Terminal {
    base_settings: Option<libc::termios>,
}

impl Terminal {
    /// Raw input for the line editor: no echo, no canonical buffering,
    /// reads return immediately.
    pub fn set_nonblocking_no_echo(&self) {
        let mut termios = match self.base_settings {
            Some(settings) => settings,
            None => return,
        };
        termios.c_lflag &= !(libc::ECHO | libc::ICANON);
        termios.c_cc[libc::VMIN] = 0;
        termios.c_cc[libc::VTIME] = 0;
        set_terminal_settings(&termios);
    }

    /// Restores the settings captured at startup. Does nothing when the
    /// process is not attached to a terminal.
    pub fn reset(&self) {
        if let Some(base_settings) = &self.base_settings {
            set_terminal_settings(base_settings);
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        if is_attached_to_terminal() {
            Terminal {
                base_settings: get_current_settings(),
            }
        } else {
            Terminal {
                base_settings: None,
            }
        }
    }
}

pub fn read_nonblocking_char() -> Option<u8> {
    let mut buf = [0u8; 1];
    match std::io::stdin().read(&mut buf) {
        Ok(1) => Some(buf[0]),
        _ => None,
    }
}

pub fn is_attached_to_terminal() -> bool {
    atty::is(Stream::Stdin) && atty::is(Stream::Stdout)
}
