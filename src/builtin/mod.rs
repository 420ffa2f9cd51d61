//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::os;
use crate::shell::Shell;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::os::fd::RawFd;

use crate::builtin::alias::{Alias, Unalias};
use crate::builtin::cd::Cd;
use crate::builtin::echo::{Echo, EchoNl};
use crate::builtin::exit::Exit;
use crate::builtin::printf::Printf;
use crate::builtin::set::Set;
use crate::builtin::source::Source;
use crate::builtin::umask::Umask;

mod alias;
mod cd;
mod echo;
mod exit;
mod printf;
mod set;
mod source;
mod umask;

pub struct BuiltinError(String);

impl From<String> for BuiltinError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BuiltinError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for BuiltinError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub type BuiltinResult = Result<i32, BuiltinError>;

/// The file descriptors a builtin inherits from its chain position.
/// Builtins run in the parent, so output has to be written to the pipe
/// end directly instead of through a redirected stdout.
pub struct BuiltinIo {
    #[allow(dead_code)]
    pub input: Option<RawFd>,
    pub output: Option<RawFd>,
}

impl BuiltinIo {
    pub fn write_out(&mut self, text: impl AsRef<str>) {
        let bytes = text.as_ref().as_bytes();
        let result = match self.output {
            Some(fd) => os::write_all(fd, bytes).map_err(|err| err.to_string()),
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(bytes)
                    .and_then(|_| stdout.flush())
                    .map_err(|err| err.to_string())
            }
        };
        if let Err(err) = result {
            eprintln!("vbls: {}", err);
        }
    }
}

pub trait BuiltinUtility {
    fn exec(&self, args: &[String], shell: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult;
}

struct BuiltinNull;

impl BuiltinUtility for BuiltinNull {
    fn exec(&self, _: &[String], _: &mut Shell, _: &mut BuiltinIo) -> BuiltinResult {
        Ok(0)
    }
}

struct Equals;

impl BuiltinUtility for Equals {
    fn exec(&self, args: &[String], _: &mut Shell, _: &mut BuiltinIo) -> BuiltinResult {
        if args.len() != 2 {
            return Err("equals: expected two operands".into());
        }
        Ok(if args[0] == args[1] { 0 } else { 1 })
    }
}

struct Builtins;

impl BuiltinUtility for Builtins {
    fn exec(&self, _: &[String], _: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult {
        let mut listing = String::new();
        for name in BUILTIN_NAMES {
            listing.push_str(name);
            listing.push('\n');
        }
        io.write_out(listing);
        Ok(0)
    }
}

pub const BUILTIN_NAMES: &[&str] = &[
    ":", ".", "alias", "builtins", "cd", "echo", "echo_nl", "equals", "exit", "printf", "set",
    "source", "umask", "unalias",
];

pub fn get_builtin_utility(name: &str) -> Option<&'static dyn BuiltinUtility> {
    match name {
        ":" => Some(&BuiltinNull),
        "." | "source" => Some(&Source),
        "alias" => Some(&Alias),
        "builtins" => Some(&Builtins),
        "cd" => Some(&Cd),
        "echo" => Some(&Echo),
        "echo_nl" => Some(&EchoNl),
        "equals" => Some(&Equals),
        "exit" => Some(&Exit),
        "printf" => Some(&Printf),
        "set" => Some(&Set),
        "umask" => Some(&Umask),
        "unalias" => Some(&Unalias),
        _ => None,
    }
}
