//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{BuiltinError, BuiltinIo, BuiltinResult, BuiltinUtility};
use crate::modestr;
use crate::os;
use crate::shell::Shell;

fn parse_mask(mask: &str) -> Result<u32, String> {
    // a sign would parse as octal but means a symbolic clause went wrong
    if !mask.starts_with('+') && !mask.starts_with('-') {
        if let Ok(value) = u32::from_str_radix(mask, 8) {
            if value > 0o777 {
                return Err(format!("umask: invalid mask '{}'", mask));
            }
            return Ok(value);
        }
    }
    // symbolic modes describe the permissions that stay open
    let symbolic = modestr::parse(mask).map_err(|err| format!("umask: {}", err))?;
    let current_permissions = !os::current_umask() & 0o777;
    let permissions = modestr::mutate(current_permissions, &symbolic);
    Ok(!permissions & 0o777)
}

pub struct Umask;

impl BuiltinUtility for Umask {
    fn exec(&self, args: &[String], _: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult {
        let mut print_numeric = false;
        let mut mask_argument = None;
        for arg in args {
            match arg.as_str() {
                "-s" => print_numeric = true,
                mask if mask_argument.is_none() => mask_argument = Some(mask),
                _ => return Err("umask: too many arguments".into()),
            }
        }

        match mask_argument {
            None => {
                io.write_out(format!("{:04o}\n", os::current_umask()));
            }
            Some(mask) => {
                let new_mask = parse_mask(mask).map_err(BuiltinError::from)?;
                os::umask(new_mask);
                if print_numeric {
                    io.write_out(format!("{:04o}\n", new_mask));
                }
            }
        }
        Ok(0)
    }
}
