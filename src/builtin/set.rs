use crate::builtin::{BuiltinIo, BuiltinResult, BuiltinUtility};
use crate::shell::environment::render_value;
use crate::shell::Shell;

pub struct Set;

impl BuiltinUtility for Set {
    fn exec(&self, args: &[String], shell: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult {
        if args.is_empty() {
            let mut listing = String::new();
            for (name, value) in shell.environment.sorted() {
                listing.push_str(&format!("{}={}\n", name, render_value(value)));
            }
            io.write_out(listing);
            return Ok(0);
        }

        // -n inverts the options that follow it
        let mut enable = true;
        let mut positionals = Vec::new();
        for arg in args {
            match arg.as_str() {
                "--errexit" => shell.options.errexit = enable,
                "--showcommand" | "--showcommands" => shell.options.showcommands = enable,
                "--cachepaths" => shell.options.cachepaths = enable,
                other if other.starts_with("--") => {
                    return Err(format!("set: invalid option {}", other).into());
                }
                other if other.starts_with('-') && other.len() > 1 => {
                    for flag in other[1..].chars() {
                        match flag {
                            'e' => shell.options.errexit = enable,
                            'x' => shell.options.showcommands = enable,
                            'n' => enable = false,
                            other => {
                                return Err(format!("set: invalid option -{}", other).into());
                            }
                        }
                    }
                }
                _ => positionals.push(arg.clone()),
            }
        }

        match positionals.len() {
            0 => Ok(0),
            1 => Err(format!("set: expected a value for '{}'", positionals[0]).into()),
            _ => {
                let value = positionals[1..].join(" ");
                shell.environment.set(positionals[0].clone(), value);
                Ok(0)
            }
        }
    }
}
