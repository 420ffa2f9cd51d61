use crate::builtin::{BuiltinIo, BuiltinResult, BuiltinUtility};
use crate::shell::Shell;

pub struct Alias;

impl BuiltinUtility for Alias {
    fn exec(&self, args: &[String], shell: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult {
        match args {
            [] => {
                let mut listing = String::new();
                for (alias, replacement) in &shell.alias_table {
                    listing.push_str(&format!("{}='{}'\n", alias, replacement));
                }
                io.write_out(listing);
                Ok(0)
            }
            [name] => {
                if let Some(replacement) = shell.alias_table.get(name) {
                    io.write_out(format!("{}='{}'\n", name, replacement));
                    Ok(0)
                } else {
                    Err(format!("alias: {}: not found", name).into())
                }
            }
            [name, replacement] => {
                shell
                    .alias_table
                    .insert(name.clone(), replacement.clone());
                Ok(0)
            }
            _ => Err("alias: too many arguments".into()),
        }
    }
}

pub struct Unalias;

impl BuiltinUtility for Unalias {
    fn exec(&self, args: &[String], shell: &mut Shell, _: &mut BuiltinIo) -> BuiltinResult {
        match args {
            [name] => {
                if shell.alias_table.remove(name).is_none() {
                    return Err(format!("unalias: {}: not found", name).into());
                }
                Ok(0)
            }
            _ => Err("unalias: expected an alias name".into()),
        }
    }
}
