use crate::builtin::{BuiltinIo, BuiltinResult, BuiltinUtility};
use crate::shell::Shell;

pub struct Exit;

impl BuiltinUtility for Exit {
    fn exec(&self, args: &[String], shell: &mut Shell, _: &mut BuiltinIo) -> BuiltinResult {
        let status = match args {
            [] => 0,
            [status] => status
                .parse::<i32>()
                .map_err(|_| format!("exit: invalid number '{}'", status))?,
            _ => return Err("exit: too many arguments".into()),
        };
        shell.exit(status)
    }
}
