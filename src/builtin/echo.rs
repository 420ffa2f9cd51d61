use crate::builtin::{BuiltinIo, BuiltinResult, BuiltinUtility};
use crate::shell::Shell;

pub struct Echo;

impl BuiltinUtility for Echo {
    fn exec(&self, args: &[String], _: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult {
        io.write_out(format!("{}\n", args.join(" ")));
        Ok(0)
    }
}

/// Like `echo`, but one argument per line. `for` iteration is built on
/// this: the word list is turned into capturable lines.
pub struct EchoNl;

impl BuiltinUtility for EchoNl {
    fn exec(&self, args: &[String], _: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult {
        io.write_out(format!("{}\n", args.join("\n")));
        Ok(0)
    }
}
