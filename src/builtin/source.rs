use crate::builtin::{BuiltinIo, BuiltinResult, BuiltinUtility};
use crate::shell::Shell;

pub struct Source;

impl BuiltinUtility for Source {
    fn exec(&self, args: &[String], shell: &mut Shell, _: &mut BuiltinIo) -> BuiltinResult {
        let path = match args {
            [path] => path,
            _ => return Err("source: expected a file path".into()),
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|err| format!("source: {}: {}", path, err))?;
        Ok(if shell.eval_chunk(&contents) { 0 } else { 1 })
    }
}
