use crate::builtin::{BuiltinIo, BuiltinResult, BuiltinUtility};
use crate::os;
use crate::shell::Shell;

pub struct Cd;

impl BuiltinUtility for Cd {
    fn exec(&self, args: &[String], shell: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult {
        if args.len() > 1 {
            return Err("cd: too many arguments".into());
        }

        let mut print_destination = false;
        let requested = match args.first().map(|s| s.as_str()) {
            None => shell
                .environment
                .get("HOME")
                .ok_or("cd: HOME not set")?
                .to_string(),
            Some("-") => {
                print_destination = true;
                shell
                    .environment
                    .get("OLDPWD")
                    .ok_or("cd: OLDPWD not set")?
                    .to_string()
            }
            Some(directory) => directory.to_string(),
        };

        let old_pwd = shell
            .environment
            .get("PWD")
            .map(str::to_string)
            .unwrap_or_else(|| {
                std::env::current_dir()
                    .map(|dir| dir.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });

        // errors report the path the user asked for, not the resolved one
        let resolved = os::realpath(&requested)
            .map_err(|errno| format!("cd: {}: {}", requested, errno))?;
        os::chdir(resolved.as_os_str())
            .map_err(|errno| format!("cd: {}: {}", requested, errno))?;
        let new_pwd = resolved.to_string_lossy().into_owned();
        // the directory change succeeded, both variables move together
        shell.environment.set("OLDPWD", old_pwd);
        shell.environment.set("PWD", new_pwd.clone());

        if print_destination {
            io.write_out(format!("{}\n", new_pwd));
        }
        Ok(0)
    }
}
