use crate::shell::ShellOptions;

#[derive(Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    Interactive,
    ReadCommandsFromStdin,
    ReadCommandsFromString(String),
    ReadFromFile(String),
    ShowHelp,
    ShowVersion,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ShellArgs {
    pub execution_mode: ExecutionMode,
    pub program_name: String,
    /// positional parameters `$1`, `$2`, ...
    pub arguments: Vec<String>,
    pub set_options: ShellOptions,
    pub is_login: bool,
}

pub fn parse_args(args: Vec<String>, is_attached_to_terminal: bool) -> Result<ShellArgs, String> {
    let mut iter = args.into_iter();
    let program_name = iter.next().unwrap_or_else(|| "vbls".to_string());
    let mut set_options = ShellOptions::default();
    let mut is_login = false;
    let mut command_string = None;
    let mut positionals: Vec<String> = Vec::new();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                return Ok(ShellArgs {
                    execution_mode: ExecutionMode::ShowHelp,
                    program_name,
                    arguments: Vec::new(),
                    set_options,
                    is_login,
                });
            }
            "-v" | "--version" => {
                return Ok(ShellArgs {
                    execution_mode: ExecutionMode::ShowVersion,
                    program_name,
                    arguments: Vec::new(),
                    set_options,
                    is_login,
                });
            }
            "-c" => {
                command_string = Some(iter.next().ok_or("-c requires an argument")?);
            }
            "--login" => is_login = true,
            "--" => break,
            option if option.starts_with('-') && option.len() > 1 => {
                for flag in option[1..].chars() {
                    match flag {
                        'e' => set_options.errexit = true,
                        'x' => set_options.showcommands = true,
                        other => return Err(format!("invalid option -{}", other)),
                    }
                }
            }
            _ => {
                positionals.push(arg);
                break;
            }
        }
    }
    positionals.extend(iter);

    let execution_mode = if let Some(command_string) = command_string {
        ExecutionMode::ReadCommandsFromString(command_string)
    } else if let Some(script) = (!positionals.is_empty()).then(|| positionals.remove(0)) {
        ExecutionMode::ReadFromFile(script)
    } else if is_attached_to_terminal {
        ExecutionMode::Interactive
    } else {
        ExecutionMode::ReadCommandsFromStdin
    };

    Ok(ShellArgs {
        execution_mode,
        program_name,
        arguments: positionals,
        set_options,
        is_login,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: Vec<&str>, is_attached_to_terminal: bool) -> ShellArgs {
        let args = args.iter().map(|s| s.to_string()).collect();
        parse_args(args, is_attached_to_terminal).expect("could not parse args")
    }

    #[test]
    fn no_arguments_on_a_terminal_is_interactive() {
        let parsed = parse(vec!["vbls"], true);
        assert_eq!(parsed.execution_mode, ExecutionMode::Interactive);
        assert!(parsed.arguments.is_empty());
    }

    #[test]
    fn no_arguments_without_a_terminal_reads_stdin() {
        let parsed = parse(vec!["vbls"], false);
        assert_eq!(parsed.execution_mode, ExecutionMode::ReadCommandsFromStdin);
    }

    #[test]
    fn command_string_mode() {
        let parsed = parse(vec!["vbls", "-c", "echo hi", "a", "b"], true);
        assert_eq!(
            parsed.execution_mode,
            ExecutionMode::ReadCommandsFromString("echo hi".to_string())
        );
        assert_eq!(parsed.arguments, vec!["a", "b"]);
    }

    #[test]
    fn script_mode_with_arguments() {
        let parsed = parse(vec!["vbls", "script.vbls", "one", "two"], true);
        assert_eq!(
            parsed.execution_mode,
            ExecutionMode::ReadFromFile("script.vbls".to_string())
        );
        assert_eq!(parsed.arguments, vec!["one", "two"]);
        assert_eq!(parsed.program_name, "vbls");
    }

    #[test]
    fn option_flags() {
        let parsed = parse(vec!["vbls", "-e", "-x", "--login"], true);
        assert!(parsed.set_options.errexit);
        assert!(parsed.set_options.showcommands);
        assert!(parsed.is_login);

        let parsed = parse(vec!["vbls", "-ex"], true);
        assert!(parsed.set_options.errexit);
        assert!(parsed.set_options.showcommands);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(
            parse(vec!["vbls", "--help"], true).execution_mode,
            ExecutionMode::ShowHelp
        );
        assert_eq!(
            parse(vec!["vbls", "-v"], true).execution_mode,
            ExecutionMode::ShowVersion
        );
    }

    #[test]
    fn options_after_script_are_positional() {
        let parsed = parse(vec!["vbls", "script", "-e"], true);
        assert_eq!(
            parsed.execution_mode,
            ExecutionMode::ReadFromFile("script".to_string())
        );
        assert_eq!(parsed.arguments, vec!["-e"]);
    }

    #[test]
    fn missing_command_string_is_an_error() {
        let args = vec!["vbls".to_string(), "-c".to_string()];
        assert!(parse_args(args, true).is_err());
    }
}
