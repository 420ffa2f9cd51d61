//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::cli::args::{parse_args, ExecutionMode};
use crate::cli::terminal::{is_attached_to_terminal, read_nonblocking_char, Terminal};
use crate::cli::{clear_line, set_cursor_pos};
use crate::os::signals::setup_interactive_signals;
use crate::os::{getpgrp, is_process_in_foreground, tcsetpgrp};
use crate::shell::Shell;
use gettextrs::{bind_textdomain_codeset, setlocale, textdomain, LocaleCategory};
use std::error::Error;
use std::io;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

mod builtin;
mod cli;
mod lexer;
mod modestr;
mod os;
mod shell;
mod wordexp;

const USAGE: &str = "\
usage: vbls [options] [script [arguments...]]

options:
  -h, --help     print this message and exit
  -v, --version  print the version and exit
  -c STRING      evaluate STRING and exit
  --login        act as a login shell
  -e             exit on the first failing command
  -x             print each command before executing it
";

fn source_if_present(shell: &mut Shell, path: &Path) {
    if !path.is_file() {
        return;
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            shell.eval_chunk(&contents);
        }
        Err(err) => eprintln!("vbls: {}: {}", path.to_string_lossy(), err),
    }
}

fn source_startup_files(shell: &mut Shell, is_login: bool) {
    source_if_present(shell, Path::new("/etc/profile"));
    let home = match shell.environment.get("HOME") {
        Some(home) => home.to_string(),
        None => return,
    };
    if is_login {
        source_if_present(shell, &Path::new(&home).join(".profile"));
    } else {
        source_if_present(shell, &Path::new(&home).join(".vblsrc"));
    }
}

fn flush_stdout() {
    // if this basic operation fails there is nothing left to do
    io::stdout().flush().expect("could not flush stdout");
}

fn redraw_line(prompt: &str, line_buffer: &[u8]) {
    clear_line();
    print!("{}", prompt);
    io::stdout()
        .write_all(line_buffer)
        .expect("failed to write to stdout");
    set_cursor_pos(prompt.len() + line_buffer.len());
    flush_stdout();
}

fn interactive_shell(shell: &mut Shell, is_login: bool) -> ! {
    if is_process_in_foreground() {
        let _ = tcsetpgrp(libc::STDIN_FILENO, getpgrp());
    }
    unsafe { setup_interactive_signals() }
    source_startup_files(shell, is_login);

    let terminal = Terminal::default();
    terminal.set_nonblocking_no_echo();
    let mut line_buffer: Vec<u8> = Vec::new();
    let mut prompt = shell.get_ps1();
    redraw_line(&prompt, &line_buffer);
    loop {
        while let Some(c) = read_nonblocking_char() {
            match c {
                b'\x7F' => {
                    line_buffer.pop();
                }
                b'\x04' => {
                    // EOF
                    println!();
                    terminal.reset();
                    shell.exit(shell.last_pipeline_exit_status);
                }
                b'\n' => {
                    println!();
                    terminal.reset();
                    match String::from_utf8(std::mem::take(&mut line_buffer)) {
                        Ok(line) => {
                            if !line.trim().is_empty() {
                                shell.history.add_entry(line.clone());
                            }
                            shell.eval_chunk(&line);
                        }
                        Err(_) => eprintln!("vbls: invalid utf-8 sequence"),
                    }
                    terminal.set_nonblocking_no_echo();
                    prompt = shell.get_ps1();
                }
                other if !other.is_ascii_control() => {
                    line_buffer.push(other);
                }
                _ => {}
            }
            redraw_line(&prompt, &line_buffer);
        }
        std::thread::sleep(Duration::from_millis(16));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    setlocale(LocaleCategory::LcAll, "");
    textdomain("vbls")?;
    bind_textdomain_codeset("vbls", "UTF-8")?;

    let args = match parse_args(std::env::args().collect(), is_attached_to_terminal()) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("vbls: {}", err);
            std::process::exit(2);
        }
    };

    match args.execution_mode {
        ExecutionMode::ShowHelp => {
            print!("{}", USAGE);
            return Ok(());
        }
        ExecutionMode::ShowVersion => {
            println!("vbls {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let is_interactive = args.execution_mode == ExecutionMode::Interactive;
    let mut shell = Shell::initialize_from_system(
        args.program_name,
        args.arguments,
        args.set_options,
        is_interactive,
        args.is_login,
    );
    match args.execution_mode {
        ExecutionMode::Interactive => interactive_shell(&mut shell, args.is_login),
        ExecutionMode::ReadCommandsFromString(command_string) => {
            shell.eval_chunk(&command_string);
        }
        ExecutionMode::ReadFromFile(file) => match std::fs::read_to_string(&file) {
            Ok(contents) => {
                shell.eval_chunk(&contents);
            }
            Err(err) => {
                eprintln!("vbls: {}: {}", file, err);
                std::process::exit(1);
            }
        },
        ExecutionMode::ReadCommandsFromStdin => {
            let mut buffer = String::new();
            while io::stdin().read_line(&mut buffer).is_ok_and(|n| n > 0) {
                shell.eval_chunk(&buffer);
                buffer.clear();
            }
        }
        _ => unreachable!(),
    }
    shell.exit(shell.last_pipeline_exit_status)
}
