use crate::builtin::{get_builtin_utility, BuiltinIo};
use crate::lexer::{tokenize, Token};
use crate::os::{self, ExecError, ForkResult, OsError};
use crate::shell::environment::Environment;
use crate::shell::history::{initialize_history, History};
use crate::shell::prompt::{expand_prompt, DEFAULT_PS1};
use crate::wordexp::{expand_words, split_captured_lines};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::os::fd::{AsRawFd, OwnedFd};

pub mod environment;
pub mod history;
pub mod prompt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    pub errexit: bool,
    pub showcommands: bool,
    pub cachepaths: bool,
}

#[derive(Debug)]
pub enum ShellError {
    Parse(String),
    CommandNotFound(String),
    Os(OsError),
}

impl From<OsError> for ShellError {
    fn from(value: OsError) -> Self {
        Self::Os(value)
    }
}

impl Display for ShellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::Parse(message) => f.write_str(message),
            ShellError::CommandNotFound(name) => write!(f, "{}: command not found", name),
            ShellError::Os(err) => write!(f, "{}", err),
        }
    }
}

/// The current evaluation scope ended early. Whatever caused it was
/// already reported (or was a plain non-zero status, which reports
/// itself through the failing command).
pub struct ScopeEnd;

type EvalResult<T> = Result<T, ScopeEnd>;

/// Hands the capture buffer down one recursion level without giving up
/// this frame's borrow.
fn reborrow<'a>(capture: &'a mut Option<&mut String>) -> Option<&'a mut String> {
    capture.as_mut().map(|buffer| &mut **buffer)
}

struct ChainElement {
    words: Vec<String>,
    operator: Option<Token>,
}

pub struct Shell {
    pub environment: Environment,
    pub alias_table: BTreeMap<String, String>,
    pub options: ShellOptions,
    pub history: History,
    pub is_interactive: bool,
    pub last_pipeline_exit_status: i32,
    command_path_cache: HashMap<String, String>,
}

impl Shell {
    pub fn initialize_from_system(
        program_name: String,
        arguments: Vec<String>,
        options: ShellOptions,
        is_interactive: bool,
        is_login: bool,
    ) -> Shell {
        let mut environment = Environment::from(std::env::vars());

        if environment.get("HOME").is_none() {
            let home = if is_login {
                os::passwd_home_dir().unwrap_or_else(|| "/".to_string())
            } else {
                "/".to_string()
            };
            environment.set("HOME", home);
        }
        let shlvl = environment
            .get("SHLVL")
            .and_then(|lvl| lvl.parse::<i32>().ok())
            .unwrap_or(0);
        environment.set("SHLVL", (shlvl + 1).to_string());
        environment.set("VBLS_VERSION", env!("CARGO_PKG_VERSION"));
        if let Ok(cwd) = std::env::current_dir() {
            environment.set("PWD", cwd.to_string_lossy().into_owned());
        }
        environment.set("0", program_name);
        for (position, argument) in arguments.into_iter().enumerate() {
            environment.set((position + 1).to_string(), argument);
        }

        let history = if is_interactive {
            initialize_history(environment.get("HOME"))
        } else {
            History::default()
        };

        Shell {
            environment,
            alias_table: BTreeMap::new(),
            options,
            history,
            is_interactive,
            last_pipeline_exit_status: 0,
            command_path_cache: HashMap::new(),
        }
    }

    pub fn get_ps1(&self) -> String {
        let ps1 = self.environment.get("PS1").unwrap_or(DEFAULT_PS1);
        expand_prompt(ps1, &self.environment, env!("CARGO_PKG_VERSION"))
    }

    /// Flushes interactive state and terminates the process.
    pub fn exit(&self, status: i32) -> ! {
        if self.is_interactive {
            self.history.save();
        }
        std::process::exit(status)
    }

    fn report_error(&self, message: impl Display) {
        eprintln!("vbls: {}", message);
    }

    /// Evaluates one chunk of input. Returns false if evaluation was cut
    /// short by an error or a failing command.
    pub fn eval_chunk(&mut self, chunk: &str) -> bool {
        let chunk = chunk.trim_start_matches(' ');
        if chunk.is_empty() {
            return true;
        }
        let tokens = match tokenize(chunk) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.report_error(err);
                return false;
            }
        };
        self.eval_tokens(&tokens, None).is_ok()
    }

    /// Evaluates the text of a `$(...)` span and returns whatever it
    /// captured. Failures inside the substitution are reported at the
    /// point they occur; the capture keeps what was produced up to then.
    pub fn eval_substitution(&mut self, chunk: &str) -> String {
        match tokenize(chunk) {
            Err(err) => {
                self.report_error(err);
                String::new()
            }
            Ok(tokens) => {
                let mut captured = String::new();
                let _ = self.eval_tokens(&tokens, Some(&mut captured));
                captured
            }
        }
    }

    fn parse_error<T>(&self, message: impl Display) -> EvalResult<T> {
        self.report_error(message);
        Err(ScopeEnd)
    }

    // ---- evaluator ---------------------------------------------------

    fn eval_tokens(
        &mut self,
        tokens: &[Token],
        mut capture: Option<&mut String>,
    ) -> EvalResult<()> {
        let mut command: Vec<Token> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::If | Token::ElseIf => {
                    i = self.eval_if(tokens, i, reborrow(&mut capture))?;
                }
                Token::For => {
                    i = self.eval_for(tokens, i, reborrow(&mut capture))?;
                }
                Token::While => {
                    return self.parse_error("'while' is not implemented");
                }
                keyword @ (Token::Else | Token::Then | Token::In | Token::Do | Token::End) => {
                    return self.parse_error(format!("unexpected '{}'", keyword));
                }
                Token::Semi => {
                    if command.is_empty() {
                        return self.parse_error("unexpected ';'");
                    }
                    self.finish_command(&mut command, reborrow(&mut capture))?;
                    i += 1;
                }
                Token::Newline => {
                    if !command.is_empty() {
                        self.finish_command(&mut command, reborrow(&mut capture))?;
                    }
                    i += 1;
                }
                token => {
                    self.push_command_token(&mut command, token.clone());
                    i += 1;
                }
            }
        }
        if !command.is_empty() {
            self.finish_command(&mut command, capture)?;
        }
        Ok(())
    }

    /// Appends a token to the command under construction, expanding an
    /// alias when the token is the first word of a command. Alias values
    /// are re-tokenized but not expanded again.
    fn push_command_token(&mut self, command: &mut Vec<Token>, token: Token) {
        if let Token::Word(word) = &token {
            let starts_command =
                command.is_empty() || command.last().is_some_and(|t| t.is_operator());
            if starts_command {
                if let Some(replacement) = self.alias_table.get(word) {
                    if let Ok(replacement_tokens) = tokenize(replacement) {
                        command.extend(replacement_tokens);
                        return;
                    }
                }
            }
        }
        command.push(token);
    }

    fn finish_command(
        &mut self,
        command: &mut Vec<Token>,
        capture: Option<&mut String>,
    ) -> EvalResult<()> {
        let tokens = std::mem::take(command);
        match self.execute_chain(&tokens, capture.is_some()) {
            Ok((status, output)) => {
                if let Some(buffer) = capture {
                    buffer.push_str(&output);
                }
                self.last_pipeline_exit_status = status;
                if status != 0 {
                    if self.options.errexit {
                        self.exit(1);
                    }
                    return Err(ScopeEnd);
                }
                Ok(())
            }
            Err(err) => {
                self.report_error(&err);
                self.last_pipeline_exit_status = match err {
                    ShellError::CommandNotFound(_) => 127,
                    _ => 1,
                };
                if self.options.errexit {
                    self.exit(1);
                }
                Err(ScopeEnd)
            }
        }
    }

    /// Runs a chain outside the main command loop (conditions, `for`
    /// lists), reporting errors but leaving `errexit` to the main loop.
    fn run_chain(&mut self, tokens: &[Token], capture: bool) -> EvalResult<(i32, String)> {
        match self.execute_chain(tokens, capture) {
            Ok(result) => Ok(result),
            Err(err) => {
                self.report_error(&err);
                Err(ScopeEnd)
            }
        }
    }

    /// Collects tokens until (and not including) `target`, returning the
    /// buffer and the index just past `target`.
    fn read_to(
        &mut self,
        tokens: &[Token],
        start: usize,
        target: &Token,
    ) -> EvalResult<(Vec<Token>, usize)> {
        let mut collected = Vec::new();
        let mut i = start;
        while i < tokens.len() {
            if &tokens[i] == target {
                return Ok((collected, i + 1));
            }
            collected.push(tokens[i].clone());
            i += 1;
        }
        self.parse_error(format!("expected '{}'", target))
    }

    /// Advances through a block, tracking nesting: `if`/`for`/`while`
    /// open a level, `end` closes one. Stops at the first target keyword
    /// on the current level and returns the skipped tokens (without the
    /// stopping keyword), the index just past it, and which keyword it
    /// was.
    fn seek_balanced(
        &mut self,
        tokens: &[Token],
        start: usize,
        targets: &[Token],
    ) -> EvalResult<(Vec<Token>, usize, Token)> {
        let mut level = 1u32;
        let mut collected = Vec::new();
        let mut i = start;
        while i < tokens.len() {
            let token = &tokens[i];
            match token {
                Token::If | Token::For | Token::While => level += 1,
                Token::End => {
                    if level == 1 {
                        // targets always include `end`
                        return Ok((collected, i + 1, Token::End));
                    }
                    level -= 1;
                }
                other if level == 1 && targets.contains(other) => {
                    return Ok((collected, i + 1, other.clone()));
                }
                _ => {}
            }
            collected.push(token.clone());
            i += 1;
        }
        self.parse_error("unbalanced block")
    }

    /// Evaluates `if`/`elseif` starting at the keyword. Returns the index
    /// of the next token to process.
    fn eval_if(
        &mut self,
        tokens: &[Token],
        keyword_index: usize,
        mut capture: Option<&mut String>,
    ) -> EvalResult<usize> {
        let (condition, block_start) = self.read_to(tokens, keyword_index + 1, &Token::Then)?;
        // capture keeps the condition's output in the shell, only its
        // status picks the branch
        let (status, _) = self.run_chain(&condition, true)?;
        let branch_targets = [Token::Else, Token::ElseIf, Token::End];
        if status == 0 {
            let (block, after, stop) = self.seek_balanced(tokens, block_start, &branch_targets)?;
            self.eval_tokens(&block, reborrow(&mut capture))?;
            if stop == Token::End {
                Ok(after)
            } else {
                let (_, end, _) = self.seek_balanced(tokens, after, &[Token::End])?;
                Ok(end)
            }
        } else {
            let (_, after, stop) = self.seek_balanced(tokens, block_start, &branch_targets)?;
            match stop {
                Token::End => Ok(after),
                Token::Else => {
                    let (block, end, _) = self.seek_balanced(tokens, after, &[Token::End])?;
                    self.eval_tokens(&block, capture)?;
                    Ok(end)
                }
                // step back so the main loop re-enters at the `elseif`
                Token::ElseIf => Ok(after - 1),
                _ => unreachable!("seek stopped at a non-target token"),
            }
        }
    }

    /// Evaluates `for VAR in LIST...; do BODY; end` starting at `for`.
    fn eval_for(
        &mut self,
        tokens: &[Token],
        keyword_index: usize,
        mut capture: Option<&mut String>,
    ) -> EvalResult<usize> {
        let (header, body_start) = self.read_to(tokens, keyword_index + 1, &Token::Do)?;
        let variable = match header.first() {
            Some(Token::Word(name)) if matches!(header.get(1), Some(Token::In)) => name.clone(),
            _ => return self.parse_error("expected 'for VAR in LIST'"),
        };
        // the list is run through echo_nl so plain word lists iterate,
        // not just commands that produce output
        let mut list_chain = vec![Token::Word("echo_nl".to_string())];
        list_chain.extend_from_slice(&header[2..]);
        let (_, output) = self.run_chain(&list_chain, true)?;
        let (body, after, _) = self.seek_balanced(tokens, body_start, &[Token::End])?;

        let saved = self.environment.get(&variable).map(str::to_string);
        for item in split_captured_lines(&output) {
            self.environment.set(variable.clone(), item);
            if self.eval_tokens(&body, reborrow(&mut capture)).is_err() {
                break;
            }
        }
        match saved {
            Some(value) => self.environment.set(variable, value),
            None => {
                self.environment.unset(&variable);
            }
        }
        Ok(after)
    }

    // ---- chain & command execution -----------------------------------

    fn split_chain(&self, tokens: &[Token]) -> Result<Vec<ChainElement>, ShellError> {
        let mut elements = Vec::new();
        let mut words = Vec::new();
        for token in tokens {
            match token {
                Token::Word(word) => words.push(word.clone()),
                Token::Pipe | Token::AndIf | Token::OrIf => {
                    if words.is_empty() {
                        return Err(ShellError::Parse(format!("unexpected '{}'", token)));
                    }
                    elements.push(ChainElement {
                        words: std::mem::take(&mut words),
                        operator: Some(token.clone()),
                    });
                }
                Token::Newline => {}
                // separators and keywords spliced in by alias expansion
                // travel as plain words; expansion strips stray `;`
                other => words.push(other.text().to_string()),
            }
        }
        if !words.is_empty() {
            elements.push(ChainElement {
                words,
                operator: None,
            });
        }
        Ok(elements)
    }

    /// Executes one command chain. With `capture` set, the last element's
    /// standard output is collected and returned alongside the status.
    fn execute_chain(
        &mut self,
        tokens: &[Token],
        capture: bool,
    ) -> Result<(i32, String), ShellError> {
        let elements = self.split_chain(tokens)?;
        if elements.is_empty() {
            return Ok((0, String::new()));
        }
        let last_index = elements.len() - 1;

        let (capture_read, mut capture_write) = if capture {
            let (read_end, write_end) = os::pipe()?;
            (Some(read_end), Some(write_end))
        } else {
            (None, None)
        };

        let mut status = 0;
        let mut previous_read: Option<OwnedFd> = None;
        let mut skipping = false;
        for (index, element) in elements.iter().enumerate() {
            if !skipping {
                let argv = expand_words(&element.words, self);
                let mut next_read = None;
                let output = if element.operator == Some(Token::Pipe) {
                    let (read_end, write_end) = os::pipe()?;
                    next_read = Some(read_end);
                    Some(write_end)
                } else if index == last_index {
                    capture_write.take()
                } else {
                    None
                };
                if argv.is_empty() {
                    // every word of this element expanded away
                    drop(output);
                    previous_read = next_read;
                } else {
                    status = self.execute_command(&argv, previous_read.take(), output)?;
                    previous_read = next_read;
                }
            }
            skipping = match element.operator {
                // a skipped pipeline stays skipped to its end
                Some(Token::Pipe) => skipping,
                Some(Token::AndIf) => status != 0,
                Some(Token::OrIf) => status == 0,
                _ => false,
            };
        }
        drop(previous_read);

        let mut output = String::new();
        if let Some(read_end) = capture_read {
            drop(capture_write);
            let mut buffer = [0u8; 2048];
            loop {
                let bytes_read = os::read(read_end.as_raw_fd(), &mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                output.push_str(&String::from_utf8_lossy(&buffer[..bytes_read]));
            }
        }
        Ok((status, output))
    }

    fn find_command(&mut self, name: &str) -> Result<String, ShellError> {
        if name.contains('/') {
            return Ok(name.to_string());
        }
        if self.options.cachepaths {
            if let Some(path) = self.command_path_cache.get(name) {
                return Ok(path.clone());
            }
        }
        let env_path = self.environment.get("PATH").unwrap_or(os::DEFAULT_PATH);
        match os::find_in_path(name, env_path) {
            Some(path) => {
                if self.options.cachepaths {
                    self.command_path_cache
                        .insert(name.to_string(), path.clone());
                }
                Ok(path)
            }
            None => Err(ShellError::CommandNotFound(name.to_string())),
        }
    }

    /// Runs one expanded command: builtins in the parent, everything else
    /// through fork/exec. The fds passed in are owned here and are closed
    /// on every path once the child holds its duplicates.
    fn execute_command(
        &mut self,
        argv: &[String],
        input: Option<OwnedFd>,
        output: Option<OwnedFd>,
    ) -> Result<i32, ShellError> {
        if self.options.showcommands {
            eprintln!("+ '{} '", argv.join(" "));
        }

        if let Some(builtin) = get_builtin_utility(&argv[0]) {
            let mut io = BuiltinIo {
                input: input.as_ref().map(|fd| fd.as_raw_fd()),
                output: output.as_ref().map(|fd| fd.as_raw_fd()),
            };
            return Ok(match builtin.exec(&argv[1..], self, &mut io) {
                Ok(status) => status,
                Err(err) => {
                    self.report_error(err);
                    1
                }
            });
        }

        let path = self.find_command(&argv[0])?;
        match os::fork()? {
            ForkResult::Child => {
                if let Some(fd) = &input {
                    let _ = os::dup2(fd.as_raw_fd(), libc::STDIN_FILENO);
                }
                if let Some(fd) = &output {
                    let _ = os::dup2(fd.as_raw_fd(), libc::STDOUT_FILENO);
                }
                if self.is_interactive {
                    let pid = os::getpid();
                    let _ = os::setpgid(pid, pid);
                    let _ = os::tcsetpgrp(libc::STDIN_FILENO, pid);
                }
                let env = self.environment.as_execve_image();
                let err = os::exec(&path, argv, &env).unwrap_err();
                match err {
                    ExecError::CannotExecute(errno) => {
                        eprintln!("vbls: {}: {}", path, errno);
                        std::process::exit(errno.value());
                    }
                    ExecError::OsError(err) => {
                        eprintln!("vbls: {}", err);
                        std::process::exit(1);
                    }
                }
            }
            ForkResult::Parent { child } => {
                drop(input);
                drop(output);
                let status = os::waitpid(child);
                if self.is_interactive {
                    let _ = os::tcsetpgrp(libc::STDIN_FILENO, os::getpgrp());
                }
                Ok(status?)
            }
        }
    }
}
