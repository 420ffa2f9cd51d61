//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::os::errno::Errno;
use std::convert::Infallible;
use std::ffi::{CStr, CString, OsStr};
use std::fmt::{Display, Formatter};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

pub mod errno;
pub mod signals;

/// Search path used when `PATH` is unset.
pub const DEFAULT_PATH: &str = "/bin:/sbin:/usr/bin";

pub type Pid = libc::pid_t;

#[derive(Clone, Debug)]
pub struct OsError {
    pub call: &'static str,
    pub errno: Errno,
}

impl OsError {
    pub fn from_current_errno(call: &'static str) -> Self {
        Self {
            call,
            errno: Errno::current(),
        }
    }
}

impl Display for OsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "internal call to {} failed ({})", self.call, self.errno)
    }
}

pub type OsResult<T> = Result<T, OsError>;
pub type LibcResult<T> = Result<T, Errno>;

pub fn getpid() -> Pid {
    // always successful
    unsafe { libc::getpid() }
}

pub fn getpgrp() -> Pid {
    // always successful
    unsafe { libc::getpgrp() }
}

pub fn write(fd: RawFd, bytes: &[u8]) -> OsResult<usize> {
    let bytes_written = unsafe {
        libc::write(
            fd as libc::c_int,
            bytes.as_ptr() as *const libc::c_void,
            bytes.len(),
        )
    };
    if bytes_written < 0 {
        return Err(OsError::from_current_errno("write"));
    }
    Ok(bytes_written as usize)
}

pub fn write_all(fd: RawFd, mut bytes: &[u8]) -> OsResult<()> {
    while !bytes.is_empty() {
        let written = write(fd, bytes)?;
        bytes = &bytes[written..];
    }
    Ok(())
}

pub fn read(fd: RawFd, buf: &mut [u8]) -> OsResult<usize> {
    let bytes_read = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
    if bytes_read < 0 {
        return Err(OsError::from_current_errno("read"));
    }
    Ok(bytes_read as usize)
}

pub enum ForkResult {
    Child,
    Parent { child: Pid },
}

pub fn fork() -> OsResult<ForkResult> {
    // fork in general is not safe for multithreaded programs, but the
    // shell is single threaded, so this is safe
    let fork_result = unsafe { libc::fork() };
    if fork_result < 0 {
        Err(OsError::from_current_errno("fork"))
    } else if fork_result == 0 {
        Ok(ForkResult::Child)
    } else {
        Ok(ForkResult::Parent { child: fork_result })
    }
}

pub fn pipe() -> OsResult<(OwnedFd, OwnedFd)> {
    let mut descriptors = [libc::c_int::default(); 2];
    let pipe_result = unsafe { libc::pipe(descriptors.as_mut_ptr()) };
    if pipe_result < 0 {
        return Err(OsError::from_current_errno("pipe"));
    }
    let read_end = unsafe { OwnedFd::from_raw_fd(descriptors[0]) };
    let write_end = unsafe { OwnedFd::from_raw_fd(descriptors[1]) };
    Ok((read_end, write_end))
}

pub fn dup2(old_fd: RawFd, new_fd: RawFd) -> OsResult<RawFd> {
    let dup_result = unsafe { libc::dup2(old_fd, new_fd) };
    if dup_result < 0 {
        return Err(OsError::from_current_errno("dup2"));
    }
    Ok(dup_result)
}

/// Waits for `pid` and folds the wait status into a single exit status,
/// with termination by signal reported as `128 + signal`.
pub fn waitpid(pid: Pid) -> OsResult<i32> {
    let mut status = 0;
    loop {
        let wait_result = unsafe { libc::waitpid(pid, &mut status, 0) };
        if wait_result < 0 {
            let err = OsError::from_current_errno("waitpid");
            if err.errno.value() == libc::EINTR {
                continue;
            }
            return Err(err);
        }
        break;
    }
    if libc::WIFEXITED(status) {
        Ok(libc::WEXITSTATUS(status))
    } else if libc::WIFSIGNALED(status) {
        Ok(128 + libc::WTERMSIG(status))
    } else {
        Ok(status)
    }
}

pub enum ExecError {
    OsError(OsError),
    CannotExecute(Errno),
}

impl From<OsError> for ExecError {
    fn from(value: OsError) -> Self {
        Self::OsError(value)
    }
}

/// Replaces the current process image. `env` holds `NAME=value` pairs.
/// Only returns on failure.
pub fn exec(command: &str, args: &[String], env: &[String]) -> Result<Infallible, ExecError> {
    let command = CString::new(command).expect("command contains null characters");
    let args = args
        .iter()
        .map(|s| CString::new(s.as_str()).expect("argument contains null characters"))
        .collect::<Vec<_>>();
    let mut args_ptr_vec = args.iter().map(|s| s.as_ptr()).collect::<Vec<_>>();
    args_ptr_vec.push(std::ptr::null());
    let env = env
        .iter()
        .map(|s| CString::new(s.as_str()).expect("variable contains null characters"))
        .collect::<Vec<_>>();
    let mut env_ptr_vec = env.iter().map(|s| s.as_ptr()).collect::<Vec<_>>();
    env_ptr_vec.push(std::ptr::null());
    let exit_status = unsafe {
        libc::execve(
            command.as_ptr(),
            args_ptr_vec.as_ptr(),
            env_ptr_vec.as_ptr(),
        )
    };
    assert_eq!(exit_status, -1, "invalid return status from execve");
    Err(ExecError::CannotExecute(Errno::current()))
}

pub fn tcgetpgrp(fd: RawFd) -> OsResult<Pid> {
    let group_id = unsafe { libc::tcgetpgrp(fd) };
    if group_id < 0 {
        return Err(OsError::from_current_errno("tcgetpgrp"));
    }
    Ok(group_id)
}

pub fn tcsetpgrp(fd: RawFd, pgid: Pid) -> OsResult<()> {
    let result = unsafe { libc::tcsetpgrp(fd, pgid) };
    if result < 0 {
        return Err(OsError::from_current_errno("tcsetpgrp"));
    }
    Ok(())
}

pub fn setpgid(pid: Pid, pgid: Pid) -> OsResult<()> {
    let result = unsafe { libc::setpgid(pid, pgid) };
    if result < 0 {
        return Err(OsError::from_current_errno("setpgid"));
    }
    Ok(())
}

pub fn is_process_in_foreground() -> bool {
    if let Ok(pgid) = tcgetpgrp(io::stdin().as_raw_fd()) {
        pgid == getpgrp()
    } else {
        false
    }
}

pub fn chdir(path: &OsStr) -> LibcResult<()> {
    let path = CString::new(path.as_bytes()).expect("path contains null characters");
    let result = unsafe { libc::chdir(path.as_ptr()) };
    if result < 0 {
        return Err(Errno::current());
    }
    Ok(())
}

pub fn realpath(path: &str) -> LibcResult<PathBuf> {
    let path = CString::new(path).expect("path contains null characters");
    let resolved = unsafe { libc::realpath(path.as_ptr(), std::ptr::null_mut()) };
    if resolved.is_null() {
        return Err(Errno::current());
    }
    let result = unsafe { CStr::from_ptr(resolved) };
    let result = PathBuf::from(OsStr::from_bytes(result.to_bytes()));
    unsafe { libc::free(resolved as *mut libc::c_void) };
    Ok(result)
}

/// Expands `pattern` against the filesystem. Matches come back in the
/// collated order glob produces; no match yields an empty list.
pub fn glob(pattern: &str) -> Vec<String> {
    let pattern = match CString::new(pattern) {
        Ok(pattern) => pattern,
        Err(_) => return Vec::new(),
    };
    let mut glob_data = unsafe { std::mem::zeroed::<libc::glob_t>() };
    let result = unsafe { libc::glob(pattern.as_ptr(), 0, None, &mut glob_data) };
    let mut matches = Vec::new();
    if result == 0 {
        for i in 0..glob_data.gl_pathc {
            let path = unsafe { CStr::from_ptr(*glob_data.gl_pathv.add(i)) };
            matches.push(path.to_string_lossy().into_owned());
        }
    }
    unsafe { libc::globfree(&mut glob_data) };
    matches
}

pub fn umask(mask: u32) -> u32 {
    (unsafe { libc::umask(mask as libc::mode_t) }) as u32
}

pub fn current_umask() -> u32 {
    // there is no read-only query, set it twice
    let current = umask(0);
    umask(current);
    current
}

/// Node name from uname, used by the `\h` prompt escape.
pub fn node_name() -> Option<String> {
    let mut name = unsafe { std::mem::zeroed::<libc::utsname>() };
    if unsafe { libc::uname(&mut name) } < 0 {
        return None;
    }
    let node = unsafe { CStr::from_ptr(name.nodename.as_ptr()) };
    Some(node.to_string_lossy().into_owned())
}

/// Home directory of the current user from the user database, the
/// fallback for login shells started without `HOME`.
pub fn passwd_home_dir() -> Option<String> {
    let passwd = unsafe { libc::getpwuid(libc::getuid()) };
    if passwd.is_null() {
        return None;
    }
    let dir = unsafe { CStr::from_ptr((*passwd).pw_dir) };
    Some(dir.to_string_lossy().into_owned())
}

pub fn find_in_path(command: &str, env_path: &str) -> Option<String> {
    for path in env_path.split(':') {
        let mut command_path = PathBuf::from(path);
        command_path.push(command);
        if command_path.is_file() {
            return Some(command_path.into_os_string().to_string_lossy().into_owned());
        }
    }
    None
}
