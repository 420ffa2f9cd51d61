//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::fmt::{Debug, Display, Formatter};

/// An errno value as returned by a failed libc call, kept only for
/// translation into its symbolic name in diagnostics.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Errno {
    value: libc::c_int,
}

impl Errno {
    pub fn current() -> Self {
        // guaranteed to be set right after a failed call
        let value = std::io::Error::last_os_error()
            .raw_os_error()
            .unwrap_or(libc::EIO);
        Self { value }
    }

    pub fn value(&self) -> libc::c_int {
        self.value
    }
}

impl From<libc::c_int> for Errno {
    fn from(value: libc::c_int) -> Self {
        Self { value }
    }
}

impl Debug for Errno {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // some variants share a value on certain systems, but that is not
        // guaranteed by the standard
        #[allow(unreachable_patterns, clippy::match_overlapping_arm)]
        match self.value {
            libc::E2BIG => write!(f, "E2BIG: argument list too long"),
            libc::EACCES => write!(f, "EACCES: permission denied"),
            libc::EAGAIN => write!(f, "EAGAIN: resource unavailable, try again"),
            libc::EBADF => write!(f, "EBADF: bad file descriptor"),
            libc::EBUSY => write!(f, "EBUSY: device or resource busy"),
            libc::ECHILD => write!(f, "ECHILD: no child processes"),
            libc::EEXIST => write!(f, "EEXIST: file exists"),
            libc::EFAULT => write!(f, "EFAULT: bad address"),
            libc::EFBIG => write!(f, "EFBIG: file too large"),
            libc::EINTR => write!(f, "EINTR: interrupted function"),
            libc::EINVAL => write!(f, "EINVAL: invalid argument"),
            libc::EIO => write!(f, "EIO: I/O error"),
            libc::EISDIR => write!(f, "EISDIR: is a directory"),
            libc::ELOOP => write!(f, "ELOOP: too many levels of symbolic links"),
            libc::EMFILE => write!(f, "EMFILE: file descriptor value too large"),
            libc::ENAMETOOLONG => write!(f, "ENAMETOOLONG: filename too long"),
            libc::ENFILE => write!(f, "ENFILE: too many files open in system"),
            libc::ENOENT => write!(f, "ENOENT: no such file or directory"),
            libc::ENOEXEC => write!(f, "ENOEXEC: executable file format error"),
            libc::ENOMEM => write!(f, "ENOMEM: not enough space"),
            libc::ENOSPC => write!(f, "ENOSPC: no space left on device"),
            libc::ENOTDIR => write!(
                f,
                "ENOTDIR: not a directory or a symbolic link to a directory"
            ),
            libc::ENOTTY => write!(f, "ENOTTY: inappropriate I/O control operation"),
            libc::ENXIO => write!(f, "ENXIO: no such device or address"),
            libc::EPERM => write!(f, "EPERM: operation not permitted"),
            libc::EPIPE => write!(f, "EPIPE: broken pipe"),
            libc::ERANGE => write!(f, "ERANGE: result too large"),
            libc::EROFS => write!(f, "EROFS: read-only file system"),
            libc::ESPIPE => write!(f, "ESPIPE: invalid seek"),
            libc::ESRCH => write!(f, "ESRCH: no such process"),
            libc::ETXTBSY => write!(f, "ETXTBSY: text file busy"),
            libc::EXDEV => write!(f, "EXDEV: improper hard link"),
            other => write!(f, "errno {}", other),
        }
    }
}

impl Display for Errno {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_errno_has_symbolic_name() {
        assert_eq!(
            Errno::from(libc::ENOENT).to_string(),
            "ENOENT: no such file or directory"
        );
    }

    #[test]
    fn unknown_errno_falls_back_to_number() {
        assert_eq!(Errno::from(9999).to_string(), "errno 9999");
    }
}
