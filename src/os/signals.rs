//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

extern "C" fn noop_handler(_: libc::c_int) {}

unsafe fn install_disposition(signal: libc::c_int, handler: libc::sighandler_t) {
    let mut action = std::mem::zeroed::<libc::sigaction>();
    action.sa_sigaction = handler;
    libc::sigemptyset(&mut action.sa_mask);
    libc::sigaction(signal, &action, std::ptr::null_mut());
}

/// # Safety
/// Changes a process-wide signal disposition.
pub unsafe fn handle_signal_ignore(signal: libc::c_int) {
    install_disposition(signal, libc::SIG_IGN);
}

/// Installs a do-nothing handler, as opposed to `SIG_IGN`. A handler is
/// reset by `execve`, so children still receive the default disposition.
///
/// # Safety
/// Changes a process-wide signal disposition.
pub unsafe fn handle_signal_noop(signal: libc::c_int) {
    install_disposition(signal, noop_handler as libc::sighandler_t);
}

/// Keeps background terminal operations from suspending an interactive
/// shell, and absorbs SIGINT at the prompt.
///
/// # Safety
/// Changes process-wide signal dispositions.
pub unsafe fn setup_interactive_signals() {
    handle_signal_ignore(libc::SIGTTIN);
    handle_signal_ignore(libc::SIGTTOU);
    handle_signal_ignore(libc::SIGTSTP);
    handle_signal_noop(libc::SIGINT);
}
