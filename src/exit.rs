//! Process exit status and deferred shutdown hooks.
//!
//! The status only ever goes up: recording `FAILURE` after `USAGE_ERROR`
//! leaves `USAGE_ERROR` in place. [`exit`] runs the hooks registered with
//! [`at_exit`] in registration order and then terminates the process.
use std::{fmt, mem, process};

use log::debug;
use parking_lot::{const_mutex, Mutex};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const USAGE_ERROR: i32 = 2;

type Hook = Box<dyn FnOnce() + Send>;

struct State {
    status: i32,
    hooks: Vec<Hook>,
}

static STATE: Mutex<State> = const_mutex(State { status: SUCCESS, hooks: Vec::new() });

pub fn at_exit<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    STATE.lock().hooks.push(Box::new(f));
}

/// Runs and forgets every registered hook, oldest first.
///
/// Hooks run outside the lock, so they are free to call [`set_status`] or to
/// register further hooks, which run in the same pass.
pub fn run_hooks() {
    loop {
        let hooks = mem::take(&mut STATE.lock().hooks);
        if hooks.is_empty() {
            break;
        }
        for hook in hooks {
            hook();
        }
    }
}

pub fn exit() -> ! {
    run_hooks();
    let status = status();
    debug!("exiting with status {status}");
    process::exit(status)
}

/// Prints `msg` to stderr and raises the status to [`FAILURE`].
pub fn error(msg: impl fmt::Display) {
    eprintln!("{msg}");
    set_status(FAILURE);
}

pub fn fatal(msg: impl fmt::Display) -> ! {
    error(msg);
    exit()
}

pub fn exit_if_errors() {
    if status() != SUCCESS {
        exit()
    }
}

pub fn set_status(status: i32) {
    let mut state = STATE.lock();
    if state.status < status {
        state.status = status;
    }
}

pub fn status() -> i32 {
    STATE.lock().status
}

/// Back to [`SUCCESS`] with no hooks, for tests which share the process.
pub fn reset() {
    let mut state = STATE.lock();
    state.status = SUCCESS;
    state.hooks.clear();
}
