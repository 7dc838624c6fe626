//! Lets one executable expose several subcommands, each with its own flags,
//! usage and run behavior.
//!
//! ```
//! use subcmd::{exit, Command};
//!
//! let mut child = Command::new("child").with_usage_line("[-v]").with_short("sub command example");
//! let verbose = child.flags.bool("v", false, "verbose");
//! child.set_run(move |invocation, args| {
//!     assert_eq!(invocation.to_string(), "example child");
//!     assert!(verbose.get());
//!     assert_eq!(args, ["a", "b"]);
//!     exit::SUCCESS
//! });
//!
//! let mut root = Command::new("example")
//!     .with_usage_line("<command> [arguments]")
//!     .with_subcommand(child);
//!
//! let status = subcmd::run_with(&mut root, ["child", "-v", "a", "b"], &mut std::io::stderr());
//! assert_eq!(status, exit::SUCCESS);
//! ```
use std::ffi::OsString;

macro_rules! w {
    ($($tt:tt)*) => {{
        let _ = write!($($tt)*);
    }};
}

mod command;
mod dispatch;
mod resolve;
mod usage;

pub mod exit;
pub mod flag;

pub use crate::{
    command::{Command, RunFn, UsageFn},
    dispatch::{run, run_with},
    resolve::{parse, Failure, Invocation},
    usage::default_usage,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why [`parse`] did not produce a runnable command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Nothing positional followed the root's flags.
    #[error("no command")]
    NoCommand,
    #[error("unknown command {0:?}")]
    UnknownCommand(OsString),
    /// `-h` or `-help` given to a command that does not define it.
    #[error("help requested")]
    Help,
    #[error(transparent)]
    Flag(flag::Error),
}

impl From<flag::Error> for Error {
    fn from(err: flag::Error) -> Error {
        match err {
            flag::Error::Help => Error::Help,
            err => Error::Flag(err),
        }
    }
}
