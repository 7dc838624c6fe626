use std::{
    env,
    ffi::OsString,
    io::{self, Write},
};

use log::{debug, warn};

use crate::{exit, parse, Command, Error, Failure};

/// Resolves the process arguments against `root` and runs the selected
/// command, reporting problems to stderr.
///
/// Returns the exit code of this run, which is also recorded with
/// [`exit::set_status`]. Programs usually finish with [`exit::exit`].
pub fn run(root: &mut Command) -> i32 {
    run_with(root, env::args_os().skip(1), &mut io::stderr())
}

/// [`run`] with explicit arguments (program name excluded) and diagnostics
/// destination.
pub fn run_with<I>(root: &mut Command, args: I, stderr: &mut dyn Write) -> i32
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let code = match parse(root, args) {
        Ok(invocation) => {
            let cmd = invocation.command();
            match cmd.invoke(&invocation, invocation.args()) {
                Some(code) => {
                    debug!("`{invocation}` finished with {code}");
                    code
                }
                None => {
                    warn!("`{invocation}` is not runnable");
                    exit::USAGE_ERROR
                }
            }
        }
        Err(failure) => {
            report(&failure, stderr);
            exit::USAGE_ERROR
        }
    };
    exit::set_status(code);
    code
}

fn report(failure: &Failure<'_>, stderr: &mut dyn Write) {
    let invocation = &failure.invocation;
    match &failure.error {
        Error::UnknownCommand(name) => {
            let root = &invocation.root().name;
            let name = name.to_string_lossy();
            w!(stderr, "{root} {name}: unknown command\n");
            w!(stderr, "Run '{root} -help' for usage.\n");
        }
        Error::NoCommand | Error::Help => {
            drop(invocation.write_usage(stderr));
        }
        Error::Flag(err) => {
            w!(stderr, "{invocation}: {err}\n");
            drop(invocation.write_usage(stderr));
        }
    }
}
