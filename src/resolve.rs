use std::{ffi::OsString, fmt};

use log::debug;

use crate::{Command, Error};

/// A resolved chain of commands, root first, plus the residual arguments of
/// the last one.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    path: Vec<&'a Command>,
    args: Vec<OsString>,
}

impl<'a> Invocation<'a> {
    pub fn new(root: &'a Command) -> Invocation<'a> {
        Invocation { path: vec![root], args: Vec::new() }
    }

    pub fn child(mut self, cmd: &'a Command) -> Invocation<'a> {
        self.path.push(cmd);
        self
    }

    pub fn with_args(mut self, args: Vec<OsString>) -> Invocation<'a> {
        self.args = args;
        self
    }

    pub fn root(&self) -> &'a Command {
        self.path[0]
    }

    /// The command that was resolved, the root if nothing matched.
    pub fn command(&self) -> &'a Command {
        self.path[self.path.len() - 1]
    }

    pub fn path(&self) -> &[&'a Command] {
        &self.path
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Names from the root down to the resolved command, without the root.
    /// Empty when only the root is involved.
    pub fn long_name(&self) -> String {
        join(&self.path[1..])
    }

    /// Names from the root down to the resolved command.
    pub fn display_name(&self) -> String {
        join(&self.path)
    }
}

impl fmt::Display for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

fn join(path: &[&Command]) -> String {
    path.iter().map(|it| it.name.as_str()).collect::<Vec<_>>().join(" ")
}

/// An [`Error`] together with the commands resolved before it happened.
#[derive(Debug, thiserror::Error)]
#[error("{invocation}: {error}")]
pub struct Failure<'a> {
    pub invocation: Invocation<'a>,
    #[source]
    pub error: Error,
}

/// Resolves `args`, which must not include the program name, against `root`
/// and its immediate subcommands.
///
/// Flags before the first positional argument go to `root`, the first
/// positional argument selects a runnable subcommand and everything after it
/// goes to that subcommand's flag set. Neither flag set writes diagnostics or
/// exits while this runs; both get their previous output back afterwards.
///
/// Only one level of subcommands is resolved. Arguments are passed on as
/// given; only flags and command names are read as UTF-8.
pub fn parse<I>(root: &mut Command, args: I) -> Result<Invocation<'_>, Failure<'_>>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let args = args.into_iter().map(Into::into).collect::<Vec<OsString>>();
    let outcome = resolve(root, args);

    let root: &Command = root;
    let mut invocation = Invocation::new(root).with_args(outcome.args);
    if let Some(idx) = outcome.child {
        invocation = invocation.child(&root.commands[idx]);
    }
    match outcome.error {
        None => Ok(invocation),
        Some(error) => Err(Failure { invocation, error }),
    }
}

struct Outcome {
    child: Option<usize>,
    args: Vec<OsString>,
    error: Option<Error>,
}

impl Outcome {
    fn resolved(child: usize, args: Vec<OsString>) -> Outcome {
        Outcome { child: Some(child), args, error: None }
    }

    fn failed(child: Option<usize>, args: Vec<OsString>, error: Error) -> Outcome {
        Outcome { child, args, error: Some(error) }
    }
}

fn resolve(root: &mut Command, args: Vec<OsString>) -> Outcome {
    debug!("resolving {:?} against `{}`", args, root.name);

    let mut rest = {
        let mut flags = root.flags.silence();
        if let Err(err) = flags.parse(args) {
            debug!("`{}`: {err}", root.name);
            return Outcome::failed(None, Vec::new(), err.into());
        }
        flags.args().to_vec()
    };

    let name = match rest.first() {
        Some(it) => it.clone(),
        None => return Outcome::failed(None, rest, Error::NoCommand),
    };
    let idx = match root.position(&name) {
        Some(it) => it,
        None => {
            debug!("`{}`: no runnable command {name:?}", root.name);
            return Outcome::failed(None, rest, Error::UnknownCommand(name));
        }
    };

    let cmd = &mut root.commands[idx];
    debug!("matched `{} {}`", root.name, cmd.name);
    let tail = rest.split_off(1);
    let mut flags = cmd.flags.silence();
    if cmd.custom_flags {
        return Outcome::resolved(idx, tail);
    }
    match flags.parse(tail) {
        Ok(()) => Outcome::resolved(idx, flags.args().to_vec()),
        Err(err) => {
            debug!("`{} {}`: {err}", root.name, cmd.name);
            Outcome::failed(Some(idx), Vec::new(), err.into())
        }
    }
}
