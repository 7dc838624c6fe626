use std::{
    ffi::{OsStr, OsString},
    fmt, io,
};

use crate::{
    flag::{ErrorHandling, FlagSet},
    Invocation,
};

/// Signature of a command's run behavior: the resolved invocation and its
/// residual arguments in, an exit code out.
pub type RunFn = dyn Fn(&Invocation<'_>, &[OsString]) -> i32;

/// Signature of a custom usage renderer.
pub type UsageFn = dyn Fn(&Invocation<'_>, &mut dyn io::Write) -> io::Result<()>;

/// A single command: the root of a program or one of its subcommands.
pub struct Command {
    /// Matched against the command line and used in display names.
    pub name: String,
    /// One-line usage, printed after the command's full name.
    pub usage_line: String,
    /// Shown next to the name in the parent's command listing.
    pub short: String,
    pub long: String,
    pub flags: FlagSet,
    /// Leave every argument after the command name to the run behavior.
    pub custom_flags: bool,
    /// Listed in this order by the default usage.
    pub commands: Vec<Command>,
    run: Option<Box<RunFn>>,
    pub(crate) usage: Option<Box<UsageFn>>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Command {
        let name = name.into();
        Command {
            flags: FlagSet::new(name.clone(), ErrorHandling::Continue),
            name,
            usage_line: String::new(),
            short: String::new(),
            long: String::new(),
            custom_flags: false,
            commands: Vec::new(),
            run: None,
            usage: None,
        }
    }

    pub fn with_usage_line(mut self, usage_line: impl Into<String>) -> Command {
        self.usage_line = usage_line.into();
        self
    }

    pub fn with_short(mut self, short: impl Into<String>) -> Command {
        self.short = short.into();
        self
    }

    pub fn with_long(mut self, long: impl Into<String>) -> Command {
        self.long = long.into();
        self
    }

    pub fn with_custom_flags(mut self) -> Command {
        self.custom_flags = true;
        self
    }

    pub fn with_subcommand(mut self, cmd: Command) -> Command {
        self.commands.push(cmd);
        self
    }

    pub fn with_run<F>(mut self, run: F) -> Command
    where
        F: Fn(&Invocation<'_>, &[OsString]) -> i32 + 'static,
    {
        self.set_run(run);
        self
    }

    /// Replaces the default usage renderer.
    pub fn with_usage<F>(mut self, usage: F) -> Command
    where
        F: Fn(&Invocation<'_>, &mut dyn io::Write) -> io::Result<()> + 'static,
    {
        self.usage = Some(Box::new(usage));
        self
    }

    /// Sets the run behavior after construction, for behaviors that need
    /// handles to flags defined on the command itself.
    pub fn set_run<F>(&mut self, run: F)
    where
        F: Fn(&Invocation<'_>, &[OsString]) -> i32 + 'static,
    {
        self.run = Some(Box::new(run));
    }

    pub fn runnable(&self) -> bool {
        self.run.is_some()
    }

    /// First runnable subcommand called `name`.
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|it| it.name == name && it.runnable())
    }

    pub(crate) fn position(&self, name: &OsStr) -> Option<usize> {
        self.commands.iter().position(|it| name == it.name.as_str() && it.runnable())
    }

    /// Calls the run behavior, `None` for commands which are not runnable.
    pub(crate) fn invoke(&self, invocation: &Invocation<'_>, args: &[OsString]) -> Option<i32> {
        self.run.as_ref().map(|run| run(invocation, args))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("runnable", &self.runnable())
            .field("custom_flags", &self.custom_flags)
            .field("flags", &self.flags)
            .field("commands", &self.commands)
            .finish()
    }
}
