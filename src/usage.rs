use std::io::{self, Write};

use crate::Invocation;

impl Invocation<'_> {
    /// Writes usage for the resolved command, through its own renderer if it
    /// has one.
    pub fn write_usage(&self, w: &mut dyn Write) -> io::Result<()> {
        match &self.command().usage {
            Some(usage) => usage(self, w),
            None => default_usage(self, w),
        }
    }
}

/// Usage line, flag defaults, long description and, for commands with
/// subcommands, a listing of them.
pub fn default_usage(invocation: &Invocation<'_>, w: &mut dyn Write) -> io::Result<()> {
    let cmd = invocation.command();

    if cmd.usage_line.is_empty() {
        writeln!(w, "usage: {invocation}")?;
    } else {
        writeln!(w, "usage: {invocation} {}", cmd.usage_line)?;
    }
    cmd.flags.print_defaults(w)?;
    if !cmd.long.is_empty() {
        writeln!(w)?;
        for line in cmd.long.trim_end().split('\n') {
            writeln!(w, "{}", line.trim_end())?;
        }
    }

    if !cmd.commands.is_empty() {
        write!(w, "\ncommands:\n\n")?;
        for sub in &cmd.commands {
            writeln!(w, "\t{:<11} {}", sub.name, sub.short)?;
        }
    }
    Ok(())
}
