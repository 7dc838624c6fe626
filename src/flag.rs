//! The flag-parsing primitive owned by every command.
//!
//! Syntax is the conventional single-dash one: `-name`, `--name`,
//! `-name=value` and, for anything but booleans, `-name value`. Parsing stops
//! before the first non-flag argument, before a lone `-` and right after `--`.
//!
//! Arguments stay `OsString`s; only flags and their values have to be UTF-8.
//! An argument which is not UTF-8 ends the flags like any other positional.
use std::{
    cell::RefCell,
    ffi::{OsStr, OsString},
    fmt::{self, Write as _},
    io::{self, Write},
    mem,
    ops::{Deref, DerefMut},
    path::PathBuf,
    rc::Rc,
};

use log::trace;

use crate::exit;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `-h` or `-help` was given but the set defines no such flag.
    #[error("help requested")]
    Help,
    #[error("bad flag syntax: {0}")]
    BadSyntax(String),
    #[error("flag provided but not defined: -{0}")]
    Undefined(String),
    #[error("flag needs an argument: -{0}")]
    MissingValue(String),
    #[error("invalid value {value:?} for flag -{name}: {reason}")]
    InvalidValue { name: String, value: String, reason: String },
    #[error("invalid value {value:?} for flag -{name}: invalid utf8")]
    InvalidUtf8 { name: String, value: OsString },
}

impl Error {
    pub fn is_help(&self) -> bool {
        matches!(self, Error::Help)
    }
}

/// What [`FlagSet::parse`] does after reporting a failure to the set's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorHandling {
    /// Return the error.
    Continue,
    /// Leave through [`exit::exit`]: status 0 for help, 2 otherwise.
    Exit,
    Panic,
}

/// Storage for a single flag.
pub trait Value {
    fn set(&mut self, value: &str) -> Result<(), String>;

    /// Boolean flags never consume the following argument.
    fn is_bool(&self) -> bool {
        false
    }

    /// Zero values are left out of the defaults listing.
    fn is_zero(&self) -> bool {
        self.render().is_empty()
    }

    fn render(&self) -> String;
}

/// A type that can back a [`Var`].
pub trait FlagType: Clone + 'static {
    const IS_BOOL: bool = false;
    const TYPE_NAME: &'static str;

    fn parse_flag(value: &str) -> Result<Self, String>;
    fn is_zero(&self) -> bool;
    fn render(&self) -> String;
}

impl FlagType for bool {
    const IS_BOOL: bool = true;
    const TYPE_NAME: &'static str = "bool";

    fn parse_flag(value: &str) -> Result<Self, String> {
        match value {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err("invalid syntax".to_string()),
        }
    }
    fn is_zero(&self) -> bool {
        !*self
    }
    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagType for String {
    const TYPE_NAME: &'static str = "string";

    fn parse_flag(value: &str) -> Result<Self, String> {
        Ok(value.to_string())
    }
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
    fn render(&self) -> String {
        self.clone()
    }
}

impl FlagType for PathBuf {
    const TYPE_NAME: &'static str = "path";

    fn parse_flag(value: &str) -> Result<Self, String> {
        Ok(PathBuf::from(value))
    }
    fn is_zero(&self) -> bool {
        self.as_os_str().is_empty()
    }
    fn render(&self) -> String {
        self.display().to_string()
    }
}

macro_rules! from_str_flag {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl FlagType for $ty {
            const TYPE_NAME: &'static str = $name;

            fn parse_flag(value: &str) -> Result<Self, String> {
                value.parse::<$ty>().map_err(|err| err.to_string())
            }
            fn is_zero(&self) -> bool {
                *self == <$ty>::default()
            }
            fn render(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

from_str_flag! {
    i32 => "int",
    i64 => "int",
    u32 => "uint",
    u64 => "uint",
    usize => "uint",
    f64 => "float",
}

/// Shared handle to a flag's value, readable after parsing.
pub struct Var<T>(Rc<RefCell<T>>);

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Var(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.borrow(), f)
    }
}

impl<T: Clone> Var<T> {
    pub fn new(value: T) -> Var<T> {
        Var(Rc::new(RefCell::new(value)))
    }

    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T: FlagType> Value for Var<T> {
    fn set(&mut self, value: &str) -> Result<(), String> {
        let value = T::parse_flag(value)?;
        *self.0.borrow_mut() = value;
        Ok(())
    }
    fn is_bool(&self) -> bool {
        T::IS_BOOL
    }
    fn is_zero(&self) -> bool {
        self.0.borrow().is_zero()
    }
    fn render(&self) -> String {
        self.0.borrow().render()
    }
}

pub struct Flag {
    name: String,
    usage: String,
    default: String,
    zero_default: bool,
    type_name: &'static str,
    value: Box<dyn Value>,
}

impl Flag {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn usage(&self) -> &str {
        &self.usage
    }
    /// The value as it was rendered when the flag was defined.
    pub fn default_value(&self) -> &str {
        &self.default
    }
    pub fn value(&self) -> String {
        self.value.render()
    }
    pub fn is_bool(&self) -> bool {
        self.value.is_bool()
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("value", &self.value.render())
            .finish()
    }
}

pub struct FlagSet {
    name: String,
    error_handling: ErrorHandling,
    flags: Vec<Flag>,
    actual: Vec<String>,
    args: Vec<OsString>,
    parsed: bool,
    output: Box<dyn Write>,
}

impl fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSet")
            .field("name", &self.name)
            .field("error_handling", &self.error_handling)
            .field("flags", &self.flags)
            .field("args", &self.args)
            .finish()
    }
}

impl FlagSet {
    pub fn new(name: impl Into<String>, error_handling: ErrorHandling) -> FlagSet {
        FlagSet {
            name: name.into(),
            error_handling,
            flags: Vec::new(),
            actual: Vec::new(),
            args: Vec::new(),
            parsed: false,
            output: Box::new(io::stderr()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error_handling(&self) -> ErrorHandling {
        self.error_handling
    }

    /// Returns the previous policy.
    pub fn set_error_handling(&mut self, error_handling: ErrorHandling) -> ErrorHandling {
        mem::replace(&mut self.error_handling, error_handling)
    }

    /// Redirects diagnostics, returning the previous destination.
    pub fn set_output(&mut self, output: Box<dyn Write>) -> Box<dyn Write> {
        mem::replace(&mut self.output, output)
    }

    /// Switches to [`ErrorHandling::Continue`] with diagnostics discarded
    /// until the returned guard is dropped.
    pub fn silence(&mut self) -> Silenced<'_> {
        let error_handling = self.set_error_handling(ErrorHandling::Continue);
        let output = self.set_output(Box::new(io::sink()));
        Silenced { flags: self, output: Some(output), error_handling }
    }

    pub fn bool(&mut self, name: &str, default: bool, usage: &str) -> Var<bool> {
        self.var(name, default, usage)
    }

    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> Var<String> {
        self.var(name, default.to_string(), usage)
    }

    pub fn int(&mut self, name: &str, default: i64, usage: &str) -> Var<i64> {
        self.var(name, default, usage)
    }

    pub fn uint(&mut self, name: &str, default: u64, usage: &str) -> Var<u64> {
        self.var(name, default, usage)
    }

    pub fn float(&mut self, name: &str, default: f64, usage: &str) -> Var<f64> {
        self.var(name, default, usage)
    }

    pub fn path(&mut self, name: &str, default: impl Into<PathBuf>, usage: &str) -> Var<PathBuf> {
        self.var(name, default.into(), usage)
    }

    /// # Panics
    ///
    /// If a flag called `name` is already defined on this set.
    pub fn var<T: FlagType>(&mut self, name: &str, default: T, usage: &str) -> Var<T> {
        let var = Var::new(default);
        self.define(name, usage, T::TYPE_NAME, Box::new(var.clone()));
        var
    }

    /// Defines a flag backed by a caller-provided [`Value`].
    ///
    /// # Panics
    ///
    /// If a flag called `name` is already defined on this set.
    pub fn value(&mut self, name: &str, usage: &str, value: impl Value + 'static) {
        self.define(name, usage, "value", Box::new(value))
    }

    fn define(&mut self, name: &str, usage: &str, type_name: &'static str, value: Box<dyn Value>) {
        if self.lookup(name).is_some() {
            if self.name.is_empty() {
                panic!("flag redefined: {name}");
            }
            panic!("{} flag redefined: {name}", self.name);
        }
        self.flags.push(Flag {
            name: name.to_string(),
            usage: usage.to_string(),
            default: value.render(),
            zero_default: value.is_zero(),
            type_name,
            value,
        });
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|it| it.name == name)
    }

    /// Whether `name` was assigned, on the command line or through [`FlagSet::set`].
    pub fn is_set(&self, name: &str) -> bool {
        self.actual.iter().any(|it| it == name)
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let flag = match self.flags.iter_mut().find(|it| it.name == name) {
            Some(it) => it,
            None => return Err(Error::Undefined(name.to_string())),
        };
        flag.value.set(value).map_err(|reason| Error::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            reason,
        })?;
        trace!("-{name} = {value:?}");
        if !self.is_set(name) {
            self.actual.push(name.to_string());
        }
        Ok(())
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// Positional arguments left after the flags.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn arg(&self, i: usize) -> Option<&OsStr> {
        self.args.get(i).map(OsString::as_os_str)
    }

    pub fn n_arg(&self) -> usize {
        self.args.len()
    }

    /// Parses flags from `args`, which must not include the command name.
    pub fn parse(&mut self, args: Vec<OsString>) -> Result<()> {
        self.parsed = true;
        let mut rargs = args;
        rargs.reverse();
        let res = loop {
            match self.parse_one(&mut rargs) {
                Ok(true) => (),
                Ok(false) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        rargs.reverse();
        self.args = rargs;
        match res {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    fn parse_one(&mut self, rargs: &mut Vec<OsString>) -> Result<bool> {
        let arg = match rargs.last().and_then(|it| it.to_str()) {
            Some(it) if it.len() >= 2 && it.starts_with('-') => it,
            _ => return Ok(false),
        };
        if arg == "--" {
            rargs.pop();
            return Ok(false);
        }
        let dashes = if arg.starts_with("--") { 2 } else { 1 };
        let name = &arg[dashes..];
        if name.is_empty() || name.starts_with('-') || name.starts_with('=') {
            return Err(Error::BadSyntax(arg.to_string()));
        }
        let (name, value) = match name.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(OsString::from(value))),
            None => (name.to_string(), None),
        };
        rargs.pop();

        let is_bool = match self.lookup(&name) {
            Some(flag) => flag.is_bool(),
            None if name == "help" || name == "h" => return Err(Error::Help),
            None => return Err(Error::Undefined(name)),
        };
        let value = match value {
            Some(it) => it,
            None if is_bool => OsString::from("true"),
            None => rargs.pop().ok_or_else(|| Error::MissingValue(name.clone()))?,
        };
        let value =
            value.into_string().map_err(|value| Error::InvalidUtf8 { name: name.clone(), value })?;
        self.set(&name, &value)?;
        Ok(true)
    }

    fn fail(&mut self, err: Error) -> Result<()> {
        if !err.is_help() {
            w!(self.output, "{err}\n");
        }
        self.usage();
        match self.error_handling {
            ErrorHandling::Continue => Err(err),
            ErrorHandling::Exit => {
                exit::set_status(if err.is_help() { exit::SUCCESS } else { exit::USAGE_ERROR });
                exit::exit()
            }
            ErrorHandling::Panic => panic!("{err}"),
        }
    }

    fn usage(&mut self) {
        let defaults = self.defaults();
        if self.name.is_empty() {
            w!(self.output, "Usage:\n{defaults}");
        } else {
            w!(self.output, "Usage of {}:\n{defaults}", self.name);
        }
    }

    /// One entry per flag, sorted by name.
    pub fn defaults(&self) -> String {
        let mut buf = String::new();
        let mut flags = self.flags.iter().collect::<Vec<_>>();
        flags.sort_by(|a, b| a.name.cmp(&b.name));
        for flag in flags {
            w!(buf, "  -{}", flag.name);
            if !flag.is_bool() {
                w!(buf, " {}", flag.type_name);
            }
            w!(buf, "\n    \t{}", flag.usage);
            if !flag.zero_default {
                if flag.type_name == "string" {
                    w!(buf, " (default {:?})", flag.default);
                } else {
                    w!(buf, " (default {})", flag.default);
                }
            }
            w!(buf, "\n");
        }
        buf
    }

    pub fn print_defaults(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(self.defaults().as_bytes())
    }
}

/// Guard returned by [`FlagSet::silence`].
pub struct Silenced<'a> {
    flags: &'a mut FlagSet,
    output: Option<Box<dyn Write>>,
    error_handling: ErrorHandling,
}

impl Deref for Silenced<'_> {
    type Target = FlagSet;

    fn deref(&self) -> &FlagSet {
        &*self.flags
    }
}

impl DerefMut for Silenced<'_> {
    fn deref_mut(&mut self) -> &mut FlagSet {
        &mut *self.flags
    }
}

impl Drop for Silenced<'_> {
    fn drop(&mut self) {
        if let Some(output) = self.output.take() {
            self.flags.set_output(output);
        }
        self.flags.set_error_handling(self.error_handling);
    }
}
