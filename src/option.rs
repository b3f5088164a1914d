use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use crate::error::RegistrationErr;
use crate::util::OptionValidator;

/// Callback for an option that takes no argument.
pub type NoArgFn = dyn Fn() -> Result<(), String>;

/// Callback for an option that takes an argument. It receives the raw value.
pub type ArgFn = dyn Fn(&str) -> Result<(), String>;

/// Whether an option consumes a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    NoArgument,
    HasArgument,
}

/// The callback bound to an option.
///
/// A handler returns `Err(message)` to reject its input; the parse stops and
/// the message becomes the reported diagnostic. State is captured by the
/// closure itself, typically through `Rc<Cell<_>>` or `Rc<RefCell<_>>`.
/// See [`crate::handlers`] for the standard ones.
#[derive(Clone)]
pub enum Handler {
    NoArg(Rc<NoArgFn>),
    Arg(Rc<ArgFn>),
}

impl Handler {
    /// Wrap a callback for an option without argument.
    pub fn no_arg<F>(f: F) -> Handler
        where F: Fn() -> Result<(), String> + 'static {
        Handler::NoArg(Rc::new(f))
    }

    /// Wrap a callback for an option with an argument.
    pub fn arg<F>(f: F) -> Handler
        where F: Fn(&str) -> Result<(), String> + 'static {
        Handler::Arg(Rc::new(f))
    }

    pub fn arity(&self) -> Arity {
        match self {
            Handler::NoArg(_) => Arity::NoArgument,
            Handler::Arg(_) => Arity::HasArgument,
        }
    }
}

impl Debug for Handler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::NoArg(_) => f.write_str("Handler::NoArg"),
            Handler::Arg(_) => f.write_str("Handler::Arg"),
        }
    }
}

/// Usage text of an option or a table.
///
/// [`Description::Hidden`] keeps an option parseable but leaves it out of
/// the usage message. On a table it hides every option the table contains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Description {
    Text(String),
    Hidden,
}

impl Description {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Description::Hidden)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Description::Text(text) => Some(text),
            Description::Hidden => None,
        }
    }
}

impl From<&str> for Description {
    fn from(text: &str) -> Self {
        Description::Text(text.to_string())
    }
}

impl From<String> for Description {
    fn from(text: String) -> Self {
        Description::Text(text)
    }
}

/// The `OptionDescriptor` represents a single recognized option.
///
/// # Examples
///
/// Create an option without argument: `-v,--verbose`
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use anpopt::{handlers, OptionDescriptor};
///
/// let verbose = Rc::new(Cell::new(false));
/// let opt = OptionDescriptor::builder()
///     .short_option('v')
///     .long_option("verbose")
///     .handler_no_arg(handlers::set_bool(&verbose))
///     .desc("Verbose mode")
///     .build()
///     .unwrap();
/// ```
///
/// Create an option with an argument: `-o <file>`
/// ```
/// use anpopt::OptionDescriptor;
///
/// let opt = OptionDescriptor::builder()
///     .short_option('o')
///     .arg_name("file")
///     .handler_arg(|value| {
///         println!("output goes to {}", value);
///         Ok(())
///     })
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct OptionDescriptor {
    long_name: Option<String>,
    short_name: Option<char>,
    handler: Handler,
    description: Option<Description>,
    arg_name: Option<String>,
}

/// A builder struct for [`OptionDescriptor`].
#[derive(Default)]
pub struct OptionBuilder {
    long_name: Option<String>,
    short_name: Option<char>,
    handler: Option<Handler>,
    description: Option<Description>,
    arg_name: Option<String>,
}

impl OptionBuilder {
    /// Build an [`OptionDescriptor`] with configured values.
    ///
    /// # Error
    ///
    /// Returns an error if:
    /// - neither `short_option` nor `long_option` is specified.
    /// - a name is not usable (see [`crate::OptionValidator`]).
    /// - no handler is bound.
    pub fn build(self) -> Result<OptionDescriptor, RegistrationErr> {
        if self.long_name.is_none() && self.short_name.is_none() {
            return Err(RegistrationErr::MissingName);
        }
        if let Some(short) = self.short_name {
            OptionValidator::validate_short(short)?;
        }
        if let Some(ref long) = self.long_name {
            OptionValidator::validate_long(long)?;
        }
        let handler = match self.handler {
            Some(handler) => handler,
            None => {
                let name = option_key(self.long_name.as_deref(), self.short_name);
                return Err(RegistrationErr::MissingHandler(name));
            }
        };
        Ok(OptionDescriptor {
            long_name: self.long_name,
            short_name: self.short_name,
            handler,
            description: self.description,
            arg_name: self.arg_name,
        })
    }

    /// Set the long option name, `"verbose"` for `--verbose`.
    pub fn long_option(mut self, long_opt: &str) -> Self {
        self.long_name = Some(long_opt.trim().to_owned());
        self
    }

    /// Set the short option character, `'v'` for `-v`.
    pub fn short_option(mut self, opt: char) -> Self {
        self.short_name = Some(opt);
        self
    }

    /// Bind a handler. Its variant decides the option's [`Arity`].
    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Shortcut for `handler(Handler::no_arg(f))`.
    pub fn handler_no_arg<F>(self, f: F) -> Self
        where F: Fn() -> Result<(), String> + 'static {
        self.handler(Handler::no_arg(f))
    }

    /// Shortcut for `handler(Handler::arg(f))`.
    pub fn handler_arg<F>(self, f: F) -> Self
        where F: Fn(&str) -> Result<(), String> + 'static {
        self.handler(Handler::arg(f))
    }

    /// Set the description shown in usage.
    pub fn desc(mut self, description: &str) -> Self {
        self.description = Some(Description::Text(description.trim().to_owned()));
        self
    }

    /// Keep the option out of the usage message.
    pub fn hidden(mut self) -> Self {
        self.description = Some(Description::Hidden);
        self
    }

    /// Set the argument name shown in usage, `"file"` renders as `<file>`.
    pub fn arg_name(mut self, arg_name: &str) -> Self {
        self.arg_name = Some(arg_name.to_owned());
        self
    }
}

impl OptionDescriptor {
    /// Create a [`OptionBuilder`] to config the option.
    pub fn builder() -> OptionBuilder {
        OptionBuilder::default()
    }

    /// Create an option without argument.
    ///
    /// ```
    /// use anpopt::{Arity, OptionDescriptor};
    /// let opt = OptionDescriptor::no_arg(Some("quiet"), Some('q'), || Ok(()), Some("Say less")).unwrap();
    /// assert_eq!(Arity::NoArgument, opt.arity());
    /// ```
    pub fn no_arg<F>(long_opt: Option<&str>, opt: Option<char>, f: F,
                     desc: Option<&str>) -> Result<OptionDescriptor, RegistrationErr>
        where F: Fn() -> Result<(), String> + 'static {
        Self::with_names(long_opt, opt, desc).handler_no_arg(f).build()
    }

    /// Create an option taking an argument.
    pub fn with_arg<F>(long_opt: Option<&str>, opt: Option<char>, f: F,
                       desc: Option<&str>) -> Result<OptionDescriptor, RegistrationErr>
        where F: Fn(&str) -> Result<(), String> + 'static {
        Self::with_names(long_opt, opt, desc).handler_arg(f).build()
    }

    fn with_names(long_opt: Option<&str>, opt: Option<char>, desc: Option<&str>) -> OptionBuilder {
        let mut builder = Self::builder();
        if let Some(long_opt) = long_opt {
            builder = builder.long_option(long_opt);
        }
        if let Some(opt) = opt {
            builder = builder.short_option(opt);
        }
        if let Some(desc) = desc {
            builder = builder.desc(desc);
        }
        builder
    }

    pub fn arity(&self) -> Arity {
        self.handler.arity()
    }

    pub fn has_arg(&self) -> bool {
        self.arity() == Arity::HasArgument
    }

    pub fn is_hidden(&self) -> bool {
        self.description.as_ref().is_some_and(Description::is_hidden)
    }

    pub fn get_long_opt(&self) -> Option<&str> {
        self.long_name.as_deref()
    }

    pub fn get_opt(&self) -> Option<char> {
        self.short_name
    }

    pub fn get_handler(&self) -> &Handler {
        &self.handler
    }

    pub fn get_description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    pub fn get_arg_name(&self) -> Option<&str> {
        self.arg_name.as_deref()
    }

    /// The name used in diagnostics: `--long` if present, else `-s`.
    pub fn get_key(&self) -> String {
        option_key(self.get_long_opt(), self.get_opt())
    }
}

fn option_key(long_opt: Option<&str>, opt: Option<char>) -> String {
    match (long_opt, opt) {
        (Some(long), _) => format!("--{}", long),
        (None, Some(short)) => format!("-{}", short),
        (None, None) => String::new(),
    }
}

impl Display for OptionDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut buf = String::from("[ option: ");

        match self.short_name {
            Some(short) => buf.push(short),
            None => buf.push_str("None"),
        }

        if let Some(long) = &self.long_name {
            buf.push(' ');
            buf.push_str(long);
        }

        if self.has_arg() {
            buf.push_str(" [ARG]")
        }

        buf.push_str(" :: ");
        buf.push_str(match self.description {
            Some(Description::Text(ref desc)) => desc,
            Some(Description::Hidden) => "(hidden)",
            None => "None",
        });

        buf.push_str(" ]");

        write!(f, "{}", buf)
    }
}

/// One entry of a [`Table`].
#[derive(Clone, Debug)]
pub enum TableEntry {
    Option(OptionDescriptor),
    /// A nested table, flattened in place when registered. The description
    /// becomes a section header in usage.
    Subtable(Table, Option<Description>),
    /// Terminates the table; entries after it are ignored.
    End,
}

/// An ordered, possibly nested, sequence of options.
///
/// A table must be terminated by [`Table::end`] before it is registered.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use anpopt::{handlers, Description, OptionDescriptor, Registry, Table};
///
/// let debug = Rc::new(Cell::new(false));
/// let level = Rc::new(Cell::new(0));
///
/// let debug_opts = Table::new()
///     .option(OptionDescriptor::builder().long_option("debug")
///         .handler_no_arg(handlers::set_bool(&debug)).desc("Enable debugging").build().unwrap())
///     .end();
///
/// let table = Table::new()
///     .option(OptionDescriptor::builder().short_option('v')
///         .handler_no_arg(handlers::inc_intval(&level)).desc("More output").build().unwrap())
///     .subtable(debug_opts, Some(Description::from("Developer options")))
///     .end();
///
/// let registry = Registry::new();
/// registry.register_table(table, None).unwrap();
/// assert_eq!(2, registry.len());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Table {
    entries: Vec<TableEntry>,
}

impl Table {
    pub fn new() -> Table {
        Table { entries: Vec::new() }
    }

    pub fn option(mut self, option: OptionDescriptor) -> Self {
        self.push(TableEntry::Option(option));
        self
    }

    pub fn subtable(mut self, table: Table, desc: Option<Description>) -> Self {
        self.push(TableEntry::Subtable(table, desc));
        self
    }

    pub fn end(mut self) -> Self {
        self.push(TableEntry::End);
        self
    }

    /// Append an entry, for tables assembled in a loop.
    pub fn push(&mut self, entry: TableEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }
}

impl From<Vec<TableEntry>> for Table {
    fn from(entries: Vec<TableEntry>) -> Self {
        Table { entries }
    }
}
