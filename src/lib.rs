//! # The AnpOpt Library
//!
//! The AnpOpt library parses command line options from a declarative table.
//! Each option names a handler that is called while the argument vector is
//! walked, and the same table renders the usage message.
//!
//! AnpOpt supports:
//!
//! - POSIX like short options, clustered, for example `tar -zxvf foo.tar.gz`
//! - Short options with value attached, for example `gcc -O2 foo.c`
//! - GNU like long options, for example `du --max-depth=1` or `du --max-depth 1`
//! - The `--` terminator, after which every token is a positional argument
//! - Nested option tables, printed as sections of the usage message
//!
//! A typical usage message displayed by AnpOpt looks like this:
//!
//! ```txt
//! Usage: ls [<file>...]
//!   -a, --all                 do not hide entries starting with .
//!   --block-size <SIZE>       use SIZE-byte blocks
//! Sorting:
//!   -t                        sort by time, newest first
//! ```
//!
//! # Examples
//!
//! A table registered in the thread-local default registry.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use anpopt::{handlers, Description, OptionDescriptor, Table};
//!
//! let all = Rc::new(Cell::new(false));
//! let block_size = Rc::new(Cell::new(0u64));
//! let by_time = Rc::new(Cell::new(false));
//!
//! let sorting = Table::new()
//!     .option(OptionDescriptor::builder().short_option('t')
//!         .handler_no_arg(handlers::set_bool(&by_time))
//!         .desc("sort by time, newest first").build().unwrap())
//!     .end();
//!
//! let table = Table::new()
//!     .option(OptionDescriptor::builder().short_option('a').long_option("all")
//!         .handler_no_arg(handlers::set_bool(&all))
//!         .desc("do not hide entries starting with .").build().unwrap())
//!     .option(OptionDescriptor::builder().long_option("block-size").arg_name("SIZE")
//!         .handler_arg(handlers::set_ulongval(&block_size))
//!         .desc("use SIZE-byte blocks").build().unwrap())
//!     .subtable(sorting, Some(Description::from("Sorting")))
//!     .end();
//!
//! anpopt::register_table(table, None).expect("option table is malformed");
//!
//! let mut args: Vec<String> = ["ls", "-at", "--block-size", "1024", "src"]
//!     .iter().map(|s| s.to_string()).collect();
//! if !anpopt::parse(&mut args, anpopt::log_stderr) {
//!     eprint!("{}", anpopt::usage(&args[0], Some("[<file>...]")));
//!     std::process::exit(1);
//! }
//!
//! assert!(all.get() && by_time.get());
//! assert_eq!(1024, block_size.get());
//! assert_eq!(vec!["ls", "src"], args);
//! ```
//!
//! An explicit [`Registry`] with a custom handler.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use anpopt::{DefaultParser, ParseErr, Parser, Registry};
//!
//! let colors = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&colors);
//!
//! let registry = Registry::new();
//! registry.register_arg(Some("color"), Some('c'), move |value| {
//!     match value {
//!         "red" | "green" | "blue" => {
//!             sink.borrow_mut().push(value.to_string());
//!             Ok(())
//!         }
//!         _ => Err(format!("unsupported color '{}'", value)),
//!     }
//! }, Some("add a color")).unwrap();
//!
//! let mut parser = DefaultParser::builder().build();
//! let result = parser.parse_args(&registry, &["paint", "-cred", "--color=blue", "wall"]).unwrap();
//! assert_eq!(vec!["wall"], result.get_positionals());
//! assert_eq!(vec!["red", "blue"], *colors.borrow());
//!
//! let err = parser.parse_args(&registry, &["paint", "--color", "pink"]).unwrap_err();
//! assert!(matches!(err, ParseErr::HandlerErr { .. }));
//! assert_eq!("unsupported color 'pink'", err.to_string());
//! ```

pub use error::{ParseErr, RegistrationErr};
pub use format::{HelpFormatter, DEFAULT_LINE_SEPARATOR};
pub use option::{ArgFn, Arity, Description, Handler, NoArgFn, OptionBuilder, OptionDescriptor, Table, TableEntry};
pub use parser::{log_stderr, DefaultParser, Parser, ParserBuilder, Token};
pub use registry::{OptionGroup, Registry};
pub use result::ParseResult;
pub use util::{OptionValidator, Util};

pub mod handlers;
mod format;
mod util;
mod option;
mod registry;
mod result;
mod parser;
mod error;

/// Register `table` in the thread-local default registry.
///
/// See [`Registry::register_table`].
pub fn register_table(table: Table, desc: Option<Description>) -> Result<(), RegistrationErr> {
    Registry::global().register_table(table, desc)
}

/// Parse `args` against the thread-local default registry.
///
/// See [`Parser::parse`].
pub fn parse<F: FnMut(&str)>(args: &mut Vec<String>, errlog: F) -> bool {
    DefaultParser::builder().build().parse(&Registry::global(), args, errlog)
}

/// Render the usage message of the thread-local default registry.
///
/// See [`Registry::usage`].
pub fn usage(program: &str, extra: Option<&str>) -> String {
    Registry::global().usage(program, extra)
}
