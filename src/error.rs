use thiserror::Error;

/// Argument parsing error.
///
/// Every variant stops the parse at the token that produced it. The
/// [`Display`](std::fmt::Display) output is the diagnostic handed to the
/// error reporter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErr {
    /// The token names an option, or a cluster contains a character,
    /// that no registered descriptor matches.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// An inline `=value` was given to a long option that takes no argument.
    #[error("unexpected value for '{0}'")]
    UnexpectedArgument(String),

    /// An option requiring an argument was the last token, or was followed
    /// by the `--` terminator.
    #[error("missing argument for '{0}'")]
    MissingArgument(String),

    /// The handler bound to `option` rejected its input. The message is
    /// reported verbatim.
    #[error("{message}")]
    HandlerErr { option: String, message: String },
}

impl ParseErr {
    /// The option text (`--name` or `-c`) the error refers to.
    pub fn option(&self) -> &str {
        match self {
            ParseErr::UnknownOption(opt)
            | ParseErr::UnexpectedArgument(opt)
            | ParseErr::MissingArgument(opt) => opt,
            ParseErr::HandlerErr { option, .. } => option,
        }
    }
}

/// A malformed option table.
///
/// These are bugs in the program declaring the options, not in the user's
/// command line. Callers usually `expect` registration results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationErr {
    /// The table (or one of its subtables) has no [`TableEntry::End`](crate::TableEntry::End).
    #[error("option table is not terminated by an end marker")]
    MissingEndMarker,

    /// A descriptor has neither a long nor a short name.
    #[error("either a long or a short option name must be specified")]
    MissingName,

    /// An [`OptionBuilder`](crate::OptionBuilder) was built without a handler.
    #[error("no handler bound to option '{0}'")]
    MissingHandler(String),

    #[error("illegal option name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("duplicate long option '--{0}'")]
    DuplicateLong(String),

    #[error("duplicate short option '-{0}'")]
    DuplicateShort(char),
}
