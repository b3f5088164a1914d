use std::env;
use std::process::exit;

use tracing::{debug, trace};

use crate::error::ParseErr;
use crate::format::HelpFormatter;
use crate::option::Handler;
use crate::registry::Registry;
use crate::result::ParseResult;

const TERMINATOR: &str = "--";

/// The shape of a single command line token, before any name is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Exactly `--`. Every later token is a positional.
    EndOfOptions,
    /// `--name` or `--name=value`. The value is everything after the first `=`.
    LongOption { name: &'a str, value: Option<&'a str> },
    /// `-abc`, without the leading `-`.
    ShortCluster(&'a str),
    /// Anything else, including a lone `-`.
    Positional,
}

impl<'a> Token<'a> {
    pub fn classify(token: &'a str) -> Token<'a> {
        if token == TERMINATOR {
            Token::EndOfOptions
        } else if let Some(long) = token.strip_prefix(TERMINATOR) {
            match long.split_once('=') {
                Some((name, value)) => Token::LongOption { name, value: Some(value) },
                None => Token::LongOption { name: long, value: None },
            }
        } else if let Some(cluster) = token.strip_prefix('-').filter(|c| !c.is_empty()) {
            Token::ShortCluster(cluster)
        } else {
            Token::Positional
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    AfterTerminator,
    Done,
    Failed,
}

/// The parser trait to parse command line arguments against a [`Registry`].
///
/// In every method the first argument is the program name. It is never
/// treated as an option and is kept in front of the rewritten vector.
pub trait Parser {

    /// Parse `arguments`, invoking the handler of every option found.
    ///
    /// # Error
    ///
    /// Parsing stops at the first unknown option, missing or unexpected
    /// argument, or handler failure, and the [`ParseErr`] is returned.
    /// Handlers of earlier options have already run.
    ///
    /// Also see [`Self::parse`], [`Self::parse_or_exit`]
    fn parse_args<T: AsRef<str>>(&mut self, registry: &Registry, arguments: &[T]) -> Result<ParseResult, ParseErr>;

    /// Parse `args` in place.
    ///
    /// On success `args` is rewritten to the program name followed by the
    /// positionals, and `true` is returned. On failure `args` is left
    /// untouched, `errlog` is called exactly once with the diagnostic and
    /// `false` is returned.
    ///
    /// Also see [`Self::parse_args`], [`Self::parse_or_exit`]
    fn parse<F: FnMut(&str)>(&mut self, registry: &Registry, args: &mut Vec<String>, errlog: F) -> bool;

    /// Parse `env::args()`.
    ///
    /// # Error
    ///
    /// On failure the diagnostic is printed to stderr, the usage rendered by
    /// `formatter` to stdout, and the process exits with status 1.
    ///
    /// Also see [`Self::parse_args`], [`Self::parse`]
    fn parse_or_exit(&mut self, registry: &Registry, formatter: &HelpFormatter, extra: Option<&str>) -> Vec<String>;
}

/// The default implementation of [`Parser`] trait.
///
/// # Examples
///
/// ```
/// use std::cell::{Cell, RefCell};
/// use std::rc::Rc;
/// use anpopt::{handlers, DefaultParser, Parser, Registry};
///
/// let verbose = Rc::new(Cell::new(false));
/// let name = Rc::new(RefCell::new(None));
///
/// let registry = Registry::new();
/// registry.register_no_arg(Some("verbose"), Some('v'), handlers::set_bool(&verbose), None).unwrap();
/// registry.register_arg(Some("name"), None, handlers::set_string(&name), None).unwrap();
///
/// let mut args: Vec<String> = ["prog", "-v", "--name=bob", "file1", "file2"]
///     .iter().map(|s| s.to_string()).collect();
///
/// let mut parser = DefaultParser::builder().build();
/// assert!(parser.parse(&registry, &mut args, anpopt::log_stderr));
/// assert!(verbose.get());
/// assert_eq!(Some("bob".to_string()), *name.borrow());
/// assert_eq!(vec!["prog", "file1", "file2"], args);
/// ```
pub struct DefaultParser {
    stop_at_non_option: bool,
    state: State,
    result: ParseResult,
}

/// A builder struct to create [`DefaultParser`].
pub struct ParserBuilder {
    stop_at_non_option: bool,
}

impl ParserBuilder {
    pub fn build(self) -> DefaultParser {
        DefaultParser {
            stop_at_non_option: self.stop_at_non_option,
            state: State::Scanning,
            result: ParseResult::default(),
        }
    }

    /// Set whether stop parsing options at the first positional and consider
    /// all remaining tokens as positionals.
    pub fn set_stop_at_non_option(mut self, stop_at_non_option: bool) -> Self {
        self.stop_at_non_option = stop_at_non_option;
        self
    }
}

impl DefaultParser {

    /// Get the builder to config parser.
    pub fn builder() -> ParserBuilder {
        ParserBuilder {
            stop_at_non_option: false,
        }
    }

    /// Handle one token in [`State::Scanning`]. Returns how many of the
    /// following tokens were consumed as an option argument.
    fn handle_token(&mut self, registry: &Registry, token: &str, next: Option<&str>) -> Result<usize, ParseErr> {
        let kind = Token::classify(token);
        trace!(token, ?kind, "classified token");

        match kind {
            Token::EndOfOptions => {
                self.result.add_consumed(1);
                self.state = State::AfterTerminator;
                Ok(0)
            }
            Token::LongOption { name, value } => {
                let taken = self.handle_long_option(registry, name, value, next)?;
                self.result.add_consumed(1 + taken);
                Ok(taken)
            }
            Token::ShortCluster(cluster) => {
                let taken = self.handle_short_cluster(registry, cluster, next)?;
                self.result.add_consumed(1 + taken);
                Ok(taken)
            }
            Token::Positional => {
                self.result.add_positional(token);
                if self.stop_at_non_option {
                    self.state = State::AfterTerminator;
                }
                Ok(0)
            }
        }
    }

    fn handle_long_option(&self, registry: &Registry, name: &str, value: Option<&str>,
                          next: Option<&str>) -> Result<usize, ParseErr> {
        let opt_text = format!("{}{}", TERMINATOR, name);
        let option = registry.find_long(name)
            .ok_or_else(|| ParseErr::UnknownOption(opt_text.clone()))?;
        debug!(option = %opt_text, inline_value = value.is_some(), "handling long option");

        match option.get_handler() {
            Handler::NoArg(handler) => {
                if value.is_some() {
                    return Err(ParseErr::UnexpectedArgument(opt_text));
                }
                check_handler(&opt_text, handler())?;
                Ok(0)
            }
            Handler::Arg(handler) => match value {
                Some(value) => {
                    check_handler(&opt_text, handler(value))?;
                    Ok(0)
                }
                None => {
                    let value = take_argument(&opt_text, next)?;
                    check_handler(&opt_text, handler(value))?;
                    Ok(1)
                }
            },
        }
    }

    fn handle_short_cluster(&self, registry: &Registry, cluster: &str,
                            next: Option<&str>) -> Result<usize, ParseErr> {
        for (i, ch) in cluster.char_indices() {
            let opt_text = format!("-{}", ch);
            let option = registry.find_short(ch)
                .ok_or_else(|| ParseErr::UnknownOption(opt_text.clone()))?;
            debug!(option = %opt_text, "handling short option");

            match option.get_handler() {
                Handler::NoArg(handler) => check_handler(&opt_text, handler())?,
                Handler::Arg(handler) => {
                    // the rest of the cluster is the value: -ofile
                    let rest = &cluster[i + ch.len_utf8()..];
                    if !rest.is_empty() {
                        check_handler(&opt_text, handler(rest))?;
                        return Ok(0);
                    }
                    let value = take_argument(&opt_text, next)?;
                    check_handler(&opt_text, handler(value))?;
                    return Ok(1);
                }
            }
        }
        Ok(0)
    }
}

impl Parser for DefaultParser {
    fn parse_args<T>(&mut self, registry: &Registry, arguments: &[T]) -> Result<ParseResult, ParseErr>
        where T: AsRef<str> {
        let tokens: Vec<&str> = arguments.iter().map(AsRef::as_ref).collect();
        registry.set_program_name(tokens.first().copied());

        self.state = State::Scanning;
        self.result = ParseResult::default();

        let mut index = 1;
        while index < tokens.len() {
            let token = tokens[index];
            index += 1;

            if self.state == State::AfterTerminator {
                self.result.add_positional(token);
                continue;
            }

            match self.handle_token(registry, token, tokens.get(index).copied()) {
                Ok(taken) => index += taken,
                Err(err) => {
                    self.state = State::Failed;
                    debug!(token, error = %err, "option parsing failed");
                    return Err(err);
                }
            }
        }

        self.state = State::Done;
        Ok(std::mem::take(&mut self.result))
    }

    fn parse<F>(&mut self, registry: &Registry, args: &mut Vec<String>, mut errlog: F) -> bool
        where F: FnMut(&str) {
        match self.parse_args(registry, args.as_slice()) {
            Ok(result) => {
                args.truncate(1);
                args.extend(result.into_positionals());
                true
            }
            Err(err) => {
                let msg = match args.first().filter(|p| !p.is_empty()) {
                    Some(program) => format!("{}: {}", program, err),
                    None => err.to_string(),
                };
                errlog(&msg);
                false
            }
        }
    }

    fn parse_or_exit(&mut self, registry: &Registry, formatter: &HelpFormatter, extra: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = env::args().collect();
        if self.parse(registry, &mut args, log_stderr) {
            return args;
        }
        let program = args.first().map(String::as_str).unwrap_or_default();
        print!("{}", formatter.render_usage(registry, program, extra));
        exit(1);
    }
}

/// Print an error message to stderr, the standard error reporter for
/// [`Parser::parse`]. It does not exit.
pub fn log_stderr(msg: &str) {
    eprintln!("{}", msg);
}

fn take_argument<'a>(opt_text: &str, next: Option<&'a str>) -> Result<&'a str, ParseErr> {
    match next {
        Some(value) if value != TERMINATOR => Ok(value),
        _ => Err(ParseErr::MissingArgument(opt_text.to_owned())),
    }
}

fn check_handler(opt_text: &str, result: Result<(), String>) -> Result<(), ParseErr> {
    match result {
        Err(message) if !message.is_empty() => Err(ParseErr::HandlerErr {
            option: opt_text.to_owned(),
            message,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::error::ParseErr;
    use crate::handlers;
    use crate::option::{OptionDescriptor, Table};
    use crate::parser::{DefaultParser, Parser, State, Token};
    use crate::registry::Registry;

    fn to_args(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    struct Fixture {
        registry: Registry,
        a: Rc<Cell<bool>>,
        b: Rc<Cell<bool>>,
        verbose: Rc<Cell<i32>>,
        output: Rc<RefCell<Option<String>>>,
        name: Rc<RefCell<Option<String>>>,
    }

    fn fixture() -> Fixture {
        let fixture = Fixture {
            registry: Registry::new(),
            a: Rc::new(Cell::new(false)),
            b: Rc::new(Cell::new(false)),
            verbose: Rc::new(Cell::new(0)),
            output: Rc::new(RefCell::new(None)),
            name: Rc::new(RefCell::new(None)),
        };
        let table = Table::new()
            .option(OptionDescriptor::builder().short_option('a')
                .handler_no_arg(handlers::set_bool(&fixture.a)).build().unwrap())
            .option(OptionDescriptor::builder().short_option('b').long_option("bee")
                .handler_no_arg(handlers::set_bool(&fixture.b)).build().unwrap())
            .option(OptionDescriptor::builder().short_option('v').long_option("verbose")
                .handler_no_arg(handlers::inc_intval(&fixture.verbose)).build().unwrap())
            .option(OptionDescriptor::builder().short_option('o').long_option("output")
                .handler_arg(handlers::set_string(&fixture.output)).build().unwrap())
            .option(OptionDescriptor::builder().long_option("name")
                .handler_arg(handlers::set_string(&fixture.name)).build().unwrap())
            .end();
        fixture.registry.register_table(table, None).unwrap();
        fixture
    }

    fn parse(fixture: &Fixture, args: &[&str]) -> Result<Vec<String>, ParseErr> {
        let mut parser = DefaultParser::builder().build();
        parser.parse_args(&fixture.registry, args).map(|r| r.into_positionals())
    }

    #[test]
    fn test_classify() {
        assert_eq!(Token::EndOfOptions, Token::classify("--"));
        assert_eq!(Token::LongOption { name: "name", value: None }, Token::classify("--name"));
        assert_eq!(Token::LongOption { name: "name", value: Some("a=b") }, Token::classify("--name=a=b"));
        assert_eq!(Token::LongOption { name: "name", value: Some("") }, Token::classify("--name="));
        assert_eq!(Token::LongOption { name: "", value: Some("x") }, Token::classify("--=x"));
        assert_eq!(Token::LongOption { name: "-x", value: None }, Token::classify("---x"));
        assert_eq!(Token::ShortCluster("abc"), Token::classify("-abc"));
        assert_eq!(Token::ShortCluster("="), Token::classify("-="));
        assert_eq!(Token::Positional, Token::classify("-"));
        assert_eq!(Token::Positional, Token::classify(""));
        assert_eq!(Token::Positional, Token::classify("file"));
    }

    #[test]
    fn test_round_trip() {
        let f = fixture();
        let positionals = parse(&f, &["prog", "-v", "--name=bob", "file1", "file2"]).unwrap();
        assert_eq!(1, f.verbose.get());
        assert_eq!(Some("bob".to_string()), *f.name.borrow());
        assert_eq!(vec!["file1", "file2"], positionals);
    }

    #[test]
    fn test_positionals_keep_order_between_options() {
        let f = fixture();
        let mut parser = DefaultParser::builder().build();
        let result = parser.parse_args(&f.registry, &["prog", "x", "-a", "y", "--output", "out", "z"]).unwrap();
        assert_eq!(vec!["x", "y", "z"], result.get_positionals());
        assert_eq!(3, result.get_consumed());
        assert_eq!(Some("out".to_string()), *f.output.borrow());
        assert!(f.a.get());
    }

    #[test]
    fn test_cluster() {
        let f = fixture();
        let positionals = parse(&f, &["prog", "-abofile"]).unwrap();
        assert!(f.a.get());
        assert!(f.b.get());
        assert_eq!(Some("file".to_string()), *f.output.borrow());
        assert!(positionals.is_empty());
    }

    #[test]
    fn test_cluster_takes_next_token_for_last_option() {
        let f = fixture();
        let positionals = parse(&f, &["prog", "-vvo", "-a", "rest"]).unwrap();
        assert_eq!(2, f.verbose.get());
        assert_eq!(Some("-a".to_string()), *f.output.borrow());
        assert!(!f.a.get());
        assert_eq!(vec!["rest"], positionals);
    }

    #[test]
    fn test_long_option_with_separate_value() {
        let f = fixture();
        parse(&f, &["prog", "--output", "--name=x"]).unwrap();
        assert_eq!(Some("--name=x".to_string()), *f.output.borrow());
        assert_eq!(None, *f.name.borrow());

        parse(&f, &["prog", "--output="]).unwrap();
        assert_eq!(Some(String::new()), *f.output.borrow());
    }

    #[test]
    fn test_terminator() {
        let f = fixture();
        let positionals = parse(&f, &["prog", "--", "-v"]).unwrap();
        assert_eq!(vec!["-v"], positionals);
        assert_eq!(0, f.verbose.get());

        let positionals = parse(&f, &["prog", "a", "--", "--", "--bogus"]).unwrap();
        assert_eq!(vec!["a", "--", "--bogus"], positionals);
    }

    #[test]
    fn test_lone_dash_is_positional() {
        let f = fixture();
        assert_eq!(vec!["-"], parse(&f, &["prog", "-", "-a"]).unwrap());
        assert!(f.a.get());
    }

    #[test]
    fn test_missing_argument() {
        let f = fixture();
        assert_eq!(Err(ParseErr::MissingArgument("-o".to_string())), parse(&f, &["prog", "-o"]));
        assert_eq!(None, *f.output.borrow());

        assert_eq!(Err(ParseErr::MissingArgument("--output".to_string())), parse(&f, &["prog", "--output", "--", "x"]));
        assert_eq!(Err(ParseErr::MissingArgument("-o".to_string())), parse(&f, &["prog", "-ao"]));
        assert_eq!(None, *f.output.borrow());
    }

    #[test]
    fn test_unknown_option() {
        let f = fixture();
        let err = parse(&f, &["prog", "--bogus"]).unwrap_err();
        assert_eq!(ParseErr::UnknownOption("--bogus".to_string()), err);
        assert!(err.to_string().contains("bogus"));

        assert_eq!(Err(ParseErr::UnknownOption("--bogus".to_string())), parse(&f, &["prog", "--bogus=1"]));
        assert_eq!(Err(ParseErr::UnknownOption("-x".to_string())), parse(&f, &["prog", "-axb"]));
        assert!(f.a.get());
        assert!(!f.b.get());
    }

    #[test]
    fn test_unexpected_argument() {
        let f = fixture();
        assert_eq!(Err(ParseErr::UnexpectedArgument("--bee".to_string())), parse(&f, &["prog", "--bee=yes"]));
        assert!(!f.b.get());
    }

    #[test]
    fn test_handler_error_stops_parsing() {
        let f = fixture();
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);
        f.registry.register_arg(Some("level"), Some('l'), handlers::set_intval(&Rc::new(Cell::new(0))), None).unwrap();
        f.registry.register_no_arg(Some("count"), None, move || {
            counted.set(counted.get() + 1);
            Ok(())
        }, None).unwrap();

        let err = parse(&f, &["prog", "--count", "-l", "ten", "--count", "-a"]).unwrap_err();
        assert_eq!(ParseErr::HandlerErr { option: "-l".to_string(), message: "Invalid argument 'ten'".to_string() }, err);
        assert_eq!("Invalid argument 'ten'", err.to_string());
        assert_eq!(1, calls.get());
        assert!(!f.a.get());
    }

    #[test]
    fn test_empty_handler_message_is_success() {
        let f = fixture();
        f.registry.register_no_arg(Some("quiet"), Some('q'), || Err(String::new()), None).unwrap();
        assert_eq!(vec!["x"], parse(&f, &["prog", "-q", "x"]).unwrap());
    }

    #[test]
    fn test_parse_rewrites_args() {
        let f = fixture();
        let mut parser = DefaultParser::builder().build();
        let mut args = to_args(&["prog", "in", "-a", "--output", "o", "--", "-b"]);
        let mut logged = Vec::new();
        assert!(parser.parse(&f.registry, &mut args, |msg| logged.push(msg.to_string())));
        assert_eq!(vec!["prog", "in", "-b"], args);
        assert!(logged.is_empty());
        assert_eq!(State::Done, parser.state);
    }

    #[test]
    fn test_failed_parse_leaves_args_untouched() {
        let f = fixture();
        let mut parser = DefaultParser::builder().build();
        let original = to_args(&["prog", "in", "-a", "--bogus", "x"]);
        let mut args = original.clone();
        let mut logged = Vec::new();
        assert!(!parser.parse(&f.registry, &mut args, |msg| logged.push(msg.to_string())));
        assert_eq!(original, args);
        assert_eq!(vec!["prog: unknown option '--bogus'".to_string()], logged);
        assert_eq!(State::Failed, parser.state);
    }

    #[test]
    fn test_parse_without_program_name() {
        let f = fixture();
        let mut parser = DefaultParser::builder().build();
        let mut args: Vec<String> = Vec::new();
        assert!(parser.parse(&f.registry, &mut args, |_| panic!("nothing to report")));
        assert!(args.is_empty());
        assert_eq!(None, f.registry.get_program_name());
    }

    #[test]
    fn test_stop_at_non_option() {
        let f = fixture();
        let mut parser = DefaultParser::builder().set_stop_at_non_option(true).build();
        let result = parser.parse_args(&f.registry, &["prog", "-a", "cmd", "-b", "--bogus"]).unwrap();
        assert_eq!(vec!["cmd", "-b", "--bogus"], result.get_positionals());
        assert!(f.a.get());
        assert!(!f.b.get());
    }

    #[test]
    fn test_handler_may_register_options() {
        let f = fixture();
        let late = Rc::new(Cell::new(false));
        let registry = f.registry.clone();
        let late_flag = Rc::clone(&late);
        f.registry.register_no_arg(Some("enable-late"), None, move || {
            registry.register_no_arg(Some("late"), None, handlers::set_bool(&late_flag), None)
                .map_err(|e| e.to_string())
        }, None).unwrap();

        let positionals = parse(&f, &["prog", "--enable-late", "--late", "x"]).unwrap();
        assert!(late.get());
        assert_eq!(vec!["x"], positionals);
        assert!(f.registry.find_long("late").is_some());
    }

    #[test]
    fn test_program_name_is_recorded() {
        let f = fixture();
        parse(&f, &["/usr/bin/tool", "-a"]).unwrap();
        assert_eq!(Some("/usr/bin/tool".to_string()), f.registry.get_program_name());
    }

    #[test]
    fn test_non_ascii_short_options() {
        let f = fixture();
        let value = Rc::new(RefCell::new(None));
        f.registry.register_arg(None, Some('é'), handlers::set_string(&value), None).unwrap();
        parse(&f, &["prog", "-aéñ"]).unwrap();
        assert_eq!(Some("ñ".to_string()), *value.borrow());
        assert!(f.a.get());
    }
}
