/// The `ParseResult` holds what a successful parse left over.
///
/// Positionals are the tokens not consumed by any option, in their original
/// order. The program name (`argv[0]`) is not part of them. Everything after
/// a `--` terminator is a positional, whatever it looks like.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    positionals: Vec<String>,
    consumed: usize,
}

impl ParseResult {
    pub(crate) fn add_positional(&mut self, token: &str) {
        self.positionals.push(token.to_owned());
    }

    pub(crate) fn add_consumed(&mut self, count: usize) {
        self.consumed += count;
    }

    /// Get the positional arguments.
    pub fn get_positionals(&self) -> Vec<&str> {
        self.positionals.iter().map(|a| a.as_str()).collect()
    }

    /// Number of tokens removed from the argument vector: options, their
    /// separate arguments and the `--` terminator.
    pub fn get_consumed(&self) -> usize {
        self.consumed
    }

    pub fn into_positionals(self) -> Vec<String> {
        self.positionals
    }
}
