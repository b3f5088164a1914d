use regex::Regex;

use crate::error::RegistrationErr;

/// String helpers available to option handlers.
pub struct Util;

impl Util {
    /// Split `string` on any character in `delims`.
    ///
    /// Exactly one delimiter is consumed at each boundary, so consecutive
    /// delimiters yield empty pieces. A trailing delimiter does not produce a
    /// trailing empty piece.
    ///
    /// ```
    /// use anpopt::Util;
    /// assert_eq!(vec!["a", "", "b"], Util::split("a,,b,", ","));
    /// assert_eq!(vec!["key", "value"], Util::split("key=value", "=:"));
    /// ```
    pub fn split<'a>(string: &'a str, delims: &str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut rest = string;

        while !rest.is_empty() {
            match rest.find(|c: char| delims.contains(c)) {
                Some(pos) => {
                    pieces.push(&rest[..pos]);
                    let delim_len = rest[pos..].chars().next().map_or(0, char::len_utf8);
                    rest = &rest[pos + delim_len..];
                }
                None => {
                    pieces.push(rest);
                    break;
                }
            }
        }
        pieces
    }

    /// Concatenate `strings`, appending `delim` after every element.
    ///
    /// ```
    /// use anpopt::Util;
    /// assert_eq!("a\nb\n", Util::join(&["a", "b"], "\n"));
    /// ```
    pub fn join<S: AsRef<str>>(strings: &[S], delim: &str) -> String {
        strings.iter().fold(String::new(), |mut acc, s| {
            acc.push_str(s.as_ref());
            acc.push_str(delim);
            acc
        })
    }

    /// Match `string` against `pattern` and store capture groups into `slots`.
    ///
    /// `slots[i]` receives group `i + 1`; a group that did not participate in
    /// the match is stored as `None`. Returns `Ok(false)` without touching
    /// `slots` when the pattern does not match.
    ///
    /// # Panics
    ///
    /// Panics if `slots.len()` differs from the number of capture groups.
    ///
    /// ```
    /// use anpopt::Util;
    /// let mut slots = [None, None];
    /// assert!(Util::regex_captures("width=80", r"(\w+)=(\d+)", &mut slots).unwrap());
    /// assert_eq!(Some("80"), slots[1].as_deref());
    /// ```
    pub fn regex_captures(string: &str, pattern: &str, slots: &mut [Option<String>]) -> Result<bool, regex::Error> {
        let re = Regex::new(pattern)?;
        assert_eq!(re.captures_len() - 1, slots.len(),
                   "pattern '{}' has {} capture groups but {} slots were given",
                   pattern, re.captures_len() - 1, slots.len());

        let Some(caps) = re.captures(string) else {
            return Ok(false);
        };
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = caps.get(i + 1).map(|m| m.as_str().to_owned());
        }
        Ok(true)
    }
}

pub struct OptionValidator;

impl OptionValidator {
    fn is_valid_short(c: char) -> bool {
        !(c == '-' || c == '=' || c.is_whitespace() || c.is_control())
    }

    pub fn validate_short(c: char) -> Result<(), RegistrationErr> {
        if !Self::is_valid_short(c) {
            return Err(RegistrationErr::InvalidName {
                name: c.to_string(),
                reason: "not usable as a short option",
            });
        }
        Ok(())
    }

    pub fn validate_long(option: &str) -> Result<(), RegistrationErr> {
        let reason = if option.is_empty() {
            "long option name is blank"
        } else if option.starts_with('-') {
            "long option name must not start with '-'"
        } else if option.contains('=') {
            "long option name must not contain '='"
        } else if option.chars().any(char::is_whitespace) {
            "long option name must not contain whitespace"
        } else {
            return Ok(());
        };
        Err(RegistrationErr::InvalidName { name: option.to_string(), reason })
    }
}
