//! Standard option handlers.
//!
//! Each function binds a shared slot and returns the closure to register,
//! either through [`OptionBuilder::handler_no_arg`](crate::OptionBuilder::handler_no_arg) /
//! [`OptionBuilder::handler_arg`](crate::OptionBuilder::handler_arg) or
//! [`Registry::register_no_arg`] / [`Registry::register_arg`].
//!
//! ```
//! use std::cell::{Cell, RefCell};
//! use std::rc::Rc;
//! use anpopt::{handlers, DefaultParser, Parser, Registry};
//!
//! let count = Rc::new(Cell::new(0u32));
//! let name = Rc::new(RefCell::new(None));
//!
//! let registry = Registry::new();
//! registry.register_arg(Some("count"), Some('c'), handlers::set_uintval(&count), None).unwrap();
//! registry.register_arg(Some("name"), None, handlers::set_string(&name), None).unwrap();
//!
//! let mut parser = DefaultParser::builder().build();
//! parser.parse_args(&registry, &["prog", "-c", "0x10", "--name=bob"]).unwrap();
//! assert_eq!(16, count.get());
//! assert_eq!(Some("bob".to_string()), *name.borrow());
//! ```

use std::cell::{Cell, RefCell};
use std::process::exit;
use std::rc::Rc;

use crate::registry::Registry;

/// The message for an argument a handler cannot accept:
/// `Invalid argument '<arg>'`.
pub fn invalid_argument(arg: &str) -> String {
    format!("Invalid argument '{}'", arg)
}

/// Set `flag` to `true`.
pub fn set_bool(flag: &Rc<Cell<bool>>) -> impl Fn() -> Result<(), String> {
    let flag = Rc::clone(flag);
    move || {
        flag.set(true);
        Ok(())
    }
}

/// Set `flag` to `false`.
pub fn set_invbool(flag: &Rc<Cell<bool>>) -> impl Fn() -> Result<(), String> {
    let flag = Rc::clone(flag);
    move || {
        flag.set(false);
        Ok(())
    }
}

/// Set `flag` from `yes`/`no`/`true`/`false`, ignoring case.
pub fn set_bool_arg(flag: &Rc<Cell<bool>>) -> impl Fn(&str) -> Result<(), String> {
    let flag = Rc::clone(flag);
    move |arg: &str| {
        flag.set(parse_bool(arg)?);
        Ok(())
    }
}

/// Like [`set_bool_arg`] but stores the negation.
pub fn set_invbool_arg(flag: &Rc<Cell<bool>>) -> impl Fn(&str) -> Result<(), String> {
    let flag = Rc::clone(flag);
    move |arg: &str| {
        flag.set(!parse_bool(arg)?);
        Ok(())
    }
}

/// Store the argument verbatim.
pub fn set_string(slot: &Rc<RefCell<Option<String>>>) -> impl Fn(&str) -> Result<(), String> {
    let slot = Rc::clone(slot);
    move |arg: &str| {
        *slot.borrow_mut() = Some(arg.to_owned());
        Ok(())
    }
}

/// Parse the argument as an integer and store it.
///
/// Accepts an optional sign, a `0x` prefix for hexadecimal and a leading `0`
/// for octal. Anything else, including a value out of range for `T`, is
/// rejected with [`invalid_argument`].
pub fn set_value<T>(slot: &Rc<Cell<T>>) -> impl Fn(&str) -> Result<(), String>
    where T: TryFrom<i128> + Copy + 'static {
    let slot = Rc::clone(slot);
    move |arg: &str| {
        slot.set(parse_number(arg)?);
        Ok(())
    }
}

pub fn set_intval(slot: &Rc<Cell<i32>>) -> impl Fn(&str) -> Result<(), String> {
    set_value(slot)
}

pub fn set_uintval(slot: &Rc<Cell<u32>>) -> impl Fn(&str) -> Result<(), String> {
    set_value(slot)
}

pub fn set_longval(slot: &Rc<Cell<i64>>) -> impl Fn(&str) -> Result<(), String> {
    set_value(slot)
}

pub fn set_ulongval(slot: &Rc<Cell<u64>>) -> impl Fn(&str) -> Result<(), String> {
    set_value(slot)
}

/// Set a numeric slot to `1`, the argument-less form of [`set_value`].
pub fn set_one<T>(slot: &Rc<Cell<T>>) -> impl Fn() -> Result<(), String>
    where T: From<u8> + Copy + 'static {
    let slot = Rc::clone(slot);
    move || {
        slot.set(T::from(1));
        Ok(())
    }
}

/// Add one to `counter` on every occurrence, as in `-vvv`.
pub fn inc_intval(counter: &Rc<Cell<i32>>) -> impl Fn() -> Result<(), String> {
    let counter = Rc::clone(counter);
    move || {
        counter.set(counter.get().saturating_add(1));
        Ok(())
    }
}

/// Print `version` to stdout and exit with status 0.
pub fn show_version_and_exit(version: &str) -> impl Fn() -> Result<(), String> {
    let version = version.to_owned();
    move || -> Result<(), String> {
        println!("{}", version);
        exit(0)
    }
}

/// Print the usage of `registry` to stdout and exit with status 0.
///
/// The program name is the `argv[0]` of the running parse.
pub fn usage_and_exit(registry: &Registry, extra: &str) -> impl Fn() -> Result<(), String> {
    let registry = registry.downgrade();
    let extra = extra.to_owned();
    move || -> Result<(), String> {
        if let Some(registry) = registry.upgrade() {
            let program = registry.get_program_name()
                .or_else(|| std::env::args().next())
                .unwrap_or_default();
            print!("{}", registry.usage(&program, Some(&extra)));
        }
        exit(0)
    }
}

fn parse_bool(arg: &str) -> Result<bool, String> {
    if arg.eq_ignore_ascii_case("yes") || arg.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if arg.eq_ignore_ascii_case("no") || arg.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("invalid value '{}'", arg))
    }
}

fn parse_number<T: TryFrom<i128>>(arg: &str) -> Result<T, String> {
    let (negative, unsigned) = match arg.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, arg.strip_prefix('+').unwrap_or(arg)),
    };

    let (radix, digits) = if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid_argument(arg));
    }

    let magnitude = i128::from_str_radix(digits, radix).map_err(|_| invalid_argument(arg))?;
    let value = if negative { -magnitude } else { magnitude };
    T::try_from(value).map_err(|_| invalid_argument(arg))
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::handlers::*;

    #[test]
    fn test_bool_setters() {
        let flag = Rc::new(Cell::new(false));
        set_bool(&flag)().unwrap();
        assert!(flag.get());
        set_invbool(&flag)().unwrap();
        assert!(!flag.get());

        let set = set_bool_arg(&flag);
        set("YES").unwrap();
        assert!(flag.get());
        set("false").unwrap();
        assert!(!flag.get());
        set("True").unwrap();
        assert!(flag.get());
        assert_eq!(Err("invalid value 'maybe'".to_string()), set("maybe"));
        assert!(flag.get());

        let inverted = set_invbool_arg(&flag);
        inverted("yes").unwrap();
        assert!(!flag.get());
        inverted("no").unwrap();
        assert!(flag.get());
    }

    #[test]
    fn test_set_string() {
        let slot = Rc::new(RefCell::new(None));
        let set = set_string(&slot);
        set("").unwrap();
        assert_eq!(Some(String::new()), *slot.borrow());
        set("a b").unwrap();
        assert_eq!(Some("a b".to_string()), *slot.borrow());
    }

    #[test]
    fn test_number_setters() {
        let int = Rc::new(Cell::new(0i32));
        let set = set_intval(&int);
        set("42").unwrap();
        assert_eq!(42, int.get());
        set("-17").unwrap();
        assert_eq!(-17, int.get());
        set("+8").unwrap();
        assert_eq!(8, int.get());
        set("0x1f").unwrap();
        assert_eq!(31, int.get());
        set("010").unwrap();
        assert_eq!(8, int.get());
        set("0").unwrap();
        assert_eq!(0, int.get());
        assert_eq!(Err("Invalid argument '12abc'".to_string()), set("12abc"));
        assert_eq!(Err("Invalid argument '3000000000'".to_string()), set("3000000000"));
        assert!(set("").is_err());
        assert!(set("-").is_err());
        assert!(set("0x").is_err());
        assert!(set("09").is_err());
        assert!(set(" 1").is_err());
        assert_eq!(0, int.get());

        let uint = Rc::new(Cell::new(0u32));
        assert!(set_uintval(&uint)("-1").is_err());
        set_uintval(&uint)("4000000000").unwrap();
        assert_eq!(4_000_000_000, uint.get());

        let long = Rc::new(Cell::new(0i64));
        set_longval(&long)("-9000000000").unwrap();
        assert_eq!(-9_000_000_000, long.get());

        let ulong = Rc::new(Cell::new(0u64));
        set_ulongval(&ulong)("0xffffffffffffffff").unwrap();
        assert_eq!(u64::MAX, ulong.get());
        assert!(set_ulongval(&ulong)("0x10000000000000000").is_err());
    }

    #[test]
    fn test_set_one_and_increment() {
        let level = Rc::new(Cell::new(7i64));
        set_one(&level)().unwrap();
        assert_eq!(1, level.get());

        let counter = Rc::new(Cell::new(0));
        let inc = inc_intval(&counter);
        inc().unwrap();
        inc().unwrap();
        inc().unwrap();
        assert_eq!(3, counter.get());
    }

    #[test]
    fn test_invalid_argument() {
        assert_eq!("Invalid argument 'x'", invalid_argument("x"));
    }
}
