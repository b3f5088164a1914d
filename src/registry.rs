use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::error::RegistrationErr;
use crate::format::HelpFormatter;
use crate::option::{Description, OptionDescriptor, Table, TableEntry};

thread_local! {
    static GLOBAL_REGISTRY: Registry = Registry::new();
}

/// The options registered by one table or subtable, as a range of indices
/// into the registry. Usage output prints the description as a section
/// header above the range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionGroup {
    description: Option<Description>,
    start: usize,
    end: usize,
}

impl OptionGroup {
    pub fn get_description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    pub fn is_hidden(&self) -> bool {
        self.description.as_ref().is_some_and(Description::is_hidden)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Default)]
struct RegistryInner {
    options: Vec<OptionDescriptor>,
    groups: Vec<OptionGroup>,
    long_opts: HashMap<String, usize>,
    short_opts: HashMap<char, usize>,
    program_name: Option<String>,
}

/// The `Registry` is the flattened collection of all registered options.
///
/// Options are appended by [`Registry::register_table`] and friends and
/// never removed, except by [`Registry::reset`]. Long and short names are
/// unique across the whole registry.
///
/// `Registry` is a shared handle: clones refer to the same options. This lets
/// a handler such as [`crate::handlers::usage_and_exit`] render the usage of
/// the registry it is registered in. A thread-local instance is available
/// through [`Registry::global`].
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use anpopt::{handlers, Registry};
///
/// let verbose = Rc::new(Cell::new(false));
/// let registry = Registry::new();
/// registry.register_no_arg(Some("verbose"), Some('v'), handlers::set_bool(&verbose), Some("Verbose mode"))
///     .unwrap();
///
/// assert!(registry.find_short('v').is_some());
/// assert!(registry.usage("prog", None).contains("--verbose"));
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// The thread-local registry used by the crate level functions
    /// [`crate::register_table`], [`crate::parse`] and [`crate::usage`].
    pub fn global() -> Registry {
        GLOBAL_REGISTRY.with(Registry::clone)
    }

    /// Register a table of options, flattening its subtables in place.
    ///
    /// The table and every subtable must be terminated by
    /// [`TableEntry::End`]. `desc` is the section header of the table in
    /// usage; [`Description::Hidden`] hides all of its options.
    ///
    /// Nothing is registered if the table is rejected.
    ///
    /// # Error
    ///
    /// Returns [`RegistrationErr`] if a (sub)table misses its end marker or
    /// an option name collides with one already registered.
    pub fn register_table(&self, table: Table, desc: Option<Description>) -> Result<(), RegistrationErr> {
        let mut inner = self.inner.borrow_mut();

        let base = inner.options.len();
        let mut options = Vec::new();
        let mut groups = Vec::new();
        flatten(&table, desc, base, &mut options, &mut groups)?;

        let mut long_opts = HashMap::new();
        let mut short_opts = HashMap::new();
        for (i, option) in options.iter().enumerate() {
            if let Some(long) = option.get_long_opt() {
                if inner.long_opts.contains_key(long) || long_opts.insert(long.to_owned(), base + i).is_some() {
                    return Err(RegistrationErr::DuplicateLong(long.to_owned()));
                }
            }
            if let Some(short) = option.get_opt() {
                if inner.short_opts.contains_key(&short) || short_opts.insert(short, base + i).is_some() {
                    return Err(RegistrationErr::DuplicateShort(short));
                }
            }
        }

        debug!(options = options.len(), groups = groups.len(), total = base + options.len(), "registered option table");

        inner.options.extend(options);
        inner.groups.extend(groups);
        inner.long_opts.extend(long_opts);
        inner.short_opts.extend(short_opts);
        Ok(())
    }

    /// Register a single option.
    pub fn register(&self, option: OptionDescriptor) -> Result<(), RegistrationErr> {
        self.register_table(Table::new().option(option).end(), None)
    }

    /// Register an option without argument.
    ///
    /// Also see [`Self::register_arg`].
    pub fn register_no_arg<F>(&self, long_opt: Option<&str>, opt: Option<char>, handler: F,
                              desc: Option<&str>) -> Result<(), RegistrationErr>
        where F: Fn() -> Result<(), String> + 'static {
        self.register(OptionDescriptor::no_arg(long_opt, opt, handler, desc)?)
    }

    /// Register an option with an argument.
    ///
    /// Also see [`Self::register_no_arg`].
    pub fn register_arg<F>(&self, long_opt: Option<&str>, opt: Option<char>, handler: F,
                           desc: Option<&str>) -> Result<(), RegistrationErr>
        where F: Fn(&str) -> Result<(), String> + 'static {
        self.register(OptionDescriptor::with_arg(long_opt, opt, handler, desc)?)
    }

    /// Look up an option by its long name, without the `--` prefix.
    pub fn find_long(&self, long_opt: &str) -> Option<OptionDescriptor> {
        let inner = self.inner.borrow();
        inner.long_opts.get(long_opt).map(|&i| inner.options[i].clone())
    }

    /// Look up an option by its short character.
    pub fn find_short(&self, opt: char) -> Option<OptionDescriptor> {
        let inner = self.inner.borrow();
        inner.short_opts.get(&opt).map(|&i| inner.options[i].clone())
    }

    /// All options in registration order.
    pub fn descriptors(&self) -> Vec<OptionDescriptor> {
        self.inner.borrow().options.clone()
    }

    /// All table ranges in registration order, outer tables before the
    /// subtables they contain.
    pub fn groups(&self) -> Vec<OptionGroup> {
        self.inner.borrow().groups.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().options.is_empty()
    }

    /// Remove every option and group.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.options.clear();
        inner.groups.clear();
        inner.long_opts.clear();
        inner.short_opts.clear();
        inner.program_name = None;
    }

    /// The program name (`argv[0]`) seen by the last parse, if any.
    pub fn get_program_name(&self) -> Option<String> {
        self.inner.borrow().program_name.clone()
    }

    pub(crate) fn set_program_name(&self, program: Option<&str>) {
        self.inner.borrow_mut().program_name = program.map(str::to_owned);
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Rc::downgrade(&self.inner))
    }

    /// Render the usage message with the default [`HelpFormatter`].
    pub fn usage(&self, program: &str, extra: Option<&str>) -> String {
        HelpFormatter::new().render_usage(self, program, extra)
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Registry")
            .field("options", &inner.options)
            .field("groups", &inner.groups)
            .finish()
    }
}

/// A handle that does not keep the registry alive. Handlers stored inside a
/// registry hold this to avoid a reference cycle.
#[derive(Clone)]
pub(crate) struct WeakRegistry(Weak<RefCell<RegistryInner>>);

impl WeakRegistry {
    pub(crate) fn upgrade(&self) -> Option<Registry> {
        self.0.upgrade().map(|inner| Registry { inner })
    }
}

fn flatten(table: &Table, desc: Option<Description>, base: usize,
           options: &mut Vec<OptionDescriptor>, groups: &mut Vec<OptionGroup>) -> Result<(), RegistrationErr> {
    let group = groups.len();
    let start = base + options.len();
    groups.push(OptionGroup { description: desc, start, end: start });

    let mut terminated = false;
    for entry in table.entries() {
        match entry {
            TableEntry::Option(option) => options.push(option.clone()),
            TableEntry::Subtable(subtable, sub_desc) => {
                flatten(subtable, sub_desc.clone(), base, options, groups)?;
            }
            TableEntry::End => {
                terminated = true;
                break;
            }
        }
    }
    if !terminated {
        return Err(RegistrationErr::MissingEndMarker);
    }

    groups[group].end = base + options.len();
    Ok(())
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::error::RegistrationErr;
    use crate::handlers;
    use crate::option::{Description, OptionDescriptor, Table, TableEntry};
    use crate::registry::Registry;

    fn flag(short: char) -> OptionDescriptor {
        OptionDescriptor::builder().short_option(short).handler_no_arg(|| Ok(())).build().unwrap()
    }

    fn long(name: &str) -> OptionDescriptor {
        OptionDescriptor::builder().long_option(name).handler_arg(|_| Ok(())).build().unwrap()
    }

    #[test]
    fn test_flatten_preserves_document_order() {
        let inner = Table::new().option(flag('c')).option(flag('d')).end();
        let middle = Table::new().option(flag('b')).subtable(inner, None).option(flag('e')).end();
        let table = Table::new().option(flag('a')).subtable(middle, Some(Description::from("More"))).option(flag('f')).end();

        let registry = Registry::new();
        registry.register_table(table, None).unwrap();

        let order: String = registry.descriptors().iter().filter_map(|o| o.get_opt()).collect();
        assert_eq!("abcdef", order);

        let ranges: Vec<(usize, usize)> = registry.groups().iter().map(|g| (g.start(), g.end())).collect();
        assert_eq!(vec![(0, 6), (1, 5), (2, 4)], ranges);
        assert_eq!(Some(&Description::from("More")), registry.groups()[1].get_description());
    }

    #[test]
    fn test_groups_are_offset_by_previous_registrations() {
        let registry = Registry::new();
        registry.register(flag('a')).unwrap();
        registry.register_table(Table::new().option(flag('b')).option(flag('c')).end(),
                                Some(Description::from("Second"))).unwrap();

        let groups = registry.groups();
        assert_eq!(2, groups.len());
        assert_eq!((1, 3), (groups[1].start(), groups[1].end()));
        assert!(groups[1].contains(2));
        assert!(!groups[1].contains(0));
    }

    #[test]
    fn test_entries_after_end_are_ignored() {
        let registry = Registry::new();
        let table = Table::from(vec![
            TableEntry::Option(flag('a')),
            TableEntry::End,
            TableEntry::Option(flag('b')),
        ]);
        registry.register_table(table, None).unwrap();
        assert_eq!(1, registry.len());
        assert!(registry.find_short('b').is_none());
    }

    #[test]
    fn test_missing_end_marker() {
        let registry = Registry::new();
        let result = registry.register_table(Table::new().option(flag('a')), None);
        assert_eq!(Err(RegistrationErr::MissingEndMarker), result);

        let nested = Table::new().subtable(Table::new().option(flag('b')), None).end();
        assert_eq!(Err(RegistrationErr::MissingEndMarker), registry.register_table(nested, None));
        assert!(registry.is_empty());
        assert!(registry.groups().is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let registry = Registry::new();
        registry.register(long("name")).unwrap();
        registry.register(flag('n')).unwrap();

        assert_eq!(Err(RegistrationErr::DuplicateLong("name".to_string())), registry.register(long("name")));
        assert_eq!(Err(RegistrationErr::DuplicateShort('n')), registry.register(flag('n')));

        let twice = Table::new().option(long("other")).option(long("other")).end();
        assert_eq!(Err(RegistrationErr::DuplicateLong("other".to_string())), registry.register_table(twice, None));
        assert_eq!(2, registry.len());
        assert!(registry.find_long("other").is_none());
    }

    #[test]
    fn test_register_shortcuts() {
        let verbose = Rc::new(Cell::new(false));
        let registry = Registry::new();
        registry.register_no_arg(Some("verbose"), Some('v'), handlers::set_bool(&verbose), Some("Verbose mode"))
            .unwrap();
        registry.register_arg(None, Some('o'), |_| Ok(()), None).unwrap();

        assert_eq!(Some('v'), registry.find_long("verbose").and_then(|o| o.get_opt()));
        assert!(registry.find_short('o').is_some_and(|o| o.has_arg()));
        assert_eq!(Err(RegistrationErr::MissingName), registry.register_no_arg(None, None, || Ok(()), None));
    }

    #[test]
    fn test_clones_share_state_and_reset() {
        let registry = Registry::new();
        let other = registry.clone();
        registry.register(flag('x')).unwrap();
        assert_eq!(1, other.len());

        other.reset();
        assert!(registry.is_empty());
        assert!(registry.groups().is_empty());
        registry.register(flag('x')).unwrap();
    }
}
