use std::io::Write;

use crate::option::{Description, OptionDescriptor};
use crate::registry::Registry;

pub const DEFAULT_LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

const DEFAULT_WIDTH: usize = 79;
const DEFAULT_LEFT_PAD: usize = 2;
const DEFAULT_DESC_PAD: usize = 4;
const DEFAULT_SYNTAX_PREFIX: &str = "Usage: ";
const DEFAULT_ARG_NAME: &str = "value";

/// `HelpFormatter` renders the usage message of a [`Registry`].
///
/// The output format is like:
/// ```txt
/// Usage: <program> [extra]
///   -<opt>, --<long_opt>            <description>
///   -<opt>                          <description>
/// <table description>:
///   --<long_opt> <arg_name>         <description>
/// ```
///
/// Options appear in registration order. The description of every
/// registered table or subtable is printed as a header above its options.
/// Hidden options, and all options of hidden tables, are left out.
pub struct HelpFormatter {
    width: usize,
    left_pad: usize,
    desc_pad: usize,
    syntax_prefix: String,
    newline: String,
    arg_name: String,
}

impl Default for HelpFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpFormatter {
    /// Create a `HelpFormatter` with default configuration.
    pub fn new() -> HelpFormatter {
        HelpFormatter {
            width: DEFAULT_WIDTH,
            left_pad: DEFAULT_LEFT_PAD,
            desc_pad: DEFAULT_DESC_PAD,
            syntax_prefix: DEFAULT_SYNTAX_PREFIX.to_string(),
            newline: DEFAULT_LINE_SEPARATOR.to_string(),
            arg_name: DEFAULT_ARG_NAME.to_string(),
        }
    }

    fn create_padding(&self, len: usize) -> String {
        " ".repeat(len)
    }

    /// Byte position to break `text` at so the first line fits in `width`
    /// columns, or `None` if it fits already. Whitespace at or before
    /// `min_pos` is not considered a break point.
    fn find_wrap_pos(&self, text: &str, width: usize, min_pos: usize) -> Option<usize> {
        if let Some(pos) = text.find('\n') {
            if text[..pos].chars().count() <= width {
                return Some(pos + 1);
            }
        }

        let limit = text.char_indices().nth(width).map(|(i, _)| i)?;

        let space = if text[limit..].starts_with(char::is_whitespace) {
            Some(limit)
        } else {
            text[..limit].rfind(char::is_whitespace)
        };

        match space {
            Some(pos) if pos > min_pos => Some(pos),
            _ => Some(limit),
        }
    }

    /// Get the argument name displayed in usage.
    pub fn get_arg_name(&self) -> &str {
        &self.arg_name
    }

    /// Get number of padding space for option description.
    pub fn get_desc_padding(&self) -> usize {
        self.desc_pad
    }

    /// Get number of padding space before option.
    pub fn get_left_padding(&self) -> usize {
        self.left_pad
    }

    /// Get the newline.
    /// For windows, it defaults to `\r\n`.
    /// For other operating system, it defaults to `\n`.
    pub fn get_newline(&self) -> &str {
        &self.newline
    }

    /// Get the syntax prefix.
    pub fn get_syntax_prefix(&self) -> &str {
        &self.syntax_prefix
    }

    /// Get the max width of the output message.
    pub fn get_width(&self) -> usize {
        self.width
    }

    /// Set the argument name displayed for options without their own,
    /// the default is `value`.
    pub fn set_arg_name(&mut self, arg_name: &str) {
        self.arg_name = arg_name.to_string();
    }

    /// Set number of padding space for option description.
    pub fn set_desc_padding(&mut self, padding: usize) {
        self.desc_pad = padding;
    }

    /// Set number of padding space before option.
    pub fn set_left_padding(&mut self, padding: usize) {
        self.left_pad = padding;
    }

    /// Set the newline characters.
    pub fn set_newline(&mut self, newline: &str) {
        self.newline = newline.to_string();
    }

    /// Set the syntax prefix, the default value is `"Usage: "`.
    pub fn set_syntax_prefix(&mut self, prefix: &str) {
        self.syntax_prefix = prefix.to_string();
    }

    /// Set the maximum width of the display message, which defaults to 79.
    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(2);
    }

    /// Write the usage message to `out`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::io::stderr;
    /// use anpopt::{HelpFormatter, Registry};
    /// HelpFormatter::new().print_usage(&mut stderr(), &Registry::new(), "ls", Some("<dir>")).unwrap();
    /// ```
    pub fn print_usage<T: Write>(&self, out: &mut T, registry: &Registry, program: &str,
                                 extra: Option<&str>) -> std::io::Result<()> {
        write!(out, "{}", self.render_usage(registry, program, extra))
    }

    /// Render the usage message: the synopsis line with `program` and
    /// `extra`, followed by one line per visible option.
    ///
    /// # Example
    ///
    /// ```
    /// use anpopt::{HelpFormatter, Registry};
    ///
    /// let registry = Registry::new();
    /// registry.register_no_arg(Some("verbose"), Some('v'), || Ok(()), Some("Verbose mode")).unwrap();
    /// registry.register_arg(Some("depth"), None, |_| Ok(()), Some("Max depth")).unwrap();
    ///
    /// let mut formatter = HelpFormatter::new();
    /// formatter.set_newline("\n");
    /// assert_eq!("Usage: tree <dir>\n\
    ///             \x20 -v, --verbose      Verbose mode\n\
    ///             \x20 --depth <value>    Max depth\n",
    ///            formatter.render_usage(&registry, "tree", Some("<dir>")));
    /// ```
    pub fn render_usage(&self, registry: &Registry, program: &str, extra: Option<&str>) -> String {
        let mut buff = String::new();

        let mut synopsis = format!("{}{}", self.get_syntax_prefix(), program);
        if let Some(extra) = extra.filter(|e| !e.is_empty()) {
            synopsis.push(' ');
            synopsis.push_str(extra);
        }
        self.render_wrapped_text_block(&mut buff, 0, &synopsis);
        buff.push_str(self.get_newline());

        self.render_options(&mut buff, registry);
        buff
    }

    fn render_option_prefix(&self, option: &OptionDescriptor) -> String {
        let mut opt_buff = self.create_padding(self.get_left_padding());

        match (option.get_opt(), option.get_long_opt()) {
            (Some(opt), Some(long_opt)) => {
                opt_buff.push('-');
                opt_buff.push(opt);
                opt_buff.push_str(", --");
                opt_buff.push_str(long_opt);
            }
            (Some(opt), None) => {
                opt_buff.push('-');
                opt_buff.push(opt);
            }
            (None, Some(long_opt)) => {
                opt_buff.push_str("--");
                opt_buff.push_str(long_opt);
            }
            (None, None) => {}
        }

        if option.has_arg() {
            let arg = option.get_arg_name().unwrap_or(self.get_arg_name());
            opt_buff.push_str(&format!(" <{}>", arg));
        }
        opt_buff
    }

    fn render_options(&self, buff: &mut String, registry: &Registry) {
        let options = registry.descriptors();
        let groups = registry.groups();

        let visible: Vec<bool> = options.iter().enumerate()
            .map(|(i, option)| !option.is_hidden() && !groups.iter().any(|g| g.is_hidden() && g.contains(i)))
            .collect();

        let prefix_list: Vec<String> = options.iter().map(|option| self.render_option_prefix(option)).collect();
        let max = prefix_list.iter().zip(&visible)
            .filter(|&(_, &shown)| shown)
            .map(|(prefix, _)| prefix.chars().count())
            .max()
            .unwrap_or(0)
            .min(self.get_width() / 2);
        let next_line_tab_stop = max + self.get_desc_padding();

        for (i, option) in options.iter().enumerate() {
            for group in groups.iter().filter(|g| g.start() == i) {
                let any_visible = !group.is_empty() && (group.start()..group.end()).any(|j| visible[j]);
                if let Some(header) = group.get_description().and_then(Description::text) {
                    if any_visible {
                        self.render_wrapped_text_block(buff, 0, &format!("{}:", header));
                        buff.push_str(self.get_newline());
                    }
                }
            }

            if !visible[i] {
                continue;
            }

            let mut opt_buff = prefix_list[i].clone();
            let desc = option.get_description().and_then(Description::text).unwrap_or_default();
            let prefix_len = opt_buff.chars().count();
            if !desc.is_empty() && prefix_len > max {
                // too wide for the column: description goes on its own line
                buff.push_str(&opt_buff);
                buff.push_str(self.get_newline());
                opt_buff = self.create_padding(next_line_tab_stop);
                opt_buff.push_str(desc);
            } else if !desc.is_empty() {
                opt_buff.push_str(&self.create_padding(next_line_tab_stop - prefix_len));
                opt_buff.push_str(desc);
            }

            self.render_wrapped_text(buff, next_line_tab_stop, &opt_buff);
            buff.push_str(self.get_newline());
        }
    }

    fn render_wrapped_text(&self, buff: &mut String, mut next_line_tab_stop: usize, text: &str) {
        let mut pos = match self.find_wrap_pos(text, self.get_width(), 0) {
            Some(pos) => pos,
            None => {
                buff.push_str(text.trim_end());
                return;
            }
        };
        buff.push_str(text[..pos].trim_end());
        buff.push_str(self.get_newline());

        if next_line_tab_stop >= self.get_width() || next_line_tab_stop == 0 {
            next_line_tab_stop = 1;
        }

        let padding = self.create_padding(next_line_tab_stop);
        let mut processing_text = format!("{}{}", padding, text[pos..].trim());
        loop {
            pos = match self.find_wrap_pos(&processing_text, self.get_width(), next_line_tab_stop) {
                Some(pos) => pos,
                None => {
                    buff.push_str(processing_text.trim_end());
                    return;
                }
            };

            buff.push_str(processing_text[..pos].trim_end());
            buff.push_str(self.get_newline());
            processing_text = format!("{}{}", padding, processing_text[pos..].trim());
        }
    }

    /// Render a wrapped text block to the `buffer` with the max `width` configured.
    /// When text is wrapped, `next_line_tab_stop` number of space is appended.
    pub fn render_wrapped_text_block(&self, buffer: &mut String, next_line_tab_stop: usize, text: &str) {
        for (i, line) in text.lines().enumerate() {
            if i != 0 {
                buffer.push_str(self.get_newline());
            }
            self.render_wrapped_text(buffer, next_line_tab_stop, line);
        }
    }
}
