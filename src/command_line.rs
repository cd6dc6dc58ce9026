//! # Process-wide command line.
//!
//! [`CommandLine`] holds the switches and arguments the host was launched
//! with. It is built **once** per process (see
//! [`ShellContext::init_command_line`](crate::ShellContext::init_command_line))
//! from an optional command-line file plus the launch parameters, and is
//! immutable afterward.
//!
//! ## Parsing rules
//! ```text
//! --name            switch without value
//! --name=value      switch with value (later duplicates win)
//! --                ends switch parsing; everything after is an argument
//! anything else     argument
//! ```
//!
//! Command-line files are tokenized on whitespace; single or double quotes group
//! a token (the other quote kind is kept literally inside). The first token of a
//! file is the program name.

use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Well-known switch names (without the `--` prefix).
pub mod switches {
    /// Block the main context until a debugger attaches.
    pub const WAIT_FOR_DEBUGGER: &str = "wait-for-debugger";
    /// Start the subsystem synchronously (layout-test mode).
    pub const RUN_LAYOUT_TEST: &str = "run-layout-test";
}

const SWITCH_PREFIX: &str = "--";
const SWITCH_TERMINATOR: &str = "--";
const SWITCH_VALUE_SEPARATOR: char = '=';

/// Parsed process command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandLine {
    program: Option<String>,
    argv: Vec<String>,
    switches: HashMap<String, String>,
    args: Vec<String>,
    parse_switches: bool,
}

impl CommandLine {
    /// Creates an empty command line.
    pub fn new() -> Self {
        Self {
            parse_switches: true,
            ..Self::default()
        }
    }

    /// Builds a command line from a file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn from_file(path: &Path) -> io::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(Self::from_file_contents(&contents))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Builds a command line from command-line file contents.
    ///
    /// The first token is taken as the program name.
    pub fn from_file_contents(contents: &str) -> Self {
        let mut tokens = tokenize_quoted(contents).into_iter();
        let mut cl = Self::new();
        cl.program = tokens.next();
        cl.append_switches_and_arguments(tokens);
        cl
    }

    /// Appends switches and arguments in order.
    pub fn append_switches_and_arguments<I, S>(&mut self, params: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for param in params {
            let param = param.into();
            if self.parse_switches && param.starts_with(SWITCH_PREFIX) {
                if param == SWITCH_TERMINATOR {
                    self.parse_switches = false;
                    self.argv.push(param);
                    continue;
                }
                let body = &param[SWITCH_PREFIX.len()..];
                let (name, value) = match body.split_once(SWITCH_VALUE_SEPARATOR) {
                    Some((name, value)) => (name, value),
                    None => (body, ""),
                };
                self.switches.insert(name.to_string(), value.to_string());
            } else {
                self.args.push(param.clone());
            }
            self.argv.push(param);
        }
    }

    /// Returns true if the switch is present.
    pub fn has_switch(&self, name: &str) -> bool {
        self.switches.contains_key(name)
    }

    /// Returns the switch value; `Some("")` for a switch given without value.
    pub fn switch_value(&self, name: &str) -> Option<&str> {
        self.switches.get(name).map(String::as_str)
    }

    /// Returns the positional arguments in order.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Returns the program name (set only when loaded from a file).
    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// Returns every appended parameter in order (program name excluded).
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

/// Splits on whitespace, grouping single- or double-quoted spans.
fn tokenize_quoted(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_switches_values_and_arguments() {
        let mut cl = CommandLine::new();
        cl.append_switches_and_arguments([
            "--wait-for-debugger",
            "--log-level=2",
            "http://example.test/",
        ]);

        assert!(cl.has_switch(switches::WAIT_FOR_DEBUGGER));
        assert_eq!(cl.switch_value(switches::WAIT_FOR_DEBUGGER), Some(""));
        assert_eq!(cl.switch_value("log-level"), Some("2"));
        assert_eq!(cl.arguments(), ["http://example.test/"]);
        assert_eq!(cl.argv().len(), 3);
    }

    #[test]
    fn test_terminator_stops_switch_parsing() {
        let mut cl = CommandLine::new();
        cl.append_switches_and_arguments(["--a", "--", "--b"]);

        assert!(cl.has_switch("a"));
        assert!(!cl.has_switch("b"));
        assert_eq!(cl.arguments(), ["--b"]);
    }

    #[test]
    fn test_file_contents_quotes_and_program_name() {
        let cl = CommandLine::from_file_contents(
            "_ --user-agent=\"Shell 1.0 'beta'\" --run-layout-test 'two words'\n",
        );

        assert_eq!(cl.program(), Some("_"));
        assert_eq!(cl.switch_value("user-agent"), Some("Shell 1.0 'beta'"));
        assert!(cl.has_switch(switches::RUN_LAYOUT_TEST));
        assert_eq!(cl.arguments(), ["two words"]);
    }

    #[test]
    fn test_from_file_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(CommandLine::from_file(&missing).unwrap().is_none());
    }

    #[test]
    fn test_from_file_reads_switches() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "shell --wait-for-debugger").unwrap();

        let cl = CommandLine::from_file(file.path()).unwrap().unwrap();
        assert!(cl.has_switch(switches::WAIT_FOR_DEBUGGER));
    }
}
