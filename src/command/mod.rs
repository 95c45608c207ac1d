// ABOUTME: Declarative builders for remote shell commands.
// ABOUTME: Every free-form value is quoted on render; only builders can insert shell operators.

mod app;
mod host;
mod proxy;

pub use app::{AppCommands, ContainerRecord, env_file_contents, parse_records, serving_container};
pub use host::HostCommands;
pub use proxy::{LogOptions, ProxyCommands, ProxyInstance, ProxyState};

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    /// A literal word, quoted when it contains anything shell-special.
    Word(String),
    /// A path under the remote user's home, optionally followed by a literal suffix.
    Home { path: String, suffix: String },
    /// A value that must not show up in logs.
    Secret(String),
    /// A shell operator or redirection. Never built from user input.
    Op(&'static str),
}

/// A shell command addressed to one remote host.
///
/// The same builder calls always render the same string; rendering is the
/// only place quoting happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    args: Vec<Arg>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            args: vec![Arg::Word(program.into())],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Word(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|a| Arg::Word(a.into())));
        self
    }

    /// Append `"$HOME/<path>"`.
    pub fn home(self, path: impl Into<String>) -> Self {
        self.home_with_suffix(path, "")
    }

    /// Append `"$HOME/<path>"<suffix>` as a single shell word.
    pub fn home_with_suffix(mut self, path: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.args.push(Arg::Home {
            path: path.into(),
            suffix: suffix.into(),
        });
        self
    }

    pub fn secret(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg::Secret(value.into()));
        self
    }

    pub(crate) fn op(mut self, op: &'static str) -> Self {
        self.args.push(Arg::Op(op));
        self
    }

    /// Silence stderr.
    pub fn quiet_errors(self) -> Self {
        self.op("2>/dev/null")
    }

    /// Fold stderr into stdout.
    pub fn merge_stderr(self) -> Self {
        self.op("2>&1")
    }

    pub fn pipe(self, next: Cmd) -> Self {
        self.join("|", next)
    }

    pub fn or(self, fallback: Cmd) -> Self {
        self.join("||", fallback)
    }

    pub fn and(self, next: Cmd) -> Self {
        self.join("&&", next)
    }

    pub fn then(self, next: Cmd) -> Self {
        self.join(";", next)
    }

    fn join(mut self, op: &'static str, next: Cmd) -> Self {
        self.args.push(Arg::Op(op));
        self.args.extend(next.args);
        self
    }

    /// The string sent to the remote shell.
    pub fn to_shell(&self) -> String {
        self.render(false)
    }

    /// The string shown in logs and progress output.
    pub fn redacted(&self) -> String {
        self.render(true)
    }

    fn render(&self, redact: bool) -> String {
        self.args
            .iter()
            .map(|arg| match arg {
                Arg::Word(word) => quote(word).into_owned(),
                Arg::Home { path, suffix } => {
                    format!("\"$HOME/{}\"{}", escape_double(path), quote_suffix(suffix))
                }
                Arg::Secret(_) if redact => REDACTED.to_string(),
                Arg::Secret(value) => quote(value).into_owned(),
                Arg::Op(op) => (*op).to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}

/// Quote a word for a POSIX shell, leaving plain words untouched.
pub fn quote(word: &str) -> Cow<'_, str> {
    if !word.is_empty() && word.chars().all(is_safe) {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', "'\\''")))
    }
}

fn quote_suffix(suffix: &str) -> Cow<'_, str> {
    if suffix.is_empty() {
        Cow::Borrowed("")
    } else {
        quote(suffix)
    }
}

fn escape_double(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render a duration the way the proxy CLI parses it (`6s`, `1500ms`).
pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
