//! Command shell - drives a registry from a line-oriented script
//!
//! Each line is one command, the way one UI event handler turn would call
//! into the registry:
//!
//! ```text
//! open calc-1 "Calculator" 0 0 200 100
//! open notes-1 Notes 50 50 300 200 maximized
//! focus calc-1
//! move notes-1 -20 400
//! list
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use thiserror::Error;
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::wm::{MetricsHandle, RegistryError, WindowDescriptor, WindowRecord, WindowRegistry};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("line {line}: unknown command '{name}'")]
    UnknownCommand { line: usize, name: String },

    #[error("line {line}: '{command}' is missing <{arg}>")]
    MissingArgument { line: usize, command: &'static str, arg: &'static str },

    #[error("line {line}: invalid {arg} '{value}'")]
    InvalidNumber { line: usize, arg: &'static str, value: String },

    #[error("line {line}: unknown flag '{flag}'")]
    UnknownFlag { line: usize, flag: String },

    #[error("line {line}: too many arguments for '{command}'")]
    TooManyArguments { line: usize, command: &'static str },

    #[error("line {line}: unterminated quote")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: {source}")]
    Registry {
        line: usize,
        #[source]
        source: RegistryError,
    },
}

pub type Result<T> = std::result::Result<T, ShellError>;

/// A parsed script command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(WindowDescriptor),
    Close(String),
    Minimize(String),
    Maximize(String),
    Restore(String),
    Focus(String),
    Move { id: String, x: i32, y: i32 },
    Resize { id: String, width: u32, height: u32 },
    List,
    Stats,
}

/// Split a line into whitespace-separated tokens; `"..."` groups spaces
fn tokenize(line_no: usize, line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err(ShellError::UnterminatedQuote { line: line_no });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Cursor over one line's arguments
struct Args<'a> {
    line: usize,
    command: &'static str,
    tokens: std::slice::Iter<'a, String>,
}

impl<'a> Args<'a> {
    fn next(&mut self, arg: &'static str) -> Result<&'a str> {
        self.tokens.next().map(String::as_str).ok_or(ShellError::MissingArgument {
            line: self.line,
            command: self.command,
            arg,
        })
    }

    fn number<T: std::str::FromStr>(&mut self, arg: &'static str) -> Result<T> {
        let value = self.next(arg)?;
        value.parse().map_err(|_| ShellError::InvalidNumber {
            line: self.line,
            arg,
            value: value.to_string(),
        })
    }

    fn finish(mut self) -> Result<()> {
        match self.tokens.next() {
            Some(_) => Err(ShellError::TooManyArguments { line: self.line, command: self.command }),
            None => Ok(()),
        }
    }
}

/// Parse one script line. Returns `None` for blank and comment lines.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens = tokenize(line_no, trimmed)?;
    let Some((name, rest)) = tokens.split_first() else {
        return Ok(None);
    };

    let command: &'static str = match name.as_str() {
        "open" => "open",
        "close" => "close",
        "minimize" => "minimize",
        "maximize" => "maximize",
        "restore" => "restore",
        "focus" => "focus",
        "move" => "move",
        "resize" => "resize",
        "list" => "list",
        "stats" => "stats",
        other => {
            return Err(ShellError::UnknownCommand { line: line_no, name: other.to_string() });
        }
    };

    let mut args = Args { line: line_no, command, tokens: rest.iter() };

    let cmd = match command {
        "open" => {
            let id = args.next("id")?;
            let title = args.next("title")?;
            let x = args.number("x")?;
            let y = args.number("y")?;
            let width = args.number("width")?;
            let height = args.number("height")?;
            let mut desc = WindowDescriptor::new(id, title, x, y, width, height);
            for flag in args.tokens.by_ref() {
                match flag.as_str() {
                    "minimized" => desc.minimized = true,
                    "maximized" => desc.maximized = true,
                    other => {
                        return Err(ShellError::UnknownFlag { line: line_no, flag: other.to_string() });
                    }
                }
            }
            Command::Open(desc)
        }
        "close" => Command::Close(args.next("id")?.to_string()),
        "minimize" => Command::Minimize(args.next("id")?.to_string()),
        "maximize" => Command::Maximize(args.next("id")?.to_string()),
        "restore" => Command::Restore(args.next("id")?.to_string()),
        "focus" => Command::Focus(args.next("id")?.to_string()),
        "move" => Command::Move {
            id: args.next("id")?.to_string(),
            x: args.number("x")?,
            y: args.number("y")?,
        },
        "resize" => Command::Resize {
            id: args.next("id")?.to_string(),
            width: args.number("width")?,
            height: args.number("height")?,
        },
        "list" => Command::List,
        _ => Command::Stats,
    };

    args.finish()?;
    Ok(Some(cmd))
}

/// Executes commands against a borrowed registry
pub struct Shell<'a> {
    registry: &'a mut WindowRegistry,
    metrics: Option<MetricsHandle>,
    title_width: usize,
}

impl<'a> Shell<'a> {
    pub fn new(registry: &'a mut WindowRegistry, title_width: usize) -> Self {
        Self {
            registry,
            metrics: None,
            title_width,
        }
    }

    /// Metrics to report for `stats`
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Parse and execute one line, returning any output lines
    pub fn run_line(&mut self, line_no: usize, line: &str) -> Result<Vec<String>> {
        match parse_line(line_no, line)? {
            Some(cmd) => self.execute(line_no, cmd),
            None => Ok(Vec::new()),
        }
    }

    /// Run lines in order, handing each output line to `emit` as soon as it
    /// is produced. Stops at the first error; earlier output has already been
    /// emitted.
    pub fn run_lines<I, S, F>(&mut self, lines: I, mut emit: F) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str),
    {
        for (idx, line) in lines.into_iter().enumerate() {
            for out in self.run_line(idx + 1, line.as_ref())? {
                emit(&out);
            }
        }
        Ok(())
    }

    /// Collecting variant of [`Shell::run_lines`] for in-memory scripts
    pub fn run_script(&mut self, script: &str) -> Result<Vec<String>> {
        let mut output = Vec::new();
        self.run_lines(script.lines(), |line| output.push(line.to_string()))?;
        Ok(output)
    }

    pub fn execute(&mut self, line_no: usize, cmd: Command) -> Result<Vec<String>> {
        debug!(line = line_no, ?cmd, "Executing command");
        let reg = &mut *self.registry;
        let registry_err = |source| ShellError::Registry { line: line_no, source };
        let (applied, id) = match cmd {
            Command::Open(desc) => {
                reg.open_window(desc).map_err(registry_err)?;
                return Ok(Vec::new());
            }
            Command::Close(id) => (reg.close_window(&id), id),
            Command::Minimize(id) => (reg.minimize_window(&id), id),
            Command::Maximize(id) => (reg.maximize_window(&id), id),
            Command::Restore(id) => (reg.restore_window(&id).map_err(registry_err)?, id),
            Command::Focus(id) => (reg.focus_window(&id).map_err(registry_err)?, id),
            Command::Move { id, x, y } => (reg.update_window_position(&id, x, y), id),
            Command::Resize { id, width, height } => (reg.update_window_size(&id, width, height), id),
            Command::List => return Ok(format_listing(reg, self.title_width)),
            Command::Stats => {
                return Ok(match &self.metrics {
                    Some(metrics) => metrics.borrow().report(),
                    None => vec!["metrics disabled".to_string()],
                });
            }
        };

        if applied {
            Ok(Vec::new())
        } else {
            Ok(vec![format!("no window '{}'", id)])
        }
    }
}

/// Render the registry as a table: visible windows back to front, then minimized ones
pub fn format_listing(registry: &WindowRegistry, title_width: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>6}  {:<12}  {}  {:>6} {:>6} {:>6} {:>6}  STATE",
        "Z",
        "ID",
        fit_width("TITLE", title_width),
        "X",
        "Y",
        "W",
        "H"
    )];

    let minimized = registry.windows().iter().filter(|w| w.is_minimized());
    for w in registry.render_order().into_iter().chain(minimized) {
        lines.push(format!(
            "{:>6}  {:<12}  {}  {:>6} {:>6} {:>6} {:>6}  {}",
            w.z_index,
            w.id,
            fit_width(&w.title, title_width),
            w.x,
            w.y,
            w.width,
            w.height,
            state_label(w)
        ));
    }
    lines
}

fn state_label(w: &WindowRecord) -> String {
    let mut parts = Vec::new();
    if w.is_focused() {
        parts.push("focused");
    }
    if w.is_minimized() {
        parts.push("minimized");
    }
    if w.is_maximized() {
        parts.push("maximized");
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(",")
    }
}

/// Pad or truncate to exactly `width` display columns
fn fit_width(text: &str, width: usize) -> String {
    let text_width = UnicodeWidthStr::width(text);
    if text_width <= width {
        return format!("{}{}", text, " ".repeat(width - text_width));
    }

    // Leave one column for the ellipsis
    let budget = width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    if width > 0 {
        out.push('…');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}
