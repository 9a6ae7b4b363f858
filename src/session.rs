use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::config::Config;
use crate::normalize::{is_blank, trim};
use crate::store::{Found, StoreError, WordStore};

const GUIDANCE: &str = "\
Available commands:
  insert <word/phrase>         : Insert a word or phrase into the list
  findfwd <pattern> <n>        : Find the nth occurrence of pattern (forward)
  findrev <pattern> <n>        : Find the nth occurrence of pattern (reverse)
  showrev <n>                  : Show last n words in reverse alphabetical order
  load <filename>              : Load words from a file
  save <filename>              : Save word list to a file
  help                         : Show this list of commands
  exit                         : Quit the program";

pub struct RunContext<'a> {
    pub config: &'a Config,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Insert(&'a str),
    FindForward { pattern: &'a str, n: i64 },
    FindReverse { pattern: &'a str, n: i64 },
    ShowReverse(i64),
    Load(&'a str),
    Save(&'a str),
    Help,
    Exit,
}

#[derive(Debug, Error)]
enum DispatchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to write response")]
    Output(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Invalid,
}

pub fn parse_command(line: &str) -> Result<Command<'_>, ParseError> {
    let line = trim(line);
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let (name, rest) = match line.find(is_blank) {
        Some(split) => (&line[..split], trim(&line[split..])),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split(is_blank).filter(|arg| !arg.is_empty()).collect();

    match (name, args.as_slice()) {
        ("exit", []) => Ok(Command::Exit),
        ("help", []) => Ok(Command::Help),
        ("insert", [_, ..]) => Ok(Command::Insert(rest)),
        ("load", [_, ..]) => Ok(Command::Load(rest)),
        ("save", [_, ..]) => Ok(Command::Save(rest)),
        ("findfwd", &[pattern, n]) => Ok(Command::FindForward {
            pattern,
            n: parse_count(n)?,
        }),
        ("findrev", &[pattern, n]) => Ok(Command::FindReverse {
            pattern,
            n: parse_count(n)?,
        }),
        ("showrev", &[n]) => Ok(Command::ShowReverse(parse_count(n)?)),
        _ => Err(ParseError::Invalid),
    }
}

fn parse_count(raw: &str) -> Result<i64, ParseError> {
    raw.parse().map_err(|_| ParseError::Invalid)
}

/// Reads commands from `input` until `exit` or end of input, writing responses to `out`.
pub fn run_session<R, W>(
    store: &mut WordStore,
    mut input: R,
    out: &mut W,
    ctx: &RunContext<'_>,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    if ctx.config.show_guidance {
        print_guidance(out)?;
    }

    let mut line = String::new();
    loop {
        write!(out, "{}", ctx.config.prompt)?;
        out.flush().context("failed to flush output")?;

        line.clear();
        if input
            .read_line(&mut line)
            .context("failed to read command")?
            == 0
        {
            tracing::debug!("End of input, leaving session");
            break;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => {
                writeln!(out, "Error: Empty command")?;
                continue;
            }
            Err(ParseError::Invalid) => {
                writeln!(out, "Invalid command: {}", trim(&line))?;
                continue;
            }
        };

        tracing::debug!("Dispatching {:?}", command);
        if dispatch(store, command, out)?.is_break() {
            break;
        }
    }

    Ok(())
}

/// Loads the file at `path`, unmodified, and reports the outcome the way the `load` command does.
pub fn load_and_report<W: Write>(store: &mut WordStore, path: &Path, out: &mut W) -> Result<()> {
    match store.load_path(path) {
        Ok(count) => writeln!(out, "Loaded {count} words from '{}'.", path.display())
            .context("failed to write response"),
        Err(err) => report_error(out, &err),
    }
}

fn dispatch<W: Write>(
    store: &mut WordStore,
    command: Command<'_>,
    out: &mut W,
) -> Result<ControlFlow<()>> {
    match execute(store, command, out) {
        Ok(flow) => Ok(flow),
        Err(DispatchError::Store(err)) => {
            report_error(out, &err)?;
            Ok(ControlFlow::Continue(()))
        }
        Err(err @ DispatchError::Output(_)) => Err(err.into()),
    }
}

fn execute<W: Write>(
    store: &mut WordStore,
    command: Command<'_>,
    out: &mut W,
) -> Result<ControlFlow<()>, DispatchError> {
    match command {
        Command::Insert(text) => {
            let value = store.insert(text)?;
            writeln!(out, "Inserted: {value}")?;
        }
        Command::FindForward { pattern, n } => {
            let found = store.find_forward(pattern, n)?;
            report_found(out, pattern, n, found)?;
        }
        Command::FindReverse { pattern, n } => {
            let found = store.find_reverse(pattern, n)?;
            report_found(out, pattern, n, found)?;
        }
        Command::ShowReverse(n) => {
            let ranked = store.top_n_reverse_sorted(n)?;
            if ranked.is_empty() {
                writeln!(out, "No words to display.")?;
            } else {
                writeln!(out, "Last {} words in reverse alphabetical order:", ranked.len())?;
                for entry in ranked {
                    writeln!(out, "{:<4} {}", entry.rank, entry.value)?;
                }
            }
        }
        Command::Load(path) => {
            let count = store.load(path)?;
            writeln!(out, "Loaded {count} words from '{}'.", trim(path))?;
        }
        Command::Save(path) => {
            let count = store.save(path)?;
            writeln!(out, "Saved {count} words to '{}'.", trim(path))?;
        }
        Command::Help => print_guidance(out)?,
        Command::Exit => return Ok(ControlFlow::Break(())),
    }
    Ok(ControlFlow::Continue(()))
}

fn report_found<W: Write>(
    out: &mut W,
    pattern: &str,
    n: i64,
    found: Option<Found<'_>>,
) -> io::Result<()> {
    match found {
        Some(Found { index, value }) => {
            writeln!(out, "Found '{pattern}' at index {index}: {value}")
        }
        None => writeln!(out, "No {n}th occurrence of '{pattern}' found."),
    }
}

fn report_error<W: Write>(out: &mut W, err: &StoreError) -> Result<()> {
    tracing::debug!("Command failed: {:?}", err);
    match err {
        StoreError::FileOpen { .. } => writeln!(out, "{err}.")?,
        StoreError::Read { source, .. } | StoreError::Write { source, .. } => {
            writeln!(out, "Error: {err}: {source}")?
        }
        _ => writeln!(out, "Error: {err}")?,
    }
    Ok(())
}

fn print_guidance<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{GUIDANCE}")
}
