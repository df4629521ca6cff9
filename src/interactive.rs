//! Terminal drop area.
//!
//! Dragging files onto a terminal pastes their paths, so every line read from
//! stdin that is not a `:command` is treated as one drop. Terminals quote
//! paths differently: `'...'`, `"..."`, `{...}` and backslash-escaped spaces
//! are all understood.

use crate::output::{ConsoleStatus, OutputFormatter};
use crate::session::Session;
use crate::watcher::WatchState;
use std::io::{self, BufRead};
use std::path::PathBuf;

const HELP: &str = "\
Commands:
  <paths...>       sort the dropped files
  :dest <dir>      choose the destination folder
  :watch <dir>     watch a folder for new files
  :unwatch [dir]   stop watching one folder, or all of them
  :status          show destination, watched folders and last sorted file
  :help            show this help
  :quit            exit (Ctrl-D works too)";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Drop(Vec<PathBuf>),
    SetDestination(PathBuf),
    Watch(PathBuf),
    Unwatch(Option<PathBuf>),
    Status,
    Help,
    Quit,
    /// A command that needs an argument was given none.
    MissingArgument(&'static str),
    Unknown(String),
}

/// Parses one line of input.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    let Some(command) = line.strip_prefix(':') else {
        let paths = split_dropped_paths(line);
        return if paths.is_empty() {
            Input::Empty
        } else {
            Input::Drop(paths)
        };
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .unwrap_or((command, ""));
    let argument = split_dropped_paths(rest).into_iter().next();

    match name {
        "dest" => argument.map_or(Input::MissingArgument("dest"), Input::SetDestination),
        "watch" => argument.map_or(Input::MissingArgument("watch"), Input::Watch),
        "unwatch" => Input::Unwatch(argument),
        "status" => Input::Status,
        "help" | "h" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

/// Splits a pasted line into paths.
///
/// Backslash only escapes whitespace and quote characters, so Windows paths
/// such as `C:\Users\me\a.txt` pass through unchanged.
pub fn split_dropped_paths(line: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                for ch in chars.by_ref() {
                    if ch == c {
                        break;
                    }
                    current.push(ch);
                }
            }
            '{' if current.is_empty() => {
                for ch in chars.by_ref() {
                    if ch == '}' {
                        break;
                    }
                    current.push(ch);
                }
            }
            '\\' => match chars.peek() {
                Some(&next) if next.is_whitespace() || matches!(next, '\'' | '"') => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push('\\'),
            },
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        paths.push(PathBuf::from(current));
    }
    paths
}

/// Reads drops and commands from `input` until `:quit` or end of input.
pub fn run_interactive<R: BufRead>(
    session: &mut Session,
    console: &ConsoleStatus,
    input: R,
) -> io::Result<()> {
    OutputFormatter::header("Drag and drop files here to sort them :)");
    OutputFormatter::plain(HELP);
    print_status(session, console);

    for line in input.lines() {
        match parse_input(&line?) {
            Input::Empty => {}
            Input::Drop(paths) => {
                if paths.len() > 1 {
                    console.start_progress(paths.len() as u64);
                }
                session.drop_files(&paths, console);
            }
            Input::SetDestination(dir) => match session.set_destination(&dir) {
                Ok(dir) => OutputFormatter::success(&format!("Destination: {}", dir.display())),
                Err(e) => OutputFormatter::error(&e.to_string()),
            },
            Input::Watch(dir) => match session.watch(&dir) {
                Ok(()) => OutputFormatter::success(&format!("Watching: {}", dir.display())),
                Err(e) => OutputFormatter::error(&e.to_string()),
            },
            Input::Unwatch(Some(dir)) => {
                if session.unwatch(&dir) {
                    OutputFormatter::success(&format!("Stopped watching {}", dir.display()));
                } else {
                    OutputFormatter::warning(&format!("Not watching {}", dir.display()));
                }
            }
            Input::Unwatch(None) => {
                session.unwatch_all();
                OutputFormatter::success("Stopped watching all folders");
            }
            Input::Status => print_status(session, console),
            Input::Help => OutputFormatter::plain(HELP),
            Input::Quit => break,
            Input::MissingArgument(command) => {
                OutputFormatter::warning(&format!(":{command} needs a folder, e.g. :{command} ~/Downloads"));
            }
            Input::Unknown(command) => {
                OutputFormatter::warning(&format!("Unknown command :{command} (try :help)"));
            }
        }
    }

    Ok(())
}

fn print_status(session: &Session, console: &ConsoleStatus) {
    OutputFormatter::info(&format!("Destination: {}", session.destination().display()));

    let watching = match session.watch_state() {
        WatchState::Idle => "None".to_string(),
        WatchState::Watching(dirs) => dirs
            .iter()
            .map(|dir| dir.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    };
    OutputFormatter::info(&format!("Watching: {watching}"));
    OutputFormatter::status(&console.line().text());

    if let Some(log) = session.sorter().log().path() {
        OutputFormatter::plain(&format!("(Logs saved to {})", log.display()));
    }
}
