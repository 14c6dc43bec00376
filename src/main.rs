#![allow(non_snake_case)]
//! Line-oriented front end of the formula builder.
//!
//! ```text
//! > :sym frac            insert a catalog symbol by label
//! > x^{2} + 1            plain text is appended to the formula
//! > :compute solve x     run a mode; `:compute eval ; x=2, y=3` passes substitutions
//! ```
//! Usage: `RustedFormula [settings.toml]` (default `formula.toml`, optional).
use RustedFormula::Utils::logger::init_logger;
use RustedFormula::Utils::settings::Settings;
use RustedFormula::formula::dispatcher::{ComputeMode, ComputeResult};
use RustedFormula::formula::errors::ErrorKind;
use RustedFormula::formula::session::FormulaSession;
use log::error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const HELP: &str = "\
:sym <label>                 insert the catalog symbol with this label
:ins <fragment>              insert markup
:set <text>                  replace the whole formula
:clear                       empty the formula
:compute <mode> [var] [; x=1, y=2]
                             simplify | expand | factor | solve | diff | int | eval
:undo  :redo                 step through edits
:fav                         save the formula as a favorite
:unfav <n>                   remove favorite n
:recall <n>                  load recent formula n
:copy                        print the markup for copying
:history  :symbols  :errors  tables
:quit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Symbol(String),
    Insert(String),
    Set(String),
    Clear,
    Compute {
        mode: ComputeMode,
        variable: String,
        substitutions: String,
    },
    Undo,
    Redo,
    Favorite,
    Unfavorite(usize),
    Recall(usize),
    Copy,
    History,
    Symbols,
    Errors,
    Help,
    Quit,
}

fn parse_index(arg: &str) -> Result<usize, String> {
    arg.trim()
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a position", arg.trim()))
}

fn parse_compute(args: &str) -> Result<Command, String> {
    let (head, substitutions) = match args.split_once(';') {
        Some((head, subs)) => (head, subs.trim()),
        None => (args, ""),
    };
    let mut words = head.split_whitespace();
    let mode_name = words.next().ok_or("usage: :compute <mode> [var] [; subs]")?;
    let mode = ComputeMode::from_str(mode_name)
        .map_err(|_| format!("unknown mode '{}'", mode_name))?;
    let variable = words.next().unwrap_or_default().to_string();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected '{}' after the variable", extra));
    }
    Ok(Command::Compute {
        mode,
        variable,
        substitutions: substitutions.to_string(),
    })
}

fn parse_command(line: &str) -> Result<Command, String> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Command::Insert(line.to_string()));
    };
    let (name, args) = match command.split_once(' ') {
        Some((name, args)) => (name, args),
        None => (command, ""),
    };
    match name {
        "sym" => Ok(Command::Symbol(args.trim().to_string())),
        "ins" => Ok(Command::Insert(args.to_string())),
        "set" => Ok(Command::Set(args.to_string())),
        "clear" => Ok(Command::Clear),
        "compute" => parse_compute(args),
        "undo" => Ok(Command::Undo),
        "redo" => Ok(Command::Redo),
        "fav" => Ok(Command::Favorite),
        "unfav" => parse_index(args).map(Command::Unfavorite),
        "recall" => parse_index(args).map(Command::Recall),
        "copy" => Ok(Command::Copy),
        "history" => Ok(Command::History),
        "symbols" => Ok(Command::Symbols),
        "errors" => Ok(Command::Errors),
        "help" => Ok(Command::Help),
        "quit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command ':{}' (try :help)", other)),
    }
}

#[derive(Tabled)]
struct SymbolRow {
    category: String,
    label: String,
    fragment: String,
}

fn symbols_table(session: &FormulaSession) -> String {
    let rows: Vec<SymbolRow> = session
        .catalog()
        .categories
        .iter()
        .flat_map(|c| {
            c.symbols.iter().map(|s| SymbolRow {
                category: c.name.clone(),
                label: s.label.clone(),
                fragment: s.fragment.clone(),
            })
        })
        .collect();
    let mut table = Table::new(&rows);
    table.with(Style::modern_rounded());
    table.to_string()
}

fn history_table(session: &FormulaSession) -> String {
    let mut builder = Builder::default();
    builder.push_record(["#", "recent", "favorites"]);
    let recent: Vec<&String> = session.store().history().collect();
    let favorites = session.store().favorites();
    for i in 0..recent.len().max(favorites.len()) {
        builder.push_record([
            i.to_string(),
            recent.get(i).map(|s| s.to_string()).unwrap_or_default(),
            favorites.get(i).cloned().unwrap_or_default(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

fn show_state(session: &FormulaSession) {
    println!("formula: {}", session.text());
    match session.result() {
        Some(ComputeResult::Success(markup)) => println!("result:  {}", markup),
        Some(ComputeResult::Failure(err)) => println!("error:   {}", err),
        None => {}
    }
}

/// Runs one command; returns false when the session should end.
fn execute(session: &mut FormulaSession, command: Command) -> bool {
    match command {
        Command::Symbol(label) => match session.insert_symbol(&label) {
            Ok(Some(hint)) => println!("cursor -> {}", hint.offset),
            Ok(None) => {}
            Err(err) => println!("{}", err),
        },
        Command::Insert(fragment) => {
            if let Some(hint) = session.insert(&fragment) {
                println!("cursor -> {}", hint.offset);
            }
        }
        Command::Set(text) => session.set_text(&text),
        Command::Clear => session.clear(),
        Command::Compute {
            mode,
            variable,
            substitutions,
        } => {
            session.compute(mode, &variable, &substitutions);
            if let Some(message) = session.last_error(ErrorKind::SubstitutionError) {
                println!("warning: {}", message);
            }
        }
        Command::Undo => {
            if let Err(err) = session.undo() {
                println!("{}", err);
            }
        }
        Command::Redo => {
            if let Err(err) = session.redo() {
                println!("{}", err);
            }
        }
        Command::Favorite => {
            if !session.add_favorite() {
                println!("already saved (or empty)");
            }
        }
        Command::Unfavorite(index) => match session.remove_favorite(index) {
            Ok(text) => println!("removed {}", text),
            Err(err) => println!("{}", err),
        },
        Command::Recall(index) => {
            if let Err(err) = session.recall_history(index) {
                println!("{}", err);
            }
        }
        Command::Copy => {
            println!("{}", session.text());
            session.mark_copied();
            return true;
        }
        Command::History => {
            println!("{}", history_table(session));
            return true;
        }
        Command::Symbols => {
            println!("{}", symbols_table(session));
            return true;
        }
        Command::Errors => {
            let mut builder = Builder::default();
            builder.push_record(["kind", "last message"]);
            for (kind, message) in session.last_errors() {
                builder.push_record([kind.to_string(), message.clone()]);
            }
            let mut table = builder.build();
            table.with(Style::modern_rounded());
            println!("{}", table);
            return true;
        }
        Command::Help => {
            println!("{}", HELP);
            return true;
        }
        Command::Quit => return false,
    }
    show_state(session);
    true
}

fn main() {
    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("formula.toml"));
    let settings = match Settings::from_file(&settings_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };
    if let Err(err) = init_logger(&settings.logging.level, settings.logging.log_to_file) {
        eprintln!("{}", err);
        std::process::exit(2);
    }
    let mut session = match FormulaSession::new(&settings) {
        Ok(session) => session,
        Err(err) => {
            error!("{}", err);
            std::process::exit(2);
        }
    };
    println!("formula builder, :help for commands");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(command) => {
                if !execute(&mut session, command) {
                    break;
                }
            }
            Err(message) => println!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(":sym frac"), Ok(Command::Symbol("frac".to_string())));
        assert_eq!(parse_command("x + 1"), Ok(Command::Insert("x + 1".to_string())));
        assert_eq!(parse_command(":unfav 2"), Ok(Command::Unfavorite(2)));
        assert!(parse_command(":unfav two").is_err());
        assert!(parse_command(":plot").is_err());
        assert_eq!(parse_command(":q"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_compute() {
        assert_eq!(
            parse_command(":compute eval ; x=2, y=3"),
            Ok(Command::Compute {
                mode: ComputeMode::Evaluate,
                variable: String::new(),
                substitutions: "x=2, y=3".to_string(),
            })
        );
        assert_eq!(
            parse_command(":compute solve x"),
            Ok(Command::Compute {
                mode: ComputeMode::Solve,
                variable: "x".to_string(),
                substitutions: String::new(),
            })
        );
        assert!(parse_command(":compute").is_err());
        assert!(parse_command(":compute solve x y").is_err());
    }

    #[test]
    fn test_execute_session_flow() {
        let mut session = FormulaSession::default();
        assert!(execute(&mut session, Command::Set("x + x".to_string())));
        assert!(execute(
            &mut session,
            parse_command(":compute simplify").unwrap()
        ));
        assert_eq!(session.result().and_then(|r| r.markup()), Some("2 x"));
        assert!(execute(&mut session, Command::Favorite));
        assert!(history_table(&session).contains("x + x"));
        assert!(symbols_table(&session).contains("Greek Letters"));
        assert!(!execute(&mut session, Command::Quit));
    }
}
