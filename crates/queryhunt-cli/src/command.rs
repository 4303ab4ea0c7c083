//! Parsing of REPL input lines.

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
  Start,
  Hint,
  Accuse(&'a str),
  Schema,
  Status,
  Help,
  Quit,
  /// Anything that is not a `:` command is sent to the server as SQL.
  Sql(&'a str),
  Unknown(&'a str),
  Empty,
}

pub const HELP: &str = "\
:start           start (or restart) a game
:hint            ask for a hint
:accuse <name>   name the murderer
:schema          show the game tables
:status          show your current session
:quit            leave
anything else is run as a SELECT query
";

pub fn parse(line: &str) -> Command<'_> {
  let line = line.trim();
  if line.is_empty() {
    return Command::Empty;
  }
  let Some(rest) = line.strip_prefix(':') else {
    return Command::Sql(line);
  };

  let (word, arg) = match rest.split_once(char::is_whitespace) {
    Some((w, a)) => (w, a.trim()),
    None => (rest, ""),
  };
  match word {
    "start" | "new" => Command::Start,
    "hint" => Command::Hint,
    "accuse" => Command::Accuse(arg),
    "schema" => Command::Schema,
    "status" => Command::Status,
    "help" | "h" | "?" => Command::Help,
    "quit" | "q" | "exit" => Command::Quit,
    _ => Command::Unknown(word),
  }
}
