//! Query classification.
//!
//! Two independent gates live here:
//!
//! - [`ValidatedQuery::parse`] is the player-facing gate. A query passes only
//!   if it lexes to exactly one statement whose first token is the `SELECT`
//!   keyword. It restricts statement *kind* and *count*; it does not look at
//!   which objects the SELECT touches.
//! - [`destructive_keyword`] scans system-issued maintenance statements for
//!   `DROP`, `DELETE` or `TRUNCATE` as whole words. It is never applied to
//!   player input.

use std::ops::Range;

use crate::{Error, Result};

/// Keywords that mark a maintenance statement as destructive.
pub const DESTRUCTIVE_KEYWORDS: [&str; 3] = ["DROP", "DELETE", "TRUNCATE"];

// ─── Lexer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
  Word,
  Semicolon,
  Other,
}

#[derive(Debug, Clone)]
struct Token {
  kind: TokenKind,
  span: Range<usize>,
}

/// Splits SQL text into significant tokens, skipping whitespace and comments.
///
/// Quoted literals and identifiers (`'..'`, `".."`, `` `..` ``) are single
/// tokens, so a `;` inside them never ends a statement. Quoting and comments
/// follow SQLite, the engine that runs the query: a quote is escaped only by
/// doubling it, backslash is an ordinary character, and comments are `-- ..`
/// and `/* .. */`.
struct Lexer<'a> {
  src: &'a str,
  pos: usize,
}

impl<'a> Lexer<'a> {
  fn new(src: &'a str) -> Self { Self { src, pos: 0 } }

  fn peek(&self) -> Option<char> { self.src[self.pos..].chars().next() }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += c.len_utf8();
    Some(c)
  }

  fn skip_line(&mut self) {
    while let Some(c) = self.bump() {
      if c == '\n' {
        break;
      }
    }
  }

  fn skip_block_comment(&mut self) -> Result<()> {
    // Opening `/*` already consumed.
    while let Some(c) = self.bump() {
      if c == '*' && self.peek() == Some('/') {
        self.bump();
        return Ok(());
      }
    }
    Err(Error::InvalidQuery("unterminated block comment"))
  }

  fn skip_quoted(&mut self, quote: char) -> Result<()> {
    // Opening quote already consumed. A doubled quote is an escaped quote.
    while let Some(c) = self.bump() {
      if c == quote {
        if self.peek() == Some(quote) {
          self.bump();
        } else {
          return Ok(());
        }
      }
    }
    Err(Error::InvalidQuery("unterminated quoted literal"))
  }
}

impl Iterator for Lexer<'_> {
  type Item = Result<Token>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let start = self.pos;
      let c = self.bump()?;

      let kind = match c {
        c if c.is_whitespace() => continue,
        '-' if self.peek() == Some('-') => {
          self.skip_line();
          continue;
        }
        '/' if self.peek() == Some('*') => {
          self.bump();
          if let Err(e) = self.skip_block_comment() {
            return Some(Err(e));
          }
          continue;
        }
        '\'' | '"' | '`' => {
          if let Err(e) = self.skip_quoted(c) {
            return Some(Err(e));
          }
          TokenKind::Other
        }
        ';' => TokenKind::Semicolon,
        c if c.is_alphanumeric() || c == '_' || c == '$' => {
          while let Some(n) = self.peek() {
            if n.is_alphanumeric() || n == '_' || n == '$' {
              self.bump();
            } else {
              break;
            }
          }
          TokenKind::Word
        }
        _ => TokenKind::Other,
      };

      return Some(Ok(Token { kind, span: start..self.pos }));
    }
  }
}

// ─── Player-facing gate ──────────────────────────────────────────────────────

/// A player query that passed the single-SELECT gate.
///
/// Holding one is the only way to ask a [`SandboxStore`](crate::store::SandboxStore)
/// to execute player SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
  raw:       String,
  statement: Range<usize>,
}

impl ValidatedQuery {
  pub fn parse(raw: &str) -> Result<Self> {
    let mut statements = 0usize;
    let mut in_statement = false;
    let mut first: Option<Token> = None;
    let mut end = 0usize;

    for token in Lexer::new(raw) {
      let token = token?;
      if token.kind == TokenKind::Semicolon {
        in_statement = false;
        continue;
      }
      if !in_statement {
        in_statement = true;
        statements += 1;
        if statements > 1 {
          return Err(Error::InvalidQuery("more than one statement"));
        }
        first = Some(token.clone());
      }
      end = token.span.end;
    }

    let first = first.ok_or(Error::InvalidQuery("no statement"))?;
    let keyword = &raw[first.span.clone()];
    if first.kind != TokenKind::Word || !keyword.eq_ignore_ascii_case("SELECT") {
      return Err(Error::InvalidQuery("statement is not a SELECT"));
    }

    Ok(Self { raw: raw.to_owned(), statement: first.span.start..end })
  }

  /// The query exactly as the player submitted it.
  pub fn raw(&self) -> &str { &self.raw }

  /// The single statement, without surrounding whitespace, comments or the
  /// terminating semicolon.
  pub fn statement(&self) -> &str { &self.raw[self.statement.clone()] }
}

/// `true` iff `query` is exactly one statement led by `SELECT`.
pub fn validate(query: &str) -> bool { ValidatedQuery::parse(query).is_ok() }

// ─── Maintenance gate ────────────────────────────────────────────────────────

/// Return the first destructive keyword appearing in `sql` as a whole word,
/// compared case-insensitively.
pub fn destructive_keyword(sql: &str) -> Option<&'static str> {
  sql
    .split(|c: char| !(c.is_alphanumeric() || c == '_'))
    .find_map(|word| {
      DESTRUCTIVE_KEYWORDS
        .iter()
        .copied()
        .find(|kw| word.eq_ignore_ascii_case(kw))
    })
}

/// Refuse a maintenance statement that contains a destructive keyword.
pub fn ensure_non_destructive(sql: &str) -> Result<()> {
  match destructive_keyword(sql) {
    Some(kw) => Err(Error::Destructive(kw)),
    None => Ok(()),
  }
}
