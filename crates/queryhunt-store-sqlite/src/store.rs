//! [`SqliteSandbox`]: the SQLite implementation of [`SandboxStore`].

use std::{
  collections::{BTreeSet, HashMap},
  path::{Path, PathBuf},
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use queryhunt_core::{
  SchemaName, ValidatedQuery,
  leaderboard::LeaderboardEntry,
  store::{QueryOutput, SandboxStore},
  tables::GameTable,
};
use tokio_rusqlite::Connection;

use crate::{
  Error, Result,
  encode::{RawLeaderboardEntry, cell_to_json, encode_date},
  schema::{LEADERBOARD_SCHEMA, SANDBOX_EXTENSION, SANDBOX_PRAGMAS},
};

/// Rows returned to the player beyond this count are dropped and the result
/// is flagged as truncated.
pub const MAX_RESULT_ROWS: usize = 10_000;

// ─── Location ────────────────────────────────────────────────────────────────

/// Where sandbox databases live.
#[derive(Debug, Clone)]
pub enum Location {
  /// Private in-memory databases; a schema lives as long as its connection.
  Memory,
  /// One `<schema>.db` file per schema in this directory. Schemas survive
  /// restarts.
  ///
  /// Files are matched by exact name, so names differing only by case
  /// (`UserA`, `usera`) cannot share a file on case-insensitive filesystems;
  /// the second one is refused with [`Error::NameClash`]. The leaderboard
  /// must not be a `.db` file directly inside this directory.
  Directory(PathBuf),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Sandbox schemas backed by one SQLite database each, plus a shared
/// leaderboard database.
///
/// Cloning is cheap; connections and the schema registry are
/// reference-counted.
#[derive(Clone)]
pub struct SqliteSandbox {
  location:    Arc<Location>,
  leaderboard: Connection,
  schemas:     Arc<Mutex<HashMap<SchemaName, Connection>>>,
}

impl SqliteSandbox {
  /// Open a store whose sandboxes live at `location` and whose leaderboard is
  /// the database file at `leaderboard_path` (created if missing).
  ///
  /// Fails with [`Error::LeaderboardInSandboxDir`] when the leaderboard file
  /// would itself look like a sandbox schema.
  pub async fn open(location: Location, leaderboard_path: impl AsRef<Path>) -> Result<Self> {
    let leaderboard_path = leaderboard_path.as_ref();
    let parent = match leaderboard_path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p,
      _ => Path::new("."),
    };
    tokio::fs::create_dir_all(parent).await?;

    if let Location::Directory(dir) = &location {
      tokio::fs::create_dir_all(dir).await?;
      let same_dir =
        tokio::fs::canonicalize(dir).await? == tokio::fs::canonicalize(parent).await?;
      if same_dir && sandbox_stem(leaderboard_path).is_some() {
        return Err(Error::LeaderboardInSandboxDir(leaderboard_path.to_path_buf()));
      }
    }

    let store = Self {
      location:    Arc::new(location),
      leaderboard: Connection::open(leaderboard_path).await?,
      schemas:     Arc::default(),
    };
    store.init_leaderboard().await?;
    Ok(store)
  }

  /// In-memory sandboxes and leaderboard, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let store = Self {
      location:    Arc::new(Location::Memory),
      leaderboard: Connection::open_in_memory().await?,
      schemas:     Arc::default(),
    };
    store.init_leaderboard().await?;
    Ok(store)
  }

  async fn init_leaderboard(&self) -> Result<()> {
    self
      .leaderboard
      .call(|conn| {
        conn.execute_batch(LEADERBOARD_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Every leaderboard row, oldest first.
  pub async fn leaderboard_entries(&self) -> Result<Vec<LeaderboardEntry>> {
    let raws: Vec<RawLeaderboardEntry> = self
      .leaderboard
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT username, date, time_sec FROM Leaderboard ORDER BY id")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawLeaderboardEntry {
              username: row.get(0)?,
              date:     row.get(1)?,
              time_sec: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLeaderboardEntry::into_entry).collect()
  }

  fn registry(&self) -> MutexGuard<'_, HashMap<SchemaName, Connection>> {
    self.schemas.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn sandbox_path(dir: &Path, schema: &SchemaName) -> PathBuf {
    dir.join(format!("{schema}.{SANDBOX_EXTENSION}"))
  }

  /// Open a sandbox connection and apply per-connection pragmas.
  async fn open_sandbox(path: Option<&Path>) -> Result<Connection> {
    let conn = match path {
      Some(p) => Connection::open(p).await?,
      None => Connection::open_in_memory().await?,
    };
    conn
      .call(|c| {
        c.execute_batch(SANDBOX_PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(conn)
  }

  /// The live connection for `schema`, opening an on-disk sandbox left over
  /// from a previous run if needed.
  async fn connection(&self, schema: &SchemaName) -> Result<Connection> {
    let cached = self.registry().get(schema).cloned();
    if let Some(conn) = cached {
      return Ok(conn);
    }

    let Location::Directory(dir) = &*self.location else {
      return Err(Error::UnknownSchema(schema.clone()));
    };

    let SandboxFile::Exact(path) = find_sandbox_file(dir, schema).await? else {
      return Err(Error::UnknownSchema(schema.clone()));
    };

    let conn = Self::open_sandbox(Some(&path)).await?;
    let conn = self.registry().entry(schema.clone()).or_insert(conn).clone();
    Ok(conn)
  }
}

// ─── Sandbox files ───────────────────────────────────────────────────────────

/// The schema-shaped stem of `path` if it has the sandbox extension.
fn sandbox_stem(path: &Path) -> Option<&str> {
  let ext = path.extension()?.to_str()?;
  if !ext.eq_ignore_ascii_case(SANDBOX_EXTENSION) {
    return None;
  }
  path.file_stem()?.to_str()
}

enum SandboxFile {
  Missing,
  Exact(PathBuf),
  /// A file whose name differs from the schema only by case. On
  /// case-insensitive filesystems it would be opened in the schema's place.
  CaseVariant(String),
}

/// Look up the file backing `schema` by exact name, without trusting the
/// filesystem's own case folding.
async fn find_sandbox_file(dir: &Path, schema: &SchemaName) -> Result<SandboxFile> {
  let mut variant = None;
  let mut entries = tokio::fs::read_dir(dir).await?;
  while let Some(entry) = entries.next_entry().await? {
    let path = entry.path();
    let Some(stem) = sandbox_stem(&path) else {
      continue;
    };
    if stem == schema.as_str() {
      return Ok(SandboxFile::Exact(path));
    }
    if stem.eq_ignore_ascii_case(schema.as_str()) {
      variant = Some(stem.to_owned());
    }
  }
  Ok(variant.map_or(SandboxFile::Missing, SandboxFile::CaseVariant))
}

// ─── Player queries ──────────────────────────────────────────────────────────

/// Execute one read-only statement and collect its rows.
///
/// Errors are returned as SQLite's own message so they can be shown to the
/// player verbatim.
fn select_rows(conn: &rusqlite::Connection, sql: &str) -> Result<QueryOutput, String> {
  let mut stmt = conn.prepare(sql).map_err(|e| e.to_string())?;
  if !stmt.readonly() {
    return Err("only read-only statements can be executed".to_owned());
  }

  let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
  let width = columns.len();

  let mut rows = stmt.query([]).map_err(|e| e.to_string())?;
  let mut out = Vec::new();
  let mut truncated = false;

  while let Some(row) = rows.next().map_err(|e| e.to_string())? {
    if out.len() == MAX_RESULT_ROWS {
      truncated = true;
      break;
    }
    let cells = (0..width)
      .map(|i| row.get_ref(i).map(cell_to_json))
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| e.to_string())?;
    out.push(cells);
  }

  Ok(QueryOutput { columns, rows: out, truncated })
}

// ─── SandboxStore impl ───────────────────────────────────────────────────────

impl SandboxStore for SqliteSandbox {
  type Error = Error;

  // ── Provisioning ──────────────────────────────────────────────────────────

  async fn schema_exists(&self, schema: &SchemaName) -> Result<bool> {
    if self.registry().contains_key(schema) {
      return Ok(true);
    }
    match &*self.location {
      Location::Memory => Ok(false),
      Location::Directory(dir) => {
        Ok(matches!(find_sandbox_file(dir, schema).await?, SandboxFile::Exact(_)))
      }
    }
  }

  async fn create_schema_and_tables(&self, schema: &SchemaName) -> Result<()> {
    if self.registry().contains_key(schema) {
      return Err(Error::SchemaExists(schema.clone()));
    }

    let conn = match &*self.location {
      Location::Memory => {
        let conn = Self::open_sandbox(None).await?;
        let mut registry = self.registry();
        if registry.contains_key(schema) {
          return Err(Error::SchemaExists(schema.clone()));
        }
        registry.insert(schema.clone(), conn.clone());
        conn
      }
      Location::Directory(dir) => {
        match find_sandbox_file(dir, schema).await? {
          SandboxFile::Missing => {}
          SandboxFile::Exact(_) => return Err(Error::SchemaExists(schema.clone())),
          SandboxFile::CaseVariant(other) => {
            return Err(Error::NameClash { schema: schema.clone(), other });
          }
        }
        // Claiming the file is the CREATE SCHEMA step: it fails if another
        // game already owns this name.
        let path = Self::sandbox_path(dir, schema);
        match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
          Ok(_) => {}
          Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::SchemaExists(schema.clone()));
          }
          Err(e) => return Err(e.into()),
        }
        let conn = Self::open_sandbox(Some(&path)).await?;
        self.registry().insert(schema.clone(), conn.clone());
        conn
      }
    };

    for table in GameTable::CREATION_ORDER {
      let ddl = table.ddl();
      conn
        .call(move |c| {
          c.execute_batch(ddl)?;
          Ok(())
        })
        .await?;
    }

    tracing::debug!(%schema, "sandbox schema created");
    Ok(())
  }

  async fn reset_schema(&self, schema: &SchemaName) -> Result<()> {
    let conn = self.connection(schema).await?;
    conn
      .call(|c| {
        for table in GameTable::RESET_ORDER {
          c.execute(&format!("DELETE FROM {}", table.name()), [])?;
        }
        Ok(())
      })
      .await?;

    tracing::debug!(%schema, "sandbox schema reset");
    Ok(())
  }

  async fn drop_schema(&self, schema: &SchemaName) -> Result<()> {
    let conn = self.registry().remove(schema);
    if let Some(conn) = conn {
      conn.close().await?;
    }

    if let Location::Directory(dir) = &*self.location
      && let SandboxFile::Exact(path) = find_sandbox_file(dir, schema).await?
    {
      match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
      }
    }

    tracing::debug!(%schema, "sandbox schema dropped");
    Ok(())
  }

  async fn list_schemas(&self) -> Result<Vec<SchemaName>> {
    let mut names: BTreeSet<SchemaName> = self.registry().keys().cloned().collect();

    if let Location::Directory(dir) = &*self.location {
      let mut entries = tokio::fs::read_dir(dir).await?;
      while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(name) = sandbox_stem(&path).and_then(|s| SchemaName::parse(s).ok()) {
          names.insert(name);
        }
      }
    }

    Ok(names.into_iter().collect())
  }

  // ── Sandbox contents ──────────────────────────────────────────────────────

  async fn execute_maintenance(&self, schema: &SchemaName, statements: &[String]) -> Result<()> {
    let conn = self.connection(schema).await?;
    let statements = statements.to_vec();
    conn
      .call(move |c| {
        for statement in &statements {
          c.execute_batch(statement)?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn run_query(&self, schema: &SchemaName, query: &ValidatedQuery) -> Result<QueryOutput> {
    let conn = self.connection(schema).await?;
    let sql = query.statement().to_owned();
    let output = conn.call(move |c| Ok(select_rows(c, &sql))).await?;
    output.map_err(Error::Execution)
  }

  async fn ground_truth(&self, schema: &SchemaName) -> Result<Vec<String>> {
    let conn = self.connection(schema).await?;
    let names = conn
      .call(|c| {
        let mut stmt = c.prepare("SELECT name FROM Murderer")?;
        let names = stmt
          .query_map([], |row| row.get::<_, Option<String>>(0))?
          .map(|name| name.map(Option::unwrap_or_default))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn row_counts(&self, schema: &SchemaName) -> Result<Vec<(GameTable, u64)>> {
    let conn = self.connection(schema).await?;
    let counts = conn
      .call(|c| {
        GameTable::CREATION_ORDER
          .into_iter()
          .map(|table| -> tokio_rusqlite::Result<(GameTable, u64)> {
            let n: i64 =
              c.query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |r| r.get(0))?;
            Ok((table, n.max(0) as u64))
          })
          .collect::<tokio_rusqlite::Result<Vec<_>>>()
      })
      .await?;
    Ok(counts)
  }

  // ── Leaderboard ───────────────────────────────────────────────────────────

  async fn insert_leaderboard_entry(&self, entry: &LeaderboardEntry) -> Result<()> {
    let username = entry.username.clone();
    let date = encode_date(entry.date);
    let time_sec = entry.time_sec;

    self
      .leaderboard
      .call(move |conn| {
        conn.execute(
          "INSERT INTO Leaderboard (username, date, time_sec) VALUES (?1, ?2, ?3)",
          rusqlite::params![username, date, time_sec],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
