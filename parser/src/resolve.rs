//! Resolution of parsed scripts against a table registry.
//!
//! [`TableRegistry`] holds the schemas known so far, keyed by the dot-joined
//! table identifier. Statements are applied in order: plain tables are
//! registered as declared, LIKE tables are merged against their source.
//!
//! ```
//! use table_like_core::MergeDefaults;
//! use table_like_parser::parse_script;
//! use table_like_parser::resolve::TableRegistry;
//!
//! let script = parse_script(
//!     "CREATE TABLE base (id BIGINT, v STRING) WITH ('connector' = 'kafka');
//!      CREATE TABLE copy (extra INT) LIKE base (EXCLUDING OPTIONS);",
//! )
//! .unwrap();
//!
//! let mut registry = TableRegistry::new();
//! for statement in &script {
//!     registry.apply(statement, &MergeDefaults::default()).unwrap();
//! }
//!
//! let copy = registry.get("copy").unwrap();
//! assert_eq!(copy.column_names(), vec!["id", "v", "extra"]);
//! assert!(copy.options.is_empty());
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use table_like_core::{
    MergeDefaults, MergeError, ObjectIdentifier, TableSchema, merge_tables_with_defaults,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::ast::{CreateTableStatement, TableBody};

/// Errors raised while applying statements to a [`TableRegistry`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Source table '{table}' does not exist")]
    UnknownSource { table: String },

    #[error("Table '{table}' already exists")]
    TableExists { table: String },

    #[error("{table}: {error}")]
    Merge {
        table: String,
        #[source]
        error: MergeError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog file {}: {error}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
}

/// Outcome of applying one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub name: ObjectIdentifier,
    pub schema: TableSchema,
    /// `false` when `IF NOT EXISTS` kept an existing table.
    pub created: bool,
}

/// In-memory catalog of table schemas.
#[derive(Debug, Default, Clone)]
pub struct TableRegistry {
    tables: HashMap<String, TableSchema>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a catalog from a directory of `<table>.json` files.
    ///
    /// The file stem is the table key, so `db.orders.json` registers
    /// `db.orders`. Each file holds a serialized [`TableSchema`]; extra
    /// fields such as `name` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Io`] if the directory or a file cannot be
    /// read, or [`ResolveError::Json`] naming the file that failed to parse.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let mut tables = HashMap::new();

        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = file_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = key.to_string();
            let file = std::fs::File::open(&file_path)?;
            let reader = std::io::BufReader::new(file);
            let schema: TableSchema =
                serde_json::from_reader(reader).map_err(|error| ResolveError::Json {
                    path: file_path.clone(),
                    error,
                })?;
            tables.insert(key, schema);
        }

        info!(dir = %path.display(), tables = tables.len(), "Loaded table catalog");
        Ok(Self { tables })
    }

    /// Registers `schema` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: &ObjectIdentifier, schema: TableSchema) {
        self.tables.insert(name.key(), schema);
    }

    /// Looks a table up by its dot-joined key.
    pub fn get(&self, key: &str) -> Option<&TableSchema> {
        self.tables.get(key)
    }

    pub fn contains(&self, name: &ObjectIdentifier) -> bool {
        self.tables.contains_key(&name.key())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the sorted table keys.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Applies one statement.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::TableExists`] if the table is already registered and
    ///   the statement lacks `IF NOT EXISTS`.
    /// - [`ResolveError::UnknownSource`] if the LIKE source is not registered.
    /// - [`ResolveError::Merge`] if the LIKE options are invalid or the merge
    ///   fails.
    pub fn apply(
        &mut self,
        statement: &CreateTableStatement,
        defaults: &MergeDefaults,
    ) -> Result<ResolvedTable, ResolveError> {
        let key = statement.name.key();

        if let Some(existing) = self.tables.get(&key) {
            if !statement.if_not_exists {
                return Err(ResolveError::TableExists { table: key });
            }
            debug!(table = %key, "Table exists, statement skipped");
            return Ok(ResolvedTable {
                name: statement.name.clone(),
                schema: existing.clone(),
                created: false,
            });
        }

        let schema = match &statement.body {
            TableBody::Plain(schema) => schema.clone(),
            TableBody::Like(clause) => {
                let source_key = clause.source_table().key();
                let source = self
                    .tables
                    .get(&source_key)
                    .ok_or(ResolveError::UnknownSource { table: source_key })?;
                merge_tables_with_defaults(source, clause.local(), clause.options(), defaults)
                    .map_err(|error| ResolveError::Merge {
                        table: key.clone(),
                        error,
                    })?
            }
        };

        debug!(table = %key, columns = schema.columns.len(), "Registered table");
        self.tables.insert(key, schema.clone());
        Ok(ResolvedTable {
            name: statement.name.clone(),
            schema,
            created: true,
        })
    }
}
