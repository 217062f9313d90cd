//! SQLite table storage and ad-hoc queries

use crate::banks::{BankRecord, ColumnLabels};
use crate::error::EtlError;
use crate::etl::Loader;

use eyre::{Result, eyre};
use rusqlite::types::Value;
use rusqlite::{Connection, params};
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// One SQLite connection shared by the table loader and the query runner
///
/// # Example
/// ```no_run
/// use bankcap::banks::ColumnLabels;
/// use bankcap::storage::SqliteStore;
///
/// # fn example() -> eyre::Result<()> {
/// let store = SqliteStore::open("Banks.db", "Largest_banks", ColumnLabels::default())?;
/// let output = store.run_query("SELECT Name FROM Largest_banks LIMIT 5")?;
/// println!("{}", output);
/// store.close()?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    table: String,
    labels: ColumnLabels,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`
    ///
    /// # Errors
    /// Fails with [`EtlError::Storage`] if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>, table: &str, labels: ColumnLabels) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Opening database {}", path.display());
        let conn = Connection::open(path).map_err(EtlError::Storage)?;
        Ok(Self::with_connection(conn, table, labels))
    }

    /// In-memory database, gone once the store is dropped
    pub fn open_in_memory(table: &str, labels: ColumnLabels) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(EtlError::Storage)?;
        Ok(Self::with_connection(conn, table, labels))
    }

    fn with_connection(conn: Connection, table: &str, labels: ColumnLabels) -> Self {
        Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
            labels,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| eyre!("database connection lock poisoned"))
    }

    /// Drop and recreate the table, then insert every record
    ///
    /// Runs in a single transaction; returns the number of rows inserted.
    pub fn replace_table(&self, records: &[BankRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(EtlError::Storage)?;

        let table = quote_ident(&self.table);
        let [name, usd, gbp, eur, inr] = self.labels.header().map(quote_ident);

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} ({name} TEXT, {usd} REAL, {gbp} REAL, {eur} REAL, {inr} REAL);"
        ))
        .map_err(EtlError::Storage)?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {table} ({name}, {usd}, {gbp}, {eur}, {inr}) VALUES (?1, ?2, ?3, ?4, ?5)"
                ))
                .map_err(EtlError::Storage)?;

            for record in records {
                stmt.execute(params![
                    record.name,
                    record.mc_usd_billion,
                    record.mc_gbp_billion,
                    record.mc_eur_billion,
                    record.mc_inr_billion,
                ])
                .map_err(EtlError::Storage)?;
            }
        }

        tx.commit().map_err(EtlError::Storage)?;
        log::debug!("Replaced table {} with {} rows", self.table, records.len());
        Ok(records.len())
    }

    /// Run a read-only query and collect every row
    ///
    /// # Errors
    /// Fails with [`EtlError::Query`] for invalid SQL, statements that would
    /// modify the database, or driver errors while stepping the rows.
    pub fn run_query(&self, sql: &str) -> Result<QueryOutput> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(EtlError::Query)?;
        if !stmt.readonly() {
            return Err(EtlError::Query(rusqlite::Error::InvalidQuery).into());
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt.query([]).map_err(EtlError::Query)?;
        let mut output = Vec::new();
        while let Some(row) = rows.next().map_err(EtlError::Query)? {
            let values = (0..columns.len())
                .map(|i| row.get::<_, Value>(i))
                .collect::<Result<Vec<_>, _>>()
                .map_err(EtlError::Query)?;
            output.push(values);
        }

        Ok(QueryOutput {
            columns,
            rows: output,
        })
    }

    /// Close the connection, reporting any error from SQLite
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| eyre!("database connection lock poisoned"))?;
        conn.close().map_err(|(_, e)| EtlError::Storage(e))?;
        Ok(())
    }
}

impl Loader for SqliteStore {
    type Item = BankRecord;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        self.replace_table(&items)
    }
}

/// Quote an SQL identifier, doubling embedded quotes
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Column names and rows returned by [`SqliteStore::run_query`]
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) if r.fract() == 0.0 && r.is_finite() => format!("{:.1}", r),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

impl fmt::Display for QueryOutput {
    /// Aligned text table with a row index column
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(render).collect())
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:index_width$}", "")?;
        for (name, &width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", name)?;
        }

        if cells.is_empty() {
            return write!(f, "\n(0 rows)");
        }

        for (idx, row) in cells.iter().enumerate() {
            write!(f, "\n{:<index_width$}", idx)?;
            for (cell, &width) in row.iter().zip(&widths) {
                write!(f, "  {:>width$}", cell)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, usd: f64) -> BankRecord {
        BankRecord {
            name: name.to_string(),
            mc_usd_billion: usd,
            mc_gbp_billion: usd * 0.8,
            mc_eur_billion: usd * 0.93,
            mc_inr_billion: usd * 82.95,
        }
    }

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory("Largest_banks", ColumnLabels::default()).unwrap()
    }

    #[test]
    fn test_replace_table_discards_previous_rows() {
        let store = store();
        store
            .replace_table(&[record("Bank A", 100.0), record("Bank B", 50.0)])
            .unwrap();
        store.replace_table(&[record("Bank C", 10.0)]).unwrap();

        let output = store.run_query("SELECT Name FROM Largest_banks").unwrap();
        assert_eq!(output.rows, vec![vec![Value::Text("Bank C".to_string())]]);
    }

    #[test]
    fn test_query_columns_follow_labels() {
        let store = store();
        store.replace_table(&[record("Bank A", 100.0)]).unwrap();

        let output = store.run_query("SELECT * FROM Largest_banks").unwrap();
        assert_eq!(
            output.columns,
            vec![
                "Name",
                "MC_USD_Billion",
                "MC_GBP_Billion",
                "MC_EUR_Billion",
                "MC_INR_Billion"
            ]
        );
        assert_eq!(output.rows[0][1], Value::Real(100.0));
    }

    #[test]
    fn test_aggregate_query() {
        let store = store();
        store
            .replace_table(&[record("Bank A", 100.0), record("Bank B", 300.0)])
            .unwrap();

        let output = store
            .run_query("SELECT AVG(MC_USD_Billion) FROM Largest_banks")
            .unwrap();
        assert_eq!(output.rows, vec![vec![Value::Real(200.0)]]);
    }

    #[test]
    fn test_query_without_matches_is_empty() {
        let store = store();
        store.replace_table(&[record("Bank A", 100.0)]).unwrap();

        let output = store
            .run_query("SELECT Name FROM Largest_banks WHERE MC_USD_Billion > 1000")
            .unwrap();
        assert!(output.is_empty());
        assert_eq!(output.columns, vec!["Name"]);
    }

    #[test]
    fn test_query_errors() {
        let store = store();

        let err = store.run_query("SELECT * FROM missing_table").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EtlError>(),
            Some(EtlError::Query(_))
        ));

        let err = store.run_query("DELETE FROM Largest_banks").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EtlError>(),
            Some(EtlError::Query(_))
        ));
    }

    #[test]
    fn test_table_name_is_quoted() {
        let store = SqliteStore::open_in_memory("largest banks", ColumnLabels::default()).unwrap();
        store.replace_table(&[record("Bank A", 1.0)]).unwrap();

        let output = store
            .run_query("SELECT COUNT(*) FROM \"largest banks\"")
            .unwrap();
        assert_eq!(output.rows, vec![vec![Value::Integer(1)]]);
    }

    #[test]
    fn test_display_table() {
        let output = QueryOutput {
            columns: vec!["Name".to_string(), "MC_USD_Billion".to_string()],
            rows: vec![
                vec![Value::Text("Bank A".to_string()), Value::Real(100.0)],
                vec![Value::Text("B".to_string()), Value::Real(2.5)],
            ],
        };

        assert_eq!(
            output.to_string(),
            "     Name  MC_USD_Billion\n\
             0  Bank A           100.0\n\
             1       B             2.5"
        );
    }

    #[tokio::test]
    async fn test_load_and_close_file_database() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("Banks.db");

        let store = SqliteStore::open(&path, "Largest_banks", ColumnLabels::default()).unwrap();
        let count = store.load(vec![record("Bank A", 1.0)]).await.unwrap();
        assert_eq!(count, 1);
        store.close().unwrap();

        let reopened = SqliteStore::open(&path, "Largest_banks", ColumnLabels::default()).unwrap();
        let output = reopened
            .run_query("SELECT Name FROM Largest_banks")
            .unwrap();
        assert_eq!(output.rows.len(), 1);
    }
}
