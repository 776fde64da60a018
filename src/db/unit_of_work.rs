//! Explicit unit of work over a SQLite transaction.
//!
//! Every mutating clinical operation receives a `UnitOfWork` instead of
//! reaching for ambient session state. The transaction is opened with
//! `BEGIN IMMEDIATE`, so the write lock is taken before the first read and
//! read-modify-write sequences on one row cannot interleave across
//! connections. Dropping the unit without `commit` rolls everything back.

use std::ops::Deref;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::DatabaseError;

pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> UnitOfWork<'conn> {
    /// Begin an immediate transaction on `conn`.
    pub fn begin(conn: &'conn Connection) -> Result<Self, DatabaseError> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        Ok(Self { tx })
    }

    pub fn conn(&self) -> &Connection {
        &self.tx
    }

    pub fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit()?;
        Ok(())
    }

    pub fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback()?;
        Ok(())
    }
}

impl Deref for UnitOfWork<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

/// Run `op` inside a fresh unit of work: commit on `Ok`, roll back on `Err`.
pub fn with_unit_of_work<T, E, F>(conn: &Connection, op: F) -> Result<T, E>
where
    E: From<DatabaseError>,
    F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
{
    let uow = UnitOfWork::begin(conn)?;
    let value = op(&uow)?;
    uow.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn count_departments(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM departments", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn commit_makes_writes_visible() {
        let conn = open_memory_database().unwrap();
        let uow = UnitOfWork::begin(&conn).unwrap();
        uow.execute("INSERT INTO departments (id, name) VALUES ('d1', 'Cardiology')", [])
            .unwrap();
        uow.commit().unwrap();
        assert_eq!(count_departments(&conn), 1);
    }

    #[test]
    fn drop_without_commit_rolls_back() {
        let conn = open_memory_database().unwrap();
        {
            let uow = UnitOfWork::begin(&conn).unwrap();
            uow.execute("INSERT INTO departments (id, name) VALUES ('d1', 'Cardiology')", [])
                .unwrap();
        }
        assert_eq!(count_departments(&conn), 0);
    }

    #[test]
    fn error_in_closure_rolls_back() {
        let conn = open_memory_database().unwrap();
        let result: Result<(), DatabaseError> = with_unit_of_work(&conn, |uow| {
            uow.execute("INSERT INTO departments (id, name) VALUES ('d1', 'Cardiology')", [])?;
            Err(DatabaseError::ConstraintViolation("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(count_departments(&conn), 0);
    }

    #[test]
    fn second_writer_is_refused_while_first_holds_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uow.db");
        let first = crate::db::open_database(&path, std::time::Duration::ZERO).unwrap();
        let second = crate::db::open_database(&path, std::time::Duration::ZERO).unwrap();

        let held = UnitOfWork::begin(&first).unwrap();
        let refused = UnitOfWork::begin(&second);
        assert!(matches!(refused, Err(ref e) if e.is_conflict()));
        held.rollback().unwrap();

        assert!(UnitOfWork::begin(&second).is_ok());
    }
}
