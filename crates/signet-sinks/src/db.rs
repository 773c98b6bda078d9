//! SQLite writeback of signings.
//!
//! Three tables, recreated on open:
//!
//! ```text
//! signings(txnid, sigid, pid, visit, plate, sdesc, signer, sdate, stime)
//!     primary key (txnid, sigid)
//! signature_values(txnid, sigid, plate, field, fdesc, fvalue)
//!     primary key (txnid, sigid, plate, field)
//! data_values(txnid, sigid, plate, field, fdesc, fvalue)
//!     primary key (txnid, sigid, plate, field)
//! ```
//!
//! Every write is an `INSERT OR REPLACE` inside a single transaction
//! begun at open and committed at close; an aborted run leaves nothing
//! behind. Row failures are logged and the row abandoned.

use std::path::Path;

use rusqlite::{Connection, params};
use signet_kernel::{Effect, SigningRow, ValueRow};
use tracing::warn;

use crate::SinkError;

const SETUP: &str = "\
drop table if exists signings;
drop table if exists signature_values;
drop table if exists data_values;
create table signings (
  txnid  int not null,
  sigid  int not null,
  pid    int not null,
  visit  int not null,
  plate  int not null,
  sdesc  text,
  signer text,
  sdate  text,
  stime  text,
  primary key (txnid, sigid));
create table signature_values (
  txnid  int not null,
  sigid  int not null,
  plate  int not null,
  field  int not null,
  fdesc  text,
  fvalue text,
  primary key (txnid, sigid, plate, field));
create table data_values (
  txnid  int not null,
  sigid  int not null,
  plate  int not null,
  field  int not null,
  fdesc  text,
  fvalue text,
  primary key (txnid, sigid, plate, field));
create index signings_idx on signings(pid, visit, plate);
begin transaction;
";

/// An open signings database with its run-long transaction in progress.
#[derive(Debug)]
pub struct SigningDb {
    conn: Connection,
}

impl SigningDb {
    /// Opens (or creates) the database, recreates the schema and begins
    /// the run transaction.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SETUP)?;
        Ok(Self { conn })
    }

    /// Executes one engine effect. Row failures are logged and skipped;
    /// the run carries on and commits partial state.
    pub fn apply(&self, effect: &Effect) {
        match effect {
            Effect::RecordSigning {
                signing,
                signature_values,
                data_values,
            } => {
                if let Err(err) = self.insert_signing(signing) {
                    warn!(error = %err, "signing row abandoned");
                    return;
                }
                for row in signature_values {
                    if let Err(err) = self.insert_value("signature_values", row) {
                        warn!(error = %err, "signature value row abandoned");
                        break;
                    }
                }
                for row in data_values {
                    if let Err(err) = self.insert_value("data_values", row) {
                        warn!(error = %err, "data value row abandoned");
                        break;
                    }
                }
            }
            Effect::UpsertDataValue(row) => {
                if let Err(err) = self.insert_value("data_values", row) {
                    warn!(error = %err, "data value row abandoned");
                }
            }
        }
    }

    fn insert_signing(&self, row: &SigningRow) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "insert or replace into signings values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                row.txn_id.as_u64() as i64,
                row.sig_id,
                row.patient.as_u64() as i64,
                row.visit.as_u32(),
                row.plate.as_u32(),
                row.desc,
                row.signer,
                row.date,
                row.time,
            ],
        )?;
        Ok(())
    }

    fn insert_value(&self, table: &str, row: &ValueRow) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            &format!("insert or replace into {table} values (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                row.txn_id.as_u64() as i64,
                row.sig_id,
                row.plate.as_u32(),
                row.field.as_i32(),
                row.desc,
                row.value,
            ],
        )?;
        Ok(())
    }

    /// Commits the run transaction and closes the database.
    pub fn close(self) -> Result<(), SinkError> {
        self.conn.execute_batch("commit")?;
        Ok(())
    }
}
