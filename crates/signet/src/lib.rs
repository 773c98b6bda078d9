//! # Signet
//!
//! Electronic-signature tracking over clinical audit trails.
//!
//! Signet consumes the field-level audit stream of a clinical data
//! management system and decides, per signature obligation, whether the
//! signature was executed, whether it still stands, and what changed
//! after signing:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Signet                             │
//! │  ┌────────┐   ┌─────────┐   ┌──────────┐   ┌─────────────┐  │
//! │  │ Config │ → │ Engine  │ → │ Evaluate │ → │ DRF/Report/ │  │
//! │  │ (DSL)  │   │ (audit) │   │ (status) │   │   SQLite    │  │
//! │  └────────┘   └─────────┘   └──────────┘   └─────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::io::BufReader;
//! use signet::{EvaluatePolicies, Tracker};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let outcome = signet::parse_config(r#"
//!     signature "Investigator" plate 10 visit * fields 8 {
//!         plate 10;
//!         plate 11;
//!     }
//! "#);
//! assert!(outcome.errors.is_empty());
//!
//! let mut tracker = Tracker::new(outcome.configs, Default::default());
//! tracker.process(BufReader::new(std::io::stdin()))?;
//! tracker.evaluate(EvaluatePolicies::default());
//!
//! for node in tracker.nodes().filter(|n| n.requires_resign()) {
//!     println!("{}|{}|{}", node.patient, node.visit, node.config.sig_plate);
//! }
//! # Ok(())
//! # }
//! ```

use std::io::{self, BufRead};

use signet_audit::{AuditRecord, TransactionGrouper};
use signet_config::SignatureConfig;
use signet_kernel::Engine;

// Re-export the public surface of the foundation crates.
pub use signet_config::{ParseOutcome, SyntaxError, parse as parse_config, write_priority};
pub use signet_kernel::{EvaluatePolicies, SigNode, StatusVocabulary};
pub use signet_sinks::{SigningDb, SinkError, report, write_drf};
pub use signet_study::{Centers, Countries, ExclusionTable, StudyError};
pub use signet_types::{ChangeStatus, RecordStatus, SignatureStatus, Status};

/// The assembled pipeline: transaction grouping, the state engine, and
/// the optional SQLite sink fed from engine effects.
pub struct Tracker {
    engine: Engine,
    grouper: TransactionGrouper,
    db: Option<SigningDb>,
}

impl Tracker {
    pub fn new(configs: Vec<SignatureConfig>, exclusions: ExclusionTable) -> Self {
        Self {
            engine: Engine::new(configs, exclusions),
            grouper: TransactionGrouper::new(),
            db: None,
        }
    }

    /// Attaches the signings database; effects are executed as they are
    /// produced.
    #[must_use]
    pub fn with_db(mut self, db: SigningDb) -> Self {
        self.db = Some(db);
        self
    }

    /// Dispatches one audit line.
    pub fn ingest_line(&mut self, line: &str) {
        let rec = AuditRecord::parse(line, '|');
        let txn_id = self.grouper.assign(&rec);
        for effect in self.engine.apply(&rec, txn_id) {
            if let Some(db) = &self.db {
                db.apply(&effect);
            }
        }
    }

    /// Consumes the whole audit stream, one line at a time.
    pub fn process<R: BufRead>(&mut self, reader: R) -> io::Result<()> {
        for line in reader.lines() {
            self.ingest_line(&line?);
        }
        Ok(())
    }

    /// Runs the status propagation pass. Call exactly once, after the
    /// stream is exhausted.
    pub fn evaluate(&mut self, policies: EvaluatePolicies) {
        self.engine.evaluate(policies);
    }

    /// The obligation forest, in report order.
    pub fn nodes(&self) -> impl Iterator<Item = &SigNode> {
        self.engine.nodes()
    }

    /// Commits and closes the signings database, if attached.
    pub fn finish(self) -> Result<(), SinkError> {
        if let Some(db) = self.db {
            db.close()?;
        }
        Ok(())
    }
}
