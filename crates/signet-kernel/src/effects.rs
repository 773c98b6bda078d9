//! Sink rows produced by signing transactions.
//!
//! The engine never writes; a completing signature and the data changes
//! of its signing transaction come back as effects carrying the
//! fully-materialised rows for the SQLite sink.

use signet_types::{Field, Patient, Plate, TransactionId, Visit};

use crate::node::SigNode;

/// One row of the `signings` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRow {
    pub txn_id: TransactionId,
    pub sig_id: u32,
    pub patient: Patient,
    pub visit: Visit,
    pub plate: Plate,
    pub desc: String,
    pub signer: String,
    pub date: String,
    pub time: String,
}

/// One row of the `signature_values` or `data_values` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRow {
    pub txn_id: TransactionId,
    pub sig_id: u32,
    pub plate: Plate,
    pub field: Field,
    pub desc: Option<String>,
    pub value: Option<String>,
}

/// A sink write requested by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A signature just completed: record the signing, every signature
    /// field, and every data change pending at that instant.
    RecordSigning {
        signing: SigningRow,
        signature_values: Vec<ValueRow>,
        data_values: Vec<ValueRow>,
    },
    /// A data change arrived during the signing transaction; keep its
    /// stored value current.
    UpsertDataValue(ValueRow),
}

impl Effect {
    /// Snapshots `node` right after a completing sign, before the pending
    /// changes are released.
    pub(crate) fn record_signing(node: &SigNode) -> Self {
        let config = &node.config;
        let signing = SigningRow {
            txn_id: node.txn_id,
            sig_id: config.serial,
            patient: node.patient,
            visit: node.visit,
            plate: config.sig_plate,
            desc: config.name.clone(),
            signer: node.signer.clone().unwrap_or_default(),
            date: node.date.clone().unwrap_or_default(),
            time: node.time.clone().unwrap_or_default(),
        };
        let signature_values = node
            .sig_fields
            .iter()
            .map(|slot| ValueRow {
                txn_id: node.txn_id,
                sig_id: config.serial,
                plate: config.sig_plate,
                field: slot.field,
                desc: slot.desc.clone(),
                value: slot.value.clone(),
            })
            .collect();
        let data_values = node
            .plates
            .values()
            .flat_map(|cp| {
                cp.changes.values().map(|fc| ValueRow {
                    txn_id: node.txn_id,
                    sig_id: config.serial,
                    plate: cp.plate,
                    field: fc.field,
                    desc: Some(fc.desc.clone()),
                    value: Some(fc.new_value.clone()),
                })
            })
            .collect();
        Effect::RecordSigning {
            signing,
            signature_values,
            data_values,
        }
    }
}
