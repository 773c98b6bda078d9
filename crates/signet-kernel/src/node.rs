//! Tracked objects: signature obligations and what they cover.

use std::collections::BTreeMap;
use std::sync::Arc;

use signet_audit::AuditRecord;
use signet_config::SignatureConfig;
use signet_study::ExclusionTable;
use signet_types::{
    ChangeStatus, Field, Patient, Plate, RecordStatus, SignatureStatus, Status, TransactionId,
    Visit,
};

pub(crate) const EXEMPT_COMMENT: &str = "Administratively exempted";
pub(crate) const SIGNER_COMMENT: &str = "Changed by Signer";

/// Which vocabulary to render status labels in: a signature report or a
/// source-data-verification report over the same lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusVocabulary {
    #[default]
    Signature,
    Sdv,
}

/// One slot per field position enumerated by the configuration's
/// signature fields.
#[derive(Debug, Clone, Default)]
pub struct SigField {
    pub field: Field,
    pub completed: bool,
    pub desc: Option<String>,
    pub value: Option<String>,
}

/// One tracked change to a covered field.
///
/// `old_value` keeps the first value observed for the field; every later
/// change overwrites the rest.
#[derive(Debug, Clone, Default)]
pub struct FieldChange {
    pub field: Field,
    pub status: Status,
    pub desc: String,
    pub old_value: String,
    pub new_value: String,
    pub who: String,
    pub date: String,
    pub time: String,
    pub comment: Option<String>,
}

impl FieldChange {
    fn new(field: Field) -> Self {
        Self {
            field,
            ..Self::default()
        }
    }
}

/// One plate under a signature's coverage, with its tracked changes.
#[derive(Debug, Clone)]
pub struct CoveredPlate {
    pub plate: Plate,
    pub status: Status,
    pub is_final: bool,
    pub field_change_count: usize,
    pub changes: BTreeMap<Field, FieldChange>,
}

impl CoveredPlate {
    fn new(plate: Plate) -> Self {
        Self {
            plate,
            status: Status::default(),
            is_final: false,
            field_change_count: 0,
            changes: BTreeMap::new(),
        }
    }
}

/// Unique identity of a signature obligation.
///
/// Two configuration records targeting the same patient, visit and
/// signature plate with the same first signature field resolve to the
/// same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeKey {
    pub patient: Patient,
    pub visit: Visit,
    pub sig_plate: Plate,
    pub first_sig_field: i64,
}

impl NodeKey {
    pub fn new(patient: Patient, visit: Visit, config: &SignatureConfig) -> Self {
        Self {
            patient,
            visit,
            sig_plate: config.sig_plate,
            first_sig_field: config.sig_fields.min(),
        }
    }
}

/// One signature obligation: signer identity, signature-field slots and
/// the covered-plate tree.
#[derive(Debug, Clone)]
pub struct SigNode {
    pub patient: Patient,
    pub visit: Visit,
    pub config: Arc<SignatureConfig>,
    pub status: Status,
    pub signer: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub sig_rec_seen: bool,
    /// Transaction in which the obligation became complete, or none.
    pub txn_id: TransactionId,
    pub sig_fields: Vec<SigField>,
    pub plates: BTreeMap<Plate, CoveredPlate>,
}

impl SigNode {
    pub(crate) fn new(patient: Patient, visit: Visit, config: Arc<SignatureConfig>) -> Self {
        let sig_fields = config
            .sig_fields
            .values()
            .map(|v| SigField {
                field: Field::new(v as i32),
                ..SigField::default()
            })
            .collect();
        Self {
            patient,
            visit,
            config,
            status: Status::default(),
            signer: None,
            date: None,
            time: None,
            sig_rec_seen: false,
            txn_id: TransactionId::NONE,
            sig_fields,
            plates: BTreeMap::new(),
        }
    }

    /// An e-signature field was filled in. Completing the last open slot
    /// completes the obligation and records the signing transaction.
    pub(crate) fn sign(&mut self, rec: &AuditRecord, field: Field, txn_id: TransactionId) {
        let mut completed = 0;
        for slot in &mut self.sig_fields {
            if slot.field == field {
                slot.completed = true;
                slot.desc = Some(rec.field_desc().to_string());
                slot.value = Some(rec.new_value().to_string());
            }
            if slot.completed {
                completed += 1;
            }
        }

        if completed != self.config.n_sig_fields {
            return;
        }

        self.status.signature = SignatureStatus::Complete;
        self.txn_id = txn_id;
        self.signer = Some(rec.user().to_string());
        self.date = Some(rec.date().to_string());
        self.time = Some(rec.time().to_string());
    }

    /// Discards every pending change under the node once `txn_id` is its
    /// signing transaction: the signature accepts all of them.
    pub(crate) fn release_signed_values(&mut self, txn_id: TransactionId) {
        if self.txn_id != txn_id {
            return;
        }
        for cp in self.plates.values_mut() {
            cp.changes.clear();
            cp.status.record = RecordStatus::Normal;
            cp.status.change = ChangeStatus::None;
        }
    }

    /// A signature field was cleared. Signer, date and time are retained
    /// for audit output.
    pub(crate) fn unsign(&mut self, field: Field) {
        for slot in &mut self.sig_fields {
            if slot.field == field {
                slot.completed = false;
                slot.value = Some(String::new());
            }
        }

        if self.status.signature == SignatureStatus::Complete {
            self.status.signature = SignatureStatus::Invalidated;
        }
        self.txn_id = TransactionId::NONE;
    }

    /// A data change landed on a covered plate.
    pub(crate) fn data_change(
        &mut self,
        rec: &AuditRecord,
        plate: Plate,
        field: Field,
        txn_id: TransactionId,
        exclusions: &ExclusionTable,
    ) {
        let signed = self.status.signature != SignatureStatus::None;
        let cp = self
            .plates
            .entry(plate)
            .or_insert_with(|| CoveredPlate::new(plate));

        let rec_status = rec.status();
        let rec_level = rec.level();

        // Every event re-derives the record state from scratch, so a later
        // normal save clears an earlier Lost/Error marking.
        cp.status.record = RecordStatus::Normal;
        cp.is_final = rec_status == 0 || rec_status == 1;

        if rec_status == 3 && rec_level == 7 {
            if signed {
                cp.status.change = ChangeStatus::Declined;
            }
            cp.status.record = RecordStatus::Error;
        }
        if rec_status == 7 {
            if signed {
                cp.status.change = ChangeStatus::Declined;
            }
            cp.status.record = RecordStatus::Deleted;
            cp.changes.clear();
        }
        if rec_status == 0 {
            if signed {
                cp.status.change = ChangeStatus::Declined;
            }
            cp.status.record = RecordStatus::Lost;
            cp.changes.clear();
        }

        // Changes inside the signing transaction are covered by the
        // signature itself.
        if txn_id == self.txn_id {
            return;
        }

        // Status and validation metadata are not tracked at field level.
        if field.as_i32() < 7 {
            return;
        }

        let is_new = !cp.changes.contains_key(&field);
        let fc = cp
            .changes
            .entry(field)
            .or_insert_with(|| FieldChange::new(field));
        if is_new {
            fc.old_value = rec.decoded_old();
        }
        fc.who = rec.user().to_string();
        fc.date = rec.date().to_string();
        fc.time = rec.time().to_string();
        fc.desc = rec.field_desc().to_string();
        fc.new_value = rec.decoded_new();

        if is_new && exclusions.is_excluded(rec) {
            fc.comment = Some(EXEMPT_COMMENT.to_string());
            fc.status.change = ChangeStatus::Accepted;
        } else {
            fc.comment = None;
            fc.status.change = ChangeStatus::Declined;
        }
    }

    /// DRF predicate: the obligation must be revisited.
    pub fn requires_resign(&self) -> bool {
        self.status.signature == SignatureStatus::Invalidated
            || (self.status.signature == SignatureStatus::Complete
                && self.status.record == RecordStatus::Normal
                && self.status.change == ChangeStatus::Declined)
    }

    /// Human-readable state under the requested vocabulary.
    pub fn state_label(&self, vocab: StatusVocabulary) -> &'static str {
        state_label(&self.status, vocab)
    }
}

/// Renders the status triple as the report's state string.
pub fn state_label(status: &Status, vocab: StatusVocabulary) -> &'static str {
    use ChangeStatus as C;
    use RecordStatus as R;
    use SignatureStatus as S;

    match vocab {
        StatusVocabulary::Sdv => match (status.signature, status.record) {
            (S::None, R::Normal) => "NEVER VERIFIED",
            (S::None, R::Error) => "NEVER VERIFIED (ERROR REC)",
            (S::None, R::Lost) => "NEVER VERIFIED (LOST REC)",
            (S::None, R::Deleted) => "NEVER VERIFIED (DELETED REC)",
            (S::Invalidated, R::Normal) => "RE-VERIFICATION REQD",
            (S::Invalidated, R::Error) => "RE-VERIFICATION REQD (ERROR REC)",
            (S::Invalidated, R::Lost) => "RE-VERIFICATION REQD (LOST REC)",
            (S::Invalidated, R::Deleted) => "RE-VERIFICATION REQD (DELETED REC)",
            (S::Complete, R::Normal) => match status.change {
                C::None => "SDV OK",
                C::Accepted => "ADMIN EXEMPTED RE-VERIFICATION",
                C::DeclinedAtFinal => "RE-VERIFICATION REQD WHEN FINAL",
                C::Declined => "RE-VERIFICATION REQD",
            },
            (S::Complete, R::Error) => "SDV OK (ERROR REC)",
            (S::Complete, R::Lost) => "SDV OK (LOST REC)",
            (S::Complete, R::Deleted) => "SDV OK (DELETED REC)",
        },
        StatusVocabulary::Signature => match (status.signature, status.record) {
            (S::None, R::Normal) => "NEVER SIGNED",
            (S::None, R::Error) => "UNSIGNED ERROR RECORD",
            (S::None, R::Lost) => "UNSIGNED LOST RECORD",
            (S::None, R::Deleted) => "UNSIGNED DELETED RECORD",
            (S::Invalidated, R::Normal) => "SIGNATURE REMOVED",
            (S::Invalidated, R::Error) => "SIG. REMOVED, ERROR RECORD",
            (S::Invalidated, R::Lost) => "SIG. REMOVED, LOST RECORD",
            (S::Invalidated, R::Deleted) => "SIG. REMOVED, DELETED RECORD",
            (S::Complete, R::Normal) => match status.change {
                C::None => "SIGNATURE OK",
                C::Accepted => "ADMIN EXEMPTED RE-SIGN",
                C::DeclinedAtFinal => "RE-SIGN REQD WHEN FINAL",
                C::Declined => "RE-SIGN REQD",
            },
            (S::Complete, R::Error) => "SIGNED IN ERROR",
            (S::Complete, R::Lost) => "SIGNED, MARKED LOST",
            (S::Complete, R::Deleted) => "DELETED SIGNED RECORDS",
        },
    }
}
