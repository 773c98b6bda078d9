//! Configuration matching and audit-event dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use signet_audit::AuditRecord;
use signet_config::SignatureConfig;
use signet_study::ExclusionTable;
use signet_types::TransactionId;

use crate::effects::{Effect, ValueRow};
use crate::node::{NodeKey, SigNode};

/// The signature state engine.
///
/// Owns the configuration records (in declaration order, which decides
/// dispatch order), the exclusion table, and the forest of signature
/// obligations built lazily as events arrive.
#[derive(Debug)]
pub struct Engine {
    configs: Vec<Arc<SignatureConfig>>,
    exclusions: ExclusionTable,
    nodes: BTreeMap<NodeKey, SigNode>,
}

impl Engine {
    pub fn new(configs: Vec<SignatureConfig>, exclusions: ExclusionTable) -> Self {
        Self {
            configs: configs.into_iter().map(Arc::new).collect(),
            exclusions,
            nodes: BTreeMap::new(),
        }
    }

    /// The configuration records, in declaration order.
    pub fn configs(&self) -> impl Iterator<Item = &SignatureConfig> {
        self.configs.iter().map(Arc::as_ref)
    }

    /// The obligation forest in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &SigNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn forest_mut(&mut self) -> &mut BTreeMap<NodeKey, SigNode> {
        &mut self.nodes
    }

    /// Dispatches one audit event, returning the sink writes it demands.
    ///
    /// Query/reason rows (`fieldref != 0`) and raster/study/key metadata
    /// (field positions 3..=7) are skipped outright. Every configuration
    /// record whose covered plate, visit scope and ignore list admit the
    /// event is applied in declaration order.
    pub fn apply(&mut self, rec: &AuditRecord, txn_id: TransactionId) -> Vec<Effect> {
        let mut effects = Vec::new();

        if rec.field_ref() != 0 {
            return effects;
        }

        let field = rec.field_pos();
        if field.as_i32() > 2 && field.as_i32() <= 7 {
            return effects;
        }

        let rec_status = rec.status();
        let patient = rec.patient();
        let visit = rec.visit();
        let plate = rec.plate();

        for config in &self.configs {
            if config.plate != plate
                || !config.visits.contains(visit.as_i64())
                || config.ignore_fields.contains(field.as_i64())
            {
                continue;
            }

            let key = NodeKey::new(patient, visit, config);
            let node = self
                .nodes
                .entry(key)
                .or_insert_with(|| SigNode::new(patient, visit, Arc::clone(config)));

            // The signature plate itself has now been observed.
            if plate == config.sig_plate && rec_status != 0 {
                node.sig_rec_seen = true;
            }

            if plate == config.sig_plate && config.sig_fields.contains(field.as_i64()) {
                // A filled-in signature field signs; a cleared one unsigns.
                if !rec.new_value().is_empty() {
                    node.sign(rec, field, txn_id);
                    if node.txn_id == txn_id {
                        effects.push(Effect::record_signing(node));
                    }
                    node.release_signed_values(txn_id);
                } else {
                    node.unsign(field);
                }
            } else {
                node.data_change(rec, plate, field, txn_id, &self.exclusions);

                // Changes inside the signing transaction keep the stored
                // signature data current.
                if node.txn_id == txn_id {
                    effects.push(Effect::UpsertDataValue(ValueRow {
                        txn_id: node.txn_id,
                        sig_id: node.config.serial,
                        plate,
                        field,
                        desc: Some(rec.field_desc().to_string()),
                        value: Some(rec.decoded_new()),
                    }));
                }
            }
        }

        effects
    }
}
