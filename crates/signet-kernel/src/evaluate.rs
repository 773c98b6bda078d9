//! The status propagation pass.
//!
//! After the audit stream is exhausted, a single walk over the forest
//! lifts per-field change statuses up to each covered plate and from
//! there to the obligation, under the lattice ordering of
//! [`ChangeStatus`]. Two policies tune the pass: exempting the signer's
//! own edits, and deferring re-signature until a record is final.

use std::collections::BTreeMap;

use signet_types::ChangeStatus;

use crate::engine::Engine;
use crate::node::{NodeKey, SIGNER_COMMENT, SigNode};

/// Tunable propagation policies, both off by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluatePolicies {
    /// Accept edits whose author is the obligation's signer.
    pub allow_signer_changes: bool,
    /// Demote `Declined` to `DeclinedAtFinal` on plates not yet final.
    pub resign_at_final: bool,
}

impl Engine {
    /// Runs the propagation pass over the whole forest.
    ///
    /// Plate-level change status deliberately survives from event
    /// processing (it is not reset here), so the pass is meant to run
    /// exactly once per run.
    pub fn evaluate(&mut self, policies: EvaluatePolicies) {
        evaluate(self.forest_mut(), policies);
    }
}

/// The pass itself, exposed for direct forest manipulation in tests.
pub fn evaluate(nodes: &mut BTreeMap<NodeKey, SigNode>, policies: EvaluatePolicies) {
    for node in nodes.values_mut() {
        node.status.change = ChangeStatus::None;

        let sig_status = node.status.signature;
        let sig_plate = node.config.sig_plate;
        let signer = node.signer.clone();
        let mut node_record = node.status.record;
        let mut node_change = ChangeStatus::None;

        for cp in node.plates.values_mut() {
            cp.status.signature = sig_status;
            cp.field_change_count = 0;

            for fc in cp.changes.values_mut() {
                cp.field_change_count += 1;

                // Defer re-signature on records that are not yet final.
                if policies.resign_at_final
                    && !cp.is_final
                    && fc.status.change == ChangeStatus::Declined
                {
                    fc.status.change = ChangeStatus::DeclinedAtFinal;
                }

                fc.status.record = cp.status.record;
                fc.status.signature = cp.status.signature;

                // The signer's own edits do not require re-signing.
                if policies.allow_signer_changes {
                    if let Some(signer) = &signer {
                        if fc.who == *signer {
                            fc.comment = Some(SIGNER_COMMENT.to_string());
                            fc.status.change = ChangeStatus::Accepted;
                        }
                    }
                }

                cp.status.change = cp.status.change.max(fc.status.change);
            }

            // The signature plate's record state is the obligation's.
            if sig_plate == cp.plate {
                node_record = cp.status.record;
            }

            node_change = node_change.max(cp.status.change);
        }

        node.status.record = node_record;
        node.status.change = node_change;
    }
}
