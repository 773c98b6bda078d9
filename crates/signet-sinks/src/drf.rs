//! Data Resolution File output.

use std::io::{self, Write};

use signet_kernel::SigNode;

/// Writes `patient|visit|plate` for every obligation that must be
/// revisited: an invalidated signature, or a standing signature on a
/// normal record with declined changes.
pub fn write_drf<'a, W, I>(mut w: W, nodes: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a SigNode>,
{
    for node in nodes {
        if node.requires_resign() {
            writeln!(
                w,
                "{}|{}|{}",
                node.patient, node.visit, node.config.sig_plate
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use signet_audit::{AuditRecord, TransactionGrouper};
    use signet_config::parse;
    use signet_kernel::{Engine, EvaluatePolicies};
    use signet_study::ExclusionTable;

    use super::*;

    fn line(cols: &[(usize, &str)]) -> AuditRecord {
        let mut fields = vec![String::new(); 20];
        for &(pos, value) in cols {
            fields[pos] = value.to_string();
        }
        AuditRecord::parse(&fields.join("|"), '|')
    }

    fn drf_for(events: Vec<AuditRecord>) -> String {
        let outcome = parse(r#"signature "A" plate 10 visit * fields 8 { plate 10; plate 11; }"#);
        let mut engine = Engine::new(outcome.configs, ExclusionTable::new());
        let mut grouper = TransactionGrouper::new();
        for rec in &events {
            let txn_id = grouper.assign(rec);
            engine.apply(rec, txn_id);
        }
        engine.evaluate(EvaluatePolicies::default());

        let mut buffer = Vec::new();
        write_drf(&mut buffer, engine.nodes()).expect("write to memory");
        String::from_utf8(buffer).expect("utf8")
    }

    fn sign_event(date: &str) -> AuditRecord {
        line(&[
            (1, date),
            (2, "130000"),
            (3, "u1"),
            (4, "1001"),
            (5, "1"),
            (6, "10"),
            (7, "0"),
            (9, "2"),
            (15, "u1"),
            (16, "8"),
        ])
    }

    fn change_event(date: &str, old: &str, new: &str) -> AuditRecord {
        line(&[
            (1, date),
            (2, "120000"),
            (3, "u2"),
            (4, "1001"),
            (5, "1"),
            (6, "11"),
            (7, "0"),
            (9, "2"),
            (14, old),
            (15, new),
            (16, "12"),
        ])
    }

    #[test]
    fn clean_signatures_stay_out() {
        let drf = drf_for(vec![change_event("20250101", "", "42"), sign_event("20250102")]);
        assert_eq!(drf, "");
    }

    #[test]
    fn declined_changes_enter() {
        let drf = drf_for(vec![
            sign_event("20250101"),
            change_event("20250102", "42", "55"),
        ]);
        assert_eq!(drf, "1001|1|10\n");
    }

    #[test]
    fn invalidated_signatures_enter_unconditionally() {
        let unsign = line(&[
            (1, "20250103"),
            (2, "140000"),
            (3, "u1"),
            (4, "1001"),
            (5, "1"),
            (6, "10"),
            (7, "0"),
            (9, "2"),
            (14, "u1"),
            (15, ""),
            (16, "8"),
        ]);
        let drf = drf_for(vec![sign_event("20250101"), unsign]);
        assert_eq!(drf, "1001|1|10\n");
    }

    #[test]
    fn never_signed_obligations_stay_out() {
        let drf = drf_for(vec![change_event("20250101", "", "42")]);
        assert_eq!(drf, "");
    }
}
