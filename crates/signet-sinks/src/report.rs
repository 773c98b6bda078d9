//! The report row model.
//!
//! A pure function from the evaluated forest plus site lookups to rows
//! and styles. Each obligation renders as one block: node-level cells
//! (region through signing date) span every row of the block, the plate
//! cell spans that plate's rows, and each tracked change contributes one
//! detail row. The spreadsheet renderer consumes blocks verbatim; the
//! delimited writer here flattens the spans.

use std::io::{self, Write};

use signet_kernel::{SigNode, StatusVocabulary};
use signet_study::{Centers, Countries};
use signet_types::{
    ChangeStatus, Field, Patient, Plate, RecordStatus, SignatureStatus, Status, Visit,
};

/// Cell background classes used by the spreadsheet renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellColor {
    White,
    LightRed,
    LightGreen,
    LightPurple,
    LightYellow,
    Red,
    LightOrange,
}

/// Maps a status triple to its display colour.
pub fn cell_color(status: &Status) -> CellColor {
    use ChangeStatus as C;
    use RecordStatus as R;
    use SignatureStatus as S;

    match (status.signature, status.record) {
        (S::None, R::Normal) => CellColor::LightYellow,
        (S::Invalidated, R::Normal) => CellColor::LightRed,
        (S::Complete, R::Normal) => match status.change {
            C::None | C::Accepted => CellColor::LightGreen,
            C::DeclinedAtFinal => CellColor::LightOrange,
            C::Declined => CellColor::LightRed,
        },
        (_, R::Error) => CellColor::LightPurple,
        (_, R::Lost) => CellColor::White,
        (_, R::Deleted) => CellColor::Red,
    }
}

/// Report shaping options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Omit obligations whose signature plate was never observed.
    pub arrived_only: bool,
    /// Which vocabulary the status column renders in.
    pub vocabulary: StatusVocabulary,
}

/// One detail row: a tracked field change, a record-state line, or the
/// single blank row of a block with no details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub plate: Option<Plate>,
    pub plate_color: CellColor,
    /// Rows this plate cell spans; non-zero on the first row of a plate
    /// group only.
    pub plate_span: usize,
    pub field: Option<Field>,
    pub color: CellColor,
    pub desc: String,
    pub signed_value: String,
    pub current_value: String,
    pub changed_by: String,
    pub changed_at: String,
    pub comment: String,
}

impl DetailRow {
    fn blank(color: CellColor) -> Self {
        Self {
            plate: None,
            plate_color: color,
            plate_span: 0,
            field: None,
            color,
            desc: String::new(),
            signed_value: String::new(),
            current_value: String::new(),
            changed_by: String::new(),
            changed_at: String::new(),
            comment: String::new(),
        }
    }
}

/// One obligation's rows. The node-level cells span `details.len()` rows.
#[derive(Debug, Clone)]
pub struct ReportBlock {
    pub region: String,
    pub country: String,
    pub center: u32,
    pub patient: Patient,
    pub visit: Visit,
    pub sig_plate: Plate,
    pub sig_desc: String,
    pub status_label: &'static str,
    pub signer: String,
    pub signed_at: String,
    pub color: CellColor,
    pub details: Vec<DetailRow>,
}

/// Builds report blocks from the evaluated forest, in forest order.
pub fn build_report<'a, I>(
    nodes: I,
    centers: &Centers,
    countries: &Countries,
    options: ReportOptions,
) -> Vec<ReportBlock>
where
    I: IntoIterator<Item = &'a SigNode>,
{
    let mut blocks = Vec::new();

    for node in nodes {
        if options.arrived_only && !node.sig_rec_seen {
            continue;
        }

        let sig_color = cell_color(&node.status);
        let mut details = Vec::new();

        for cp in node.plates.values() {
            let plate_color = cell_color(&cp.status);
            let first_row = details.len();
            let mut plate_rows = 0;

            // A non-normal plate with no surviving changes still warrants
            // a line of its own.
            if cp.changes.is_empty()
                && cp.status.record != RecordStatus::Normal
                && cp.status.change == ChangeStatus::Declined
            {
                details.push(DetailRow {
                    plate: Some(cp.plate),
                    plate_color,
                    plate_span: 0,
                    field: None,
                    color: plate_color,
                    comment: record_state_comment(cp.status.record)
                        .unwrap_or_default()
                        .to_string(),
                    ..DetailRow::blank(plate_color)
                });
                plate_rows += 1;
            }

            // Field changes only appear once the record was ever signed.
            if node.status.signature != SignatureStatus::None {
                for fc in cp.changes.values() {
                    let comment = record_state_comment(cp.status.record)
                        .or(fc.comment.as_deref())
                        .unwrap_or("");
                    details.push(DetailRow {
                        plate: Some(cp.plate),
                        plate_color,
                        plate_span: 0,
                        field: Some(fc.field),
                        color: cell_color(&fc.status),
                        desc: fc.desc.clone(),
                        signed_value: fc.old_value.clone(),
                        current_value: fc.new_value.clone(),
                        changed_by: fc.who.clone(),
                        changed_at: format_timestamp(&fc.date, &fc.time),
                        comment: comment.to_string(),
                    });
                    plate_rows += 1;
                }
            }

            if plate_rows > 0 {
                details[first_row].plate_span = plate_rows;
            }
        }

        if details.is_empty() {
            details.push(DetailRow::blank(sig_color));
        }

        let center = centers.find(node.patient);
        let signed_at = match (&node.date, &node.time) {
            (Some(date), Some(time)) => format_timestamp(date, time),
            _ => String::new(),
        };

        blocks.push(ReportBlock {
            region: countries.region_of(center).to_string(),
            country: countries.country_of(center).to_string(),
            center,
            patient: node.patient,
            visit: node.visit,
            sig_plate: node.config.sig_plate,
            sig_desc: node.config.name.clone(),
            status_label: node.state_label(options.vocabulary),
            signer: node.signer.clone().unwrap_or_default(),
            signed_at,
            color: sig_color,
            details,
        });
    }

    blocks
}

fn record_state_comment(record: RecordStatus) -> Option<&'static str> {
    match record {
        RecordStatus::Normal => None,
        RecordStatus::Lost => Some("Record marked Lost"),
        RecordStatus::Error => Some("Record marked in Error"),
        RecordStatus::Deleted => Some("Record Deleted"),
    }
}

/// `YYYY/MM/DD HH:MM:SS` from the raw 8-digit date and 6-digit time;
/// short inputs render what they have.
fn format_timestamp(date: &str, time: &str) -> String {
    fn seg(s: &str, start: usize, len: usize) -> &str {
        let end = (start + len).min(s.len());
        s.get(start..end).unwrap_or("")
    }
    format!(
        "{}/{}/{} {}:{}:{}",
        seg(date, 0, 4),
        seg(date, 4, 2),
        seg(date, 6, 2),
        seg(time, 0, 2),
        seg(time, 2, 2),
        seg(time, 4, 2),
    )
}

const HEADER: [&str; 18] = [
    "Region",
    "Country",
    "Center",
    "Patient ID",
    "Visit",
    "Sig. Plate",
    "Sig. Desc",
    "Status",
    "Signer",
    "Signed",
    "Plate",
    "Field",
    "Description",
    "Signed Value",
    "Current Value",
    "Last Changer",
    "Last Changed",
    "Comment",
];

const SDV_HEADER: [&str; 18] = [
    "Region",
    "Country",
    "Center",
    "Patient ID",
    "Visit",
    "SDV Plate",
    "SDV Desc",
    "Status",
    "SDV By",
    "SDV Date",
    "Plate",
    "Field",
    "Description",
    "SDV Value",
    "Current Value",
    "Last Changer",
    "Last Changed",
    "Comment",
];

/// Writes the blocks as `|`-delimited rows, repeating the spanned cells.
pub fn write_report<W: Write>(
    mut w: W,
    blocks: &[ReportBlock],
    vocabulary: StatusVocabulary,
) -> io::Result<()> {
    let header = match vocabulary {
        StatusVocabulary::Signature => &HEADER,
        StatusVocabulary::Sdv => &SDV_HEADER,
    };
    writeln!(w, "{}", header.join("|"))?;

    for block in blocks {
        for row in &block.details {
            writeln!(
                w,
                "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
                block.region,
                block.country,
                block.center,
                block.patient,
                block.visit,
                block.sig_plate,
                block.sig_desc,
                block.status_label,
                block.signer,
                block.signed_at,
                row.plate.map(|p| p.to_string()).unwrap_or_default(),
                row.field.map(|f| f.to_string()).unwrap_or_default(),
                row.desc,
                row.signed_value,
                row.current_value,
                row.changed_by,
                row.changed_at,
                row.comment,
            )?;
        }
    }
    Ok(())
}
