//! Priority-file emission.
//!
//! Flattens the parsed configuration to a `plate|field|level` listing:
//! level 1 for every ignored field, level 3 for every signature field on
//! its own plate.

use std::io::{self, Write};

use crate::SignatureConfig;

/// Writes the priority listing for `configs` in declaration order.
pub fn write_priority<W: Write>(mut w: W, configs: &[SignatureConfig]) -> io::Result<()> {
    for config in configs {
        for field in config.ignore_fields.values() {
            writeln!(w, "{}|{}|1", config.plate, field)?;
        }
        if config.sig_plate == config.plate {
            for field in config.sig_fields.values() {
                writeln!(w, "{}|{}|3", config.plate, field)?;
            }
        }
    }
    Ok(())
}
