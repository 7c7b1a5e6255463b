// src/storage/mod.rs
use anyhow::Context;
use rust_decimal::Decimal;
use std::fs::OpenOptions;
use std::path::Path;

/// Appends one `(date, krw_total)` row to the valuation record, creating the
/// file with its header on first write. Totals are recorded as whole KRW.
pub fn append_valuation(path: &Path, date_str: &str, total: Decimal) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open valuation record {}", path.display()))?;
    // An empty pre-existing file still needs the header.
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = csv::Writer::from_writer(file);
    if needs_header {
        writer.write_record(["date", "krw_total"])?;
    }
    writer.write_record([date_str, &total.trunc().to_string()])?;
    writer.flush()?;
    Ok(())
}
