//! Table writers.

use std::io::Write;

use anyhow::Result;
use serde::ser::{Serialize, SerializeMap, Serializer};

use bazi_config::OutputFormat;
use bazi_engine::{Cell, EnrichmentTable};

pub fn write_table(
    table: &EnrichmentTable,
    format: OutputFormat,
    encode_life_cycle: bool,
    out: impl Write,
) -> Result<()> {
    match format {
        OutputFormat::Jsonl => write_jsonl(table, encode_life_cycle, out),
        OutputFormat::Csv => write_csv(table, encode_life_cycle, out),
    }
}

/// A row as a JSON object whose keys follow the column order.
struct OrderedRow<'a> {
    columns: &'a [String],
    cells: Vec<Cell>,
}

impl Serialize for OrderedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(&self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

/// One JSON object per row, keys in column order.
fn write_jsonl(table: &EnrichmentTable, encode_life_cycle: bool, mut out: impl Write) -> Result<()> {
    let columns = table.columns(encode_life_cycle);
    for row in table.rows() {
        let object = OrderedRow {
            columns: &columns,
            cells: table.cells(row, encode_life_cycle),
        };
        serde_json::to_writer(&mut out, &object)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn write_csv(table: &EnrichmentTable, encode_life_cycle: bool, out: impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(table.columns(encode_life_cycle))?;
    for row in table.rows() {
        writer.write_record(
            table
                .cells(row, encode_life_cycle)
                .iter()
                .map(Cell::render),
        )?;
    }
    writer.flush()?;
    Ok(())
}
