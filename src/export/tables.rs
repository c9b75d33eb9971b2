//! CSV tables: relationships, owners, entities and the adjacency matrix.

use std::io::Write;

use crate::error::Result;
use crate::model::{Entity, Relationship};
use crate::network::AdjacencyMatrix;

pub const RELATIONSHIP_HEADER: [&str; 5] = ["source_id", "target_id", "type", "percentage", "description"];
pub const ENTITY_HEADER: [&str; 6] = ["id", "name", "type", "description", "image_url", "media_type"];

// Headers are written by hand so an empty table still gets one.
fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(out)
}

/// One row per relationship, in store order.
pub fn write_relationships<W: Write>(out: W, relationships: &[Relationship]) -> Result<()> {
    let mut writer = csv_writer(out);
    writer.write_record(RELATIONSHIP_HEADER)?;
    for relationship in relationships {
        writer.serialize(relationship)?;
    }
    writer.flush()?;
    Ok(())
}

/// Owner and entity tables share the same columns.
pub fn write_entities<'a, W, I>(out: W, entities: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Entity>,
{
    let mut writer = csv_writer(out);
    writer.write_record(ENTITY_HEADER)?;
    for entity in entities {
        writer.serialize(entity)?;
    }
    writer.flush()?;
    Ok(())
}

/// Square matrix with an empty corner cell; absent edges are written as `0.0`.
pub fn write_adjacency<W: Write>(out: W, matrix: &AdjacencyMatrix) -> Result<()> {
    let mut writer = csv_writer(out);

    let mut header = Vec::with_capacity(matrix.len() + 1);
    header.push("");
    header.extend(matrix.ids.iter().map(String::as_str));
    writer.write_record(&header)?;

    for (id, row) in matrix.ids.iter().zip(&matrix.cells) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(id.clone());
        record.extend(row.iter().map(|cell| format_cell(cell.unwrap_or(0.0))));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Shortest round-trip form, always with a fractional part (`60.0`, `30.5`).
pub(crate) fn format_cell(value: f64) -> String {
    format!("{:?}", value)
}
