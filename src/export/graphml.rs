//! Directed GraphML with node and edge attributes.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use super::tables::format_cell;
use crate::error::{OwnergraphError, Result};
use crate::graph::RelationGraph;

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

/// `(id, for, attr.name, attr.type)`
const KEYS: [(&str, &str, &str, &str); 8] = [
    ("d0", "node", "name", "string"),
    ("d1", "node", "type", "string"),
    ("d2", "node", "description", "string"),
    ("d3", "node", "image_url", "string"),
    ("d4", "node", "media_type", "string"),
    ("d5", "edge", "type", "string"),
    ("d6", "edge", "percentage", "double"),
    ("d7", "edge", "description", "string"),
];

fn xml_error<E: std::fmt::Display>(e: E) -> OwnergraphError {
    OwnergraphError::Export(format!("GraphML write failed: {}", e))
}

/// Write every node (sorted by id) and every typed edge of `graph`.
pub fn write_graphml<W: Write>(out: W, graph: &RelationGraph) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("graphml").with_attributes([("xmlns", GRAPHML_NS)])),
    )?;

    for (id, domain, name, ty) in KEYS {
        emit(
            &mut writer,
            Event::Empty(BytesStart::new("key").with_attributes([
                ("id", id),
                ("for", domain),
                ("attr.name", name),
                ("attr.type", ty),
            ])),
        )?;
    }

    emit(
        &mut writer,
        Event::Start(
            BytesStart::new("graph").with_attributes([("id", "G"), ("edgedefault", "directed")]),
        ),
    )?;

    for id in graph.node_ids() {
        let Some(entity) = graph.node(&id) else {
            continue;
        };
        emit(
            &mut writer,
            Event::Start(BytesStart::new("node").with_attributes([("id", id.as_str())])),
        )?;
        data(&mut writer, "d0", &entity.name)?;
        data(&mut writer, "d1", entity.kind.as_str())?;
        for (key, value) in [
            ("d2", &entity.description),
            ("d3", &entity.image_url),
            ("d4", &entity.media_type),
        ] {
            if let Some(value) = value {
                data(&mut writer, key, value)?;
            }
        }
        emit(&mut writer, Event::End(BytesEnd::new("node")))?;
    }

    for (source, target, attrs) in graph.edges() {
        emit(
            &mut writer,
            Event::Start(
                BytesStart::new("edge").with_attributes([("source", source), ("target", target)]),
            ),
        )?;
        data(&mut writer, "d5", attrs.relation_type.as_str())?;
        data(&mut writer, "d6", &format_cell(attrs.percentage))?;
        data(&mut writer, "d7", &attrs.description)?;
        emit(&mut writer, Event::End(BytesEnd::new("edge")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("graph")))?;
    emit(&mut writer, Event::End(BytesEnd::new("graphml")))?;

    let mut out = writer.into_inner();
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(xml_error)
}

fn data<W: Write>(writer: &mut Writer<W>, key: &str, value: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("data").with_attributes([("key", key)])))?;
    emit(writer, Event::Text(BytesText::new(value)))?;
    emit(writer, Event::End(BytesEnd::new("data")))
}
