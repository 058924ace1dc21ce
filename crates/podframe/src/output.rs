use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use podframe_buffer::{BlockHeader, Field, SerializationBuffer};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlockReport {
    pub id: String,
    pub anonymous: bool,
    pub offset: usize,
    pub body_len: usize,
    pub fields: Vec<String>,
}

impl BlockReport {
    pub fn new(header: &BlockHeader, fields: &[Field]) -> Self {
        Self {
            id: header.id_lossy().into_owned(),
            anonymous: header.is_anonymous(),
            offset: header.offset,
            body_len: header.body_len,
            fields: fields.iter().map(render_field).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BufferReport {
    pub schema_id: &'static str,
    pub header_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_capacity: Option<usize>,
    pub capacity: usize,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded: Option<String>,
    pub blocks: Vec<BlockReport>,
}

impl BufferReport {
    pub fn new(schema_id: &'static str, buffer: &SerializationBuffer) -> Self {
        Self {
            schema_id,
            header_mode: buffer.header_mode().to_string(),
            initial_capacity: None,
            capacity: buffer.capacity(),
            length: buffer.len(),
            encoded: None,
            blocks: Vec::new(),
        }
    }
}

pub fn print_report(report: &BufferReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            println!(
                "mode={} capacity={} length={} blocks={}",
                report.header_mode,
                report.capacity,
                report.length,
                report.blocks.len()
            );
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "OFFSET", "BODY", "FIELDS"]);
            for block in &report.blocks {
                table.add_row(vec![
                    display_id(block),
                    block.offset.to_string(),
                    block.body_len.to_string(),
                    block.fields.join(", "),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "mode={} capacity={} length={}",
                report.header_mode, report.capacity, report.length
            );
            for block in &report.blocks {
                println!(
                    "block id={} offset={} body={} fields=[{}]",
                    display_id(block),
                    block.offset,
                    block.body_len,
                    block.fields.join(", ")
                );
            }
        }
    }
}

/// Text form of a field for reports; printable one-byte values are shown
/// as characters.
pub fn render_field(field: &Field) -> String {
    match field {
        Field::U8(b) if b.is_ascii_graphic() => format!("'{}'", *b as char),
        other => other.to_string(),
    }
}

fn display_id(block: &BlockReport) -> String {
    if block.anonymous {
        "<none>".to_string()
    } else {
        block.id.clone()
    }
}
