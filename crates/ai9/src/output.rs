use std::io::{self, IsTerminal, Write};

use ai9_frame::{hex, Message};
use ai9_record::RecordMeta;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    opcode: &'static str,
    value: u8,
    body_size: usize,
    body: String,
    text: Option<&'a str>,
}

impl<'a> MessageOutput<'a> {
    fn new(message: &'a Message) -> Self {
        Self {
            opcode: message.opcode.name(),
            value: message.opcode.as_u8(),
            body_size: message.body.len(),
            body: hex::encode(&message.body),
            text: printable(&message.body),
        }
    }
}

pub fn print_messages(messages: &[Message], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            for message in messages {
                print_json(&MessageOutput::new(message));
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["OPCODE", "VALUE", "SIZE", "BODY"]);
            for message in messages {
                table.add_row(vec![
                    message.opcode.name().to_string(),
                    format!("{:#04x}", message.opcode.as_u8()),
                    message.body.len().to_string(),
                    body_preview(&message.body),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for message in messages {
                println!(
                    "opcode={} ({:#04x}) size={} body={}",
                    message.opcode,
                    message.opcode.as_u8(),
                    message.body.len(),
                    body_preview(&message.body)
                );
            }
        }
        OutputFormat::Raw => {
            for message in messages {
                print_raw(&message.body)?;
            }
        }
    }
    Ok(())
}

pub fn print_meta(meta: &RecordMeta, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => print_json(meta),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (field, value) in meta_rows(meta) {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (field, value) in meta_rows(meta) {
                println!("{field}={value}");
            }
        }
        OutputFormat::Raw => return print_raw(&meta.pack()),
    }
    Ok(())
}

/// Print a flat list of key/value facts.
pub fn print_facts<T: Serialize>(facts: &T, rows: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(facts),
        OutputFormat::Table => {
            let mut table = new_table(vec!["KEY", "VALUE"]);
            for (key, value) in rows {
                table.add_row(vec![key.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for (key, value) in rows {
                println!("{key}={value}");
            }
        }
    }
}

pub fn print_raw(data: &[u8]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(data)?;
    out.flush()
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn meta_rows(meta: &RecordMeta) -> Vec<(&'static str, String)> {
    vec![
        ("datetime", meta.datetime.to_string()),
        ("failure", meta.failure.to_string()),
        ("loss", format!("{:.2} dB", f32::from(meta.loss) * 0.01)),
        ("angles", format!("{:?}", meta.angles)),
        ("face_quality", meta.face_quality.to_string()),
        ("coordinates", format!("{:?}", meta.coordinates)),
        ("settings", hex::encode(&meta.settings.pack())),
        ("face_detection", meta.face_detection.to_string()),
        ("angle_detection", meta.angle_detection.to_string()),
        ("autofocus", meta.autofocus.to_string()),
        ("admin", hex::encode(&meta.admin.pack())),
        ("charge", meta.charge.to_string()),
        ("image_len", meta.image_len.to_string()),
        ("image_handle", meta.image_handle.to_string()),
    ]
}

fn printable(body: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(body).ok()?;
    let trimmed = text.trim_end_matches('\0');
    (!trimmed.is_empty() && trimmed.chars().all(|c| !c.is_control())).then_some(trimmed)
}

fn body_preview(body: &[u8]) -> String {
    match printable(body) {
        Some(text) => format!("{} \"{text}\"", hex::encode(body)),
        None => hex::encode(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_only_for_text() {
        assert_eq!(printable(b"AI9-01\0\0"), Some("AI9-01"));
        assert_eq!(printable(&[0x66]), None);
        assert_eq!(printable(&[]), None);
    }

    #[test]
    fn preview_includes_hex() {
        assert_eq!(body_preview(&[0x66]), "66");
        assert_eq!(body_preview(b"ok"), "6f6b \"ok\"");
    }
}
