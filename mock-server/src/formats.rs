//! Translation file formats the emulator can export and import.
//!
//! Only `po`, `json` and `key_value_json` are understood. That covers an
//! export/re-import round trip; other formats are rejected.

use serde_json::{Map, Value};

/// One term of a translation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub term: String,
    pub context: String,
    /// `None` when the file holds no translation for the term.
    pub translation: Option<String>,
}

impl Entry {
    pub fn new(term: &str, context: &str, translation: Option<&str>) -> Self {
        Self {
            term: term.to_string(),
            context: context.to_string(),
            translation: translation.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }
}

pub const SUPPORTED: [&str; 3] = ["po", "json", "key_value_json"];

/// Render entries in `file_type`. `None` for unsupported formats.
pub fn render(file_type: &str, language: &str, entries: &[Entry]) -> Option<Vec<u8>> {
    let text = match file_type {
        "po" => render_po(language, entries),
        "json" => render_json(entries),
        "key_value_json" => render_key_value_json(entries),
        _ => return None,
    };
    Some(text.into_bytes())
}

/// Parse an uploaded file. The format is taken from the file extension,
/// falling back to sniffing the content.
pub fn parse(file_name: &str, content: &[u8]) -> Result<Vec<Entry>, String> {
    let text = std::str::from_utf8(content).map_err(|_| "file is not valid UTF-8".to_string())?;
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("po") | Some("pot") => parse_po(text),
        Some("json") => parse_any_json(text),
        _ if text.trim_start().starts_with(['{', '[']) => parse_any_json(text),
        _ => parse_po(text),
    }
}

fn render_po(language: &str, entries: &[Entry]) -> String {
    let mut out = String::new();
    out.push_str("msgid \"\"\nmsgstr \"\"\n");
    out.push_str("\"Content-Type: text/plain; charset=UTF-8\\n\"\n");
    out.push_str(&format!("\"Language: {}\\n\"\n", escape(language)));
    for entry in entries {
        out.push('\n');
        if !entry.context.is_empty() {
            out.push_str(&format!("msgctxt \"{}\"\n", escape(&entry.context)));
        }
        out.push_str(&format!("msgid \"{}\"\n", escape(&entry.term)));
        out.push_str(&format!(
            "msgstr \"{}\"\n",
            escape(entry.translation.as_deref().unwrap_or(""))
        ));
    }
    out
}

fn render_json(entries: &[Entry]) -> String {
    let items: Vec<Value> = entries
        .iter()
        .map(|entry| {
            serde_json::json!({
                "term": entry.term,
                "context": entry.context,
                "definition": entry.translation.as_deref().unwrap_or(""),
            })
        })
        .collect();
    Value::Array(items).to_string()
}

/// Terms without context sit at the top level; the others are grouped in
/// an object per context.
fn render_key_value_json(entries: &[Entry]) -> String {
    let mut root = Map::new();
    for entry in entries {
        let value = Value::String(entry.translation.clone().unwrap_or_default());
        if entry.context.is_empty() {
            root.insert(entry.term.clone(), value);
        } else {
            let group = root
                .entry(entry.context.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(group) = group {
                group.insert(entry.term.clone(), value);
            }
        }
    }
    Value::Object(root).to_string()
}

fn parse_any_json(text: &str) -> Result<Vec<Entry>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| -> Result<Entry, String> {
                let term = item
                    .get("term")
                    .and_then(Value::as_str)
                    .ok_or("json entry without \"term\"")?;
                let context = item.get("context").and_then(Value::as_str).unwrap_or("");
                let definition = item.get("definition").and_then(Value::as_str);
                Ok(Entry::new(term, context, definition))
            })
            .collect(),
        Value::Object(root) => {
            let mut entries = Vec::new();
            for (key, value) in &root {
                match value {
                    Value::String(text) => entries.push(Entry::new(key, "", Some(text))),
                    Value::Object(group) => {
                        for (term, text) in group {
                            entries.push(Entry::new(term, key, text.as_str()));
                        }
                    }
                    _ => return Err(format!("unexpected value for {key:?}")),
                }
            }
            Ok(entries)
        }
        _ => Err("expected a JSON array or object".to_string()),
    }
}

#[derive(Clone, Copy)]
enum PoField {
    Context,
    Id,
    Str,
    Ignored,
}

#[derive(Default)]
struct PoEntry {
    context: Option<String>,
    id: Option<String>,
    translation: Option<String>,
}

impl PoEntry {
    fn flush(&mut self, entries: &mut Vec<Entry>) {
        let entry = std::mem::take(self);
        if let Some(id) = entry.id.filter(|id| !id.is_empty()) {
            entries.push(Entry::new(
                &id,
                entry.context.as_deref().unwrap_or(""),
                entry.translation.as_deref(),
            ));
        }
    }
}

fn parse_po(text: &str) -> Result<Vec<Entry>, String> {
    let mut entries = Vec::new();
    let mut current = PoEntry::default();
    let mut field: Option<PoField> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (keyword, rest) = if line.starts_with('"') {
            (None, line)
        } else {
            let (keyword, rest) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| format!("line {}: missing value", index + 1))?;
            (Some(keyword), rest.trim())
        };
        let value = unquote(rest).ok_or_else(|| format!("line {}: expected a quoted string", index + 1))?;

        let target = match keyword {
            None => field.ok_or_else(|| format!("line {}: continuation without keyword", index + 1))?,
            Some("msgctxt") => {
                if current.id.is_some() {
                    current.flush(&mut entries);
                }
                PoField::Context
            }
            Some("msgid") => {
                if current.id.is_some() {
                    current.flush(&mut entries);
                }
                PoField::Id
            }
            Some("msgstr") | Some("msgstr[0]") => PoField::Str,
            Some(keyword) if keyword == "msgid_plural" || keyword.starts_with("msgstr[") => PoField::Ignored,
            Some(other) => return Err(format!("line {}: unknown keyword {other:?}", index + 1)),
        };
        let slot = match target {
            PoField::Context => &mut current.context,
            PoField::Id => &mut current.id,
            PoField::Str => &mut current.translation,
            PoField::Ignored => {
                field = Some(PoField::Ignored);
                continue;
            }
        };
        slot.get_or_insert_with(String::new).push_str(&value);
        field = Some(target);
    }
    current.flush(&mut entries);
    Ok(entries)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            other => out.push(other),
        }
    }
    Some(out)
}
