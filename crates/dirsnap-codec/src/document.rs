//! Snapshot document encoding and decoding.

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use dirsnap_core::{
    Entry, EntryKind, FileContent, Result, Snapshot, SnapshotError, Summary, validate_name,
};

/// Wire discriminator for directories.
pub const TYPE_DIRECTORY: &str = "directory";
/// Wire discriminator for UTF-8 text files.
pub const TYPE_FILE: &str = "file";
/// Wire discriminator for files stored as base64.
pub const TYPE_FILE_BINARY: &str = "file-binary";

/// Output layout of an encoded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Two-space indented JSON.
    #[default]
    Pretty,
    /// Single-line JSON.
    Compact,
}

impl Format {
    /// Pick a format from a `pretty` flag.
    pub fn from_pretty(pretty: bool) -> Self {
        if pretty { Format::Pretty } else { Format::Compact }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireNode<'a> {
    name: &'a str,
    full_path: String,
    relative_path: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<WireNode<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Cow<'a, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remark: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a Summary>,
}

impl<'a> WireNode<'a> {
    fn from_entry(entry: &'a Entry, source: &Path) -> Self {
        let full_path = if entry.relative_path.is_empty() {
            source.to_path_buf()
        } else {
            source.join(&entry.relative_path)
        };

        let (kind, children, content) = match &entry.kind {
            EntryKind::Directory { children } => (
                TYPE_DIRECTORY,
                Some(
                    children
                        .iter()
                        .map(|c| WireNode::from_entry(c, source))
                        .collect(),
                ),
                None,
            ),
            EntryKind::File {
                content: FileContent::Text(text),
            } => (TYPE_FILE, None, Some(Cow::Borrowed(text.as_str()))),
            EntryKind::File {
                content: FileContent::Binary(bytes),
            } => (TYPE_FILE_BINARY, None, Some(Cow::Owned(BASE64.encode(bytes)))),
        };

        Self {
            name: entry.name.as_str(),
            full_path: full_path.to_string_lossy().into_owned(),
            relative_path: &entry.relative_path,
            kind,
            children,
            content,
            remark: None,
            summary: None,
        }
    }

    fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        let mut node = WireNode::from_entry(&snapshot.root, &snapshot.source);
        node.remark = Some(&snapshot.remark);
        node.summary = Some(&snapshot.summary);
        node
    }
}

/// Encode a snapshot as a pretty-printed JSON document.
pub fn encode(snapshot: &Snapshot) -> Result<String> {
    encode_with(snapshot, Format::Pretty)
}

/// Encode a snapshot using the given layout.
pub fn encode_with(snapshot: &Snapshot, format: Format) -> Result<String> {
    let node = WireNode::from_snapshot(snapshot);
    let json = match format {
        Format::Pretty => serde_json::to_string_pretty(&node)?,
        Format::Compact => serde_json::to_string(&node)?,
    };
    Ok(json)
}

/// Encode a snapshot straight into a writer.
pub fn encode_to_writer<W: Write>(snapshot: &Snapshot, writer: W, format: Format) -> Result<()> {
    let node = WireNode::from_snapshot(snapshot);
    match format {
        Format::Pretty => serde_json::to_writer_pretty(writer, &node)?,
        Format::Compact => serde_json::to_writer(writer, &node)?,
    }
    Ok(())
}

/// Parse a JSON document into a snapshot.
///
/// Only `name`, `type`, `children` and `content` are needed to rebuild the
/// tree. `fullPath` and `relativePath` are read when present but never
/// required.
pub fn decode(document: &str) -> Result<Snapshot> {
    decode_value(parse(serde_json::Deserializer::from_str(document))?)
}

/// Parse a JSON document from a reader.
pub fn decode_reader<R: Read>(reader: R) -> Result<Snapshot> {
    decode_value(parse(serde_json::Deserializer::from_reader(reader))?)
}

/// Parse a whole document with no nesting limit. Deep trees grow the stack
/// on the heap instead of overflowing it.
fn parse<'de, R: serde_json::de::Read<'de>>(mut de: serde_json::Deserializer<R>) -> Result<Value> {
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))
        .map_err(|e| SnapshotError::malformed("$", e.to_string()))?;
    de.end()
        .map_err(|e| SnapshotError::malformed("$", e.to_string()))?;
    Ok(value)
}

/// Build a snapshot from an already parsed JSON value.
pub fn decode_value(value: Value) -> Result<Snapshot> {
    let Value::Object(mut object) = value else {
        return Err(SnapshotError::malformed("$", "document must be a JSON object"));
    };

    match object.get("type") {
        Some(Value::String(kind)) if kind == TYPE_DIRECTORY => {}
        Some(Value::String(kind)) => {
            return Err(SnapshotError::malformed(
                "$.type",
                format!("root must be a directory, found `{kind}`"),
            ));
        }
        Some(_) => return Err(SnapshotError::malformed("$.type", "expected a string")),
        None => return Err(SnapshotError::malformed("$.type", "missing field")),
    }

    let remark = match object.remove("remark") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(remark)) => remark,
        Some(_) => return Err(SnapshotError::malformed("$.remark", "expected a string")),
    };
    let summary = decode_summary(object.remove("summary"))?;
    let source = object
        .get("fullPath")
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .unwrap_or_default();

    let root = decode_entry(object, "$")?;
    if !summary.matches(&root) {
        warn!(
            files = summary.total_files,
            directories = summary.total_directories,
            "summary counts do not match the document tree"
        );
    }

    Snapshot::new(root, source, remark, summary)
}

fn decode_summary(value: Option<Value>) -> Result<Summary> {
    let object = match value {
        Some(Value::Object(object)) => object,
        Some(_) => return Err(SnapshotError::malformed("$.summary", "expected an object")),
        None => return Err(SnapshotError::malformed("$.summary", "missing field")),
    };

    let count = |key: &str| {
        object.get(key).and_then(Value::as_u64).ok_or_else(|| {
            SnapshotError::malformed(
                format!("$.summary.{key}"),
                "expected a non-negative integer",
            )
        })
    };

    Ok(Summary {
        saved_at: object
            .get("lastSaved")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        total_files: count("totalFiles")?,
        total_directories: count("totalDirectories")?,
    })
}

fn decode_entry(mut object: Map<String, Value>, at: &str) -> Result<Entry> {
    let name = take_string(&mut object, "name", at)?;
    validate_name(&name).map_err(|reason| SnapshotError::malformed(format!("{at}.name"), reason))?;

    let relative_path = match object.remove("relativePath") {
        Some(Value::String(path)) => path,
        _ => String::new(),
    };
    let kind = take_string(&mut object, "type", at)?;

    match kind.as_str() {
        TYPE_DIRECTORY => {
            let items = match object.remove("children") {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(SnapshotError::malformed(
                        format!("{at}.children"),
                        "expected an array",
                    ));
                }
                None => {
                    return Err(SnapshotError::malformed(
                        format!("{at}.children"),
                        "missing field",
                    ));
                }
            };

            let mut entry = Entry::new_directory(name, relative_path);
            let mut seen = HashSet::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let child_at = format!("{at}.children[{index}]");
                let Value::Object(child) = item else {
                    return Err(SnapshotError::malformed(child_at, "expected an object"));
                };
                let child = decode_entry(child, &child_at)?;
                if !seen.insert(child.name.clone()) {
                    return Err(SnapshotError::malformed(
                        format!("{child_at}.name"),
                        format!("duplicate name `{}`", child.name),
                    ));
                }
                entry.push_child(child);
            }
            Ok(entry)
        }
        TYPE_FILE => {
            let text = take_string(&mut object, "content", at)?;
            Ok(Entry::new_file(name, relative_path, FileContent::Text(text)))
        }
        TYPE_FILE_BINARY => {
            let encoded = take_string(&mut object, "content", at)?;
            let bytes = BASE64.decode(encoded.as_bytes()).map_err(|e| {
                SnapshotError::malformed(format!("{at}.content"), format!("invalid base64: {e}"))
            })?;
            Ok(Entry::new_file(name, relative_path, FileContent::Binary(bytes)))
        }
        other => Err(SnapshotError::malformed(
            format!("{at}.type"),
            format!("unknown entry type `{other}`"),
        )),
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str, at: &str) -> Result<String> {
    match object.remove(key) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(SnapshotError::malformed(
            format!("{at}.{key}"),
            "expected a string",
        )),
        None => Err(SnapshotError::malformed(format!("{at}.{key}"), "missing field")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        let root = Entry::new_directory("project", "")
            .with_child(Entry::new_file("a.txt", "a.txt", "hello"))
            .with_child(Entry::new_directory("b", "b").with_child(Entry::new_file(
                "c.txt",
                "b/c.txt",
                "world",
            )));
        let summary = Summary {
            saved_at: "2024-05-01 10:20:30".to_string(),
            total_files: 2,
            total_directories: 1,
        };
        Snapshot::new(root, "/home/me/project", "before refactor", summary).unwrap()
    }

    #[test]
    fn test_encode_shape() {
        let json: Value = serde_json::from_str(&encode(&sample()).unwrap()).unwrap();

        assert_eq!(json["name"], "project");
        assert_eq!(json["type"], "directory");
        assert_eq!(json["relativePath"], "");
        assert_eq!(json["fullPath"], "/home/me/project");
        assert_eq!(json["remark"], "before refactor");
        assert_eq!(json["summary"]["lastSaved"], "2024-05-01 10:20:30");
        assert_eq!(json["summary"]["totalFiles"], 2);
        assert_eq!(json["summary"]["totalDirectories"], 1);

        let a = &json["children"][0];
        assert_eq!(a["type"], "file");
        assert_eq!(a["content"], "hello");
        assert_eq!(a["fullPath"], "/home/me/project/a.txt");
        assert!(a.get("children").is_none());
        assert!(a.get("remark").is_none());
        assert!(a.get("summary").is_none());

        let b = &json["children"][1];
        assert_eq!(b["type"], "directory");
        assert!(b.get("content").is_none());
        assert_eq!(b["children"][0]["relativePath"], "b/c.txt");
    }

    #[test]
    fn test_pretty_uses_two_space_indent() {
        let json = encode(&sample()).unwrap();
        assert!(json.starts_with("{\n  \"name\": \"project\""));
        let compact = encode_with(&sample(), Format::Compact).unwrap();
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_round_trip() {
        let original = sample();
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert!(decoded.root.same_tree(&original.root));
        assert_eq!(decoded.remark, original.remark);
        assert_eq!(decoded.summary, original.summary);
        assert_eq!(decoded.source, original.source);
    }

    #[test]
    fn test_binary_round_trip() {
        let root = Entry::new_directory("r", "").with_child(Entry::new_file(
            "img.png",
            "img.png",
            FileContent::Binary(vec![0x89, b'P', b'N', b'G', 0xff, 0x00]),
        ));
        let snapshot = Snapshot::new(root, "/r", "", Summary::new(1, 0)).unwrap();

        let json = encode(&snapshot).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["children"][0]["type"], "file-binary");
        assert_eq!(value["children"][0]["content"], "iVBOR/8A");

        let decoded = decode(&json).unwrap();
        assert!(decoded.root.same_tree(&snapshot.root));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let doc = r#"{"name":"r","type":"directory","summary":{"totalFiles":0,"totalDirectories":0},
            "children":[{"name":"s","type":"symlink"}]}"#;
        let err = decode(doc).unwrap_err();
        match err {
            SnapshotError::MalformedDocument { location, .. } => {
                assert_eq!(location, "$.children[0].type")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_path_escaping_name_rejected() {
        let doc = r#"{"name":"r","type":"directory","summary":{"totalFiles":1,"totalDirectories":0},
            "children":[{"name":"../evil","type":"file","content":"x"}]}"#;
        let err = decode(doc).unwrap_err();
        assert!(matches!(err, SnapshotError::MalformedDocument { ref location, .. } if location == "$.children[0].name"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let doc = r#"{"name":"r","type":"directory","summary":{"totalFiles":2,"totalDirectories":0},
            "children":[{"name":"a","type":"file","content":"1"},{"name":"a","type":"file","content":"2"}]}"#;
        assert!(matches!(
            decode(doc),
            Err(SnapshotError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_remark_optional() {
        let doc = r#"{"name":"r","type":"directory","children":[],
            "summary":{"totalFiles":0,"totalDirectories":0}}"#;
        let snapshot = decode(doc).unwrap();
        assert_eq!(snapshot.remark, "");
        assert_eq!(snapshot.summary.saved_at, "");
        assert_eq!(snapshot.source, PathBuf::new());
    }

    fn nested(depth: usize) -> Entry {
        let mut entry = Entry::new_file("leaf.txt", "", "bottom");
        for _ in 0..depth {
            entry = Entry::new_directory("d", "").with_child(entry);
        }
        entry
    }

    #[test]
    fn test_deep_tree_decodes() {
        let root = nested(100);
        let summary = Summary::of_tree(&root);
        let snapshot = Snapshot::new(root, "/deep", "", summary).unwrap();

        for format in [Format::Pretty, Format::Compact] {
            let decoded = decode(&encode_with(&snapshot, format).unwrap()).unwrap();
            assert!(decoded.root.same_tree(&snapshot.root));
            assert_eq!(decoded.root.dir_count(), 99);
        }
    }

    #[test]
    fn test_trailing_data_rejected() {
        let doc = r#"{"name":"r","type":"directory","children":[],
            "summary":{"totalFiles":0,"totalDirectories":0}} {}"#;
        assert!(matches!(
            decode(doc),
            Err(SnapshotError::MalformedDocument { ref location, .. }) if location == "$"
        ));
    }
}
