//! Snapshot document codec for dirsnap.
//!
//! A snapshot is persisted as a single JSON object. Every node carries
//! `name`, `fullPath`, `relativePath` and a `type` discriminator, plus
//! `children` for directories or `content` for files. The root object also
//! holds the operator's `remark` and a `summary`:
//!
//! ```json
//! {
//!   "name": "project",
//!   "fullPath": "/home/me/project",
//!   "relativePath": "",
//!   "type": "directory",
//!   "children": [
//!     { "name": "a.txt", "fullPath": "/home/me/project/a.txt",
//!       "relativePath": "a.txt", "type": "file", "content": "hello" }
//!   ],
//!   "remark": "before refactor",
//!   "summary": { "lastSaved": "2024-05-01 10:20:30", "totalFiles": 1, "totalDirectories": 0 }
//! }
//! ```
//!
//! Files whose bytes are not UTF-8 may be stored with type `file-binary`
//! and base64 `content`; text files keep the plain `file` form.

mod document;

pub use document::{
    Format, TYPE_DIRECTORY, TYPE_FILE, TYPE_FILE_BINARY, decode, decode_reader, decode_value,
    encode, encode_to_writer, encode_with,
};
