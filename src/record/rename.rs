// src/record/rename.rs

use tracing::warn;

use super::RawRecordDocument;
use crate::{error::MappingMiss, mapping::NameLookup};

/// Result of rewriting a header: the new names plus every variable the
/// lookup had no answer for.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenHeader {
    pub header: Vec<String>,
    pub misses: Vec<MappingMiss>,
}

/// Apply `lookup` to every variable but the first.
///
/// The time variable keeps its text untouched. Other names are trimmed before
/// lookup; a miss keeps the trimmed original and is reported, never fatal.
pub fn rewrite_header<L: NameLookup + ?Sized>(header: &[String], lookup: &L) -> RewrittenHeader {
    let mut out = Vec::with_capacity(header.len());
    let mut misses = Vec::new();

    for (idx, var) in header.iter().enumerate() {
        if idx == 0 {
            out.push(var.clone());
            continue;
        }
        let key = var.trim();
        match lookup.lookup(key) {
            Some(new_name) => out.push(new_name),
            None => {
                misses.push(MappingMiss {
                    name: key.to_string(),
                });
                out.push(key.to_string());
            }
        }
    }

    RewrittenHeader {
        header: out,
        misses,
    }
}

/// Rewrite `doc`'s header and serialize the renamed record: count line,
/// rewritten names, then the original payload lines unmodified.
pub fn rename_document<L: NameLookup + ?Sized>(
    doc: &RawRecordDocument,
    lookup: &L,
    file_name: &str,
) -> (String, Vec<MappingMiss>) {
    let rewritten = rewrite_header(&doc.header, lookup);
    for miss in &rewritten.misses {
        warn!(file = %file_name, variable = %miss.name, "no mapping, keeping original name");
    }
    (
        render(&doc.count_line, &rewritten.header, &doc.data_lines),
        rewritten.misses,
    )
}

/// Serialize a record. Payload lines are written verbatim.
pub fn render(count_line: &str, header: &[String], data_lines: &[String]) -> String {
    let payload_len: usize = data_lines.iter().map(String::len).sum();
    let header_len: usize = header.iter().map(|h| h.len() + 1).sum();
    let mut out = String::with_capacity(count_line.len() + 1 + header_len + payload_len);

    out.push_str(count_line);
    out.push('\n');
    for var in header {
        out.push_str(var);
        out.push('\n');
    }
    for line in data_lines {
        out.push_str(line);
    }
    out
}
