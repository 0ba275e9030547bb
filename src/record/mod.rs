// src/record/mod.rs

pub mod rename;

use crate::error::FormatError;

/// A simulation dump after the structural pass: the count line, one name per
/// variable, and the untouched payload lines.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecordDocument {
    pub variable_count: usize,
    /// The count line as written, surrounding whitespace removed.
    pub count_line: String,
    /// Variable names with line terminators stripped. Element 0 is time.
    pub header: Vec<String>,
    /// Payload lines exactly as read, terminators included.
    pub data_lines: Vec<String>,
}

impl RawRecordDocument {
    pub fn time_variable(&self) -> &str {
        &self.header[0]
    }

    /// Iterator over the whitespace-delimited payload tokens, in file order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        payload_tokens(&self.data_lines)
    }
}

/// Whitespace-delimited tokens of `lines`, blank lines skipped.
pub fn payload_tokens(lines: &[String]) -> impl Iterator<Item = &str> {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| line.split_whitespace())
}

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Validate the count line and header block of `content`.
///
/// No numeric parsing happens here; the payload is carried verbatim so the
/// rename stage can write it back byte-for-byte.
pub fn parse(content: &str) -> Result<RawRecordDocument, FormatError> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    let count_line = lines.first().map(|l| l.trim()).unwrap_or_default();
    let variable_count = match count_line.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            return Err(FormatError::InvalidCount {
                found: count_line.to_string(),
            })
        }
    };

    if lines.len() < variable_count + 1 {
        return Err(FormatError::TruncatedHeader {
            expected: variable_count,
            found: lines.len() - 1,
        });
    }

    let header = lines[1..=variable_count]
        .iter()
        .map(|l| strip_terminator(l).to_string())
        .collect();
    let data_lines = lines[variable_count + 1..]
        .iter()
        .map(|l| l.to_string())
        .collect();

    Ok(RawRecordDocument {
        variable_count,
        count_line: count_line.to_string(),
        header,
        data_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_count_header_and_payload() {
        let doc = parse("2\nt\nx\n0 1\n0.5 2\n").unwrap();
        assert_eq!(doc.variable_count, 2);
        assert_eq!(doc.count_line, "2");
        assert_eq!(doc.header, vec!["t", "x"]);
        assert_eq!(doc.data_lines, vec!["0 1\n", "0.5 2\n"]);
        assert_eq!(doc.time_variable(), "t");
    }

    #[test]
    fn keeps_crlf_payload_verbatim() {
        let doc = parse(" 2 \r\nTempo\r\n  Vel \r\n1 2\r\n").unwrap();
        assert_eq!(doc.header, vec!["Tempo", "  Vel "]);
        assert_eq!(doc.data_lines, vec!["1 2\r\n"]);
    }

    #[test]
    fn header_without_payload_is_valid() {
        let doc = parse("1\ntempo").unwrap();
        assert_eq!(doc.header, vec!["tempo"]);
        assert!(doc.data_lines.is_empty());
        assert_eq!(doc.tokens().count(), 0);
    }

    #[test]
    fn rejects_bad_count() {
        for content in ["", "abc\nt\n", "0\n", "-2\nt\nx\n", "2.5\nt\nx\n"] {
            assert!(
                matches!(parse(content), Err(FormatError::InvalidCount { .. })),
                "{content:?}"
            );
        }
    }

    #[test]
    fn rejects_truncated_header() {
        let err = parse("3\nt\nx\n").unwrap_err();
        assert_eq!(
            err,
            FormatError::TruncatedHeader {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn tokens_skip_blank_lines() {
        let doc = parse("2\nt\nx\n0 1\n\n   \n0.5\t2\n").unwrap();
        let tokens: Vec<&str> = doc.tokens().collect();
        assert_eq!(tokens, vec!["0", "1", "0.5", "2"]);
    }
}
