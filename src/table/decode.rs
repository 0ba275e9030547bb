// src/table/decode.rs

use super::{uniquify, TabularDataset};
use crate::{
    error::ShapeError,
    record::{payload_tokens, RawRecordDocument},
};

/// Reshape the flat payload of `data_lines` into rows of `header.len()` values.
///
/// Tokens are laid out row-major: row `r`, column `c` comes from flat index
/// `r * N + c`. Column names are trimmed and then made unique.
pub fn decode(header: &[String], data_lines: &[String]) -> Result<TabularDataset, ShapeError> {
    reshape(header, payload_tokens(data_lines))
}

/// Decode a parsed record using its own header.
pub fn decode_document(doc: &RawRecordDocument) -> Result<TabularDataset, ShapeError> {
    reshape(&doc.header, doc.tokens())
}

fn reshape<'a>(
    header: &[String],
    tokens: impl Iterator<Item = &'a str>,
) -> Result<TabularDataset, ShapeError> {
    let width = header.len();
    let tokens: Vec<&str> = tokens.collect();

    if width == 0 || tokens.len() % width != 0 {
        return Err(ShapeError::RaggedPayload {
            tokens: tokens.len(),
            variables: width,
        });
    }

    let mut values = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        let v = token.parse::<f64>().map_err(|_| ShapeError::NonNumericToken {
            token: token.to_string(),
            index,
        })?;
        values.push(v);
    }

    let rows: Vec<Vec<f64>> = values.chunks_exact(width).map(<[f64]>::to_vec).collect();
    let names: Vec<&str> = header.iter().map(|h| h.trim()).collect();
    TabularDataset::try_new(uniquify(names.as_slice()), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse;

    #[test]
    fn reshapes_row_major() {
        let doc = parse("2\nt\nx\n0 1\n0.5 2\n1 3").unwrap();
        let ds = decode_document(&doc).unwrap();
        assert_eq!(ds.columns(), ["t", "x"]);
        assert_eq!(
            ds.rows(),
            [vec![0.0, 1.0], vec![0.5, 2.0], vec![1.0, 3.0]]
        );
    }

    #[test]
    fn rows_may_wrap_across_lines() {
        // Three variables written five values per line.
        let doc = parse("3\ntempo\na\nb\n0 1 2 1 3\n4 2 5 6\n").unwrap();
        let ds = decode_document(&doc).unwrap();
        assert_eq!(ds.num_rows(), 3);
        let tokens: Vec<f64> = doc.tokens().map(|t| t.parse().unwrap()).collect();
        for r in 0..ds.num_rows() {
            for c in 0..ds.num_columns() {
                assert_eq!(ds.rows()[r][c], tokens[r * 3 + c]);
            }
        }
    }

    #[test]
    fn token_count_must_divide_evenly() {
        let doc = parse("3\nt\na\nb\n1 2 3 4 5 6 7\n").unwrap();
        assert_eq!(
            decode_document(&doc).unwrap_err(),
            ShapeError::RaggedPayload {
                tokens: 7,
                variables: 3
            }
        );
    }

    #[test]
    fn non_numeric_token_is_fatal() {
        let doc = parse("2\nt\nx\n0 1\n0.5 abc\n").unwrap();
        assert_eq!(
            decode_document(&doc).unwrap_err(),
            ShapeError::NonNumericToken {
                token: "abc".into(),
                index: 3
            }
        );
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        let doc = parse("3\n tempo\nV \nV\n0 1 2\n").unwrap();
        let ds = decode_document(&doc).unwrap();
        assert_eq!(ds.columns(), ["tempo", "V", "V_1"]);
    }

    #[test]
    fn empty_payload_gives_empty_table() {
        let doc = parse("2\nt\nx\n").unwrap();
        let ds = decode_document(&doc).unwrap();
        assert_eq!(ds.num_rows(), 0);
        assert_eq!(ds.num_columns(), 2);
    }

    #[test]
    fn header_and_lines_without_a_document() {
        let header = vec!["tempo".to_string(), " v ".to_string()];
        let lines = vec!["0 1\r\n".to_string(), "\n".to_string(), "1\t2\n".to_string()];
        let ds = decode(&header, &lines).unwrap();
        assert_eq!(ds.columns(), ["tempo", "v"]);
        assert_eq!(ds.rows(), [vec![0.0, 1.0], vec![1.0, 2.0]]);
    }
}
