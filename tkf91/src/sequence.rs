//! Nucleotide and alignment-row codecs.
//!
//! Nucleotides are the indices 0–3 for A, C, G, T. Alignment rows use an
//! `i8` per column with `-1` as the gap sentinel; raw sequences never
//! contain gaps.

use crate::error::{Error, Result};

/// Gap sentinel used in alignment rows.
pub const GAP: i8 = -1;

const ALPHABET: [u8; 4] = *b"ACGT";

fn decode_byte(byte: u8) -> Result<i8> {
    match byte {
        b'A' | b'a' => Ok(0),
        b'C' | b'c' => Ok(1),
        b'G' | b'g' => Ok(2),
        b'T' | b't' => Ok(3),
        b'-' => Ok(GAP),
        // Ambiguity codes (N, R, Y, ...) collapse to A.
        b if b.is_ascii_alphabetic() => Ok(0),
        b => Err(Error::InvalidSequence(b)),
    }
}

/// Decodes a raw, unaligned sequence. Gaps are rejected.
pub fn decode_residues(text: &str) -> Result<Vec<u8>> {
    text.bytes()
        .map(|b| match decode_byte(b)? {
            GAP => Err(Error::InvalidSequence(b'-')),
            nt => Ok(nt as u8),
        })
        .collect()
}

/// Decodes one row of an alignment, where `-` marks a gap column.
pub fn decode_alignment_row(text: &str) -> Result<Vec<i8>> {
    text.bytes().map(decode_byte).collect()
}

/// Drops the gap columns of an alignment row, leaving the raw residues.
#[must_use]
pub fn strip_gaps(row: &[i8]) -> Vec<u8> {
    row.iter()
        .filter(|&&c| c != GAP)
        .map(|&c| c as u8)
        .collect()
}

/// Renders a single nucleotide index as its uppercase letter.
#[must_use]
pub const fn encode(nt: u8) -> char {
    ALPHABET[nt as usize] as char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_canonical() {
        assert_eq!(decode_residues("ACGT").unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(decode_residues("acgt").unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn ambiguity_codes_collapse_to_a() {
        assert_eq!(decode_residues("NRY").unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn gaps_only_in_alignment_rows() {
        assert!(decode_residues("A-C").is_err());
        assert_eq!(decode_alignment_row("A-C").unwrap(), vec![0, GAP, 1]);
    }

    #[test]
    fn non_letters_are_fatal() {
        assert!(decode_residues("AC*T").is_err());
        assert!(decode_alignment_row("AC T").is_err());
    }

    #[test]
    fn strip_gaps_recovers_residues() {
        let row = decode_alignment_row("-AC-G").unwrap();
        assert_eq!(strip_gaps(&row), vec![0, 1, 2]);
    }
}
