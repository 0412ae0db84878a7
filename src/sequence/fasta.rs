use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_till},
    character::complete::{line_ending, multispace0, not_line_ending},
    combinator::opt,
    multi::many0,
    sequence::{preceded, terminated},
};
use crate::core::error::{Error, ErrorKind, Result};

/// One `>header` entry of a FASTA file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub accession: String,
    pub header: String,
    pub sequence: String,
}

/// UniProt headers (`sp|P12345|NAME_HUMAN ...`) yield the middle field,
/// anything else its first word
pub fn accession_from_header(header: &str) -> &str {
    let first_word = header.split_whitespace().next().unwrap_or("");
    let mut fields = first_word.split('|');
    match (fields.next(), fields.next()) {
        (Some("sp" | "tr"), Some(accession)) if !accession.is_empty() => accession,
        _ => first_word,
    }
}

fn header_line(input: &str) -> IResult<&str, &str> {
    terminated(preceded(tag(">"), not_line_ending), opt(line_ending)).parse(input)
}

fn record(input: &str) -> IResult<&str, FastaRecord> {
    let (input, (header, body)) = (header_line, take_till(|c: char| c == '>')).parse(input)?;

    let sequence = body
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    Ok((input, FastaRecord {
        accession: accession_from_header(header).to_string(),
        header: header.trim().to_string(),
        sequence,
    }))
}

/// Parse FASTA text into records, in file order
pub fn parse_fasta(input: &str) -> Result<Vec<FastaRecord>> {
    let (rest, records) = preceded(multispace0, many0(terminated(record, multispace0)))
        .parse(input)
        .map_err(|e| Error::new(ErrorKind::Parse, format!("Invalid FASTA: {}", e)))?;

    if !rest.is_empty() {
        let line = rest.lines().next().unwrap_or("");
        return Err(Error::new(
            ErrorKind::Parse,
            format!("Expected a '>' header, found: {}", line),
        ));
    }
    if let Some(record) = records.iter().find(|r| r.accession.is_empty()) {
        return Err(Error::new(
            ErrorKind::Parse,
            format!("Header without accession: >{}", record.header),
        ));
    }

    Ok(records)
}
