use std::fmt;

use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

use crate::extract::ooxml::{attribute, relationship_id, Package};

/// Largest grid we are willing to materialize from one worksheet.
const MAX_SHEET_CELLS: usize = 5_000_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(true) => f.write_str("TRUE"),
            Cell::Bool(false) => f.write_str("FALSE"),
            Cell::Empty => Ok(()),
        }
    }
}

/// A worksheet as a dense grid anchored at A1. Every row has the same width;
/// positions with no cell are `Cell::Empty`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

/// Read every worksheet of a workbook, in workbook order.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut package = Package::open(bytes)?;
    let rels = package.relationships("xl/_rels/workbook.xml.rels", "xl")?;

    let shared = if package.has_part("xl/sharedStrings.xml") {
        let xml = package.read_part("xl/sharedStrings.xml")?;
        shared_strings(&xml).context("parse xl/sharedStrings.xml")?
    } else {
        Vec::new()
    };

    let workbook = package.read_part("xl/workbook.xml")?;
    let mut sheets = Vec::new();
    for (name, rel_id) in sheet_entries(&workbook)? {
        let part = rels
            .get(&rel_id)
            .ok_or_else(|| anyhow!("unknown sheet relationship: {}", rel_id))?;
        let xml = package.read_part(part)?;
        let rows = sheet_rows(&xml, &shared).with_context(|| format!("parse {}", part))?;
        sheets.push(Sheet { name, rows });
    }
    Ok(sheets)
}

/// Tab-joined rows of every sheet, each row newline-terminated.
pub fn workbook_text(bytes: &[u8]) -> Result<String> {
    let mut out = String::new();
    for sheet in read_workbook(bytes)? {
        for row in &sheet.rows {
            let line = row.iter().map(Cell::to_string).collect::<Vec<_>>().join("\t");
            out.push_str(&line);
            out.push('\n');
        }
    }
    Ok(out)
}

fn sheet_entries(xml: &[u8]) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut entries = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).context("parse xl/workbook.xml")? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute(&e, b"name").unwrap_or_default();
                let rel_id = relationship_id(&e)
                    .ok_or_else(|| anyhow!("sheet '{}' has no relationship id", name))?;
                entries.push((name, rel_id));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

fn shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    // phonetic runs repeat the text in another script
    let mut phonetic_depth = 0usize;
    let mut capture = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => phonetic_depth += 1,
                b"t" => capture = current.is_some() && phonetic_depth == 0,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if capture => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => capture = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"si" => strings.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

struct PendingCell {
    row: usize,
    col: usize,
    kind: Option<String>,
    value: Option<String>,
    inline: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Capture {
    None,
    Value,
    Inline,
}

fn sheet_rows(xml: &[u8], shared: &[String]) -> Result<Vec<Vec<Cell>>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut cells: Vec<(usize, usize, Cell)> = Vec::new();
    let mut row = 0usize;
    let mut next_col = 1usize;
    let mut pending: Option<PendingCell> = None;
    let mut capture = Capture::None;
    let mut in_inline = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_number(&e, row)?;
                    next_col = 1;
                }
                b"c" => {
                    let (r, c) = cell_position(&e, row, next_col)?;
                    next_col = c + 1;
                    pending = Some(PendingCell {
                        row: r,
                        col: c,
                        kind: attribute(&e, b"t"),
                        value: None,
                        inline: String::new(),
                    });
                }
                b"v" if pending.is_some() => capture = Capture::Value,
                b"is" => in_inline = true,
                b"t" if in_inline => capture = Capture::Inline,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_number(&e, row)?;
                    next_col = 1;
                }
                b"c" => {
                    let (r, c) = cell_position(&e, row, next_col)?;
                    next_col = c + 1;
                    cells.push((r, c, Cell::Empty));
                }
                _ => {}
            },
            Event::Text(t) if capture != Capture::None => {
                if let Some(cell) = pending.as_mut() {
                    let text = t.unescape()?;
                    match capture {
                        Capture::Value => cell.value.get_or_insert_with(String::new).push_str(&text),
                        _ => cell.inline.push_str(&text),
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = Capture::None,
                b"is" => in_inline = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        let value = cell_value(&cell, shared)?;
                        cells.push((cell.row, cell.col, value));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let max_row = cells.iter().map(|(r, _, _)| *r).max().unwrap_or(0);
    let max_col = cells.iter().map(|(_, c, _)| *c).max().unwrap_or(0);
    if max_row.saturating_mul(max_col) > MAX_SHEET_CELLS {
        bail!("worksheet too large: {} rows x {} columns", max_row, max_col);
    }

    let mut grid = vec![vec![Cell::Empty; max_col]; max_row];
    for (r, c, value) in cells {
        grid[r - 1][c - 1] = value;
    }
    Ok(grid)
}

fn row_number(element: &quick_xml::events::BytesStart<'_>, previous: usize) -> Result<usize> {
    match attribute(element, b"r") {
        Some(r) => r
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| anyhow!("invalid row number: {}", r)),
        None => Ok(previous + 1),
    }
}

fn cell_position(
    element: &quick_xml::events::BytesStart<'_>,
    row: usize,
    next_col: usize,
) -> Result<(usize, usize)> {
    match attribute(element, b"r") {
        Some(reference) => parse_cell_reference(&reference)
            .ok_or_else(|| anyhow!("invalid cell reference: {}", reference)),
        None => Ok((row.max(1), next_col)),
    }
}

/// "B3" -> (row 3, column 2), both 1-based.
pub fn parse_cell_reference(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || letters.len() > 3 || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let col = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    let row = digits.parse::<usize>().ok().filter(|r| *r > 0)?;
    Some((row, col))
}

fn cell_value(cell: &PendingCell, shared: &[String]) -> Result<Cell> {
    let raw = cell.value.as_deref();
    let value = match (cell.kind.as_deref(), raw) {
        (Some("inlineStr"), _) => Cell::Text(cell.inline.clone()),
        (_, None) => Cell::Empty,
        (Some("s"), Some(index)) => {
            let index: usize = index
                .trim()
                .parse()
                .with_context(|| format!("invalid shared string index: {}", index))?;
            let text = shared
                .get(index)
                .ok_or_else(|| anyhow!("shared string {} out of range", index))?;
            Cell::Text(text.clone())
        }
        (Some("b"), Some(v)) => Cell::Bool(v.trim() == "1"),
        (Some("str"), Some(v)) | (Some("e"), Some(v)) => Cell::Text(v.to_string()),
        (_, Some(v)) => match v.trim().parse::<f64>() {
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::Text(v.to_string()),
        },
    };
    Ok(value)
}
