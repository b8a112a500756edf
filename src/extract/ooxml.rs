use std::collections::HashMap;
use std::io::{Cursor, Read};

use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

/// An OOXML package (docx, xlsx, pptx) opened from memory.
pub struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes)).context("read zip")?;
        Ok(Self { archive })
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .with_context(|| format!("missing part: {}", name))?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .with_context(|| format!("read part: {}", name))?;
        Ok(data)
    }

    /// Relationship id -> part name, resolved against `base_dir`.
    pub fn relationships(&mut self, rels_part: &str, base_dir: &str) -> Result<HashMap<String, String>> {
        let xml = self.read_part(rels_part)?;
        let mut reader = Reader::from_reader(xml.as_slice());
        let mut buf = Vec::new();
        let mut rels = HashMap::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).with_context(|| format!("parse {}", rels_part))? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                    if let (Some(id), Some(target)) = (attribute(&e, b"Id"), attribute(&e, b"Target")) {
                        rels.insert(id, resolve_target(base_dir, &target));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(rels)
    }
}

/// Value of the first attribute whose local name matches.
pub fn attribute(element: &BytesStart<'_>, local_name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local_name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// The namespaced `r:id` attribute, as opposed to a bare `id`.
pub fn relationship_id(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

pub fn resolve_target(base_dir: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if base_dir.is_empty() => target.to_string(),
        None => format!("{}/{}", base_dir.trim_end_matches('/'), target),
    };

    let mut parts: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

pub fn ends_with(stack: &[Vec<u8>], names: &[&[u8]]) -> bool {
    stack.len() >= names.len()
        && stack[stack.len() - names.len()..]
            .iter()
            .zip(names)
            .all(|(have, want)| have.as_slice() == *want)
}

/// Text of every body paragraph, each newline-terminated.
///
/// Only paragraphs that are direct children of `w:body` count; table cells and
/// text boxes are skipped. Within a paragraph, run text is concatenated,
/// `w:tab` becomes a tab and line breaks become newlines.
pub fn docx_text(bytes: &[u8]) -> Result<String> {
    let mut package = Package::open(bytes)?;
    let xml = package.read_part("word/document.xml")?;

    let mut reader = Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    // (stack depth of the body paragraph, its text so far)
    let mut paragraph: Option<(usize, String)> = None;
    let mut capture = false;
    let mut out = String::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).context("parse word/document.xml")? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if paragraph.is_none() && name == b"p" && ends_with(&stack, &[b"body"]) {
                    paragraph = Some((stack.len(), String::new()));
                } else if name == b"t" {
                    capture = matches!(&paragraph, Some((depth, _)) if in_run(&stack, *depth));
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                if let Some((depth, text)) = paragraph.as_mut() {
                    if in_run(&stack, *depth) {
                        match e.local_name().as_ref() {
                            b"tab" | b"ptab" => text.push('\t'),
                            b"cr" => text.push('\n'),
                            b"br" => {
                                let kind = attribute(&e, b"type");
                                if kind.as_deref().unwrap_or("textWrapping") == "textWrapping" {
                                    text.push('\n');
                                }
                            }
                            b"noBreakHyphen" => text.push('-'),
                            _ => {}
                        }
                    }
                } else if e.local_name().as_ref() == b"p" && ends_with(&stack, &[b"body"]) {
                    out.push('\n');
                }
            }
            Event::Text(t) if capture => {
                if let Some((_, text)) = paragraph.as_mut() {
                    text.push_str(&t.unescape().context("unescape run text")?);
                }
            }
            Event::CData(c) if capture => {
                if let Some((_, text)) = paragraph.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if stack.pop().as_deref() == Some(b"t".as_slice()) {
                    capture = false;
                }
                if matches!(&paragraph, Some((depth, _)) if *depth == stack.len()) {
                    if let Some((_, text)) = paragraph.take() {
                        out.push_str(&text);
                        out.push('\n');
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

/// Whether the open elements below the paragraph are a run, directly or
/// through a hyperlink.
fn in_run(stack: &[Vec<u8>], paragraph_depth: usize) -> bool {
    match stack.get(paragraph_depth + 1..) {
        Some([r]) => r.as_slice() == b"r",
        Some([link, r]) => link.as_slice() == b"hyperlink" && r.as_slice() == b"r",
        _ => false,
    }
}

/// Text of every top-level shape on every slide, in slide order.
///
/// Each shape's paragraphs are joined by newlines and the shape's text is
/// newline-terminated. Shapes inside groups, pictures and graphic frames
/// carry no text of their own.
pub fn pptx_text(bytes: &[u8]) -> Result<String> {
    let mut package = Package::open(bytes)?;
    let mut out = String::new();
    for part in slide_parts(&mut package)? {
        let xml = package.read_part(&part)?;
        slide_text(&xml, &mut out).with_context(|| format!("parse {}", part))?;
    }
    Ok(out)
}

fn slide_parts(package: &mut Package<'_>) -> Result<Vec<String>> {
    let rels = package.relationships("ppt/_rels/presentation.xml.rels", "ppt")?;
    let xml = package.read_part("ppt/presentation.xml")?;

    let mut reader = Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut parts = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).context("parse ppt/presentation.xml")? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                let id = relationship_id(&e).ok_or_else(|| anyhow!("slide entry without r:id"))?;
                let part = rels
                    .get(&id)
                    .ok_or_else(|| anyhow!("unknown slide relationship: {}", id))?;
                parts.push(part.clone());
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(parts)
}

struct ShapeText {
    depth: usize,
    paragraphs: Vec<String>,
    current: Option<String>,
}

fn slide_text(xml: &[u8], out: &mut String) -> Result<()> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape: Option<ShapeText> = None;
    let mut capture = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if shape.is_none() && name == b"sp" && ends_with(&stack, &[b"cSld", b"spTree"]) {
                    shape = Some(ShapeText {
                        depth: stack.len(),
                        paragraphs: Vec::new(),
                        current: None,
                    });
                } else if let Some(s) = shape.as_mut() {
                    if name == b"p" && ends_with(&stack, &[b"txBody"]) {
                        s.current = Some(String::new());
                    } else if name == b"t" {
                        capture = s.current.is_some();
                    }
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                if let Some(s) = shape.as_mut() {
                    match e.local_name().as_ref() {
                        b"p" if ends_with(&stack, &[b"txBody"]) => s.paragraphs.push(String::new()),
                        b"br" => {
                            if let Some(p) = s.current.as_mut() {
                                p.push('\n');
                            }
                        }
                        _ => {}
                    }
                } else if e.local_name().as_ref() == b"sp" && ends_with(&stack, &[b"cSld", b"spTree"]) {
                    out.push('\n');
                }
            }
            Event::Text(t) if capture => {
                if let Some(p) = shape.as_mut().and_then(|s| s.current.as_mut()) {
                    p.push_str(&t.unescape()?);
                }
            }
            Event::End(_) => {
                let name = stack.pop().unwrap_or_default();
                if let Some(s) = shape.as_mut() {
                    if name == b"t" {
                        capture = false;
                    } else if name == b"p" && ends_with(&stack, &[b"txBody"]) {
                        if let Some(p) = s.current.take() {
                            s.paragraphs.push(p);
                        }
                    }
                    if stack.len() == s.depth {
                        out.push_str(&s.paragraphs.join("\n"));
                        out.push('\n');
                        shape = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}
