//! PPTX file reader producing structured extractions.

use deck_core::{Error, ExtractedPresentation, ExtractedSlide, RawElement, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Reads PPTX (Office Open XML) files into [`ExtractedPresentation`]s.
///
/// Run-level bold, italic and underline are kept as `**`, `*` and `__`
/// markers so the inline formatter can restore them.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<ExtractedPresentation> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let title = self.read_core_title(&mut archive).or_else(|| file_stem(filename));
        let mut presentation = ExtractedPresentation::new(Some(filename.to_string()), title);

        let slide_order = self.get_slide_order(&mut archive)?;
        if slide_order.is_empty() {
            return Err(Error::ExtractionError(format!("{} has no slides", filename)));
        }
        log::debug!("{}: {} slides", filename, slide_order.len());

        for (index, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, index)?;
            presentation.add_slide(slide);
        }

        Ok(presentation)
    }

    /// Ordered slide paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                    let rel_type = attribute(e, b"Type").unwrap_or_default();
                    let target = attribute(e, b"Target").unwrap_or_default();
                    let id = attribute(e, b"Id").unwrap_or_default();

                    if rel_type.ends_with("/slide") {
                        let order = extract_slide_number(&target).or_else(|| extract_slide_number(&id));
                        let path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slides.push((path, order));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
                }
                _ => {}
            }
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        index: usize,
    ) -> Result<ExtractedSlide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let mut slide = ExtractedSlide::new(index);

        for shape in extract_shapes(&content) {
            let mut element = RawElement::text(shape.text, shape.y, shape.placeholder.unwrap_or_default());
            element.object_id = shape.id;
            slide.raw_elements.push(element);
        }
        slide.sort_by_position();

        Ok(slide)
    }

    /// `dc:title` from `docProps/core.xml`, when present and non-empty.
    fn read_core_title<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Option<String> {
        let content = self.read_file_from_archive(archive, "docProps/core.xml").ok()?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        let mut in_title = false;
        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => in_title = local_name(e.name().as_ref()) == b"title",
                Ok(Event::Text(ref e)) if in_title => {
                    let title = e.unescape().ok()?.trim().to_string();
                    return (!title.is_empty()).then_some(title);
                }
                Ok(Event::End(_)) => in_title = false,
                Ok(Event::Eof) | Err(_) => return None,
                _ => {}
            }
        }
    }

    fn read_file_from_archive<R: Read + Seek>(&self, archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A text shape read from slide XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    id: String,
    text: String,
    y: f64,
    placeholder: Option<String>,
}

/// Emphasis flags of the current text run.
#[derive(Debug, Default, Clone, Copy)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
}

impl RunStyle {
    fn from_rpr(e: &BytesStart) -> Self {
        let on = |key: &[u8]| attribute(e, key).is_some_and(|v| v == "1" || v == "true");
        Self {
            bold: on(b"b"),
            italic: on(b"i"),
            underline: attribute(e, b"u").is_some_and(|v| v != "none"),
        }
    }

    /// Wrap run text in emphasis markers. Whitespace stays outside them.
    fn apply(self, text: &str) -> String {
        let core = text.trim();
        if core.is_empty() || !(self.bold || self.italic || self.underline) {
            return text.to_string();
        }
        let lead = &text[..text.len() - text.trim_start().len()];
        let trail = &text[text.trim_end().len()..];

        let mut marked = core.to_string();
        if self.italic {
            marked = format!("*{}*", marked);
        }
        if self.underline {
            marked = format!("__{}__", marked);
        }
        if self.bold {
            marked = format!("**{}**", marked);
        }
        format!("{}{}{}", lead, marked, trail)
    }
}

/// Collect text shapes with their id, top offset and placeholder type.
fn extract_shapes(xml_content: &str) -> Vec<ShapeInfo> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut current: Option<ShapeInfo> = None;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut run = String::new();
    let mut style = RunStyle::default();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    current = Some(ShapeInfo::default());
                    paragraphs.clear();
                }
                b"p" if current.is_some() => paragraph.clear(),
                b"r" => {
                    in_run = true;
                    run.clear();
                    style = RunStyle::default();
                }
                b"rPr" if in_run => style = RunStyle::from_rpr(e),
                b"t" => in_text = true,
                name => read_shape_attributes(name, e, current.as_mut()),
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"rPr" if in_run => style = RunStyle::from_rpr(e),
                b"br" => paragraph.push('\n'),
                name => read_shape_attributes(name, e, current.as_mut()),
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e.unescape().unwrap_or_default();
                if in_run {
                    run.push_str(&text);
                } else {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"r" => {
                    paragraph.push_str(&style.apply(&run));
                    in_run = false;
                }
                b"p" if current.is_some() => paragraphs.push(std::mem::take(&mut paragraph)),
                b"sp" => {
                    if let Some(mut shape) = current.take() {
                        shape.text = paragraphs
                            .iter()
                            .map(|p| p.trim())
                            .filter(|p| !p.is_empty())
                            .collect::<Vec<_>>()
                            .join("\n");
                        if !shape.text.is_empty() {
                            shapes.push(shape);
                        }
                    }
                    paragraphs.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (continuing): {}", e);
            }
            _ => {}
        }
    }

    shapes
}

/// Pick up shape id, offset and placeholder type from their elements.
fn read_shape_attributes(name: &[u8], e: &BytesStart, shape: Option<&mut ShapeInfo>) {
    let Some(shape) = shape else {
        return;
    };
    match name {
        b"cNvPr" => {
            if let Some(id) = attribute(e, b"id") {
                shape.id = id;
            }
        }
        // Only the first offset is the shape's own; later ones belong to children
        b"off" if shape.y == 0.0 => {
            if let Some(y) = attribute(e, b"y").and_then(|v| v.parse::<f64>().ok()) {
                shape.y = y;
            }
        }
        b"ph" => {
            let kind = attribute(e, b"type");
            shape.placeholder = Some(placeholder_name(kind.as_deref()).to_string());
        }
        _ => {}
    }
}

/// Extraction placeholder name for an OOXML `p:ph` type.
fn placeholder_name(ph_type: Option<&str>) -> &'static str {
    match ph_type {
        Some("title") => "TITLE",
        Some("ctrTitle") => "CENTERED_TITLE",
        Some("subTitle") => "SUBTITLE",
        Some("ftr") | Some("sldNum") | Some("dt") => "FOOTER",
        // An untyped placeholder is a content (object) placeholder
        Some("body") | Some("obj") | None => "BODY",
        Some(_) => "",
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "slides/slide3.xml" or "rId2".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");
    let start = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    s[start..].parse().ok()
}

fn file_stem(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const SLIDE_ONE: &str = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
        <p:sp>
          <p:nvSpPr><p:cNvPr id="4" name="Body"/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>
          <p:spPr><a:xfrm><a:off x="457200" y="1600200"/></a:xfrm></p:spPr>
          <p:txBody>
            <a:p><a:r><a:rPr b="1"/><a:t>Revenue</a:t></a:r><a:r><a:t> grew</a:t></a:r></a:p>
            <a:p><a:r><a:rPr i="1"/><a:t>Costs fell</a:t></a:r></a:p>
          </p:txBody>
        </p:sp>
        <p:sp>
          <p:nvSpPr><p:cNvPr id="2" name="Title"/><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr>
          <p:spPr><a:xfrm><a:off x="457200" y="274638"/></a:xfrm></p:spPr>
          <p:txBody><a:p><a:r><a:t>Q4 &amp; Outlook</a:t></a:r></a:p></p:txBody>
        </p:sp>
        <p:sp>
          <p:nvSpPr><p:cNvPr id="7" name="Empty"/></p:nvSpPr>
          <p:txBody><a:p/></p:txBody>
        </p:sp>
    </p:spTree></p:cSld></p:sld>"#;

    const SLIDE_TWO: &str = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
        <p:sp>
          <p:nvSpPr><p:cNvPr id="3" name="Footer"/><p:nvPr><p:ph type="ftr"/></p:nvPr></p:nvSpPr>
          <p:txBody><a:p><a:r><a:t>Confidential</a:t></a:r></a:p></p:txBody>
        </p:sp>
    </p:spTree></p:cSld></p:sld>"#;

    const RELS: &str = r#"<Relationships>
        <Relationship Id="rId1" Type="http://schemas/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
        <Relationship Id="rId3" Type="http://schemas/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
        <Relationship Id="rId2" Type="http://schemas/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
    </Relationships>"#;

    fn build_pptx(with_core: bool) -> Vec<u8> {
        let mut files = vec![
            ("ppt/_rels/presentation.xml.rels", RELS),
            ("ppt/slides/slide1.xml", SLIDE_ONE),
            ("ppt/slides/slide2.xml", SLIDE_TWO),
        ];
        if with_core {
            files.push((
                "docProps/core.xml",
                r#"<cp:coreProperties xmlns:dc="dc" xmlns:cp="cp"><dc:title>Quarterly Review</dc:title></cp:coreProperties>"#,
            ));
        }
        zip_files(&files)
    }

    fn zip_files(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        for &(name, content) in files {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_parse_slides_in_order_with_placeholders() {
        let bytes = build_pptx(true);
        let presentation = PptxParser::new().parse(Cursor::new(bytes), "review.pptx").unwrap();

        assert_eq!(presentation.title.as_deref(), Some("Quarterly Review"));
        assert_eq!(presentation.slides.len(), 2);

        let first = &presentation.slides[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.raw_elements.len(), 2);
        assert_eq!(first.raw_elements[0].content, "Q4 & Outlook");
        assert_eq!(first.raw_elements[0].placeholder_type, "CENTERED_TITLE");
        assert_eq!(first.raw_elements[0].object_id, "2");
        assert_eq!(first.raw_elements[1].content, "**Revenue** grew\n*Costs fell*");
        assert_eq!(first.raw_elements[1].placeholder_type, "BODY");
        assert_eq!(first.raw_elements[1].position_y, 1_600_200.0);

        let second = &presentation.slides[1];
        assert_eq!(second.raw_elements[0].placeholder_type, "FOOTER");
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let bytes = build_pptx(false);
        let presentation = PptxParser::new().parse(Cursor::new(bytes), "decks/review.pptx").unwrap();
        assert_eq!(presentation.title.as_deref(), Some("review"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = PptxParser::new()
            .parse(Cursor::new(b"plain text".to_vec()), "x.pptx")
            .unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }

    #[test]
    fn test_presentation_without_slides() {
        let rels = r#"<Relationships>
            <Relationship Id="rId1" Type="http://schemas/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
        </Relationships>"#;
        let bytes = zip_files(&[("ppt/_rels/presentation.xml.rels", rels)]);
        let err = PptxParser::new().parse(Cursor::new(bytes), "empty.pptx").unwrap_err();
        assert!(matches!(err, Error::ExtractionError(ref msg) if msg.contains("empty.pptx")));
    }

    #[test]
    fn test_run_style_markers() {
        let style = RunStyle {
            bold: true,
            italic: false,
            underline: false,
        };
        assert_eq!(style.apply(" word "), " **word** ");
        assert_eq!(style.apply("  "), "  ");
        assert_eq!(RunStyle::default().apply("plain"), "plain");
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(placeholder_name(Some("title")), "TITLE");
        assert_eq!(placeholder_name(Some("subTitle")), "SUBTITLE");
        assert_eq!(placeholder_name(None), "BODY");
        assert_eq!(placeholder_name(Some("pic")), "");
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slides/slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"sp"), b"sp");
    }
}
