use std::path::{Path, PathBuf};

use anyhow::Context as _;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use crate::{
    composition::model::{Background, CollageDocument, CollageNode, ParseOptions},
    foundation::{
        color::decode_hex_color,
        core::{Area, AspectRatio, Orientation},
        error::{CollageError, CollageResult},
    },
};

/// Minimal element tree; collage files are small and flat.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text.trim().to_owned())
            .filter(|t| !t.is_empty())
    }

    /// Attribute value, falling back to a child element's text.
    fn attr_or_child(&self, name: &str) -> Option<String> {
        self.attr(name)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .or_else(|| self.child_text(name))
    }
}

fn element_from_start(start: &BytesStart<'_>) -> CollageResult<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr =
            attr.map_err(|e| CollageError::parse(format!("attribute error in <{name}>: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| CollageError::parse(format!("attribute '{key}' in <{name}>: {e}")))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        ..Element::default()
    })
}

fn read_tree(bytes: &[u8]) -> CollageResult<Element> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            CollageError::parse(format!(
                "xml error at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Start(e) => stack.push(element_from_start(&e)?),
            Event::Empty(e) => {
                let el = element_from_start(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(el),
                    None => root = root.or(Some(el)),
                }
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| CollageError::parse("unbalanced closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(el),
                    None => root = root.or(Some(el)),
                }
            }
            Event::Text(t) => {
                if let Some(el) = stack.last_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| CollageError::parse(format!("text error: {e}")))?;
                    el.text.push_str(&text);
                }
            }
            Event::CData(t) => {
                if let Some(el) = stack.last_mut() {
                    el.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(CollageError::parse("unexpected end of document"));
    }
    root.ok_or_else(|| CollageError::parse("document has no root element"))
}

fn required<'a>(el: &'a Element, name: &str) -> CollageResult<&'a str> {
    el.attr(name).ok_or_else(|| CollageError::missing(name))
}

fn parse_f64(value: &str, name: &str) -> CollageResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CollageError::malformed(name))
}

fn parse_flag(el: &Element, name: &str) -> CollageResult<bool> {
    match el.attr(name).map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(_) => Err(CollageError::malformed(name)),
    }
}

fn parse_node(el: &Element) -> CollageResult<CollageNode> {
    let num = |name: &str| -> CollageResult<f64> { parse_f64(required(el, name)?, name) };

    let area = Area::new(num("x")?, num("y")?, num("w")?, num("h")?);
    let theta = num("theta")?;
    let scale = num("scale")?;
    let source = el
        .attr_or_child("src")
        .ok_or_else(|| CollageError::missing("src"))?;
    let id = el
        .attr("uid")
        .or_else(|| el.attr("id"))
        .map(str::to_owned);
    let theme = el.attr("theme").map(str::to_owned);

    let node = CollageNode {
        area,
        theta,
        scale,
        source,
        id,
        theme,
    };
    tracing::debug!(
        source = %node.source,
        x = area.x,
        y = area.y,
        w = area.width,
        h = area.height,
        theta,
        "parsed node"
    );
    Ok(node)
}

/// Decode a `.cxf` collage document.
///
/// The root element must be `collage` and carry `version="2"`; any structural or
/// attribute problem aborts the whole document.
pub fn parse_collage(bytes: &[u8], opts: &ParseOptions) -> CollageResult<CollageDocument> {
    let root = read_tree(bytes)?;
    if root.name != "collage" {
        return Err(CollageError::parse(format!(
            "expected <collage> root element, found <{}>",
            root.name
        )));
    }

    let version = required(&root, "version")?;
    let format_version = version
        .trim()
        .parse::<u32>()
        .map_err(|_| CollageError::malformed("version"))?;
    if format_version != crate::composition::model::SUPPORTED_VERSION {
        return Err(CollageError::UnsupportedVersion(format_version));
    }

    let aspect_ratio = AspectRatio::parse(required(&root, "format")?)?;
    let orientation = Orientation::parse(required(&root, "orientation")?)?;
    let theme = required(&root, "theme")?.to_owned();
    if opts.rejected_themes.iter().any(|t| t == &theme) {
        return Err(CollageError::UnsupportedTheme(theme));
    }

    let shadows = parse_flag(&root, "shadows")?;
    let captions = parse_flag(&root, "captions")?;

    let spacing = match root.child("spacing") {
        Some(el) => {
            let v = parse_f64(required(el, "value")?, "spacing")?;
            if v < 0.0 {
                return Err(CollageError::malformed("spacing"));
            }
            v
        }
        None => 0.0,
    };

    let background = match root.child("background") {
        Some(el) => {
            let color = el
                .attr("color")
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| decode_hex_color(c, opts.color_order))
                .transpose()?;
            Some(Background {
                color,
                source: el.attr_or_child("src"),
            })
        }
        None => None,
    };

    let nodes = root
        .children_named("node")
        .map(parse_node)
        .collect::<CollageResult<Vec<_>>>()?;

    let doc = CollageDocument {
        format_version,
        orientation,
        theme,
        aspect_ratio,
        shadows,
        captions,
        spacing,
        background,
        album_title: root.child_text("albumTitle"),
        album_date: root.child_text("albumDate"),
        album_id: root.child_text("albumUID"),
        nodes,
        location: None,
    };
    doc.validate(opts)?;

    tracing::debug!(
        format = %doc.aspect_ratio,
        orientation = ?doc.orientation,
        nodes = doc.nodes.len(),
        spacing = doc.spacing,
        "parsed collage"
    );
    Ok(doc)
}

/// Read and decode a collage file, recording its canonical location.
pub fn load_collage(path: impl AsRef<Path>, opts: &ParseOptions) -> CollageResult<CollageDocument> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("read collage '{}'", path.display()))?;
    let location = std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .with_context(|| format!("resolve collage path '{}'", path.display()))?;
    Ok(parse_collage(&bytes, opts)?.with_location(location))
}

/// Extension of Picasa library bundles.
pub const LIBRARY_EXTENSION: &str = "picasalibrary";

/// Collage files named by `path`.
///
/// A `.picasalibrary` bundle directory expands to the `.cxf` files in its `Collages`
/// directory, sorted by name. Any other path comes back unchanged.
pub fn collage_files(path: impl AsRef<Path>) -> CollageResult<Vec<PathBuf>> {
    let path = path.as_ref();
    let is_library = path.is_dir() && path.extension().is_some_and(|e| e == LIBRARY_EXTENSION);
    if !is_library {
        return Ok(vec![path.to_path_buf()]);
    }

    let dir = path.join("Collages");
    let entries =
        std::fs::read_dir(&dir).with_context(|| format!("list collages in '{}'", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let file = entry
            .with_context(|| format!("list collages in '{}'", dir.display()))?
            .path();
        if file.is_file() && file.extension().is_some_and(|e| e.eq_ignore_ascii_case("cxf")) {
            files.push(file);
        }
    }
    files.sort();

    tracing::debug!(library = %path.display(), count = files.len(), "expanded collage library");
    Ok(files)
}

#[cfg(test)]
#[path = "../../tests/unit/composition/parse.rs"]
mod tests;
