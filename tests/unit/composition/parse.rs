use super::*;
use crate::foundation::color::{ByteOrder, Color};

const BASIC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<collage version="2" format="297:210" orientation="portrait" theme="picturegrid" shadows="1">
  <albumTitle>Summer</albumTitle>
  <albumDate>2017-04-26</albumDate>
  <albumUID>8f0c2b</albumUID>
  <spacing value="0.25"/>
  <background color="FF336699" src="$HomeDir/Pictures/paper.jpg"/>
  <node x="0" y="0" w="0.5" h="0.5" theta="0" scale="1" uid="n1">
    <src>$HomeDir/Pictures/a.jpg</src>
  </node>
  <node x="0.5" y="0" w="0.5" h="0.5" theta="-0.1" scale="1.2" src="photos/b.jpg" theme="none"/>
</collage>
"#;

fn doc(xml: &str) -> CollageResult<CollageDocument> {
    parse_collage(xml.as_bytes(), &ParseOptions::default())
}

#[test]
fn parses_all_document_fields() {
    let d = doc(BASIC).unwrap();
    assert_eq!(d.format_version, 2);
    assert_eq!(d.orientation, Orientation::Portrait);
    assert_eq!(d.theme, "picturegrid");
    assert!((d.aspect_ratio.value() - 297.0 / 210.0).abs() < 1e-12);
    assert!(d.shadows);
    assert!(!d.captions);
    assert_eq!(d.spacing, 0.25);
    assert_eq!(d.album_title(), Some("Summer"));
    assert_eq!(d.album_date(), Some("2017-04-26"));
    assert_eq!(d.album_id(), Some("8f0c2b"));

    let bg = d.background.as_ref().unwrap();
    assert_eq!(bg.color.unwrap().to_rgba8(), [0x33, 0x66, 0x99, 0xFF]);
    assert_eq!(bg.source.as_deref(), Some("$HomeDir/Pictures/paper.jpg"));
    assert!(d.location.is_none());
}

#[test]
fn nodes_keep_document_order_and_src_forms() {
    let d = doc(BASIC).unwrap();
    assert_eq!(d.nodes.len(), 2);

    let a = &d.nodes[0];
    assert_eq!(a.area, Area::new(0.0, 0.0, 0.5, 0.5));
    assert_eq!(a.source, "$HomeDir/Pictures/a.jpg");
    assert_eq!(a.id.as_deref(), Some("n1"));

    let b = &d.nodes[1];
    assert_eq!(b.theta, -0.1);
    assert_eq!(b.scale, 1.2);
    assert_eq!(b.source, "photos/b.jpg");
    assert_eq!(b.theme.as_deref(), Some("none"));
}

#[test]
fn unsupported_version_produces_no_document() {
    let xml = BASIC.replace(r#"version="2""#, r#"version="3""#);
    assert!(matches!(doc(&xml), Err(CollageError::UnsupportedVersion(3))));

    let xml = BASIC.replace(r#"version="2""#, r#"version="two""#);
    assert!(matches!(doc(&xml), Err(CollageError::MalformedAttribute(ref n)) if n == "version"));
}

#[test]
fn missing_root_attributes_are_reported_by_name() {
    let xml = BASIC.replace(r#" orientation="portrait""#, "");
    assert!(matches!(doc(&xml), Err(CollageError::MissingAttribute(ref n)) if n == "orientation"));

    let xml = BASIC.replace(r#" format="297:210""#, "");
    assert!(matches!(doc(&xml), Err(CollageError::MissingAttribute(ref n)) if n == "format"));
}

#[test]
fn node_without_geometry_fails_the_document() {
    let xml = BASIC.replace(r#"x="0.5" y="0" w="0.5""#, r#"x="0.5" y="0""#);
    assert!(matches!(doc(&xml), Err(CollageError::MissingAttribute(ref n)) if n == "w"));

    let xml = BASIC.replace(r#"theta="-0.1""#, r#"theta="tilted""#);
    assert!(matches!(doc(&xml), Err(CollageError::MalformedAttribute(ref n)) if n == "theta"));

    let xml = BASIC.replace(r#" src="photos/b.jpg""#, "");
    assert!(matches!(doc(&xml), Err(CollageError::MissingAttribute(ref n)) if n == "src"));
}

#[test]
fn malformed_background_color_fails() {
    let xml = BASIC.replace("FF336699", "FF33669");
    assert!(matches!(doc(&xml), Err(CollageError::MalformedColor(_))));
}

#[test]
fn rgba_byte_order_is_configurable() {
    let opts = ParseOptions {
        color_order: ByteOrder::Rgba,
        ..ParseOptions::default()
    };
    let xml = BASIC.replace("FF336699", "000000FF");
    let d = parse_collage(xml.as_bytes(), &opts).unwrap();
    assert_eq!(d.background.unwrap().color, Some(Color::BLACK));
}

#[test]
fn optional_elements_default() {
    let xml = r#"<collage version="2" format="4:3" orientation="landscape" theme="t">
        <node x="0" y="0" w="1" h="1" theta="0" scale="1"><src>a.jpg</src></node>
    </collage>"#;
    let d = doc(xml).unwrap();
    assert!(!d.shadows);
    assert_eq!(d.spacing, 0.0);
    assert!(d.background.is_none());
    assert_eq!(d.background_fill(), Some(Color::WHITE));
    assert!(d.album_title().is_none());
}

#[test]
fn rejected_theme_and_empty_documents() {
    let opts = ParseOptions {
        rejected_themes: vec!["picturegrid".to_string()],
        ..ParseOptions::default()
    };
    assert!(matches!(
        parse_collage(BASIC.as_bytes(), &opts),
        Err(CollageError::UnsupportedTheme(ref t)) if t == "picturegrid"
    ));

    let empty = r#"<collage version="2" format="4:3" orientation="landscape" theme="t"/>"#;
    assert!(matches!(doc(empty), Err(CollageError::Parse(_))));

    let lenient = ParseOptions {
        require_nodes: false,
        ..ParseOptions::default()
    };
    assert!(parse_collage(empty.as_bytes(), &lenient).unwrap().nodes.is_empty());
}

#[test]
fn negative_spacing_and_bad_roots_fail() {
    let xml = BASIC.replace(r#"value="0.25""#, r#"value="-1""#);
    assert!(matches!(doc(&xml), Err(CollageError::MalformedAttribute(ref n)) if n == "spacing"));

    assert!(matches!(doc("<album/>"), Err(CollageError::Parse(_))));
    assert!(matches!(doc(""), Err(CollageError::Parse(_))));
    assert!(matches!(doc("<collage version=\"2\">"), Err(CollageError::Parse(_))));
}

#[test]
fn load_collage_records_location() {
    let dir = std::path::PathBuf::from("target").join("unit_load_collage");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("summer.cxf");
    std::fs::write(&path, BASIC).unwrap();

    let d = load_collage(&path, &ParseOptions::default()).unwrap();
    let location = d.location.clone().unwrap();
    assert!(location.is_absolute());
    assert_eq!(d.name().as_deref(), Some("summer"));
    assert!(d.base_dir().ends_with("unit_load_collage"));

    let missing = load_collage(dir.join("nope.cxf"), &ParseOptions::default());
    assert!(matches!(missing, Err(CollageError::Other(_))));
}

#[test]
fn library_bundles_expand_to_their_collages() {
    let lib = std::path::PathBuf::from("target").join("unit_library.picasalibrary");
    let _ = std::fs::remove_dir_all(&lib);
    let collages = lib.join("Collages");
    std::fs::create_dir_all(collages.join("nested.cxf")).unwrap();
    for name in ["b.cxf", "a.CXF", "a.jpg"] {
        std::fs::write(collages.join(name), BASIC).unwrap();
    }

    let files = collage_files(&lib).unwrap();
    assert_eq!(files, vec![collages.join("a.CXF"), collages.join("b.cxf")]);

    let plain = collages.join("b.cxf");
    assert_eq!(collage_files(&plain).unwrap(), vec![plain.clone()]);
    assert_eq!(collage_files(&collages).unwrap(), vec![collages.clone()]);

    let empty = std::path::PathBuf::from("target").join("unit_empty.picasalibrary");
    std::fs::create_dir_all(&empty).unwrap();
    assert!(matches!(collage_files(&empty), Err(CollageError::Other(_))));
}
