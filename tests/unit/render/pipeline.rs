use std::{io::Cursor, path::PathBuf};

use super::*;
use crate::{
    assets::{
        path::FixedHomeDir,
        store::{MemoryImageLoader, PreparedImage},
    },
    composition::model::ParseOptions,
    composition::parse::parse_collage,
};

const XML: &str = r#"<collage version="2" format="2:1" orientation="landscape" theme="grid">
  <spacing value="0"/>
  <node x="0" y="0" w="0.5" h="1" theta="0" scale="1" src="left.png"/>
  <node x="0.5" y="0" w="0.5" h="1" theta="0" scale="1" src="$HomeDir/right.png"/>
</collage>"#;

fn document() -> CollageDocument {
    parse_collage(XML.as_bytes(), &ParseOptions::default())
        .unwrap()
        .with_location("/albums/p/page.cxf")
}

fn resolver() -> PathResolver<FixedHomeDir> {
    PathResolver::new("/albums/p", FixedHomeDir(PathBuf::from("/home/me")))
}

fn small_settings() -> RenderSettings {
    RenderSettings {
        target_width: 40.0,
        ..RenderSettings::default()
    }
}

#[test]
fn default_settings() {
    let s = RenderSettings::default();
    assert_eq!(s.target_width, DEFAULT_RENDER_WIDTH);
    assert_eq!(s.format, OutputFormat::Png);
    assert_eq!(s.jpeg_quality, DEFAULT_JPEG_QUALITY);
    assert!(s.load_images);
}

#[test]
fn env_overrides_apply_when_valid() {
    let s = RenderSettings::default().with_overrides(|k| match k {
        "COLLAGE_RENDER_WIDTH" => Some("640".to_string()),
        "COLLAGE_JPEG_QUALITY" => Some(" 75 ".to_string()),
        _ => None,
    });
    assert_eq!(s.target_width, 640.0);
    assert_eq!(s.jpeg_quality, 75);

    let s = RenderSettings::default().with_overrides(|k| match k {
        "COLLAGE_RENDER_WIDTH" => Some("wide".to_string()),
        "COLLAGE_JPEG_QUALITY" => Some("0".to_string()),
        _ => None,
    });
    assert_eq!(s, RenderSettings::default());
}

#[test]
fn renders_loaded_and_missing_images() {
    let loader = MemoryImageLoader::new().with(
        "/albums/p/left.png",
        PreparedImage::solid(2, 2, [0, 0, 255, 255]),
    );
    let out = render_collage_with(&document(), &small_settings(), &resolver(), &loader).unwrap();

    assert_eq!(out.name.as_deref(), Some("page"));
    assert_eq!((out.frame.width, out.frame.height), (40, 20));
    assert_eq!(out.layout.nodes.len(), 2);
    assert_eq!(out.placeholders, 1);

    let left = out.frame.pixel(10, 10).unwrap();
    assert!(left[2] > 250 && left[0] < 5, "left {left:?}");
    assert_eq!(out.frame.pixel(30, 10), Some([255, 255, 255, 255]));
}

#[test]
fn home_relative_sources_use_the_resolver() {
    let loader = MemoryImageLoader::new().with(
        "/home/me/right.png",
        PreparedImage::solid(2, 2, [0, 255, 0, 255]),
    );
    let out = render_collage_with(&document(), &small_settings(), &resolver(), &loader).unwrap();
    assert_eq!(out.placeholders, 1);
    let right = out.frame.pixel(30, 10).unwrap();
    assert!(right[1] > 250, "right {right:?}");
}

#[test]
fn disabling_images_draws_only_placeholders() {
    let loader = MemoryImageLoader::new().with(
        "/albums/p/left.png",
        PreparedImage::solid(2, 2, [0, 0, 255, 255]),
    );
    let settings = RenderSettings {
        load_images: false,
        ..small_settings()
    };
    let out = render_collage_with(&document(), &settings, &resolver(), &loader).unwrap();
    assert_eq!(out.placeholders, 2);
}

#[test]
fn invalid_width_fails_before_rendering() {
    let settings = RenderSettings {
        target_width: 0.0,
        ..RenderSettings::default()
    };
    let err = render_collage_with(&document(), &settings, &resolver(), &NullImageLoader)
        .unwrap_err();
    assert!(matches!(err, CollageError::InvalidArgument(_)));
}

fn half_transparent_frame() -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data: vec![255, 0, 0, 255, 64, 0, 0, 128],
        premultiplied: true,
    }
}

#[test]
fn png_stores_straight_alpha() {
    let mut buf = Cursor::new(Vec::new());
    encode_frame(&half_transparent_frame(), OutputFormat::Png, 90, &mut buf).unwrap();
    let decoded = image::load_from_memory(buf.get_ref()).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2, 1));
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
    let px = decoded.get_pixel(1, 0).0;
    assert_eq!(px[3], 128);
    assert!(px[0].abs_diff(127) <= 1, "{px:?}");
}

#[test]
fn jpeg_encodes_rgb() {
    let mut buf = Cursor::new(Vec::new());
    encode_frame(&half_transparent_frame(), OutputFormat::Jpeg, 80, &mut buf).unwrap();
    assert_eq!(&buf.get_ref()[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(buf.get_ref()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2, 1));
}

#[test]
fn encode_rejects_short_frame() {
    let frame = FrameRGBA {
        width: 3,
        height: 3,
        data: vec![0; 8],
        premultiplied: true,
    };
    let mut buf = Cursor::new(Vec::new());
    assert!(matches!(
        encode_frame(&frame, OutputFormat::Png, 90, &mut buf),
        Err(CollageError::InvalidArgument(_))
    ));
}

#[test]
fn write_frame_creates_parent_dirs() {
    let dir = PathBuf::from("target").join("unit_write_frame").join("nested");
    let _ = std::fs::remove_dir_all(&dir);
    let path = dir.join("out.png");
    write_frame(&half_transparent_frame(), &path, OutputFormat::Png).unwrap();
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2, 1));
}

#[test]
fn format_extensions() {
    assert_eq!(OutputFormat::Png.extension(), "png");
    assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
}
