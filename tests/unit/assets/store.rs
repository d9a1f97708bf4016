use std::cell::Cell;

use super::*;

struct CountingLoader {
    calls: Cell<u32>,
}

impl ImageLoader for CountingLoader {
    fn load(&self, path: &Path) -> Option<PreparedImage> {
        self.calls.set(self.calls.get() + 1);
        if path.ends_with("missing.jpg") {
            None
        } else {
            Some(PreparedImage::solid(2, 2, [255, 0, 0, 255]))
        }
    }
}

#[test]
fn image_set_loads_each_path_once() {
    let loader = CountingLoader {
        calls: Cell::new(0),
    };
    let mut set = ImageSet::new();
    let a = set.intern(Path::new("/p/a.jpg"), &loader).unwrap();
    let again = set.intern(Path::new("/p/a.jpg"), &loader).unwrap();
    let b = set.intern(Path::new("/p/b.jpg"), &loader).unwrap();

    assert_eq!(a, again);
    assert_ne!(a, b);
    assert_eq!(loader.calls.get(), 2);
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(b).unwrap().width, 2);
}

#[test]
fn failed_loads_are_not_cached_as_images() {
    let loader = CountingLoader {
        calls: Cell::new(0),
    };
    let mut set = ImageSet::new();
    assert!(set.intern(Path::new("/p/missing.jpg"), &loader).is_none());
    assert!(set.is_empty());
    assert!(set.get(ImageId(0)).is_err());
}

#[test]
fn fs_loader_reports_missing_files_as_none() {
    assert!(
        FsImageLoader
            .load(Path::new("target/definitely/not/here.png"))
            .is_none()
    );
}

#[test]
fn fs_loader_decodes_written_png() {
    let dir = PathBuf::from("target").join("unit_fs_loader");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("px.png");
    image::RgbaImage::from_pixel(4, 3, image::Rgba([0, 255, 0, 255]))
        .save(&path)
        .unwrap();

    let img = FsImageLoader.load(&path).unwrap();
    assert_eq!((img.width, img.height), (4, 3));
    assert_eq!(&img.rgba8_premul[..4], &[0, 255, 0, 255]);
}

#[test]
fn memory_and_null_loaders() {
    let mem = MemoryImageLoader::new().with("/a.png", PreparedImage::solid(1, 1, [0, 0, 0, 255]));
    assert!(mem.load(Path::new("/a.png")).is_some());
    assert!(mem.load(Path::new("/b.png")).is_none());
    assert!(NullImageLoader.load(Path::new("/a.png")).is_none());
}
