use std::path::{Path, PathBuf};

use crate::composition::model::CollageDocument;

/// Prefix marking a home-relative image source.
pub const HOME_TOKEN: char = '$';
/// Optional marker following [`HOME_TOKEN`], e.g. `$HomeDir/Pictures/a.jpg`.
pub const HOME_MARKER: &str = "HomeDir/";

/// Source of the current user's home directory.
pub trait HomeDirProvider {
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Reads `HOME`, falling back to `USERPROFILE`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvHomeDir;

impl HomeDirProvider for EnvHomeDir {
    fn home_dir(&self) -> Option<PathBuf> {
        ["HOME", "USERPROFILE"]
            .into_iter()
            .filter_map(std::env::var_os)
            .find(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

/// A fixed home directory.
#[derive(Clone, Debug)]
pub struct FixedHomeDir(pub PathBuf);

impl HomeDirProvider for FixedHomeDir {
    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Resolves image sources of one collage document.
#[derive(Clone, Debug)]
pub struct PathResolver<H = EnvHomeDir> {
    base_dir: PathBuf,
    home: H,
}

impl<H: HomeDirProvider> PathResolver<H> {
    pub fn new(base_dir: impl Into<PathBuf>, home: H) -> Self {
        Self {
            base_dir: base_dir.into(),
            home,
        }
    }

    /// Resolver rooted at the directory containing `doc`.
    pub fn for_document(doc: &CollageDocument, home: H) -> Self {
        Self::new(doc.base_dir(), home)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `source` to a location; existence is not checked.
    ///
    /// `$` and `$HomeDir/` prefixes resolve under the home directory. When no home
    /// directory is available the stripped remainder resolves against the document.
    pub fn resolve(&self, source: &str) -> PathBuf {
        match strip_home_prefix(source) {
            Some(rest) => match self.home.home_dir() {
                Some(home) => home.join(rest),
                None => {
                    tracing::warn!(source, "no home directory; resolving against collage");
                    self.base_dir.join(rest)
                }
            },
            None => self.base_dir.join(source),
        }
    }
}

/// Remainder of a home-relative source, or `None` if `source` is not home-relative.
pub fn strip_home_prefix(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(HOME_TOKEN)?;
    Some(rest.strip_prefix(HOME_MARKER).unwrap_or(rest))
}

/// Longest directory shared by all `paths`.
///
/// Each path is taken as a file location, so a lone path yields its parent directory.
/// Returns `None` for an empty set or when the paths share no leading component.
pub fn common_ancestor<I, P>(paths: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut prefix: Option<PathBuf> = None;
    for p in paths {
        let dir = p.as_ref().parent().unwrap_or_else(|| Path::new(""));
        prefix = Some(match prefix {
            None => dir.to_path_buf(),
            Some(prev) => shared_components(&prev, dir),
        });
    }
    prefix.filter(|p| !p.as_os_str().is_empty())
}

fn shared_components(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}

/// Directory containing every image the document references.
///
/// External collaborators use this to request filesystem access once per collage.
pub fn image_directory<H: HomeDirProvider>(
    doc: &CollageDocument,
    resolver: &PathResolver<H>,
) -> Option<PathBuf> {
    common_ancestor(doc.image_sources().map(|s| resolver.resolve(s)))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/path.rs"]
mod tests;
