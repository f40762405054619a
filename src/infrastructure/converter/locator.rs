use std::path::PathBuf;
use tracing::debug;

/// Finds the external converter binary. Returning `None` means the
/// capability is unavailable right now.
pub trait CapabilityLocator: Send + Sync {
    fn locate(&self) -> Option<PathBuf>;
}

const WELL_KNOWN_PATHS: &[&str] = &[
    "/Applications/LibreOffice.app/Contents/MacOS/soffice",
    "/usr/local/bin/soffice",
    "/opt/homebrew/bin/soffice",
    "/usr/bin/soffice",
];

const PATH_NAMES: &[&str] = &["soffice", "libreoffice"];

/// Looks for LibreOffice: configured override first, then the usual install
/// locations, then `PATH`.
#[derive(Debug, Clone)]
pub struct SofficeLocator {
    override_path: Option<PathBuf>,
    candidates: Vec<PathBuf>,
    search_path: bool,
}

impl SofficeLocator {
    pub fn new(override_path: Option<PathBuf>) -> Self {
        Self {
            override_path,
            candidates: WELL_KNOWN_PATHS.iter().map(PathBuf::from).collect(),
            search_path: true,
        }
    }

    /// Only consider `path`. Used when the binary location is fixed.
    pub fn fixed(path: PathBuf) -> Self {
        Self {
            override_path: Some(path),
            candidates: Vec::new(),
            search_path: false,
        }
    }
}

impl CapabilityLocator for SofficeLocator {
    fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = &self.override_path {
            if path.is_file() {
                return Some(path.clone());
            }
            debug!(path = %path.display(), "configured soffice path does not exist");
        }

        if let Some(found) = self.candidates.iter().find(|p| p.is_file()) {
            return Some(found.clone());
        }

        if self.search_path {
            return PATH_NAMES.iter().find_map(|name| which::which(name).ok());
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_locator_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("soffice");

        let locator = SofficeLocator::fixed(bin.clone());
        assert_eq!(locator.locate(), None);

        std::fs::write(&bin, b"").unwrap();
        assert_eq!(locator.locate(), Some(bin));
    }

    #[test]
    fn override_wins_over_search() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("my-soffice");
        std::fs::write(&bin, b"").unwrap();

        let locator = SofficeLocator::new(Some(bin.clone()));
        assert_eq!(locator.locate(), Some(bin));
    }
}
