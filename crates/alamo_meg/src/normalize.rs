//! Path normalization applied to archive paths before they are hashed.

use std::fmt::Debug;

use crate::encoding::Encoding;
use crate::error::{Error, Result};

/// Rewrites a path into the form stored in, and looked up from, an archive
pub trait PathNormalizer: Debug {
    /// Returns the normalized form of `path`
    fn normalize(&self, path: &str) -> String;
}

/// Uppercase paths with forward slashes
#[derive(Debug, Default, Copy, Clone)]
pub struct DefaultNormalizer;

impl PathNormalizer for DefaultNormalizer {
    fn normalize(&self, path: &str) -> String {
        path.replace('\\', "/").to_uppercase()
    }
}

/// Uppercase paths with backslashes and no leading separator, which is how the game looks files up
#[derive(Debug, Default, Copy, Clone)]
pub struct EngineNormalizer;

impl PathNormalizer for EngineNormalizer {
    fn normalize(&self, path: &str) -> String {
        path.trim_start_matches(['/', '\\'])
            .replace('/', "\\")
            .to_uppercase()
    }
}

/// Rejects paths that cannot be stored in an archive or would escape an extraction directory.
pub fn check_path(path: &str, encoding: Encoding) -> Result<()> {
    let invalid = |reason: &str| Err(Error::InvalidArgument(format!("path {path:?} {reason}")));

    if path.trim().is_empty() {
        return invalid("is empty");
    }
    if path.chars().any(char::is_control) {
        return invalid("contains control characters");
    }
    if path.starts_with(['/', '\\']) || path.chars().nth(1) == Some(':') {
        return invalid("is rooted");
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return invalid("leaves its directory");
    }
    if encoding.byte_count(path) > u16::MAX as usize {
        return invalid("is too long");
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{check_path, DefaultNormalizer, EngineNormalizer, PathNormalizer};
    use crate::encoding::Encoding;

    #[test]
    fn default_normalizer() {
        assert_eq!(
            DefaultNormalizer.normalize("Data\\Art/textures\\Unit.dds"),
            "DATA/ART/TEXTURES/UNIT.DDS"
        );
    }

    #[test]
    fn engine_normalizer() {
        assert_eq!(
            EngineNormalizer.normalize("/data/xml/GameObjectFiles.xml"),
            "DATA\\XML\\GAMEOBJECTFILES.XML"
        );
    }

    #[test]
    fn valid_paths() {
        assert!(check_path("DATA/ART/UNIT.DDS", Encoding::Ascii).is_ok());
        assert!(check_path("DATA\\..HIDDEN\\A.TXT", Encoding::Ascii).is_ok());
    }

    #[test]
    fn invalid_paths() {
        for path in [
            "",
            "   ",
            "A\tB",
            "/DATA/A.TXT",
            "\\DATA\\A.TXT",
            "C:\\DATA\\A.TXT",
            "DATA/../A.TXT",
        ] {
            assert!(check_path(path, Encoding::Ascii).is_err(), "{path:?}");
        }
        assert!(check_path(&"A".repeat(70_000), Encoding::Ascii).is_err());
    }
}
