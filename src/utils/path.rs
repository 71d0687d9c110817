//! Path helpers for sources and outputs

use std::path::{Path, PathBuf};

/// Suffix appended to the source stem when no output is given
pub const TRIMMED_SUFFIX: &str = "_trimmed";

/// `<dir>/<stem>_trimmed.<ext>` next to `source`
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match source.extension() {
        Some(ext) => format!("{}{}.{}", stem, TRIMMED_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, TRIMMED_SUFFIX),
    };
    source.with_file_name(name)
}

/// Whether two paths name the same file, resolving them when they exist
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/videos/talk.mp4")),
            PathBuf::from("/videos/talk_trimmed.mp4")
        );
        assert_eq!(
            default_output_path(Path::new("clip")),
            PathBuf::from("clip_trimmed")
        );
    }

    #[test]
    fn test_same_file_resolves_relative_segments() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.mp4");
        std::fs::write(&file, b"x").unwrap();
        let indirect = dir.path().join(".").join("a.mp4");
        assert!(same_file(&file, &indirect));
        assert!(!same_file(&file, &dir.path().join("b.mp4")));
    }
}
