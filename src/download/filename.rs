//! Filename derivation for persisted artifacts.

use std::path::{Component, Path, PathBuf};

use crate::record::ArtifactFormat;

/// Maximum number of characters kept from a title.
pub const MAX_FILENAME_STEM_CHARS: usize = 100;

/// Maximum length in bytes of a single path component on common filesystems.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Bytes held back for a collision suffix such as `_999`.
const SUFFIX_RESERVE_BYTES: usize = 4;

/// Stem used when a title sanitizes to nothing.
const EMPTY_STEM: &str = "untitled";

/// Builds the artifact filename for `title` in `format`.
///
/// Characters illegal in file paths (`\ / * ? : " < > |` and control
/// characters) are removed, whitespace runs collapse to single spaces, and the
/// stem is capped at [`MAX_FILENAME_STEM_CHARS`] characters before the
/// extension is appended. Multi-byte titles are cut further, at a character
/// boundary, so the name plus a collision suffix stays within
/// [`MAX_FILENAME_BYTES`].
#[must_use]
pub fn artifact_filename(title: &str, format: ArtifactFormat) -> String {
    let extension = format.extension();
    let stem_budget = MAX_FILENAME_BYTES - SUFFIX_RESERVE_BYTES - extension.len();
    format!("{}{extension}", sanitize_title(title, stem_budget))
}

fn sanitize_title(title: &str, max_bytes: usize) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| {
            !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|') && !c.is_control()
        })
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut truncated: String = collapsed.chars().take(MAX_FILENAME_STEM_CHARS).collect();
    while truncated.len() > max_bytes {
        truncated.pop();
    }
    // Windows rejects trailing dots and spaces.
    let stem = truncated.trim().trim_end_matches(['.', ' ']);

    if stem.is_empty() || !is_safe_filename_segment(stem) {
        EMPTY_STEM.to_string()
    } else {
        stem.to_string()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Candidate path for the `n`th duplicate of `filename` (`name_2.pdf`, ...).
pub(crate) fn suffixed_path(dir: &Path, filename: &str, n: usize) -> PathBuf {
    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    };
    dir.join(format!("{stem}_{n}{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_filename_removes_illegal_chars() {
        assert_eq!(
            artifact_filename(r#"A/B\C: "D"? <E>|F*"#, ArtifactFormat::Pdf),
            "ABC D EF.pdf"
        );
    }

    #[test]
    fn test_artifact_filename_appends_format_extension() {
        assert_eq!(artifact_filename("Paper", ArtifactFormat::Html), "Paper.html");
        assert_eq!(artifact_filename("Paper", ArtifactFormat::Pdf), "Paper.pdf");
    }

    #[test]
    fn test_artifact_filename_caps_length_in_chars() {
        let title = "é".repeat(250);
        let name = artifact_filename(&title, ArtifactFormat::Pdf);
        assert_eq!(name.chars().count(), MAX_FILENAME_STEM_CHARS + ".pdf".len());
    }

    #[test]
    fn test_artifact_filename_fits_byte_limit_for_cjk_titles() {
        let title = "量子".repeat(60);
        let name = artifact_filename(&title, ArtifactFormat::Pdf);
        assert!(name.len() <= MAX_FILENAME_BYTES - SUFFIX_RESERVE_BYTES, "{} bytes", name.len());
        assert!(name.starts_with("量子量子"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_artifact_filename_fits_byte_limit_for_four_byte_chars() {
        let title = "🔬".repeat(100);
        let name = artifact_filename(&title, ArtifactFormat::Html);
        let stem = name.strip_suffix(".html").expect("html extension");
        assert!(!stem.is_empty());
        assert!(stem.chars().all(|c| c == '🔬'));

        let suffixed = suffixed_path(Path::new("/out"), &name, 999);
        let component = suffixed.file_name().expect("file name").len();
        assert!(component <= MAX_FILENAME_BYTES, "{component} bytes");
    }

    #[test]
    fn test_artifact_filename_collapses_newlines() {
        assert_eq!(
            artifact_filename("Quantum\n  Error\tCorrection", ArtifactFormat::Pdf),
            "Quantum Error Correction.pdf"
        );
    }

    #[test]
    fn test_artifact_filename_rejects_dot_segments() {
        assert_eq!(artifact_filename("..", ArtifactFormat::Pdf), "untitled.pdf");
        assert_eq!(artifact_filename("///", ArtifactFormat::Pdf), "untitled.pdf");
        assert_eq!(artifact_filename("Ends with dot.", ArtifactFormat::Pdf), "Ends with dot.pdf");
    }

    #[test]
    fn test_artifact_filename_preserves_unicode() {
        assert_eq!(
            artifact_filename("Schrödinger 猫", ArtifactFormat::Html),
            "Schrödinger 猫.html"
        );
    }

    #[test]
    fn test_suffixed_path_inserts_counter_before_extension() {
        let dir = Path::new("/out");
        assert_eq!(suffixed_path(dir, "Paper.pdf", 2), PathBuf::from("/out/Paper_2.pdf"));
        assert_eq!(suffixed_path(dir, "Paper", 3), PathBuf::from("/out/Paper_3"));
    }
}
