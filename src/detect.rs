/// Recognition of LCOV tracefiles among arbitrary files in a coverage
/// directory.
///
/// Strategy:
///   1. Check file extension for strong hints
///   2. Peek at the first bytes of the file content
use std::path::Path;

/// How many bytes of a file are inspected for content-based detection.
pub const HEAD_LEN: usize = 4096;

/// Whether `path` (with the first bytes `head` of its content) looks like an
/// LCOV tracefile.
pub fn is_tracefile(path: &Path, head: &[u8]) -> bool {
    has_tracefile_extension(path) || looks_like_lcov(head)
}

pub fn has_tracefile_extension(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_lowercase(),
        None => return false,
    };
    matches!(ext.as_str(), "dat" | "info" | "lcov")
}

fn looks_like_lcov(content: &[u8]) -> bool {
    let head_len = content.len().min(HEAD_LEN);
    let head = String::from_utf8_lossy(&content[..head_len]);

    // Check that lines actually start with these tags to avoid false positives
    // on files that merely contain these strings.
    let has_sf = head.lines().any(|l| l.starts_with("SF:"));
    let has_da_or_fn = head
        .lines()
        .any(|l| l.starts_with("DA:") || l.starts_with("FN:"));
    has_sf && has_da_or_fn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert!(is_tracefile(Path::new("coverage.dat"), b""));
        assert!(is_tracefile(Path::new("out/coverage.info"), b""));
        assert!(is_tracefile(Path::new("report.LCOV"), b""));
    }

    #[test]
    fn test_detect_by_content() {
        let content = b"TN:test\nSF:/src/lib.rs\nDA:1,5\nend_of_record\n";
        assert!(is_tracefile(Path::new("coverage.txt"), content));
    }

    #[test]
    fn test_detect_requires_line_prefixes() {
        let content = b"this mentions SF: and DA: inline only";
        assert!(!is_tracefile(Path::new("notes.txt"), content));
    }

    #[test]
    fn test_detect_unknown() {
        assert!(!is_tracefile(Path::new("random.xml"), b"<coverage/>"));
        assert!(!is_tracefile(Path::new("Makefile"), b""));
    }
}
