//! File-set analysis.

use rayon::prelude::*;
use tracing::debug;

use super::{Hit, Rule, ScanError, SourceReader};

/// Scan `files` in the given order and return every hit, file then line.
///
/// A file that cannot be read aborts the scan; a stale file list is a
/// configuration bug.
pub fn analyze<S, R>(files: &[S], reader: &R, rule: &Rule) -> Result<Vec<Hit>, ScanError>
where
    S: AsRef<str>,
    R: SourceReader + ?Sized,
{
    let mut hits = Vec::new();

    for file in files {
        hits.extend(scan_file(file.as_ref(), reader, rule)?);
    }

    debug!(rule = rule.name(), files = files.len(), hits = hits.len(), "analyzed file set");
    Ok(hits)
}

/// Same as [`analyze`], scanning files in parallel.
///
/// Output order is identical to the sequential version.
pub fn analyze_parallel<S, R>(files: &[S], reader: &R, rule: &Rule) -> Result<Vec<Hit>, ScanError>
where
    S: AsRef<str> + Sync,
    R: SourceReader + ?Sized,
{
    let per_file: Vec<Vec<Hit>> = files
        .par_iter()
        .map(|file| scan_file(file.as_ref(), reader, rule))
        .collect::<Result<_, _>>()?;

    let hits: Vec<Hit> = per_file.into_iter().flatten().collect();
    debug!(rule = rule.name(), files = files.len(), hits = hits.len(), "analyzed file set in parallel");
    Ok(hits)
}

fn scan_file<R>(path: &str, reader: &R, rule: &Rule) -> Result<Vec<Hit>, ScanError>
where
    R: SourceReader + ?Sized,
{
    let content = reader.read_source(path)?;
    Ok(rule.scan_source(path, &content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{DepthPredicate, MemoryReader};

    fn reader() -> MemoryReader {
        MemoryReader::new()
            .with_file("b.js", "let b = 1;\nconst x = 2;\nlet c = 3;\n")
            .with_file("a.js", "const a = 1;\nlet d = 4;\n")
    }

    #[test]
    fn test_analyze_preserves_file_order() {
        let rule = Rule::from_strs("let", &[r"\blet\s"]).unwrap();
        let hits = analyze(&["b.js", "a.js"], &reader(), &rule).unwrap();
        let locations: Vec<String> = hits.iter().map(|h| h.location()).collect();
        assert_eq!(locations, vec!["b.js:1", "b.js:3", "a.js:2"]);
    }

    #[test]
    fn test_analyze_missing_file_is_error() {
        let rule = Rule::from_strs("let", &[r"\blet\s"]).unwrap();
        let err = analyze(&["a.js", "gone.js"], &reader(), &rule).unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound { ref path } if path == "gone.js"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut reader = MemoryReader::new();
        let mut files = Vec::new();
        for i in 0..40 {
            let path = format!("src/f{:02}.js", i);
            reader.insert(
                path.clone(),
                format!("xs.map((x) => {{\n  ys.find(f{});\n}});\nlet v{} = 1;\n", i, i),
            );
            files.push(path);
        }
        let rule = Rule::from_strs("lookup", &[r"\.find\("])
            .unwrap()
            .within(DepthPredicate::InsideIteration);

        let sequential = analyze(&files, &reader, &rule).unwrap();
        let parallel = analyze_parallel(&files, &reader, &rule).unwrap();
        assert_eq!(sequential.len(), 40);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_hit_lines_within_bounds() {
        let rule = Rule::from_strs("any", &[r"."]).unwrap();
        let reader = reader();
        let hits = analyze(&["b.js"], &reader, &rule).unwrap();
        let line_count = reader.read_source("b.js").unwrap().lines().count();
        assert!(hits.iter().all(|h| h.line >= 1 && h.line <= line_count));
        assert_eq!(hits.len(), line_count);
    }
}
