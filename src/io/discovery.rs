//! Depth-bounded walk of the working directory for the planner prompt.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Render the project structure as `Directory:` / `[DIR]` / `[FILE]` lines.
///
/// Entries are sorted for deterministic output. Hidden entries (leading dot)
/// are skipped to keep the prompt bounded. Recursion stops at `max_depth`
/// levels below `root`.
pub fn discover_project_structure(root: &Path, max_depth: usize) -> Result<String> {
    let mut lines = Vec::new();
    walk(root, Path::new("."), 0, max_depth, &mut lines)?;
    Ok(lines.join("\n"))
}

fn walk(
    dir: &Path,
    rel: &Path,
    depth: usize,
    max_depth: usize,
    lines: &mut Vec<String>,
) -> Result<()> {
    lines.push(format!("Directory: {}", rel.display()));

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat {name} in {}", dir.display()))?;
        if file_type.is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();

    for name in &dirs {
        lines.push(format!("  [DIR] {name}"));
    }
    for name in &files {
        lines.push(format!("  [FILE] {name}"));
    }

    if depth < max_depth {
        for name in &dirs {
            walk(&dir.join(name), &rel.join(name), depth + 1, max_depth, lines)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sorted_entries_with_markers() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("src")).expect("mkdir");
        fs::write(temp.path().join("src/main.rs"), "").expect("write");
        fs::write(temp.path().join("README.md"), "").expect("write");

        let structure = discover_project_structure(temp.path(), 3).expect("discover");
        let lines: Vec<&str> = structure.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Directory: .",
                "  [DIR] src",
                "  [FILE] README.md",
                "Directory: ./src",
                "  [FILE] main.rs",
            ]
        );
    }

    #[test]
    fn skips_hidden_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join(".git")).expect("mkdir");
        fs::write(temp.path().join(".env"), "").expect("write");
        fs::write(temp.path().join("visible.txt"), "").expect("write");

        let structure = discover_project_structure(temp.path(), 3).expect("discover");
        assert!(!structure.contains(".git"));
        assert!(!structure.contains(".env"));
        assert!(structure.contains("[FILE] visible.txt"));
    }

    #[test]
    fn stops_at_max_depth() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("a/b/c")).expect("mkdir");
        fs::write(temp.path().join("a/b/c/deep.txt"), "").expect("write");

        let structure = discover_project_structure(temp.path(), 1).expect("discover");
        assert!(structure.contains("Directory: ./a"));
        assert!(structure.contains("[DIR] b"));
        assert!(!structure.contains("Directory: ./a/b"));
        assert!(!structure.contains("deep.txt"));
    }
}
