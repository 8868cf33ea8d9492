//! File classification by path

use super::types::FileCategory;
use std::path::Path;

/// Directory names whose contents are never worth the budget:
/// build output, tests, vendored code, dependency caches, VCS metadata
const IGNORED_DIRS: &[&str] = &[
    "dist",
    "build",
    "target",
    "tests",
    "__tests__",
    "vendor",
    "third_party",
    "node_modules",
    "__pycache__",
    ".venv",
    ".git",
    ".hg",
    ".svn",
];

const LOCK_FILES: &[&str] = &[
    "package-lock.json",
    "poetry.lock",
    "yarn.lock",
    "Gemfile.lock",
    "composer.lock",
    "Cargo.lock",
    "Pipfile.lock",
    "pnpm-lock.yaml",
    "go.sum",
];

const LOGIC_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "mjs", "cjs", "go", "rs", "c", "h", "cc", "cpp", "hpp", "cs",
    "java", "kt", "scala", "rb", "php", "swift", "dart", "lua", "vue", "svelte",
];

const CONFIG_EXTENSIONS: &[&str] = &[
    "json",
    "yml",
    "yaml",
    "toml",
    "ini",
    "xml",
    "env",
    "conf",
    "cfg",
    "properties",
];

const DOCS_EXTENSIONS: &[&str] = &["md", "txt", "rst", "adoc"];

/// Categorize a file by its path.
///
/// Ignored directories win over everything else, so `tests/test_app.py` is
/// `Ignored` even though `.py` is a logic extension. Extensions are compared
/// case-insensitively; dotfiles such as `.env` have no extension.
pub fn categorize_file(file_path: &str) -> FileCategory {
    if file_path
        .split('/')
        .any(|segment| IGNORED_DIRS.contains(&segment))
    {
        return FileCategory::Ignored;
    }

    let path = Path::new(file_path);
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if LOCK_FILES.contains(&filename) {
        return FileCategory::Lock;
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let ext = ext.as_str();

    if LOGIC_EXTENSIONS.contains(&ext) {
        FileCategory::Logic
    } else if CONFIG_EXTENSIONS.contains(&ext) {
        FileCategory::Config
    } else if DOCS_EXTENSIONS.contains(&ext) {
        FileCategory::Docs
    } else if ext == "lock" {
        FileCategory::Lock
    } else {
        FileCategory::Unknown
    }
}

/// Sort paths most important first; ties keep their input order
pub fn sort_files<S: AsRef<str>>(file_paths: &[S]) -> Vec<&str> {
    let mut sorted: Vec<&str> = file_paths.iter().map(AsRef::as_ref).collect();
    sorted.sort_by_key(|path| categorize_file(path).priority());
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_logic_file() {
        assert_eq!(categorize_file("main.py"), FileCategory::Logic);
        assert_eq!(categorize_file("script.js"), FileCategory::Logic);
        assert_eq!(categorize_file("src/utils.ts"), FileCategory::Logic);
        assert_eq!(categorize_file("src/Lib.RS"), FileCategory::Logic);
    }

    #[test]
    fn test_categorize_config_file() {
        assert_eq!(categorize_file("config.json"), FileCategory::Config);
        assert_eq!(categorize_file("docker-compose.yml"), FileCategory::Config);
        assert_eq!(categorize_file("prod.env"), FileCategory::Config);
    }

    #[test]
    fn test_categorize_lock_file() {
        assert_eq!(categorize_file("poetry.lock"), FileCategory::Lock);
        assert_eq!(categorize_file("package-lock.json"), FileCategory::Lock);
        assert_eq!(categorize_file("web/pnpm-lock.yaml"), FileCategory::Lock);
        assert_eq!(categorize_file("flake.lock"), FileCategory::Lock);
    }

    #[test]
    fn test_categorize_ignored_file() {
        assert_eq!(categorize_file("dist/bundle.js"), FileCategory::Ignored);
        assert_eq!(categorize_file("tests/test_app.py"), FileCategory::Ignored);
        assert_eq!(
            categorize_file("node_modules/left-pad/package-lock.json"),
            FileCategory::Ignored
        );
    }

    #[test]
    fn test_categorize_docs_and_unknown() {
        assert_eq!(categorize_file("README.md"), FileCategory::Docs);
        assert_eq!(categorize_file("docs/guide.rst"), FileCategory::Docs);
        assert_eq!(categorize_file("Makefile"), FileCategory::Unknown);
        assert_eq!(categorize_file(".env"), FileCategory::Unknown);
        assert_eq!(categorize_file("unknown"), FileCategory::Unknown);
        assert_eq!(categorize_file("logo.png"), FileCategory::Unknown);
    }

    #[test]
    fn test_ignored_dir_must_match_whole_segment() {
        assert_eq!(categorize_file("src/distance.py"), FileCategory::Logic);
        assert_eq!(categorize_file("testsuite/run.py"), FileCategory::Logic);
    }

    #[test]
    fn test_sort_files() {
        let files = ["poetry.lock", "README.md", "main.py", "config.json"];
        let sorted = sort_files(&files);
        assert_eq!(sorted, vec!["main.py", "config.json", "README.md", "poetry.lock"]);
    }

    #[test]
    fn test_sort_files_is_stable() {
        let files = vec![
            "dist/a.js".to_string(),
            "b.py".to_string(),
            "Makefile".to_string(),
            "a.py".to_string(),
            "build/b.js".to_string(),
        ];
        let sorted = sort_files(&files);
        assert_eq!(
            sorted,
            vec!["b.py", "a.py", "Makefile", "dist/a.js", "build/b.js"]
        );
    }
}
