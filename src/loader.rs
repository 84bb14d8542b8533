use crate::Catalog;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Load a catalog from a single PO file
///
/// # Arguments
/// * `path` - Path to the PO file
///
/// # Returns
/// The parsed `Catalog`
///
/// # Errors
/// - File not found
/// - Invalid PO syntax
/// - File read errors
pub fn load_catalog_from_file(path: &Path) -> Result<Catalog, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;

    Catalog::parse(&content)
        .map_err(|e| format!("Failed to parse PO data from '{}': {}", path.display(), e))
}

/// Load all catalogs from a directory of PO files
///
/// Scans the directory for all `*.po` files and loads them.
/// The filename (without extension) is used as the locale code.
/// For example: `fr.po` -> locale `"fr"`, `zh-hans.po` -> locale `"zh-hans"`
///
/// # Arguments
/// * `dir` - Directory path containing PO files
///
/// # Returns
/// A HashMap mapping locale codes to catalogs
///
/// # Errors
/// - Directory not found
/// - File read/parse errors
pub fn load_all_catalogs_from_dir(dir: &Path) -> Result<HashMap<String, Catalog>, String> {
    if !dir.exists() {
        return Err(format!("Directory not found: {}", dir.display()));
    }

    if !dir.is_dir() {
        return Err(format!("Path is not a directory: {}", dir.display()));
    }

    let mut all_catalogs = HashMap::new();

    let entries = fs::read_dir(dir)
        .map_err(|e| format!("Failed to read directory '{}': {}", dir.display(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Error reading directory entry: {}", e))?;

        let path = entry.path();

        if path.extension().and_then(|ext| ext.to_str()) != Some("po") {
            continue;
        }

        // Extract locale from filename (e.g., "fr.po" -> "fr")
        let locale = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| format!("Invalid filename: {}", path.display()))?
            .to_string();

        let catalog = load_catalog_from_file(&path)?;

        all_catalogs.insert(locale, catalog);
    }

    if all_catalogs.is_empty() {
        eprintln!("Warning: No PO files found in directory {}", dir.display());
    }

    Ok(all_catalogs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!("po-catalog-{}-{}", name, std::process::id()));
            fs::create_dir_all(&path).expect("create temp dir");
            TempDir(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    const SAMPLE: &str = concat!(
        "msgid \"\"\n",
        "msgstr \"Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n",
        "\n",
        "msgid \"Hello\"\n",
        "msgstr \"Bonjour\"\n",
    );

    #[test]
    fn test_load_catalog_from_file() {
        let dir = TempDir::new("file");
        let path = dir.0.join("fr.po");
        fs::write(&path, SAMPLE).expect("write sample");

        let catalog = load_catalog_from_file(&path).unwrap();
        assert_eq!(catalog.gettext("Hello").unwrap(), "Bonjour");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_catalog_from_file(Path::new("/nonexistent/fr.po"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_po_reports_path() {
        let dir = TempDir::new("invalid");
        let path = dir.0.join("broken.po");
        fs::write(&path, "msgid \"a\"\nmsgid \"a\"\nmsgstr \"x\"\n").expect("write sample");

        let err = load_catalog_from_file(&path).unwrap_err();
        assert!(err.contains("broken.po"), "unexpected error: {}", err);
    }

    #[test]
    fn test_load_all_catalogs_from_dir() {
        let dir = TempDir::new("dir");
        fs::write(dir.0.join("fr.po"), SAMPLE).expect("write fr");
        fs::write(
            dir.0.join("de.po"),
            "msgid \"Hello\"\nmsgstr \"Hallo\"\n",
        )
        .expect("write de");
        fs::write(dir.0.join("notes.txt"), "ignored").expect("write txt");

        let catalogs = load_all_catalogs_from_dir(&dir.0).unwrap();
        assert_eq!(catalogs.len(), 2);
        assert_eq!(catalogs["fr"].gettext("Hello").unwrap(), "Bonjour");
        assert_eq!(catalogs["de"].gettext("Hello").unwrap(), "Hallo");
    }

    #[test]
    fn test_load_from_missing_dir() {
        let result = load_all_catalogs_from_dir(Path::new("/nonexistent/locales"));
        assert!(result.is_err());
    }
}
