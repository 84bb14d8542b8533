//! Parser for gettext PO translation catalogs.
//!
//! A catalog is parsed in one forward pass into immutable entries with
//! message lookup on top, including plural selection driven by the
//! `Plural-Forms` header expression:
//!
//! ```
//! use po_catalog::Catalog;
//!
//! let catalog = Catalog::parse(concat!(
//!     "msgid \"\"\n",
//!     "msgstr \"Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n",
//!     "\n",
//!     "msgid \"Hello\"\n",
//!     "msgstr \"Bonjour\"\n",
//! ))
//! .unwrap();
//!
//! assert_eq!(catalog.gettext("Hello").unwrap(), "Bonjour");
//! assert_eq!(catalog.gettext("Missing").unwrap(), "Missing");
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

pub mod entry;
pub mod error;
pub mod escape;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod plural;

pub use entry::{Entry, EntryKey};
pub use error::{CatalogError, ParseError, PluralError};
pub use escape::unescape;
pub use lexer::{CommentKind, Lexer, Token};
pub use loader::{load_all_catalogs_from_dir, load_catalog_from_file};
pub use parser::{EntryParser, parse_entries};
pub use plural::PluralRule;

/// A parsed PO catalog: entries indexed by id and plural id, plus the
/// header metadata of the empty-id entry.
///
/// Built once, read-only afterwards; the plural rule is compiled on first
/// plural lookup and cached for the catalog's lifetime.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Entry>,
    by_id: HashMap<String, usize>,
    by_plural_id: HashMap<String, usize>,
    metadata: HashMap<String, String>,
    plural_rule: OnceLock<PluralRule>,
}

impl Catalog {
    /// Parse a catalog from PO document text.
    pub fn parse(input: &str) -> Result<Catalog, CatalogError> {
        let mut entries = Vec::new();
        let mut by_id = HashMap::new();
        let mut by_plural_id = HashMap::new();

        for entry in EntryParser::new(Lexer::new(input)) {
            let entry = entry?;
            let index = entries.len();
            by_id.insert(entry.id()?, index);
            if entry.has_plural() {
                by_plural_id.insert(entry.plural_id()?, index);
            }
            entries.push(entry);
        }

        // The empty-id entry is the header; its string is metadata lines.
        let mut metadata = HashMap::new();
        if let Some(index) = by_id.remove("") {
            for line in entries[index].string()?.split('\n') {
                let parts: Vec<&str> = line.split(':').collect();
                if parts.len() < 2 {
                    continue;
                }
                let value = parts[1..]
                    .iter()
                    .map(|part| part.trim())
                    .collect::<Vec<_>>()
                    .join(" : ");
                metadata.insert(parts[0].trim().to_string(), value);
            }
        }

        Ok(Catalog {
            entries,
            by_id,
            by_plural_id,
            metadata,
            plural_rule: OnceLock::new(),
        })
    }

    /// Header metadata from the empty-id entry.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// All parsed entries in document order, header included.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Translation for `key`, or the key echoed back when the catalog has
    /// no entry for it.
    pub fn gettext(&self, key: &str) -> Result<String, CatalogError> {
        match self.by_id.get(key) {
            Some(&index) => Ok(self.entries[index].string()?),
            None => Ok(key.to_string()),
        }
    }

    /// Plural-aware translation: the entry is found under `singular` when
    /// `n == 1` and under `plural` otherwise, and the stored form is
    /// selected by the compiled `Plural-Forms` rule. A missing entry
    /// echoes `singular` or `plural` back by the same cardinal test.
    pub fn ngettext(&self, singular: &str, plural: &str, n: u64) -> Result<String, CatalogError> {
        let index = if n == 1 {
            self.by_id.get(singular)
        } else {
            self.by_plural_id.get(plural)
        };
        let Some(&index) = index else {
            return Ok(if n == 1 { singular } else { plural }.to_string());
        };
        let form = self.plural_rule()?.evaluate(n);
        Ok(self.entries[index].plural_form(form)?)
    }

    /// Context-aware translation.
    // TODO: implement msgctxt-keyed lookup; falls back to `gettext` until
    // then.
    pub fn pgettext(&self, _context: &str, key: &str) -> Result<String, CatalogError> {
        self.gettext(key)
    }

    /// Context-aware plural translation.
    // TODO: implement msgctxt-keyed lookup; falls back to `ngettext` until
    // then.
    pub fn npgettext(
        &self,
        _context: &str,
        singular: &str,
        plural: &str,
        n: u64,
    ) -> Result<String, CatalogError> {
        self.ngettext(singular, plural, n)
    }

    /// The compiled plural rule, built from the header on first use.
    pub fn plural_rule(&self) -> Result<&PluralRule, CatalogError> {
        if let Some(rule) = self.plural_rule.get() {
            return Ok(rule);
        }
        let header = self
            .metadata
            .get("Plural-Forms")
            .ok_or(PluralError::MalformedPluralFormsHeader)?;
        let rule = PluralRule::from_header(header)?;
        Ok(self.plural_rule.get_or_init(|| rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRENCH: &str = concat!(
        "msgid \"\"\n",
        "msgstr \"\"\n",
        "\"Project-Id-Version: demo 1.0\\n\"\n",
        "\"Content-Type: text/plain; charset=UTF-8\\n\"\n",
        "\"Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n",
        "\n",
        "#. extracted\n",
        "#, fuzzy\n",
        "msgid \"Hello\"\n",
        "msgstr \"Bonjour\"\n",
        "\n",
        "msgid \"file\"\n",
        "msgid_plural \"files\"\n",
        "msgstr[0] \"fichier\"\n",
        "msgstr[1] \"fichiers\"\n",
    );

    #[test]
    fn test_gettext() {
        let catalog = Catalog::parse(FRENCH).unwrap();
        assert_eq!(catalog.gettext("Hello").unwrap(), "Bonjour");
    }

    #[test]
    fn test_gettext_echoes_missing_key() {
        let catalog = Catalog::parse(FRENCH).unwrap();
        assert_eq!(catalog.gettext("Goodbye").unwrap(), "Goodbye");
    }

    #[test]
    fn test_entry_accessors_end_to_end() {
        let catalog = Catalog::parse(FRENCH).unwrap();
        let entry = catalog
            .entries()
            .find(|e| e.id().unwrap() == "Hello")
            .expect("entry");
        assert_eq!(entry.extracted_comment(), "extracted");
        assert!(entry.flags().unwrap().contains("fuzzy"));
        assert_eq!(entry.string().unwrap(), "Bonjour");
    }

    #[test]
    fn test_ngettext_selects_forms() {
        let catalog = Catalog::parse(FRENCH).unwrap();
        assert_eq!(catalog.ngettext("file", "files", 1).unwrap(), "fichier");
        assert_eq!(catalog.ngettext("file", "files", 5).unwrap(), "fichiers");
        assert_eq!(catalog.ngettext("file", "files", 0).unwrap(), "fichiers");
    }

    #[test]
    fn test_ngettext_echoes_missing_entry() {
        let catalog = Catalog::parse(FRENCH).unwrap();
        assert_eq!(catalog.ngettext("dog", "dogs", 1).unwrap(), "dog");
        assert_eq!(catalog.ngettext("dog", "dogs", 3).unwrap(), "dogs");
    }

    #[test]
    fn test_header_metadata() {
        let catalog = Catalog::parse(FRENCH).unwrap();
        assert_eq!(
            catalog
                .metadata()
                .get("Project-Id-Version")
                .map(String::as_str),
            Some("demo 1.0")
        );
        // Later colon-separated parts are trimmed and rejoined.
        assert_eq!(
            catalog.metadata().get("Content-Type").map(String::as_str),
            Some("text/plain; charset=UTF-8")
        );
        assert!(!catalog.by_id.contains_key(""));
    }

    #[test]
    fn test_metadata_lines_without_colon_ignored() {
        let catalog = Catalog::parse(concat!(
            "msgid \"\"\n",
            "msgstr \"no colon here\\n\"\n",
            "\"Language: fr\\n\"\n",
        ))
        .unwrap();
        assert_eq!(catalog.metadata().len(), 1);
        assert_eq!(
            catalog.metadata().get("Language").map(String::as_str),
            Some("fr")
        );
    }

    #[test]
    fn test_ngettext_without_header_fails() {
        let catalog = Catalog::parse(concat!(
            "msgid \"file\"\n",
            "msgid_plural \"files\"\n",
            "msgstr[0] \"fichier\"\n",
            "msgstr[1] \"fichiers\"\n",
        ))
        .unwrap();
        assert_eq!(
            catalog.ngettext("file", "files", 2),
            Err(CatalogError::Plural(PluralError::MalformedPluralFormsHeader))
        );
    }

    #[test]
    fn test_ngettext_missing_form_resolves_empty() {
        let catalog = Catalog::parse(concat!(
            "msgid \"\"\n",
            "msgstr \"Plural-Forms: nplurals=3; plural=(n==1 ? 0 : n==2 ? 1 : 2);\\n\"\n",
            "\n",
            "msgid \"file\"\n",
            "msgid_plural \"files\"\n",
            "msgstr[0] \"fichier\"\n",
            "msgstr[1] \"fichiers\"\n",
        ))
        .unwrap();
        assert_eq!(catalog.ngettext("file", "files", 9).unwrap(), "");
    }

    #[test]
    fn test_pgettext_falls_back_without_context() {
        let catalog = Catalog::parse(FRENCH).unwrap();
        assert_eq!(catalog.pgettext("menu", "Hello").unwrap(), "Bonjour");
        assert_eq!(
            catalog.npgettext("menu", "file", "files", 5).unwrap(),
            "fichiers"
        );
    }

    #[test]
    fn test_plural_rule_cached() {
        let catalog = Catalog::parse(FRENCH).unwrap();
        let first = catalog.plural_rule().unwrap() as *const PluralRule;
        let second = catalog.plural_rule().unwrap() as *const PluralRule;
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_error_aborts_whole_catalog() {
        let input = "msgid \"a\"\nmsgstr \"1\"\n\nmsgid \"b\"\nmsgid \"b\"\nmsgstr \"2\"\n";
        assert!(matches!(
            Catalog::parse(input),
            Err(CatalogError::Parse(ParseError::DuplicateKeyword(_)))
        ));
    }

    #[test]
    fn test_catalog_is_send_and_sync() {
        fn check<T: Send + Sync>() {}
        check::<Catalog>();
    }
}
