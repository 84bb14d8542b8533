use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ParseError, ParseResult};
use crate::escape::unescape;
use crate::lexer::{CommentKind, Lexer};
use crate::parser::EntryParser;

static INDEXED_MSGSTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^msgstr\[([0-9]+)\]$").expect("indexed msgstr pattern"));

/// A recognized entry field key: the closed static set plus the
/// `msgstr[N]` family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKey {
    Comment(CommentKind),
    /// `msgctxt`
    Context,
    /// `msgid`
    Id,
    /// `msgid_plural`
    PluralId,
    /// `msgstr`
    Str,
    /// `msgstr[N]`
    IndexedStr(usize),
}

impl EntryKey {
    /// Map a raw field key (comment marker or keyword) to its variant.
    /// Anything outside the recognized set rejects the entry.
    pub fn parse(key: &str) -> ParseResult<EntryKey> {
        match key {
            "#" => Ok(EntryKey::Comment(CommentKind::Translator)),
            "#." => Ok(EntryKey::Comment(CommentKind::Extracted)),
            "#," => Ok(EntryKey::Comment(CommentKind::Flag)),
            "#|" => Ok(EntryKey::Comment(CommentKind::Previous)),
            "msgctxt" => Ok(EntryKey::Context),
            "msgid" => Ok(EntryKey::Id),
            "msgid_plural" => Ok(EntryKey::PluralId),
            "msgstr" => Ok(EntryKey::Str),
            _ => {
                let index = INDEXED_MSGSTR
                    .captures(key)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse().ok());
                match index {
                    Some(index) => Ok(EntryKey::IndexedStr(index)),
                    None => Err(ParseError::UnknownFieldKey(key.to_string())),
                }
            }
        }
    }
}

/// One PO entry: comment runs plus keyword/string fields, immutable once
/// constructed. Fields keep their raw (still escaped) per-line values in
/// document order; accessors decode on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    fields: Vec<(EntryKey, Vec<String>)>,
}

impl Entry {
    /// Build an entry from the field map collected by the parser.
    pub(crate) fn new(fields: Vec<(String, Vec<String>)>) -> ParseResult<Entry> {
        let mut validated = Vec::with_capacity(fields.len());
        for (key, lines) in fields {
            validated.push((EntryKey::parse(&key)?, lines));
        }
        Ok(Entry { fields: validated })
    }

    /// Raw lines stored for a field, or an empty slice when absent.
    pub fn raw_lines(&self, key: &EntryKey) -> &[String] {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, lines)| lines.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the entry carries the given field.
    pub fn contains(&self, key: &EntryKey) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Field keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &EntryKey> {
        self.fields.iter().map(|(key, _)| key)
    }

    /// Comment text: per-line marker tails joined with newlines, with the
    /// separator character after the marker dropped.
    fn comment_text(&self, kind: CommentKind) -> String {
        self.raw_lines(&EntryKey::Comment(kind))
            .iter()
            .map(|line| strip_separator(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `#` translator comment.
    pub fn translator_comment(&self) -> String {
        self.comment_text(CommentKind::Translator)
    }

    /// `#.` extracted comment.
    pub fn extracted_comment(&self) -> String {
        self.comment_text(CommentKind::Extracted)
    }

    /// Flags from the `#,` comment: comma-separated, lowercase letters and
    /// hyphens only, no duplicates.
    pub fn flags(&self) -> ParseResult<HashSet<String>> {
        let mut flags = HashSet::new();
        for flag in self.comment_text(CommentKind::Flag).split(',') {
            let flag = flag.trim();
            if flag.is_empty() {
                continue;
            }
            if !flag.chars().all(|c| c.is_ascii_lowercase() || c == '-') {
                return Err(ParseError::UnknownFlag(flag.to_string()));
            }
            if flags.contains(flag) {
                return Err(ParseError::DuplicateFlag(flag.to_string()));
            }
            flags.insert(flag.to_string());
        }
        Ok(flags)
    }

    /// The entry a `#|` comment records, re-parsed as an embedded document.
    pub fn previous(&self) -> ParseResult<Option<Entry>> {
        let text = self.comment_text(CommentKind::Previous);
        let mut entries = Vec::new();
        for entry in EntryParser::new(Lexer::new(&text)) {
            entries.push(entry?);
        }
        match entries.len() {
            0 => Ok(None),
            1 => Ok(entries.pop()),
            _ => Err(ParseError::MultiplePreviousEntries),
        }
    }

    /// Keyword field value: adjacent string literals concatenated, then
    /// unescaped as a whole.
    fn keyword_text(&self, key: &EntryKey) -> ParseResult<String> {
        unescape(&self.raw_lines(key).concat())
    }

    /// `msgctxt` value.
    pub fn context(&self) -> ParseResult<String> {
        self.keyword_text(&EntryKey::Context)
    }

    /// `msgid` value.
    pub fn id(&self) -> ParseResult<String> {
        self.keyword_text(&EntryKey::Id)
    }

    /// `msgid_plural` value.
    pub fn plural_id(&self) -> ParseResult<String> {
        self.keyword_text(&EntryKey::PluralId)
    }

    /// `msgstr` value.
    pub fn string(&self) -> ParseResult<String> {
        self.keyword_text(&EntryKey::Str)
    }

    /// `msgstr[index]` value; an absent form resolves to the empty string.
    pub fn plural_form(&self, index: usize) -> ParseResult<String> {
        self.keyword_text(&EntryKey::IndexedStr(index))
    }

    /// Whether the entry declares a plural form (`msgid_plural` present).
    pub fn has_plural(&self) -> bool {
        self.contains(&EntryKey::PluralId)
    }
}

/// Drop the single character that separated a comment marker from its
/// text. The lexer guarantees it is whitespace (or that the tail is empty).
fn strip_separator(line: &str) -> &str {
    let mut chars = line.chars();
    chars.next();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> Entry {
        let mut parser = EntryParser::new(Lexer::new(input));
        let entry = parser.next().expect("no entry").expect("parse failed");
        assert!(parser.next().is_none());
        entry
    }

    #[test]
    fn test_id_and_string() {
        let entry = parse_one("msgid \"x\"\nmsgstr \"y\"");
        assert_eq!(entry.id().unwrap(), "x");
        assert_eq!(entry.string().unwrap(), "y");
    }

    #[test]
    fn test_absent_fields_default_empty() {
        let entry = parse_one("msgid \"x\"\nmsgstr \"y\"");
        assert_eq!(entry.context().unwrap(), "");
        assert_eq!(entry.plural_id().unwrap(), "");
        assert_eq!(entry.translator_comment(), "");
        assert_eq!(entry.flags().unwrap(), HashSet::new());
        assert!(!entry.has_plural());
    }

    #[test]
    fn test_multiline_string_concatenation() {
        let entry = parse_one("msgid \"one \"\n\"two\"\nmsgstr \"\"");
        assert_eq!(entry.id().unwrap(), "one two");
    }

    #[test]
    fn test_unescape_applies_to_whole_value() {
        let entry = parse_one("msgid \"line\\nbreak\"\nmsgstr \"a\\\\b\"");
        assert_eq!(entry.id().unwrap(), "line\nbreak");
        assert_eq!(entry.string().unwrap(), "a\\b");
    }

    #[test]
    fn test_unknown_escape_surfaces_in_accessor() {
        let entry = parse_one("msgid \"bad\\qescape\"\nmsgstr \"y\"");
        assert_eq!(
            entry.id(),
            Err(ParseError::UnknownEscape("\\q".to_string()))
        );
    }

    #[test]
    fn test_comments_joined_with_newline() {
        let entry = parse_one("# first\n# second\nmsgid \"x\"\nmsgstr \"y\"");
        assert_eq!(entry.translator_comment(), "first\nsecond");
    }

    #[test]
    fn test_flags() {
        let entry = parse_one("#, fuzzy, no-wrap\nmsgid \"x\"\nmsgstr \"y\"");
        let flags = entry.flags().unwrap();
        assert!(flags.contains("fuzzy"));
        assert!(flags.contains("no-wrap"));
        assert_eq!(flags.len(), 2);
    }

    #[test]
    fn test_flag_charset_rejected() {
        let entry = parse_one("#, c-format2\nmsgid \"x\"\nmsgstr \"y\"");
        assert_eq!(
            entry.flags(),
            Err(ParseError::UnknownFlag("c-format2".to_string()))
        );
    }

    #[test]
    fn test_duplicate_flag_rejected() {
        let entry = parse_one("#, fuzzy, fuzzy\nmsgid \"x\"\nmsgstr \"y\"");
        assert_eq!(
            entry.flags(),
            Err(ParseError::DuplicateFlag("fuzzy".to_string()))
        );
    }

    #[test]
    fn test_previous_entry() {
        let entry = parse_one("#| msgid \"old text\"\nmsgid \"new text\"\nmsgstr \"y\"");
        let previous = entry.previous().unwrap().expect("previous entry");
        assert_eq!(previous.id().unwrap(), "old text");
    }

    #[test]
    fn test_no_previous_entry() {
        let entry = parse_one("msgid \"x\"\nmsgstr \"y\"");
        assert_eq!(entry.previous().unwrap(), None);
    }

    #[test]
    fn test_multiple_previous_entries_rejected() {
        let input = "#| msgid \"a\"\n#| msgstr \"b\"\n#|\n#| msgid \"c\"\n#| msgstr \"d\"\nmsgid \"x\"\nmsgstr \"y\"";
        let entry = parse_one(input);
        assert_eq!(entry.previous(), Err(ParseError::MultiplePreviousEntries));
    }

    #[test]
    fn test_plural_forms() {
        let entry = parse_one(
            "msgid \"file\"\nmsgid_plural \"files\"\nmsgstr[0] \"fichier\"\nmsgstr[1] \"fichiers\"",
        );
        assert!(entry.has_plural());
        assert_eq!(entry.plural_id().unwrap(), "files");
        assert_eq!(entry.plural_form(0).unwrap(), "fichier");
        assert_eq!(entry.plural_form(1).unwrap(), "fichiers");
        // Absent forms resolve to the empty string rather than failing.
        assert_eq!(entry.plural_form(7).unwrap(), "");
    }

    #[test]
    fn test_entry_key_parse() {
        assert_eq!(EntryKey::parse("msgid").unwrap(), EntryKey::Id);
        assert_eq!(
            EntryKey::parse("msgstr[12]").unwrap(),
            EntryKey::IndexedStr(12)
        );
        assert_eq!(
            EntryKey::parse("#.").unwrap(),
            EntryKey::Comment(CommentKind::Extracted)
        );
        assert!(matches!(
            EntryKey::parse("msgstr[x]"),
            Err(ParseError::UnknownFieldKey(_))
        ));
        assert!(matches!(
            EntryKey::parse("msgfoo"),
            Err(ParseError::UnknownFieldKey(_))
        ));
    }
}
