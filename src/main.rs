use clap::{Arg, Command};
use po_catalog::{Catalog, EntryKey, load_catalog_from_file};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct EntryDump {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    plural_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    plural_forms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    flags: Vec<String>,
}

fn dump_entries(catalog: &Catalog) -> Result<Vec<EntryDump>, Box<dyn std::error::Error>> {
    let mut dump = Vec::new();
    for entry in catalog.entries() {
        let id = entry.id()?;
        if id.is_empty() {
            // Header entry; its content is available via --info.
            continue;
        }
        let mut plural_forms = Vec::new();
        let mut index = 0;
        while entry.contains(&EntryKey::IndexedStr(index)) {
            plural_forms.push(entry.plural_form(index)?);
            index += 1;
        }
        let mut flags: Vec<String> = entry.flags()?.into_iter().collect();
        flags.sort();
        dump.push(EntryDump {
            id,
            context: non_empty(entry.context()?),
            string: entry.string()?,
            plural_id: non_empty(entry.plural_id()?),
            plural_forms,
            flags,
        });
    }
    Ok(dump)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("po-catalog")
        .version("0.1.0")
        .about("Query gettext PO translation catalogs")
        .arg(
            Arg::new("file")
                .help("Path to the PO catalog")
                .required(true)
                .index(1),
        )
        .arg(Arg::new("key").help("Message key to look up").index(2))
        .arg(
            Arg::new("plural")
                .long("plural")
                .short('p')
                .help("Plural message key, used together with --count"),
        )
        .arg(
            Arg::new("count")
                .long("count")
                .short('n')
                .help("Cardinal driving plural-form selection")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Dump all entries as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("info")
                .long("info")
                .help("Print the header metadata")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let file = matches.get_one::<String>("file").unwrap();
    let catalog = load_catalog_from_file(Path::new(file))?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&dump_entries(&catalog)?)?);
        return Ok(());
    }

    if matches.get_flag("info") {
        let mut keys: Vec<_> = catalog.metadata().keys().collect();
        keys.sort();
        for key in keys {
            println!("{}: {}", key, catalog.metadata()[key]);
        }
        return Ok(());
    }

    let key = matches.get_one::<String>("key");
    let plural = matches.get_one::<String>("plural");
    let count = matches.get_one::<u64>("count");
    match (key, plural, count) {
        (Some(key), Some(plural), Some(&count)) => {
            println!("{}", catalog.ngettext(key, plural, count)?);
        }
        (Some(key), _, _) => {
            println!("{}", catalog.gettext(key)?);
        }
        (None, _, _) => {
            let total = catalog.entries().count();
            println!("{}: {} entries", file, total);
        }
    }

    Ok(())
}
