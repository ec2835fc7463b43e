use anyhow::{bail, Context};
use chrono::Utc;
use hashvdb::{
    cosine_similarity, embed, embedding_preview, format_similarity, Entry, EntryStore, SearchResult,
    SimilarityTier,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Command {
    Add { text: String },
    Search { query: String },
    Show { id: String },
    List,
    Count,
    Delete { id: String },
    Clear,
    Export { path: Option<PathBuf> },
    Import { path: PathBuf },
}

/// Parse one shell line into a command
/// Text arguments keep their inner whitespace, which affects the embedding
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Err("No command provided. Use: add, search, list, count, show, delete, clear, export, import".to_string());
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "add" => parse_add(rest),
        "search" => parse_search(rest),
        "show" => parse_id("show", rest).map(|id| Command::Show { id }),
        "list" => parse_no_args("list", rest, Command::List),
        "count" => parse_no_args("count", rest, Command::Count),
        "delete" => parse_id("delete", rest).map(|id| Command::Delete { id }),
        "clear" => parse_no_args("clear", rest, Command::Clear),
        "export" => parse_export(rest),
        "import" => parse_import(rest),
        _ => Err(format!(
            "Unknown command: {}. Available: add, search, list, count, show, delete, clear, export, import",
            command
        )),
    }
}

/// Parse the 'add' command
/// Usage: add <text>
fn parse_add(rest: &str) -> Result<Command, String> {
    if rest.is_empty() {
        return Err("'add' command requires some text. Usage: add <text>".to_string());
    }

    Ok(Command::Add { text: rest.to_string() })
}

/// Parse the 'search' command
/// Usage: search <query>
fn parse_search(rest: &str) -> Result<Command, String> {
    if rest.is_empty() {
        return Err("'search' command requires a query. Usage: search <query>".to_string());
    }

    Ok(Command::Search { query: rest.to_string() })
}

fn parse_id(command: &str, rest: &str) -> Result<String, String> {
    match rest.split_whitespace().next() {
        Some(id) => Ok(id.to_string()),
        None => Err(format!("'{}' command requires an ID. Usage: {} <id>", command, command)),
    }
}

fn parse_no_args(command: &str, rest: &str, parsed: Command) -> Result<Command, String> {
    if !rest.is_empty() {
        eprintln!("Warning: '{}' command takes no arguments, ignoring extras", command);
    }

    Ok(parsed)
}

/// Parse the 'export' command
/// Usage: export [path]
fn parse_export(rest: &str) -> Result<Command, String> {
    let path = if rest.is_empty() { None } else { Some(PathBuf::from(rest)) };
    Ok(Command::Export { path })
}

/// Parse the 'import' command
/// Usage: import <path>
fn parse_import(rest: &str) -> Result<Command, String> {
    if rest.is_empty() {
        return Err("'import' command requires a file path. Usage: import <path>".to_string());
    }

    Ok(Command::Import { path: PathBuf::from(rest) })
}

/// Default export file name, e.g. `vectordb-export-1700000000000.json`
pub fn default_export_path() -> PathBuf {
    PathBuf::from(format!("vectordb-export-{}.json", Utc::now().timestamp_millis()))
}

/// Write the store's entries to `path` as a JSON array
pub fn export_to_file(store: &EntryStore, path: &Path) -> anyhow::Result<()> {
    if store.is_empty() {
        bail!("No entries to export");
    }

    let json = store.serialize()?;
    fs::write(path, json).with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(())
}

/// Replace the store's entries with the contents of an export file
pub fn import_from_file(store: &mut EntryStore, path: &Path) -> anyhow::Result<usize> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let count = store.deserialize(&json)?;
    Ok(count)
}

/// Shell mode - interactive session; the store lives until the shell exits
pub fn run_shell(store: &mut EntryStore) {
    println!("HashVDB - Session Vector Database");
    println!("Entries live only for this session. Type 'help' for commands, 'exit' or 'quit' to quit\n");

    loop {
        print!("hashvdb> ");
        if let Err(error) = io::stdout().flush() {
            eprintln!("Error writing prompt: {}", error);
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }

        if input == "help" {
            print_help();
            continue;
        }

        let command = match parse_command(input) {
            Ok(cmd) => cmd,
            Err(error) => {
                eprintln!("Error: {}", error);
                continue;
            }
        };

        execute_command(store, command);
    }
}

/// One-shot: print the embedding of `text`
pub fn run_embed(text: &str, full: bool) -> anyhow::Result<()> {
    let embedding = embed(text);
    if full {
        println!("{}", serde_json::to_string(&embedding)?);
    } else {
        println!("[{}] {}", embedding.len(), embedding_preview(&embedding));
    }
    Ok(())
}

/// One-shot: print the similarity of two texts
pub fn run_compare(left: &str, right: &str) -> anyhow::Result<()> {
    let score = cosine_similarity(&embed(left), &embed(right))?;
    println!("{:.6} ({}, {})", score, format_similarity(score), SimilarityTier::from_score(score));
    Ok(())
}

/// One-shot: load an export file and rank its entries against `query`
pub fn run_search(path: &Path, query: &str) -> anyhow::Result<()> {
    let mut store = EntryStore::new();
    import_from_file(&mut store, path)?;

    let results = store.search(query)?;
    print_results(&results);
    Ok(())
}

fn execute_command(store: &mut EntryStore, command: Command) {
    match command {
        Command::Add { text } => {
            match store.add_text(&text) {
                Ok(entry) => println!("Added entry {} ({})", entry.short_id(), embedding_preview(&entry.embedding)),
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::Search { query } => {
            match store.search(&query) {
                Ok(results) => print_results(&results),
                Err(error) => eprintln!("Error: {}", error),
            }
        }

        Command::Show { id } => {
            match find_entry(store, &id) {
                Some(entry) => {
                    println!("ID:        {}", entry.id);
                    println!("Text:      {}", entry.text);
                    println!("Created:   {}", format_timestamp(entry));
                    println!("Embedding: [{}] {}", entry.embedding.len(), embedding_preview(&entry.embedding));
                }
                None => eprintln!("Error: Entry '{}' not found", id),
            }
        }

        Command::List => {
            let entries = store.list();
            if entries.is_empty() {
                println!("No entries in database yet");
            } else {
                println!("All entries:");
                for entry in entries {
                    println!("  {}  {}  {}", entry.short_id(), format_timestamp(entry), entry.text);
                }
                println!("Total: {} entries", store.count());
            }
        }

        Command::Count => println!("{}", store.count()),

        Command::Delete { id } => {
            let deleted = match find_entry(store, &id).map(|e| e.id.clone()) {
                Some(full_id) => store.delete_by_id(&full_id),
                None => false,
            };

            if deleted {
                println!("Entry deleted");
            } else {
                eprintln!("Error: Entry '{}' not found", id);
            }
        }

        Command::Clear => {
            if store.is_empty() {
                eprintln!("Error: No entries to clear");
            } else {
                let count = store.count();
                store.clear();
                println!("All {} entries cleared", count);
            }
        }

        Command::Export { path } => {
            let path = path.unwrap_or_else(default_export_path);
            match export_to_file(store, &path) {
                Ok(()) => println!("Exported {} entries to '{}'", store.count(), path.display()),
                Err(error) => eprintln!("Error: {:#}", error),
            }
        }

        Command::Import { path } => {
            match import_from_file(store, &path) {
                Ok(count) => println!("Imported {} entries from '{}'", count, path.display()),
                Err(error) => eprintln!("Error: {:#}", error),
            }
        }
    }
}

/// Look up by full id, or by a prefix that matches exactly one entry
fn find_entry<'a>(store: &'a EntryStore, id: &str) -> Option<&'a Entry> {
    if let Some(entry) = store.get(id) {
        return Some(entry);
    }

    let mut matches = store.list().iter().filter(|e| e.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(entry), None) => Some(entry),
        _ => None,
    }
}

fn format_timestamp(entry: &Entry) -> String {
    match entry.created_at() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => entry.timestamp.to_string(),
    }
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No search results");
        return;
    }

    println!("Top {} results:", results.len());
    for (rank, result) in results.iter().enumerate() {
        println!("{}. [{}] {} ({}) {}",
            rank + 1,
            result.entry.short_id(),
            format_similarity(result.similarity),
            SimilarityTier::from_score(result.similarity),
            result.entry.text);
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  add <text>         - Vectorize text and add it to the session");
    println!("  search <query>     - Show the 10 entries most similar to the query");
    println!("  list               - List all entries");
    println!("  count              - Show entry count");
    println!("  show <id>          - Show an entry (full id or unique prefix)");
    println!("  delete <id>        - Delete an entry (full id or unique prefix)");
    println!("  clear              - Delete all entries");
    println!("  export [path]      - Export entries to a JSON file");
    println!("  import <path>      - Replace entries with a JSON export");
    println!("  help               - Show this help");
    println!("  exit, quit         - Exit the program");
}

#[cfg(test)]
mod cli_test {
    use super::*;

    #[test]
    fn test_parse_add_keeps_inner_whitespace() {
        match parse_command("add  the   quick\tfox ") {
            Ok(Command::Add { text }) => assert_eq!(text, "the   quick\tfox"),
            _ => panic!("Expected add command"),
        }
    }

    #[test]
    fn test_parse_add_requires_text() {
        assert!(parse_command("add").is_err());
        assert!(parse_command("add    ").is_err());
    }

    #[test]
    fn test_parse_search() {
        match parse_command("search rust borrow checker") {
            Ok(Command::Search { query }) => assert_eq!(query, "rust borrow checker"),
            _ => panic!("Expected search command"),
        }
    }

    #[test]
    fn test_parse_id_commands() {
        assert!(matches!(parse_command("delete abc123"), Ok(Command::Delete { id }) if id == "abc123"));
        assert!(matches!(parse_command("show abc123"), Ok(Command::Show { id }) if id == "abc123"));
        assert!(parse_command("delete").is_err());
    }

    #[test]
    fn test_parse_export_optional_path() {
        assert!(matches!(parse_command("export"), Ok(Command::Export { path: None })));
        assert!(matches!(
            parse_command("export out.json"),
            Ok(Command::Export { path: Some(p) }) if p == PathBuf::from("out.json")
        ));
    }

    #[test]
    fn test_parse_unknown_and_empty() {
        assert!(parse_command("frobnicate").unwrap_err().contains("Unknown command"));
        assert!(parse_command("   ").is_err());
    }

    #[test]
    fn test_default_export_path() {
        let name = default_export_path().display().to_string();
        assert!(name.starts_with("vectordb-export-"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        let mut store = EntryStore::new();
        store.add_text("first entry").unwrap();
        store.add_text("second entry").unwrap();
        export_to_file(&store, &path).unwrap();

        let mut loaded = EntryStore::new();
        assert_eq!(import_from_file(&mut loaded, &path).unwrap(), 2);
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_export_empty_store_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        let err = export_to_file(&EntryStore::new(), &path).unwrap_err();
        assert_eq!(err.to_string(), "No entries to export");
        assert!(!path.exists());
    }

    #[test]
    fn test_import_missing_file() {
        let mut store = EntryStore::new();
        let err = import_from_file(&mut store, Path::new("does_not_exist.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_import_bad_file_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"not": "an array"}"#).unwrap();

        let mut store = EntryStore::new();
        store.add_text("keep").unwrap();

        assert!(import_from_file(&mut store, &path).is_err());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_find_entry_by_prefix() {
        let mut store = EntryStore::new();
        store.add(Entry::new("abc-111", "one", embed("one"), 0)).unwrap();
        store.add(Entry::new("abd-222", "two", embed("two"), 0)).unwrap();

        assert_eq!(find_entry(&store, "abc").unwrap().text, "one");
        assert_eq!(find_entry(&store, "abd-222").unwrap().text, "two");
        // Ambiguous prefix
        assert!(find_entry(&store, "ab").is_none());
        assert!(find_entry(&store, "zzz").is_none());
    }

    #[test]
    fn test_execute_add_delete_clear() {
        let mut store = EntryStore::new();
        execute_command(&mut store, Command::Add { text: "alpha".to_string() });
        execute_command(&mut store, Command::Add { text: "   ".to_string() });
        execute_command(&mut store, Command::Add { text: "beta".to_string() });
        assert_eq!(store.count(), 2);

        // Delete by short id
        let short = store.list()[0].short_id().to_string();
        execute_command(&mut store, Command::Delete { id: short });
        assert_eq!(store.count(), 1);
        assert_eq!(store.list()[0].text, "beta");

        execute_command(&mut store, Command::Delete { id: "missing".to_string() });
        assert_eq!(store.count(), 1);

        execute_command(&mut store, Command::Clear);
        assert!(store.is_empty());

        // Clearing an empty store is refused and changes nothing
        execute_command(&mut store, Command::Clear);
        assert!(store.is_empty());
    }

    #[test]
    fn test_execute_export_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = EntryStore::new();
        execute_command(&mut store, Command::Export { path: Some(path.clone()) });
        assert!(!path.exists());

        store.add_text("kept across sessions").unwrap();
        execute_command(&mut store, Command::Export { path: Some(path.clone()) });
        assert!(path.exists());

        let mut other = EntryStore::new();
        other.add_text("replaced").unwrap();
        execute_command(&mut other, Command::Import { path });
        assert_eq!(other, store);
    }

    #[test]
    fn test_one_shot_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        let mut store = EntryStore::new();
        store.add_text("the quick brown fox").unwrap();
        export_to_file(&store, &path).unwrap();

        assert!(run_embed("hello", false).is_ok());
        assert!(run_embed("hello", true).is_ok());
        assert!(run_compare("hello", "hello world").is_ok());
        assert!(run_search(&path, "quick fox").is_ok());
        assert!(run_search(&dir.path().join("missing.json"), "quick fox").is_err());
    }
}
