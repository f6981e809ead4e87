// kaiseki-cli: shared utilities for CLI tools.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use kaiseki_ja::dictionary::FST_FILE;
use kaiseki_ja::{Dictionary, TokenizerConfig};

/// Dictionary directory under the home directory.
const HOME_DICT_DIR: &str = ".kaiseki/dict";

/// Search for a dictionary directory and load it.
///
/// Search order:
/// 1. `dict_path` argument (if provided)
/// 2. `KAISEKI_DICT_PATH` environment variable
/// 3. `~/.kaiseki/dict`
/// 4. Current working directory
///
/// A directory qualifies when it holds the lexicon FST file.
pub fn load_dictionary(dict_path: Option<&str>) -> Result<Arc<Dictionary>, String> {
    let search_paths = build_search_paths(dict_path);

    for dir in &search_paths {
        if dir.join(FST_FILE).is_file() {
            return Dictionary::load(dir)
                .map(Arc::new)
                .map_err(|e| format!("failed to load dictionary from {}: {e}", dir.display()));
        }
    }

    Err(format!(
        "could not find {} in any of the search paths:\n{}",
        FST_FILE,
        search_paths
            .iter()
            .map(|p| format!("  - {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n")
    ))
}

/// Build the list of directories to search for dictionary files.
fn build_search_paths(dict_path: Option<&str>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(p) = dict_path {
        paths.push(PathBuf::from(p));
    }
    if let Ok(env_path) = std::env::var("KAISEKI_DICT_PATH") {
        paths.push(PathBuf::from(env_path));
    }
    if let Some(home) = home_dir() {
        paths.push(home.join(HOME_DICT_DIR));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }

    paths
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Read tokenizer options from a JSON file. Missing fields keep defaults.
pub fn load_config(path: &str) -> Result<TokenizerConfig, String> {
    let json = std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?;
    TokenizerConfig::from_json(&json).map_err(|e| format!("invalid config {path}: {e}"))
}

/// Remove `--name=VALUE`, `--name VALUE` or `-s VALUE` from `args`.
///
/// Returns `(value, remaining_args)`. The last occurrence wins.
pub fn parse_option(args: &[String], long: &str, short: Option<&str>) -> (Option<String>, Vec<String>) {
    let mut value = None;
    let mut remaining = Vec::new();
    let mut skip_next = false;
    let prefix = format!("{long}=");

    for (i, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(val) = arg.strip_prefix(prefix.as_str()) {
            value = Some(val.to_string());
        } else if arg == long || Some(arg.as_str()) == short {
            if i + 1 < args.len() {
                value = Some(args[i + 1].clone());
                skip_next = true;
            } else {
                fatal(&format!("{arg} requires a value"));
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    (value, remaining)
}

/// Parse a `--dict-path=PATH` or `-d PATH` argument from command line args.
///
/// Returns `(dict_path, remaining_args)`.
pub fn parse_dict_path(args: &[String]) -> (Option<String>, Vec<String>) {
    parse_option(args, "--dict-path", Some("-d"))
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}
