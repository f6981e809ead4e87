// kaiseki-tokenize: Tokenize Japanese text from stdin.
//
// Reads text from stdin and prints one token per line, surface and features
// separated by a tab, with `EOS` after each input line.
//
// Usage:
//   kaiseki-tokenize [-d DICT_PATH] [OPTIONS]
//
// Options:
//   -d, --dict-path PATH   Dictionary directory containing fst.bin
//   -u, --user-dict PATH   User dictionary (CSV)
//   --mode MODE            normal, search or extended
//   --config PATH          Tokenizer options as JSON
//   --nbest N              Print the N best segmentations
//   --slack S              Print every segmentation within S of the best
//   -h, --help             Print help

use std::io::{self, Read, Write};

use kaiseki_ja::{Mode, Token, TokenSequence, Tokenizer, TokenizerConfig, UserDictionary};
use log::info;

fn print_help() {
    println!("kaiseki-tokenize: Tokenize Japanese text.");
    println!();
    println!("Usage: kaiseki-tokenize [-d DICT_PATH] [OPTIONS]");
    println!();
    println!("Reads text from stdin, prints one token per line:");
    println!("  <surface>\\t<features>");
    println!("followed by EOS after every input line.");
    println!();
    println!("Options:");
    println!("  -d, --dict-path PATH   Dictionary directory containing fst.bin");
    println!("  -u, --user-dict PATH   User dictionary (CSV)");
    println!("  --mode MODE            normal, search or extended");
    println!("  --config PATH          Tokenizer options as JSON");
    println!("  --nbest N              Print the N best segmentations");
    println!("  --slack S              Print every segmentation within S of the best");
    println!("  -h, --help             Print this help");
}

fn parse_number<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
    value.map(|v| {
        v.parse()
            .unwrap_or_else(|_| kaiseki_cli::fatal(&format!("{name} expects a number, got {v}")))
    })
}

fn write_tokens(out: &mut impl Write, tokens: &[Token]) -> io::Result<()> {
    for token in tokens {
        writeln!(out, "{}\t{}", token.surface(), token.all_features().join(","))?;
    }
    writeln!(out, "EOS")
}

fn write_sequences(out: &mut impl Write, sequences: &[TokenSequence]) -> io::Result<()> {
    for (rank, sequence) in sequences.iter().enumerate() {
        writeln!(out, "# {} cost {}", rank + 1, sequence.cost)?;
        write_tokens(out, &sequence.tokens)?;
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if kaiseki_cli::wants_help(&args) {
        print_help();
        return;
    }
    let (dict_path, args) = kaiseki_cli::parse_dict_path(&args);
    let (user_path, args) = kaiseki_cli::parse_option(&args, "--user-dict", Some("-u"));
    let (mode, args) = kaiseki_cli::parse_option(&args, "--mode", None);
    let (config_path, args) = kaiseki_cli::parse_option(&args, "--config", None);
    let (nbest, args) = kaiseki_cli::parse_option(&args, "--nbest", None);
    let (slack, args) = kaiseki_cli::parse_option(&args, "--slack", None);
    if let Some(unexpected) = args.first() {
        kaiseki_cli::fatal(&format!("unexpected argument {unexpected} (see --help)"));
    }

    let mut config = match config_path {
        Some(path) => kaiseki_cli::load_config(&path).unwrap_or_else(|e| kaiseki_cli::fatal(&e)),
        None => TokenizerConfig::default(),
    };
    if let Some(mode) = mode {
        let mode: Mode = mode.parse().unwrap_or_else(|e: String| kaiseki_cli::fatal(&e));
        config = config.with_mode(mode);
    }
    let nbest: Option<usize> = parse_number("--nbest", nbest);
    let slack: Option<i64> = parse_number("--slack", slack);

    let dictionary =
        kaiseki_cli::load_dictionary(dict_path.as_deref()).unwrap_or_else(|e| kaiseki_cli::fatal(&e));
    let mut tokenizer = Tokenizer::new(dictionary, config);
    if let Some(path) = user_path {
        let user = UserDictionary::load(&path)
            .unwrap_or_else(|e| kaiseki_cli::fatal(&format!("{path}: {e}")));
        info!("loaded user dictionary {path} with {} entries", user.len());
        tokenizer = tokenizer
            .with_user_dictionary(user)
            .unwrap_or_else(|e| kaiseki_cli::fatal(&format!("{path}: {e}")));
    }

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .unwrap_or_else(|e| kaiseki_cli::fatal(&format!("failed to read stdin: {e}")));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for line in input.lines() {
        let written = match (nbest, slack) {
            (None, None) => write_tokens(&mut out, &tokenizer.tokenize(line)),
            (Some(n), None) => write_sequences(&mut out, &tokenizer.multi_tokenize_nbest(line, n)),
            (None, Some(s)) => write_sequences(&mut out, &tokenizer.multi_tokenize_by_slack(line, s)),
            (Some(n), Some(s)) => write_sequences(&mut out, &tokenizer.multi_tokenize(line, n, s)),
        };
        if let Err(e) = written {
            kaiseki_cli::fatal(&format!("failed to write output: {e}"));
        }
    }
    if let Err(e) = out.flush() {
        kaiseki_cli::fatal(&format!("failed to write output: {e}"));
    }
}
