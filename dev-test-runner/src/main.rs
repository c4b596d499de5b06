//! Fixture runner: `fixtures/<name>.input.json` → translate → compare with
//! `fixtures/<name>.expected.json`.
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static INPUT_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>.+)\.input\.json$").expect("static regex"));

#[derive(Parser, Debug)]
struct Cli {
    /// fixture directory
    #[arg(long, default_value = "fixtures")]
    dir: PathBuf,

    /// only run fixtures whose name matches this regex
    #[arg(long)]
    filter: Option<String>,

    /// (re)write expected files from the current output
    #[arg(long)]
    bless: bool,
}

enum Outcome {
    Passed,
    Blessed,
    Failed(String),
}

fn main() {
    let cli = Cli::parse();
    let filter = match cli.filter.as_deref().map(Regex::new).transpose() {
        Ok(f) => f,
        Err(error) => {
            eprintln!("{} bad --filter: {error}", "error:".red());
            std::process::exit(2);
        }
    };

    let mut fixtures = match collect_fixtures(&cli.dir) {
        Ok(xs) => xs,
        Err(error) => {
            eprintln!("{} {error}", "error:".red());
            std::process::exit(2);
        }
    };
    fixtures.retain(|(name, _)| filter.as_ref().is_none_or(|f| f.is_match(name)));

    let mut failed = 0usize;
    for (name, input) in &fixtures {
        match run_fixture(input, &cli.dir.join(format!("{name}.expected.json")), cli.bless) {
            Outcome::Passed => eprintln!("{} {name}", "✅ pass".green()),
            Outcome::Blessed => eprintln!("{} {name}", "✍️ blessed".yellow()),
            Outcome::Failed(why) => {
                failed += 1;
                eprintln!("{} {name}: {why}", "❌ fail".red());
            }
        }
    }
    eprintln!("—— {} fixture(s), {failed} failed ——", fixtures.len());
    if failed > 0 {
        std::process::exit(1);
    }
}

fn collect_fixtures(dir: &Path) -> Result<Vec<(String, PathBuf)>, String> {
    let entries = std::fs::read_dir(dir).map_err(|e| format!("cannot read {}: {e}", dir.display()))?;
    let mut out = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.to_string())?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
        if let Some(caps) = INPUT_FILE.captures(file_name) {
            out.push((caps["name"].to_string(), path.clone()));
        }
    }
    out.sort();
    Ok(out)
}

fn run_fixture(input: &Path, expected: &Path, bless: bool) -> Outcome {
    let actual = match translate(input) {
        Ok(v) => v,
        Err(why) => return Outcome::Failed(why),
    };
    if bless {
        let rendered = match serde_json::to_string_pretty(&actual) {
            Ok(s) => s,
            Err(e) => return Outcome::Failed(e.to_string()),
        };
        return match std::fs::write(expected, rendered + "\n") {
            Ok(()) => Outcome::Blessed,
            Err(e) => Outcome::Failed(format!("cannot write {}: {e}", expected.display())),
        };
    }
    let want = match std::fs::read_to_string(expected) {
        Ok(src) => match serde_json::from_str::<Value>(&src) {
            Ok(v) => v,
            Err(e) => return Outcome::Failed(format!("bad expected file: {e}")),
        },
        Err(_) => return Outcome::Failed("no expected file (run with --bless)".into()),
    };
    match first_difference(&want, &actual, String::new()) {
        None => Outcome::Passed,
        Some(at) => Outcome::Failed(format!("output differs at '{at}'")),
    }
}

fn translate(input: &Path) -> Result<Value, String> {
    let bytes = std::fs::read(input).map_err(|e| format!("cannot read {}: {e}", input.display()))?;
    let authored = vschema2json::authoring::from_slice(&bytes).map_err(|e| e.to_string())?;
    let doc = vschema2json::translate(&authored.tree, authored.root, "json").map_err(|e| e.to_string())?;
    Ok(doc.into_value())
}

/// JSON pointer of the first place `a` and `b` disagree.
fn first_difference(a: &Value, b: &Value, at: String) -> Option<String> {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            for (k, va) in x {
                let here = format!("{at}/{k}");
                match y.get(k) {
                    Some(vb) => {
                        if let Some(d) = first_difference(va, vb, here) {
                            return Some(d);
                        }
                    }
                    None => return Some(here),
                }
            }
            y.keys().find(|k| !x.contains_key(*k)).map(|k| format!("{at}/{k}"))
        }
        (Value::Array(x), Value::Array(y)) if x.len() == y.len() => x
            .iter()
            .zip(y)
            .enumerate()
            .find_map(|(i, (va, vb))| first_difference(va, vb, format!("{at}/{i}"))),
        _ if a == b => None,
        _ => Some(at),
    }
}
