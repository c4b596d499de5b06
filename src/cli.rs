//! Minimal CLI: authoring JSON → draft-07 JSON Schema
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use vschema2json::{authoring, path_de, Document, TranslateOptions};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// translate authored validation schemas into JSON Schema documents
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// translate each input and print (or write) the resulting document
    Translate(TranslateOut),
    /// translate each input and only report success or the first error
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// JSON file with translation options (camelCase keys)
    #[arg(long)]
    config: Option<PathBuf>,

    /// target format tag
    #[arg(long)]
    target: Option<String>,

    /// drop fields whose meta says `writeOnly: true`
    #[arg(long, default_value_t = false)]
    strip_write_only: bool,

    /// omit `$schema` from the document root
    #[arg(long, default_value_t = false)]
    no_schema_uri: bool,
}

#[derive(clap::Parser, Debug)]
struct TranslateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file, or a directory when there are several inputs
    /// (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn options(&self) -> Result<TranslateOptions> {
        let mut options = match self.config.as_ref() {
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                path_de::from_str_with_path::<TranslateOptions>(&source)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => TranslateOptions::default(),
        };
        if let Some(target) = self.target.as_ref() {
            options.target = target.parse()?;
        }
        if self.strip_write_only {
            options.strip_write_only = true;
        }
        if self.no_schema_uri {
            options.schema_uri = false;
        }
        Ok(options)
    }

    /// Translate every input in parallel; results come back in input order.
    fn translate_all(&self) -> Result<Vec<(PathBuf, Result<Document>)>> {
        let options = self.options()?;
        let source_paths = resolve_file_path_patterns(&self.input)?;
        Ok(source_paths
            .into_par_iter()
            .map(|path| {
                let result = translate_file(&path, &options);
                (path, result)
            })
            .collect())
    }
}

fn translate_file(path: &Path, options: &TranslateOptions) -> Result<Document> {
    let source = std::fs::read(path)
        .with_context(|| format!("failed to read source file {}", path.display()))?;
    let authored = authoring::from_slice(&source)
        .with_context(|| format!("failed to load schema from {}", path.display()))?;
    let doc = vschema2json::translate_with(&authored.tree, authored.root, options)
        .with_context(|| format!("failed to translate {}", path.display()))?;
    Ok(doc)
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Translate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let results = target.input_settings.translate_all()?;
                let many = results.len() > 1;
                for (path, result) in results {
                    let doc = result?;
                    let schema_src = doc.to_string_pretty()?;
                    match target.out.as_ref() {
                        Some(out) if many => {
                            std::fs::create_dir_all(out)?;
                            let name = path.file_stem().unwrap_or(path.as_os_str());
                            let dest = out.join(name).with_extension("schema.json");
                            std::fs::write(&dest, &schema_src)
                                .with_context(|| format!("failed to write {}", dest.display()))?;
                        }
                        Some(out) => {
                            if let Some(parent) = out.parent() {
                                std::fs::create_dir_all(parent)?;
                            }
                            std::fs::write(out, &schema_src)
                                .with_context(|| format!("failed to write {}", out.display()))?;
                        }
                        None => println!("{schema_src}"),
                    }
                }
                Ok(())
            }
            Command::Check(target) => {
                let results = target.input_settings.translate_all()?;
                let mut failed = 0usize;
                for (path, result) in &results {
                    match result {
                        Ok(_) => eprintln!("{} {}", "✅ ok".green(), path.display()),
                        Err(error) => {
                            failed += 1;
                            eprintln!("{} {}: {error:#}", "❌ failed".red(), path.display());
                        }
                    }
                }
                if failed > 0 {
                    anyhow::bail!("{failed} of {} schema(s) failed to translate", results.len());
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
