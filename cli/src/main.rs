use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use lazy_static::lazy_static;
use regex::Regex;

use quill_compiler::ast::{format_node, Document};
use quill_compiler::error::QuillError;
use quill_compiler::parser::parse_document;
use quill_compiler::{generate, validate};

#[derive(Parser)]
#[command(name = "quill")]
#[command(version, about = "Format quill schemas and generate Go/TypeScript from them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format one or many `.quill` files in place using a glob pattern
    Fmt {
        /// Glob pattern, e.g. "./api/*.quill"
        pattern: String,
    },

    /// Generate code from schema files; the target language is inferred
    /// from the output extension (.go or .ts)
    Gen {
        /// Package name stamped into the generated file
        pkg: String,

        /// Output file path
        output: PathBuf,

        /// Glob patterns for the input schema files
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Print the version
    Ver,
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Fmt { pattern } => fmt_cmd(pattern),
        Commands::Gen {
            pkg,
            output,
            patterns,
        } => gen_cmd(pkg, output, patterns),
        Commands::Ver => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn fmt_cmd(pattern: &str) -> Result<(), QuillError> {
    for filename in files_from_glob(pattern)? {
        let doc = parse_file(&filename)?;
        fs::write(&filename, format_node(&doc))?;
    }

    Ok(())
}

fn gen_cmd(pkg: &str, output: &Path, patterns: &[String]) -> Result<(), QuillError> {
    let mut docs: Vec<Document> = Vec::new();

    for pattern in patterns {
        for filename in files_from_glob(pattern)? {
            docs.push(parse_file(&filename)?);
        }
    }

    validate(&mut docs)?;
    generate(pkg, output, &docs)?;

    println!("Generated {}", output.display());
    Ok(())
}

fn parse_file(path: &Path) -> Result<Document, QuillError> {
    let mut parser = quill_compiler::Parser::from_file(path)?;
    parse_document(&mut parser)
}

lazy_static! {
    static ref GLOB_META: Regex = Regex::new(r"[.+^$()\[\]{}|\\]").unwrap();
}

/// Expand a glob pattern. Only the filename part may carry wildcards (`*`
/// and `?`); a wildcard in the directory part is rejected. Matches come
/// back sorted so multi-file runs stay deterministic.
fn files_from_glob(pattern: &str) -> Result<Vec<PathBuf>, QuillError> {
    let path = Path::new(pattern);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_pattern = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    if dir.to_string_lossy().contains('*') {
        return Err(QuillError::GlobPattern(pattern.to_string()));
    }

    let matcher = glob_to_regex(file_pattern);

    let mut filenames: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name();
        if let Some(name) = name.to_str() {
            if matcher.is_match(name) {
                filenames.push(dir.join(name));
            }
        }
    }

    filenames.sort();
    Ok(filenames)
}

/// Translate a filename pattern into an anchored regex: `*` matches any run
/// of characters, `?` a single one, everything else literally.
fn glob_to_regex(pattern: &str) -> Regex {
    let escaped = GLOB_META.replace_all(pattern, r"\$0");
    let translated = escaped.replace('*', ".*").replace('?', ".");

    Regex::new(&format!("^{}$", translated)).unwrap_or_else(|_| Regex::new("$^").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("*.quill");
        assert!(re.is_match("user.quill"));
        assert!(re.is_match("a.b.quill"));
        assert!(!re.is_match("user.quill.bak"));
        assert!(!re.is_match("userquill"));

        let re = glob_to_regex("user?.quill");
        assert!(re.is_match("user1.quill"));
        assert!(!re.is_match("user12.quill"));
    }

    #[test]
    fn test_glob_rejects_wildcard_dirs() {
        let err = files_from_glob("./*/schema.quill").unwrap_err();
        assert!(matches!(err, QuillError::GlobPattern(_)));
    }
}
