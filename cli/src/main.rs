//! undoc CLI - document content extraction tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use undoc::{
    load_with_options, process_batch, process_file, BatchOptions, ContentExtractor, ContentKind,
    Extraction, FileReport, LoadOptions,
};

#[derive(Parser)]
#[command(name = "undoc")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Extract text, links, images, tables and metadata from PDF, DOCX and PPTX",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Load settings shared by every command that opens documents.
#[derive(clap::Args)]
struct LoadArgs {
    /// Do not OCR PDFs whose text layer is empty
    #[arg(long)]
    no_ocr: bool,

    /// Tesseract language for OCR
    #[arg(long, value_name = "LANG", env = "UNDOC_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Rasterization resolution for OCR
    #[arg(long, value_name = "N", default_value_t = 300)]
    dpi: u32,

    /// Fail on any per-page error instead of recording a warning
    #[arg(long)]
    strict: bool,
}

impl LoadArgs {
    fn to_options(&self) -> LoadOptions {
        let options = if self.strict {
            LoadOptions::new().strict()
        } else {
            LoadOptions::new().lenient()
        };
        if self.no_ocr {
            options.without_ocr()
        } else {
            options.with_ocr_language(&self.ocr_lang).with_ocr_dpi(self.dpi)
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract documents into a directory tree and/or an SQLite database
    Extract {
        /// Input files (.pdf, .docx, .pptx)
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", env = "UNDOC_OUTPUT")]
        output: Option<PathBuf>,

        /// SQLite database file
        #[arg(long, value_name = "PATH", env = "UNDOC_DB")]
        db: Option<PathBuf>,

        /// Content kinds to write (comma-separated)
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "text,links,images,tables,metadata"
        )]
        kinds: Vec<ContentKind>,

        /// Remove earlier results for each file's format before writing
        #[arg(long)]
        clear: bool,

        /// Process files in parallel
        #[arg(long)]
        jobs: bool,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Show document information
    Info {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Print every extraction as JSON
    Json {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            inputs,
            output,
            db,
            kinds,
            clear,
            jobs,
            load,
        } => {
            let options = BatchOptions::new()
                .with_load_options(load.to_options())
                .with_kinds(kinds)
                .with_clear(clear)
                .with_parallel(jobs);
            cmd_extract(&inputs, output, db, options)
        }
        Commands::Info { input, load } => cmd_info(&input, &load.to_options()),
        Commands::Json {
            input,
            output,
            compact,
            load,
        } => cmd_json(&input, output.as_deref(), compact, &load.to_options()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_extract(
    inputs: &[PathBuf],
    output: Option<PathBuf>,
    db: Option<PathBuf>,
    mut options: BatchOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if output.is_none() && db.is_none() {
        return Err("nothing to write: pass --output and/or --db".into());
    }
    if let Some(dir) = output {
        options = options.with_output_dir(dir);
    }
    if let Some(path) = db {
        options = options.with_database(path);
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let results = if options.parallel {
        pb.set_message("processing in parallel...");
        let results = process_batch(inputs, &options);
        pb.set_position(inputs.len() as u64);
        results
    } else {
        inputs
            .iter()
            .map(|path| {
                pb.set_message(path.display().to_string());
                let result = process_file(path, &options);
                pb.inc(1);
                (path.clone(), result)
            })
            .collect()
    };
    pb.finish_and_clear();

    let mut failed = 0;
    for (path, result) in &results {
        match result {
            Ok(report) => print_report(report),
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "✗".red(), path.display(), e);
            }
        }
    }

    println!();
    if failed == 0 {
        println!("{} {} file(s) processed", "Done!".green().bold(), results.len());
        Ok(())
    } else {
        Err(format!("{} of {} file(s) failed", failed, results.len()).into())
    }
}

fn print_report(report: &FileReport) {
    let mark = if report.is_complete() {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!(
        "{} {} {}",
        mark,
        report.path.display(),
        format!("({})", report.format).dimmed()
    );
    for warning in &report.warnings {
        println!("    {} {}", "warning:".yellow(), warning);
    }
    for (sink, persisted) in &report.sinks {
        for written in &persisted.written {
            let skipped = if written.skipped.is_empty() {
                String::new()
            } else {
                format!(", {} skipped", written.skipped.len()).yellow().to_string()
            };
            println!(
                "    {} {}: {}{}",
                sink.dimmed(),
                written.kind,
                written.written,
                skipped
            );
        }
        for (kind, error) in &persisted.failed {
            println!("    {} {}: {}", sink.dimmed(), kind, error.to_string().red());
        }
    }
}

fn cmd_info(input: &Path, options: &LoadOptions) -> Result<(), Box<dyn std::error::Error>> {
    let handle = load_with_options(input, options)?;
    let extractor = ContentExtractor::new(&handle);

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), handle.format());
    for (key, value) in extractor.extract_metadata().iter() {
        if let Some(value) = value {
            println!("{}: {}", capitalize(key).bold(), value);
        }
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for extraction in extractor.extract_all() {
        match &extraction {
            Extraction::Text(text) => {
                println!("{}: {}", "Words".bold(), text.split_whitespace().count());
                println!("{}: {}", "Characters".bold(), text.chars().count());
            }
            Extraction::Metadata(_) => {}
            other => println!("{}: {}", capitalize(other.kind().name()).bold(), other.len()),
        }
    }

    if !handle.warnings().is_empty() {
        println!();
        println!("{}", "Warnings".yellow().bold());
        println!("{}", "─".repeat(40).dimmed());
        for warning in handle.warnings() {
            println!("  {}", warning);
        }
    }

    Ok(())
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    options: &LoadOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = load_with_options(input, options)?;
    let json = undoc::to_json(&handle, !compact)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn cmd_version() {
    println!("{} {}", "undoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document content extraction tool");
    println!();
    println!("Formats: PDF, DOCX, PPTX");
    println!("Repository: {}", "https://github.com/iyulab/undoc".dimmed());
    println!("License: MIT");
}
