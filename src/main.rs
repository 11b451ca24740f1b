use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use docx_catalog::{Config, Error, LinkOptions, MatchOrder, NamingPolicy, Package};

#[derive(Parser)]
#[command(version, about = "Extract images from a DOCX file and link them into a catalog source file")]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract images per marked entry and patch the catalog's image fields
    Link {
        docx: PathBuf,
        catalog: PathBuf,
        /// TOML file with markers and output settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Prefix for catalog values, e.g. /images/products
        #[arg(long)]
        url_prefix: Option<String>,
        /// Keep every image of an entry as {id}_{n}{ext}
        #[arg(long)]
        positional: bool,
        /// Try longer markers before shorter ones
        #[arg(long)]
        longest_first: bool,
        /// Extra marker as TEXT=ID, checked after configured markers
        #[arg(short, long = "marker", value_name = "TEXT=ID")]
        markers: Vec<String>,
        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print paragraphs, tables and image references of a DOCX file
    Inspect {
        docx: PathBuf,
        /// Write the dump to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write every embedded image in document order as image_{n}{ext}
    ExtractAll {
        docx: PathBuf,
        #[arg(short, long, default_value = docx_catalog::config::DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // diagnostics share stdout with the summary, except when a dump goes there
    let target = match cli.command {
        Command::Inspect { out: None, .. } => env_logger::Target::Stderr,
        _ => env_logger::Target::Stdout,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .target(target)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Link {
            docx,
            catalog,
            config,
            output_dir,
            url_prefix,
            positional,
            longest_first,
            markers,
            dry_run,
        } => {
            let mut cfg = match config {
                Some(path) => Config::load(&path)?,
                None => Config::default(),
            };
            if output_dir.is_some() {
                cfg.output_dir = output_dir;
            }
            if url_prefix.is_some() {
                cfg.url_prefix = url_prefix;
            }
            if positional {
                cfg.naming = NamingPolicy::Positional;
            }
            if longest_first {
                cfg.match_order = MatchOrder::LongestFirst;
            }
            for arg in &markers {
                cfg.markers.push(docx_catalog::config::parse_marker_arg(arg)?);
            }
            if cfg.markers.is_empty() {
                return Err(Error::Config(
                    "no markers given (use --config or --marker TEXT=ID)".into(),
                ));
            }
            if !docx.is_file() {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("document not found: {}", docx.display()),
                )));
            }

            let options = LinkOptions::from_config(&cfg, dry_run);
            let summary = docx_catalog::link_document(&docx, &catalog, &options)?;
            let stats = summary.extraction.stats;
            let report = &summary.report;

            if dry_run {
                println!("Dry run: nothing was written");
            }
            println!("Paragraphs scanned:      {}", summary.extraction.paragraphs);
            println!("Images saved:            {}", stats.saved);
            println!("Images skipped:          {}", stats.skipped());
            println!("  before any marker:     {}", stats.no_context);
            println!("  missing relationship:  {}", stats.missing_relationship);
            println!("  external link:         {}", stats.external);
            println!("  missing media part:    {}", stats.missing_part);
            println!("Entries bound:           {}", summary.extraction.bindings.len());
            println!("Catalog entries updated: {}", report.updated.len());
            println!("Catalog unchanged:       {}", report.unchanged.len());
            if !report.missing.is_empty() {
                println!("Not in catalog:          {:?}", report.missing);
            }
            if !report.no_field.is_empty() {
                println!("No image field:          {:?}", report.no_field);
            }
            Ok(())
        }
        Command::Inspect { docx, out } => {
            let mut package = Package::open(&docx)?;
            let dump = docx_catalog::inspect::render(&mut package)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, dump)?;
                    println!("Content written to {}", path.display());
                }
                None => print!("{dump}"),
            }
            Ok(())
        }
        Command::ExtractAll { docx, output_dir } => {
            let mut package = Package::open(&docx)?;
            let rels = package.main_relationships()?;
            let xml = package.main_document_xml()?;
            let paragraphs = docx_catalog::docx::scan_paragraphs(&xml)?;
            let written = docx_catalog::associate::extract_all(
                &mut package,
                &rels,
                &paragraphs,
                &output_dir,
            )?;
            println!("Extracted {} raw images to {}", written.len(), output_dir.display());
            Ok(())
        }
    }
}
