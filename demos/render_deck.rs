//! Command-line tool for rendering content records into a presentation.
//!
//! Records are read from a YAML list; each entry has a `semantic_type`, a
//! `title`, optional `content_lines` and optional `notes`.
//!
//! # Usage
//!
//! Render with layouts discovered from the template's own slides:
//! ```sh
//! cargo run --example render_deck -- records.yaml -t brand.pptx -o deck.pptx
//! ```
//!
//! Render with a curated manifest and options:
//! ```sh
//! cargo run --example render_deck -- records.yaml -t brand.pptx -o deck.pptx \
//!     --manifest brand.manifest.yaml \
//!     --options options.yaml \
//!     --keep-template-notes
//! ```
//!
//! Render from a template directory (`<dir>/<id>.pptx` plus optional manifest):
//! ```sh
//! cargo run --example render_deck -- records.yaml --store templates/ --id brand -o deck.pptx
//! ```

use clap::Parser;
use slideforge::ooxml::pptx::{
    ContentSlideRecord, DeckGenerator, DirTemplateStore, GeneratorOptions, LayoutManifest, TemplateSource,
    TemplateStore, records_from_yaml,
};
use std::fs;
use std::path::PathBuf;

/// Render content records with a presentation template
#[derive(Parser, Debug)]
#[command(
    name = "render_deck",
    about = "Render YAML content records into a .pptx using a branded template",
    version
)]
struct Args {
    /// YAML list of content records
    #[arg(value_name = "RECORDS")]
    records: PathBuf,

    /// Template file (.pptx or .potx)
    #[arg(short, long, value_name = "TEMPLATE", required_unless_present = "store")]
    template: Option<PathBuf>,

    /// Output presentation
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Layout manifest to use instead of discovering layouts
    #[arg(long, value_name = "MANIFEST")]
    manifest: Option<PathBuf>,

    /// Template directory
    #[arg(long, value_name = "DIR", requires = "id", conflicts_with = "template")]
    store: Option<PathBuf>,

    /// Template id inside --store
    #[arg(long)]
    id: Option<String>,

    /// Generator options as YAML
    #[arg(long, value_name = "OPTIONS")]
    options: Option<PathBuf>,

    /// Carry speaker notes of template slides over to the slides cloned from them
    #[arg(long)]
    keep_template_notes: bool,

    /// Do not write speaker notes
    #[arg(long)]
    no_notes: bool,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    force: bool,

    /// Print pipeline diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if args.output.exists() && !args.force {
        eprintln!("Error: Output file already exists: {}", args.output.display());
        eprintln!("       Use --force to overwrite");
        std::process::exit(1);
    }

    let mut options = match &args.options {
        Some(path) => GeneratorOptions::from_yaml(&fs::read_to_string(path)?)?,
        None => GeneratorOptions::default(),
    };
    if args.keep_template_notes {
        options = options.with_drop_template_notes(false);
    }
    if args.no_notes {
        options = options.with_emit_notes(false);
    }

    let records: Vec<ContentSlideRecord> = records_from_yaml(&fs::read_to_string(&args.records)?)?;
    let source = load_source(&args)?;
    println!("Rendering {} records with template '{}'", records.len(), source.label());

    let deck = DeckGenerator::new(options).generate(&source, &records)?;
    deck.save(&args.output)?;

    println!("Wrote {} slides to {}", deck.slide_count, args.output.display());
    for skipped in &deck.skipped {
        eprintln!(
            "  skipped record {} ({}): {}",
            skipped.index, skipped.semantic_type, skipped.reason
        );
    }
    if !deck.is_complete() {
        std::process::exit(2);
    }
    Ok(())
}

fn load_source(args: &Args) -> Result<TemplateSource, Box<dyn std::error::Error>> {
    let mut source = match (&args.store, &args.id, &args.template) {
        (Some(dir), Some(id), _) => DirTemplateStore::new(dir).load(id)?,
        (_, _, Some(template)) => TemplateSource::from_bytes(fs::read(template)?)
            .with_id(template.display().to_string()),
        _ => return Err("either --template or --store with --id is required".into()),
    };
    if let Some(manifest) = &args.manifest {
        source = source.with_manifest(LayoutManifest::load(manifest)?);
    }
    Ok(source)
}
