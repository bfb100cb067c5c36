//! Summarize presentations: slide titles, text previews, notes and media.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example inspect_deck -- deck.pptx
//! cargo run --example inspect_deck -- deck.pptx --yaml --preview 200
//! cargo run --example inspect_deck -- brand.pptx --layouts
//! ```

use clap::Parser;
use slideforge::ooxml::OpcPackage;
use slideforge::ooxml::pptx::{LayoutStrategy, inspect};
use std::path::PathBuf;

/// Inspect .pptx files
#[derive(Parser, Debug)]
#[command(name = "inspect_deck", about = "Summarize the slides of .pptx files", version)]
struct Args {
    /// Presentations to inspect
    #[arg(value_name = "INPUT", required = true)]
    input: Vec<PathBuf>,

    /// Maximum characters of slide text to show
    #[arg(long, default_value_t = 80)]
    preview: usize,

    /// Print the summary as YAML
    #[arg(long)]
    yaml: bool,

    /// Print the layouts discovered from the slides, as a manifest
    #[arg(long)]
    layouts: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    for path in &args.input {
        let package = OpcPackage::open(path)?;

        if args.layouts {
            let manifest = LayoutStrategy::Heuristic.resolve(&package)?.into_manifest();
            println!("# {}", path.display());
            print!("{}", manifest.to_yaml()?);
            continue;
        }

        let summary = inspect(&package, args.preview)?;
        if args.yaml {
            println!("# {}", path.display());
            print!("{}", summary.to_yaml()?);
            continue;
        }

        println!("=== {} ({} slides) ===", path.display(), summary.slide_count());
        for slide in &summary.slides {
            println!(
                "{:>3}. {} [{} shapes, {} images{}]",
                slide.number,
                slide.title.as_deref().unwrap_or("(untitled)"),
                slide.shape_count,
                slide.image_count,
                if slide.has_notes { ", notes" } else { "" }
            );
            if !slide.text_preview.is_empty() {
                println!("     {}", slide.text_preview.replace('\n', " / "));
            }
            if let Some(notes) = &slide.notes {
                println!("     notes: {}", notes.replace('\n', " / "));
            }
        }
        if !summary.media.is_empty() {
            println!("media: {}", summary.media.join(", "));
        }
        if let Some(thumbnail) = &summary.thumbnail {
            println!("thumbnail: {}", thumbnail);
        }
        println!();
    }
    Ok(())
}
