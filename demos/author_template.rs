//! Build a branded template from YAML layout definitions.
//!
//! The definitions file is a list of layouts:
//!
//! ```yaml
//! - name: title
//!   layout_type: title
//!   placeholders:
//!     - type: ctrTitle
//!       text: "{{TITLE}}"
//!       geometry: { x: 685800, y: 2130425, cx: 7772400, cy: 1470025 }
//!       font_size: 44
//! - name: content
//!   layout_type: obj
//!   default: true
//!   placeholders:
//!     - type: title
//!       geometry: { x: 457200, y: 274638, cx: 8229600, cy: 1143000 }
//!     - type: body
//!       idx: 1
//!       geometry: { x: 457200, y: 1600200, cx: 8229600, cy: 4525963 }
//! ```
//!
//! # Usage
//!
//! ```sh
//! cargo run --example author_template -- layouts.yaml -o brand.pptx --title "Brand"
//! cargo run --example author_template -- layouts.yaml --store templates/ --id brand
//! ```

use chrono::Utc;
use clap::Parser;
use slideforge::ooxml::pptx::{DirTemplateStore, TemplateAuthor, definitions_from_yaml};
use std::fs;
use std::path::PathBuf;

/// Author a .pptx template and its layout manifest
#[derive(Parser, Debug)]
#[command(name = "author_template", about = "Build a .pptx template from layout definitions", version)]
struct Args {
    /// YAML list of layout definitions
    #[arg(value_name = "DEFINITIONS")]
    definitions: PathBuf,

    /// Output template; the manifest is written next to it
    #[arg(short, long, value_name = "OUTPUT", required_unless_present = "store")]
    output: Option<PathBuf>,

    /// Template directory to store the result in
    #[arg(long, value_name = "DIR", requires = "id")]
    store: Option<PathBuf>,

    /// Template id inside --store
    #[arg(long)]
    id: Option<String>,

    /// Title written to the document properties
    #[arg(long, default_value = "Template")]
    title: String,

    /// Slide width and height in EMU
    #[arg(long, num_args = 2, value_names = ["CX", "CY"])]
    size: Option<Vec<i64>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let definitions = definitions_from_yaml(&fs::read_to_string(&args.definitions)?)?;
    let mut author = TemplateAuthor::new()
        .with_title(&args.title)
        .with_created(Utc::now());
    if let Some([cx, cy]) = args.size.as_deref() {
        author = author.with_slide_size(*cx, *cy);
    }

    let authored = author.build(&definitions)?;
    println!("Built {} layouts:", authored.manifest.len());
    for entry in &authored.manifest.layouts {
        println!(
            "  {} (slide {}, {} placeholders{})",
            entry.name,
            entry.source_slide,
            entry.placeholders.len(),
            if entry.default { ", default" } else { "" }
        );
    }

    if let Some(output) = &args.output {
        authored.save(output)?;
        println!("Wrote {}", output.display());
    }
    if let (Some(dir), Some(id)) = (&args.store, &args.id) {
        let store = DirTemplateStore::new(dir);
        store.save(id, &authored)?;
        println!("Stored as '{}' in {}", id, store.root().display());
    }
    Ok(())
}
