//! # Lanyard CLI
//!
//! Command-line interface for bulk badge generation.
//!
//! ## Usage
//!
//! ```bash
//! # Generate badges for a whole dataset
//! lanyard generate --template badge.png --fields fields.json \
//!     --mapping mapping.json --data attendees.csv --out badges/
//!
//! # Start the HTTP job service
//! lanyard serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use lanyard::{
    LanyardError, dataset,
    fonts::FontRegistry,
    generate::{generate_badges, load_template},
    server::{self, ServerConfig},
    template::{FieldMapping, TemplateField},
};

/// Lanyard - bulk ID badge generator
#[derive(Parser, Debug)]
#[command(name = "lanyard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate one PNG badge per dataset row
    Generate {
        /// Template image path
        #[arg(long)]
        template: PathBuf,

        /// JSON file with the field list
        #[arg(long)]
        fields: PathBuf,

        /// JSON file mapping field ids to dataset columns
        #[arg(long)]
        mapping: PathBuf,

        /// CSV dataset; the first row is the header
        #[arg(long)]
        data: PathBuf,

        /// Output directory for badge-{i}.png files and manifest.json
        #[arg(long, default_value = "badges")]
        out: PathBuf,

        /// Badge width in pixels (defaults to the template's width)
        #[arg(long)]
        width: Option<u32>,

        /// Badge height in pixels (defaults to the template's height)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Start the HTTP job service
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), LanyardError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            template,
            fields,
            mapping,
            data,
            out,
            width,
            height,
        } => generate(template, fields, mapping, data, out, width, height),
        Commands::Serve { listen } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(ServerConfig { listen_addr: listen }))
        }
    }
}

fn generate(
    template: PathBuf,
    fields: PathBuf,
    mapping: PathBuf,
    data: PathBuf,
    out: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<(), LanyardError> {
    let registry = FontRegistry::global()?;
    println!(
        "Fonts: {} faces from {}",
        registry.fonts_registered(),
        registry.source_dir().display()
    );

    let template_image = load_template(&template)?;
    let width = width.unwrap_or(template_image.width());
    let height = height.unwrap_or(template_image.height());

    let field_list: Vec<TemplateField> = serde_json::from_str(&fs::read_to_string(&fields)?)
        .map_err(|e| LanyardError::Data(format!("failed to parse {}: {}", fields.display(), e)))?;
    let field_mapping: FieldMapping = serde_json::from_str(&fs::read_to_string(&mapping)?)
        .map_err(|e| LanyardError::Data(format!("failed to parse {}: {}", mapping.display(), e)))?;
    let rows = dataset::read_rows_from_path(&data)?;

    println!("Generating {} badges ({}x{})...", rows.len(), width, height);
    let badges = generate_badges(
        &template_image,
        width,
        height,
        &field_list,
        &field_mapping,
        &rows,
        registry,
        |current, total| println!("  badge {}/{}", current, total),
    )?;

    fs::create_dir_all(&out)?;
    let mut manifest = Vec::with_capacity(badges.len());
    for (i, png) in badges.iter().enumerate() {
        let filename = format!("badge-{}.png", i);
        fs::write(out.join(&filename), png)?;
        manifest.push(filename);
    }
    let manifest_json =
        serde_json::to_vec_pretty(&serde_json::json!({ "badges": manifest }))
            .map_err(|e| LanyardError::Data(e.to_string()))?;
    fs::write(out.join("manifest.json"), manifest_json)?;

    println!("Wrote {} badges to {}", badges.len(), out.display());
    Ok(())
}
