//! CLI tool for designing slides from presentation text.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::{
    DesignPipeline, DesignedPresentation, EngineConfig, ExtractedPresentation, InputFormat, Template,
    TemplateRepository,
};
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Turn pasted text, extraction JSON or PPTX files into designed slide
/// specifications.
#[derive(Parser, Debug)]
#[command(name = "deck-design")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file(s): .pptx, extraction .json, or any raw text file
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Template name from the templates directory, or a path to a template .json
    #[arg(short, long)]
    template: Option<String>,

    /// Directory holding template .json files (also searched in its designs/ subdirectory)
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Engine configuration JSON overriding the default thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// Treat a short line after the first slide's title as a subtitle
    #[arg(long)]
    subtitles: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = load_config(args.config.as_deref())?.with_detect_subtitles(args.subtitles);
    let template = load_template(&args)?;
    if args.verbose {
        eprintln!("Using template: {}", template.name());
    }
    let pipeline = DesignPipeline::new(config, template);

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match process_file(input_path, &pipeline) {
            Ok(presentation) => {
                if args.verbose {
                    eprintln!(
                        "  Designed {} slides ({} boundary violations, {} contrast warnings)",
                        presentation.designed_slides.len(),
                        presentation.report.boundary_violations,
                        presentation.report.contrast_warnings
                    );
                }
                let output = serde_json::to_string_pretty(&presentation)
                    .context("Failed to serialize designed presentation")?;
                if args.print {
                    println!("{}", output);
                } else {
                    let output_path = get_output_path(input_path, args.output.as_ref())?;
                    write_output(&output_path, &output)?;
                    if args.verbose {
                        eprintln!("Written to: {}", output_path.display());
                    }
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
}

/// Pick the template: an explicit file, a name from the templates
/// directory, or the built-in default.
fn load_template(args: &Args) -> Result<Arc<Template>> {
    let Some(name) = args.template.as_deref() else {
        return Ok(Template::builtin());
    };

    let as_path = Path::new(name);
    if as_path.extension().and_then(|e| e.to_str()) == Some("json") && as_path.is_file() {
        let template = Template::from_file(as_path)
            .with_context(|| format!("Failed to load template {}", as_path.display()))?;
        return Ok(Arc::new(template));
    }

    let repository = match &args.templates_dir {
        Some(dir) => TemplateRepository::from_dir(dir)
            .with_context(|| format!("Failed to load templates from {}", dir.display()))?,
        None => TemplateRepository::new(),
    };
    Ok(repository.resolve(name))
}

/// Design a single input file.
fn process_file(input_path: &Path, pipeline: &DesignPipeline) -> Result<DesignedPresentation> {
    let bytes = fs::read(input_path).with_context(|| format!("Failed to open {}", input_path.display()))?;

    let format = InputFormat::from_magic(&bytes).unwrap_or_else(|| {
        input_path
            .extension()
            .and_then(|e| e.to_str())
            .map(InputFormat::from_extension)
            .unwrap_or(InputFormat::Text)
    });

    let filename = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    let presentation = match format {
        InputFormat::Pptx => {
            log::debug!("Reading as PPTX");
            let extraction = deck_pptx::PptxParser::new().parse(Cursor::new(bytes), filename)?;
            pipeline.design_extraction(&extraction)?
        }
        InputFormat::Extraction => {
            log::debug!("Reading as extraction JSON");
            let extraction: ExtractedPresentation =
                serde_json::from_slice(&bytes).context("Invalid extraction JSON")?;
            pipeline.design_extraction(&extraction)?
        }
        InputFormat::Text => {
            log::debug!("Reading as raw text");
            let text = String::from_utf8(bytes).context("Input is not valid UTF-8 text")?;
            pipeline.design_text(&text)?
        }
    };

    Ok(presentation)
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.design.json", stem);

    let output_path = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
