//! textract2page CLI - convert AWS Textract JSON to PAGE-XML

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use textract2page::detect::is_supported_image;
use textract2page::parser::{resolve, ParseOptions};
use textract2page::{
    render, ConvertOptions, JsonFormat, PageConverter, PcGts, RenderOptions, TextractResponse,
};

#[derive(Parser)]
#[command(name = "textract2page")]
#[command(version)]
#[command(about = "Convert AWS Textract output to PAGE-XML", long_about = None)]
struct Cli {
    /// Textract JSON file
    #[arg(value_name = "JSON")]
    input: Option<PathBuf>,

    /// Page image the JSON was produced from
    #[arg(value_name = "IMAGE")]
    image: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert Textract JSON to PAGE-XML, JSON or text
    Convert(ConvertArgs),

    /// Show block statistics of a Textract JSON file
    Info {
        /// Textract JSON file
        #[arg(value_name = "JSON")]
        input: PathBuf,

        /// Repair shared children and dangling references
        #[arg(long)]
        lenient: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ConvertArgs {
    /// Textract JSON file
    #[arg(value_name = "JSON")]
    input: PathBuf,

    /// Page image; its size is used unless given explicitly
    #[arg(value_name = "IMAGE")]
    image: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long, value_name = "PX", requires = "image_height")]
    image_width: Option<u32>,

    /// Image height in pixels
    #[arg(long, value_name = "PX", requires = "image_width")]
    image_height: Option<u32>,

    /// Value of Page/@imageFilename (defaults to the image path)
    #[arg(long, value_name = "NAME")]
    image_filename: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "xml")]
    format: Format,

    /// Compact JSON output
    #[arg(long)]
    compact: bool,

    /// Repair shared children, dangling references and orphaned blocks
    #[arg(long)]
    lenient: bool,

    /// Leave out the ReadingOrder element
    #[arg(long)]
    no_reading_order: bool,

    /// Apply NFC normalization to all text
    #[arg(long)]
    normalize_unicode: bool,

    /// Spaces per XML indentation level (0 = single line)
    #[arg(long, default_value = "4")]
    indent: usize,

    /// Creation timestamp (RFC 3339)
    #[arg(long, value_name = "TIME")]
    created: Option<DateTime<Utc>>,

    /// Creation timestamp as seconds since the epoch
    #[arg(long, env = "SOURCE_DATE_EPOCH", hide = true)]
    source_date_epoch: Option<i64>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// PAGE-XML
    Xml,
    /// JSON dump of the document model
    Json,
    /// Plain text, one line per text line
    Text,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert(args)) => cmd_convert(&args),
        Some(Commands::Info { input, lenient }) => cmd_info(&input, lenient),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert to PAGE-XML if input is provided
            if let Some(input) = cli.input {
                let args = ConvertArgs {
                    input,
                    image: cli.image,
                    output: cli.output,
                    image_width: None,
                    image_height: None,
                    image_filename: None,
                    format: Format::Xml,
                    compact: false,
                    lenient: false,
                    no_reading_order: false,
                    normalize_unicode: false,
                    indent: 4,
                    created: None,
                    source_date_epoch: std::env::var("SOURCE_DATE_EPOCH")
                        .ok()
                        .and_then(|v| v.parse().ok()),
                };
                cmd_convert(&args)
            } else {
                println!("{}", "Usage: textract2page <JSON> [IMAGE] [-o OUTPUT]".yellow());
                println!("       textract2page --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), describe_error(e.as_ref()));
        std::process::exit(1);
    }
}

/// Error message, naming the offending block when there is one.
fn describe_error(e: &(dyn std::error::Error + 'static)) -> String {
    match e
        .downcast_ref::<textract2page::Error>()
        .and_then(|err| err.block_id())
    {
        Some(id) => format!("{} (block {})", e, id),
        None => e.to_string(),
    }
}

impl ConvertArgs {
    fn timestamp(&self) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
        if let Some(created) = self.created {
            return Ok(created);
        }
        match self.source_date_epoch {
            Some(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| format!("SOURCE_DATE_EPOCH out of range: {}", secs).into()),
            None => Ok(Utc::now()),
        }
    }

    fn convert_options(&self) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
        let mut options = ConvertOptions::new()
            .with_reading_order(!self.no_reading_order)
            .with_unicode_normalization(self.normalize_unicode)
            .with_timestamp(self.timestamp()?);

        if self.lenient {
            options = options.lenient();
        }
        if let Some(ref image) = self.image {
            options = options.with_image(image);
        }
        if let (Some(width), Some(height)) = (self.image_width, self.image_height) {
            options = options.with_image_size(width, height);
        }
        if let Some(ref name) = self.image_filename {
            options = options.with_image_filename(name);
        }
        Ok(options)
    }

    /// Warn when the page size has to come from a file that does not look
    /// like an image.
    fn image_warning(&self) -> Option<String> {
        let image = self.image.as_ref()?;
        if self.image_width.is_some() || is_supported_image(image) {
            return None;
        }
        Some(format!(
            "{} does not look like a PNG, JPEG or TIFF image",
            image.display()
        ))
    }
}

fn cmd_convert(args: &ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(warning) = args.image_warning() {
        eprintln!("{}: {}", "Warning".yellow().bold(), warning);
    }
    let converter = PageConverter::new(args.convert_options()?);
    let doc = converter.convert_file(&args.input)?;
    let content = render_doc(&doc, args)?;

    if let Some(ref path) = args.output {
        fs::write(path, &content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        print!("{}", content);
    }

    Ok(())
}

fn render_doc(doc: &PcGts, args: &ConvertArgs) -> Result<String, Box<dyn std::error::Error>> {
    let content = match args.format {
        Format::Xml => {
            let options = RenderOptions::new().with_indent(args.indent);
            render::to_xml(doc, &options)?
        }
        Format::Json => {
            let format = if args.compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let mut json = render::to_json(doc, format)?;
            json.push('\n');
            json
        }
        Format::Text => {
            let mut text = render::to_text(doc);
            text.push('\n');
            text
        }
    };
    Ok(content)
}

fn cmd_info(input: &Path, lenient: bool) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let response = TextractResponse::from_slice(&data)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Blocks".bold(), response.blocks.len());

    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    for block in &response.blocks {
        *kinds.entry(block.block_type.to_string()).or_default() += 1;
    }
    for (kind, count) in &kinds {
        println!("  {} {}: {}", "├─".dimmed(), kind, count);
    }

    println!();
    println!("{}", "Block Tree".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let options = if lenient {
        ParseOptions::new().lenient()
    } else {
        ParseOptions::new()
    };
    match resolve(&response.blocks, &options) {
        Ok(tree) => {
            let depth = tree.iter().map(|(_, n)| n.depth()).max().unwrap_or(0);
            println!("{}: {}", "Resolved".bold(), tree.len());
            println!(
                "{}: {}",
                "Skipped".bold(),
                response.blocks.len() - tree.len()
            );
            println!("{}: {}", "Depth".bold(), depth);
        }
        Err(e) => {
            println!("{}: {}", "Invalid".red().bold(), e);
        }
    }

    Ok(())
}

fn cmd_version() {
    println!(
        "{} {}",
        "textract2page".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("PAGE-XML {}", "2019-07-15".dimmed());
}
