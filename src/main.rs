//! # Diploma CLI
//!
//! Command-line interface for certificate templates.
//!
//! ## Usage
//!
//! ```bash
//! # Write the default template
//! diploma init --out template.json
//!
//! # Upgrade a stored (possibly legacy) template document
//! diploma normalize stored.json --out template.json
//!
//! # Render the back page at 800px wide
//! diploma preview template.json --page back --width 800 --out back.png
//!
//! # Export the two-page PDF for one credential
//! diploma export template.json --context student.json --out-dir ./out
//!
//! # Run the HTTP service
//! diploma serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use diploma::{
    Config, DiplomaError, Template,
    binding::{Binding, BindingContext, MetadataEntry},
    export::{BackgroundSource, Exporter, HttpBackgroundSource},
    render::{self, RenderTarget, fonts::FontBook},
    template::{Page, default_template},
};

/// Diploma - certificate template engine
#[derive(Parser, Debug)]
#[command(name = "diploma")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file (missing keys keep their defaults)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory with <Family>-Bold.ttf font files
    #[arg(long, global = true, value_name = "DIR")]
    fonts: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default two-page template
    Init {
        /// Output file (stdout when omitted)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Normalize a stored template document into the current shape
    Normalize {
        /// Stored template JSON
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Render one page to PNG
    Preview {
        /// Template JSON
        template: PathBuf,

        /// Page to render
        #[arg(long, default_value = "front", value_parser = parse_page)]
        page: Page,

        /// Surface width in pixels (export resolution when omitted)
        #[arg(long)]
        width: Option<u32>,

        /// Binding context JSON (sample values when omitted)
        #[arg(long, value_name = "FILE")]
        context: Option<PathBuf>,

        /// Course metadata JSON: [{"key": ..., "value": ...}]
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,

        /// Output PNG
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Export the two-page certificate PDF
    Export {
        /// Template JSON
        template: PathBuf,

        /// Binding context JSON
        #[arg(long, value_name = "FILE")]
        context: PathBuf,

        /// Course metadata JSON: [{"key": ..., "value": ...}]
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,

        /// Directory the PDF is written to
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },

    /// Run the HTTP service
    Serve {
        /// Address to listen on
        #[arg(long)]
        listen: Option<String>,

        /// Directory uploaded backgrounds are stored in
        #[arg(long, value_name = "DIR")]
        uploads: Option<PathBuf>,
    },
}

fn parse_page(s: &str) -> Result<Page, String> {
    Page::parse(s).ok_or_else(|| format!("unknown page '{}', expected front or back", s))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("diploma=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config, DiplomaError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(fonts) = &cli.fonts {
        config.fonts_dir = Some(fonts.clone());
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DiplomaError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn read_template(path: &Path) -> Result<Template, DiplomaError> {
    let text = std::fs::read_to_string(path)?;
    Ok(Template::from_json(&text)?.normalize())
}

fn write_output(out: Option<&Path>, text: &str) -> Result<(), DiplomaError> {
    match out {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

async fn run() -> Result<(), DiplomaError> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Init { out } => {
            let json = serde_json::to_string_pretty(&default_template())?;
            write_output(out.as_deref(), &json)
        }

        Commands::Normalize { input, out } => {
            let template = read_template(&input)?;
            template.validate()?;
            let json = serde_json::to_string_pretty(&template)?;
            write_output(out.as_deref(), &json)
        }

        Commands::Preview {
            template,
            page,
            width,
            context,
            metadata,
            out,
        } => {
            config.validate()?;
            let template = read_template(&template)?;
            let context = context
                .as_deref()
                .map(read_json::<BindingContext>)
                .transpose()?;
            let metadata = metadata
                .as_deref()
                .map(read_json::<Vec<MetadataEntry>>)
                .transpose()?
                .unwrap_or_default();

            let url = template.background(page);
            let background = if url.trim().is_empty() {
                None
            } else {
                Some(
                    HttpBackgroundSource::new(&config)?
                        .allow_file_urls()
                        .fetch(url)
                        .await?,
                )
            };

            let binding = match &context {
                Some(ctx) => Binding::bound(ctx, &metadata),
                None => Binding::Sample,
            };
            let target = match width {
                Some(width) => RenderTarget::Screen { width },
                None => RenderTarget::Export,
            };
            let fonts = FontBook::load(config.fonts_dir.as_deref());
            let png = render::render_page_png(
                &template,
                &binding,
                page,
                target,
                background.as_ref(),
                &fonts,
                &config,
            )?;
            std::fs::write(&out, png)?;
            println!("Saved {} page to {}", page, out.display());
            Ok(())
        }

        Commands::Export {
            template,
            context,
            metadata,
            out_dir,
        } => {
            config.validate()?;
            let template = read_template(&template)?;
            let context: BindingContext = read_json(&context)?;
            let metadata = metadata
                .as_deref()
                .map(read_json::<Vec<MetadataEntry>>)
                .transpose()?
                .unwrap_or_default();

            let source = Arc::new(HttpBackgroundSource::new(&config)?.allow_file_urls());
            let fonts = Arc::new(FontBook::load(config.fonts_dir.as_deref()));
            let exporter = Exporter::new(Arc::new(config), fonts, source);
            let artifact = exporter.export(&template, &context, &metadata).await?;
            let path = artifact.write_to(&out_dir)?;
            for (page, info) in [Page::Front, Page::Back].iter().zip(&artifact.pages) {
                println!(
                    "  {}: {}x{} px, {:?}",
                    page, info.width_px, info.height_px, info.orientation
                );
            }
            println!("Saved {}", path.display());
            Ok(())
        }

        Commands::Serve { listen, uploads } => {
            if let Some(listen) = listen {
                config.listen_addr = listen;
            }
            if let Some(uploads) = uploads {
                config.uploads_dir = uploads;
            }
            diploma::server::serve(config).await
        }
    }
}
