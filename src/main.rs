use clap::{Parser, Subcommand};
use exif_scout::commands::Backend;
use exif_scout::scoring::ContrastScorer;
use exif_scout::walker::ScanOptions;
use exif_scout::{config, logging, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "exif-scout")]
#[command(about = "Read EXIF metadata and find your best-scoring photos")]
#[command(long_about = "\
Read EXIF metadata and find your best-scoring photos

  exif-scout exif photo.jpg          # every EXIF field, in directory order
  exif-scout scan ~/Pictures -m 0.6  # images scoring at least 0.6, best first

Supported containers: JPEG, TIFF, PNG, WebP, HEIF/HEIC, AVIF (metadata only
for HEIF and AVIF) and BMP (no metadata).

The built-in scorer measures luminance contrast. Scores range from 0 to 1.

Run 'exif-scout gen-config' to generate a documented exif-scout.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./exif-scout.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the EXIF fields of an image
    Exif {
        file: PathBuf,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Find images under a directory whose score reaches a threshold
    Scan {
        dir: PathBuf,
        /// Minimum score (inclusive)
        #[arg(short, long, default_value_t = 0.5)]
        min_score: f64,
        /// Only scan the top level of the directory
        #[arg(long)]
        no_recursive: bool,
        /// Include dot-files and system folders
        #[arg(long)]
        include_hidden: bool,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print a stock exif-scout.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Exif { file, json } => {
            let app_config = init(cli.config.as_deref(), cli.verbose)?;
            let backend = Backend::new(Arc::new(ContrastScorer), ScanOptions::from_config(&app_config));
            let fields = backend.read_exif(file.to_string_lossy().into_owned()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&fields)?);
            } else {
                output::print_fields(&fields);
            }
        }
        Command::Scan {
            dir,
            min_score,
            no_recursive,
            include_hidden,
            json,
        } => {
            let app_config = init(cli.config.as_deref(), cli.verbose)?;
            let mut options = ScanOptions::from_config(&app_config);
            options.recursive &= !no_recursive;
            options.include_hidden |= include_hidden;
            let backend = Backend::new(Arc::new(ContrastScorer), options);
            let summary = backend
                .scan(dir.to_string_lossy().into_owned(), min_score)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary.matches)?);
            } else {
                output::print_summary(&summary);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and install logging from it.
fn init(config_path: Option<&Path>, verbose: bool) -> Result<config::AppConfig, config::ConfigError> {
    // An explicit --config must exist; only the default file is optional
    if let Some(path) = config_path.filter(|p| !p.exists()) {
        return Err(config::ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", path.display()),
        )));
    }
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
    let app_config = config::load_config(&path)?;
    logging::init_logging(&app_config.logging.filter, verbose);
    Ok(app_config)
}
