use clap::{Parser, ValueEnum};
use gallery_harvest::export::ExportFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gallery-harvest")]
#[command(about = "Collects full-resolution product images from every variant of a product page")]
#[command(version)]
pub struct Args {
    /// Product page URL
    pub url: String,

    /// Only harvest the variant the page shows on load
    #[arg(long)]
    pub only_main: bool,

    /// Path to a JSON scan configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver server URL (overrides the configuration file)
    #[arg(short, long)]
    pub webdriver_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Output file (defaults to a name derived from the page title)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Csv,
}

/// Convert from CLI argument format to export format
pub fn convert_format(arg: FormatArg) -> ExportFormat {
    match arg {
        FormatArg::Json => ExportFormat::Json,
        FormatArg::Csv => ExportFormat::Csv,
    }
}
