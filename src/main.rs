use clap::Parser;
use gallery_harvest::export;
use gallery_harvest::results::{ScanProgress, ScanResult};
use gallery_harvest::scan::HarvestOutcome;
use gallery_harvest::utils::{sanitize_filename, short_label};
use gallery_harvest::Scanner;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::mpsc;

mod args;
use args::{Args, convert_format};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!("Starting scan for: {}", args.url);
    println!("Note: scanning requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
    );

    let mut scanner = Scanner::new(&args.url).with_only_main(args.only_main);
    if let Some(path) = &args.config {
        scanner = match scanner.with_config_file(path) {
            Ok(scanner) => scanner,
            Err(e) => {
                ::log::error!("Failed to load configuration {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        };
    }
    if let Some(webdriver_url) = &args.webdriver_url {
        scanner = scanner.with_webdriver_url(webdriver_url);
    }

    let (progress_tx, mut progress_rx) = mpsc::channel(32);
    let printer = async move {
        while let Some(event) = progress_rx.recv().await {
            print_progress(&event);
        }
    };

    let start_time = std::time::Instant::now();
    let (result, ()) = tokio::join!(scanner.run(Some(progress_tx)), printer);

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            ::log::error!("Scan failed: {}", e);
            eprintln!("Scan failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!(
        "Scan complete - {} images in {:.2} seconds",
        result.total_images(),
        start_time.elapsed().as_secs_f64()
    );

    let format = convert_format(args.format);
    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}",
            sanitize_filename(&result.title),
            format.extension()
        ))
    });

    match write_result(&result, format, &output) {
        Ok(()) => {
            println!(
                "Saved {} main and {} variant images to {}",
                result.main_images.len(),
                result.variant_images.len(),
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Failed to write {}: {}", output.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn write_result(
    result: &ScanResult,
    format: export::ExportFormat,
    path: &Path,
) -> gallery_harvest::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    export::export(result, format, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn print_progress(event: &ScanProgress) {
    match event {
        ScanProgress::VariantsDiscovered { count, .. } if *count == 0 => {
            println!("No variants found, scanning the current page");
        }
        ScanProgress::VariantsDiscovered {
            count,
            initial_index,
        } => {
            println!(
                "Found {} variants (main is #{})",
                count,
                initial_index + 1
            );
        }
        ScanProgress::VariantStarted {
            index,
            total,
            label,
        } => {
            println!("Variant {}/{}: {}", index + 1, total, short_label(label));
        }
        ScanProgress::VariantSkipped { index } => {
            ::log::debug!("Skipped variant {}", index + 1);
        }
        ScanProgress::VariantHarvested {
            outcome,
            main_count,
            variant_count,
            ..
        } => {
            let note = match outcome {
                HarvestOutcome::NoTrigger => " (no main image)",
                HarvestOutcome::OverlayMissing => " (gallery did not open)",
                HarvestOutcome::Harvested(_) => "",
            };
            println!(
                "  +{} images{} - main {}, variants {}",
                outcome.added(),
                note,
                main_count,
                variant_count
            );
        }
        ScanProgress::Completed {
            main_count,
            variant_count,
        } => {
            println!(
                "Scan complete: {} main, {} variant images",
                main_count, variant_count
            );
        }
    }
}
