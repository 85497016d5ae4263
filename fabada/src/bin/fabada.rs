//! FABADA command-line denoiser for FITS images
//!
//! Reads an image HDU, resolves the noise variance (a number, a variance map
//! in another FITS file, or an estimate from the image), runs FABADA and
//! writes the estimate, plus the residuals when asked.
//!
//! Usage:
//! ```text
//! fabada image.fits 25.0 --out clean.fits --res true
//! fabada cube.fits variance.fits --hdu SCI --noise-hdu VAR --iter 500
//! fabada image.fits auto --verbose false
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use fabada::cli::{output_paths, resolve_variance, CliArgs};
use fabada::io::fits::{read_image, write_image};
use fabada::{Fabada, FabadaConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = args
        .engine_config()
        .context("Invalid engine configuration")?;

    init_tracing(config.verbose);
    run(&args, config)
}

fn run(args: &CliArgs, config: FabadaConfig) -> Result<()> {
    info!(
        "Starting smoothing with fabada in {} image...",
        args.filename.display()
    );

    let image = read_image(&args.filename, &args.hdu).with_context(|| {
        format!(
            "Failed to read HDU {} of {}",
            args.hdu,
            args.filename.display()
        )
    })?;

    let variance = resolve_variance(&args.noise, &args.noise_hdu, &image.data)
        .with_context(|| format!("Failed to resolve {}", args.noise))?;

    let result = Fabada::new(config)
        .run(image.data.view(), &variance)
        .context("FABADA failed")?;

    let paths = output_paths(&args.filename, args.out.as_deref());
    let run_cards = [
        ("FABITER", result.report.iterations.to_string()),
        (
            "FABCONV",
            if result.report.converged { "T" } else { "F" }.to_string(),
        ),
        ("FABCHI2", format!("{:.6}", result.report.reduced_chi2)),
    ];

    info!("Saving result in {}", paths.estimate.display());
    let mut cards = vec![("COMMENTS", "FABADA smooth estimation".to_string())];
    cards.extend(run_cards.iter().cloned());
    write_image(&paths.estimate, "FABADA", &result.estimate.view(), &cards)
        .with_context(|| format!("Failed to write {}", paths.estimate.display()))?;

    if args.res {
        info!("Saving residuals in {}", paths.residuals.display());
        let residuals = result.residuals(&image.data.view());
        let mut cards = vec![("COMMENTS", "FABADA smooth residuals".to_string())];
        cards.extend(run_cards.iter().cloned());
        write_image(&paths.residuals, "RESIDUALS", &residuals.view(), &cards)
            .with_context(|| format!("Failed to write {}", paths.residuals.display()))?;
    }

    Ok(())
}
