// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, build the two collaborators and hand
//   them to the upload flow.
// - Failed uploads are reported on stdout and still exit with status 0;
//   only setup problems (bad token format, unwritable manifest) exit non-zero.

use anyhow::Context;
use catdisk::api::DiskClient;
use catdisk::cli::Cli;
use catdisk::image::CatImageProvider;
use catdisk::ui::{print_banner, run_upload, Outcome};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let request = cli.request();
    print_banner(&request);

    let drive = DiskClient::new(&cli.api_url, &cli.token, cli.timeout())
        .context("Failed to build drive client")?;
    let images = CatImageProvider::new(&cli.image_url);

    match run_upload(&drive, &images, &request, &cli.run_settings())? {
        Outcome::Completed { manifest_path, .. } => {
            info!(path = %manifest_path.display(), "run completed")
        }
        Outcome::Aborted(stage) => info!(%stage, "run aborted"),
        Outcome::FileMissing => info!("run finished without a file"),
    }
    Ok(())
}

/// Log to stderr so the console report on stdout stays readable.
/// `RUST_LOG` wins over `--verbose` when set.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
