// UI layer: runs the upload flow step by step and reports each step on the
// console. Steps run strictly in order; the first one that fails prints an
// error line and ends the run without touching anything else.

use crate::api::{OperationState, OperationStatus, RemoteDrive};
use crate::image::CatImageProvider;
use crate::manifest::{self, Manifest};
use anyhow::Result;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What to upload and where.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub text: String,
    pub group: String,
}

impl UploadRequest {
    /// File name on the drive: the caption plus `.jpg`.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.text)
    }

    /// Destination path on the drive, relative to the drive root.
    pub fn file_path(&self) -> String {
        format!("{}/{}", self.group, self.file_name())
    }
}

/// How long to keep asking about an upload operation.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            attempts: 20,
            interval: Duration::from_secs(2),
        }
    }
}

/// Everything the flow needs besides its two collaborators.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub poll: PollSettings,
    pub output_dir: PathBuf,
    pub viewer_url: String,
    /// Draw the progress bar. Off in tests.
    pub show_progress: bool,
}

/// Step at which a run gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Token,
    Folder,
    ImageLink,
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Token => "token check",
            Stage::Folder => "folder creation",
            Stage::ImageLink => "image link",
            Stage::Upload => "upload start",
        };
        f.write_str(name)
    }
}

/// How the polling loop ended.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Succeeded,
    Failed(OperationStatus),
    /// Ran out of attempts without a terminal status.
    Exhausted,
}

/// How a whole run ended. None of these is reported through the exit code.
#[derive(Debug)]
pub enum Outcome {
    Completed {
        manifest: Manifest,
        manifest_path: PathBuf,
    },
    Aborted(Stage),
    /// The upload was started but the file could not be found afterwards.
    FileMissing,
}

/// Print the banner shown before any work starts.
pub fn print_banner(request: &UploadRequest) {
    println!("=== Uploading a cat picture to the remote drive ===");
    println!("Caption: {}", request.text);
    println!("Group (folder): {}", request.group);
    println!("{}", "=".repeat(50));
}

/// Run the full flow: check the token, make sure the folder exists, ask the
/// drive to fetch the picture, wait for it, then record the result.
///
/// Only a failure to write the manifest is returned as an error; every
/// remote failure ends in an `Outcome` after printing a message.
pub fn run_upload<D: RemoteDrive>(
    drive: &D,
    images: &CatImageProvider,
    request: &UploadRequest,
    settings: &RunSettings,
) -> Result<Outcome> {
    println!("Checking drive token...");
    if let Err(err) = drive.check_token() {
        warn!(error = %err, "token check failed");
        return Ok(abort(Stage::Token, "invalid drive token"));
    }
    println!("OK: token is valid");

    println!("Creating folder on the drive...");
    match drive.create_folder(&request.group) {
        Ok(state) => debug!(?state, group = %request.group, "folder ready"),
        Err(err) => {
            warn!(error = %err, group = %request.group, "folder creation failed");
            return Ok(abort(Stage::Folder, "could not create folder, stopping"));
        }
    }
    println!("OK: folder exists on the drive");

    println!("Building cat picture link...");
    let source_url = match images.cat_with_text(&request.text) {
        Ok(url) => url,
        Err(err) => {
            warn!(error = %err, "image link rejected");
            return Ok(abort(Stage::ImageLink, "could not get cat picture, stopping"));
        }
    };
    println!("OK: picture link: {source_url}");

    let file_name = request.file_name();
    let file_path = request.file_path();
    println!("File name on the drive: {file_name}");
    println!("Full path: {file_path}");

    println!("Starting upload...");
    let operation_id = match drive.upload_from_url(&source_url, &file_path) {
        Ok(id) => id,
        Err(err) => {
            warn!(error = %err, "upload was not accepted");
            return Ok(abort(Stage::Upload, "upload could not be started"));
        }
    };
    info!(%operation_id, "upload accepted");

    println!("Tracking upload progress...");
    let bar = progress_bar(settings.show_progress);
    let polled = wait_for_operation(drive, &operation_id, &settings.poll, &bar);
    bar.finish();
    debug!(?polled, "polling finished");
    // A failed or unfinished operation still falls through to the file
    // lookup below; only the lookup decides whether the run succeeded.

    let info = match drive.file_info(&file_path) {
        Ok(info) => info,
        Err(err) => {
            warn!(error = %err, path = %file_path, "file lookup failed");
            println!("\nERROR: could not upload file to the drive");
            return Ok(Outcome::FileMissing);
        }
    };

    let now = Local::now();
    let manifest = Manifest {
        timestamp: Manifest::timestamp_for(&now),
        group_name: request.group.clone(),
        text: request.text.clone(),
        file_name: file_name.clone(),
        file_size: info.size,
        file_path: info.path,
        yandex_disk_url: manifest::viewer_url(&settings.viewer_url, &request.group),
        source_url: source_url.clone(),
    };
    let manifest_path = manifest.write_to(&settings.output_dir, &now)?;
    info!(path = %manifest_path.display(), "manifest written");

    println!("\n=== UPLOAD COMPLETED ===");
    println!("Caption: {}", request.text);
    println!("File name: {file_name}");
    println!("File size: {} bytes", manifest.file_size);
    println!("Path on the drive: {file_path}");
    println!("Open on the drive: {}", manifest.yandex_disk_url);
    println!("Details saved to: {}", manifest_path.display());

    Ok(Outcome::Completed {
        manifest,
        manifest_path,
    })
}

fn abort(stage: Stage, message: &str) -> Outcome {
    println!("ERROR: {message}");
    Outcome::Aborted(stage)
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    // the template is a literal; fall back to the default style if it ever breaks
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}%") {
        bar.set_style(style);
    }
    bar.set_message("Uploading file");
    bar
}

/// Poll `operation_id` until it reaches a terminal state or the attempts
/// run out. The bar is kept at the highest percentage seen so far and
/// jumps to 100 on success. A status that cannot be read just costs one
/// attempt and one interval.
pub fn wait_for_operation<D: RemoteDrive>(
    drive: &D,
    operation_id: &str,
    poll: &PollSettings,
    bar: &ProgressBar,
) -> PollOutcome {
    for attempt in 1..=poll.attempts {
        let status = match drive.operation_status(operation_id) {
            Ok(status) => status,
            Err(err) => {
                debug!(attempt, error = %err, "operation status unavailable");
                thread::sleep(poll.interval);
                continue;
            }
        };

        match status.status {
            OperationState::Success => {
                bar.set_position(100);
                return PollOutcome::Succeeded;
            }
            OperationState::Failed => {
                bar.set_message("Upload failed");
                bar.suspend(|| println!("{}", failure_line(&status)));
                return PollOutcome::Failed(status);
            }
            OperationState::InProgress => {
                let percent = percent_of(status.progress);
                if percent > bar.position() {
                    bar.set_position(percent);
                }
                debug!(attempt, percent, "upload in progress");
                thread::sleep(poll.interval);
            }
        }
    }
    warn!(attempts = poll.attempts, "operation did not finish in time");
    PollOutcome::Exhausted
}

/// Console line for a failed operation, carrying the payload as received.
fn failure_line(status: &OperationStatus) -> String {
    format!("ERROR: upload failed: {}", status.raw)
}

/// `0.0..=1.0` fraction to whole percent, truncating like a progress
/// counter would. Out-of-range values are clamped.
fn percent_of(fraction: f64) -> u64 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction * 100.0).clamp(0.0, 100.0) as u64
}
