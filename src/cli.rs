// Command-line arguments. The three required flags describe one upload;
// the rest point the program at other endpoints or tune the polling and
// mostly exist for testing against local servers.

use crate::api::DEFAULT_API_URL;
use crate::image::DEFAULT_IMAGE_URL;
use crate::manifest::DEFAULT_VIEWER_URL;
use crate::ui::{PollSettings, RunSettings, UploadRequest};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "catdisk",
    about = "Upload a cat picture with a caption to a remote drive"
)]
pub struct Cli {
    /// Caption drawn on the picture; also the file name on the drive
    #[arg(long)]
    pub text: String,

    /// OAuth token for the drive
    #[arg(long, env = "YADISK_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Destination folder on the drive
    #[arg(long)]
    pub group: String,

    /// Base URL of the drive REST API
    #[arg(long, env = "YADISK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Base URL of the cat picture service
    #[arg(long, env = "CATAAS_URL", default_value = DEFAULT_IMAGE_URL)]
    pub image_url: String,

    /// Prefix of the folder link written to the manifest
    #[arg(long, env = "YADISK_VIEWER_URL", default_value = DEFAULT_VIEWER_URL)]
    pub viewer_url: String,

    /// Directory the manifest is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// How many times to ask for the upload status
    #[arg(long, default_value_t = 20)]
    pub poll_attempts: u32,

    /// Seconds between status requests
    #[arg(long, default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log HTTP calls and state changes to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn request(&self) -> UploadRequest {
        UploadRequest {
            text: self.text.clone(),
            group: self.group.clone(),
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            poll: PollSettings {
                attempts: self.poll_attempts,
                interval: Duration::from_secs(self.poll_interval_secs),
            },
            output_dir: self.output_dir.clone(),
            viewer_url: self.viewer_url.clone(),
            show_progress: true,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
