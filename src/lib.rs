// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses flags, sets up logging and hands off to `ui`.
//
// Module responsibilities:
// - `api`: blocking HTTP client for the remote drive (token check, folders,
//   upload-from-url, operation status, file metadata).
// - `image`: builds caption links for the cat picture service.
// - `manifest`: the JSON record written after a successful upload.
// - `cli`: command-line flags and their conversion into run settings.
// - `ui`: the step-by-step upload flow and its console output.
pub mod api;
pub mod cli;
pub mod image;
pub mod manifest;
pub mod ui;
