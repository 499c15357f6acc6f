//! Media normalization for tendero.
//!
//! Inbound images and voice notes arrive in whatever container the
//! messaging platform (or the user's cloud drive) hands us. This crate
//! turns them into the two canonical shapes the model clients accept: a
//! width- and byte-bounded JPEG, and a mono 16 kHz WAV behind a scoped
//! temp-file handle.

pub mod audio;
pub mod fetch;
pub mod image;
pub mod tmp;

pub use audio::{normalize_audio, rewrite_share_link, AudioContainer, NormalizedAudio};
pub use image::normalize_image;
pub use tmp::TempPath;
