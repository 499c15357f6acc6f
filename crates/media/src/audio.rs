//! Audio normalization.
//!
//! Voice notes arrive as Ogg/Opus, M4A, WebM, or whatever a cloud-drive
//! share link serves. Upstream servers routinely lie in `Content-Type`,
//! so validation sniffs magic numbers from the real bytes, then an
//! external transcoder produces the one canonical waveform format the
//! transcription API accepts.

use std::path::Path;

use url::Url;

use tendero_core::config::MediaConfig;
use tendero_core::{Error, MediaReference, Result};

use crate::fetch::{body_sample, fetch_bytes};
use crate::image::decode_inline;
use crate::tmp::TempPath;

/// Canonical waveform parameters: mono, 16 kHz.
const TARGET_CHANNELS: u32 = 1;
const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Audio-bearing container recognized by magic-number sniffing. MP4 and
/// WebM count: video notes carry an audio track worth transcribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContainer {
    Wav,
    Ogg,
    Mp3,
    Flac,
    Webm,
    Mp4,
}

impl AudioContainer {
    /// File extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioContainer::Wav => "wav",
            AudioContainer::Ogg => "ogg",
            AudioContainer::Mp3 => "mp3",
            AudioContainer::Flac => "flac",
            AudioContainer::Webm => "webm",
            AudioContainer::Mp4 => "mp4",
        }
    }

    /// Detect a container from leading bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        if data.starts_with(b"RIFF") && data.len() > 11 && &data[8..12] == b"WAVE" {
            return Some(AudioContainer::Wav);
        }
        if data.starts_with(b"OggS") {
            return Some(AudioContainer::Ogg);
        }
        if data.starts_with(b"fLaC") {
            return Some(AudioContainer::Flac);
        }
        if data.starts_with(b"ID3") {
            return Some(AudioContainer::Mp3);
        }
        // Bare MPEG audio frame sync: 11 set bits.
        if data[0] == 0xFF && (data[1] & 0xE0) == 0xE0 {
            return Some(AudioContainer::Mp3);
        }
        if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(AudioContainer::Webm);
        }
        if data.len() > 11 && &data[4..8] == b"ftyp" {
            return Some(AudioContainer::Mp4);
        }

        None
    }
}

/// Handle to the canonical transcoded file. The file is deleted when the
/// handle is disposed or dropped, whichever comes first.
#[derive(Debug)]
pub struct NormalizedAudio {
    file: TempPath,
}

impl NormalizedAudio {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Open the canonical file for streaming reads.
    pub async fn open(&self) -> Result<tokio::fs::File> {
        Ok(tokio::fs::File::open(self.file.path()).await?)
    }

    /// Read the whole canonical file.
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.file.path()).await?)
    }

    /// Delete the canonical file. Dropping the handle does the same; this
    /// just makes the release point explicit at call sites.
    pub fn dispose(self) {}
}

/// Resolve a media reference into a canonical mono 16 kHz WAV on disk.
pub async fn normalize_audio(
    cfg: &MediaConfig,
    http: &reqwest::Client,
    source: &MediaReference,
) -> Result<NormalizedAudio> {
    let (bytes, declared) = match source {
        MediaReference::Url(raw) => {
            let direct = rewrite_share_link(raw);
            if direct != *raw {
                tracing::debug!(from = %raw, to = %direct, "Rewrote share link");
            }
            let (bytes, content_type) = fetch_bytes(http, &direct, cfg.max_download_bytes).await?;
            (bytes, Some(content_type))
        }
        MediaReference::Inline { data, content_type } => {
            (decode_inline(data)?, content_type.clone())
        }
    };

    let container = check_audio_content(declared.as_deref(), &bytes)?;

    let input = TempPath::new(container.map(|c| c.extension()).unwrap_or("bin"));
    tokio::fs::write(input.path(), &bytes).await?;

    // `input` is dropped (and its file removed) as soon as the transcode
    // concludes, success or failure.
    transcode_to_wav(cfg, &input).await.map(|file| NormalizedAudio { file })
}

/// Accept content when either the declared header or the sniffed container
/// says audio/video; reject with a body sample otherwise.
fn check_audio_content(
    declared: Option<&str>,
    bytes: &[u8],
) -> Result<Option<AudioContainer>> {
    let header_ok = declared
        .map(|ct| ct.starts_with("audio/") || ct.starts_with("video/"))
        .unwrap_or(false);
    let sniffed = AudioContainer::detect(bytes);

    if !header_ok && sniffed.is_none() {
        return Err(Error::NotAudio {
            content_type: declared.unwrap_or("unknown").to_string(),
            sample: body_sample(bytes),
        });
    }

    Ok(sniffed)
}

/// Run the external transcoder into a fresh scoped temp file.
async fn transcode_to_wav(cfg: &MediaConfig, input: &TempPath) -> Result<TempPath> {
    let output = TempPath::new("wav");

    let result = tokio::process::Command::new(&cfg.ffmpeg_path)
        .arg("-y")
        .arg("-i")
        .arg(input.path())
        .args(["-ac", &TARGET_CHANNELS.to_string()])
        .args(["-ar", &TARGET_SAMPLE_RATE.to_string()])
        .args(["-f", "wav"])
        .arg(output.path())
        .output()
        .await;

    let out = match result {
        Ok(out) => out,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::transcode(format!(
                "transcoder not found: {}",
                cfg.ffmpeg_path
            )));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        let tail: String = stderr
            .chars()
            .rev()
            .take(300)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return Err(Error::transcode(format!(
            "{} exited with {}: {}",
            cfg.ffmpeg_path, out.status, tail
        )));
    }

    tracing::debug!(output = %output.path().display(), "Transcoded audio to canonical WAV");

    Ok(output)
}

/// Rewrite well-known share-link patterns into direct downloads. Unknown
/// hosts and unparseable URLs pass through untouched.
pub fn rewrite_share_link(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };

    match url.host_str() {
        Some("drive.google.com") => {
            let segments: Vec<&str> = url
                .path_segments()
                .map(|s| s.collect())
                .unwrap_or_default();
            // /file/d/<id>/view and /open?id=<id> forms
            if segments.len() >= 3 && segments[0] == "file" && segments[1] == "d" {
                return format!(
                    "https://drive.google.com/uc?export=download&id={}",
                    segments[2]
                );
            }
            if segments.first() == Some(&"open") {
                if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "id") {
                    return format!("https://drive.google.com/uc?export=download&id={}", id);
                }
            }
            raw.to_string()
        }
        Some("www.dropbox.com") | Some("dropbox.com") => {
            let mut direct = url.clone();
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "dl")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            direct.set_query(None);
            {
                let mut pairs = direct.query_pairs_mut();
                for (k, v) in &kept {
                    pairs.append_pair(k, v);
                }
                pairs.append_pair("dl", "1");
            }
            direct.to_string()
        }
        _ => raw.to_string(),
    }
}
