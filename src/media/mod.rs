//! Upload validation and media processing: MIME allow-lists, image
//! re-encoding, and audio duration probing.

use std::io::Cursor;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpg",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/octet-stream",
];

pub const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/m4a",
    "audio/x-m4a",
    "audio/aac",
    "application/octet-stream",
];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{name} is not a valid {kind} file")]
    InvalidFileType { name: String, kind: &'static str },

    #[error("{field} is required")]
    Required { field: String },

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("audio probing failed: {0}")]
    Audio(String),
}

/// One file from a multipart request, grouped by its form field name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn extension(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

pub fn files_for<'a>(files: &'a [UploadedFile], field: &str) -> Vec<&'a UploadedFile> {
    files.iter().filter(|f| f.field == field).collect()
}

/// Reject any file whose MIME type is not on the allow-list. Runs before
/// any upload is attempted.
pub fn ensure_allowed(
    files: &[&UploadedFile],
    allowed: &[&str],
    kind: &'static str,
) -> Result<(), MediaError> {
    for file in files {
        if !allowed.contains(&file.content_type.as_str()) {
            return Err(MediaError::InvalidFileType {
                name: file.name.clone(),
                kind,
            });
        }
    }
    Ok(())
}

/// Re-encode an image as JPEG at the given quality.
pub fn transcode_image(bytes: &[u8], quality: u8) -> Result<Vec<u8>, MediaError> {
    let img = image::load_from_memory(bytes).map_err(|e| MediaError::Image(e.to_string()))?;
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| MediaError::Image(e.to_string()))?;
    Ok(out)
}

/// Decode an audio file far enough to measure its duration, rounded to the
/// nearest whole second.
pub fn audio_duration_secs(
    bytes: Vec<u8>,
    extension: Option<&str>,
) -> Result<u64, MediaError> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| MediaError::Audio(e.to_string()))?;
    let mut format = probed.format;

    let (time_base, n_frames, track_id) = {
        let track = format
            .default_track()
            .ok_or_else(|| MediaError::Audio("no audio track".to_string()))?;
        (
            track.codec_params.time_base,
            track.codec_params.n_frames,
            track.id,
        )
    };
    let time_base =
        time_base.ok_or_else(|| MediaError::Audio("unknown time base".to_string()))?;

    let frames = match n_frames {
        Some(n) => n,
        None => {
            // Container does not declare a length; walk the packets.
            let mut total: u64 = 0;
            while let Ok(packet) = format.next_packet() {
                if packet.track_id() == track_id {
                    total += packet.dur;
                }
            }
            total
        }
    };

    let time = time_base.calc_time(frames);
    let seconds = time.seconds as f64 + time.frac;
    Ok(seconds.round() as u64)
}
