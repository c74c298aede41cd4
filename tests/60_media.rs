use anyhow::Result;
use std::io::Cursor;

use medina_api::media::{
    audio_duration_secs, ensure_allowed, files_for, transcode_image, UploadedFile,
    AUDIO_MIME_TYPES, IMAGE_MIME_TYPES,
};
use medina_api::storage::{audio_key, image_key, key_from_url};

fn file(field: &str, name: &str, content_type: &str, bytes: Vec<u8>) -> UploadedFile {
    UploadedFile {
        field: field.to_string(),
        name: name.to_string(),
        content_type: content_type.to_string(),
        bytes,
    }
}

#[test]
fn disallowed_mime_is_rejected_before_any_upload_naming_the_file() -> Result<()> {
    let files = vec![
        file("image", "ok.png", "image/png", vec![]),
        file("image", "evil.exe", "application/x-msdownload", vec![]),
    ];
    let targets = files_for(&files, "image");

    // Validation runs over the full target set up front; the offending file
    // is named and nothing has been transcoded or uploaded yet.
    let err = ensure_allowed(&targets, IMAGE_MIME_TYPES, "image").unwrap_err();
    assert_eq!(err.to_string(), "evil.exe is not a valid image file");
    Ok(())
}

#[test]
fn audio_allow_list_differs_from_image_allow_list() -> Result<()> {
    let mp3 = file("audio", "a.mp3", "audio/mpeg", vec![]);
    assert!(ensure_allowed(&[&mp3], AUDIO_MIME_TYPES, "audio").is_ok());
    let err = ensure_allowed(&[&mp3], IMAGE_MIME_TYPES, "image").unwrap_err();
    assert_eq!(err.to_string(), "a.mp3 is not a valid image file");
    Ok(())
}

#[test]
fn image_transcode_emits_jpeg_bytes() -> Result<()> {
    let mut png = Vec::new();
    image::RgbImage::from_pixel(8, 8, image::Rgb([0, 120, 240]))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;

    let jpeg = transcode_image(&png, 80).unwrap();
    assert_eq!(image::guess_format(&jpeg)?, image::ImageFormat::Jpeg);
    Ok(())
}

#[test]
fn wav_duration_rounds_to_whole_seconds() -> Result<()> {
    // 2-second mono 16-bit PCM WAV at 8 kHz
    let rate: u32 = 8000;
    let samples = rate * 2;
    let data_len = samples * 2;
    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&rate.to_le_bytes());
    wav.extend_from_slice(&(rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(wav.len() + data_len as usize, 0);

    assert_eq!(audio_duration_secs(wav, Some("wav")).unwrap(), 2);
    Ok(())
}

#[test]
fn object_keys_namespace_by_folder_and_prefix() -> Result<()> {
    let image = image_key("banners", "banner");
    assert!(image.starts_with("banners/banner-"));
    assert!(image.ends_with(".jpg"));

    let audio = audio_key("episodes", "episode", "intro.mp3");
    assert!(audio.starts_with("episodes/episode-"));
    assert!(audio.ends_with("-intro.mp3"));
    Ok(())
}

#[test]
fn delete_key_derivation_round_trips_the_public_url() -> Result<()> {
    let key = audio_key("episodes", "episode", "intro.mp3");
    let url = format!("https://bucket.s3.amazonaws.com/{}", key);
    assert_eq!(key_from_url(&url, "episodes", "episode"), Some(key));

    // unrelated URLs and junk both degrade to None
    assert_eq!(
        key_from_url("https://bucket.s3.amazonaws.com/misc/a.png", "episodes", "episode"),
        None
    );
    assert_eq!(key_from_url("::::", "episodes", "episode"), None);
    Ok(())
}
