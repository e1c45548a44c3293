//! Audio track extraction for transcription.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Sample rate expected by speech-to-text models.
pub const TRANSCRIPTION_SAMPLE_RATE: u32 = 16_000;

/// Path of the WAV file `extract_audio` writes for `clip`.
pub fn audio_path_for(clip: &Path, output_dir: &Path) -> MediaResult<PathBuf> {
    let stem = clip
        .file_stem()
        .ok_or_else(|| MediaError::InvalidVideo(format!("no file name: {}", clip.display())))?;
    Ok(output_dir.join(stem).with_extension("wav"))
}

/// Extract `clip`'s audio as 16 kHz mono 16-bit PCM WAV into `output_dir`.
///
/// The file is named after the clip (`output_0_0_12.mp4` -> `output_0_0_12.wav`).
pub async fn extract_audio(
    runner: &FfmpegRunner,
    clip: &Path,
    output_dir: &Path,
) -> MediaResult<PathBuf> {
    if !clip.exists() {
        return Err(MediaError::FileNotFound(clip.to_path_buf()));
    }
    tokio::fs::create_dir_all(output_dir).await?;

    let output = audio_path_for(clip, output_dir)?;
    let cmd = FfmpegCommand::new(clip, &output)
        .no_video()
        .audio_codec("pcm_s16le")
        .audio_sample_rate(TRANSCRIPTION_SAMPLE_RATE)
        .audio_channels(1);

    runner.run(&cmd).await?;
    debug!(clip = %clip.display(), audio = %output.display(), "Audio extracted");

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_path_named_after_clip() {
        let path = audio_path_for(Path::new("clips/output_1_12_40.mp4"), Path::new("audio")).unwrap();
        assert_eq!(path, PathBuf::from("audio/output_1_12_40.wav"));
    }

    #[tokio::test]
    async fn test_missing_clip() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = extract_audio(
            &FfmpegRunner::new(),
            Path::new("/nonexistent/output_0_0_12.mp4"),
            dir.path(),
        )
        .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
