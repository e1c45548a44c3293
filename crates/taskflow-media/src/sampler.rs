//! Fixed-stride frame sampling over an FFmpeg rawvideo pipe.
//!
//! FFmpeg decodes the source and keeps every `stride`-th native frame
//! (`select=not(mod(n,stride))`), writing packed RGB24 to stdout. The sampler
//! reads exactly one frame's worth of bytes per item, so memory stays at one
//! frame regardless of video length.
//!
//! The decoder process is owned by the sampler: it is reaped when the stream
//! ends, killed and reaped on error or when the sampler is dropped early.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::command::check_ffmpeg;
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::probe::VideoInfo;

/// Stderr lines kept for decode diagnostics.
const STDERR_TAIL_LINES: usize = 20;

/// Native frames between consecutive samples: `floor(native_fps / sample_rate)`,
/// never less than one.
pub fn sampling_stride(native_fps: f64, sample_rate: f64) -> u64 {
    if !(native_fps > 0.0 && sample_rate > 0.0) {
        return 1;
    }
    ((native_fps / sample_rate).floor() as u64).max(1)
}

/// Capture time of native frame `native_index`.
pub fn native_timestamp(native_index: u64, native_fps: f64) -> f64 {
    native_index as f64 / native_fps
}

/// Lazy, finite, non-restartable sequence of sampled frames.
pub struct FrameSampler {
    path: PathBuf,
    child: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr_tail: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    native_fps: f64,
    stride: u64,
    frame_len: usize,
    sample_index: usize,
    finished: bool,
}

impl FrameSampler {
    /// Start decoding `path` at `sample_rate` samples per second.
    pub fn open(path: impl AsRef<Path>, info: &VideoInfo, sample_rate: f64) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::decode(format!(
                "cannot open {}: file not found",
                path.display()
            )));
        }
        if info.width == 0 || info.height == 0 || !(info.fps > 0.0) {
            return Err(MediaError::decode(format!(
                "cannot sample {}: invalid stream ({}x{} @ {} fps)",
                path.display(),
                info.width,
                info.height,
                info.fps
            )));
        }
        check_ffmpeg()?;

        let stride = sampling_stride(info.fps, sample_rate);
        let args = build_decode_args(path, stride);
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MediaError::decode(format!("failed to start decoder: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("decoder stdout not captured"))?;

        // Drain stderr on a helper thread so a chatty decoder never blocks on a full pipe.
        let stderr_tail = child.stderr.take().map(|stderr| {
            std::thread::spawn(move || {
                let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Vec::from(tail).join("\n")
            })
        });

        info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            native_fps = info.fps,
            sample_rate,
            stride,
            "Frame sampler opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            child: Some(child),
            stdout: Some(BufReader::with_capacity(info.rgb_frame_len(), stdout)),
            stderr_tail,
            width: info.width,
            height: info.height,
            native_fps: info.fps,
            stride,
            frame_len: info.rgb_frame_len(),
            sample_index: 0,
            finished: false,
        })
    }

    /// Native frames between samples.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Samples yielded so far.
    pub fn samples_read(&self) -> usize {
        self.sample_index
    }

    /// Read the next sampled frame. `Ok(None)` on a clean end of stream.
    fn read_frame(&mut self) -> MediaResult<Option<Frame>> {
        let reader = self
            .stdout
            .as_mut()
            .ok_or_else(|| MediaError::internal("decoder already released"))?;

        let mut data = vec![0u8; self.frame_len];
        let filled = fill_buffer(reader, &mut data)
            .map_err(|e| MediaError::decode(format!("frame read failed: {}", e)))?;

        if filled == 0 {
            return Ok(None);
        }
        if filled < self.frame_len {
            return Err(MediaError::decode(format!(
                "stream ended mid-frame after sample {} ({} of {} bytes)",
                self.sample_index, filled, self.frame_len
            )));
        }

        // `select` keeps every stride-th decoded frame and `-vsync 0` passes them
        // through unchanged, so for constant-rate input sample i is native frame
        // i * stride. Variable-rate input would need per-frame pts instead.
        let native_index = self.sample_index as u64 * self.stride;
        let frame = Frame::from_rgb_bytes(
            self.sample_index,
            native_index,
            native_timestamp(native_index, self.native_fps),
            self.width,
            self.height,
            data,
        )?;
        self.sample_index += 1;
        Ok(Some(frame))
    }

    /// Reap the decoder after a clean end of stream.
    fn finish(&mut self) -> MediaResult<()> {
        self.stdout = None;
        let status = match self.child.take() {
            Some(mut child) => child.wait()?,
            None => return Ok(()),
        };
        let stderr = self.join_stderr();

        if status.success() {
            debug!(
                path = %self.path.display(),
                samples = self.sample_index,
                "Frame sampler exhausted"
            );
            Ok(())
        } else {
            Err(MediaError::decode(format!(
                "decoder exited with {} after {} samples: {}",
                status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                self.sample_index,
                if stderr.is_empty() { "no diagnostics" } else { stderr.as_str() }
            )))
        }
    }

    /// Kill and reap the decoder.
    fn release(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Decoder kill failed (already exited?): {}", e);
            }
            if let Err(e) = child.wait() {
                warn!("Failed to reap decoder for {}: {}", self.path.display(), e);
            }
        }
        self.join_stderr();
    }

    fn join_stderr(&mut self) -> String {
        self.stderr_tail
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

impl Iterator for FrameSampler {
    type Item = MediaResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.finished = true;
                self.finish().err().map(Err)
            }
            Err(e) => {
                self.finished = true;
                self.release();
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for FrameSampler {}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.release();
    }
}

/// FFmpeg arguments decoding `path` to RGB24 on stdout, keeping every `stride`-th frame.
fn build_decode_args(path: &Path, stride: u64) -> Vec<String> {
    let mut args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-nostdin".to_string(),
        "-i".to_string(),
        path.to_string_lossy().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
    ];

    if stride > 1 {
        args.push("-vf".to_string());
        args.push(format!("select=not(mod(n\\,{}))", stride));
    }

    args.extend(
        [
            "-vsync", "0", "-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args
}

/// Read until `buf` is full or EOF; returns bytes read.
fn fill_buffer(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
