//! Video files decoded through the `ffmpeg` executable.
//!
//! ffmpeg writes binary PPM frames to its stdout, which are read one at a
//! time, so memory and disk use stay at a single frame regardless of video
//! length. The child process is killed on release.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbImage;

use proctor_common::error::{ProctorError, ProctorResult};
use proctor_vision_core::{Release, VideoSource};

/// Video source streaming frames out of an ffmpeg child process.
#[derive(Debug)]
pub struct FfmpegSource {
    video: PathBuf,
    child: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    /// First frame, read while opening to confirm ffmpeg accepted the file.
    pending: Option<RgbImage>,
}

impl FfmpegSource {
    /// Start decoding `video`.
    ///
    /// Fails with `VideoOpen` when the file is missing, ffmpeg cannot be
    /// started, or ffmpeg rejects the file before producing a frame.
    pub fn open(video: &Path) -> ProctorResult<Self> {
        if !video.is_file() {
            return Err(ProctorError::video_open(video, "no such file"));
        }

        let mut child = Command::new("ffmpeg")
            .arg("-v")
            .arg("error")
            .arg("-nostdin")
            .arg("-i")
            .arg(video)
            .args(["-f", "image2pipe", "-vcodec", "ppm", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ProctorError::video_open(video, format!("failed to run ffmpeg (is it installed?): {e}"))
            })?;

        let Some(stdout) = child.stdout.take() else {
            stop(&mut child);
            return Err(ProctorError::video_open(video, "ffmpeg stdout unavailable"));
        };

        let mut source = Self {
            video: video.to_path_buf(),
            child: Some(child),
            stdout: Some(BufReader::new(stdout)),
            pending: None,
        };

        match source.next_ppm() {
            Ok(Some(frame)) => {
                tracing::info!(
                    video = %video.display(),
                    width = frame.width(),
                    height = frame.height(),
                    "Streaming video through ffmpeg"
                );
                source.pending = Some(frame);
                Ok(source)
            }
            Ok(None) => match source.finish() {
                Some(message) => Err(ProctorError::video_open(video, message)),
                // A readable video with no frames; the driver reports it.
                None => Ok(source),
            },
            Err(e) => {
                source.release();
                Err(ProctorError::video_open(video, e.to_string()))
            }
        }
    }

    pub fn video(&self) -> &Path {
        &self.video
    }

    fn next_ppm(&mut self) -> ProctorResult<Option<RgbImage>> {
        match self.stdout.as_mut() {
            Some(stdout) => read_ppm(stdout),
            None => Ok(None),
        }
    }

    /// Reap the child after end of output. Returns ffmpeg's complaint if it
    /// exited unsuccessfully.
    fn finish(&mut self) -> Option<String> {
        self.stdout = None;
        let mut child = self.child.take()?;
        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        match child.wait() {
            Ok(status) if status.success() => None,
            Ok(status) => Some(if stderr.trim().is_empty() {
                format!("ffmpeg exited with {status}")
            } else {
                stderr.trim().to_string()
            }),
            Err(e) => Some(format!("failed to wait for ffmpeg: {e}")),
        }
    }
}

fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl VideoSource for FfmpegSource {
    fn read_frame(&mut self) -> ProctorResult<Option<RgbImage>> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }
        match self.next_ppm() {
            Ok(Some(frame)) => Ok(Some(frame)),
            Ok(None) => {
                if let Some(message) = self.finish() {
                    tracing::warn!(video = %self.video.display(), "ffmpeg stopped early: {}", message);
                }
                Ok(None)
            }
            Err(e) => {
                // An undecodable frame ends the stream.
                tracing::warn!(video = %self.video.display(), "Frame could not be decoded: {}", e);
                self.release();
                Ok(None)
            }
        }
    }
}

impl Release for FfmpegSource {
    fn release(&mut self) {
        self.pending = None;
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            stop(&mut child);
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Read one binary (P6, 8-bit) PPM image. `Ok(None)` on a clean end of input.
pub fn read_ppm<R: BufRead>(reader: &mut R) -> ProctorResult<Option<RgbImage>> {
    let Some(magic) = next_token(reader)? else {
        return Ok(None);
    };
    if magic != "P6" {
        return Err(ProctorError::decode(format!("expected PPM magic P6, got {magic:?}")));
    }
    let width = header_number(reader, "width")?;
    let height = header_number(reader, "height")?;
    let maxval = header_number(reader, "maxval")?;
    if maxval == 0 || maxval > 255 {
        return Err(ProctorError::decode(format!("unsupported PPM maxval {maxval}")));
    }

    let len = width as usize * height as usize * 3;
    let mut data = vec![0u8; len];
    reader
        .read_exact(&mut data)
        .map_err(|e| ProctorError::decode(format!("truncated PPM frame: {e}")))?;
    RgbImage::from_raw(width, height, data)
        .map(Some)
        .ok_or_else(|| ProctorError::decode("PPM frame size mismatch"))
}

fn header_number<R: BufRead>(reader: &mut R, field: &str) -> ProctorResult<u32> {
    let token = next_token(reader)?
        .ok_or_else(|| ProctorError::decode(format!("PPM header ends before {field}")))?;
    token
        .parse()
        .map_err(|_| ProctorError::decode(format!("invalid PPM {field} {token:?}")))
}

/// Next whitespace-delimited header token, skipping `#` comments. Consumes
/// the single whitespace byte that terminates the token.
fn next_token<R: BufRead>(reader: &mut R) -> ProctorResult<Option<String>> {
    let mut token = String::new();
    let mut in_comment = false;
    loop {
        let Some(byte) = next_byte(reader)? else {
            return if token.is_empty() {
                Ok(None)
            } else {
                Ok(Some(token))
            };
        };
        if in_comment {
            in_comment = byte != b'\n';
            continue;
        }
        match byte {
            b'#' if token.is_empty() => in_comment = true,
            b if b.is_ascii_whitespace() => {
                if !token.is_empty() {
                    return Ok(Some(token));
                }
            }
            b => token.push(char::from(b)),
        }
    }
}

fn next_byte<R: BufRead>(reader: &mut R) -> ProctorResult<Option<u8>> {
    let byte = match reader.fill_buf()?.first() {
        Some(&b) => b,
        None => return Ok(None),
    };
    reader.consume(1);
    Ok(Some(byte))
}
