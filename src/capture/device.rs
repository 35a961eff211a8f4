//! Capture device abstraction
//!
//! The pipeline owns exactly one device behind this trait. The production
//! implementation decodes RGB24 frames from a spawned `ffmpeg` rawvideo
//! pipe; there is no in-process camera binding, which keeps device quirks
//! (V4L2, AVFoundation, UVC resets) outside the game process. A device
//! error is never fatal: the worker backs off, reconnects, and keeps going.

use std::io::Read;
use std::process::{Child, Command, Stdio};

use super::{DeviceError, Frame};

/// Blocking frame source at the internal resolution
pub trait CaptureDevice: Send {
    /// Read the next RGB24 frame. Blocks until a frame is available.
    fn read_frame(&mut self) -> Result<Frame, DeviceError>;

    /// Tear the device down and open it again after a disconnect
    fn reconnect(&mut self) -> Result<(), DeviceError>;
}

/// Webcam capture through an `ffmpeg` subprocess emitting raw RGB24
pub struct FfmpegCamera {
    input: String,
    width: usize,
    height: usize,
    fps: u32,
    child: Option<Child>,
}

impl FfmpegCamera {
    /// `input` is the capture source passed to ffmpeg (e.g. `/dev/video0`).
    ///
    /// Opening never fails hard: if the subprocess cannot be spawned the
    /// first read reports a device error and the worker's reconnect path
    /// takes over.
    pub fn open(input: &str, width: usize, height: usize, fps: u32) -> Self {
        let mut camera = Self {
            input: input.to_string(),
            width,
            height,
            fps,
            child: None,
        };
        if let Err(err) = camera.spawn() {
            log::warn!("Capture subprocess failed to start: {err}");
        }
        camera
    }

    fn spawn(&mut self) -> Result<(), DeviceError> {
        let child = Command::new("ffmpeg")
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-f",
                "v4l2",
                "-framerate",
                &self.fps.to_string(),
                "-video_size",
                &format!("{}x{}", self.width, self.height),
                "-i",
                &self.input,
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-vf",
                &format!("scale={}:{}", self.width, self.height),
                "pipe:1",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()?;
        log::info!("Capture subprocess started for {}", self.input);
        self.child = Some(child);
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl CaptureDevice for FfmpegCamera {
    fn read_frame(&mut self) -> Result<Frame, DeviceError> {
        let child = self.child.as_mut().ok_or(DeviceError::Disconnected)?;
        let stdout = child.stdout.as_mut().ok_or(DeviceError::Disconnected)?;

        let mut data = vec![0u8; self.width * self.height * 3];
        stdout.read_exact(&mut data)?;
        Ok(Frame {
            width: self.width,
            height: self.height,
            data,
        })
    }

    fn reconnect(&mut self) -> Result<(), DeviceError> {
        self.shutdown();
        self.spawn()
    }
}

impl Drop for FfmpegCamera {
    fn drop(&mut self) {
        self.shutdown();
    }
}
