//! Threaded camera capture + body segmentation pipeline
//!
//! The pipeline runs on its own worker thread so camera I/O and inference
//! latency never stall the game loop. Each cycle it captures a frame, runs
//! the segmentation backend, cleans the mask, and publishes the result to
//! a single mutex-guarded slot. The main tick reads whatever the slot
//! currently holds: last-value-wins, no queueing, stale reads are expected.
//!
//! Error policy (the tick must never see a camera fault):
//! - device errors: back off, reconnect, keep looping
//! - inference errors: publish an all-zero mask for that cycle, with
//!   rate-limited logging
//! - a missing scene profile is the only fatal condition, and it happens
//!   at startup, before the worker exists

pub mod device;
pub mod segment;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use crate::consts::*;
use crate::mask::Mask;

pub use device::{CaptureDevice, FfmpegCamera};
pub use segment::{
    BackendPreference, ConfidenceMap, SceneProfile, SegmentationBackend, select_backend,
};

/// Capture device failure. Recovered inside the worker via backoff and
/// reconnect; never surfaced to the game loop.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("capture i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture device is not open")]
    Disconnected,
}

/// Backend failure mid-stream. Recovered by substituting an empty mask
/// for the cycle.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("frame size {got:?} does not match backend {expected:?}")]
    FrameMismatch {
        got: (usize, usize),
        expected: (usize, usize),
    },
}

/// Fatal startup misconfiguration: the only error in the core that
/// terminates the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "scene profile not found at '{path}'\n\
         Run 'laser-dodge --calibrate' with the scene empty to record it,\n\
         or set segmentation backend to 'adaptive' in settings.json."
    )]
    ProfileMissing { path: String },
    #[error("scene profile is unreadable: {0}")]
    ProfileCorrupt(String),
    #[error("scene profile write failed: {0}")]
    ProfileWrite(#[source] std::io::Error),
}

/// One raw RGB24 camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    /// Interleaved RGB, row-major
    pub data: Vec<u8>,
}

impl Frame {
    /// Flip horizontally in place (mirror effect for the installation)
    pub fn mirror(&mut self) {
        for y in 0..self.height {
            let row = &mut self.data[y * self.width * 3..(y + 1) * self.width * 3];
            let mut left = 0;
            let mut right = self.width - 1;
            while left < right {
                for c in 0..3 {
                    row.swap(left * 3 + c, right * 3 + c);
                }
                left += 1;
                right -= 1;
            }
        }
    }
}

/// Everything one capture cycle produces
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// Cleaned binary body mask
    pub mask: Mask,
    /// Pre-eroded mask used for forgiving collision checks
    pub collision_mask: Mask,
    /// Raw frame, kept for the external debug overlay
    pub raw_frame: Option<Frame>,
    /// Whether enough body pixels were found this cycle
    pub detected: bool,
}

impl FrameSnapshot {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            mask: Mask::zeros(width, height),
            collision_mask: Mask::zeros(width, height),
            raw_frame: None,
            detected: false,
        }
    }
}

/// Latest-value slot between the capture worker (writer) and the game
/// loop (reader). The critical section contains only the copy, so the two
/// sides never block each other beyond microseconds.
pub struct FrameBuffer {
    slot: Mutex<FrameSnapshot>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            slot: Mutex::new(FrameSnapshot::empty(width, height)),
        }
    }

    /// Overwrite the slot wholesale
    pub fn publish(&self, snapshot: FrameSnapshot) {
        *self.slot.lock() = snapshot;
    }

    /// Read an independent copy of the latest completed write
    pub fn snapshot(&self) -> FrameSnapshot {
        self.slot.lock().clone()
    }
}

/// Seconds to back off after a device failure before reconnecting
const RECONNECT_BACKOFF: Duration = Duration::from_millis(500);
/// Inference failures are logged at most once per this many cycles
const FAILURE_LOG_INTERVAL: u64 = 300;

/// Owns the capture worker thread and the shared frame buffer
pub struct SegmentationPipeline {
    shared: Arc<FrameBuffer>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SegmentationPipeline {
    /// Start the worker. Takes ownership of the device and the backend;
    /// both are released when the worker exits.
    pub fn start(
        device: Box<dyn CaptureDevice>,
        backend: Box<dyn SegmentationBackend>,
        width: usize,
        height: usize,
        mirror: bool,
    ) -> Self {
        let shared = Arc::new(FrameBuffer::new(width, height));
        let running = Arc::new(AtomicBool::new(true));

        let worker_shared = Arc::clone(&shared);
        let worker_running = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                capture_loop(device, backend, worker_shared, worker_running, mirror);
            })
            .expect("failed to spawn capture thread");

        Self {
            shared,
            running,
            worker: Some(worker),
        }
    }

    /// Latest snapshot (non-blocking beyond the copy)
    pub fn snapshot(&self) -> FrameSnapshot {
        self.shared.snapshot()
    }

    /// Cooperatively stop the worker and wait for it to release the
    /// device and backend
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Capture worker panicked during shutdown");
            }
        }
    }
}

impl Drop for SegmentationPipeline {
    fn drop(&mut self) {
        // Shutdown must release the capture device on every exit path,
        // including unwinding out of the main loop
        self.stop();
    }
}

fn capture_loop(
    mut device: Box<dyn CaptureDevice>,
    mut backend: Box<dyn SegmentationBackend>,
    shared: Arc<FrameBuffer>,
    running: Arc<AtomicBool>,
    mirror: bool,
) {
    let morph_radius = MASK_MORPH_KERNEL / 2;
    let mut inference_failures = 0u64;

    while running.load(Ordering::Relaxed) {
        let mut frame = match device.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("Capture device error: {err}; reconnecting");
                thread::sleep(RECONNECT_BACKOFF);
                if let Err(err) = device.reconnect() {
                    log::warn!("Reconnect failed: {err}; will retry");
                }
                continue;
            }
        };

        if mirror {
            frame.mirror();
        }

        let mask = match backend.segment(&frame) {
            Ok(confidence) => confidence.to_mask(),
            Err(err) => {
                if inference_failures % FAILURE_LOG_INTERVAL == 0 {
                    log::warn!("Segmentation failed ({err}); publishing empty mask");
                }
                inference_failures += 1;
                Mask::zeros(frame.width, frame.height)
            }
        };

        // Open removes speckle, close fills pinholes in the silhouette
        let mask = mask.open(morph_radius).close(morph_radius);
        let detected = mask.count_nonzero() > BODY_DETECT_MIN_PIXELS;
        let collision_mask = mask.erode(COLLISION_ERODE_PX);

        shared.publish(FrameSnapshot {
            mask,
            collision_mask,
            raw_frame: Some(frame),
            detected,
        });
    }
    // Device and backend drop here, releasing the camera and any
    // inference resources
    log::info!("Capture worker stopped");
}

#[cfg(test)]
mod tests {
    use super::segment::AdaptiveBackend;
    use super::*;

    const W: usize = 32;
    const H: usize = 24;

    fn flat_frame(value: u8) -> Frame {
        Frame {
            width: W,
            height: H,
            data: vec![value; W * H * 3],
        }
    }

    /// Device producing frames from a closure, with injected faults
    struct ScriptedDevice<F: FnMut(u64) -> Result<Frame, DeviceError> + Send> {
        cycle: u64,
        script: F,
    }

    impl<F: FnMut(u64) -> Result<Frame, DeviceError> + Send> CaptureDevice for ScriptedDevice<F> {
        fn read_frame(&mut self) -> Result<Frame, DeviceError> {
            let frame = (self.script)(self.cycle);
            self.cycle += 1;
            frame
        }
        fn reconnect(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    /// Backend returning a fixed confidence everywhere
    struct ConstBackend {
        confidence: f32,
    }

    impl SegmentationBackend for ConstBackend {
        fn segment(&mut self, frame: &Frame) -> Result<ConfidenceMap, InferenceError> {
            Ok(ConfidenceMap {
                width: frame.width,
                height: frame.height,
                data: vec![self.confidence; frame.width * frame.height],
            })
        }
        fn name(&self) -> &'static str {
            "const"
        }
    }

    /// Backend that always fails
    struct BrokenBackend;

    impl SegmentationBackend for BrokenBackend {
        fn segment(&mut self, _frame: &Frame) -> Result<ConfidenceMap, InferenceError> {
            Err(InferenceError::FrameMismatch {
                got: (0, 0),
                expected: (W, H),
            })
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn wait_for<P: Fn(&FrameSnapshot) -> bool>(
        pipeline: &SegmentationPipeline,
        predicate: P,
    ) -> FrameSnapshot {
        for _ in 0..200 {
            let snap = pipeline.snapshot();
            if predicate(&snap) {
                return snap;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("pipeline never published the expected snapshot");
    }

    #[test]
    fn test_frame_buffer_last_value_wins() {
        let buffer = FrameBuffer::new(W, H);
        let mut snap = FrameSnapshot::empty(W, H);
        snap.detected = true;
        buffer.publish(snap);
        buffer.publish(FrameSnapshot::empty(W, H));
        // Reader sees only the latest write
        assert!(!buffer.snapshot().detected);
    }

    #[test]
    fn test_snapshot_is_an_independent_copy() {
        let buffer = FrameBuffer::new(W, H);
        let mut copy = buffer.snapshot();
        copy.mask.fill_rect(0, 0, W, H);
        // Mutating the copy never touches the slot
        assert_eq!(buffer.snapshot().mask.count_nonzero(), 0);
    }

    #[test]
    fn test_pipeline_publishes_detection() {
        let device = ScriptedDevice {
            cycle: 0,
            script: |_| Ok(flat_frame(128)),
        };
        let backend = ConstBackend { confidence: 1.0 };
        let mut pipeline =
            SegmentationPipeline::start(Box::new(device), Box::new(backend), W, H, false);

        let snap = wait_for(&pipeline, |s| s.detected);
        // Full-frame confidence survives cleaning and erosion
        assert!(snap.mask.count_nonzero() > BODY_DETECT_MIN_PIXELS);
        assert!(snap.collision_mask.count_nonzero() < snap.mask.count_nonzero());
        assert!(snap.raw_frame.is_some());
        pipeline.stop();
    }

    #[test]
    fn test_inference_failure_publishes_empty_mask() {
        let device = ScriptedDevice {
            cycle: 0,
            script: |_| Ok(flat_frame(128)),
        };
        let mut pipeline =
            SegmentationPipeline::start(Box::new(device), Box::new(BrokenBackend), W, H, false);

        let snap = wait_for(&pipeline, |s| s.raw_frame.is_some());
        assert!(!snap.detected);
        assert_eq!(snap.mask.count_nonzero(), 0);
        pipeline.stop();
    }

    #[test]
    fn test_device_error_recovers_without_killing_worker() {
        // Fail the very first read, then stream normally
        let device = ScriptedDevice {
            cycle: 0,
            script: |cycle| {
                if cycle == 0 {
                    Err(DeviceError::Disconnected)
                } else {
                    Ok(flat_frame(200))
                }
            },
        };
        let backend = ConstBackend { confidence: 1.0 };
        let mut pipeline =
            SegmentationPipeline::start(Box::new(device), Box::new(backend), W, H, false);

        // The worker survived the fault and kept publishing
        let snap = wait_for(&pipeline, |s| s.detected);
        assert!(snap.detected);
        pipeline.stop();
    }

    #[test]
    fn test_stop_joins_worker() {
        let device = ScriptedDevice {
            cycle: 0,
            script: |_| Ok(flat_frame(100)),
        };
        let mut pipeline = SegmentationPipeline::start(
            Box::new(device),
            Box::new(AdaptiveBackend::new()),
            W,
            H,
            false,
        );
        thread::sleep(Duration::from_millis(20));
        pipeline.stop();
        // Idempotent
        pipeline.stop();
    }

    #[test]
    fn test_mirror_flips_rows() {
        let mut frame = flat_frame(0);
        // Mark the left-most pixel of the first row
        frame.data[0] = 255;
        frame.mirror();
        assert_eq!(frame.data[0], 0);
        assert_eq!(frame.data[(W - 1) * 3], 255);
    }
}
