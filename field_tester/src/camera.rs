// OpenCV webcam source. Only built with the `camera` feature.

use mirror_field::{FieldError, Frame, FrameSource};
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::{debug, info};

pub struct CameraSource {
    capture: VideoCapture,
    bgr: Mat,
    rgba: Mat,
}

impl CameraSource {
    pub fn open(index: i32) -> Result<Self, FieldError> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| FieldError::CaptureUnavailable(e.to_string()))?;
        let opened = capture
            .is_opened()
            .map_err(|e| FieldError::CaptureUnavailable(e.to_string()))?;
        if !opened {
            return Err(FieldError::CaptureUnavailable(format!(
                "camera {index} could not be opened"
            )));
        }
        info!(index, "camera opened");
        Ok(Self {
            capture,
            bgr: Mat::default(),
            rgba: Mat::default(),
        })
    }

    fn read(&mut self) -> opencv::Result<Option<Frame>> {
        if !self.capture.read(&mut self.bgr)? || self.bgr.empty() {
            return Ok(None);
        }
        imgproc::cvt_color(&self.bgr, &mut self.rgba, imgproc::COLOR_BGR2RGBA, 0)?;
        let width = self.rgba.cols() as u32;
        let height = self.rgba.rows() as u32;
        let data = self.rgba.data_bytes()?.to_vec();
        Ok(Frame::from_rgba(width, height, data).ok())
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Option<Frame> {
        match self.read() {
            Ok(frame) => frame,
            Err(err) => {
                debug!(error = %err, "camera read failed");
                None
            }
        }
    }
}
