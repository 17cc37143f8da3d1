use super::{Device, ImageData, Schedule, Target};
use serde::Serialize;

/// One observation request: what, how, when, and the resulting frames.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Observation {
    /// Overrides the document level device when present.
    pub device: Option<Device>,
    pub target: Option<Target>,
    pub schedule: Option<Schedule>,
    image_data: Vec<ImageData>,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_data(&self) -> &[ImageData] {
        &self.image_data
    }

    pub fn image_data_mut(&mut self) -> &mut [ImageData] {
        &mut self.image_data
    }

    pub fn add_image_data(&mut self, image: ImageData) {
        self.image_data.push(image);
    }

    pub fn clear_image_data(&mut self) {
        self.image_data.clear();
    }

    /// The observation's own device, else the given document device.
    pub fn effective_device<'a>(&'a self, document_device: Option<&'a Device>) -> Option<&'a Device> {
        self.device.as_ref().or(document_device)
    }
}
