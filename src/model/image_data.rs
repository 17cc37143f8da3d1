use super::RtmlUrl;
use crate::errors::RtmlError;
use serde::Serialize;

rtml_vocabulary! {
    /// How the object list of a frame is carried.
    ObjectListType("object list type") {
        Xml => "xml",
        /// Raw cluster-format text table.
        Cluster => "cluster",
        VotableUrl => "votable-url",
    }
}

rtml_vocabulary! {
    ImageDataType("image data type") {
        Fits => "FITS",
        Fits16 => "FITS16",
        Gif => "gif",
        Jpg => "jpg",
        Jpeg => "JPEG",
    }
}

/// One frame produced by an observation, plus its object list.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImageData {
    pub object_list_type: Option<ObjectListType>,
    pub object_list_cluster: Option<String>,
    pub object_list_votable_url: Option<RtmlUrl>,
    pub image_data_type: Option<ImageDataType>,
    pub image_data_url: Option<RtmlUrl>,
    pub fits_header: Option<String>,
}

impl ImageData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_object_list_type_str(&mut self, value: &str) -> Result<(), RtmlError> {
        self.object_list_type = Some(value.parse()?);
        Ok(())
    }

    pub fn set_image_data_type_str(&mut self, value: &str) -> Result<(), RtmlError> {
        self.image_data_type = Some(value.parse()?);
        Ok(())
    }

    pub fn set_image_data_url_str(&mut self, value: &str) -> Result<(), RtmlError> {
        self.image_data_url = Some(value.parse()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_type_is_case_sensitive() {
        let mut image = ImageData::new();
        image.set_image_data_type_str("FITS16").unwrap();
        assert_eq!(image.image_data_type, Some(ImageDataType::Fits16));
        assert!(image.set_image_data_type_str("fits").is_err());
        image.set_image_data_type_str("JPEG").unwrap();
        assert!(image.set_image_data_type_str("jpeg").is_err());
    }

    #[test]
    fn test_object_list_type() {
        let mut image = ImageData::new();
        image.set_object_list_type_str("votable-url").unwrap();
        assert_eq!(image.object_list_type, Some(ObjectListType::VotableUrl));
        assert!(image.set_object_list_type_str("csv").is_err());
    }

    #[test]
    fn test_image_url() {
        let mut image = ImageData::new();
        image
            .set_image_data_url_str("http://archive.example.org/frames/a.fits")
            .unwrap();
        assert_eq!(
            image.image_data_url.map(|u| u.to_string()).as_deref(),
            Some("http://archive.example.org/frames/a.fits")
        );
    }
}
