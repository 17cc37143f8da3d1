//! RTML 2.2 encoder.
//!
//! Builds the 2.2 tree from a [`Document`]. Each `create_*` function appends
//! one element to its parent and skips entities the model does not carry.

use super::VERSION;
use crate::angle::{format_dms, format_hms};
use crate::formats::EncoderOptions;
use crate::formats::numeric::{ALTITUDE, EXPOSURE, GEODETIC, OPTICS, format_shortest};
use crate::formats::shared::create_constraints;
use crate::model::{
    Contact, Device, Document, ImageData, IntelligentAgent, ObjectListType, Observation, Project,
    Schedule, Target, Telescope, TelescopeLocation,
};
use crate::xml::{XmlDocument, XmlElement};
use log::debug;

pub struct Encoder {
    options: EncoderOptions,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(EncoderOptions::default())
    }
}

impl Encoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Build the tree, including the DOCTYPE declaration.
    pub fn encode(&self, document: &Document) -> XmlDocument {
        let root = create_rtml(document);
        XmlDocument::with_doctype(
            root,
            format!("RTML SYSTEM \"{}\"", self.options.doctype_system_id),
        )
    }
}

fn create_rtml(document: &Document) -> XmlElement {
    let mut root = XmlElement::new("RTML").with_attribute("version", VERSION);
    if let Some(document_type) = document.document_type() {
        root.set_attribute("type", document_type.as_str());
    }
    if let Some(error) = document.error_string() {
        root.append_text(error);
    }

    if let Some(contact) = &document.contact {
        create_contact(&mut root, contact);
    }
    if let Some(project) = &document.project {
        create_project(&mut root, project);
    }
    if let Some(telescope) = &document.telescope {
        create_telescope(&mut root, telescope);
    }
    if let Some(agent) = &document.intelligent_agent {
        create_intelligent_agent(&mut root, agent);
    }
    if let Some(device) = &document.device {
        create_device(&mut root, device);
    }
    for observation in document.observations() {
        create_observation(&mut root, observation);
    }
    if let Some(score) = document.score {
        root.append_element(XmlElement::new("Score").with_text(format_shortest(score)));
    }
    if let Some(completion) = &document.completion_time {
        root.append_element(XmlElement::new("CompletionTime").with_text(completion.to_string()));
    }

    debug!(
        "Encoded RTML 2.2 tree with {} observation(s)",
        document.observations().len()
    );
    root
}

/// Appends `<tag>text</tag>` when the value is present.
fn append_leaf(parent: &mut XmlElement, tag: &str, value: Option<&str>) {
    if let Some(value) = value {
        parent.append_element(XmlElement::new(tag).with_text(value));
    }
}

pub fn create_contact(parent: &mut XmlElement, contact: &Contact) {
    let mut element = XmlElement::new("Contact");
    if let Some(pi) = contact.pi {
        element.set_attribute("PI", pi.to_string());
    }
    append_leaf(&mut element, "Name", contact.name.as_deref());
    append_leaf(&mut element, "User", contact.user.as_deref());
    append_leaf(&mut element, "Institution", contact.institution.as_deref());
    append_leaf(&mut element, "Email", contact.email.as_deref());
    append_leaf(&mut element, "Address", contact.address.as_deref());
    append_leaf(&mut element, "Telephone", contact.telephone.as_deref());
    append_leaf(&mut element, "Fax", contact.fax.as_deref());
    append_leaf(&mut element, "Url", contact.url.as_deref());
    parent.append_element(element);
}

pub fn create_project(parent: &mut XmlElement, project: &Project) {
    let mut element = XmlElement::new("Project");
    if let Some(text) = &project.project {
        element.append_text(text.as_str());
    }
    parent.append_element(element);
}

pub fn create_telescope(parent: &mut XmlElement, telescope: &Telescope) {
    let mut element = XmlElement::new("Telescope");
    append_leaf(&mut element, "Name", telescope.name.as_deref());
    if let Some(aperture) = telescope.aperture {
        let mut child = XmlElement::new("Aperture");
        if let Some(kind) = &telescope.aperture_type {
            child.set_attribute("type", kind.as_str());
        }
        if let Some(units) = &telescope.aperture_units {
            child.set_attribute("units", units.as_str());
        }
        element.append_element(child.with_text(OPTICS.format(aperture)));
    }
    if let Some(focal_length) = telescope.focal_length {
        let mut child = XmlElement::new("FocalLength");
        if let Some(units) = &telescope.focal_length_units {
            child.set_attribute("units", units.as_str());
        }
        element.append_element(child.with_text(OPTICS.format(focal_length)));
    }
    append_leaf(&mut element, "FocalRatio", telescope.focal_ratio.as_deref());
    if let Some(location) = &telescope.location {
        create_location(&mut element, location);
    }
    parent.append_element(element);
}

fn create_location(parent: &mut XmlElement, location: &TelescopeLocation) {
    let mut element = XmlElement::new("Location");
    append_leaf(&mut element, "Name", location.name.as_deref());
    if let Some(longitude) = location.longitude {
        element.append_element(
            XmlElement::new("Longitude")
                .with_attribute("units", "degrees")
                .with_text(GEODETIC.format(longitude)),
        );
    }
    if let Some(latitude) = location.latitude {
        element.append_element(
            XmlElement::new("Latitude")
                .with_attribute("units", "degrees")
                .with_text(GEODETIC.format(latitude)),
        );
    }
    if let Some(altitude) = location.altitude {
        element.append_element(
            XmlElement::new("Altitude")
                .with_attribute("units", "meters")
                .with_text(ALTITUDE.format(altitude)),
        );
    }
    parent.append_element(element);
}

pub fn create_intelligent_agent(parent: &mut XmlElement, agent: &IntelligentAgent) {
    let mut element = XmlElement::new("IntelligentAgent");
    if let Some(host) = &agent.hostname {
        element.set_attribute("host", host.as_str());
    }
    if let Some(port) = agent.port() {
        element.set_attribute("port", port.to_string());
    }
    if let Some(id) = &agent.id {
        element.append_text(id.as_str());
    }
    parent.append_element(element);
}

pub fn create_device(parent: &mut XmlElement, device: &Device) {
    let mut element = XmlElement::new("Device");
    if let Some(device_type) = device.device_type {
        element.set_attribute("type", device_type.as_str());
    }
    if let Some(region) = device.spectral_region {
        element.set_attribute("region", region.as_str());
    }
    if let Some(name) = &device.name {
        element.set_attribute("name", name.as_str());
    }
    if let Some(filter) = &device.filter_type {
        element.append_element(
            XmlElement::new("Filter").with_child(XmlElement::new("FilterType").with_text(filter.as_str())),
        );
    }
    if let Some(detector) = &device.detector {
        let binning = XmlElement::new("Binning")
            .with_attribute("rows", detector.row_binning().to_string())
            .with_attribute("columns", detector.column_binning().to_string());
        element.append_element(XmlElement::new("Detector").with_child(binning));
    }
    parent.append_element(element);
}

pub fn create_observation(parent: &mut XmlElement, observation: &Observation) {
    let mut element = XmlElement::new("Observation");
    if let Some(target) = &observation.target {
        create_target(&mut element, target);
    }
    if let Some(device) = &observation.device {
        create_device(&mut element, device);
    }
    if let Some(schedule) = &observation.schedule {
        create_schedule(&mut element, schedule);
    }
    for image in observation.image_data() {
        create_image_data(&mut element, image);
    }
    parent.append_element(element);
}

pub fn create_target(parent: &mut XmlElement, target: &Target) {
    let mut element =
        XmlElement::new("Target").with_attribute("type", target.target_type.as_str());
    if let Some(ident) = &target.ident {
        element.set_attribute("ident", ident.as_str());
    }
    append_leaf(&mut element, "TargetName", target.name.as_deref());

    if target.ra.is_some() || target.dec.is_some() || target.equinox.is_some() {
        let mut coordinates = XmlElement::new("Coordinates");
        if let Some(ra) = target.ra {
            coordinates.append_element(
                XmlElement::new("RightAscension")
                    .with_attribute("format", "hh mm ss.ss")
                    .with_attribute("units", "hms")
                    .with_text(format_hms(ra, ' ')),
            );
        }
        if let Some(dec) = target.dec {
            coordinates.append_element(
                XmlElement::new("Declination")
                    .with_attribute("format", "sdd mm ss.ss")
                    .with_attribute("units", "dms")
                    .with_text(format_dms(dec, ' ')),
            );
        }
        append_leaf(&mut coordinates, "Equinox", target.equinox.as_deref());
        element.append_element(coordinates);
    }
    parent.append_element(element);
}

pub fn create_schedule(parent: &mut XmlElement, schedule: &Schedule) {
    let mut element =
        XmlElement::new("Schedule").with_attribute("priority", schedule.priority.to_string());

    if let Some(length) = schedule.exposure_length {
        let mut exposure =
            XmlElement::new("Exposure").with_attribute("type", schedule.exposure_type.as_str());
        if let Some(units) = &schedule.exposure_units {
            exposure.set_attribute("units", units.as_str());
        }
        exposure.append_element(
            XmlElement::new("Count").with_text(schedule.exposure_count().to_string()),
        );
        exposure.append_text(EXPOSURE.format(length));
        element.append_element(exposure);
    }

    if schedule.start_date.is_some() || schedule.end_date.is_some() {
        let mut window = XmlElement::new("TimeConstraint");
        if let Some(start) = &schedule.start_date {
            window.append_element(XmlElement::new("StartDateTime").with_text(start.to_string()));
        }
        if let Some(end) = &schedule.end_date {
            window.append_element(XmlElement::new("EndDateTime").with_text(end.to_string()));
        }
        element.append_element(window);
    }

    create_constraints(&mut element, schedule, None);
    parent.append_element(element);
}

pub fn create_image_data(parent: &mut XmlElement, image: &ImageData) {
    let mut element = XmlElement::new("ImageData");
    if let Some(kind) = image.image_data_type {
        element.set_attribute("type", kind.as_str());
    }
    if let Some(header) = &image.fits_header {
        element.append_element(
            XmlElement::new("FITSHeader")
                .with_attribute("type", "all")
                .with_text(header.as_str()),
        );
    }
    if let Some(list_type) = image.object_list_type {
        let mut list = XmlElement::new("ObjectList").with_attribute("type", list_type.as_str());
        match list_type {
            ObjectListType::Cluster => {
                if let Some(cluster) = &image.object_list_cluster {
                    list.append_text(cluster.as_str());
                }
            }
            ObjectListType::VotableUrl => {
                if let Some(url) = &image.object_list_votable_url {
                    list.append_text(url.to_string());
                }
            }
            ObjectListType::Xml => {}
        }
        element.append_element(list);
    }
    if let Some(url) = &image.image_data_url {
        element.append_text(url.to_string());
    }
    parent.append_element(element);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::Angle;
    use crate::date::TimeBound;
    use crate::model::{DocumentType, ExposureType, ImageDataType, SeeingConstraint};

    fn encode(document: &Document) -> XmlDocument {
        Encoder::default().encode(document)
    }

    #[test]
    fn test_root_and_doctype() {
        let doc = encode(&Document::with_type(DocumentType::Score));
        assert_eq!(
            doc.doctype_system_id(),
            Some("http://www.estar.org.uk/documents/rtml2.2.dtd")
        );
        assert_eq!(doc.root.attribute("version"), Some("2.2"));
        assert_eq!(doc.root.attribute("type"), Some("score"));
        assert_eq!(doc.root.children().len(), 0);
    }

    #[test]
    fn test_error_string_is_root_text() {
        let mut document = Document::with_type(DocumentType::Fail);
        document.set_error_string("Telescope closed").unwrap();
        let doc = encode(&document);
        assert_eq!(doc.root.last_text(), Some("Telescope closed"));
    }

    #[test]
    fn test_target_coordinates() {
        let mut target = Target::new();
        target.name = Some("M31".to_string());
        target.ra = Some(Angle::from_hours(0.5));
        target.dec = Some(Angle::from_degrees(-12.25));
        let mut parent = XmlElement::new("Observation");
        create_target(&mut parent, &target);

        let element = parent.first_element("Target").unwrap();
        assert_eq!(element.attribute("type"), Some("normal"));
        let coordinates = element.first_element("Coordinates").unwrap();
        let ra = coordinates.first_element("RightAscension").unwrap();
        assert_eq!(ra.attribute("units"), Some("hms"));
        assert_eq!(ra.last_text(), Some("00 30 00.00"));
        let dec = coordinates.first_element("Declination").unwrap();
        assert_eq!(dec.attribute("format"), Some("sdd mm ss.ss"));
        assert_eq!(dec.last_text(), Some("-12 15 00.00"));
        assert!(coordinates.first_element("Equinox").is_none());
    }

    #[test]
    fn test_schedule_exposure_always_has_count() {
        let mut schedule = Schedule::new();
        schedule.exposure_type = ExposureType::Time;
        schedule.exposure_units = Some("seconds".to_string());
        schedule.exposure_length = Some(30.0);
        schedule.end_date = Some(TimeBound::Never);
        schedule.seeing_constraint = Some(SeeingConstraint::new(0.0, 1.3));

        let mut parent = XmlElement::new("Observation");
        create_schedule(&mut parent, &schedule);
        let element = parent.first_element("Schedule").unwrap();
        assert_eq!(element.attribute("priority"), Some("1"));

        let exposure = element.first_element("Exposure").unwrap();
        assert_eq!(exposure.attribute("type"), Some("time"));
        assert_eq!(exposure.last_text(), Some("30.0"));
        assert_eq!(
            exposure.first_element("Count").and_then(|c| c.last_text()),
            Some("1")
        );

        let window = element.first_element("TimeConstraint").unwrap();
        assert!(window.first_element("StartDateTime").is_none());
        assert_eq!(
            window.first_element("EndDateTime").and_then(|e| e.last_text()),
            Some("never")
        );
        let seeing = element.first_element("SeeingConstraint").unwrap();
        assert_eq!(seeing.attribute("units"), None);
    }

    #[test]
    fn test_empty_schedule_elides_children() {
        let mut parent = XmlElement::new("Observation");
        create_schedule(&mut parent, &Schedule::new());
        let element = parent.first_element("Schedule").unwrap();
        assert_eq!(element.children().len(), 0);
    }

    #[test]
    fn test_image_data_layout() {
        let mut image = ImageData::new();
        image.image_data_type = Some(ImageDataType::Fits16);
        image.fits_header = Some("SIMPLE = T".to_string());
        image.object_list_type = Some(ObjectListType::Cluster);
        image.object_list_cluster = Some("1 2 3".to_string());
        image
            .set_image_data_url_str("http://archive.example.org/frames/a.fits")
            .unwrap();

        let mut parent = XmlElement::new("Observation");
        create_image_data(&mut parent, &image);
        let element = parent.first_element("ImageData").unwrap();
        assert_eq!(element.attribute("type"), Some("FITS16"));
        let header = element.first_element("FITSHeader").unwrap();
        assert_eq!(header.attribute("type"), Some("all"));
        assert_eq!(
            element.first_element("ObjectList").and_then(|l| l.last_text()),
            Some("1 2 3")
        );
        assert_eq!(
            element.last_text(),
            Some("http://archive.example.org/frames/a.fits")
        );
    }

    #[test]
    fn test_telescope_number_patterns() {
        let mut telescope = Telescope::new();
        telescope.aperture = Some(2.0);
        telescope.aperture_units = Some("meters".to_string());
        let mut location = TelescopeLocation::new();
        location.longitude = Some(-17.879);
        location.altitude = Some(2363.0);
        telescope.location = Some(location);

        let mut parent = XmlElement::new("RTML");
        create_telescope(&mut parent, &telescope);
        let element = parent.first_element("Telescope").unwrap();
        assert_eq!(
            element.first_element("Aperture").and_then(|a| a.last_text()),
            Some("2")
        );
        let location = element.first_element("Location").unwrap();
        assert_eq!(
            location.first_element("Longitude").and_then(|l| l.last_text()),
            Some("-17.879")
        );
        assert_eq!(
            location.first_element("Altitude").and_then(|a| a.last_text()),
            Some("2363.0")
        );
        assert!(location.first_element("Latitude").is_none());
    }
}
