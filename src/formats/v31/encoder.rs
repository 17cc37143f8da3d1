//! RTML 3.1a encoder.
//!
//! Every stored observation becomes one `Schedule`. The schedule carries the
//! observation's device, exposure, constraints and target, followed by one
//! nested `Observation` per image, each holding exactly one `ImageData` and
//! one `SourceCatalogue`.

use super::{NAMESPACE, VERSION, XSI_NAMESPACE};
use crate::date::format_date;
use crate::formats::EncoderOptions;
use crate::formats::numeric::{
    ALTITUDE, EXPOSURE, GEODETIC, GRATING, OPTICS, SEXAGESIMAL_SECONDS, TWO_DIGITS,
    format_shortest,
};
use crate::formats::shared::create_constraints;
use crate::formats::v22::encoder::create_contact;
use crate::model::{
    Device, Document, ExposureType, History, ImageData, ObjectListType, Observation, Project,
    RtmlAttributes, Schedule, Target, Telescope, TelescopeLocation,
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

    pub fn encode(&self, document: &Document) -> XmlDocument {
        XmlDocument::new(self.create_rtml(document))
    }

    fn create_rtml(&self, document: &Document) -> XmlElement {
        let mut root = XmlElement::new("RTML")
            .with_attribute("xmlns", NAMESPACE)
            .with_attribute("xmlns:xsi", XSI_NAMESPACE)
            .with_attribute(
                "xsi:schemaLocation",
                format!("{} {}", NAMESPACE, self.options.schema_url),
            )
            .with_attribute("version", VERSION);
        if let Some(document_type) = document.document_type() {
            root.set_attribute("mode", document_type.mode_str());
        }
        let uid = document.uid.as_deref().or_else(|| {
            document
                .intelligent_agent
                .as_ref()
                .and_then(|agent| agent.id.as_deref())
        });
        if let Some(uid) = uid {
            root.set_attribute("uid", uid);
        }
        if let Some(error) = document.error_string() {
            root.append_text(error);
        }

        if let Some(history) = &document.history {
            create_history(&mut root, history);
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
        if let Some(respond_to) = document
            .intelligent_agent
            .as_ref()
            .and_then(|agent| agent.respond_to())
        {
            root.append_element(XmlElement::new("RespondTo").with_text(respond_to));
        }
        if let Some(device) = &document.device {
            create_device(&mut root, device);
        }

        // One Schedule per observation, one nested Observation per image.
        for observation in document.observations() {
            let mut schedule = create_schedule(observation);
            for image in observation.image_data() {
                let mut nested = XmlElement::new("Observation");
                create_image_data(&mut nested, image);
                create_source_catalogue(&mut nested, image);
                schedule.append_element(nested);
            }
            root.append_element(schedule);
        }

        create_scoring(&mut root, document);

        debug!(
            "Encoded RTML 3.1a tree with {} schedule(s)",
            document.observations().len()
        );
        root
    }
}

fn append_leaf(parent: &mut XmlElement, tag: &str, value: Option<&str>) {
    if let Some(value) = value {
        parent.append_element(XmlElement::new(tag).with_text(value));
    }
}

fn set_rtml_attributes(element: &mut XmlElement, attributes: &RtmlAttributes) {
    if let Some(id) = &attributes.id {
        element.set_attribute("id", id.as_str());
    }
    if let Some(reference) = &attributes.reference {
        element.set_attribute("ref", reference.as_str());
    }
    if let Some(uref) = &attributes.uref {
        element.set_attribute("uref", uref.as_str());
    }
}

/// `<tag><Value units="..">n</Value></tag>`
fn valued(tag: &str, value: String, units: Option<&str>) -> XmlElement {
    let mut element = XmlElement::new("Value");
    if let Some(units) = units {
        element.set_attribute("units", units);
    }
    XmlElement::new(tag).with_child(element.with_text(value))
}

pub fn create_history(parent: &mut XmlElement, history: &History) {
    let mut element = XmlElement::new("History");
    for entry in history.entries() {
        let mut child = XmlElement::new("Entry");
        if let Some(time_stamp) = &entry.time_stamp {
            child.set_attribute("timeStamp", format_date(time_stamp));
        }
        if let Some(agent) = &entry.agent {
            let mut agent_element = XmlElement::new("Agent");
            if let Some(name) = &agent.name {
                agent_element.set_attribute("name", name.as_str());
            }
            if let Some(uri) = &agent.uri {
                agent_element.set_attribute("uri", uri.to_string());
            }
            if let Some(description) = &agent.description {
                agent_element.append_text(description.as_str());
            }
            child.append_element(agent_element);
        }
        append_leaf(&mut child, "Description", entry.description.as_deref());
        append_leaf(&mut child, "Error", entry.error.as_deref());
        if entry.is_rejection() {
            let mut rejection = XmlElement::new("Rejection");
            if let Some(reason) = &entry.rejection_reason {
                rejection.set_attribute("reason", reason.as_str());
            }
            if let Some(description) = &entry.rejection_description {
                rejection.append_text(description.as_str());
            }
            child.append_element(rejection);
        }
        element.append_element(child);
    }
    parent.append_element(element);
}

pub fn create_project(parent: &mut XmlElement, project: &Project) {
    let mut element = XmlElement::new("Project");
    if let Some(id) = &project.project {
        element.set_attribute("ProjectID", id.as_str());
    }
    parent.append_element(element);
}

pub fn create_telescope(parent: &mut XmlElement, telescope: &Telescope) {
    let mut element = XmlElement::new("Telescope");
    set_rtml_attributes(&mut element, &telescope.attributes);
    append_leaf(&mut element, "Name", telescope.name.as_deref());
    if let Some(aperture) = telescope.aperture {
        let mut child = valued(
            "Aperture",
            OPTICS.format(aperture),
            telescope.aperture_units.as_deref(),
        );
        if let Some(kind) = &telescope.aperture_type {
            child.set_attribute("type", kind.as_str());
        }
        element.append_element(child);
    }
    if let Some(focal_length) = telescope.focal_length {
        element.append_element(valued(
            "FocalLength",
            OPTICS.format(focal_length),
            telescope.focal_length_units.as_deref(),
        ));
    }
    append_leaf(&mut element, "FocalRatio", telescope.focal_ratio.as_deref());
    if let Some(location) = &telescope.location {
        create_location(&mut element, location);
    }
    parent.append_element(element);
}

fn create_location(parent: &mut XmlElement, location: &TelescopeLocation) {
    let mut element = XmlElement::new("Location");
    set_rtml_attributes(&mut element, &location.attributes);
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
    if let Some(height) = location.altitude {
        element.append_element(
            XmlElement::new("Height")
                .with_attribute("units", "meters")
                .with_text(ALTITUDE.format(height)),
        );
    }
    parent.append_element(element);
}

pub fn create_device(parent: &mut XmlElement, device: &Device) {
    let mut element = XmlElement::new("Device");
    if let Some(name) = &device.name {
        element.set_attribute("name", name.as_str());
    }
    if let Some(device_type) = device.device_type {
        element.set_attribute("type", device_type.as_str());
    }
    if let Some(region) = device.spectral_region {
        element.set_attribute("region", region.as_str());
    }
    if let Some(filter) = &device.filter_type {
        element.append_element(
            XmlElement::new("Filter").with_child(XmlElement::new("Type").with_text(filter.as_str())),
        );
    }
    if let Some(detector) = &device.detector {
        let binning = XmlElement::new("Binning")
            .with_child(
                XmlElement::new("X")
                    .with_attribute("units", "pixels")
                    .with_text(detector.column_binning().to_string()),
            )
            .with_child(
                XmlElement::new("Y")
                    .with_attribute("units", "pixels")
                    .with_text(detector.row_binning().to_string()),
            );
        element.append_element(XmlElement::new("Detector").with_child(binning));
    }
    if let Some(grating) = &device.grating {
        let mut child = XmlElement::new("Grating");
        if let Some(name) = &grating.name {
            child.set_attribute("name", name.as_str());
        }
        if let Some(wavelength) = grating.wavelength {
            let mut wavelength_element = XmlElement::new("Wavelength");
            if let Some(units) = &grating.wavelength_units {
                wavelength_element.set_attribute("units", units.as_str());
            }
            child.append_element(wavelength_element.with_text(GRATING.format(wavelength)));
        }
        if let Some(resolution) = grating.resolution {
            child.append_element(
                XmlElement::new("Resolution").with_text(GRATING.format(resolution)),
            );
        }
        if let Some(angle) = grating.angle {
            child.append_element(XmlElement::new("Angle").with_text(GRATING.format(angle)));
        }
        element.append_element(child);
    }
    parent.append_element(element);
}

/// The `Schedule` element for one observation, without its nested images.
pub fn create_schedule(observation: &Observation) -> XmlElement {
    let mut element = XmlElement::new("Schedule");
    if let Some(device) = &observation.device {
        create_device(&mut element, device);
    }
    if let Some(schedule) = &observation.schedule {
        element.set_attribute("priority", schedule.priority.to_string());
        create_exposure(&mut element, schedule);
        create_date_time_constraint(&mut element, schedule);
        create_constraints(&mut element, schedule, Some("arcseconds"));
    }
    if let Some(target) = &observation.target {
        create_target(&mut element, target);
    }
    element
}

fn create_exposure(parent: &mut XmlElement, schedule: &Schedule) {
    let Some(length) = schedule.exposure_length else {
        return;
    };
    let count = schedule.exposure_count().to_string();
    match schedule.exposure_type {
        ExposureType::Time => {
            let mut element = valued(
                "Exposure",
                EXPOSURE.format(length),
                schedule.exposure_units.as_deref(),
            );
            element.set_attribute("count", count);
            parent.append_element(element);
        }
        ExposureType::Snr => {
            // The model stores a single signal to noise value; it bounds both ends.
            let snr = EXPOSURE.format(length);
            parent.append_element(
                XmlElement::new("ExposureConstraint")
                    .with_child(XmlElement::new("Count").with_text(count))
                    .with_child(XmlElement::new("MinimumSignalToNoise").with_text(snr.as_str()))
                    .with_child(XmlElement::new("MaximumSignalToNoise").with_text(snr)),
            );
        }
    }
}

fn create_date_time_constraint(parent: &mut XmlElement, schedule: &Schedule) {
    if schedule.start_date.is_none() && schedule.end_date.is_none() {
        return;
    }
    let mut element = XmlElement::new("DateTimeConstraint").with_attribute("type", "include");
    if let Some(start) = &schedule.start_date {
        element.append_element(
            XmlElement::new("DateTimeStart")
                .with_attribute("system", "UT")
                .with_attribute("value", start.to_string()),
        );
    }
    if let Some(end) = &schedule.end_date {
        element.append_element(
            XmlElement::new("DateTimeEnd")
                .with_attribute("system", "UT")
                .with_attribute("value", end.to_string()),
        );
    }
    parent.append_element(element);
}

pub fn create_target(parent: &mut XmlElement, target: &Target) {
    let mut element = XmlElement::new("Target");
    if let Some(ident) = &target.ident {
        element.set_attribute("ident", ident.as_str());
    }
    element.set_attribute("type", target.target_type.as_str());
    append_leaf(&mut element, "Name", target.name.as_deref());

    if target.ra.is_some() || target.dec.is_some() || target.equinox.is_some() {
        let mut coordinates = XmlElement::new("Coordinates");
        if let Some(ra) = target.ra {
            let hms = ra.to_hms(2);
            coordinates.append_element(
                XmlElement::new("RightAscension")
                    .with_child(XmlElement::new("Hours").with_text(TWO_DIGITS.format(hms.hours as f64)))
                    .with_child(
                        XmlElement::new("Minutes").with_text(TWO_DIGITS.format(hms.minutes as f64)),
                    )
                    .with_child(
                        XmlElement::new("Seconds")
                            .with_text(SEXAGESIMAL_SECONDS.format(hms.seconds)),
                    ),
            );
        }
        if let Some(dec) = target.dec {
            let dms = dec.to_dms(2);
            let degrees = format!("{}{}", dms.sign_char(), TWO_DIGITS.format(dms.degrees as f64));
            coordinates.append_element(
                XmlElement::new("Declination")
                    .with_child(XmlElement::new("Degrees").with_text(degrees))
                    .with_child(
                        XmlElement::new("Arcminutes")
                            .with_text(TWO_DIGITS.format(dms.arcminutes as f64)),
                    )
                    .with_child(
                        XmlElement::new("Arcseconds")
                            .with_text(SEXAGESIMAL_SECONDS.format(dms.arcseconds)),
                    ),
            );
        }
        append_leaf(&mut coordinates, "Equinox", target.equinox.as_deref());
        element.append_element(coordinates);
    }
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
    if let Some(url) = &image.image_data_url {
        element.append_element(XmlElement::new("ImageURI").with_text(url.to_string()));
    }
    parent.append_element(element);
}

/// Always written, so every nested observation pairs one image with one catalogue.
pub fn create_source_catalogue(parent: &mut XmlElement, image: &ImageData) {
    let mut element = XmlElement::new("SourceCatalogue");
    if let Some(list_type) = image.object_list_type {
        element.set_attribute("type", list_type.as_str());
        match list_type {
            ObjectListType::Cluster => {
                if let Some(cluster) = &image.object_list_cluster {
                    element.append_text(cluster.as_str());
                }
            }
            ObjectListType::VotableUrl => {
                if let Some(url) = &image.object_list_votable_url {
                    element.append_text(url.to_string());
                }
            }
            ObjectListType::Xml => {}
        }
    }
    parent.append_element(element);
}

fn create_scoring(parent: &mut XmlElement, document: &Document) {
    if document.score.is_none()
        && document.scores().is_empty()
        && document.completion_time.is_none()
    {
        return;
    }
    let mut element = XmlElement::new("Scoring");
    if let Some(score) = document.score {
        element.append_element(XmlElement::new("Score").with_text(format_shortest(score)));
    }
    if !document.scores().is_empty() {
        let mut scores = XmlElement::new("Scores");
        for score in document.scores() {
            let mut child = XmlElement::new("Score");
            if let Some(delay) = &score.delay {
                child.set_attribute("delay", delay.to_string());
            }
            if let Some(probability) = score.probability {
                child.set_attribute("probability", format_shortest(probability));
            }
            if let Some(cumulative) = score.cumulative {
                child.set_attribute("cumulative", format_shortest(cumulative));
            }
            scores.append_element(child);
        }
        element.append_element(scores);
    }
    if let Some(completion) = &document.completion_time {
        element.append_element(XmlElement::new("CompletionTime").with_text(completion.to_string()));
    }
    parent.append_element(element);
}
