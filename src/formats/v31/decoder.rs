//! RTML 3.1a decoder.
//!
//! Inverts the encoder's shaping: each `Schedule` folds back into one
//! [`Observation`], its nested `Observation` elements become image data,
//! decomposed coordinates are reassembled into angles, and `RespondTo`
//! becomes the intelligent agent.

use crate::angle::{DmsParts, HmsParts};
use crate::errors::RtmlError;
use crate::formats::Decoded;
use crate::formats::shared::SharedTables;
use crate::formats::walk::{
    Dispatch, Session, expect_tag, leaf_text, parse_attribute, parse_count, parse_f64,
    parse_instant, parse_period, parse_time_bound, parse_url, parse_value, required_attribute,
    required_leaf_text, string_attribute,
};
use crate::model::{
    Contact, Detector, Device, Document, DocumentType, ExposureType, Grating, History,
    HistoryAgent, HistoryEntry, ImageData, IntelligentAgent, ObjectListType, Observation, Project,
    RtmlAttributes, Schedule, Score, Target, Telescope, TelescopeLocation,
};
use crate::xml::{self, XmlDocument, XmlElement};
use log::info;

const CONTEXT: &str = "v31::decoder";

/// One `Schedule` element while it is folded back into an observation.
#[derive(Default)]
struct ScheduleDraft {
    schedule: Schedule,
    observation: Observation,
}

impl AsMut<Schedule> for ScheduleDraft {
    fn as_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }
}

/// Components of a decomposed right ascension or declination.
#[derive(Default)]
struct SexagesimalDraft {
    negative: bool,
    major: Option<u32>,
    minutes: u32,
    seconds: f64,
}

pub struct Decoder {
    shared: SharedTables,
    root: Dispatch<Decoder, Document>,
    history: Dispatch<Decoder, History>,
    entry: Dispatch<Decoder, HistoryEntry>,
    contact: Dispatch<Decoder, Contact>,
    telescope: Dispatch<Decoder, Telescope>,
    aperture: Dispatch<Decoder, Telescope>,
    focal_length: Dispatch<Decoder, Telescope>,
    location: Dispatch<Decoder, TelescopeLocation>,
    device: Dispatch<Decoder, Device>,
    filter: Dispatch<Decoder, Device>,
    detector: Dispatch<Decoder, Detector>,
    binning: Dispatch<Decoder, Detector>,
    grating: Dispatch<Decoder, Grating>,
    schedule: Dispatch<Decoder, ScheduleDraft>,
    exposure: Dispatch<Decoder, Schedule>,
    exposure_constraint: Dispatch<Decoder, Schedule>,
    date_time: Dispatch<Decoder, Schedule>,
    target: Dispatch<Decoder, Target>,
    coordinates: Dispatch<Decoder, Target>,
    right_ascension: Dispatch<Decoder, SexagesimalDraft>,
    declination: Dispatch<Decoder, SexagesimalDraft>,
    observation: Dispatch<Decoder, ImageData>,
    image_data: Dispatch<Decoder, ImageData>,
    scoring: Dispatch<Decoder, Document>,
    scores: Dispatch<Decoder, Document>,
}

impl AsRef<SharedTables> for Decoder {
    fn as_ref(&self) -> &SharedTables {
        &self.shared
    }
}

impl Decoder {
    pub fn new() -> Result<Self, RtmlError> {
        Ok(Self {
            shared: SharedTables::new()?,
            root: Dispatch::new(CONTEXT, "RTML")
                .element("History", rtml_history)?
                .element("Contact", rtml_contact)?
                .element("Project", rtml_project)?
                .element("Telescope", rtml_telescope)?
                .element("RespondTo", rtml_respond_to)?
                .element("Device", rtml_device)?
                .element("Schedule", rtml_schedule)?
                .element("Scoring", rtml_scoring)?
                .text(rtml_error_text)?,
            history: Dispatch::new(CONTEXT, "History").element("Entry", history_entry)?,
            entry: Dispatch::new(CONTEXT, "Entry")
                .element("Agent", entry_agent)?
                .element("Description", entry_description)?
                .element("Error", entry_error)?
                .element("Rejection", entry_rejection)?,
            contact: Dispatch::new(CONTEXT, "Contact")
                .element("Name", contact_name)?
                .element("User", contact_user)?
                .element("Institution", contact_institution)?
                .element("Email", contact_email)?
                .element("Address", contact_address)?
                .element("Telephone", contact_telephone)?
                .element("Fax", contact_fax)?
                .element("Url", contact_url)?,
            telescope: Dispatch::new(CONTEXT, "Telescope")
                .element("Name", telescope_name)?
                .element("Aperture", telescope_aperture)?
                .element("FocalLength", telescope_focal_length)?
                .element("FocalRatio", telescope_focal_ratio)?
                .element("Location", telescope_location)?,
            aperture: Dispatch::new(CONTEXT, "Aperture").element("Value", aperture_value)?,
            focal_length: Dispatch::new(CONTEXT, "FocalLength")
                .element("Value", focal_length_value)?,
            location: Dispatch::new(CONTEXT, "Location")
                .element("Name", location_name)?
                .element("Longitude", location_longitude)?
                .element("Latitude", location_latitude)?
                .element("Height", location_height)?,
            device: Dispatch::new(CONTEXT, "Device")
                .element("Filter", device_filter)?
                .element("Detector", device_detector)?
                .element("Grating", device_grating)?,
            filter: Dispatch::new(CONTEXT, "Filter").element("Type", filter_type)?,
            detector: Dispatch::new(CONTEXT, "Detector").element("Binning", detector_binning)?,
            binning: Dispatch::new(CONTEXT, "Binning")
                .element("X", binning_x)?
                .element("Y", binning_y)?,
            grating: Dispatch::new(CONTEXT, "Grating")
                .element("Wavelength", grating_wavelength)?
                .element("Resolution", grating_resolution)?
                .element("Angle", grating_angle)?,
            schedule: SharedTables::register(
                Dispatch::new(CONTEXT, "Schedule")
                    .element("Device", schedule_device)?
                    .element("Exposure", schedule_exposure)?
                    .element("ExposureConstraint", schedule_exposure_constraint)?
                    .element("DateTimeConstraint", schedule_date_time)?
                    .element("Target", schedule_target)?
                    .element("Observation", schedule_observation)?,
            )?,
            exposure: Dispatch::new(CONTEXT, "Exposure").element("Value", exposure_value)?,
            exposure_constraint: Dispatch::new(CONTEXT, "ExposureConstraint")
                .element("Count", exposure_count)?
                .element("MinimumSignalToNoise", minimum_signal_to_noise)?
                .element("MaximumSignalToNoise", maximum_signal_to_noise)?,
            date_time: Dispatch::new(CONTEXT, "DateTimeConstraint")
                .element("DateTimeStart", date_time_start)?
                .element("DateTimeEnd", date_time_end)?,
            target: Dispatch::new(CONTEXT, "Target")
                .element("Name", target_name)?
                .element("Coordinates", target_coordinates)?,
            coordinates: Dispatch::new(CONTEXT, "Coordinates")
                .element("RightAscension", coordinates_ra)?
                .element("Declination", coordinates_dec)?
                .element("Equinox", coordinates_equinox)?,
            right_ascension: Dispatch::new(CONTEXT, "RightAscension")
                .element("Hours", sexagesimal_major)?
                .element("Minutes", sexagesimal_minutes)?
                .element("Seconds", sexagesimal_seconds)?,
            declination: Dispatch::new(CONTEXT, "Declination")
                .element("Degrees", signed_degrees)?
                .element("Arcminutes", sexagesimal_minutes)?
                .element("Arcseconds", sexagesimal_seconds)?,
            observation: Dispatch::new(CONTEXT, "Observation")
                .element("ImageData", observation_image_data)?
                .element("SourceCatalogue", observation_source_catalogue)?,
            image_data: Dispatch::new(CONTEXT, "ImageData")
                .element("FITSHeader", image_fits_header)?
                .element("ImageURI", image_uri)?,
            scoring: Dispatch::new(CONTEXT, "Scoring")
                .element("Score", scoring_score)?
                .element("Scores", scoring_scores)?
                .element("CompletionTime", scoring_completion_time)?,
            scores: Dispatch::new(CONTEXT, "Scores").element("Score", scores_score)?,
        })
    }

    pub fn decode(&self, doc: &XmlDocument) -> Result<Decoded, RtmlError> {
        let root = &doc.root;
        expect_tag(CONTEXT, root, "RTML")?;

        let mut document = Document::new();
        let mode = required_attribute(CONTEXT, root, "mode")?;
        let document_type = DocumentType::from_mode(mode.trim())
            .map_err(|err| RtmlError::value_caused_by(CONTEXT, "mode", mode, err))?;
        document.set_document_type(document_type);
        document.version = string_attribute(root, "version");
        document.uid = string_attribute(root, "uid");

        let mut session = Session::new();
        self.root.walk(self, root, &mut document, &mut session)?;

        // The uid doubles as the agent's id when the agent has none.
        let uid = document.uid.clone();
        if let Some(agent) = document.intelligent_agent.as_mut() {
            if agent.id.is_none() {
                agent.id = uid;
            }
        }

        info!(
            "Decoded RTML 3.1a {} document with {} observation(s)",
            document_type,
            document.observations().len()
        );
        Ok(Decoded {
            document,
            diagnostics: session.into_diagnostics(),
        })
    }

    pub fn decode_str(&self, text: &str) -> Result<Decoded, RtmlError> {
        self.decode(&xml::parse_str(text)?)
    }
}

fn rtml_attributes(e: &XmlElement) -> RtmlAttributes {
    RtmlAttributes {
        id: string_attribute(e, "id"),
        reference: string_attribute(e, "ref"),
        uref: string_attribute(e, "uref"),
    }
}

fn leaf_f64(e: &XmlElement, s: &mut Session, field: &str) -> Result<f64, RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    parse_f64(CONTEXT, field, text)
}

// RTML

fn rtml_history(
    d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut history = History::new();
    d.history.walk(d, e, &mut history, s)?;
    doc.history = Some(history);
    Ok(())
}

fn rtml_contact(
    d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut contact = Contact::new();
    contact.pi = parse_attribute(CONTEXT, e, "PI")?;
    d.contact.walk(d, e, &mut contact, s)?;
    doc.contact = Some(contact);
    Ok(())
}

fn rtml_project(
    _d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    _s: &mut Session,
) -> Result<(), RtmlError> {
    doc.project = Some(Project {
        project: string_attribute(e, "ProjectID"),
    });
    Ok(())
}

fn rtml_telescope(
    d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut telescope = Telescope::new();
    telescope.attributes = rtml_attributes(e);
    d.telescope.walk(d, e, &mut telescope, s)?;
    doc.telescope = Some(telescope);
    Ok(())
}

fn rtml_respond_to(
    _d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    let url = parse_url(CONTEXT, "respond to", text)?;
    let agent = doc
        .intelligent_agent
        .get_or_insert_with(IntelligentAgent::new);
    agent.hostname = url.host().map(str::to_string);
    if let Some(port) = url.port() {
        agent
            .set_port(port)
            .map_err(|err| RtmlError::value_caused_by(CONTEXT, "respond to", text, err))?;
    }
    agent.uri = Some(url);
    Ok(())
}

fn rtml_device(
    d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    doc.device = Some(decode_device(d, e, s)?);
    Ok(())
}

/// Folds one `Schedule` back into an observation. The observation only gets
/// a schedule when the element has a priority or scheduling content.
fn rtml_schedule(
    d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut draft = ScheduleDraft::default();
    if let Some(priority) = parse_attribute(CONTEXT, e, "priority")? {
        draft.schedule.priority = priority;
    }
    d.schedule.walk(d, e, &mut draft, s)?;

    let ScheduleDraft {
        schedule,
        mut observation,
    } = draft;
    if e.has_attribute("priority") || schedule != Schedule::new() {
        observation.schedule = Some(schedule);
    }
    doc.add_observation(observation);
    Ok(())
}

fn rtml_scoring(
    d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    d.scoring.walk(d, e, doc, s)
}

fn rtml_error_text(
    _d: &Decoder,
    text: &str,
    doc: &mut Document,
    _s: &mut Session,
) -> Result<(), RtmlError> {
    if doc.is_error() {
        doc.set_error_string(text.trim())?;
    }
    Ok(())
}

// History

fn history_entry(
    d: &Decoder,
    e: &XmlElement,
    history: &mut History,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut entry = HistoryEntry::default();
    if let Some(raw) = e.attribute("timeStamp") {
        entry.time_stamp = Some(parse_instant(CONTEXT, "timeStamp", raw)?);
    }
    d.entry.walk(d, e, &mut entry, s)?;
    history.add_entry(entry);
    Ok(())
}

fn entry_agent(
    _d: &Decoder,
    e: &XmlElement,
    entry: &mut HistoryEntry,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let uri = match e.attribute("uri") {
        Some(raw) => Some(parse_url(CONTEXT, "uri", raw)?),
        None => None,
    };
    entry.agent = Some(HistoryAgent {
        name: string_attribute(e, "name"),
        uri,
        description: leaf_text(CONTEXT, e, s).map(str::to_string),
    });
    Ok(())
}

string_leaves! { Decoder, CONTEXT;
    entry_description => HistoryEntry, description;
    entry_error => HistoryEntry, error;
}

fn entry_rejection(
    _d: &Decoder,
    e: &XmlElement,
    entry: &mut HistoryEntry,
    s: &mut Session,
) -> Result<(), RtmlError> {
    entry.rejection_reason = string_attribute(e, "reason");
    entry.rejection_description = leaf_text(CONTEXT, e, s).map(str::to_string);
    Ok(())
}

// Contact

string_leaves! { Decoder, CONTEXT;
    contact_name => Contact, name;
    contact_user => Contact, user;
    contact_institution => Contact, institution;
    contact_email => Contact, email;
    contact_address => Contact, address;
    contact_telephone => Contact, telephone;
    contact_fax => Contact, fax;
    contact_url => Contact, url;
}

// Telescope

string_leaves! { Decoder, CONTEXT;
    telescope_name => Telescope, name;
    telescope_focal_ratio => Telescope, focal_ratio;
    location_name => TelescopeLocation, name;
}

fn telescope_aperture(
    d: &Decoder,
    e: &XmlElement,
    telescope: &mut Telescope,
    s: &mut Session,
) -> Result<(), RtmlError> {
    telescope.aperture_type = string_attribute(e, "type");
    d.aperture.walk(d, e, telescope, s)
}

fn aperture_value(
    _d: &Decoder,
    e: &XmlElement,
    telescope: &mut Telescope,
    s: &mut Session,
) -> Result<(), RtmlError> {
    telescope.aperture_units = string_attribute(e, "units");
    telescope.aperture = Some(leaf_f64(e, s, "aperture")?);
    Ok(())
}

fn telescope_focal_length(
    d: &Decoder,
    e: &XmlElement,
    telescope: &mut Telescope,
    s: &mut Session,
) -> Result<(), RtmlError> {
    d.focal_length.walk(d, e, telescope, s)
}

fn focal_length_value(
    _d: &Decoder,
    e: &XmlElement,
    telescope: &mut Telescope,
    s: &mut Session,
) -> Result<(), RtmlError> {
    telescope.focal_length_units = string_attribute(e, "units");
    telescope.focal_length = Some(leaf_f64(e, s, "focal length")?);
    Ok(())
}

fn telescope_location(
    d: &Decoder,
    e: &XmlElement,
    telescope: &mut Telescope,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut location = TelescopeLocation::new();
    location.attributes = rtml_attributes(e);
    d.location.walk(d, e, &mut location, s)?;
    telescope.location = Some(location);
    Ok(())
}

fn location_longitude(
    _d: &Decoder,
    e: &XmlElement,
    location: &mut TelescopeLocation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    location.longitude = Some(leaf_f64(e, s, "longitude")?);
    Ok(())
}

fn location_latitude(
    _d: &Decoder,
    e: &XmlElement,
    location: &mut TelescopeLocation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    location.latitude = Some(leaf_f64(e, s, "latitude")?);
    Ok(())
}

fn location_height(
    _d: &Decoder,
    e: &XmlElement,
    location: &mut TelescopeLocation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    location.altitude = Some(leaf_f64(e, s, "height")?);
    Ok(())
}

// Device

fn decode_device(d: &Decoder, e: &XmlElement, s: &mut Session) -> Result<Device, RtmlError> {
    let mut device = Device::new();
    device.name = string_attribute(e, "name");
    device.device_type = parse_attribute(CONTEXT, e, "type")?;
    device.spectral_region = parse_attribute(CONTEXT, e, "region")?;
    d.device.walk(d, e, &mut device, s)?;
    Ok(device)
}

fn device_filter(
    d: &Decoder,
    e: &XmlElement,
    device: &mut Device,
    s: &mut Session,
) -> Result<(), RtmlError> {
    d.filter.walk(d, e, device, s)
}

string_leaves! { Decoder, CONTEXT;
    filter_type => Device, filter_type;
}

fn device_detector(
    d: &Decoder,
    e: &XmlElement,
    device: &mut Device,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut detector = Detector::new();
    d.detector.walk(d, e, &mut detector, s)?;
    device.detector = Some(detector);
    Ok(())
}

fn detector_binning(
    d: &Decoder,
    e: &XmlElement,
    detector: &mut Detector,
    s: &mut Session,
) -> Result<(), RtmlError> {
    d.binning.walk(d, e, detector, s)
}

fn binning_x(
    _d: &Decoder,
    e: &XmlElement,
    detector: &mut Detector,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    let columns = parse_count(CONTEXT, "binning X", text)?;
    detector
        .set_column_binning(columns)
        .map_err(|err| RtmlError::value_caused_by(CONTEXT, "binning X", text, err))
}

fn binning_y(
    _d: &Decoder,
    e: &XmlElement,
    detector: &mut Detector,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    let rows = parse_count(CONTEXT, "binning Y", text)?;
    detector
        .set_row_binning(rows)
        .map_err(|err| RtmlError::value_caused_by(CONTEXT, "binning Y", text, err))
}

fn device_grating(
    d: &Decoder,
    e: &XmlElement,
    device: &mut Device,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut grating = Grating {
        name: string_attribute(e, "name"),
        ..Grating::default()
    };
    d.grating.walk(d, e, &mut grating, s)?;
    device.grating = Some(grating);
    Ok(())
}

fn grating_wavelength(
    _d: &Decoder,
    e: &XmlElement,
    grating: &mut Grating,
    s: &mut Session,
) -> Result<(), RtmlError> {
    grating.wavelength_units = string_attribute(e, "units");
    grating.wavelength = Some(leaf_f64(e, s, "wavelength")?);
    Ok(())
}

fn grating_resolution(
    _d: &Decoder,
    e: &XmlElement,
    grating: &mut Grating,
    s: &mut Session,
) -> Result<(), RtmlError> {
    grating.resolution = Some(leaf_f64(e, s, "resolution")?);
    Ok(())
}

fn grating_angle(
    _d: &Decoder,
    e: &XmlElement,
    grating: &mut Grating,
    s: &mut Session,
) -> Result<(), RtmlError> {
    grating.angle = Some(leaf_f64(e, s, "grating angle")?);
    Ok(())
}

// Schedule

fn schedule_device(
    d: &Decoder,
    e: &XmlElement,
    draft: &mut ScheduleDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    draft.observation.device = Some(decode_device(d, e, s)?);
    Ok(())
}

fn schedule_exposure(
    d: &Decoder,
    e: &XmlElement,
    draft: &mut ScheduleDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let schedule = &mut draft.schedule;
    schedule.exposure_type = ExposureType::Time;
    if let Some(count) = parse_attribute::<u32>(CONTEXT, e, "count")? {
        schedule
            .set_exposure_count(count)
            .map_err(|err| RtmlError::value_caused_by(CONTEXT, "count", count.to_string(), err))?;
    }
    d.exposure.walk(d, e, schedule, s)
}

fn exposure_value(
    _d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    s: &mut Session,
) -> Result<(), RtmlError> {
    schedule.exposure_units = string_attribute(e, "units");
    schedule.exposure_length = Some(leaf_f64(e, s, "exposure length")?);
    Ok(())
}

fn schedule_exposure_constraint(
    d: &Decoder,
    e: &XmlElement,
    draft: &mut ScheduleDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    draft.schedule.exposure_type = ExposureType::Snr;
    d.exposure_constraint.walk(d, e, &mut draft.schedule, s)
}

fn exposure_count(
    _d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    let count = parse_count(CONTEXT, "exposure count", text)?;
    schedule
        .set_exposure_count(count)
        .map_err(|err| RtmlError::value_caused_by(CONTEXT, "exposure count", text, err))
}

fn minimum_signal_to_noise(
    _d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    s: &mut Session,
) -> Result<(), RtmlError> {
    schedule.exposure_length = Some(leaf_f64(e, s, "minimum signal to noise")?);
    Ok(())
}

/// Only used when no minimum was given; the model keeps one value.
fn maximum_signal_to_noise(
    _d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let value = leaf_f64(e, s, "maximum signal to noise")?;
    schedule.exposure_length.get_or_insert(value);
    Ok(())
}

fn schedule_date_time(
    d: &Decoder,
    e: &XmlElement,
    draft: &mut ScheduleDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    d.date_time.walk(d, e, &mut draft.schedule, s)
}

fn date_time_start(
    _d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    _s: &mut Session,
) -> Result<(), RtmlError> {
    let raw = required_attribute(CONTEXT, e, "value")?;
    schedule.start_date = Some(parse_time_bound(CONTEXT, "start date", raw)?);
    Ok(())
}

fn date_time_end(
    _d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    _s: &mut Session,
) -> Result<(), RtmlError> {
    let raw = required_attribute(CONTEXT, e, "value")?;
    schedule.end_date = Some(parse_time_bound(CONTEXT, "end date", raw)?);
    Ok(())
}

fn schedule_target(
    d: &Decoder,
    e: &XmlElement,
    draft: &mut ScheduleDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut target = Target::new();
    target.ident = string_attribute(e, "ident");
    if let Some(target_type) = parse_attribute(CONTEXT, e, "type")? {
        target.target_type = target_type;
    }
    d.target.walk(d, e, &mut target, s)?;
    draft.observation.target = Some(target);
    Ok(())
}

fn schedule_observation(
    d: &Decoder,
    e: &XmlElement,
    draft: &mut ScheduleDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut image = ImageData::new();
    d.observation.walk(d, e, &mut image, s)?;
    draft.observation.add_image_data(image);
    Ok(())
}

// Target

string_leaves! { Decoder, CONTEXT;
    target_name => Target, name;
    coordinates_equinox => Target, equinox;
}

fn target_coordinates(
    d: &Decoder,
    e: &XmlElement,
    target: &mut Target,
    s: &mut Session,
) -> Result<(), RtmlError> {
    d.coordinates.walk(d, e, target, s)
}

fn coordinates_ra(
    d: &Decoder,
    e: &XmlElement,
    target: &mut Target,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut draft = SexagesimalDraft::default();
    d.right_ascension.walk(d, e, &mut draft, s)?;
    let hours = draft
        .major
        .ok_or_else(|| RtmlError::structure(CONTEXT, e.describe(), "missing <Hours>"))?;
    let parts = HmsParts::new(hours, draft.minutes, draft.seconds).map_err(|err| {
        RtmlError::value_caused_by(CONTEXT, "right ascension", e.describe(), err)
    })?;
    target.ra = Some(parts.to_angle());
    Ok(())
}

fn coordinates_dec(
    d: &Decoder,
    e: &XmlElement,
    target: &mut Target,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut draft = SexagesimalDraft::default();
    d.declination.walk(d, e, &mut draft, s)?;
    let degrees = draft
        .major
        .ok_or_else(|| RtmlError::structure(CONTEXT, e.describe(), "missing <Degrees>"))?;
    let parts = DmsParts::new(draft.negative, degrees, draft.minutes, draft.seconds).map_err(
        |err| RtmlError::value_caused_by(CONTEXT, "declination", e.describe(), err),
    )?;
    target.dec = Some(parts.to_angle());
    Ok(())
}

fn sexagesimal_major(
    _d: &Decoder,
    e: &XmlElement,
    draft: &mut SexagesimalDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    draft.major = Some(parse_value(CONTEXT, e.name(), text)?);
    Ok(())
}

/// Degrees carry their own sign, so `-00` still marks a southern declination.
fn signed_degrees(
    _d: &Decoder,
    e: &XmlElement,
    draft: &mut SexagesimalDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?.trim();
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    draft.negative = negative;
    draft.major = Some(parse_value(CONTEXT, "degrees", magnitude)?);
    Ok(())
}

fn sexagesimal_minutes(
    _d: &Decoder,
    e: &XmlElement,
    draft: &mut SexagesimalDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    draft.minutes = parse_value(CONTEXT, e.name(), text)?;
    Ok(())
}

fn sexagesimal_seconds(
    _d: &Decoder,
    e: &XmlElement,
    draft: &mut SexagesimalDraft,
    s: &mut Session,
) -> Result<(), RtmlError> {
    draft.seconds = leaf_f64(e, s, e.name())?;
    Ok(())
}

// Images

fn observation_image_data(
    d: &Decoder,
    e: &XmlElement,
    image: &mut ImageData,
    s: &mut Session,
) -> Result<(), RtmlError> {
    image.image_data_type = parse_attribute(CONTEXT, e, "type")?;
    d.image_data.walk(d, e, image, s)
}

fn image_fits_header(
    _d: &Decoder,
    e: &XmlElement,
    image: &mut ImageData,
    s: &mut Session,
) -> Result<(), RtmlError> {
    image.fits_header = leaf_text(CONTEXT, e, s).map(str::to_string);
    Ok(())
}

fn image_uri(
    _d: &Decoder,
    e: &XmlElement,
    image: &mut ImageData,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    image.image_data_url = Some(parse_url(CONTEXT, "image uri", text)?);
    Ok(())
}

fn observation_source_catalogue(
    _d: &Decoder,
    e: &XmlElement,
    image: &mut ImageData,
    s: &mut Session,
) -> Result<(), RtmlError> {
    image.object_list_type = parse_attribute(CONTEXT, e, "type")?;
    let text = leaf_text(CONTEXT, e, s);
    match (image.object_list_type, text) {
        (Some(ObjectListType::Cluster), Some(text)) => {
            image.object_list_cluster = Some(text.to_string());
        }
        (Some(ObjectListType::VotableUrl), Some(text)) if !text.trim().is_empty() => {
            image.object_list_votable_url = Some(parse_url(CONTEXT, "source catalogue", text)?);
        }
        _ => {}
    }
    Ok(())
}

// Scoring

fn scoring_score(
    _d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    doc.score = Some(leaf_f64(e, s, "score")?);
    Ok(())
}

fn scoring_scores(
    d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    d.scores.walk(d, e, doc, s)
}

fn scores_score(
    _d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    _s: &mut Session,
) -> Result<(), RtmlError> {
    let delay = match e.attribute("delay") {
        Some(raw) => Some(parse_period(CONTEXT, "delay", raw)?),
        None => None,
    };
    doc.add_score(Score {
        delay,
        probability: parse_attribute(CONTEXT, e, "probability")?,
        cumulative: parse_attribute(CONTEXT, e, "cumulative")?,
    });
    Ok(())
}

fn scoring_completion_time(
    _d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    doc.completion_time = Some(parse_time_bound(CONTEXT, "completion time", text)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::TimeBound;
    use crate::model::{CloudCover, DeviceType, ImageDataType, TargetType};

    const HEADER: &str = r#"<RTML xmlns="http://www.rtml.org/v3.1a" version="3.1a""#;

    fn decode(body: &str) -> Result<Decoded, RtmlError> {
        Decoder::new().unwrap().decode_str(body)
    }

    #[test]
    fn test_mode_is_required_and_checked() {
        let err = decode(&format!("{}/>", HEADER)).unwrap_err();
        assert!(err.is_structure());
        let err = decode(&format!(r#"{} mode="score"/>"#, HEADER)).unwrap_err();
        assert!(err.is_value());
        let decoded = decode(&format!(r#"{} mode="inquiry" uid="u-1"/>"#, HEADER)).unwrap();
        assert_eq!(decoded.document.document_type(), Some(DocumentType::Score));
        assert_eq!(decoded.document.uid.as_deref(), Some("u-1"));
    }

    #[test]
    fn test_respond_to_becomes_agent() {
        let decoded = decode(&format!(
            r#"{} mode="request" uid="agent-9"><RespondTo>http://estar.example.org:8080/agent</RespondTo></RTML>"#,
            HEADER
        ))
        .unwrap();
        let agent = decoded.document.intelligent_agent.unwrap();
        assert_eq!(agent.hostname.as_deref(), Some("estar.example.org"));
        assert_eq!(agent.port(), Some(8080));
        assert_eq!(agent.id.as_deref(), Some("agent-9"));
        assert_eq!(
            agent.uri.map(|u| u.to_string()).as_deref(),
            Some("http://estar.example.org:8080/agent")
        );
    }

    #[test]
    fn test_schedule_fans_in() {
        let decoded = decode(&format!(
            r#"{} mode="complete">
              <Schedule priority="0">
                <Device name="IO:O" type="camera" region="optical">
                  <Filter><Type>SDSS-R</Type></Filter>
                  <Detector><Binning><X units="pixels">1</X><Y units="pixels">2</Y></Binning></Detector>
                </Device>
                <Exposure count="4"><Value units="seconds">30.0</Value></Exposure>
                <DateTimeConstraint type="include">
                  <DateTimeStart system="UT" value="2012-01-01T00:00:00+00:00"/>
                  <DateTimeEnd system="UT" value="never"/>
                </DateTimeConstraint>
                <ExtinctionConstraint><Clouds>clear</Clouds></ExtinctionConstraint>
                <Target ident="Single" type="toop">
                  <Name>GRB 120101A</Name>
                  <Coordinates>
                    <RightAscension><Hours>12</Hours><Minutes>30</Minutes><Seconds>00.00</Seconds></RightAscension>
                    <Declination><Degrees>-00</Degrees><Arcminutes>30</Arcminutes><Arcseconds>00.00</Arcseconds></Declination>
                    <Equinox>J2000</Equinox>
                  </Coordinates>
                </Target>
                <Observation>
                  <ImageData type="FITS16"><ImageURI>http://archive.example.org/1.fits</ImageURI></ImageData>
                  <SourceCatalogue type="cluster">1 2 3</SourceCatalogue>
                </Observation>
                <Observation>
                  <ImageData type="FITS16"><ImageURI>http://archive.example.org/2.fits</ImageURI></ImageData>
                  <SourceCatalogue/>
                </Observation>
              </Schedule>
            </RTML>"#,
            HEADER
        ))
        .unwrap();
        assert!(decoded.diagnostics.is_empty());
        let observations = decoded.document.observations();
        assert_eq!(observations.len(), 1);
        let obs = &observations[0];

        let device = obs.device.as_ref().unwrap();
        assert_eq!(device.device_type, Some(DeviceType::Camera));
        assert_eq!(device.filter_type.as_deref(), Some("SDSS-R"));
        let detector = device.detector.as_ref().unwrap();
        assert_eq!(detector.column_binning(), 1);
        assert_eq!(detector.row_binning(), 2);

        let schedule = obs.schedule.as_ref().unwrap();
        assert_eq!(schedule.priority, 0);
        assert_eq!(schedule.exposure_count(), 4);
        assert_eq!(schedule.exposure_length, Some(30.0));
        assert_eq!(schedule.exposure_units.as_deref(), Some("seconds"));
        assert_eq!(schedule.end_date, Some(TimeBound::Never));
        assert_eq!(
            schedule.extinction_constraint.as_ref().map(|c| c.clouds),
            Some(CloudCover::Clear)
        );

        let target = obs.target.as_ref().unwrap();
        assert_eq!(target.target_type, TargetType::Toop);
        assert!((target.ra.unwrap().hours() - 12.5).abs() < 1e-9);
        assert!((target.dec.unwrap().degrees() + 0.5).abs() < 1e-9);

        let images = obs.image_data();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].image_data_type, Some(ImageDataType::Fits16));
        assert_eq!(images[0].object_list_cluster.as_deref(), Some("1 2 3"));
        assert_eq!(images[1].object_list_type, None);
    }

    #[test]
    fn test_schedule_without_scheduling_content() {
        let decoded = decode(&format!(
            r#"{} mode="request"><Schedule><Target><Name>M51</Name></Target></Schedule></RTML>"#,
            HEADER
        ))
        .unwrap();
        let obs = &decoded.document.observations()[0];
        assert!(obs.schedule.is_none());
        assert_eq!(obs.target.as_ref().and_then(|t| t.name.as_deref()), Some("M51"));
    }

    #[test]
    fn test_snr_exposure_constraint() {
        let decoded = decode(&format!(
            r#"{} mode="request"><Schedule>
              <ExposureConstraint><Count>2</Count><MinimumSignalToNoise>50.0</MinimumSignalToNoise><MaximumSignalToNoise>80.0</MaximumSignalToNoise></ExposureConstraint>
            </Schedule></RTML>"#,
            HEADER
        ))
        .unwrap();
        let schedule = decoded.document.observations()[0].schedule.clone().unwrap();
        assert_eq!(schedule.exposure_type, ExposureType::Snr);
        assert_eq!(schedule.exposure_count(), 2);
        assert_eq!(schedule.exposure_length, Some(50.0));
    }

    #[test]
    fn test_history_and_scoring() {
        let decoded = decode(&format!(
            r#"{} mode="reject">Out of time
              <History>
                <Entry timeStamp="2012-01-01T10:00:00Z">
                  <Agent name="TEA" uri="http://tea.example.org/agent">Telescope embedded agent</Agent>
                  <Description>Request received</Description>
                  <Rejection reason="insufficient time">Window too short</Rejection>
                </Entry>
              </History>
              <Scoring>
                <Score>0.25</Score>
                <Scores><Score delay="PT2H" probability="NaN" cumulative="0.5"/></Scores>
                <CompletionTime>2012-01-02T00:00:00+00:00</CompletionTime>
              </Scoring>
            </RTML>"#,
            HEADER
        ))
        .unwrap();
        let document = decoded.document;
        assert_eq!(document.error_string(), Some("Out of time"));
        let entry = &document.history.as_ref().unwrap().entries()[0];
        assert!(entry.time_stamp.is_some());
        assert!(entry.is_rejection());
        assert_eq!(entry.rejection_reason.as_deref(), Some("insufficient time"));
        assert_eq!(
            entry.agent.as_ref().and_then(|a| a.description.as_deref()),
            Some("Telescope embedded agent")
        );
        assert_eq!(document.score, Some(0.25));
        let score = &document.scores()[0];
        assert_eq!(score.delay.map(|d| d.hours()), Some(2));
        assert!(score.probability.unwrap().is_nan());
        assert!(matches!(document.completion_time, Some(TimeBound::At(_))));
    }

    #[test]
    fn test_missing_hours_is_structure_error() {
        let err = decode(&format!(
            r#"{} mode="request"><Schedule><Target><Coordinates>
                <RightAscension><Minutes>10</Minutes></RightAscension>
            </Coordinates></Target></Schedule></RTML>"#,
            HEADER
        ))
        .unwrap_err();
        assert!(err.is_structure());
    }

    #[test]
    fn test_project_and_telescope() {
        let decoded = decode(&format!(
            r#"{} mode="request">
              <Project ProjectID="PL12A01"/>
              <Telescope id="lt">
                <Name>Liverpool Telescope</Name>
                <Aperture type="primary"><Value units="meters">2.0</Value></Aperture>
                <Location><Name>La Palma</Name><Height units="meters">2363.0</Height></Location>
              </Telescope>
            </RTML>"#,
            HEADER
        ))
        .unwrap();
        let document = decoded.document;
        assert_eq!(
            document.project.and_then(|p| p.project).as_deref(),
            Some("PL12A01")
        );
        let telescope = document.telescope.unwrap();
        assert_eq!(telescope.attributes.id.as_deref(), Some("lt"));
        assert_eq!(telescope.aperture, Some(2.0));
        assert_eq!(telescope.aperture_units.as_deref(), Some("meters"));
        assert_eq!(telescope.aperture_type.as_deref(), Some("primary"));
        assert_eq!(telescope.location.and_then(|l| l.altitude), Some(2363.0));
    }
}
