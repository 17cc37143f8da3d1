//! RTML 2.2 decoder.

use crate::angle::{Angle, AngleError, parse_dms, parse_hms};
use crate::errors::RtmlError;
use crate::formats::Decoded;
use crate::formats::shared::SharedTables;
use crate::formats::walk::{
    Dispatch, Session, expect_tag, leaf_text, parse_attribute, parse_count, parse_f64,
    parse_time_bound, parse_url, parse_value, required_attribute, required_leaf_text,
    string_attribute,
};
use crate::model::{
    Contact, Detector, Device, Document, DocumentType, ImageData, IntelligentAgent,
    ObjectListType, Observation, Project, Schedule, Target, Telescope, TelescopeLocation,
};
use crate::xml::{self, XmlDocument, XmlElement};
use log::info;

const CONTEXT: &str = "v22::decoder";

/// Decodes RTML 2.2 trees. Build once and reuse; decoding does not mutate it.
pub struct Decoder {
    shared: SharedTables,
    root: Dispatch<Decoder, Document>,
    contact: Dispatch<Decoder, Contact>,
    telescope: Dispatch<Decoder, Telescope>,
    location: Dispatch<Decoder, TelescopeLocation>,
    device: Dispatch<Decoder, Device>,
    filter: Dispatch<Decoder, Device>,
    detector: Dispatch<Decoder, Detector>,
    observation: Dispatch<Decoder, Observation>,
    target: Dispatch<Decoder, Target>,
    coordinates: Dispatch<Decoder, Target>,
    schedule: Dispatch<Decoder, Schedule>,
    exposure: Dispatch<Decoder, Schedule>,
    time_constraint: Dispatch<Decoder, Schedule>,
    image_data: Dispatch<Decoder, ImageData>,
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
                .element("Contact", rtml_contact)?
                .element("Project", rtml_project)?
                .element("Telescope", rtml_telescope)?
                .element("IntelligentAgent", rtml_agent)?
                .element("Device", rtml_device)?
                .element("Observation", rtml_observation)?
                .element("Score", rtml_score)?
                .element("CompletionTime", rtml_completion_time)?
                .text(rtml_error_text)?,
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
            location: Dispatch::new(CONTEXT, "Location")
                .element("Name", location_name)?
                .element("Longitude", location_longitude)?
                .element("Latitude", location_latitude)?
                .element("Altitude", location_altitude)?,
            device: Dispatch::new(CONTEXT, "Device")
                .element("Filter", device_filter)?
                .element("Detector", device_detector)?,
            filter: Dispatch::new(CONTEXT, "Filter").element("FilterType", filter_type)?,
            detector: Dispatch::new(CONTEXT, "Detector").element("Binning", detector_binning)?,
            observation: Dispatch::new(CONTEXT, "Observation")
                .element("Target", observation_target)?
                .element("Device", observation_device)?
                .element("Schedule", observation_schedule)?
                .element("ImageData", observation_image_data)?,
            target: Dispatch::new(CONTEXT, "Target")
                .element("TargetName", target_name)?
                .element("Coordinates", target_coordinates)?,
            coordinates: Dispatch::new(CONTEXT, "Coordinates")
                .element("RightAscension", coordinates_ra)?
                .element("Declination", coordinates_dec)?
                .element("Equinox", coordinates_equinox)?,
            schedule: SharedTables::register(
                Dispatch::new(CONTEXT, "Schedule")
                    .element("Exposure", schedule_exposure)?
                    .element("TimeConstraint", schedule_time_constraint)?,
            )?,
            exposure: Dispatch::new(CONTEXT, "Exposure")
                .element("Count", exposure_count)?
                .text(exposure_length)?,
            time_constraint: Dispatch::new(CONTEXT, "TimeConstraint")
                .element("StartDateTime", time_start)?
                .element("EndDateTime", time_end)?,
            image_data: Dispatch::new(CONTEXT, "ImageData")
                .element("FITSHeader", image_fits_header)?
                .element("ObjectList", image_object_list)?
                .text(image_url)?,
        })
    }

    /// Decode a parsed tree. The first error aborts the whole decode.
    pub fn decode(&self, doc: &XmlDocument) -> Result<Decoded, RtmlError> {
        let root = &doc.root;
        expect_tag(CONTEXT, root, "RTML")?;

        let mut document = Document::new();
        let raw_type = required_attribute(CONTEXT, root, "type")?;
        let document_type: DocumentType = parse_value(CONTEXT, "type", raw_type)?;
        document.set_document_type(document_type);
        document.version = string_attribute(root, "version");

        let mut session = Session::new();
        self.root.walk(self, root, &mut document, &mut session)?;

        info!(
            "Decoded RTML 2.2 {} document with {} observation(s)",
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

// RTML

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
    s: &mut Session,
) -> Result<(), RtmlError> {
    doc.project = Some(Project {
        project: leaf_text(CONTEXT, e, s).map(|t| t.trim().to_string()),
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
    d.telescope.walk(d, e, &mut telescope, s)?;
    doc.telescope = Some(telescope);
    Ok(())
}

fn rtml_agent(
    _d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut agent = IntelligentAgent::new();
    agent.hostname = string_attribute(e, "host");
    if let Some(port) = e.attribute("port") {
        agent
            .set_port_str(port)
            .map_err(|err| RtmlError::value_caused_by(CONTEXT, "port", port, err))?;
    }
    agent.id = leaf_text(CONTEXT, e, s).map(|t| t.trim().to_string());
    doc.intelligent_agent = Some(agent);
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

fn rtml_observation(
    d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut observation = Observation::new();
    d.observation.walk(d, e, &mut observation, s)?;
    doc.add_observation(observation);
    Ok(())
}

fn rtml_score(
    _d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    doc.score = Some(parse_f64(CONTEXT, "score", text)?);
    Ok(())
}

fn rtml_completion_time(
    _d: &Decoder,
    e: &XmlElement,
    doc: &mut Document,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    doc.completion_time = Some(parse_time_bound(CONTEXT, "completion time", text)?);
    Ok(())
}

/// Root text is the error message of reject, fail and abort documents.
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
    _d: &Decoder,
    e: &XmlElement,
    telescope: &mut Telescope,
    s: &mut Session,
) -> Result<(), RtmlError> {
    telescope.aperture_type = string_attribute(e, "type");
    telescope.aperture_units = string_attribute(e, "units");
    let text = required_leaf_text(CONTEXT, e, s)?;
    telescope.aperture = Some(parse_f64(CONTEXT, "aperture", text)?);
    Ok(())
}

fn telescope_focal_length(
    _d: &Decoder,
    e: &XmlElement,
    telescope: &mut Telescope,
    s: &mut Session,
) -> Result<(), RtmlError> {
    telescope.focal_length_units = string_attribute(e, "units");
    let text = required_leaf_text(CONTEXT, e, s)?;
    telescope.focal_length = Some(parse_f64(CONTEXT, "focal length", text)?);
    Ok(())
}

fn telescope_location(
    d: &Decoder,
    e: &XmlElement,
    telescope: &mut Telescope,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut location = TelescopeLocation::new();
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
    let text = required_leaf_text(CONTEXT, e, s)?;
    location.longitude = Some(parse_f64(CONTEXT, "longitude", text)?);
    Ok(())
}

fn location_latitude(
    _d: &Decoder,
    e: &XmlElement,
    location: &mut TelescopeLocation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    location.latitude = Some(parse_f64(CONTEXT, "latitude", text)?);
    Ok(())
}

fn location_altitude(
    _d: &Decoder,
    e: &XmlElement,
    location: &mut TelescopeLocation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    location.altitude = Some(parse_f64(CONTEXT, "altitude", text)?);
    Ok(())
}

// Device

fn decode_device(d: &Decoder, e: &XmlElement, s: &mut Session) -> Result<Device, RtmlError> {
    let mut device = Device::new();
    device.device_type = parse_attribute(CONTEXT, e, "type")?;
    device.spectral_region = parse_attribute(CONTEXT, e, "region")?;
    device.name = string_attribute(e, "name");
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
    _d: &Decoder,
    e: &XmlElement,
    detector: &mut Detector,
    _s: &mut Session,
) -> Result<(), RtmlError> {
    if let Some(rows) = parse_attribute::<u32>(CONTEXT, e, "rows")? {
        detector
            .set_row_binning(rows)
            .map_err(|err| RtmlError::value_caused_by(CONTEXT, "rows", rows.to_string(), err))?;
    }
    if let Some(columns) = parse_attribute::<u32>(CONTEXT, e, "columns")? {
        detector.set_column_binning(columns).map_err(|err| {
            RtmlError::value_caused_by(CONTEXT, "columns", columns.to_string(), err)
        })?;
    }
    Ok(())
}

// Observation

fn observation_target(
    d: &Decoder,
    e: &XmlElement,
    observation: &mut Observation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut target = Target::new();
    if let Some(target_type) = parse_attribute(CONTEXT, e, "type")? {
        target.target_type = target_type;
    }
    target.ident = string_attribute(e, "ident");
    d.target.walk(d, e, &mut target, s)?;
    observation.target = Some(target);
    Ok(())
}

fn observation_device(
    d: &Decoder,
    e: &XmlElement,
    observation: &mut Observation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    observation.device = Some(decode_device(d, e, s)?);
    Ok(())
}

fn observation_schedule(
    d: &Decoder,
    e: &XmlElement,
    observation: &mut Observation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut schedule = Schedule::new();
    if let Some(priority) = parse_attribute(CONTEXT, e, "priority")? {
        schedule.priority = priority;
    }
    d.schedule.walk(d, e, &mut schedule, s)?;
    observation.schedule = Some(schedule);
    Ok(())
}

fn observation_image_data(
    d: &Decoder,
    e: &XmlElement,
    observation: &mut Observation,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let mut image = ImageData::new();
    image.image_data_type = parse_attribute(CONTEXT, e, "type")?;
    d.image_data.walk(d, e, &mut image, s)?;
    observation.add_image_data(image);
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
    _d: &Decoder,
    e: &XmlElement,
    target: &mut Target,
    s: &mut Session,
) -> Result<(), RtmlError> {
    target.ra = Some(decode_angle(e, s, "hms", parse_hms)?);
    Ok(())
}

fn coordinates_dec(
    _d: &Decoder,
    e: &XmlElement,
    target: &mut Target,
    s: &mut Session,
) -> Result<(), RtmlError> {
    target.dec = Some(decode_angle(e, s, "dms", parse_dms)?);
    Ok(())
}

/// `units` picks the text form: `radians` for a plain number, otherwise the
/// element's sexagesimal unit name.
fn decode_angle(
    e: &XmlElement,
    s: &mut Session,
    sexagesimal_units: &str,
    parse: fn(&str) -> Result<Angle, AngleError>,
) -> Result<Angle, RtmlError> {
    let units = required_attribute(CONTEXT, e, "units")?;
    let text = required_leaf_text(CONTEXT, e, s)?;
    match units {
        "radians" => Ok(Angle::from_radians(parse_f64(CONTEXT, e.name(), text)?)),
        u if u == sexagesimal_units => {
            parse(text).map_err(|err| RtmlError::value_caused_by(CONTEXT, e.name(), text, err))
        }
        other => Err(RtmlError::value(CONTEXT, "units", other)),
    }
}

// Schedule

fn schedule_exposure(
    d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    s: &mut Session,
) -> Result<(), RtmlError> {
    if let Some(exposure_type) = parse_attribute(CONTEXT, e, "type")? {
        schedule.exposure_type = exposure_type;
    }
    schedule.exposure_units = string_attribute(e, "units");
    d.exposure.walk(d, e, schedule, s)
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

fn exposure_length(
    _d: &Decoder,
    text: &str,
    schedule: &mut Schedule,
    _s: &mut Session,
) -> Result<(), RtmlError> {
    schedule.exposure_length = Some(parse_f64(CONTEXT, "exposure length", text)?);
    Ok(())
}

fn schedule_time_constraint(
    d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    s: &mut Session,
) -> Result<(), RtmlError> {
    d.time_constraint.walk(d, e, schedule, s)
}

fn time_start(
    _d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    schedule.start_date = Some(parse_time_bound(CONTEXT, "start date", text)?);
    Ok(())
}

fn time_end(
    _d: &Decoder,
    e: &XmlElement,
    schedule: &mut Schedule,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    schedule.end_date = Some(parse_time_bound(CONTEXT, "end date", text)?);
    Ok(())
}

// ImageData

fn image_fits_header(
    _d: &Decoder,
    e: &XmlElement,
    image: &mut ImageData,
    s: &mut Session,
) -> Result<(), RtmlError> {
    image.fits_header = leaf_text(CONTEXT, e, s).map(str::to_string);
    Ok(())
}

/// The `type` attribute decides how the text is read.
fn image_object_list(
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
            image.object_list_votable_url = Some(parse_url(CONTEXT, "object list url", text)?);
        }
        _ => {}
    }
    Ok(())
}

fn image_url(
    _d: &Decoder,
    text: &str,
    image: &mut ImageData,
    _s: &mut Session,
) -> Result<(), RtmlError> {
    if !text.trim().is_empty() {
        image.image_data_url = Some(parse_url(CONTEXT, "image data url", text)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::TimeBound;
    use crate::model::{DeviceType, ExposureType, ImageDataType, SpectralRegion, TargetType};

    fn decode(xml: &str) -> Result<Decoded, RtmlError> {
        Decoder::new().unwrap().decode_str(xml)
    }

    #[test]
    fn test_decode_minimal() {
        let decoded = decode(r#"<RTML version="2.2" type="request"/>"#).unwrap();
        assert_eq!(decoded.document.document_type(), Some(DocumentType::Request));
        assert_eq!(decoded.document.version.as_deref(), Some("2.2"));
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_type_is_structure_error() {
        let err = decode(r#"<RTML version="2.2"/>"#).unwrap_err();
        assert!(err.is_structure());
    }

    #[test]
    fn test_bad_type_is_value_error() {
        let err = decode(r#"<RTML version="2.2" type="normal"/>"#).unwrap_err();
        assert!(err.is_value());
        assert!(err.to_string().contains("illegal type 'normal'"));
    }

    #[test]
    fn test_wrong_root_is_structure_error() {
        let err = decode(r#"<RTML3 type="request"/>"#).unwrap_err();
        assert!(err.is_structure());
    }

    #[test]
    fn test_error_string_only_for_error_types() {
        let decoded = decode(r#"<RTML version="2.2" type="reject">No such target</RTML>"#).unwrap();
        assert_eq!(decoded.document.error_string(), Some("No such target"));
        let decoded = decode(r#"<RTML version="2.2" type="request">stray text</RTML>"#).unwrap();
        assert_eq!(decoded.document.error_string(), None);
    }

    #[test]
    fn test_decode_device_and_target() {
        let decoded = decode(
            r#"<RTML version="2.2" type="request">
              <Observation>
                <Target type="toop" ident="ExoPlanetMonitor">
                  <TargetName>OB06251</TargetName>
                  <Coordinates>
                    <RightAscension format="hh mm ss.ss" units="hms">17 52 05.00</RightAscension>
                    <Declination format="sdd mm ss.ss" units="dms">-29 59 59.00</Declination>
                    <Equinox>J2000</Equinox>
                  </Coordinates>
                </Target>
                <Device type="camera" region="optical" name="RATCam">
                  <Filter><FilterType>R</FilterType></Filter>
                  <Detector><Binning rows="1" columns="1"/></Detector>
                </Device>
              </Observation>
            </RTML>"#,
        )
        .unwrap();
        let obs = &decoded.document.observations()[0];
        let target = obs.target.as_ref().unwrap();
        assert_eq!(target.target_type, TargetType::Toop);
        assert_eq!(target.ident.as_deref(), Some("ExoPlanetMonitor"));
        assert_eq!(target.name.as_deref(), Some("OB06251"));
        assert!((target.ra.unwrap().hours() - (17.0 + 52.0 / 60.0 + 5.0 / 3600.0)).abs() < 1e-9);
        assert!((target.dec.unwrap().degrees() + (29.0 + 59.0 / 60.0 + 59.0 / 3600.0)).abs() < 1e-9);
        assert_eq!(target.equinox.as_deref(), Some("J2000"));

        let device = obs.device.as_ref().unwrap();
        assert_eq!(device.device_type, Some(DeviceType::Camera));
        assert_eq!(device.spectral_region, Some(SpectralRegion::Optical));
        assert_eq!(device.filter_type.as_deref(), Some("R"));
        assert_eq!(device.detector.as_ref().unwrap().row_binning(), 1);
    }

    #[test]
    fn test_radians_and_bad_units() {
        let decoded = decode(
            r#"<RTML version="2.2" type="request"><Observation><Target><Coordinates>
                <RightAscension units="radians">1.0</RightAscension>
            </Coordinates></Target></Observation></RTML>"#,
        )
        .unwrap();
        let ra = decoded.document.observations()[0].target.as_ref().unwrap().ra.unwrap();
        assert!((ra.radians() - 1.0).abs() < 1e-12);

        let err = decode(
            r#"<RTML version="2.2" type="request"><Observation><Target><Coordinates>
                <RightAscension units="degrees">15.0</RightAscension>
            </Coordinates></Target></Observation></RTML>"#,
        )
        .unwrap_err();
        assert!(err.is_value());
        assert!(err.to_string().contains("illegal units 'degrees'"));
    }

    #[test]
    fn test_schedule_and_time_bounds() {
        let decoded = decode(
            r#"<RTML version="2.2" type="request"><Observation>
                <Schedule priority="0">
                  <Exposure type="time" units="seconds"><Count>3</Count>120.0</Exposure>
                  <TimeConstraint>
                    <StartDateTime>2005-03-01T12:00:00+00:00</StartDateTime>
                    <EndDateTime>never</EndDateTime>
                  </TimeConstraint>
                </Schedule>
            </Observation></RTML>"#,
        )
        .unwrap();
        let schedule = decoded.document.observations()[0].schedule.as_ref().unwrap();
        assert_eq!(schedule.priority, 0);
        assert_eq!(schedule.exposure_type, ExposureType::Time);
        assert_eq!(schedule.exposure_length, Some(120.0));
        assert_eq!(schedule.exposure_count(), 3);
        assert_eq!(schedule.exposure_length_milliseconds(), Some(120_000.0));
        assert!(matches!(schedule.start_date, Some(TimeBound::At(_))));
        assert_eq!(schedule.end_date, Some(TimeBound::Never));
    }

    #[test]
    fn test_zero_exposure_count_rejected() {
        let err = decode(
            r#"<RTML version="2.2" type="request"><Observation><Schedule>
                <Exposure type="time" units="s"><Count>0</Count>1.0</Exposure>
            </Schedule></Observation></RTML>"#,
        )
        .unwrap_err();
        assert!(err.is_value());
    }

    #[test]
    fn test_image_data_and_object_lists() {
        let decoded = decode(
            r#"<RTML version="2.2" type="observation"><Observation>
                <ImageData type="FITS16">
                  <FITSHeader type="all">SIMPLE  =  T</FITSHeader>
                  <ObjectList type="cluster">1 2 3</ObjectList>
                  http://archive.example.org/a.fits
                </ImageData>
                <ImageData type="FITS16"><ObjectList type="votable-url">   </ObjectList></ImageData>
            </Observation></RTML>"#,
        )
        .unwrap();
        let images = decoded.document.observations()[0].image_data();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].image_data_type, Some(ImageDataType::Fits16));
        assert_eq!(images[0].fits_header.as_deref(), Some("SIMPLE  =  T"));
        assert_eq!(images[0].object_list_cluster.as_deref(), Some("1 2 3"));
        assert_eq!(
            images[0].image_data_url.as_ref().map(|u| u.to_string()).as_deref(),
            Some("http://archive.example.org/a.fits")
        );
        assert_eq!(images[1].object_list_type, Some(ObjectListType::VotableUrl));
        assert_eq!(images[1].object_list_votable_url, None);
    }

    #[test]
    fn test_unknown_element_is_tolerated() {
        let decoded = decode(
            r#"<RTML version="2.2" type="request"><Observation>
                <Weather>cloudy</Weather>
                <Target><TargetName>M31</TargetName></Target>
            </Observation></RTML>"#,
        )
        .unwrap();
        let target = decoded.document.observations()[0].target.as_ref().unwrap();
        assert_eq!(target.name.as_deref(), Some("M31"));
        assert_eq!(decoded.diagnostics.len(), 1);
        assert_eq!(
            decoded.diagnostics[0].location.as_deref(),
            Some("RTML/Observation")
        );
    }

    #[test]
    fn test_completion_time_tri_state() {
        let never = decode(
            r#"<RTML version="2.2" type="score"><CompletionTime>never</CompletionTime></RTML>"#,
        )
        .unwrap();
        assert_eq!(never.document.completion_time, Some(TimeBound::Never));
        let absent = decode(r#"<RTML version="2.2" type="score"/>"#).unwrap();
        assert_eq!(absent.document.completion_time, None);
    }

    #[test]
    fn test_score_accepts_nan() {
        let decoded = decode(r#"<RTML version="2.2" type="score"><Score>NaN</Score></RTML>"#).unwrap();
        assert!(decoded.document.score.unwrap().is_nan());
        let err = decode(r#"<RTML version="2.2" type="score"><Score>high</Score></RTML>"#).unwrap_err();
        assert!(err.is_value());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_agent_port_validation() {
        let decoded = decode(
            r#"<RTML version="2.2" type="request"><IntelligentAgent host="localhost" port="8080">001147:UA:v1-24:run#6:user#aa</IntelligentAgent></RTML>"#,
        )
        .unwrap();
        let agent = decoded.document.intelligent_agent.unwrap();
        assert_eq!(agent.port(), Some(8080));
        assert_eq!(agent.id.as_deref(), Some("001147:UA:v1-24:run#6:user#aa"));
        let err = decode(
            r#"<RTML version="2.2" type="request"><IntelligentAgent port="http"/></RTML>"#,
        )
        .unwrap_err();
        assert!(err.is_value());
    }
}
