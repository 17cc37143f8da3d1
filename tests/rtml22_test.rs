use pretty_assertions::assert_eq;
use rtml_converter::date::TimeBound;
use rtml_converter::errors::RtmlError;
use rtml_converter::formats::{self, Decoded, EncoderOptions};
use rtml_converter::model::{
    CloudCover, Document, DocumentType, ExposureType, ExtinctionConstraint, Observation,
    PeriodFormat, Schedule, SkyBrightness, SkyConstraint, TargetType,
};
use rtml_converter::rtml_version::RtmlVersion;
use rtml_converter::xml;

const REQUEST: &str = include_str!("fixtures/request-2.2.xml");

fn decode(text: &str) -> Result<Decoded, RtmlError> {
    formats::decode(RtmlVersion::V2_2, &xml::parse_str(text)?)
}

fn minimal(body: &str) -> String {
    format!(r#"<RTML version="2.2" type="request">{}</RTML>"#, body)
}

#[test]
fn test_decode_request_fixture() {
    let Decoded {
        document,
        diagnostics,
    } = decode(REQUEST).unwrap();
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);

    assert_eq!(document.document_type(), Some(DocumentType::Request));
    assert_eq!(document.version.as_deref(), Some("2.2"));

    let contact = document.contact.as_ref().unwrap();
    assert_eq!(contact.pi, Some(true));
    assert_eq!(contact.user.as_deref(), Some("PATT/keith.horne"));
    assert_eq!(
        document.project.as_ref().and_then(|p| p.project.as_deref()),
        Some("PL04B17")
    );

    let telescope = document.telescope.as_ref().unwrap();
    assert_eq!(telescope.aperture, Some(2.0));
    assert_eq!(telescope.aperture_type.as_deref(), Some("primary"));
    let location = telescope.location.as_ref().unwrap();
    assert_eq!(location.longitude, Some(-17.879));
    assert_eq!(location.altitude, Some(2363.0));

    let agent = document.intelligent_agent.as_ref().unwrap();
    assert_eq!(agent.hostname.as_deref(), Some("estar.astro.ex.ac.uk"));
    assert_eq!(agent.port(), Some(8000));
    assert_eq!(agent.id.as_deref(), Some("001147:UA:v1-24:run#6:user#aa"));

    assert_eq!(document.observations().len(), 1);
    let observation = &document.observations()[0];
    let target = observation.target.as_ref().unwrap();
    assert_eq!(target.target_type, TargetType::Normal);
    assert_eq!(target.ident.as_deref(), Some("ExoPlanetMonitor"));
    assert_eq!(target.name.as_deref(), Some("OB06251"));
    assert_eq!(target.equinox.as_deref(), Some("J2000"));
    let ra = target.ra.unwrap();
    assert!((ra.hours() - (17.0 + 52.0 / 60.0 + 5.0 / 3600.0)).abs() < 1e-9);
    let dec = target.dec.unwrap();
    assert!((dec.degrees() + (29.0 + 59.0 / 60.0 + 59.0 / 3600.0)).abs() < 1e-9);

    let device = observation.device.as_ref().unwrap();
    assert_eq!(device.name.as_deref(), Some("RATCam"));
    assert_eq!(device.filter_type.as_deref(), Some("R"));
    let detector = device.detector.as_ref().unwrap();
    assert_eq!((detector.row_binning(), detector.column_binning()), (2, 2));

    let schedule = observation.schedule.as_ref().unwrap();
    assert_eq!(schedule.priority, 2);
    assert_eq!(schedule.exposure_type, ExposureType::Time);
    assert_eq!(schedule.exposure_length, Some(120.0));
    assert_eq!(schedule.exposure_count(), 3);
    assert_eq!(schedule.exposure_length_milliseconds(), Some(120_000.0));
    assert!(matches!(schedule.start_date, Some(TimeBound::At(_))));
    assert!(schedule.is_monitor_group());
    assert_eq!(
        schedule.moon_constraint.as_ref().and_then(|m| m.distance_degrees()),
        Some(30.0)
    );
    assert_eq!(
        schedule.sky_constraint.as_ref().map(|s| s.sky),
        Some(SkyBrightness::Dark)
    );

    assert_eq!(document.score, Some(0.5));
    assert_eq!(document.completion_time, Some(TimeBound::Never));
}

#[test]
fn test_round_trip_preserves_document() {
    let original = decode(REQUEST).unwrap().document;
    let text =
        formats::encode_to_string(RtmlVersion::V2_2, &original, &EncoderOptions::default())
            .unwrap();
    assert!(text.contains("<!DOCTYPE RTML SYSTEM \"http://www.estar.org.uk/documents/rtml2.2.dtd\">"));
    let decoded = decode(&text).unwrap();
    assert!(decoded.diagnostics.is_empty());
    assert_eq!(decoded.document, original);
}

#[test]
fn test_completion_time_states() {
    let absent = decode(&minimal("")).unwrap().document;
    assert_eq!(absent.completion_time, None);

    let never = decode(&minimal("<CompletionTime>never</CompletionTime>"))
        .unwrap()
        .document;
    assert_eq!(never.completion_time, Some(TimeBound::Never));

    let at = decode(&minimal(
        "<CompletionTime>2006-07-01T12:00:00Z</CompletionTime>",
    ))
    .unwrap()
    .document;
    match at.completion_time {
        Some(TimeBound::At(instant)) => {
            assert_eq!(instant.to_rfc3339(), "2006-07-01T12:00:00+00:00")
        }
        other => panic!("expected an instant, got {:?}", other),
    }

    let err = decode(&minimal("<CompletionTime>tomorrow</CompletionTime>")).unwrap_err();
    assert!(err.is_value());
}

#[test]
fn test_vocabulary_values_are_enforced() {
    let err = decode(r#"<RTML version="2.2" type="enquiry"/>"#).unwrap_err();
    assert!(err.is_value());
    assert!(err.to_string().contains("enquiry"));

    let err = decode(&minimal(
        r#"<Observation><Device type="telepathy"/></Observation>"#,
    ))
    .unwrap_err();
    assert!(err.is_value());

    let err = decode(&minimal(
        r#"<Observation><Schedule><Exposure type="luck" units="seconds">1.0</Exposure></Schedule></Observation>"#,
    ))
    .unwrap_err();
    assert!(err.is_value());
}

#[test]
fn test_radian_coordinates() {
    let decoded = decode(&minimal(
        r#"<Observation><Target><Coordinates>
            <RightAscension units="radians">3.141592653589793</RightAscension>
            <Declination units="radians">-0.5</Declination>
        </Coordinates></Target></Observation>"#,
    ))
    .unwrap();
    let target = decoded.document.observations()[0].target.clone().unwrap();
    assert!((target.ra.unwrap().hours() - 12.0).abs() < 1e-9);
    assert!((target.dec.unwrap().radians() + 0.5).abs() < 1e-12);
}

#[test]
fn test_series_periods() {
    let series = |interval: &str| {
        decode(&minimal(&format!(
            "<Observation><Schedule><SeriesConstraint><Interval>{}</Interval></SeriesConstraint></Schedule></Observation>",
            interval
        )))
    };

    let decoded = series("P1Y2M3DT4H5M6.5S").unwrap().document;
    let interval = decoded.observations()[0]
        .schedule
        .as_ref()
        .and_then(|s| s.series_constraint.as_ref())
        .and_then(|c| c.interval)
        .unwrap();
    assert_eq!(
        (
            interval.years(),
            interval.months(),
            interval.days(),
            interval.hours(),
            interval.minutes()
        ),
        (1, 2, 3, 4, 5)
    );
    assert_eq!(interval.seconds(), 6.5);

    assert_eq!("P1Y2M3D".parse::<PeriodFormat>().unwrap().days(), 3);
    assert!(series("PT5H").is_ok());
    assert!(series("P5M3Y").unwrap_err().is_value());
}

#[test]
fn test_unknown_elements_are_tolerated() {
    let decoded = decode(&minimal(
        "<Observation><Wibble>1</Wibble><Target><TargetName>M31</TargetName></Target></Observation><Extra/>",
    ))
    .unwrap();
    assert_eq!(decoded.diagnostics.len(), 2);
    assert_eq!(
        decoded.document.observations()[0]
            .target
            .as_ref()
            .and_then(|t| t.name.as_deref()),
        Some("M31")
    );
}

#[test]
fn test_error_document() {
    let decoded = decode(
        r#"<RTML version="2.2" type="reject">  Target is below the horizon.  <Score>0.0</Score></RTML>"#,
    )
    .unwrap();
    assert_eq!(
        decoded.document.error_string(),
        Some("Target is below the horizon.")
    );

    let mut request = Document::with_type(DocumentType::Request);
    assert!(request.set_error_string("nope").unwrap_err().is_value());
}

#[test]
fn test_sky_and_extinction_values_survive() {
    let mut schedule = Schedule::new();
    schedule.sky_constraint = Some(SkyConstraint {
        value: Some(21.5),
        units: Some("magnitudes".to_string()),
        ..SkyConstraint::new(SkyBrightness::Dark)
    });
    schedule.extinction_constraint = Some(ExtinctionConstraint {
        value: Some(0.3),
        units: Some("mag".to_string()),
        ..ExtinctionConstraint::new(CloudCover::Light)
    });
    let mut observation = Observation::new();
    observation.schedule = Some(schedule);
    let mut document = Document::with_type(DocumentType::Request);
    document.uid = Some("constraints-1".to_string());
    document.add_observation(observation);

    let text = formats::encode_to_string(RtmlVersion::V2_2, &document, &EncoderOptions::default()).unwrap();
    let decoded = decode(&text).unwrap().document;
    let schedule = decoded.observations()[0].schedule.as_ref().unwrap();

    // Equality on the constraints only compares the descriptor.
    let sky = schedule.sky_constraint.as_ref().unwrap();
    assert_eq!(sky.sky, SkyBrightness::Dark);
    assert_eq!(sky.value, Some(21.5));
    assert_eq!(sky.units.as_deref(), Some("magnitudes"));
    let extinction = schedule.extinction_constraint.as_ref().unwrap();
    assert_eq!(extinction.clouds, CloudCover::Light);
    assert_eq!(extinction.value, Some(0.3));
    assert_eq!(extinction.units.as_deref(), Some("mag"));
}
