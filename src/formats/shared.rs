//! Schedule constraint codecs common to both dialects.
//!
//! Series, seeing, moon, sky and extinction constraints are laid out the same
//! way in 2.2 and 3.1a. Decoders reach the tables through
//! `AsRef<SharedTables>` and the schedule through `AsMut<Schedule>`, so the
//! handlers below can be registered directly in either dialect's `Schedule`
//! table.

use super::numeric::{CONSTRAINT, format_shortest};
use super::walk::{
    Dispatch, Session, leaf_text, parse_attribute, parse_count, parse_f64, parse_period,
    parse_value, required_leaf_text, string_attribute,
};
use crate::errors::RtmlError;
use crate::model::{
    CloudCover, ExtinctionConstraint, MoonConstraint, Schedule, SeeingConstraint,
    SeriesConstraint, SkyBrightness, SkyConstraint,
};
use crate::xml::XmlElement;
use std::str::FromStr;

const CONTEXT: &str = "shared::constraints";

/// Descriptor plus optional `<Value units>` while a sky or extinction
/// constraint is being decoded.
struct DescriptorDraft<T> {
    descriptor: Option<T>,
    value: Option<f64>,
    units: Option<String>,
}

impl<T> Default for DescriptorDraft<T> {
    fn default() -> Self {
        Self {
            descriptor: None,
            value: None,
            units: None,
        }
    }
}

pub struct SharedTables {
    series: Dispatch<SharedTables, SeriesConstraint>,
    seeing: Dispatch<SharedTables, SeeingConstraint>,
    moon: Dispatch<SharedTables, MoonConstraint>,
    sky: Dispatch<SharedTables, DescriptorDraft<SkyBrightness>>,
    extinction: Dispatch<SharedTables, DescriptorDraft<CloudCover>>,
}

impl SharedTables {
    pub fn new() -> Result<Self, RtmlError> {
        Ok(Self {
            series: Dispatch::new(CONTEXT, "SeriesConstraint")
                .element("Count", series_count)?
                .element("Interval", series_interval)?
                .element("Tolerance", series_tolerance)?,
            seeing: Dispatch::new(CONTEXT, "SeeingConstraint"),
            moon: Dispatch::new(CONTEXT, "MoonConstraint")
                .element("MaxPhase", moon_max_phase)?
                .element("Distance", moon_distance)?
                .element("Width", moon_width)?,
            sky: Dispatch::new(CONTEXT, "SkyConstraint")
                .element("Sky", descriptor::<SkyBrightness>)?
                .element("Value", descriptor_value::<SkyBrightness>)?,
            extinction: Dispatch::new(CONTEXT, "ExtinctionConstraint")
                .element("Clouds", descriptor::<CloudCover>)?
                .element("Value", descriptor_value::<CloudCover>)?,
        })
    }

    /// Registers the five constraint handlers on a dialect's Schedule table.
    pub fn register<D, T>(table: Dispatch<D, T>) -> Result<Dispatch<D, T>, RtmlError>
    where
        D: AsRef<SharedTables>,
        T: AsMut<Schedule>,
    {
        table
            .element("SeriesConstraint", series_constraint::<D, T>)?
            .element("SeeingConstraint", seeing_constraint::<D, T>)?
            .element("MoonConstraint", moon_constraint::<D, T>)?
            .element("SkyConstraint", sky_constraint::<D, T>)?
            .element("ExtinctionConstraint", extinction_constraint::<D, T>)
    }
}

impl AsRef<SharedTables> for SharedTables {
    fn as_ref(&self) -> &SharedTables {
        self
    }
}

// Schedule level handlers

pub fn series_constraint<D: AsRef<SharedTables>, T: AsMut<Schedule>>(
    d: &D,
    e: &XmlElement,
    target: &mut T,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let tables = d.as_ref();
    let schedule = target.as_mut();
    let mut series = SeriesConstraint::default();
    tables.series.walk(tables, e, &mut series, s)?;
    schedule.series_constraint = Some(series);
    Ok(())
}

pub fn seeing_constraint<D: AsRef<SharedTables>, T: AsMut<Schedule>>(
    d: &D,
    e: &XmlElement,
    target: &mut T,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let tables = d.as_ref();
    let schedule = target.as_mut();
    let mut seeing = SeeingConstraint::default();
    if let Some(minimum) = parse_attribute(CONTEXT, e, "minimum")? {
        seeing.minimum = minimum;
    }
    if let Some(maximum) = parse_attribute(CONTEXT, e, "maximum")? {
        seeing.maximum = maximum;
    }
    tables.seeing.walk(tables, e, &mut seeing, s)?;
    schedule.seeing_constraint = Some(seeing);
    Ok(())
}

pub fn moon_constraint<D: AsRef<SharedTables>, T: AsMut<Schedule>>(
    d: &D,
    e: &XmlElement,
    target: &mut T,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let tables = d.as_ref();
    let schedule = target.as_mut();
    let mut moon = MoonConstraint::new();
    tables.moon.walk(tables, e, &mut moon, s)?;
    schedule.moon_constraint = Some(moon);
    Ok(())
}

pub fn sky_constraint<D: AsRef<SharedTables>, T: AsMut<Schedule>>(
    d: &D,
    e: &XmlElement,
    target: &mut T,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let tables = d.as_ref();
    let schedule = target.as_mut();
    let mut draft = DescriptorDraft::default();
    tables.sky.walk(tables, e, &mut draft, s)?;
    let sky = draft
        .descriptor
        .ok_or_else(|| RtmlError::structure(CONTEXT, e.describe(), "missing <Sky>"))?;
    schedule.sky_constraint = Some(SkyConstraint {
        sky,
        value: draft.value,
        units: draft.units,
    });
    Ok(())
}

pub fn extinction_constraint<D: AsRef<SharedTables>, T: AsMut<Schedule>>(
    d: &D,
    e: &XmlElement,
    target: &mut T,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let tables = d.as_ref();
    let schedule = target.as_mut();
    let mut draft = DescriptorDraft::default();
    tables.extinction.walk(tables, e, &mut draft, s)?;
    let clouds = draft
        .descriptor
        .ok_or_else(|| RtmlError::structure(CONTEXT, e.describe(), "missing <Clouds>"))?;
    schedule.extinction_constraint = Some(ExtinctionConstraint {
        clouds,
        value: draft.value,
        units: draft.units,
    });
    Ok(())
}

// Leaf handlers

fn series_count(
    _d: &SharedTables,
    e: &XmlElement,
    series: &mut SeriesConstraint,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    series.count = Some(parse_count(CONTEXT, "series count", text)?);
    Ok(())
}

fn series_interval(
    _d: &SharedTables,
    e: &XmlElement,
    series: &mut SeriesConstraint,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    series.interval = Some(parse_period(CONTEXT, "interval", text)?);
    Ok(())
}

fn series_tolerance(
    _d: &SharedTables,
    e: &XmlElement,
    series: &mut SeriesConstraint,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    series.tolerance = Some(parse_period(CONTEXT, "tolerance", text)?);
    Ok(())
}

fn moon_max_phase(
    _d: &SharedTables,
    e: &XmlElement,
    moon: &mut MoonConstraint,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    moon.max_phase = Some(parse_f64(CONTEXT, "moon max phase", text)?);
    Ok(())
}

fn moon_distance(
    _d: &SharedTables,
    e: &XmlElement,
    moon: &mut MoonConstraint,
    s: &mut Session,
) -> Result<(), RtmlError> {
    if let Some(units) = e.attribute("units") {
        moon.set_distance_units(units)
            .map_err(|err| RtmlError::value_caused_by(CONTEXT, "units", units, err))?;
    }
    let text = required_leaf_text(CONTEXT, e, s)?;
    moon.distance = Some(parse_f64(CONTEXT, "moon distance", text)?);
    Ok(())
}

fn moon_width(
    _d: &SharedTables,
    e: &XmlElement,
    moon: &mut MoonConstraint,
    s: &mut Session,
) -> Result<(), RtmlError> {
    let text = required_leaf_text(CONTEXT, e, s)?;
    moon.width = Some(parse_f64(CONTEXT, "moon width", text)?);
    Ok(())
}

fn descriptor<T>(
    _d: &SharedTables,
    e: &XmlElement,
    draft: &mut DescriptorDraft<T>,
    s: &mut Session,
) -> Result<(), RtmlError>
where
    T: FromStr<Err = RtmlError>,
{
    let text = required_leaf_text(CONTEXT, e, s)?;
    draft.descriptor = Some(parse_value(CONTEXT, e.name(), text)?);
    Ok(())
}

fn descriptor_value<T>(
    _d: &SharedTables,
    e: &XmlElement,
    draft: &mut DescriptorDraft<T>,
    s: &mut Session,
) -> Result<(), RtmlError> {
    draft.units = string_attribute(e, "units");
    if let Some(text) = leaf_text(CONTEXT, e, s) {
        draft.value = Some(parse_f64(CONTEXT, "value", text)?);
    }
    Ok(())
}

// Encoding

/// Appends every constraint the schedule has, in schema order.
/// `seeing_units` is written on `SeeingConstraint` when given (3.1a).
pub fn create_constraints(parent: &mut XmlElement, schedule: &Schedule, seeing_units: Option<&str>) {
    if let Some(series) = &schedule.series_constraint {
        create_series_constraint(parent, series);
    }
    if let Some(seeing) = &schedule.seeing_constraint {
        create_seeing_constraint(parent, seeing, seeing_units);
    }
    if let Some(moon) = &schedule.moon_constraint {
        create_moon_constraint(parent, moon);
    }
    if let Some(sky) = &schedule.sky_constraint {
        let mut element = XmlElement::new("SkyConstraint");
        element.append_element(XmlElement::new("Sky").with_text(sky.sky.as_str()));
        append_descriptor_value(&mut element, sky.value, sky.units.as_deref());
        parent.append_element(element);
    }
    if let Some(extinction) = &schedule.extinction_constraint {
        let mut element = XmlElement::new("ExtinctionConstraint");
        element.append_element(XmlElement::new("Clouds").with_text(extinction.clouds.as_str()));
        append_descriptor_value(&mut element, extinction.value, extinction.units.as_deref());
        parent.append_element(element);
    }
}

pub fn create_series_constraint(parent: &mut XmlElement, series: &SeriesConstraint) {
    let mut element = XmlElement::new("SeriesConstraint");
    if let Some(count) = series.count {
        element.append_element(XmlElement::new("Count").with_text(count.to_string()));
    }
    if let Some(interval) = &series.interval {
        element.append_element(XmlElement::new("Interval").with_text(interval.to_string()));
    }
    if let Some(tolerance) = &series.tolerance {
        element.append_element(XmlElement::new("Tolerance").with_text(tolerance.to_string()));
    }
    parent.append_element(element);
}

pub fn create_seeing_constraint(
    parent: &mut XmlElement,
    seeing: &SeeingConstraint,
    units: Option<&str>,
) {
    let mut element = XmlElement::new("SeeingConstraint")
        .with_attribute("minimum", CONSTRAINT.format(seeing.minimum))
        .with_attribute("maximum", CONSTRAINT.format(seeing.maximum));
    if let Some(units) = units {
        element.set_attribute("units", units);
    }
    parent.append_element(element);
}

pub fn create_moon_constraint(parent: &mut XmlElement, moon: &MoonConstraint) {
    let mut element = XmlElement::new("MoonConstraint");
    if let Some(phase) = moon.max_phase {
        element.append_element(XmlElement::new("MaxPhase").with_text(CONSTRAINT.format(phase)));
    }
    if let Some(distance) = moon.distance {
        let mut child = XmlElement::new("Distance");
        if let Some(units) = moon.distance_units() {
            child.set_attribute("units", units);
        }
        element.append_element(child.with_text(CONSTRAINT.format(distance)));
    }
    if let Some(width) = moon.width {
        element.append_element(XmlElement::new("Width").with_text(CONSTRAINT.format(width)));
    }
    parent.append_element(element);
}

fn append_descriptor_value(parent: &mut XmlElement, value: Option<f64>, units: Option<&str>) {
    if value.is_none() && units.is_none() {
        return;
    }
    let mut element = XmlElement::new("Value");
    if let Some(units) = units {
        element.set_attribute("units", units);
    }
    if let Some(value) = value {
        element.append_text(format_shortest(value));
    }
    parent.append_element(element);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    struct Host {
        shared: SharedTables,
        schedule: Dispatch<Host, Schedule>,
    }

    impl AsRef<SharedTables> for Host {
        fn as_ref(&self) -> &SharedTables {
            &self.shared
        }
    }

    fn host() -> Host {
        Host {
            shared: SharedTables::new().unwrap(),
            schedule: SharedTables::register(Dispatch::new("test", "Schedule")).unwrap(),
        }
    }

    fn decode(xml: &str) -> Result<(Schedule, Session), RtmlError> {
        let doc = parse_str(xml).unwrap();
        let host = host();
        let mut schedule = Schedule::new();
        let mut session = Session::new();
        host.schedule.walk(&host, &doc.root, &mut schedule, &mut session)?;
        Ok((schedule, session))
    }

    #[test]
    fn test_decode_all_constraints() {
        let (schedule, session) = decode(
            r#"<Schedule>
                <SeriesConstraint><Count>3</Count><Interval>PT1H</Interval><Tolerance>PT30M</Tolerance></SeriesConstraint>
                <SeeingConstraint minimum="0.5" maximum="2.0"/>
                <MoonConstraint><MaxPhase>0.5</MaxPhase><Distance units="degrees">30.0</Distance><Width>5.0</Width></MoonConstraint>
                <SkyConstraint><Sky>dark</Sky><Value units="magnitudes">21.5</Value></SkyConstraint>
                <ExtinctionConstraint><Clouds>light</Clouds></ExtinctionConstraint>
            </Schedule>"#,
        )
        .unwrap();
        assert!(session.diagnostics().is_empty());
        let series = schedule.series_constraint.as_ref().unwrap();
        assert_eq!(series.count, Some(3));
        assert_eq!(series.interval.unwrap().hours(), 1);
        assert_eq!(series.tolerance.unwrap().minutes(), 30);
        assert!(schedule.is_monitor_group());
        assert_eq!(schedule.seeing_constraint, Some(SeeingConstraint::new(0.5, 2.0)));
        let moon = schedule.moon_constraint.as_ref().unwrap();
        assert_eq!(moon.distance_degrees(), Some(30.0));
        assert_eq!(moon.width, Some(5.0));
        let sky = schedule.sky_constraint.as_ref().unwrap();
        assert_eq!(sky.sky, SkyBrightness::Dark);
        assert_eq!(sky.value, Some(21.5));
        assert_eq!(sky.units.as_deref(), Some("magnitudes"));
        assert_eq!(
            schedule.extinction_constraint,
            Some(ExtinctionConstraint::new(CloudCover::Light))
        );
    }

    #[test]
    fn test_seeing_defaults_when_attributes_absent() {
        let (schedule, _) = decode("<Schedule><SeeingConstraint/></Schedule>").unwrap();
        assert_eq!(schedule.seeing_constraint, Some(SeeingConstraint::default()));
    }

    #[test]
    fn test_bad_values_fail() {
        let err = decode("<Schedule><SkyConstraint><Sky>murky</Sky></SkyConstraint></Schedule>")
            .unwrap_err();
        assert!(err.is_value());
        let err = decode("<Schedule><SkyConstraint><Value>1</Value></SkyConstraint></Schedule>")
            .unwrap_err();
        assert!(err.is_structure());
        let err = decode(
            "<Schedule><SeriesConstraint><Interval>P5M3Y</Interval></SeriesConstraint></Schedule>",
        )
        .unwrap_err();
        assert!(err.is_value());
        let err = decode(
            "<Schedule><MoonConstraint><Distance units=\"furlongs\">1</Distance></MoonConstraint></Schedule>",
        )
        .unwrap_err();
        assert!(err.is_value());
    }

    #[test]
    fn test_encode_constraints() {
        let mut schedule = Schedule::new();
        schedule.seeing_constraint = Some(SeeingConstraint::new(0.0, 1.5));
        let mut moon = MoonConstraint::new();
        moon.distance = Some(30.0);
        moon.set_distance_units("degrees").unwrap();
        schedule.moon_constraint = Some(moon);
        schedule.sky_constraint = Some(SkyConstraint::new(SkyBrightness::Grey));
        schedule.extinction_constraint = Some(ExtinctionConstraint {
            value: Some(0.3),
            units: Some("mag".to_string()),
            ..ExtinctionConstraint::new(CloudCover::Light)
        });

        let mut parent = XmlElement::new("Schedule");
        create_constraints(&mut parent, &schedule, Some("arcseconds"));

        let seeing = parent.first_element("SeeingConstraint").unwrap();
        assert_eq!(seeing.attribute("minimum"), Some("0.0"));
        assert_eq!(seeing.attribute("maximum"), Some("1.5"));
        assert_eq!(seeing.attribute("units"), Some("arcseconds"));
        let distance = parent
            .first_element("MoonConstraint")
            .and_then(|m| m.first_element("Distance"))
            .unwrap();
        assert_eq!(distance.attribute("units"), Some("degrees"));
        assert_eq!(distance.last_text(), Some("30.0"));
        let sky = parent.first_element("SkyConstraint").unwrap();
        assert_eq!(sky.first_element("Sky").and_then(|s| s.last_text()), Some("grey"));
        assert!(sky.first_element("Value").is_none());
        let value = parent
            .first_element("ExtinctionConstraint")
            .and_then(|x| x.first_element("Value"))
            .unwrap();
        assert_eq!(value.attribute("units"), Some("mag"));
        assert_eq!(value.last_text(), Some("0.3"));
        assert!(parent.first_element("SeriesConstraint").is_none());
    }
}
