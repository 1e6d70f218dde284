// ── Built-in leaf predicates ──
//
// Each predicate owns only its comparison parameters. A missing room,
// type, or attribute is a non-match, never an error.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::Filter;
use crate::error::CoreError;
use crate::model::{AttributeValue, DeviceSnapshot, capability};

fn fold(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_owned()
    } else {
        s.to_lowercase()
    }
}

// ── Room ────────────────────────────────────────────────────────────

/// Exact room-name match, case-insensitive unless requested otherwise.
#[derive(Debug, Clone)]
pub struct RoomFilter {
    room: String,
    case_sensitive: bool,
}

impl RoomFilter {
    pub fn new(room: impl Into<String>) -> Self {
        let room: String = room.into();
        Self {
            room: room.to_lowercase(),
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            case_sensitive: true,
        }
    }
}

impl Filter for RoomFilter {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        device
            .room
            .as_deref()
            .is_some_and(|room| fold(room, self.case_sensitive) == self.room)
    }

    fn describe(&self) -> String {
        format!("room == {:?}", self.room)
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        match device.room.as_deref() {
            None => Some("device has no room".into()),
            Some(_) if self.matches(device) => None,
            Some(room) => Some(format!("room is {room:?}, expected {:?}", self.room)),
        }
    }
}

// ── Online status ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct StatusFilter {
    online: bool,
}

impl StatusFilter {
    pub fn new(online: bool) -> Self {
        Self { online }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }
}

fn status_word(online: bool) -> &'static str {
    if online { "online" } else { "offline" }
}

impl Filter for StatusFilter {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        device.online == self.online
    }

    fn describe(&self) -> String {
        status_word(self.online).into()
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        (!self.matches(device)).then(|| format!("device is {}", status_word(device.online)))
    }
}

// ── Numeric threshold ───────────────────────────────────────────────

/// Comparison operator for [`ThresholdFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum Comparison {
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    Lt,
    #[strum(serialize = "<=")]
    #[serde(rename = "<=")]
    Le,
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    Gt,
    #[strum(serialize = ">=")]
    #[serde(rename = ">=")]
    Ge,
    #[strum(serialize = "==")]
    #[serde(rename = "==")]
    Eq,
}

impl Comparison {
    pub fn apply(self, value: f64, bound: f64) -> bool {
        match self {
            Self::Lt => value < bound,
            Self::Le => value <= bound,
            Self::Gt => value > bound,
            Self::Ge => value >= bound,
            Self::Eq => (value - bound).abs() < f64::EPSILON,
        }
    }
}

/// Compare a numeric `(capability, attribute)` value against a bound.
#[derive(Debug, Clone)]
pub struct ThresholdFilter {
    capability: String,
    attribute: String,
    op: Comparison,
    bound: f64,
}

impl ThresholdFilter {
    pub fn new(
        capability: impl Into<String>,
        attribute: impl Into<String>,
        op: Comparison,
        bound: f64,
    ) -> Self {
        Self {
            capability: capability.into(),
            attribute: attribute.into(),
            op,
            bound,
        }
    }

    /// Threshold on the battery percentage.
    pub fn battery(op: Comparison, level: f64) -> Self {
        Self::new(capability::BATTERY, capability::BATTERY_ATTR, op, level)
    }

    fn value(&self, device: &DeviceSnapshot) -> Option<f64> {
        device
            .attribute(&self.capability, &self.attribute)
            .and_then(AttributeValue::as_number)
    }
}

impl Filter for ThresholdFilter {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        self.value(device)
            .is_some_and(|value| self.op.apply(value, self.bound))
    }

    fn describe(&self) -> String {
        format!(
            "{}.{} {} {}",
            self.capability, self.attribute, self.op, self.bound
        )
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        let Some(raw) = device.attribute(&self.capability, &self.attribute) else {
            return Some(format!(
                "attribute {}.{} is not reported",
                self.capability, self.attribute
            ));
        };
        match raw.as_number() {
            None => Some(format!(
                "attribute {}.{} is not numeric ({raw})",
                self.capability, self.attribute
            )),
            Some(value) if self.op.apply(value, self.bound) => None,
            Some(value) => Some(format!(
                "{}.{} is {value}, wanted {} {}",
                self.capability, self.attribute, self.op, self.bound
            )),
        }
    }
}

// ── Name / label ────────────────────────────────────────────────────

/// How [`NameFilter`] compares the label against its pattern.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum NameMode {
    Exact,
    #[default]
    Contains,
    StartsWith,
    Regex,
}

#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: String,
    mode: NameMode,
    case_sensitive: bool,
    regex: Option<Regex>,
}

impl NameFilter {
    /// Build a label filter. Fails only when `mode` is `Regex` and the
    /// pattern does not compile.
    pub fn new(
        pattern: impl Into<String>,
        mode: NameMode,
        case_sensitive: bool,
    ) -> Result<Self, CoreError> {
        let pattern: String = pattern.into();
        let regex = match mode {
            NameMode::Regex => Some(
                RegexBuilder::new(&pattern)
                    .case_insensitive(!case_sensitive)
                    .build()
                    .map_err(|e| CoreError::config(format!("invalid name regex: {e}")))?,
            ),
            _ => None,
        };
        let pattern = if regex.is_some() {
            pattern
        } else {
            fold(&pattern, case_sensitive)
        };
        Ok(Self {
            pattern,
            mode,
            case_sensitive,
            regex,
        })
    }

    /// Case-insensitive substring match.
    pub fn contains(pattern: impl Into<String>) -> Self {
        let pattern: String = pattern.into();
        Self {
            pattern: pattern.to_lowercase(),
            mode: NameMode::Contains,
            case_sensitive: false,
            regex: None,
        }
    }
}

impl Filter for NameFilter {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        if let Some(re) = &self.regex {
            return re.is_match(&device.label);
        }
        let label = fold(&device.label, self.case_sensitive);
        match self.mode {
            NameMode::Exact => label == self.pattern,
            NameMode::Contains => label.contains(&self.pattern),
            NameMode::StartsWith => label.starts_with(&self.pattern),
            // Regex mode always carries a compiled pattern.
            NameMode::Regex => false,
        }
    }

    fn describe(&self) -> String {
        format!("name {} {:?}", self.mode, self.pattern)
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        (!self.matches(device)).then(|| {
            format!(
                "label {:?} does not satisfy {} {:?}",
                device.label, self.mode, self.pattern
            )
        })
    }
}

// ── Capability presence ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CapabilityFilter {
    capability: String,
}

impl CapabilityFilter {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
        }
    }
}

impl Filter for CapabilityFilter {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        device.has_capability(&self.capability)
    }

    fn describe(&self) -> String {
        format!("has capability {:?}", self.capability)
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        (!self.matches(device)).then(|| format!("capability {:?} not reported", self.capability))
    }
}

// ── Declared device type ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TypeFilter {
    device_type: String,
    case_sensitive: bool,
}

impl TypeFilter {
    pub fn new(device_type: impl Into<String>) -> Self {
        let device_type: String = device_type.into();
        Self {
            device_type: device_type.to_lowercase(),
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(device_type: impl Into<String>) -> Self {
        Self {
            device_type: device_type.into(),
            case_sensitive: true,
        }
    }
}

impl Filter for TypeFilter {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        device
            .device_type
            .as_deref()
            .is_some_and(|t| fold(t, self.case_sensitive) == self.device_type)
    }

    fn describe(&self) -> String {
        format!("type == {:?}", self.device_type)
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        match device.device_type.as_deref() {
            None => Some("device declares no type".into()),
            Some(_) if self.matches(device) => None,
            Some(t) => Some(format!("type is {t:?}, expected {:?}", self.device_type)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::DeviceId;

    fn device(id: &str, label: &str) -> DeviceSnapshot {
        DeviceSnapshot::new(DeviceId::new(id).unwrap(), label)
    }

    #[test]
    fn room_match_is_exact_and_case_insensitive() {
        let d = device("d1", "Lamp").with_room("Kitchen");
        assert!(RoomFilter::new("kitchen").matches(&d));
        assert!(RoomFilter::new("KITCHEN").matches(&d));
        assert!(!RoomFilter::new("Kitch").matches(&d));
        assert!(!RoomFilter::case_sensitive("kitchen").matches(&d));
        assert!(RoomFilter::case_sensitive("Kitchen").matches(&d));
    }

    #[test]
    fn room_filter_without_room_never_matches() {
        let d = device("d1", "Lamp");
        let f = RoomFilter::new("Kitchen");
        assert!(!f.matches(&d));
        assert_eq!(f.reason(&d).unwrap(), "device has no room");
    }

    #[test]
    fn status_filter() {
        let on = device("d1", "A").with_online(true);
        let off = device("d2", "B");
        assert!(StatusFilter::online().matches(&on));
        assert!(!StatusFilter::online().matches(&off));
        assert!(StatusFilter::offline().matches(&off));
        assert_eq!(
            StatusFilter::online().reason(&off).unwrap(),
            "device is offline"
        );
    }

    #[test]
    fn comparison_parses_symbols() {
        assert_eq!("<".parse::<Comparison>().unwrap(), Comparison::Lt);
        assert_eq!(">=".parse::<Comparison>().unwrap(), Comparison::Ge);
        assert!("=>".parse::<Comparison>().is_err());
        assert_eq!(Comparison::Le.to_string(), "<=");
    }

    #[test]
    fn threshold_operators() {
        let d = device("d1", "Sensor").with_attribute("battery", "battery", 30);
        let cases = [
            (Comparison::Lt, false),
            (Comparison::Le, true),
            (Comparison::Gt, false),
            (Comparison::Ge, true),
            (Comparison::Eq, true),
        ];
        for (op, expected) in cases {
            assert_eq!(
                ThresholdFilter::battery(op, 30.0).matches(&d),
                expected,
                "{op}"
            );
        }
    }

    #[test]
    fn threshold_on_missing_or_textual_attribute_never_matches() {
        let missing = device("d1", "Lamp");
        let textual = device("d2", "Lamp").with_attribute("battery", "battery", "low");
        let f = ThresholdFilter::battery(Comparison::Lt, 30.0);
        assert!(!f.matches(&missing));
        assert!(!f.matches(&textual));
        assert!(f.reason(&missing).unwrap().contains("not reported"));
        assert!(f.reason(&textual).unwrap().contains("not numeric"));
    }

    #[test]
    fn threshold_reads_float_attributes() {
        let d = device("d1", "Thermo").with_attribute("temperatureMeasurement", "temperature", 21.5);
        let f = ThresholdFilter::new(
            "temperatureMeasurement",
            "temperature",
            Comparison::Gt,
            20.0,
        );
        assert!(f.matches(&d));
    }

    #[test]
    fn name_modes() {
        let d = device("d1", "Porch Light");
        let m = |p: &str, mode| NameFilter::new(p, mode, false).unwrap().matches(&d);
        assert!(m("porch light", NameMode::Exact));
        assert!(!m("porch", NameMode::Exact));
        assert!(m("LIGHT", NameMode::Contains));
        assert!(m("porch", NameMode::StartsWith));
        assert!(!m("light", NameMode::StartsWith));
        assert!(m("^porch\\s+l", NameMode::Regex));
    }

    #[test]
    fn name_case_sensitive() {
        let d = device("d1", "Porch Light");
        let f = NameFilter::new("porch", NameMode::Contains, true).unwrap();
        assert!(!f.matches(&d));
        let f = NameFilter::new("^porch", NameMode::Regex, true).unwrap();
        assert!(!f.matches(&d));
    }

    #[test]
    fn invalid_regex_is_configuration_error() {
        let err = NameFilter::new("(", NameMode::Regex, false).unwrap_err();
        assert!(matches!(err, CoreError::Configuration { .. }));
    }

    #[test]
    fn name_mode_parses_case_insensitively() {
        assert_eq!(
            "starts_with".parse::<NameMode>().unwrap(),
            NameMode::StartsWith
        );
        assert_eq!("REGEX".parse::<NameMode>().unwrap(), NameMode::Regex);
    }

    #[test]
    fn capability_presence() {
        let d = device("d1", "Plug").with_capability("switch");
        assert!(CapabilityFilter::new("switch").matches(&d));
        assert!(!CapabilityFilter::new("battery").matches(&d));
    }

    #[test]
    fn type_match() {
        let d = device("d1", "Plug").with_type("Smart Plug");
        assert!(TypeFilter::new("smart plug").matches(&d));
        assert!(!TypeFilter::case_sensitive("smart plug").matches(&d));
        assert!(!TypeFilter::new("smart plug").matches(&device("d2", "Smart Plug")));
    }
}
