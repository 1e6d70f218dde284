// ── Declarative filter trees ──
//
// Serde form of the filter algebra, e.g.
//
//   {"all": [{"room": {"name": "Kitchen"}}, {"online": true}]}
//
// `build()` turns a spec into a live filter and is the only place where
// construction errors (NOT arity, bad regex) surface.

use serde::{Deserialize, Serialize};

use super::{
    CapabilityFilter, Comparison, Filter, FilterGroup, Mode, NameFilter, NameMode, NotFilter,
    RoomFilter, StatusFilter, ThresholdFilter, TypeFilter,
};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSpec {
    #[serde(alias = "and")]
    All(Vec<FilterSpec>),
    #[serde(alias = "or")]
    Any(Vec<FilterSpec>),
    Not(Vec<FilterSpec>),
    Room {
        name: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    Online(bool),
    Threshold {
        capability: String,
        attribute: String,
        op: Comparison,
        value: f64,
    },
    Battery {
        op: Comparison,
        value: f64,
    },
    Name {
        pattern: String,
        #[serde(default)]
        mode: NameMode,
        #[serde(default)]
        case_sensitive: bool,
    },
    Capability(String),
    Type {
        name: String,
        #[serde(default)]
        case_sensitive: bool,
    },
}

impl FilterSpec {
    /// Parse a JSON filter expression.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::config(format!("invalid filter expression: {e}")))
    }

    /// Build the live filter tree, validating construction.
    pub fn build(&self) -> Result<Box<dyn Filter>, CoreError> {
        let filter: Box<dyn Filter> = match self {
            Self::All(children) => Box::new(FilterGroup::new(Mode::All, build_all(children)?)),
            Self::Any(children) => Box::new(FilterGroup::new(Mode::Any, build_all(children)?)),
            Self::Not(children) => Box::new(NotFilter::from_children(build_all(children)?)?),
            Self::Room {
                name,
                case_sensitive,
            } => {
                if *case_sensitive {
                    Box::new(RoomFilter::case_sensitive(name.as_str()))
                } else {
                    Box::new(RoomFilter::new(name.as_str()))
                }
            }
            Self::Online(online) => Box::new(StatusFilter::new(*online)),
            Self::Threshold {
                capability,
                attribute,
                op,
                value,
            } => Box::new(ThresholdFilter::new(
                capability.as_str(),
                attribute.as_str(),
                *op,
                *value,
            )),
            Self::Battery { op, value } => Box::new(ThresholdFilter::battery(*op, *value)),
            Self::Name {
                pattern,
                mode,
                case_sensitive,
            } => Box::new(NameFilter::new(pattern.as_str(), *mode, *case_sensitive)?),
            Self::Capability(cap) => Box::new(CapabilityFilter::new(cap.as_str())),
            Self::Type {
                name,
                case_sensitive,
            } => {
                if *case_sensitive {
                    Box::new(TypeFilter::case_sensitive(name.as_str()))
                } else {
                    Box::new(TypeFilter::new(name.as_str()))
                }
            }
        };
        Ok(filter)
    }
}

fn build_all(children: &[FilterSpec]) -> Result<Vec<Box<dyn Filter>>, CoreError> {
    children.iter().map(FilterSpec::build).collect()
}
