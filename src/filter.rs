use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PatchError;
use crate::record::{Pclass, Port, Sex};

pub const DEFAULT_MIN_AGE: f64 = 0.0;
pub const DEFAULT_MAX_AGE: f64 = 100.0;

lazy_static! {
    static ref ASSIGNMENT_REGEX: Regex =
        Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*)\s*=\s*(\S+)\s*$").unwrap();
}

/// Filter configuration written by the UI layer.
///
/// Field names in JSON follow the dashboard keys (`male`, `class1`, `pC`,
/// `minAge`, ...). Missing keys fall back to the permissive default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub male: bool,
    pub female: bool,
    pub class1: bool,
    pub class2: bool,
    pub class3: bool,
    #[serde(rename = "pC")]
    pub port_c: bool,
    #[serde(rename = "pQ")]
    pub port_q: bool,
    #[serde(rename = "pS")]
    pub port_s: bool,
    /// Carried for the UI; the survivor predicate does not read it.
    pub min_age: f64,
    /// Carried for the UI; the survivor predicate does not read it.
    pub max_age: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            male: true,
            female: true,
            class1: true,
            class2: true,
            class3: true,
            port_c: true,
            port_q: true,
            port_s: true,
            min_age: DEFAULT_MIN_AGE,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

/// Every boolean flag of a [`FilterConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Male,
    Female,
    Class1,
    Class2,
    Class3,
    PortC,
    PortQ,
    PortS,
}

impl FilterKey {
    pub const ALL: [FilterKey; 8] = [
        FilterKey::Male,
        FilterKey::Female,
        FilterKey::Class1,
        FilterKey::Class2,
        FilterKey::Class3,
        FilterKey::PortC,
        FilterKey::PortQ,
        FilterKey::PortS,
    ];

    pub fn for_sex(sex: Sex) -> Self {
        match sex {
            Sex::Male => FilterKey::Male,
            Sex::Female => FilterKey::Female,
        }
    }

    pub fn for_class(class: Pclass) -> Self {
        match class {
            Pclass::First => FilterKey::Class1,
            Pclass::Second => FilterKey::Class2,
            Pclass::Third => FilterKey::Class3,
        }
    }

    pub fn for_port(port: Port) -> Self {
        match port {
            Port::Cherbourg => FilterKey::PortC,
            Port::Queenstown => FilterKey::PortQ,
            Port::Southampton => FilterKey::PortS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::Male => "male",
            FilterKey::Female => "female",
            FilterKey::Class1 => "class1",
            FilterKey::Class2 => "class2",
            FilterKey::Class3 => "class3",
            FilterKey::PortC => "pC",
            FilterKey::PortQ => "pQ",
            FilterKey::PortS => "pS",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PatchError::UnknownKey(s.to_string()))
    }
}

impl FilterConfig {
    pub fn flag(&self, key: FilterKey) -> bool {
        match key {
            FilterKey::Male => self.male,
            FilterKey::Female => self.female,
            FilterKey::Class1 => self.class1,
            FilterKey::Class2 => self.class2,
            FilterKey::Class3 => self.class3,
            FilterKey::PortC => self.port_c,
            FilterKey::PortQ => self.port_q,
            FilterKey::PortS => self.port_s,
        }
    }

    pub fn set_flag(&mut self, key: FilterKey, enabled: bool) {
        let slot = match key {
            FilterKey::Male => &mut self.male,
            FilterKey::Female => &mut self.female,
            FilterKey::Class1 => &mut self.class1,
            FilterKey::Class2 => &mut self.class2,
            FilterKey::Class3 => &mut self.class3,
            FilterKey::PortC => &mut self.port_c,
            FilterKey::PortQ => &mut self.port_q,
            FilterKey::PortS => &mut self.port_s,
        };
        *slot = enabled;
    }

    /// Same configuration with one flag changed.
    pub fn with_flag(mut self, key: FilterKey, enabled: bool) -> Self {
        self.set_flag(key, enabled);
        self
    }

    pub fn sex_enabled(&self, sex: Sex) -> bool {
        self.flag(FilterKey::for_sex(sex))
    }

    pub fn class_enabled(&self, class: Pclass) -> bool {
        self.flag(FilterKey::for_class(class))
    }

    /// A record without a port never matches a port flag.
    pub fn port_enabled(&self, port: Option<Port>) -> bool {
        port.is_some_and(|port| self.flag(FilterKey::for_port(port)))
    }

    pub fn enabled_keys(&self) -> Vec<FilterKey> {
        FilterKey::ALL
            .into_iter()
            .filter(|key| self.flag(*key))
            .collect()
    }
}

/// A single `key=value` edit of a filter configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterPatch {
    Flag(FilterKey, bool),
    MinAge(f64),
    MaxAge(f64),
}

impl FilterPatch {
    pub fn apply(self, config: &mut FilterConfig) {
        match self {
            FilterPatch::Flag(key, enabled) => config.set_flag(key, enabled),
            FilterPatch::MinAge(age) => config.min_age = age,
            FilterPatch::MaxAge(age) => config.max_age = age,
        }
    }
}

impl FromStr for FilterPatch {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = ASSIGNMENT_REGEX
            .captures(s)
            .ok_or_else(|| PatchError::Malformed(s.to_string()))?;
        let key = &captures[1];
        let value = &captures[2];
        let invalid = || PatchError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        if key.eq_ignore_ascii_case("minAge") || key.eq_ignore_ascii_case("maxAge") {
            let age: f64 = value.parse().map_err(|_| invalid())?;
            if !age.is_finite() {
                return Err(invalid());
            }
            return Ok(if key.eq_ignore_ascii_case("minAge") {
                FilterPatch::MinAge(age)
            } else {
                FilterPatch::MaxAge(age)
            });
        }

        let flag = key.parse::<FilterKey>()?;
        let enabled = parse_bool(value).ok_or_else(invalid)?;
        Ok(FilterPatch::Flag(flag, enabled))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_everything() {
        let config = FilterConfig::default();
        assert_eq!(config.enabled_keys().len(), FilterKey::ALL.len());
        assert_eq!(config.min_age, 0.0);
        assert_eq!(config.max_age, 100.0);
    }

    #[test]
    fn typed_lookups_follow_flags() {
        let config = FilterConfig::default()
            .with_flag(FilterKey::Female, false)
            .with_flag(FilterKey::Class2, false)
            .with_flag(FilterKey::PortQ, false);
        assert!(config.sex_enabled(Sex::Male));
        assert!(!config.sex_enabled(Sex::Female));
        assert!(!config.class_enabled(Pclass::Second));
        assert!(config.class_enabled(Pclass::Third));
        assert!(!config.port_enabled(Some(Port::Queenstown)));
        assert!(config.port_enabled(Some(Port::Southampton)));
    }

    #[test]
    fn missing_port_is_never_enabled() {
        assert!(!FilterConfig::default().port_enabled(None));
    }

    #[test]
    fn json_uses_dashboard_keys() {
        let json = serde_json::to_value(FilterConfig::default()).unwrap();
        assert_eq!(json["pC"], true);
        assert_eq!(json["class3"], true);
        assert_eq!(json["maxAge"], 100.0);

        let partial: FilterConfig = serde_json::from_str(r#"{"male": false, "minAge": 12}"#).unwrap();
        assert!(!partial.male);
        assert!(partial.female);
        assert_eq!(partial.min_age, 12.0);
    }

    #[test]
    fn patches_parse_and_apply() {
        let mut config = FilterConfig::default();
        "male=false".parse::<FilterPatch>().unwrap().apply(&mut config);
        " PS = off ".parse::<FilterPatch>().unwrap().apply(&mut config);
        "maxAge=40.5".parse::<FilterPatch>().unwrap().apply(&mut config);
        assert!(!config.male);
        assert!(!config.port_s);
        assert_eq!(config.max_age, 40.5);
    }

    #[test]
    fn bad_patches_are_rejected() {
        assert_eq!(
            "male".parse::<FilterPatch>(),
            Err(PatchError::Malformed("male".into()))
        );
        assert_eq!(
            "class4=true".parse::<FilterPatch>(),
            Err(PatchError::UnknownKey("class4".into()))
        );
        assert!(matches!(
            "female=maybe".parse::<FilterPatch>(),
            Err(PatchError::InvalidValue { .. })
        ));
        assert!(matches!(
            "minAge=NaN".parse::<FilterPatch>(),
            Err(PatchError::InvalidValue { .. })
        ));
    }
}
