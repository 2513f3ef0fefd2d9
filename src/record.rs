use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Parses the dataset spelling, `male` or `female`. Other casings are rejected.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Passenger class, serialized as its number (1, 2, 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Pclass {
    First,
    Second,
    Third,
}

impl Pclass {
    pub const ALL: [Pclass; 3] = [Pclass::First, Pclass::Second, Pclass::Third];

    pub fn from_code(code: &str) -> Option<Self> {
        code.trim()
            .parse::<u8>()
            .ok()
            .and_then(|n| Pclass::try_from(n).ok())
    }

    pub fn number(self) -> u8 {
        match self {
            Pclass::First => 1,
            Pclass::Second => 2,
            Pclass::Third => 3,
        }
    }
}

impl From<Pclass> for u8 {
    fn from(class: Pclass) -> u8 {
        class.number()
    }
}

impl TryFrom<u8> for Pclass {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Pclass::First),
            2 => Ok(Pclass::Second),
            3 => Ok(Pclass::Third),
            _ => Err(format!("passenger class must be 1, 2 or 3, got {}", n)),
        }
    }
}

impl fmt::Display for Pclass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Port of embarkation, serialized as its one-letter code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Port {
    #[serde(rename = "C")]
    Cherbourg,
    #[serde(rename = "Q")]
    Queenstown,
    #[serde(rename = "S")]
    Southampton,
}

impl Port {
    pub const ALL: [Port; 3] = [Port::Cherbourg, Port::Queenstown, Port::Southampton];

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "C" => Some(Port::Cherbourg),
            "Q" => Some(Port::Queenstown),
            "S" => Some(Port::Southampton),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Port::Cherbourg => "C",
            Port::Queenstown => "Q",
            Port::Southampton => "S",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Port::Cherbourg => "Cherbourg",
            Port::Queenstown => "Queenstown",
            Port::Southampton => "Southampton",
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One passenger row. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub passenger_id: u32,
    pub name: String,
    pub survived: bool,
    pub pclass: Pclass,
    pub sex: Sex,
    /// `None` when the age is unknown.
    pub age: Option<f64>,
    /// `None` when the port was not recorded.
    pub embarked: Option<Port>,
}

impl Record {
    /// Anonymous record with the fields the pipeline reads.
    pub fn passenger(
        survived: bool,
        sex: Sex,
        pclass: Pclass,
        age: Option<f64>,
        embarked: Option<Port>,
    ) -> Self {
        Record {
            passenger_id: 0,
            name: String::new(),
            survived,
            pclass,
            sex,
            age,
            embarked,
        }
    }

    pub fn with_id(mut self, passenger_id: u32, name: impl Into<String>) -> Self {
        self.passenger_id = passenger_id;
        self.name = name.into();
        self
    }
}
