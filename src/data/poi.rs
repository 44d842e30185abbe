use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        let latitude = latitude.clamp(-90.0, 90.0);
        let longitude = longitude.clamp(-180.0, 180.0);
        Self { latitude, longitude }
    }
}

/// A named location. Built once per distinct name and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub coordinate: Coordinate,
}

impl Site {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            coordinate,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.longitude
    }
}
