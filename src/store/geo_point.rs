use crate::store::error::{invalid_argument, StoreResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParseGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl ParseGeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> StoreResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid_argument(
                "Latitude must be within the range (-90.0, 90.0).",
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid_argument(
                "Longitude must be within the range (-180.0, 180.0).",
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}
