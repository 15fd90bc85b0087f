use serde::Deserialize;
use serde::Serialize;

pub mod radial;
pub mod ring;
pub mod v1;

pub use radial::{distance_km, in_radius, RadialFence};
pub use ring::in_poly;

/// A geographic point in degrees.
///
/// Both membership predicates treat `lat` as the horizontal (x) axis and
/// `lon` as the vertical (y) axis of the ray casting plane. Positions that
/// arrive as two-element arrays are `[lat, lon]` in the same order.
#[derive(Serialize, Deserialize, PartialEq, Clone, Copy, Debug)]
pub struct Coord {
    pub lat: f64,
    #[serde(rename = "long")]
    pub lon: f64,
}

impl From<[f64; 2]> for Coord {
    fn from(components: [f64; 2]) -> Self {
        Coord {
            lat: components[0],
            lon: components[1],
        }
    }
}
