//! Named map regions (projections) supported by the map plotter.
//!
//! All regions use a plain cylindrical (equirectangular) view of their
//! bounding box in EPSG:4269 coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, WxError};

/// Closed set of regions the map pipeline can render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Germany
    #[default]
    De,
    /// Italy
    It,
    /// Northern Germany and the Benelux coast
    Nord,
}

/// Static definition of a region.
#[derive(Debug, Clone, Copy)]
pub struct RegionDef {
    pub name: &'static str,
    pub bbox: BoundingBox,
    pub epsg: u32,
    /// Administrative boundary layer, relative to the shapefiles folder
    /// and without extension.
    pub boundaries: &'static str,
}

const DE: RegionDef = RegionDef {
    name: "de",
    bbox: BoundingBox::new(4.5, 46.5, 16.0, 56.0),
    epsg: 4269,
    boundaries: "DEU_adm/DEU_adm1",
};

const IT: RegionDef = RegionDef {
    name: "it",
    bbox: BoundingBox::new(5.5, 43.5, 14.5, 48.0),
    epsg: 4269,
    boundaries: "ITA_adm/ITA_adm1",
};

const NORD: RegionDef = RegionDef {
    name: "nord",
    bbox: BoundingBox::new(4.0, 50.0, 12.0, 56.0),
    epsg: 4269,
    boundaries: "DEU_adm/DEU_adm1",
};

impl Region {
    pub const ALL: [Region; 3] = [Region::De, Region::It, Region::Nord];

    pub fn def(&self) -> &'static RegionDef {
        match self {
            Region::De => &DE,
            Region::It => &IT,
            Region::Nord => &NORD,
        }
    }

    pub fn name(&self) -> &'static str {
        self.def().name
    }

    pub fn bbox(&self) -> BoundingBox {
        self.def().bbox
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = WxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WxError::UnknownRegion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_regions() {
        assert_eq!("de".parse::<Region>().unwrap(), Region::De);
        assert_eq!("IT".parse::<Region>().unwrap(), Region::It);
        assert_eq!(" nord ".parse::<Region>().unwrap(), Region::Nord);
        assert!(matches!(
            "euratl".parse::<Region>(),
            Err(WxError::UnknownRegion(_))
        ));
    }

    #[test]
    fn test_region_boxes() {
        let bbox = Region::It.bbox();
        assert_eq!(bbox.min_x, 5.5);
        assert_eq!(bbox.max_y, 48.0);
        assert_eq!(Region::Nord.def().boundaries, "DEU_adm/DEU_adm1");
    }
}
