//! Region table.

use crate::LocauthError;
use std::str::FromStr;

/// A region where the identity exchange and the target service are hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    UsEast1,
    UsEast2,
    UsWest2,
    ApSouth1,
    ApSoutheast1,
    ApSoutheast2,
    ApNortheast1,
    CaCentral1,
    EuCentral1,
    EuWest1,
    EuWest2,
    EuNorth1,
    SaEast1,
    UsGovWest1,
}

/// Every region, in table order.
const ALL: [Region; 14] = [
    Region::UsEast1,
    Region::UsEast2,
    Region::UsWest2,
    Region::ApSouth1,
    Region::ApSoutheast1,
    Region::ApSoutheast2,
    Region::ApNortheast1,
    Region::CaCentral1,
    Region::EuCentral1,
    Region::EuWest1,
    Region::EuWest2,
    Region::EuNorth1,
    Region::SaEast1,
    Region::UsGovWest1,
];

impl Region {
    /// Returns the region name as used on the wire and in the store.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UsEast1 => "us-east-1",
            Self::UsEast2 => "us-east-2",
            Self::UsWest2 => "us-west-2",
            Self::ApSouth1 => "ap-south-1",
            Self::ApSoutheast1 => "ap-southeast-1",
            Self::ApSoutheast2 => "ap-southeast-2",
            Self::ApNortheast1 => "ap-northeast-1",
            Self::CaCentral1 => "ca-central-1",
            Self::EuCentral1 => "eu-central-1",
            Self::EuWest1 => "eu-west-1",
            Self::EuWest2 => "eu-west-2",
            Self::EuNorth1 => "eu-north-1",
            Self::SaEast1 => "sa-east-1",
            Self::UsGovWest1 => "us-gov-west-1",
        }
    }

    /// All known regions, in table order.
    pub fn all() -> impl Iterator<Item = Region> {
        ALL.into_iter()
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = LocauthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Region::all()
            .find(|region| region.name() == wanted)
            .ok_or_else(|| LocauthError::InvalidRegion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_display() {
        assert_eq!(Region::UsEast1.to_string(), "us-east-1");
        assert_eq!(Region::EuCentral1.to_string(), "eu-central-1");
        assert_eq!(Region::UsGovWest1.name(), "us-gov-west-1");
    }

    #[test]
    fn test_every_variant_has_a_distinct_name() {
        let names: std::collections::HashSet<_> = Region::all().map(|r| r.name()).collect();
        assert_eq!(names.len(), ALL.len());

        for region in Region::all() {
            assert_eq!(region.name().parse::<Region>().unwrap(), region);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("US-WEST-2".parse::<Region>().unwrap(), Region::UsWest2);
    }

    #[test]
    fn test_unknown_region() {
        let err = "mars-north-1".parse::<Region>().unwrap_err();
        assert!(matches!(err, LocauthError::InvalidRegion(name) if name == "mars-north-1"));
    }
}
