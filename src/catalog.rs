//! The fixed catalog of PIOMAS variables available for download.
//!
//! Short names, remote folder categories, long names and unit strings match
//! the v2.1 file index at the Polar Science Center. Units use the upstream
//! notation verbatim; an empty string marks a unitless variable.

/// Metadata for one downloadable variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub short_name: &'static str,
    pub folder: &'static str,
    pub long_name: &'static str,
    pub units: &'static str,
}

pub const CATALOG: &[VariableDescriptor] = &[
    VariableDescriptor {
        short_name: "heff",
        folder: "heff",
        long_name: "Monthly sea ice thickness",
        units: "$m$",
    },
    VariableDescriptor {
        short_name: "hiday",
        folder: "hiday",
        long_name: "Daily sea ice thickness",
        units: "$m$",
    },
    VariableDescriptor {
        short_name: "aiday",
        folder: "area",
        long_name: "Daily sea ice concentration",
        units: "",
    },
    VariableDescriptor {
        short_name: "area",
        folder: "area",
        long_name: "Monthly sea ice concentration",
        units: "",
    },
    VariableDescriptor {
        short_name: "advect",
        folder: "other",
        long_name: "Sea ice advection",
        units: "$m/2$",
    },
    VariableDescriptor {
        short_name: "alb",
        folder: "other",
        long_name: "Albedo",
        units: "",
    },
    VariableDescriptor {
        short_name: "gice",
        folder: "other",
        long_name: "Monthly 12-category ice thickness distribution",
        units: "",
    },
    VariableDescriptor {
        short_name: "giceday",
        folder: "other",
        long_name: "Daily 12-category ice thickness distribution",
        units: "",
    },
    VariableDescriptor {
        short_name: "iceprod",
        folder: "other",
        long_name: "Sea ice growth or melt rate",
        units: "$m/s$",
    },
    VariableDescriptor {
        short_name: "icevel",
        folder: "other",
        long_name: "Sea ice velocity",
        units: "$m/2$",
    },
    VariableDescriptor {
        short_name: "oflux",
        folder: "other",
        long_name: "Ocean heat flux used to melt ice",
        units: "$m/2$",
    },
    VariableDescriptor {
        short_name: "osali",
        folder: "other",
        long_name: "Ocean surface salinity",
        units: "$psu$",
    },
    VariableDescriptor {
        short_name: "osali1_10",
        folder: "other",
        long_name: "Ocean salinity of upper 10 levels",
        units: "$psu$",
    },
    VariableDescriptor {
        short_name: "otemp",
        folder: "other",
        long_name: "Ocean surface temperature",
        units: "$K$",
    },
    VariableDescriptor {
        short_name: "otemp1_10",
        folder: "other",
        long_name: "Ocean temperature of upper 10 levels",
        units: "$psu$",
    },
    VariableDescriptor {
        short_name: "snow",
        folder: "other",
        long_name: "Monthly snow depth",
        units: "$m$",
    },
    VariableDescriptor {
        short_name: "snowday",
        folder: "other",
        long_name: "Daily snow depth",
        units: "$m$",
    },
    VariableDescriptor {
        short_name: "ssh",
        folder: "other",
        long_name: "Sea surface height",
        units: "$cm$",
    },
    VariableDescriptor {
        short_name: "tice0",
        folder: "other",
        long_name: "Surface temperature",
        units: "$C$",
    },
];

/// Variables whose internal layout the converter does not support:
/// `icevel` carries interleaved U/V components, `gice`/`giceday` use a
/// 12-category sub-grid, `otemp1_10`/`osali1_10` are 3-D profiles.
pub const EXCLUDED: &[&str] = &["icevel", "gice", "giceday", "otemp1_10", "osali1_10"];

pub fn lookup(short_name: &str) -> Option<&'static VariableDescriptor> {
    CATALOG.iter().find(|desc| desc.short_name == short_name)
}

pub fn is_excluded(short_name: &str) -> bool {
    EXCLUDED.contains(&short_name)
}

pub fn supported_names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|desc| desc.short_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_variable() {
        let desc = lookup("hiday").unwrap();
        assert_eq!(desc.folder, "hiday");
        assert_eq!(desc.long_name, "Daily sea ice thickness");
        assert_eq!(desc.units, "$m$");
    }

    #[test]
    fn lookup_unknown_variable() {
        assert!(lookup("salinity").is_none());
    }

    #[test]
    fn exclusion_list_is_subset_of_catalog() {
        for name in EXCLUDED {
            assert!(lookup(name).is_some(), "{name} missing from catalog");
        }
    }

    #[test]
    fn short_names_are_unique() {
        let mut names: Vec<_> = supported_names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }
}
