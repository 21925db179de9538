//! Cosmic-ray particle species and their rest masses.

use crate::constants::{
    fcn, M_B10, M_B11, M_BE10, M_BE9, M_C12, M_ELECTRON, M_LI7, M_O16, M_PROTON,
};
use std::{fmt, io, str::FromStr};

/// A cosmic-ray species carried by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleSpecies {
    Electron,
    Proton,
    Lithium7,
    Beryllium9,
    Beryllium10,
    Boron10,
    Boron11,
    Carbon12,
    Oxygen16,
}

impl ParticleSpecies {
    /// Position in a simulation field name where the species tag starts,
    /// e.g. `cree01` or `crpB10`.
    const FIELD_NAME_TAG_OFFSET: usize = 3;

    /// Returns the rest mass of the species in units of the proton mass.
    pub fn mass(&self) -> fcn {
        match self {
            Self::Electron => M_ELECTRON,
            Self::Proton => M_PROTON,
            Self::Lithium7 => M_LI7,
            Self::Beryllium9 => M_BE9,
            Self::Beryllium10 => M_BE10,
            Self::Boron10 => M_B10,
            Self::Boron11 => M_B11,
            Self::Carbon12 => M_C12,
            Self::Oxygen16 => M_O16,
        }
    }

    /// Returns the short tag identifying the species.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Electron => "e",
            Self::Proton => "p",
            Self::Lithium7 => "Li7",
            Self::Beryllium9 => "Be9",
            Self::Beryllium10 => "Be10",
            Self::Boron10 => "B10",
            Self::Boron11 => "B11",
            Self::Carbon12 => "C12",
            Self::Oxygen16 => "O16",
        }
    }

    /// Determines the species from the name of a simulation field, where the
    /// species tag follows a three-character prefix.
    ///
    /// Returns `None` if the name does not carry a known tag.
    pub fn from_field_name(field_name: &str) -> Option<Self> {
        let tag = field_name.get(Self::FIELD_NAME_TAG_OFFSET..)?;
        if tag.starts_with('e') {
            Some(Self::Electron)
        } else if tag.starts_with('p') {
            Some(Self::Proton)
        } else {
            [
                Self::Lithium7,
                Self::Carbon12,
                Self::Oxygen16,
                Self::Beryllium9,
                Self::Beryllium10,
                Self::Boron10,
                Self::Boron11,
            ]
            .into_iter()
            .find(|species| tag.starts_with(species.tag()))
        }
    }
}

impl FromStr for ParticleSpecies {
    type Err = io::Error;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "e" => Ok(Self::Electron),
            "p" => Ok(Self::Proton),
            "Li7" => Ok(Self::Lithium7),
            "Be9" => Ok(Self::Beryllium9),
            "Be10" => Ok(Self::Beryllium10),
            "B10" => Ok(Self::Boron10),
            "B11" => Ok(Self::Boron11),
            "C12" => Ok(Self::Carbon12),
            "O16" => Ok(Self::Oxygen16),
            invalid => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Invalid species tag {}\n\
                     Valid tags are: e, p, Li7, Be9, Be10, B10, B11, C12, O16",
                    invalid
                ),
            )),
        }
    }
}

impl fmt::Display for ParticleSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn species_tags_parse_back() {
        for species in [
            ParticleSpecies::Electron,
            ParticleSpecies::Proton,
            ParticleSpecies::Beryllium10,
            ParticleSpecies::Boron11,
            ParticleSpecies::Oxygen16,
        ] {
            assert_eq!(species.tag().parse::<ParticleSpecies>().unwrap(), species);
        }
        assert!("He4".parse::<ParticleSpecies>().is_err());
    }

    #[test]
    fn species_is_found_from_field_name() {
        assert_eq!(
            ParticleSpecies::from_field_name("cree01"),
            Some(ParticleSpecies::Electron)
        );
        assert_eq!(
            ParticleSpecies::from_field_name("crpp12"),
            Some(ParticleSpecies::Proton)
        );
        assert_eq!(
            ParticleSpecies::from_field_name("cr_Be10n03"),
            Some(ParticleSpecies::Beryllium10)
        );
        assert_eq!(
            ParticleSpecies::from_field_name("cr_Be9n03"),
            Some(ParticleSpecies::Beryllium9)
        );
        assert_eq!(
            ParticleSpecies::from_field_name("cr_B10n03"),
            Some(ParticleSpecies::Boron10)
        );
        assert_eq!(ParticleSpecies::from_field_name("cr"), None);
        assert_eq!(ParticleSpecies::from_field_name("dens"), None);
    }
}
