use serde::Serialize;
use std::fmt;

use crate::error::{PredictionError, PredictionResult};

/// Porter secondary structure classes, one per residue.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecondaryStructure {
    /// `H`, from DSSP classes H, G and I
    Helix,
    /// `E`, from DSSP classes E and B
    Strand,
    /// `C`, from DSSP classes S, T and .
    Coil,
}

impl SecondaryStructure {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'H' => Some(Self::Helix),
            'E' => Some(Self::Strand),
            'C' => Some(Self::Coil),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Helix => 'H',
            Self::Strand => 'E',
            Self::Coil => 'C',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Helix => "helix",
            Self::Strand => "strand",
            Self::Coil => "coil",
        }
    }
}

/// PaleAle relative solvent accessibility classes, one per residue.
///
/// The symbols are case sensitive: `B`/`b` are buried and `e`/`E` are exposed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolventAccessibility {
    /// `B`, at most 4% accessible
    VeryBuried,
    /// `b`, more than 4% and at most 25% accessible
    SomewhatBuried,
    /// `e`, more than 25% and at most 50% accessible
    SomewhatExposed,
    /// `E`, more than 50% accessible
    VeryExposed,
}

impl SolventAccessibility {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'B' => Some(Self::VeryBuried),
            'b' => Some(Self::SomewhatBuried),
            'e' => Some(Self::SomewhatExposed),
            'E' => Some(Self::VeryExposed),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::VeryBuried => 'B',
            Self::SomewhatBuried => 'b',
            Self::SomewhatExposed => 'e',
            Self::VeryExposed => 'E',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::VeryBuried => "very_buried",
            Self::SomewhatBuried => "somewhat_buried",
            Self::SomewhatExposed => "somewhat_exposed",
            Self::VeryExposed => "very_exposed",
        }
    }

    pub fn is_buried(&self) -> bool {
        matches!(self, Self::VeryBuried | Self::SomewhatBuried)
    }
}

/// A completed prediction: the echoed query plus one structure symbol and one accessibility
/// symbol per residue.
///
/// # Fields
///
/// * `sequence` - The sequence as echoed back by the service
/// * `secondary_structure` - Porter output, one of `H`, `E` or `C` per residue
/// * `solvent_accessibility` - PaleAle output, one of `B`, `b`, `e` or `E` per residue
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Prediction {
    sequence: String,
    secondary_structure: String,
    solvent_accessibility: String,
}

impl Prediction {
    /// Builds a prediction, checking that all three strings cover the same residues.
    ///
    /// # Errors
    ///
    /// Returns `PredictionError::MalformedResult` if the strings differ in length (counted in
    /// characters) or are empty.
    pub fn new(
        sequence: impl Into<String>,
        secondary_structure: impl Into<String>,
        solvent_accessibility: impl Into<String>,
    ) -> PredictionResult<Self> {
        let prediction = Prediction {
            sequence: sequence.into(),
            secondary_structure: secondary_structure.into(),
            solvent_accessibility: solvent_accessibility.into(),
        };

        let len = prediction.sequence.chars().count();
        let ss_len = prediction.secondary_structure.chars().count();
        let sa_len = prediction.solvent_accessibility.chars().count();

        if len == 0 {
            return Err(PredictionError::malformed("empty sequence in result block"));
        }
        if len != ss_len || len != sa_len {
            return Err(PredictionError::malformed(format!(
                "field lengths differ: sequence {len}, secondary structure {ss_len}, \
                 solvent accessibility {sa_len}"
            )));
        }

        Ok(prediction)
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn secondary_structure(&self) -> &str {
        &self.secondary_structure
    }

    pub fn solvent_accessibility(&self) -> &str {
        &self.solvent_accessibility
    }

    /// Number of residues.
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Iterates over residues in order, decoding the per-residue classes.
    ///
    /// Symbols outside the documented alphabets decode to `None` rather than failing, since
    /// the service may extend them.
    pub fn residues(&self) -> impl Iterator<Item = Residue> + '_ {
        self.sequence
            .chars()
            .zip(self.secondary_structure.chars())
            .zip(self.solvent_accessibility.chars())
            .enumerate()
            .map(|(i, ((aa, ss), sa))| Residue {
                position: i + 1,
                amino_acid: aa,
                structure: SecondaryStructure::from_symbol(ss),
                accessibility: SolventAccessibility::from_symbol(sa),
            })
    }

    /// Counts residues in each class.
    pub fn composition(&self) -> Composition {
        let mut comp = Composition {
            residues: self.len(),
            ..Default::default()
        };

        for residue in self.residues() {
            match residue.structure {
                Some(SecondaryStructure::Helix) => comp.helix += 1,
                Some(SecondaryStructure::Strand) => comp.strand += 1,
                Some(SecondaryStructure::Coil) => comp.coil += 1,
                None => comp.unknown_structure += 1,
            }
            match residue.accessibility {
                Some(sa) if sa.is_buried() => comp.buried += 1,
                Some(_) => comp.exposed += 1,
                None => comp.unknown_accessibility += 1,
            }
        }

        comp
    }
}

/// Three lines: sequence, secondary structure, solvent accessibility.
impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.sequence)?;
        writeln!(f, "{}", self.secondary_structure)?;
        writeln!(f, "{}", self.solvent_accessibility)
    }
}

/// A single residue of a prediction. `position` is 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Residue {
    pub position: usize,
    pub amino_acid: char,
    pub structure: Option<SecondaryStructure>,
    pub accessibility: Option<SolventAccessibility>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Composition {
    pub residues: usize,
    pub helix: usize,
    pub strand: usize,
    pub coil: usize,
    pub unknown_structure: usize,
    pub buried: usize,
    pub exposed: usize,
    pub unknown_accessibility: usize,
}

impl Composition {
    pub fn helix_fraction(&self) -> f64 {
        fraction(self.helix, self.residues)
    }

    pub fn strand_fraction(&self) -> f64 {
        fraction(self.strand, self.residues)
    }

    pub fn coil_fraction(&self) -> f64 {
        fraction(self.coil, self.residues)
    }

    pub fn buried_fraction(&self) -> f64 {
        fraction(self.buried, self.residues)
    }
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
