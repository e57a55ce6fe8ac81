use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, ensure, Result};
use serde::Deserialize;

use crate::data_handling::substitution_scores::ChartConfig;

/// The twenty standard amino acids, keyed by one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum AminoAcid {
    A, C, D, E, F, G, H, I, K, L,
    M, N, P, Q, R, S, T, V, W, Y,
}

impl AminoAcid {
    pub const ALL: [AminoAcid; 20] = [
        AminoAcid::A, AminoAcid::C, AminoAcid::D, AminoAcid::E, AminoAcid::F,
        AminoAcid::G, AminoAcid::H, AminoAcid::I, AminoAcid::K, AminoAcid::L,
        AminoAcid::M, AminoAcid::N, AminoAcid::P, AminoAcid::Q, AminoAcid::R,
        AminoAcid::S, AminoAcid::T, AminoAcid::V, AminoAcid::W, AminoAcid::Y,
    ];

    pub fn symbol(self) -> char {
        match self {
            AminoAcid::A => 'A',
            AminoAcid::C => 'C',
            AminoAcid::D => 'D',
            AminoAcid::E => 'E',
            AminoAcid::F => 'F',
            AminoAcid::G => 'G',
            AminoAcid::H => 'H',
            AminoAcid::I => 'I',
            AminoAcid::K => 'K',
            AminoAcid::L => 'L',
            AminoAcid::M => 'M',
            AminoAcid::N => 'N',
            AminoAcid::P => 'P',
            AminoAcid::Q => 'Q',
            AminoAcid::R => 'R',
            AminoAcid::S => 'S',
            AminoAcid::T => 'T',
            AminoAcid::V => 'V',
            AminoAcid::W => 'W',
            AminoAcid::Y => 'Y',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        let upper = symbol.to_ascii_uppercase();
        AminoAcid::ALL.into_iter().find(|aa| aa.symbol() == upper)
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for AminoAcid {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => AminoAcid::from_symbol(c)
                .ok_or_else(|| anyhow!("'{}' is not a standard amino acid code", s)),
            _ => bail!("expected a one-letter amino acid code, got '{}'", s),
        }
    }
}

impl TryFrom<String> for AminoAcid {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Side-chain polarity class used to group the bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HydropathyClass {
    Hydrophobic,
    Hydrophilic,
}

impl HydropathyClass {
    pub fn label(self) -> &'static str {
        match self {
            HydropathyClass::Hydrophobic => "Hydrophobic amino acids",
            HydropathyClass::Hydrophilic => "Hydrophilic amino acids",
        }
    }
}

/// Median and interquartile bounds of the substitution score for one amino acid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AminoAcidRecord {
    pub symbol: AminoAcid,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

impl AminoAcidRecord {
    /// A zero median marks the synonymous substitution (no amino acid change).
    pub fn is_synonymous(&self) -> bool {
        self.median == 0.0
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("median", self.median), ("q1", self.q1), ("q3", self.q3)] {
            ensure!(
                value.is_finite() && (0.0..=1.0).contains(&value),
                "{} for {} is {}, expected a score in [0, 1]",
                name, self.symbol, value
            );
        }
        if self.median > 0.0 {
            ensure!(
                self.q1 <= self.median && self.median <= self.q3,
                "{}: expected q1 <= median <= q3, got {} / {} / {}",
                self.symbol, self.q1, self.median, self.q3
            );
        }
        Ok(())
    }
}

/// Validated record set together with the two ordered class memberships.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    records: BTreeMap<AminoAcid, AminoAcidRecord>,
    hydrophobic: Vec<AminoAcid>,
    hydrophilic: Vec<AminoAcid>,
}

impl ScoreTable {
    pub fn new(
        records: Vec<AminoAcidRecord>,
        hydrophobic: Vec<AminoAcid>,
        hydrophilic: Vec<AminoAcid>,
    ) -> Result<Self> {
        check_partition(&hydrophobic, &hydrophilic)?;

        let mut by_symbol = BTreeMap::new();
        for record in records {
            record.validate()?;
            if by_symbol.insert(record.symbol, record).is_some() {
                bail!("duplicate record for {}", record.symbol);
            }
        }
        for aa in AminoAcid::ALL {
            ensure!(by_symbol.contains_key(&aa), "no scores given for {}", aa);
        }

        Ok(ScoreTable { records: by_symbol, hydrophobic, hydrophilic })
    }

    pub fn record(&self, aa: AminoAcid) -> Option<&AminoAcidRecord> {
        self.records.get(&aa)
    }

    /// Class members in configuration order.
    pub fn members(&self, class: HydropathyClass) -> &[AminoAcid] {
        match class {
            HydropathyClass::Hydrophobic => &self.hydrophobic,
            HydropathyClass::Hydrophilic => &self.hydrophilic,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Both class lists must be duplicate-free, disjoint and together name all 20 amino acids.
fn check_partition(hydrophobic: &[AminoAcid], hydrophilic: &[AminoAcid]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for (class, members) in [("hydrophobic", hydrophobic), ("hydrophilic", hydrophilic)] {
        for &aa in members {
            ensure!(seen.insert(aa), "{} is listed more than once ({} class)", aa, class);
        }
    }
    let missing: Vec<String> = AminoAcid::ALL
        .iter()
        .filter(|aa| !seen.contains(aa))
        .map(|aa| aa.to_string())
        .collect();
    ensure!(missing.is_empty(), "amino acids without a class: {}", missing.join(", "));
    Ok(())
}

/// Anything that can produce the chart configuration.
pub trait Dataset {
    fn load(&self) -> Result<ChartConfig>;
}
