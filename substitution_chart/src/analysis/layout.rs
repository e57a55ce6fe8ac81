//! Turns a [`ScoreTable`] into the ordered bar sequence the chart is drawn from.
//!
//! Nothing in here touches a drawing backend: the renderer consumes a
//! [`ChartLayout`] and only decides where things land on the canvas.

use std::cmp::Ordering;

use plotters::style::RGBColor;
use tracing::debug;

use crate::models::{AminoAcid, AminoAcidRecord, HydropathyClass, ScoreTable};

/// Label drawn over every synonymous bar.
pub const SYNONYMOUS_LABEL: &str = "(Synonymous)";

/// Sample points of the diverging blue-grey-red "coolwarm" ramp.
const COOLWARM: [(f64, (u8, u8, u8)); 9] = [
    (0.000, (59, 76, 192)),
    (0.125, (98, 130, 234)),
    (0.250, (141, 176, 254)),
    (0.375, (184, 208, 249)),
    (0.500, (221, 221, 221)),
    (0.625, (245, 196, 173)),
    (0.750, (244, 154, 123)),
    (0.875, (222, 96, 77)),
    (1.000, (180, 4, 38)),
];

/// Continuous color scale normalised over the displayed medians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub fn spanning(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            // empty input
            return ColorScale { min: 0.0, max: 1.0 };
        }
        ColorScale { min, max }
    }

    /// Position of `value` on the scale, clamped to [0, 1]. A zero-width scale maps to 0.5.
    pub fn normalise(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> RGBColor {
        coolwarm(self.normalise(value))
    }
}

fn coolwarm(t: f64) -> RGBColor {
    let upper = COOLWARM
        .iter()
        .position(|&(stop, _)| stop >= t)
        .unwrap_or(COOLWARM.len() - 1)
        .max(1);
    let (t0, (r0, g0, b0)) = COOLWARM[upper - 1];
    let (t1, (r1, g1, b1)) = COOLWARM[upper];
    let w = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * w).round() as u8;
    RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// One bar of the chart in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBar {
    pub record: AminoAcidRecord,
    /// Integer slot on the x axis, equal to the index in the display sequence.
    pub x: usize,
    pub lower_error: f64,
    pub upper_error: f64,
    pub color: RGBColor,
}

impl PlacedBar {
    pub fn error_low(&self) -> f64 {
        self.record.median - self.lower_error
    }

    pub fn error_high(&self) -> f64 {
        self.record.median + self.upper_error
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub bars: Vec<PlacedBar>,
    /// Index of the first hydrophilic bar, i.e. the hydrophobic block size.
    pub boundary: usize,
    pub scale: ColorScale,
}

impl ChartLayout {
    pub fn block(&self, class: HydropathyClass) -> &[PlacedBar] {
        match class {
            HydropathyClass::Hydrophobic => &self.bars[..self.boundary],
            HydropathyClass::Hydrophilic => &self.bars[self.boundary..],
        }
    }

    /// Mean x position of a block, `None` for an empty block.
    pub fn group_center(&self, class: HydropathyClass) -> Option<f64> {
        let block = self.block(class);
        let first = block.first()?.x as f64;
        let last = block.last()?.x as f64;
        Some((first + last) / 2.0)
    }

    /// X position of the divider between the two blocks.
    pub fn divider_x(&self) -> f64 {
        self.boundary as f64 - 0.5
    }

    /// Bars that carry the [`SYNONYMOUS_LABEL`] annotation.
    pub fn synonymous_bars(&self) -> impl Iterator<Item = &PlacedBar> {
        self.bars.iter().filter(|bar| bar.record.is_synonymous())
    }

    /// Symbol of the bar sitting on axis position `x`, if `x` is one of the integer slots.
    pub fn symbol_at(&self, x: f64) -> Option<AminoAcid> {
        let slot = x.round();
        if slot < 0.0 || (x - slot).abs() > 1e-6 {
            return None;
        }
        self.bars.get(slot as usize).map(|bar| bar.record.symbol)
    }
}

/// Sorts each class ascending by median (stable, ties keep configuration order)
/// and lays out hydrophobic before hydrophilic.
pub fn plan_layout(table: &ScoreTable) -> ChartLayout {
    let mut ordered: Vec<AminoAcidRecord> = Vec::with_capacity(table.len());
    let mut boundary = 0;

    for class in [HydropathyClass::Hydrophobic, HydropathyClass::Hydrophilic] {
        let mut block: Vec<AminoAcidRecord> = table
            .members(class)
            .iter()
            .filter_map(|&aa| table.record(aa).copied())
            .collect();
        block.sort_by(|a, b| a.median.partial_cmp(&b.median).unwrap_or(Ordering::Equal));

        if class == HydropathyClass::Hydrophobic {
            boundary = block.len();
        }
        ordered.extend(block);
    }

    let scale = ColorScale::spanning(ordered.iter().map(|r| r.median));

    let bars = ordered
        .into_iter()
        .enumerate()
        .map(|(x, record)| PlacedBar {
            lower_error: (record.median - record.q1).max(0.0),
            upper_error: (record.q3 - record.median).max(0.0),
            color: scale.color(record.median),
            record,
            x,
        })
        .collect::<Vec<_>>();

    debug!(
        "Display order: {}",
        bars.iter().map(|b| b.record.symbol.to_string()).collect::<Vec<_>>().join(" ")
    );

    ChartLayout { bars, boundary, scale }
}
