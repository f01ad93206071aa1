// Pattern and arrangement data. Text rows are only the file encoding; once
// parsed a pattern is a plain voice x step table of optional intensities.

use crate::error::KitError;
use crate::shared::{EMPHASIS_UNIT, NUM_VOICES};

/// Trigger strength, 1 (plain hit) through 9 (hardest).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Intensity(u8);

impl Intensity {
    pub fn new(level: u8) -> Option<Self> {
        (1..=9).contains(&level).then_some(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn emphasis(self) -> i32 {
        (self.0 as i32 - 1) * EMPHASIS_UNIT
    }

    fn from_marker(marker: char) -> Result<Option<Self>, char> {
        match marker {
            ' ' => Ok(None),
            '1'..='9' => Ok(Self::new(marker as u8 - b'0')),
            other => Err(other),
        }
    }

    fn marker(step: Option<Self>) -> char {
        match step {
            Some(i) => (b'0' + i.0) as char,
            None => ' ',
        }
    }
}

/// One voice's row of a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub steps: Vec<Option<Intensity>>,
}

impl Track {
    pub fn silent(steps_per_bar: usize) -> Self {
        Self {
            steps: vec![None; steps_per_bar],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    pub name: String,
    pub tracks: [Track; NUM_VOICES],
}

impl Pattern {
    pub fn silent(name: &str, steps_per_bar: usize) -> Self {
        Self {
            name: name.to_string(),
            tracks: std::array::from_fn(|_| Track::silent(steps_per_bar)),
        }
    }

    /// Parse one text row per voice; each row must be exactly `steps_per_bar` characters.
    pub fn parse<S: AsRef<str>>(name: &str, rows: &[S], steps_per_bar: usize) -> Result<Self, KitError> {
        if rows.len() != NUM_VOICES {
            return Err(KitError::PatternRows {
                pattern: name.to_string(),
                expected: NUM_VOICES,
                found: rows.len(),
            });
        }
        let mut pattern = Self::silent(name, steps_per_bar);
        for (voice, (row, track)) in rows.iter().zip(pattern.tracks.iter_mut()).enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != steps_per_bar {
                return Err(KitError::TrackLength {
                    pattern: name.to_string(),
                    voice,
                    expected: steps_per_bar,
                    found,
                });
            }
            for (step, marker) in row.chars().enumerate() {
                track.steps[step] = Intensity::from_marker(marker).map_err(|marker| KitError::BadMarker {
                    pattern: name.to_string(),
                    voice,
                    step,
                    marker,
                })?;
            }
        }
        Ok(pattern)
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.tracks
            .iter()
            .map(|t| t.steps.iter().map(|s| Intensity::marker(*s)).collect())
            .collect()
    }

    #[inline]
    pub fn cell(&self, voice: usize, step: usize) -> Option<Intensity> {
        self.tracks[voice].steps[step]
    }
}

/// The song loop: one pattern index per bar, validated against the pattern list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arrangement {
    bars: Vec<usize>,
}

impl Arrangement {
    pub fn new(bars: Vec<usize>, pattern_count: usize) -> Result<Self, KitError> {
        if bars.is_empty() {
            return Err(KitError::EmptyArrangement);
        }
        if let Some((bar, &index)) = bars.iter().enumerate().find(|&(_, &p)| p >= pattern_count) {
            return Err(KitError::UnknownPattern {
                bar,
                index,
                available: pattern_count,
            });
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn pattern_at(&self, bar: usize) -> usize {
        self.bars[bar]
    }

    pub fn bars(&self) -> &[usize] {
        &self.bars
    }
}
