//! # Timecode Module
//!
//! Conversione tra triple (minuti, secondi, frame) e offset in secondi.
//!
//! - `Timecode::to_offset_seconds`: `minuti*60 + secondi + frame/frame_rate`
//! - `Timecode::from_offset_seconds`: inversa, precisa al frame
//! - `valid_ranges`: il limite dei minuti dipende dalla durata, quelli di
//!   secondi (0-59) e frame (0..frame_rate-1) no
//! - `TrimSelection`: coppia start/end validata (start < end)

use crate::error::{Field, ValidationError};
use crate::probe::MediaMetadata;
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Position in a video as minutes, seconds and frame index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Timecode {
    pub minutes: u32,
    pub seconds: u32,
    pub frame: u32,
}

impl Timecode {
    pub fn new(minutes: u32, seconds: u32, frame: u32) -> Self {
        Self {
            minutes,
            seconds,
            frame,
        }
    }

    pub fn to_offset_seconds(&self, frame_rate: u32) -> f64 {
        let frame_rate = frame_rate.max(1);
        f64::from(self.minutes) * 60.0
            + f64::from(self.seconds)
            + f64::from(self.frame) / f64::from(frame_rate)
    }

    /// Nearest timecode at or before `offset`; sub-frame precision is dropped
    pub fn from_offset_seconds(offset: f64, frame_rate: u32) -> Self {
        let frame_rate = frame_rate.max(1);
        let offset = offset.max(0.0);
        let whole = offset.floor();
        // the epsilon absorbs float error such as 0.1 * 30 = 2.9999999999999996
        let mut frame = ((offset - whole) * f64::from(frame_rate) + 1e-6).floor() as u32;
        let mut total_seconds = whole as u64;
        if frame >= frame_rate {
            frame = 0;
            total_seconds += 1;
        }

        Self {
            minutes: (total_seconds / 60) as u32,
            seconds: (total_seconds % 60) as u32,
            frame,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0 && self.frame == 0
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.minutes, self.seconds, self.frame)
    }
}

impl FromStr for Timecode {
    type Err = String;

    /// Parses `M:S:F`, `M:S` or `S`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .trim()
            .split(':')
            .map(|p| {
                p.trim()
                    .parse::<u32>()
                    .map_err(|_| format!("invalid timecode '{}': expected M:S:F", s))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [s] => Ok(Self::new(0, *s, 0)),
            [m, s] => Ok(Self::new(*m, *s, 0)),
            [m, s, f] => Ok(Self::new(*m, *s, *f)),
            _ => Err(format!("invalid timecode '{}': expected M:S:F", s)),
        }
    }
}

/// Allowed component ranges for a source of a given duration and frame rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimecodeRanges {
    pub max_minutes: u32,
    pub seconds: RangeInclusive<u32>,
    pub frames: RangeInclusive<u32>,
}

impl TimecodeRanges {
    pub fn contains(&self, timecode: &Timecode) -> bool {
        timecode.minutes <= self.max_minutes
            && self.seconds.contains(&timecode.seconds)
            && self.frames.contains(&timecode.frame)
    }
}

impl fmt::Display for TimecodeRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "minutes 0-{}, seconds {}-{}, frames {}-{}",
            self.max_minutes,
            self.seconds.start(),
            self.seconds.end(),
            self.frames.start(),
            self.frames.end()
        )
    }
}

pub fn valid_ranges(duration_seconds: u64, frame_rate: u32) -> TimecodeRanges {
    let max_minutes = u32::try_from(duration_seconds / 60).unwrap_or(u32::MAX);
    TimecodeRanges {
        max_minutes,
        seconds: 0..=59,
        frames: 0..=frame_rate.max(1) - 1,
    }
}

/// Validated start/end pair for one input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimSelection {
    start: Timecode,
    end: Timecode,
    frame_rate: u32,
}

impl TrimSelection {
    pub fn new(
        start: Timecode,
        end: Timecode,
        metadata: &MediaMetadata,
    ) -> Result<Self, ValidationError> {
        let ranges = valid_ranges(metadata.duration_seconds, metadata.frame_rate);
        for (field, timecode) in [(Field::TrimStart, &start), (Field::TrimEnd, &end)] {
            if !ranges.contains(timecode) {
                return Err(ValidationError::InvalidTimecode {
                    field,
                    value: timecode.to_string(),
                    allowed: ranges.to_string(),
                });
            }
        }

        let selection = Self {
            start,
            end,
            frame_rate: metadata.frame_rate,
        };
        let (start_offset, end_offset) = (selection.start_offset(), selection.end_offset());
        if start_offset >= end_offset {
            return Err(ValidationError::InvalidTrim {
                start: start_offset,
                end: end_offset,
            });
        }

        Ok(selection)
    }

    pub fn start(&self) -> Timecode {
        self.start
    }

    pub fn end(&self) -> Timecode {
        self.end
    }

    pub fn start_offset(&self) -> f64 {
        self.start.to_offset_seconds(self.frame_rate)
    }

    pub fn end_offset(&self) -> f64 {
        self.end.to_offset_seconds(self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(frame_rate: u32, duration_seconds: u64) -> MediaMetadata {
        MediaMetadata {
            frame_rate,
            duration_seconds,
        }
    }

    #[test]
    fn test_to_offset_seconds() {
        assert_eq!(Timecode::new(0, 0, 0).to_offset_seconds(30), 0.0);
        assert_eq!(Timecode::new(1, 30, 0).to_offset_seconds(30), 90.0);
        assert_eq!(Timecode::new(0, 2, 15).to_offset_seconds(30), 2.5);
        assert_eq!(Timecode::new(2, 0, 12).to_offset_seconds(24), 120.5);
    }

    #[test]
    fn test_offset_round_trip_within_one_frame() {
        for frame_rate in [1, 24, 25, 30, 60] {
            let frame = 1.0 / f64::from(frame_rate);
            for offset in [0.0, 0.04, 1.0, 2.5, 59.99, 61.3, 754.125, 3599.9] {
                let back = Timecode::from_offset_seconds(offset, frame_rate)
                    .to_offset_seconds(frame_rate);
                assert!(
                    back <= offset + 1e-6 && offset - back < frame,
                    "fps {}: {} -> {}",
                    frame_rate,
                    offset,
                    back
                );
            }
        }
    }

    #[test]
    fn test_exact_frames_survive_round_trip() {
        let tc = Timecode::new(3, 7, 29);
        let offset = tc.to_offset_seconds(30);
        assert_eq!(Timecode::from_offset_seconds(offset, 30), tc);
    }

    #[test]
    fn test_valid_ranges() {
        let ranges = valid_ranges(125, 30);
        assert_eq!(ranges.max_minutes, 2);
        assert_eq!(ranges.seconds, 0..=59);
        assert_eq!(ranges.frames, 0..=29);

        // seconds are not bounded by duration
        assert!(ranges.contains(&Timecode::new(2, 59, 0)));
        assert!(!ranges.contains(&Timecode::new(3, 0, 0)));
        assert!(!ranges.contains(&Timecode::new(0, 0, 30)));

        assert_eq!(valid_ranges(10, 1).frames, 0..=0);
    }

    #[test]
    fn test_parse_timecode() {
        assert_eq!("1:05:12".parse::<Timecode>().unwrap(), Timecode::new(1, 5, 12));
        assert_eq!("0:30".parse::<Timecode>().unwrap(), Timecode::new(0, 30, 0));
        assert_eq!("45".parse::<Timecode>().unwrap(), Timecode::new(0, 45, 0));
        assert!("1:2:3:4".parse::<Timecode>().is_err());
        assert!("a:b".parse::<Timecode>().is_err());
        assert_eq!(Timecode::new(1, 5, 2).to_string(), "1:05:02");
    }

    #[test]
    fn test_trim_selection_accepts_ordered_pair() {
        let selection =
            TrimSelection::new(Timecode::new(0, 1, 15), Timecode::new(0, 10, 0), &metadata(30, 60))
                .unwrap();
        assert_eq!(selection.start_offset(), 1.5);
        assert_eq!(selection.end_offset(), 10.0);
    }

    #[test]
    fn test_trim_selection_rejects_start_not_before_end() {
        for frame_rate in [1, 24, 30, 60] {
            for duration in [1, 59, 600] {
                let meta = metadata(frame_rate, duration);
                let same = Timecode::new(0, 5, 0);
                assert!(matches!(
                    TrimSelection::new(same, same, &meta),
                    Err(ValidationError::InvalidTrim { .. })
                ));
                assert!(matches!(
                    TrimSelection::new(Timecode::new(0, 9, 0), Timecode::new(0, 3, 0), &meta),
                    Err(ValidationError::InvalidTrim { .. })
                ));
            }
        }
    }

    #[test]
    fn test_trim_selection_rejects_out_of_range_components() {
        let meta = metadata(25, 90);
        let err = TrimSelection::new(Timecode::new(0, 0, 0), Timecode::new(0, 10, 25), &meta)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidTimecode {
                field: Field::TrimEnd,
                ..
            }
        ));

        let err = TrimSelection::new(Timecode::new(2, 0, 0), Timecode::new(0, 10, 0), &meta)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidTimecode {
                field: Field::TrimStart,
                ..
            }
        ));
    }
}
