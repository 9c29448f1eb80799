//! Price panel: field name → aligned date × instrument frame.
//!
//! Per-instrument bar lists are merged onto a unified timeline (the
//! sorted union of every instrument's dates). Cells an instrument has no
//! bar for are NaN.

use crate::domain::bar::DailyBar;
use crate::domain::error::IndexError;
use crate::domain::frame::Frame;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";

#[derive(Debug, Clone)]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    instruments: Vec<String>,
    fields: BTreeMap<String, Frame>,
}

impl PricePanel {
    /// Builds a panel from pre-aligned frames. Every frame must share the
    /// same date and instrument axes, and the panel must hold at least one
    /// date and one instrument.
    pub fn new(fields: Vec<(String, Frame)>) -> Result<Self, IndexError> {
        let mut map = BTreeMap::new();
        let mut reference: Option<&Frame> = None;
        for (_, frame) in &fields {
            match reference {
                Some(r) => r.ensure_aligned(frame)?,
                None => reference = Some(frame),
            }
        }
        let (dates, instruments) = match reference {
            Some(r) if r.n_dates() > 0 && r.n_instruments() > 0 => {
                (r.dates().to_vec(), r.instruments().to_vec())
            }
            _ => return Err(IndexError::EmptyPanel),
        };
        for (name, frame) in fields {
            map.insert(name, frame);
        }
        Ok(Self {
            dates,
            instruments,
            fields: map,
        })
    }

    /// Builds the Close and Volume frames from per-instrument bars.
    /// Instruments keep the order given; a duplicate date within one
    /// instrument keeps the last bar.
    pub fn from_bars(series: &[(String, Vec<DailyBar>)]) -> Result<Self, IndexError> {
        let timeline = build_unified_timeline(series);
        let instruments: Vec<String> = series.iter().map(|(code, _)| code.clone()).collect();
        let row_of: HashMap<NaiveDate, usize> =
            timeline.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let width = instruments.len();
        let mut closes = vec![f64::NAN; timeline.len() * width];
        let mut volumes = vec![f64::NAN; timeline.len() * width];
        for (col, (_, bars)) in series.iter().enumerate() {
            for bar in bars {
                let row = row_of[&bar.date];
                closes[row * width + col] = bar.close;
                volumes[row * width + col] = bar.volume;
            }
        }

        Self::new(vec![
            (
                CLOSE.to_string(),
                Frame::new(timeline.clone(), instruments.clone(), closes)?,
            ),
            (
                VOLUME.to_string(),
                Frame::new(timeline, instruments, volumes)?,
            ),
        ])
    }

    pub fn field(&self, name: &str) -> Result<&Frame, IndexError> {
        self.fields.get(name).ok_or_else(|| IndexError::MissingField {
            field: name.to_string(),
        })
    }

    pub fn close(&self) -> Result<&Frame, IndexError> {
        self.field(CLOSE)
    }

    pub fn volume(&self) -> Result<&Frame, IndexError> {
        self.field(VOLUME)
    }

    /// Fails on the first required field the panel does not carry.
    pub fn require(&self, fields: &[String]) -> Result<(), IndexError> {
        for field in fields {
            self.field(field)?;
        }
        Ok(())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    /// Close × Volume per date and instrument.
    pub fn dollar_volumes(&self) -> Result<Frame, IndexError> {
        self.close()?.zip_with(self.volume()?, |close, volume| close * volume)
    }
}

pub fn build_unified_timeline(series: &[(String, Vec<DailyBar>)]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
