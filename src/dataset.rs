//! The labeled exemplar table produced by a sweep.
//!
//! Rows flatten each window as interleaved `re0, im0, re1, im1, ...`, then
//! the modulation label and the SNR.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// One labeled, energy-normalized window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub real: Vec<f32>,
    pub imag: Vec<f32>,
    pub mod_name: String,
    pub snr_db: f32,
}

impl Exemplar {
    pub fn from_window(window: &[Complex32], mod_name: &str, snr_db: f32) -> Self {
        Self {
            real: window.iter().map(|s| s.re).collect(),
            imag: window.iter().map(|s| s.im).collect(),
            mod_name: mod_name.to_string(),
            snr_db,
        }
    }

    pub fn window_len(&self) -> usize {
        self.real.len()
    }

    pub fn interleaved(&self) -> Vec<f32> {
        self.real
            .iter()
            .zip(&self.imag)
            .flat_map(|(&re, &im)| [re, im])
            .collect()
    }

    pub fn energy(&self) -> f64 {
        self.real
            .iter()
            .zip(&self.imag)
            .map(|(&re, &im)| (re as f64).powi(2) + (im as f64).powi(2))
            .sum()
    }
}

/// Ordered, append-only collection of exemplars sharing one window length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    window_len: usize,
    rows: Vec<Exemplar>,
}

impl Dataset {
    pub fn new(window_len: usize) -> Self {
        Self {
            window_len,
            rows: Vec::new(),
        }
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Exemplar] {
        &self.rows
    }

    /// Append a job's exemplars. The batch is checked as a whole first, so
    /// a bad batch leaves the table untouched.
    pub fn push_batch(&mut self, batch: Vec<Exemplar>) -> Result<(), DatasetError> {
        let w = self.window_len;
        if let Some(bad) = batch
            .iter()
            .find(|e| e.real.len() != w || e.imag.len() != w)
        {
            return Err(DatasetError::WindowMismatch {
                expected: self.window_len,
                found: bad.real.len().max(bad.imag.len()),
            });
        }
        self.rows.extend(batch);
        Ok(())
    }

    /// `0 .. 2w-1`, then `mod_name` and `snr_db`.
    pub fn column_names(&self) -> Vec<String> {
        (0..2 * self.window_len)
            .map(|i| i.to_string())
            .chain(["mod_name".to_string(), "snr_db".to_string()])
            .collect()
    }

    pub fn to_csv_writer<W: Write>(&self, mut out: W) -> Result<(), DatasetError> {
        writeln!(out, "{}", self.column_names().join(","))?;
        for row in &self.rows {
            for value in row.interleaved() {
                write!(out, "{},", value)?;
            }
            writeln!(out, "{},{}", row.mod_name, row.snr_db)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), DatasetError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_csv_writer(BufWriter::new(File::create(path)?))
    }

    pub fn write_json(&self, path: &Path) -> Result<(), DatasetError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self, DatasetError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
