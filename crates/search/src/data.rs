//! Labelled datasets for binary classification.
//!
//! The search engine never looks inside the data; it only needs the number
//! of input dimensions and passes the dataset through to the oracle.
//! [`LabelledData`] is a plain in-memory implementation that also produces
//! the per-dimension summary shown in reports.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// What the search needs to know about a dataset.
pub trait Dataset: Send + Sync {
    /// Number of input dimensions.
    fn num_dims(&self) -> usize;

    /// Human-readable name of a dimension.
    fn label(&self, dim: usize) -> String {
        format!("x{}", dim + 1)
    }
}

/// Inputs `x` (one row per point) with binary class labels `y ∈ {0, 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledData {
    x: Vec<Vec<f64>>,
    y: Vec<u8>,
    x_labels: Vec<String>,
}

impl LabelledData {
    /// Build a dataset from rows of inputs and 0/1 labels.
    ///
    /// Dimensions get default labels `x1..xD`.
    pub fn new(x: Vec<Vec<f64>>, y: Vec<u8>) -> Result<Self, DataError> {
        if x.is_empty() {
            return Err(DataError::Empty);
        }
        let ndim = x[0].len();
        if ndim == 0 {
            return Err(DataError::Empty);
        }
        for (row, values) in x.iter().enumerate() {
            if values.len() != ndim {
                return Err(DataError::RaggedRows {
                    row,
                    expected: ndim,
                    got: values.len(),
                });
            }
        }
        if y.len() != x.len() {
            return Err(DataError::LengthMismatch {
                what: "labels",
                expected: x.len(),
                got: y.len(),
            });
        }
        if let Some((row, &value)) = y.iter().enumerate().find(|(_, v)| **v > 1) {
            return Err(DataError::NonBinaryLabel {
                row,
                value: f64::from(value),
            });
        }

        let x_labels = (0..ndim).map(|d| format!("x{}", d + 1)).collect();
        Ok(Self { x, y, x_labels })
    }

    /// Build a dataset from labels in `{-1, +1}` (or `{0, 1}`).
    ///
    /// `-1` becomes class 0.
    pub fn from_signed_labels(x: Vec<Vec<f64>>, y: &[f64]) -> Result<Self, DataError> {
        let y = y
            .iter()
            .enumerate()
            .map(|(row, &v)| match v {
                v if v == 1.0 => Ok(1),
                v if v == 0.0 || v == -1.0 => Ok(0),
                value => Err(DataError::NonBinaryLabel { row, value }),
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Self::new(x, y)
    }

    /// Name the input dimensions.
    pub fn with_labels<S: Into<String>>(
        mut self,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<Self, DataError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != self.num_dims() {
            return Err(DataError::LengthMismatch {
                what: "dimension labels",
                expected: self.num_dims(),
                got: labels.len(),
            });
        }
        self.x_labels = labels;
        Ok(self)
    }

    pub fn num_points(&self) -> usize {
        self.x.len()
    }

    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.x
    }

    pub fn targets(&self) -> &[u8] {
        &self.y
    }

    /// Values of one input dimension across all points.
    ///
    /// Empty for a dimension the data does not have.
    pub fn column(&self, dim: usize) -> impl Iterator<Item = f64> + '_ {
        self.x.iter().filter_map(move |row| row.get(dim).copied())
    }

    /// Per-dimension range and spread.
    pub fn summary(&self) -> DataSummary {
        let n = self.num_points() as f64;
        let mut x_min = Vec::with_capacity(self.num_dims());
        let mut x_max = Vec::with_capacity(self.num_dims());
        let mut x_sd = Vec::with_capacity(self.num_dims());

        for dim in 0..self.num_dims() {
            let min = self.column(dim).fold(f64::INFINITY, f64::min);
            let max = self.column(dim).fold(f64::NEG_INFINITY, f64::max);
            let mean = self.column(dim).sum::<f64>() / n;
            let var = self.column(dim).map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            x_min.push(min);
            x_max.push(max);
            x_sd.push(var.sqrt());
        }

        DataSummary {
            num_points: self.num_points(),
            num_dims: self.num_dims(),
            labels: self.x_labels.clone(),
            x_min,
            x_max,
            x_sd,
        }
    }
}

impl Dataset for LabelledData {
    fn num_dims(&self) -> usize {
        self.x_labels.len()
    }

    fn label(&self, dim: usize) -> String {
        self.x_labels
            .get(dim)
            .cloned()
            .unwrap_or_else(|| format!("x{}", dim + 1))
    }
}

/// Range and spread of each input dimension.
///
/// Standard deviations are population standard deviations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub num_points: usize,
    pub num_dims: usize,
    pub labels: Vec<String>,
    pub x_min: Vec<f64>,
    pub x_max: Vec<f64>,
    pub x_sd: Vec<f64>,
}

impl DataSummary {
    /// One paragraph describing the data set, dimension by dimension.
    pub fn describe(&self) -> String {
        let mut text = format!(
            "The training data set contains {} data points which span {} dimensions. ",
            self.num_points, self.num_dims
        );
        let ranges = self.x_min.iter().zip(&self.x_max).zip(&self.x_sd);
        for (label, ((min, max), sd)) in self.labels.iter().zip(ranges) {
            text.push_str(&format!(
                "In dimension ``{}'', the data has a minimum of {:.2} and a maximum of {:.2}; \
                 the standard deviation is {:.2}. ",
                label, min, max, sd
            ));
        }
        text.trim_end().to_string()
    }
}
