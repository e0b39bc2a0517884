//! Flat five-axis array with computed strides.
//!
//! Axes are `[node, context, thread, event, metric]`, row-major. Cells
//! never written stay 0.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of axes
pub const RANK: usize = 5;

/// Reductions over the (node, context, thread) axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Sum,
    Max,
    Min,
    /// Population standard deviation
    StdDev,
    Mean,
}

impl Statistic {
    pub const ALL: [Statistic; 5] = [
        Statistic::Sum,
        Statistic::Max,
        Statistic::Min,
        Statistic::StdDev,
        Statistic::Mean,
    ];

    fn slot(self) -> usize {
        match self {
            Statistic::Sum => 0,
            Statistic::Max => 1,
            Statistic::Min => 2,
            Statistic::StdDev => 3,
            Statistic::Mean => 4,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Statistic::Sum => "sum",
            Statistic::Max => "max",
            Statistic::Min => "min",
            Statistic::StdDev => "stddev",
            Statistic::Mean => "mean",
        };
        f.write_str(name)
    }
}

/// Dense `f64` storage addressed by five indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseArray {
    shape: [usize; RANK],
    strides: [usize; RANK],
    data: Vec<f64>,
}

impl DenseArray {
    /// Zero-filled array of `shape`
    pub fn zeros(shape: [usize; RANK]) -> Self {
        let mut strides = [1usize; RANK];
        for axis in (0..RANK - 1).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        let len = shape.iter().product();
        Self {
            shape,
            strides,
            data: vec![0.0; len],
        }
    }

    pub fn shape(&self) -> [usize; RANK] {
        self.shape
    }

    pub fn strides(&self) -> [usize; RANK] {
        self.strides
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, index: [usize; RANK]) -> Option<usize> {
        let mut offset = 0;
        for axis in 0..RANK {
            if index[axis] >= self.shape[axis] {
                return None;
            }
            offset += index[axis] * self.strides[axis];
        }
        Some(offset)
    }

    pub fn get(&self, index: [usize; RANK]) -> Option<f64> {
        self.offset(index).map(|o| self.data[o])
    }

    /// Write one cell; false if `index` is out of bounds
    pub fn set(&mut self, index: [usize; RANK], value: f64) -> bool {
        match self.offset(index) {
            Some(o) => {
                self.data[o] = value;
                true
            }
            None => false,
        }
    }

    /// Reduce the three leading axes, giving every statistic for each
    /// (event, metric) pair
    ///
    /// Every (node, context, thread) cell takes part, padding included.
    /// With no cells at all each statistic is 0.
    pub fn reduce_threads(&self) -> Reduction {
        let [n, c, t, events, metrics] = self.shape;
        let cells = n * c * t;
        let plane = events * metrics;
        let mut values = vec![[0.0f64; 5]; plane];

        if cells == 0 {
            return Reduction {
                events,
                metrics,
                values,
            };
        }

        // the leading three axes are contiguous in stride order
        let cell_stride = self.strides[2];
        for (em, out) in values.iter_mut().enumerate() {
            let samples = (0..cells).map(|cell| self.data[cell * cell_stride + em]);

            let mut sum = 0.0;
            let mut max = f64::NEG_INFINITY;
            let mut min = f64::INFINITY;
            for v in samples.clone() {
                sum += v;
                max = max.max(v);
                min = min.min(v);
            }
            let mean = sum / cells as f64;
            let variance = samples.map(|v| (v - mean).powi(2)).sum::<f64>() / cells as f64;

            out[Statistic::Sum.slot()] = sum;
            out[Statistic::Max.slot()] = max;
            out[Statistic::Min.slot()] = min;
            out[Statistic::StdDev.slot()] = variance.sqrt();
            out[Statistic::Mean.slot()] = mean;
        }

        Reduction {
            events,
            metrics,
            values,
        }
    }
}

/// Per-(event, metric) statistics over all threads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reduction {
    events: usize,
    metrics: usize,
    values: Vec<[f64; 5]>,
}

impl Reduction {
    pub fn get(&self, event: usize, metric: usize, stat: Statistic) -> Option<f64> {
        if event >= self.events || metric >= self.metrics {
            return None;
        }
        Some(self.values[event * self.metrics + metric][stat.slot()])
    }
}
