// src/resample/interp.rs

/// A column's valid samples, keyed by strictly increasing time.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Series {
    /// Keep the pairs whose value is present. `times` must be strictly
    /// increasing and free of NaN.
    pub fn from_samples(times: &[f64], values: &[f64]) -> Self {
        let (times, values) = times
            .iter()
            .zip(values)
            .filter(|(_, v)| !v.is_nan())
            .map(|(&t, &v)| (t, v))
            .unzip();
        Self { times, values }
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Value at `t`: linear between the bracketing samples, the boundary value
    /// outside the sampled span, the sample itself on an exact hit. NaN when
    /// the series has no samples at all.
    pub fn at(&self, t: f64) -> f64 {
        let (times, values) = (&self.times, &self.values);
        let Some(last) = times.len().checked_sub(1) else {
            return f64::NAN;
        };
        if t <= times[0] {
            return values[0];
        }
        if t >= times[last] {
            return values[last];
        }

        // times[0] < t < times[last], so 1 <= hi <= last
        let hi = times.partition_point(|&x| x < t);
        if times[hi] == t {
            return values[hi];
        }
        let lo = hi - 1;
        let frac = (t - times[lo]) / (times[hi] - times[lo]);
        values[lo] + (values[hi] - values[lo]) * frac
    }

    pub fn sample(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&t| self.at(t)).collect()
    }
}
