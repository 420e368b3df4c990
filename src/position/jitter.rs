use super::{map_numeric, resolution, Position};
use crate::aes::{X_AESTHETICS, Y_AESTHETICS};
use crate::data::{DataTable, PANEL};
use crate::error::Result;
use crate::params::Params;

/// Seed used when the layer does not set one, so builds stay reproducible.
pub const DEFAULT_SEED: u64 = 0x5EED_0F_6617;

/// Small deterministic generator (SplitMix64).
#[derive(Debug, Clone)]
pub(crate) struct SplitMix64(u64);

impl SplitMix64 {
    pub(crate) fn new(seed: u64) -> Self {
        SplitMix64(seed)
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [-1, 1).
    pub(crate) fn next_signed_unit(&mut self) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        unit * 2.0 - 1.0
    }
}

/// Adds bounded uniform noise: `x` within ±`width`, `y` within ±`height`.
/// Both default to 40% of the resolution of the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionJitter;

impl Position for PositionJitter {
    fn name(&self) -> &'static str {
        "jitter"
    }

    fn setup_params(&self, data: &DataTable, params: &Params) -> Result<Params> {
        let mut params = params.clone();
        if !params.contains("width") {
            let res = data.numeric("x").map(resolution).unwrap_or(1.0);
            params.set("width", 0.4 * res);
        }
        if !params.contains("height") {
            let res = data.numeric("y").map(resolution).unwrap_or(1.0);
            params.set("height", 0.4 * res);
        }
        if !params.contains("seed") {
            params.set("seed", DEFAULT_SEED as f64);
        }
        Ok(params)
    }

    fn compute_panel(&self, data: &DataTable, params: &Params) -> Result<DataTable> {
        let width = params.get_f64("width").unwrap_or(0.0);
        let height = params.get_f64("height").unwrap_or(0.0);
        let seed = params.get_f64("seed").unwrap_or(DEFAULT_SEED as f64) as u64;
        let panel = data
            .first_value(PANEL)
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0) as u64;
        let mut rng = SplitMix64::new(seed ^ panel.wrapping_mul(0xA24B_AED4_963E_E407));

        let n = data.nrow();
        let dx: Vec<f64> = (0..n).map(|_| rng.next_signed_unit() * width).collect();
        let dy: Vec<f64> = (0..n).map(|_| rng.next_signed_unit() * height).collect();

        let mut out = data.clone();
        for aes in X_AESTHETICS {
            out = map_numeric(out, aes, |i, v| v + dx[i])?;
        }
        for aes in Y_AESTHETICS {
            out = map_numeric(out, aes, |i, v| v + dy[i])?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::position::run_position;

    fn data() -> DataTable {
        DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![1.0, 2.0, 3.0, 1.0, 2.0])),
            ("y", Column::Numeric(vec![10.0, 20.0, 30.0, 10.0, 20.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_noise_is_bounded() {
        let out = run_position(&PositionJitter, &data(), &Params::new()).unwrap();
        for (a, b) in out.numeric("x").unwrap().iter().zip(data().numeric("x").unwrap()) {
            assert!((a - b).abs() <= 0.4);
        }
        for (a, b) in out.numeric("y").unwrap().iter().zip(data().numeric("y").unwrap()) {
            assert!((a - b).abs() <= 4.0);
        }
    }

    #[test]
    fn test_unseeded_runs_repeat() {
        let a = run_position(&PositionJitter, &data(), &Params::new()).unwrap();
        let b = run_position(&PositionJitter, &data(), &Params::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_noise() {
        let a = run_position(&PositionJitter, &data(), &Params::new().with("seed", 1.0)).unwrap();
        let b = run_position(&PositionJitter, &data(), &Params::new().with("seed", 2.0)).unwrap();
        assert_ne!(a.numeric("x"), b.numeric("x"));
    }

    #[test]
    fn test_zero_height_keeps_y() {
        let out = run_position(&PositionJitter, &data(), &Params::new().with("height", 0.0)).unwrap();
        assert_eq!(out.numeric("y"), data().numeric("y"));
    }
}
