use serde::Serialize;

/// Monotonic transform applied by continuous scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Identity,
    Log10,
    Sqrt,
    Reverse,
}

impl Transform {
    pub fn from_name(name: &str) -> Option<Transform> {
        match name {
            "identity" | "continuous" => Some(Transform::Identity),
            "log10" => Some(Transform::Log10),
            "sqrt" => Some(Transform::Sqrt),
            "reverse" => Some(Transform::Reverse),
            _ => None,
        }
    }

    pub fn apply(self, v: f64) -> f64 {
        match self {
            Transform::Identity => v,
            Transform::Log10 => v.log10(),
            Transform::Sqrt => v.sqrt(),
            Transform::Reverse => -v,
        }
    }

    pub fn inverse(self, v: f64) -> f64 {
        match self {
            Transform::Identity => v,
            Transform::Log10 => 10f64.powf(v),
            Transform::Sqrt => v * v,
            Transform::Reverse => -v,
        }
    }

    pub fn is_increasing(self) -> bool {
        !matches!(self, Transform::Reverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_round_trip() {
        for t in [Transform::Identity, Transform::Log10, Transform::Sqrt, Transform::Reverse] {
            let v = 25.0;
            assert!((t.inverse(t.apply(v)) - v).abs() < 1e-9, "{:?}", t);
        }
    }

    #[test]
    fn test_log10_non_positive_is_non_finite() {
        assert!(!Transform::Log10.apply(0.0).is_finite());
        assert!(Transform::Log10.apply(-1.0).is_nan());
    }
}
