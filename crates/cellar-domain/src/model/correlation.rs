//! Plato to extract correlation

use serde::{Deserialize, Serialize};

/// Cubic correlation giving kilograms of extract per hectoliter
///
/// f(A) = ((a·P + b)·P + c)·P + d, with P in degrees Plato.
/// f(A) is roughly P times the specific gravity of the liquid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractCorrelation {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for ExtractCorrelation {
    fn default() -> Self {
        Self {
            a: 0.0000188792,
            b: 0.003646886,
            c: 1.001077,
            d: -0.01223565,
        }
    }
}

impl ExtractCorrelation {
    /// f(A) in kg of extract per hL
    pub fn kg_per_hl(&self, plato: f64) -> f64 {
        ((self.a * plato + self.b) * plato + self.c) * plato + self.d
    }

    /// Human-readable formula with the configured coefficients
    pub fn formula(&self) -> String {
        let sign = if self.d < 0.0 { '-' } else { '+' };
        format!(
            "f(A) = (({} × P + {}) × P + {}) × P {} {}",
            self.a,
            self.b,
            self.c,
            sign,
            self.d.abs()
        )
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite() && self.d.is_finite()
    }
}
