use serde::{Deserialize, Serialize};

/// Single-precision complex element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct C64 {
    pub re: f32,
    pub im: f32,
}

impl C64 {
    pub fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }
}

impl From<f32> for C64 {
    fn from(re: f32) -> Self {
        Self { re, im: 0.0 }
    }
}

impl std::ops::Add for C64 {
    type Output = C64;

    fn add(self, rhs: C64) -> C64 {
        C64::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl std::fmt::Display for C64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}i", self.re, self.im)
    }
}

/// Double-precision complex element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct C128 {
    pub re: f64,
    pub im: f64,
}

impl C128 {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl From<f64> for C128 {
    fn from(re: f64) -> Self {
        Self { re, im: 0.0 }
    }
}

impl std::ops::Add for C128 {
    type Output = C128;

    fn add(self, rhs: C128) -> C128 {
        C128::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl std::fmt::Display for C128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}i", self.re, self.im)
    }
}
