use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// 2D vector (tangent vectors of the parametric mapping)
pub struct V2D {
    inner: [f64; 2],
}

impl V2D {
    pub const fn from([x, y]: [f64; 2]) -> Self {
        Self { inner: [x, y] }
    }

    pub fn dot_with(&self, other: &Self) -> f64 {
        self[0] * other[0] + self[1] * other[1]
    }

    /// z-component of the 3D cross product `self x other`
    pub fn cross(&self, other: &Self) -> f64 {
        self[0] * other[1] - self[1] * other[0]
    }
}

impl Index<usize> for V2D {
    type Output = f64;
    fn index(&self, index: usize) -> &Self::Output {
        &self.inner[index]
    }
}

impl Add for V2D {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            inner: [self[0] + other[0], self[1] + other[1]],
        }
    }
}

impl Sub for V2D {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            inner: [self[0] - other[0], self[1] - other[1]],
        }
    }
}

impl Mul<f64> for V2D {
    type Output = Self;
    fn mul(self, coefficient: f64) -> Self {
        Self {
            inner: [self[0] * coefficient, self[1] * coefficient],
        }
    }
}

impl Div<f64> for V2D {
    type Output = Self;
    fn div(self, divisor: f64) -> Self {
        Self {
            inner: [self[0] / divisor, self[1] / divisor],
        }
    }
}

/*
    | [g00, g01] |
    | [g10, g11] |
*/

#[derive(Clone, Copy, Debug, PartialEq)]
/// 2 by 2 Matrix. Used to represent metric tensors over the reference square
pub struct M2D {
    pub u: V2D,
    pub v: V2D,
}

impl M2D {
    pub const fn from(r0: [f64; 2], r1: [f64; 2]) -> Self {
        Self {
            u: V2D::from(r0),
            v: V2D::from(r1),
        }
    }

    /// Gram matrix of two vectors: `[[a.a, a.b], [b.a, b.b]]`
    pub fn gram(a: V2D, b: V2D) -> Self {
        Self::from([a.dot_with(&a), a.dot_with(&b)], [b.dot_with(&a), b.dot_with(&b)])
    }

    #[inline]
    pub fn det(&self) -> f64 {
        self.u[0] * self.v[1] - self.u[1] * self.v[0]
    }

    #[inline]
    pub fn trace(&self) -> f64 {
        self.u[0] + self.v[1]
    }

    pub fn adjugate(&self) -> Self {
        Self {
            u: V2D::from([self.v[1], -self.u[1]]),
            v: V2D::from([-self.v[0], self.u[0]]),
        }
    }

    /// Entry at row `r`, column `c`
    pub fn at(&self, r: usize, c: usize) -> f64 {
        match r {
            0 => self.u[c],
            1 => self.v[c],
            _ => panic!("M2D row index {} out of range!", r),
        }
    }
}

impl Div<f64> for M2D {
    type Output = Self;
    fn div(self, divisor: f64) -> Self {
        Self {
            u: self.u / divisor,
            v: self.v / divisor,
        }
    }
}

impl Mul<V2D> for M2D {
    type Output = V2D;
    fn mul(self, v: V2D) -> V2D {
        V2D::from([self.u.dot_with(&v), self.v.dot_with(&v)])
    }
}

impl fmt::Display for M2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "u: [{:.5}, {:.5}]  v: [{:.5}, {:.5}]",
            self.u[0], self.u[1], self.v[0], self.v[1]
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// Point in 2D Space
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }

    pub fn dist(&self, other: &Self) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Point {
    type Output = V2D;

    fn sub(self, other: Self) -> V2D {
        V2D::from([self.x - other.x, self.y - other.y])
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, coefficient: f64) -> Self {
        Self::new(self.x * coefficient, self.y * coefficient)
    }
}

impl Div<f64> for Point {
    type Output = Self;

    fn div(self, divis: f64) -> Self {
        Self::new(self.x / divis, self.y / divis)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(x: {:.10}, y: {:.10})", self.x, self.y)
    }
}
