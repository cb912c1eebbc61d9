use crate::traits::VectorField;
use num_traits::{Float, FromPrimitive, Num, NumCast, One, ToPrimitive, Zero};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

/// Forward-mode dual number: `val` carries the value, `eps` the derivative.
///
/// Seeding `eps = 1` on one state component and evaluating a
/// `VectorField<Dual>` yields one Jacobian column exactly (no finite
/// differencing).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Dual {
    pub val: f64,
    pub eps: f64,
}

impl Dual {
    pub fn new(val: f64, eps: f64) -> Self {
        Self { val, eps }
    }

    /// Lifts a plain value (zero derivative part).
    pub fn constant(val: f64) -> Self {
        Self { val, eps: 0.0 }
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
    fn is_zero(&self) -> bool {
        self.val == 0.0 && self.eps == 0.0
    }
}

impl One for Dual {
    fn one() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.val + rhs.val, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.val - rhs.val, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.val * rhs.val, self.val * rhs.eps + self.eps * rhs.val)
    }
}

impl Div for Dual {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self::new(
            self.val / rhs.val,
            (self.eps * rhs.val - self.val * rhs.eps) / (rhs.val * rhs.val),
        )
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.eps)
    }
}

impl Rem for Dual {
    type Output = Self;
    fn rem(self, rhs: Self) -> Self {
        // Piecewise-constant shift: derivative passes through.
        Self::new(self.val % rhs.val, self.eps)
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl SubAssign for Dual {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl MulAssign for Dual {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}
impl DivAssign for Dual {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}
impl RemAssign for Dual {
    fn rem_assign(&mut self, rhs: Self) {
        *self = *self % rhs;
    }
}

impl Num for Dual {
    type FromStrRadixErr = ();
    fn from_str_radix(str: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        f64::from_str_radix(str, radix)
            .map(Self::constant)
            .map_err(|_| ())
    }
}

impl ToPrimitive for Dual {
    fn to_i64(&self) -> Option<i64> {
        self.val.to_i64()
    }
    fn to_u64(&self) -> Option<u64> {
        self.val.to_u64()
    }
    fn to_f64(&self) -> Option<f64> {
        Some(self.val)
    }
}

impl FromPrimitive for Dual {
    fn from_i64(n: i64) -> Option<Self> {
        Some(Self::constant(n as f64))
    }
    fn from_u64(n: u64) -> Option<Self> {
        Some(Self::constant(n as f64))
    }
    fn from_f64(n: f64) -> Option<Self> {
        Some(Self::constant(n))
    }
}

impl NumCast for Dual {
    fn from<T: ToPrimitive>(n: T) -> Option<Self> {
        n.to_f64().map(Self::constant)
    }
}

impl Float for Dual {
    fn nan() -> Self {
        Self::constant(f64::NAN)
    }
    fn infinity() -> Self {
        Self::constant(f64::INFINITY)
    }
    fn neg_infinity() -> Self {
        Self::constant(f64::NEG_INFINITY)
    }
    fn neg_zero() -> Self {
        Self::new(-0.0, -0.0)
    }
    fn min_value() -> Self {
        Self::constant(f64::MIN)
    }
    fn min_positive_value() -> Self {
        Self::constant(f64::MIN_POSITIVE)
    }
    fn max_value() -> Self {
        Self::constant(f64::MAX)
    }
    fn is_nan(self) -> bool {
        self.val.is_nan()
    }
    fn is_infinite(self) -> bool {
        self.val.is_infinite()
    }
    fn is_finite(self) -> bool {
        self.val.is_finite()
    }
    fn is_normal(self) -> bool {
        self.val.is_normal()
    }
    fn classify(self) -> std::num::FpCategory {
        self.val.classify()
    }
    fn floor(self) -> Self {
        Self::constant(self.val.floor())
    }
    fn ceil(self) -> Self {
        Self::constant(self.val.ceil())
    }
    fn round(self) -> Self {
        Self::constant(self.val.round())
    }
    fn trunc(self) -> Self {
        Self::constant(self.val.trunc())
    }
    fn fract(self) -> Self {
        Self::new(self.val.fract(), self.eps)
    }
    fn abs(self) -> Self {
        Self::new(
            self.val.abs(),
            if self.val >= 0.0 { self.eps } else { -self.eps },
        )
    }
    fn signum(self) -> Self {
        Self::constant(self.val.signum())
    }
    fn is_sign_positive(self) -> bool {
        self.val.is_sign_positive()
    }
    fn is_sign_negative(self) -> bool {
        self.val.is_sign_negative()
    }
    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }
    fn recip(self) -> Self {
        Self::one() / self
    }

    fn powi(self, n: i32) -> Self {
        Self::new(
            self.val.powi(n),
            <f64 as From<i32>>::from(n) * self.val.powi(n - 1) * self.eps,
        )
    }

    fn powf(self, n: Self) -> Self {
        // x^y = exp(y ln x)
        let v = self.val.powf(n.val);
        Self::new(v, v * (n.eps * self.val.ln() + n.val * self.eps / self.val))
    }

    fn sqrt(self) -> Self {
        let s = self.val.sqrt();
        Self::new(s, self.eps / (2.0 * s))
    }

    fn exp(self) -> Self {
        let e = self.val.exp();
        Self::new(e, e * self.eps)
    }
    fn exp2(self) -> Self {
        let e = self.val.exp2();
        Self::new(e, e * std::f64::consts::LN_2 * self.eps)
    }
    fn exp_m1(self) -> Self {
        Self::new(self.val.exp_m1(), self.val.exp() * self.eps)
    }
    fn ln(self) -> Self {
        Self::new(self.val.ln(), self.eps / self.val)
    }
    fn ln_1p(self) -> Self {
        Self::new(self.val.ln_1p(), self.eps / (1.0 + self.val))
    }
    fn log(self, base: Self) -> Self {
        self.ln() / base.ln()
    }
    fn log2(self) -> Self {
        self.ln() / Self::constant(std::f64::consts::LN_2)
    }
    fn log10(self) -> Self {
        self.ln() / Self::constant(std::f64::consts::LN_10)
    }

    fn max(self, other: Self) -> Self {
        if self.val > other.val {
            self
        } else {
            other
        }
    }
    fn min(self, other: Self) -> Self {
        if self.val < other.val {
            self
        } else {
            other
        }
    }
    fn abs_sub(self, other: Self) -> Self {
        if self.val > other.val {
            self - other
        } else {
            Self::zero()
        }
    }

    fn cbrt(self) -> Self {
        let c = self.val.cbrt();
        Self::new(c, self.eps / (3.0 * c * c))
    }
    fn hypot(self, other: Self) -> Self {
        let h = self.val.hypot(other.val);
        Self::new(h, (self.val * self.eps + other.val * other.eps) / h)
    }

    fn sin(self) -> Self {
        Self::new(self.val.sin(), self.eps * self.val.cos())
    }
    fn cos(self) -> Self {
        Self::new(self.val.cos(), -self.eps * self.val.sin())
    }
    fn tan(self) -> Self {
        let t = self.val.tan();
        Self::new(t, self.eps * (1.0 + t * t))
    }
    fn asin(self) -> Self {
        Self::new(self.val.asin(), self.eps / (1.0 - self.val * self.val).sqrt())
    }
    fn acos(self) -> Self {
        Self::new(
            self.val.acos(),
            -self.eps / (1.0 - self.val * self.val).sqrt(),
        )
    }
    fn atan(self) -> Self {
        Self::new(self.val.atan(), self.eps / (1.0 + self.val * self.val))
    }
    fn atan2(self, other: Self) -> Self {
        let denom = self.val * self.val + other.val * other.val;
        Self::new(
            self.val.atan2(other.val),
            (other.val * self.eps - self.val * other.eps) / denom,
        )
    }
    fn sin_cos(self) -> (Self, Self) {
        (self.sin(), self.cos())
    }

    fn sinh(self) -> Self {
        Self::new(self.val.sinh(), self.eps * self.val.cosh())
    }
    fn cosh(self) -> Self {
        Self::new(self.val.cosh(), self.eps * self.val.sinh())
    }
    fn tanh(self) -> Self {
        let t = self.val.tanh();
        Self::new(t, self.eps * (1.0 - t * t))
    }
    fn asinh(self) -> Self {
        Self::new(
            self.val.asinh(),
            self.eps / (self.val * self.val + 1.0).sqrt(),
        )
    }
    fn acosh(self) -> Self {
        Self::new(
            self.val.acosh(),
            self.eps / (self.val * self.val - 1.0).sqrt(),
        )
    }
    fn atanh(self) -> Self {
        Self::new(self.val.atanh(), self.eps / (1.0 - self.val * self.val))
    }

    fn integer_decode(self) -> (u64, i16, i8) {
        self.val.integer_decode()
    }
}

/// Writes the row-major `n x n` Jacobian of `field` at `(t, y)` into `jac`,
/// one dual-seeded evaluation per column.
pub fn jacobian<S: VectorField<Dual>>(field: &S, t: f64, y: &[f64], jac: &mut [f64]) {
    let n = y.len();
    debug_assert_eq!(jac.len(), n * n);

    let mut dual_y = vec![Dual::constant(0.0); n];
    let mut dual_out = vec![Dual::constant(0.0); n];
    let t_dual = Dual::constant(t);

    for col in 0..n {
        for i in 0..n {
            dual_y[i] = Dual::new(y[i], if i == col { 1.0 } else { 0.0 });
        }
        field.eval(t_dual, &dual_y, &mut dual_out);
        for row in 0..n {
            jac[row * n + col] = dual_out[row].eps;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{jacobian, Dual};
    use crate::traits::{Scalar, VectorField};
    use num_traits::Float;

    #[test]
    fn product_and_chain_rules() {
        let x = Dual::new(2.0, 1.0);
        let y = x * x * x;
        assert!((y.val - 8.0).abs() < 1e-12);
        assert!((y.eps - 12.0).abs() < 1e-12);

        let s = x.sin() * x.cos();
        // d/dx sin x cos x = cos 2x
        assert!((s.eps - (2.0 * 2.0_f64).cos()).abs() < 1e-12);
    }

    #[test]
    fn atan2_matches_finite_difference() {
        let h = 1e-7;
        let (x, y) = (0.7, -1.3);
        let d = Dual::new(y, 1.0).atan2(Dual::constant(x));
        let fd = (y + h).atan2(x) - (y - h).atan2(x);
        assert!((d.eps - fd / (2.0 * h)).abs() < 1e-6);
    }

    struct Rotation;

    impl<T: Scalar> VectorField<T> for Rotation {
        fn dim(&self) -> usize {
            2
        }
        fn eval(&self, _t: T, y: &[T], dydt: &mut [T]) {
            dydt[0] = -y[1];
            dydt[1] = y[0];
        }
    }

    #[test]
    fn jacobian_of_rotation_is_skew() {
        let mut jac = vec![0.0; 4];
        jacobian(&Rotation, 0.0, &[0.3, -0.4], &mut jac);
        assert_eq!(jac, vec![0.0, -1.0, 1.0, 0.0]);
    }
}
