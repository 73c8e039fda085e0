/// Quadratic price function `a + b*x + c*x^2`.
///
/// Day-ahead strategies instantiate one of these per side (buy and sell)
/// from the committed coefficient triples. The constant strategy uses a
/// degenerate function with `b = c = 0`.
///
/// # Examples
///
/// ```
/// use iso_pcs_sim::market::quadratic::QuadraticPrice;
///
/// let f = QuadraticPrice::new(1.0, 2.0, 3.0);
/// assert_eq!(f.eval(1.0), 6.0);
/// assert_eq!(QuadraticPrice::constant(4.5).eval(10.0), 4.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticPrice {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl QuadraticPrice {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// A flat price that ignores throughput.
    pub fn constant(price: f64) -> Self {
        Self::new(price, 0.0, 0.0)
    }

    /// Builds a function from the first three values of `coefficients`.
    ///
    /// Missing trailing coefficients are treated as zero.
    pub fn from_slice(coefficients: &[f64]) -> Self {
        let get = |i: usize| coefficients.get(i).copied().unwrap_or(0.0);
        Self::new(get(0), get(1), get(2))
    }

    /// Evaluates the price at throughput `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.a + self.b * x + self.c * x * x
    }
}
