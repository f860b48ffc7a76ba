use crate::Float;
use nalgebra as na;

/// Least-squares fit of `x = p0·t² + p1·t + p2`.
///
/// Solves the 3×3 normal equations through QR. Callers are expected to keep
/// `t` roughly in `[0, 1]`, the sums of `t⁴` blow up the conditioning otherwise.
pub fn quadratic_ls<T: Float>(t: &na::DVector<T>, x: &na::DVector<T>) -> Option<na::Vector3<T>> {
    let n = T::from_usize(t.len())?;

    let s_t1 = t.sum();
    let t2 = t.map(|v| v * v);
    let s_t2 = t2.sum();
    let t3 = t2.zip_map(t, |a, b| a * b);
    let s_t3 = t3.sum();
    let t4 = t3.zip_map(t, |a, b| a * b);
    let s_t4 = t4.sum();
    let s_t2x = t2.zip_map(x, |a, b| a * b).sum();
    let s_tx = t.zip_map(x, |a, b| a * b).sum();
    let s_x = x.sum();

    let a = na::Matrix3::new(s_t4, s_t3, s_t2, s_t3, s_t2, s_t1, s_t2, s_t1, n);
    let b = na::Vector3::new(s_t2x, s_tx, s_x);

    let qr_result = a.qr();
    let qtb = qr_result.q().transpose() * b;

    qr_result.r().solve_upper_triangular(&qtb)
}

/// Fits `x = a·y² + b·y + c` over `(y, x)` samples.
///
/// `y` is scaled into `[0, 1]` by its largest magnitude before solving and the
/// coefficients are mapped back afterwards.
pub fn polyfit2(samples: &[(f64, f64)]) -> Option<[f64; 3]> {
    let scale = samples
        .iter()
        .map(|&(y, _)| y.abs())
        .fold(0.0f64, f64::max);

    if samples.len() < 3 || scale <= 0.0 {
        return None;
    }

    let t = na::DVector::from_iterator(samples.len(), samples.iter().map(|&(y, _)| y / scale));
    let x = na::DVector::from_iterator(samples.len(), samples.iter().map(|&(_, x)| x));

    let p = quadratic_ls(&t, &x)?;
    let coeffs = [p[0] / (scale * scale), p[1] / scale, p[2]];

    if coeffs.iter().all(|c| c.is_finite()) {
        Some(coeffs)
    } else {
        None
    }
}
