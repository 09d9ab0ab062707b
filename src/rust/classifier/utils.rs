use ndarray::Array1;

pub(crate) fn normalize_vector(vec: &Array1<f64>) -> Array1<f64> {
    let norm: f64 = vec.iter().map(|&x| x * x).sum::<f64>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn l1_normalize_vector(vec: &Array1<f64>) -> Array1<f64> {
    let norm: f64 = vec.iter().map(|x| x.abs()).sum();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Softmax over a pair of log-likelihoods, shifted by the max for stability.
pub(crate) fn softmax_pair(a: f64, b: f64) -> [f64; 2] {
    let max = a.max(b);
    let ea = (a - max).exp();
    let eb = (b - max).exp();
    let sum = ea + eb;
    [ea / sum, eb / sum]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_vector() {
        let v = normalize_vector(&array![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
        assert_eq!(normalize_vector(&array![0.0, 0.0]), array![0.0, 0.0]);
    }

    #[test]
    fn test_l1_normalize_vector() {
        let v = l1_normalize_vector(&array![1.0, 3.0]);
        assert!((v[0] - 0.25).abs() < 1e-12);
        assert!((v[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_is_symmetric_and_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-1000.0).is_finite());
        assert!(sigmoid(1000.0) <= 1.0);
    }

    #[test]
    fn test_softmax_pair_sums_to_one() {
        let [a, b] = softmax_pair(-1200.0, -1201.0);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert!(a > b);
    }
}
