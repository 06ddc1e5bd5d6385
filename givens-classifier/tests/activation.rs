use givens_classifier::activation::{activate, activate_grad};
use givens_structs::config::Nonlinearity;

const KINDS: [Nonlinearity; 4] = [
    Nonlinearity::Sigmoid,
    Nonlinearity::Selu,
    Nonlinearity::Relu,
    Nonlinearity::Tanh,
];

#[test]
fn test_derivatives_match_central_differences() {
    let h = 1e-3f32;
    for kind in KINDS {
        // stay clear of the kink at zero
        for x in [-2.5f32, -0.7, -0.1, 0.1, 0.6, 3.0] {
            let numeric = (activate(kind, x + h) - activate(kind, x - h)) / (2.0 * h);
            let analytic = activate_grad(kind, x);
            assert!(
                (numeric - analytic).abs() < 2e-3,
                "{} at {}: {} vs {}",
                kind,
                x,
                analytic,
                numeric
            );
        }
    }
}

#[test]
fn test_known_values() {
    assert_eq!(activate(Nonlinearity::Relu, -1.0), 0.0);
    assert_eq!(activate(Nonlinearity::Sigmoid, 0.0), 0.5);
    assert_eq!(activate(Nonlinearity::Tanh, 0.0), 0.0);
    assert!((activate(Nonlinearity::Selu, 1.0) - 1.050701).abs() < 1e-6);
    assert!((activate(Nonlinearity::Selu, -1e6) + 1.050701 * 1.6732632).abs() < 1e-5);
}
