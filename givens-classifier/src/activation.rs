use givens_structs::config::Nonlinearity;

const SELU_ALPHA: f32 = 1.673_263_2;
const SELU_SCALE: f32 = 1.050_701;

pub fn activate(kind: Nonlinearity, x: f32) -> f32 {
    match kind {
        Nonlinearity::Sigmoid => sigmoid(x),
        Nonlinearity::Selu => {
            if x > 0.0 {
                SELU_SCALE * x
            } else {
                SELU_SCALE * SELU_ALPHA * x.exp_m1()
            }
        }
        Nonlinearity::Relu => x.max(0.0),
        Nonlinearity::Tanh => x.tanh(),
    }
}

/// Derivative with respect to the pre-activation value `x`.
pub fn activate_grad(kind: Nonlinearity, x: f32) -> f32 {
    match kind {
        Nonlinearity::Sigmoid => {
            let s = sigmoid(x);
            s * (1.0 - s)
        }
        Nonlinearity::Selu => {
            if x > 0.0 {
                SELU_SCALE
            } else {
                SELU_SCALE * SELU_ALPHA * x.exp()
            }
        }
        Nonlinearity::Relu => {
            if x > 0.0 {
                1.0
            } else {
                0.0
            }
        }
        Nonlinearity::Tanh => {
            let t = x.tanh();
            1.0 - t * t
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
