use crate::math::Matrix;
use crate::rng::rng_from_env;
use rand::Rng;

use super::layer::Layer;

// Dense layer `y = x W + b`.  During training each `LinearT` stores the last
// input it saw so the backward pass can produce gradients for the input,
// the weights and the bias.  Gradients accumulate until `zero_grad`, and the
// Adam moments live next to the parameters so optimizer state persists
// across steps without a separate parameter registry.

pub struct LinearT {
    pub w: Matrix,
    pub b: Matrix,
    grad_w: Matrix,
    grad_b: Matrix,
    m_w: Matrix,
    v_w: Matrix,
    m_b: Matrix,
    v_b: Matrix,
    t: usize,
    last_x: Matrix,
}

impl LinearT {
    /// Glorot-uniform weights drawn from the crate RNG stream, zero bias.
    pub fn new(in_dim: usize, out_dim: usize) -> Self {
        Self::with_rng(in_dim, out_dim, &mut rng_from_env())
    }

    pub fn with_rng<R: Rng>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (in_dim + out_dim).max(1) as f32).sqrt();
        let w = Matrix::from_vec(
            in_dim,
            out_dim,
            (0..in_dim * out_dim)
                .map(|_| rng.gen_range(-limit..=limit))
                .collect(),
        );
        Self::from_parts(w, Matrix::zeros(1, out_dim))
    }

    /// Build a layer from explicit weights (`in x out`) and bias (`1 x out`).
    pub fn from_parts(w: Matrix, b: Matrix) -> Self {
        assert_eq!(b.rows, 1);
        assert_eq!(b.cols, w.cols);
        let (rows, cols) = w.shape();
        Self {
            grad_w: Matrix::zeros(rows, cols),
            grad_b: Matrix::zeros(1, cols),
            m_w: Matrix::zeros(rows, cols),
            v_w: Matrix::zeros(rows, cols),
            m_b: Matrix::zeros(1, cols),
            v_b: Matrix::zeros(1, cols),
            t: 0,
            last_x: Matrix::zeros(0, 0),
            w,
            b,
        }
    }

    pub fn in_dim(&self) -> usize {
        self.w.rows
    }

    pub fn out_dim(&self) -> usize {
        self.w.cols
    }

    pub fn grad_w(&self) -> &Matrix {
        &self.grad_w
    }

    pub fn grad_b(&self) -> &Matrix {
        &self.grad_b
    }

    fn affine(&self, x: &Matrix) -> Matrix {
        Matrix::matmul(x, &self.w).add_row(&self.b)
    }

    fn forward_cached(&mut self, x: &Matrix) -> Matrix {
        self.last_x = x.clone();
        self.affine(x)
    }

    /// Accumulate parameter gradients and return the gradient for the input.
    fn backward_accumulate(&mut self, grad_out: &Matrix) -> Matrix {
        let grad_w = Matrix::matmul(&self.last_x.transpose(), grad_out);
        self.grad_w = self.grad_w.add(&grad_w);
        self.grad_b = self.grad_b.add(&grad_out.sum_rows());
        Matrix::matmul(grad_out, &self.w.transpose())
    }

    pub fn sgd_step(&mut self, lr: f32, weight_decay: f32) {
        for (w, &g) in self.w.data.iter_mut().zip(self.grad_w.data.iter()) {
            *w -= lr * (g + weight_decay * *w);
        }
        for (b, &g) in self.b.data.iter_mut().zip(self.grad_b.data.iter()) {
            *b -= lr * g;
        }
    }

    /// Adam step over weights and bias. Weight decay applies to the weights
    /// only.
    pub fn adam_step(&mut self, lr: f32, beta1: f32, beta2: f32, eps: f32, weight_decay: f32) {
        self.t += 1;
        let bc1 = 1.0 - beta1.powi(self.t as i32);
        let bc2 = 1.0 - beta2.powi(self.t as i32);
        for i in 0..self.w.data.len() {
            let g = self.grad_w.data[i] + weight_decay * self.w.data[i];
            self.m_w.data[i] = beta1 * self.m_w.data[i] + (1.0 - beta1) * g;
            self.v_w.data[i] = beta2 * self.v_w.data[i] + (1.0 - beta2) * g * g;
            let m_hat = self.m_w.data[i] / bc1;
            let v_hat = self.v_w.data[i] / bc2;
            self.w.data[i] -= lr * m_hat / (v_hat.sqrt() + eps);
        }
        for i in 0..self.b.data.len() {
            let g = self.grad_b.data[i];
            self.m_b.data[i] = beta1 * self.m_b.data[i] + (1.0 - beta1) * g;
            self.v_b.data[i] = beta2 * self.v_b.data[i] + (1.0 - beta2) * g * g;
            let m_hat = self.m_b.data[i] / bc1;
            let v_hat = self.v_b.data[i] / bc2;
            self.b.data[i] -= lr * m_hat / (v_hat.sqrt() + eps);
        }
    }
}

impl Layer for LinearT {
    fn forward(&self, x: &Matrix) -> Matrix {
        self.affine(x)
    }

    fn forward_train(&mut self, x: &Matrix) -> Matrix {
        self.forward_cached(x)
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        self.backward_accumulate(grad_out)
    }

    fn zero_grad(&mut self) {
        self.grad_w = Matrix::zeros(self.w.rows, self.w.cols);
        self.grad_b = Matrix::zeros(1, self.b.cols);
    }

    fn parameters(&mut self) -> Vec<&mut LinearT> {
        vec![self]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::rng_from_seed;

    #[test]
    fn init_respects_glorot_bound() {
        let layer = LinearT::with_rng(10, 6, &mut rng_from_seed(3));
        let limit = (6.0f32 / 16.0).sqrt();
        assert!(layer.w.data.iter().all(|w| w.abs() <= limit));
        assert!(layer.b.data.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn bias_gradient_sums_over_batch() {
        let w = Matrix::from_vec(2, 1, vec![1.0, -1.0]);
        let mut layer = LinearT::from_parts(w, Matrix::zeros(1, 1));
        let x = Matrix::from_vec(3, 2, vec![1.0, 0.0, 0.0, 1.0, 2.0, 2.0]);
        let y = layer.forward_train(&x);
        assert_eq!(y.data, vec![1.0, -1.0, 0.0]);
        let grad_in = layer.backward(&Matrix::filled(3, 1, 1.0));
        assert_eq!(layer.grad_b().data, vec![3.0]);
        assert_eq!(layer.grad_w().data, vec![3.0, 3.0]);
        assert_eq!(grad_in.data, vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn sgd_step_moves_against_gradient() {
        let mut layer = LinearT::from_parts(Matrix::zeros(1, 1), Matrix::zeros(1, 1));
        layer.forward_train(&Matrix::from_vec(1, 1, vec![2.0]));
        layer.backward(&Matrix::from_vec(1, 1, vec![1.0]));
        layer.sgd_step(0.5, 0.0);
        assert_eq!(layer.w.data, vec![-1.0]);
        assert_eq!(layer.b.data, vec![-0.5]);
    }
}
