use crate::error::{Result, VaeError};

/// Clamp applied to predictions before taking logarithms in the
/// reconstruction term.
pub const BCE_EPSILON: f32 = 1e-7;

#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(r: usize, c: usize) -> Self {
        Matrix {
            rows: r,
            cols: c,
            data: vec![0.0; r * c],
        }
    }

    pub fn filled(r: usize, c: usize, v: f32) -> Self {
        Matrix {
            rows: r,
            cols: c,
            data: vec![v; r * c],
        }
    }

    pub fn from_vec(r: usize, c: usize, v: Vec<f32>) -> Self {
        assert_eq!(v.len(), r * c);
        Matrix {
            rows: r,
            cols: c,
            data: v,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Return `ShapeMismatch` unless the matrix has exactly `expected` shape.
    pub fn ensure_shape(&self, op: &'static str, expected: (usize, usize)) -> Result<()> {
        if self.shape() != expected {
            return Err(VaeError::ShapeMismatch {
                op,
                expected,
                actual: self.shape(),
            });
        }
        Ok(())
    }

    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f32) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
        assert_eq!(a.cols, b.rows);
        let mut out = vec![0.0; a.rows * b.cols];
        for i in 0..a.rows {
            let a_row = &a.data[i * a.cols..(i + 1) * a.cols];
            for k in 0..a.cols {
                let a_val = a_row[k];
                if a_val == 0.0 {
                    continue;
                }
                let b_row = &b.data[k * b.cols..(k + 1) * b.cols];
                let out_row = &mut out[i * b.cols..(i + 1) * b.cols];
                for j in 0..b.cols {
                    out_row[j] += a_val * b_row[j];
                }
            }
        }
        Matrix::from_vec(a.rows, b.cols, out)
    }

    pub fn add(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a - b)
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn scale(&self, s: f32) -> Matrix {
        self.map(|v| v * s)
    }

    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Matrix {
        Matrix::from_vec(self.rows, self.cols, self.data.iter().map(|&v| f(v)).collect())
    }

    pub fn zip_with<F: Fn(f32, f32) -> f32>(&self, other: &Matrix, f: F) -> Matrix {
        assert_eq!(self.rows, other.rows);
        assert_eq!(self.cols, other.cols);
        let v = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Matrix::from_vec(self.rows, self.cols, v)
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn transpose(&self) -> Matrix {
        let mut v = vec![0.0; self.rows * self.cols];
        for i in 0..self.rows {
            for j in 0..self.cols {
                v[j * self.rows + i] = self.get(i, j);
            }
        }
        Matrix::from_vec(self.cols, self.rows, v)
    }

    /// Add a `1 x cols` row vector to every row.
    pub fn add_row(&self, row: &Matrix) -> Matrix {
        assert_eq!(row.rows, 1);
        assert_eq!(row.cols, self.cols);
        let mut out = self.clone();
        for r in 0..out.rows {
            for (v, &b) in out.data[r * out.cols..(r + 1) * out.cols]
                .iter_mut()
                .zip(row.data.iter())
            {
                *v += b;
            }
        }
        out
    }

    /// Column sums as a `1 x cols` matrix.
    pub fn sum_rows(&self) -> Matrix {
        let mut out = Matrix::zeros(1, self.cols);
        for r in 0..self.rows {
            for (o, &v) in out.data.iter_mut().zip(self.row(r).iter()) {
                *o += v;
            }
        }
        out
    }

    /// Horizontally stack `a` and `b` (same number of rows).
    pub fn concat_cols(a: &Matrix, b: &Matrix) -> Matrix {
        assert_eq!(a.rows, b.rows);
        let cols = a.cols + b.cols;
        let mut v = Vec::with_capacity(a.rows * cols);
        for r in 0..a.rows {
            v.extend_from_slice(a.row(r));
            v.extend_from_slice(b.row(r));
        }
        Matrix::from_vec(a.rows, cols, v)
    }

    /// Copy of columns `start..end`.
    pub fn slice_cols(&self, start: usize, end: usize) -> Matrix {
        assert!(start <= end && end <= self.cols);
        let cols = end - start;
        let mut v = Vec::with_capacity(self.rows * cols);
        for r in 0..self.rows {
            v.extend_from_slice(&self.row(r)[start..end]);
        }
        Matrix::from_vec(self.rows, cols, v)
    }

    /// Copy of the rows listed in `order`, in that order.
    pub fn select_rows(&self, order: &[usize]) -> Matrix {
        let mut v = Vec::with_capacity(order.len() * self.cols);
        for &r in order {
            v.extend_from_slice(self.row(r));
        }
        Matrix::from_vec(order.len(), self.cols, v)
    }
}

/// Scalar loss terms for one batch. `total` is already divided by the batch
/// size; the two terms are batch sums.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LossBreakdown {
    pub total: f32,
    pub reconstruction: f32,
    pub kl: f32,
}

/// Gradients of the averaged loss with respect to the model outputs.
#[derive(Clone, Debug)]
pub struct LossGrads {
    pub x_hat: Matrix,
    pub mu: Matrix,
    pub logvar: Matrix,
}

fn ensure_same(op: &'static str, a: &Matrix, b: &Matrix) -> Result<()> {
    b.ensure_shape(op, a.shape())
}

fn ensure_batch(op: &'static str, m: &Matrix) -> Result<()> {
    if m.rows == 0 {
        return Err(VaeError::EmptyBatch { op });
    }
    Ok(())
}

fn clamp_prob(p: f32) -> f32 {
    p.clamp(BCE_EPSILON, 1.0 - BCE_EPSILON)
}

/// Reconstruction loss: binary cross-entropy summed over every element of
/// the batch. Predictions are clamped to `[1e-7, 1 - 1e-7]` before the
/// logarithms.
pub fn bce_function(x_hat: &Matrix, x: &Matrix) -> Result<f32> {
    ensure_same("bce_function", x_hat, x)?;
    let loss = x_hat
        .data
        .iter()
        .zip(x.data.iter())
        .map(|(&p, &t)| {
            let p = clamp_prob(p);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum();
    Ok(loss)
}

/// Closed-form KL divergence between `N(mu, exp(logvar))` and the standard
/// normal prior, summed over batch and latent dimensions.
pub fn kl_divergence(mu: &Matrix, logvar: &Matrix) -> Result<f32> {
    ensure_same("kl_divergence", mu, logvar)?;
    let sum: f32 = mu
        .data
        .iter()
        .zip(logvar.data.iter())
        .map(|(&m, &lv)| 1.0 + lv - m * m - lv.exp())
        .sum();
    Ok(-0.5 * sum)
}

fn check_loss_inputs(x_hat: &Matrix, x: &Matrix, mu: &Matrix, logvar: &Matrix) -> Result<()> {
    ensure_same("loss_function", x_hat, x)?;
    ensure_same("loss_function", mu, logvar)?;
    ensure_batch("loss_function", x)?;
    if mu.rows != x.rows {
        return Err(VaeError::ShapeMismatch {
            op: "loss_function",
            expected: (x.rows, mu.cols),
            actual: mu.shape(),
        });
    }
    Ok(())
}

fn breakdown(x_hat: &Matrix, x: &Matrix, mu: &Matrix, logvar: &Matrix) -> Result<LossBreakdown> {
    check_loss_inputs(x_hat, x, mu, logvar)?;
    let reconstruction = bce_function(x_hat, x)?;
    let kl = kl_divergence(mu, logvar)?;
    let total = (reconstruction + kl) / x.rows as f32;
    if !total.is_finite() {
        crate::warn!("non-finite loss: reconstruction {reconstruction} kl {kl}");
    }
    Ok(LossBreakdown {
        total,
        reconstruction,
        kl,
    })
}

/// Negative evidence lower bound averaged over the batch:
/// `(bce_function + kl_divergence) / N`.
pub fn loss_function(x_hat: &Matrix, x: &Matrix, mu: &Matrix, logvar: &Matrix) -> Result<f32> {
    Ok(breakdown(x_hat, x, mu, logvar)?.total)
}

/// [`loss_function`] together with its gradients with respect to `x_hat`,
/// `mu` and `logvar`, ready for the models' backward passes.
pub fn loss_with_grads(
    x_hat: &Matrix,
    x: &Matrix,
    mu: &Matrix,
    logvar: &Matrix,
) -> Result<(LossBreakdown, LossGrads)> {
    let loss = breakdown(x_hat, x, mu, logvar)?;
    let inv_n = 1.0 / x.rows as f32;

    let grad_x_hat = x_hat.zip_with(x, |p, t| {
        let p = clamp_prob(p);
        (p - t) / (p * (1.0 - p)) * inv_n
    });
    let grad_mu = mu.scale(inv_n);
    let grad_logvar = logvar.map(|lv| 0.5 * (lv.exp() - 1.0) * inv_n);

    Ok((
        loss,
        LossGrads {
            x_hat: grad_x_hat,
            mu: grad_mu,
            logvar: grad_logvar,
        },
    ))
}
