// pca_runner.rs

use crate::error::{PhosphoPcaError, Result};
use log::{debug, info, warn};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Fitted PCA: scores for the observations and loadings for the features.
#[derive(Clone, Debug, PartialEq)]
pub struct PcaResult {
    /// n_observations x k projected coordinates.
    pub scores: Array2<f64>,
    /// n_features x k loadings (one column per component).
    pub rotation: Array2<f64>,
    /// Per-component variance, `lambda / (n - 1)`.
    pub explained_variance: Vec<f64>,
    pub explained_variance_ratio: Vec<f64>,
    pub feature_means: Array1<f64>,
}

impl PcaResult {
    pub fn n_components(&self) -> usize {
        self.rotation.ncols()
    }

    /// Loadings of every feature on `component` (0-based).
    pub fn loadings(&self, component: usize) -> ArrayView1<'_, f64> {
        self.rotation.column(component)
    }

    /// Coordinates of observation `row` on the first two components.
    pub fn coordinates(&self, row: usize) -> (f64, f64) {
        let second = if self.scores.ncols() > 1 {
            self.scores[[row, 1]]
        } else {
            0.0
        };
        (self.scores[[row, 0]], second)
    }

    /// Projects new observations with the fitted means and rotation.
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        if data.ncols() != self.feature_means.len() {
            return Err(PhosphoPcaError::ShapeMismatch(format!(
                "PCA was fit on {} features, got {}",
                self.feature_means.len(),
                data.ncols()
            )));
        }
        let centered = data - &self.feature_means;
        Ok(centered.dot(&self.rotation))
    }
}

/// Exact PCA on mean-centered (not scaled) data.
///
/// Observations are rows. With few observations and many features the
/// decomposition goes through the n x n Gram matrix `X Xᵀ`, whose
/// eigenvectors are the left singular vectors of `X`. Each component is
/// sign-flipped so its largest-magnitude score is positive, which keeps
/// the output stable from run to run.
pub fn fit_pca(data: &Array2<f64>, n_components: usize) -> Result<PcaResult> {
    let n_obs = data.nrows();
    let n_features = data.ncols();

    if n_components == 0 {
        return Err(PhosphoPcaError::DegeneratePca(
            "number of components must be > 0".to_string(),
        ));
    }
    if n_obs < 2 {
        return Err(PhosphoPcaError::DegeneratePca(format!(
            "PCA requires at least 2 observations, found {}",
            n_obs
        )));
    }
    if n_features == 0 {
        return Err(PhosphoPcaError::DegeneratePca(
            "PCA requires at least 1 feature, found 0".to_string(),
        ));
    }
    let max_possible_k = n_obs.min(n_features);
    if n_components > max_possible_k {
        return Err(PhosphoPcaError::DegeneratePca(format!(
            "requested {} components but at most {} are possible for a {}x{} matrix",
            n_components, max_possible_k, n_obs, n_features
        )));
    }

    let feature_means = data
        .mean_axis(Axis(0))
        .ok_or_else(|| PhosphoPcaError::DegeneratePca("empty matrix".to_string()))?;
    let centered = data - &feature_means;

    let gram = centered.dot(&centered.t());
    let total_sum_squares: f64 = gram.diag().sum();
    if !total_sum_squares.is_finite() {
        return Err(PhosphoPcaError::DegeneratePca(
            "matrix contains non-finite values".to_string(),
        ));
    }
    if total_sum_squares <= 0.0 {
        return Err(PhosphoPcaError::DegeneratePca(
            "all observations are identical (zero variance)".to_string(),
        ));
    }

    info!(
        "Running exact PCA: {} observations x {} features, k={}",
        n_obs, n_features, n_components
    );

    let eigen = SymmetricEigen::new(DMatrix::from_fn(n_obs, n_obs, |i, j| gram[[i, j]]));

    // nalgebra does not sort eigenvalues
    let mut order: Vec<usize> = (0..n_obs).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let rank_tolerance = total_sum_squares * 1e-12;
    let mut scores = Array2::<f64>::zeros((n_obs, n_components));
    let mut rotation = Array2::<f64>::zeros((n_features, n_components));
    let mut explained_variance = Vec::with_capacity(n_components);
    let mut explained_variance_ratio = Vec::with_capacity(n_components);

    for (component, &eig_idx) in order.iter().take(n_components).enumerate() {
        let lambda = eigen.eigenvalues[eig_idx].max(0.0);
        let mut u: Array1<f64> = eigen.eigenvectors.column(eig_idx).iter().copied().collect();
        flip_to_largest_positive(&mut u);

        let singular_value = lambda.sqrt();
        scores
            .column_mut(component)
            .assign(&(&u * singular_value));

        if lambda > rank_tolerance {
            let v = centered.t().dot(&u) / singular_value;
            rotation.column_mut(component).assign(&v);
        } else {
            warn!(
                "Component {} has zero variance; its loadings are left at zero.",
                component + 1
            );
        }

        explained_variance.push(lambda / (n_obs - 1) as f64);
        explained_variance_ratio.push(lambda / total_sum_squares);
        debug!(
            "PC{}: eigenvalue={:.6}, explained variance ratio={:.4}",
            component + 1,
            lambda,
            lambda / total_sum_squares
        );
    }

    Ok(PcaResult {
        scores,
        rotation,
        explained_variance,
        explained_variance_ratio,
        feature_means,
    })
}

/// Sign convention: the entry with the largest absolute value (first one on
/// ties) becomes positive.
fn flip_to_largest_positive(u: &mut Array1<f64>) {
    let mut pivot = 0;
    for (i, v) in u.iter().enumerate() {
        if v.abs() > u[pivot].abs() {
            pivot = i;
        }
    }
    if !u.is_empty() && u[pivot] < 0.0 {
        u.mapv_inplace(|v| -v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn rank_one_data_is_fully_explained_by_pc1() {
        // rows are multiples of one direction
        let dir = array![1.0, -2.0, 0.5, 3.0];
        let weights = [-1.0, 0.0, 0.5, 1.0, 3.0];
        let mut data = Array2::<f64>::zeros((5, 4));
        for (i, w) in weights.iter().enumerate() {
            data.row_mut(i).assign(&(&dir * *w));
        }
        let pca = fit_pca(&data, 2).unwrap();
        assert_close(pca.explained_variance_ratio[0], 1.0);
        assert!(pca.explained_variance_ratio[1].abs() < 1e-9);

        // unit-norm loading parallel to dir
        let norm = dir.dot(&dir).sqrt();
        let cos = pca.loadings(0).dot(&dir) / norm;
        assert_close(cos.abs(), 1.0);

        // the observation furthest from the mean (weight 3) scores positive
        assert!(pca.scores[[4, 0]] > 0.0);
        assert!(pca.scores[[0, 0]] < 0.0);
    }

    #[test]
    fn scores_match_projection_and_ratios_are_bounded() {
        let data = array![
            [2.0, 0.5, -1.0, 4.0],
            [1.0, 1.5, 0.0, 3.0],
            [0.0, -0.5, 2.0, 1.0],
            [-1.0, 2.5, 1.0, -2.0],
            [3.0, 0.0, -3.0, 0.5],
        ];
        let pca = fit_pca(&data, 2).unwrap();
        let projected = pca.transform(&data).unwrap();
        for (a, b) in projected.iter().zip(pca.scores.iter()) {
            assert_close(*a, *b);
        }
        let sum: f64 = pca.explained_variance_ratio.iter().sum();
        assert!(pca.explained_variance_ratio.iter().all(|r| (0.0..=1.0).contains(r)));
        assert!(sum <= 1.0 + 1e-12);
        assert!(pca.explained_variance_ratio[0] >= pca.explained_variance_ratio[1]);

        // loadings are orthonormal
        assert_close(pca.loadings(0).dot(&pca.loadings(0)), 1.0);
        assert_close(pca.loadings(1).dot(&pca.loadings(1)), 1.0);
        assert!(pca.loadings(0).dot(&pca.loadings(1)).abs() < 1e-9);

        // variance of scores equals explained variance
        let var0 = pca.scores.column(0).var(1.0);
        assert_close(var0, pca.explained_variance[0]);
    }

    #[test]
    fn refitting_is_deterministic() {
        let data = array![[1.0, 2.0, 3.0], [2.0, 1.0, 0.0], [0.5, 0.5, 4.0], [3.0, 3.0, 1.0]];
        let a = fit_pca(&data, 2).unwrap();
        let b = fit_pca(&data, 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let single = array![[1.0, 2.0]];
        assert!(matches!(fit_pca(&single, 1), Err(PhosphoPcaError::DegeneratePca(_))));

        let constant = array![[1.0, 2.0], [1.0, 2.0], [1.0, 2.0]];
        assert!(matches!(fit_pca(&constant, 1), Err(PhosphoPcaError::DegeneratePca(_))));

        let narrow = array![[1.0], [2.0], [4.0]];
        assert!(matches!(fit_pca(&narrow, 2), Err(PhosphoPcaError::DegeneratePca(_))));
        assert!(matches!(fit_pca(&narrow, 0), Err(PhosphoPcaError::DegeneratePca(_))));
    }

    #[test]
    fn sign_flip_uses_first_largest_entry() {
        let mut u = array![0.5, -0.8, 0.8];
        flip_to_largest_positive(&mut u);
        assert_eq!(u, array![-0.5, 0.8, -0.8]);
    }
}
