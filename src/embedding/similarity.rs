//! Cosine-similarity kernels shared by deduplication, clustering, and
//! representative selection.

use ndarray::{Array1, Array2, ArrayBase, Data, Ix1};

/// Computes cosine similarity between two vectors.
///
/// Cosine similarity measures the angle between vectors,
/// ranging from -1 (opposite) to 1 (identical direction).
/// A zero-norm operand yields 0.0.
///
/// # Panics
///
/// Panics if vectors have different lengths. All callers inside this crate
/// operate on vectors drawn from one [`DocumentSet`](super::DocumentSet),
/// whose construction enforces a uniform dimension; externally supplied
/// vectors are checked before reaching this function.
pub fn cosine_similarity<Sa, Sb>(a: &ArrayBase<Sa, Ix1>, b: &ArrayBase<Sb, Ix1>) -> f64
where
    Sa: Data<Elem = f64>,
    Sb: Data<Elem = f64>,
{
    assert_eq!(
        a.len(),
        b.len(),
        "Vectors must have the same length for cosine similarity"
    );

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a < 1e-10 || norm_b < 1e-10 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Computes the pairwise cosine similarity matrix for a batch of embeddings.
///
/// # Arguments
///
/// * `embeddings` - 2D array where each row is an embedding.
///
/// # Returns
///
/// Symmetric matrix of pairwise similarities with a unit diagonal.
pub fn pairwise_cosine_similarity(embeddings: &Array2<f64>) -> Array2<f64> {
    let n = embeddings.nrows();
    let mut similarity_matrix = Array2::zeros((n, n));

    for i in 0..n {
        similarity_matrix[[i, i]] = 1.0;

        for j in (i + 1)..n {
            let sim = cosine_similarity(&embeddings.row(i), &embeddings.row(j));
            similarity_matrix[[i, j]] = sim;
            similarity_matrix[[j, i]] = sim;
        }
    }

    similarity_matrix
}

/// Computes the centroid (arithmetic mean) of a batch of embeddings.
///
/// Returns the zero vector for an empty batch.
pub fn centroid(embeddings: &Array2<f64>) -> Array1<f64> {
    let n = embeddings.nrows();
    let dim = embeddings.ncols();
    let mut mean = Array1::zeros(dim);

    if n == 0 {
        return mean;
    }

    for row in embeddings.outer_iter() {
        for (d, value) in row.iter().enumerate() {
            mean[d] += value;
        }
    }
    mean.mapv_inplace(|x| x / n as f64);
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        let b = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        let sim = cosine_similarity(&a, &b);
        assert!((sim - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = Array1::from_vec(vec![1.0, 0.0, 0.0]);
        let b = Array1::from_vec(vec![0.0, 1.0, 0.0]);
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 1e-10);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        let b = Array1::from_vec(vec![-1.0, -2.0, -3.0]);
        let sim = cosine_similarity(&a, &b);
        assert!((sim - (-1.0)).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        let b = Array1::from_vec(vec![0.0, 0.0, 0.0]);
        let sim = cosine_similarity(&a, &b);
        assert_eq!(sim, 0.0);
    }

    #[test]
    #[should_panic(expected = "Vectors must have the same length")]
    fn test_cosine_similarity_different_lengths() {
        let a = Array1::from_vec(vec![1.0, 2.0]);
        let b = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        cosine_similarity(&a, &b);
    }

    #[test]
    fn test_cosine_similarity_mixed_operands() {
        let owned = Array1::from_vec(vec![0.5, 0.5, 0.0]);
        let matrix =
            Array2::from_shape_vec((1, 3), vec![0.5, 0.5, 0.0]).expect("Failed to create array");
        let sim = cosine_similarity(&matrix.row(0), &owned);
        assert!((sim - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_pairwise_cosine_similarity() {
        let embeddings = Array2::from_shape_vec(
            (3, 4),
            vec![
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.707, 0.707, 0.0, 0.0,
            ],
        )
        .expect("Failed to create array");

        let sim_matrix = pairwise_cosine_similarity(&embeddings);
        assert_eq!(sim_matrix.shape(), &[3, 3]);

        // Diagonal should be 1.0
        for i in 0..3 {
            assert!((sim_matrix[[i, i]] - 1.0).abs() < 1e-10);
        }

        // Matrix should be symmetric
        for i in 0..3 {
            for j in 0..3 {
                assert!((sim_matrix[[i, j]] - sim_matrix[[j, i]]).abs() < 1e-10);
            }
        }

        // Third row points between the first two
        assert!((sim_matrix[[0, 2]] - 0.707_106_781).abs() < 1e-3);
    }

    #[test]
    fn test_centroid() {
        let embeddings = Array2::from_shape_vec((2, 3), vec![1.0, 0.0, 2.0, 3.0, 4.0, 0.0])
            .expect("Failed to create array");

        let mean = centroid(&embeddings);
        assert_eq!(mean.len(), 3);
        assert!((mean[0] - 2.0).abs() < 1e-10);
        assert!((mean[1] - 2.0).abs() < 1e-10);
        assert!((mean[2] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_centroid_empty() {
        let embeddings = Array2::zeros((0, 4));
        let mean = centroid(&embeddings);
        assert_eq!(mean.len(), 4);
        assert!(mean.iter().all(|&x| x == 0.0));
    }
}
