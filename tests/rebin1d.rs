// Tests for the single axis rebin. Most of them check the conservation
// property against an independently computed overlap integral.

use approx::assert_abs_diff_eq;
use ndarray::{array, Array, Array1, Axis, IxDyn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rstest::rstest;

use ndarray_rebin::{rebin_1d, BinsKind, RebinError, VectorExtensions};

/// `n` bins with random widths starting at `start`
fn random_bins(rng: &mut StdRng, n: usize, start: f64) -> Array1<f64> {
    let mut edge = start;
    let mut bins = vec![edge];
    for _ in 0..n {
        edge += rng.random_range(0.1..2.0);
        bins.push(edge);
    }
    Array1::from(bins)
}

/// integral of the piecewise constant density over `[low, high]`
fn overlap_integral(density: &Array1<f64>, bins: &Array1<f64>, low: f64, high: f64) -> f64 {
    density
        .iter()
        .zip(bins.windows(2))
        .map(|(&value, edges)| {
            let overlap = high.min(edges[1]) - low.max(edges[0]);
            value * overlap.max(0.0)
        })
        .sum()
}

#[test]
fn density_keeps_weighted_average() {
    let result = rebin_1d(
        &array![1.0, 2.0],
        &array![0.0, 1.0, 2.0],
        &array![0.0, 2.0],
        Axis(0),
        false,
        false,
    )
    .unwrap();
    assert_abs_diff_eq!(result, array![1.5], epsilon = f64::EPSILON);
}

#[test]
fn grouped_keeps_totals() {
    let result = rebin_1d(
        &array![1.0, 2.0],
        &array![0.0, 1.0, 2.0],
        &array![0.0, 2.0],
        Axis(0),
        true,
        false,
    )
    .unwrap();
    assert_abs_diff_eq!(result, array![3.0], epsilon = f64::EPSILON);
}

#[test]
fn density_integral_is_preserved() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let bins = random_bins(&mut rng, 12, -3.0);
        let data = Array1::from_iter((0..12).map(|_| rng.random_range(0.0..10.0)));
        let span = bins[12] - bins[0];
        let low = bins[0] + span * rng.random_range(0.01..0.3);
        let high = bins[12] - span * rng.random_range(0.01..0.3);
        let new_bins = Array1::linspace(low, high, 7);

        let result = rebin_1d(&data, &bins, &new_bins, Axis(0), false, false).unwrap();
        assert_eq!(result.len(), 6);

        for (value, edges) in result.iter().zip(new_bins.windows(2)) {
            let expected = overlap_integral(&data, &bins, edges[0], edges[1]);
            assert_abs_diff_eq!(value * (edges[1] - edges[0]), expected, epsilon = 1e-9);
        }
        let total: f64 = (&result * &new_bins.widths()).sum();
        assert_abs_diff_eq!(
            total,
            overlap_integral(&data, &bins, low, high),
            epsilon = 1e-9
        );
    }
}

#[test]
fn grouped_integral_is_preserved() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..25 {
        let bins = random_bins(&mut rng, 8, 0.0);
        let totals = Array1::from_iter((0..8).map(|_| rng.random_range(0.0..5.0)));
        let density = &totals / &bins.widths();
        let new_bins = random_bins(&mut rng, 30, 0.0)
            .mapv(|edge| edge.min(bins[8]))
            .iter()
            .fold(Vec::new(), |mut acc: Vec<f64>, &edge| {
                if acc.last().map_or(true, |&last| last < edge) {
                    acc.push(edge);
                }
                acc
            });
        let new_bins = Array1::from(new_bins);

        let result = rebin_1d(&totals, &bins, &new_bins, Axis(0), true, false).unwrap();
        for (value, edges) in result.iter().zip(new_bins.windows(2)) {
            let expected = overlap_integral(&density, &bins, edges[0], edges[1]);
            assert_abs_diff_eq!(*value, expected, epsilon = 1e-9);
        }
    }
}

#[test]
fn same_bins_reproduce_data() {
    let mut rng = StdRng::seed_from_u64(3);
    let bins = random_bins(&mut rng, 20, 1.0);
    let data = Array1::from_iter((0..20).map(|_| rng.random_range(-1.0..1.0)));
    for grouped in [true, false] {
        let result = rebin_1d(&data, &bins, &bins, Axis(0), grouped, false).unwrap();
        assert_abs_diff_eq!(result, data, epsilon = 1e-9);
    }
}

#[test]
fn rebin_along_inner_axis() {
    let bins = array![0.0, 1.0, 2.0, 4.0];
    let data = array![[[1.0, 1.0, 1.0], [0.0, 2.0, 4.0]], [[3.0, 3.0, 3.0], [1.0, 1.0, 1.0]]];
    let result = rebin_1d(&data, &bins, &array![0.0, 2.0, 4.0], Axis(2), false, false).unwrap();
    let expected = array![[[1.0, 1.0], [1.0, 4.0]], [[3.0, 3.0], [1.0, 1.0]]];
    assert_abs_diff_eq!(result, expected, epsilon = 1e-12);
}

#[test]
fn rebin_dyn_dimension() {
    let data = Array::from_elem(IxDyn(&[2, 3, 4]), 2.0);
    let bins = array![0.0, 1.0, 2.0, 3.0];
    let result = rebin_1d(&data, &bins, &array![0.5, 3.0], Axis(1), true, false).unwrap();
    assert_eq!(result.shape(), &[2, 1, 4]);
    assert!(result.iter().all(|&value: &f64| (value - 5.0).abs() < 1e-12));
}

#[test]
fn rebin_view_input() {
    let data = array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
    let bins = array![0.0, 1.0, 2.0];
    let column = data.column(1);
    let result = rebin_1d(&column, &bins, &array![0.0, 2.0], Axis(0), true, false).unwrap();
    assert_abs_diff_eq!(result, array![8.0], epsilon = f64::EPSILON);
}

#[test]
fn rebin_f32() {
    let result = rebin_1d(
        &array![1.0f32, 3.0],
        &array![0.0f32, 1.0, 2.0],
        &array![0.5f32, 1.5],
        Axis(0),
        false,
        false,
    )
    .unwrap();
    assert_abs_diff_eq!(result, array![2.0f32], epsilon = 1e-6);
}

#[rstest]
#[case(array![-0.1, 1.0])]
#[case(array![0.0, 2.1])]
#[case(array![-1.0, 3.0])]
#[case(array![0.0, f64::NAN])]
fn no_extrapolation(#[case] new_bins: Array1<f64>) {
    let result = rebin_1d(
        &array![1.0, 2.0],
        &array![0.0, 1.0, 2.0],
        &new_bins,
        Axis(0),
        false,
        true,
    );
    assert!(matches!(result, Err(RebinError::OutOfRange { .. })));
}

#[rstest]
#[case(array![0.0, 1.0, 1.0, 2.0], array![0.0, 2.0], BinsKind::Source)]
#[case(array![0.0, 2.0, 1.0, 3.0], array![0.0, 2.0], BinsKind::Source)]
#[case(array![0.0, 1.0, 2.0, 3.0], array![0.0, 2.0, 1.0], BinsKind::Target)]
#[case(array![0.0, 1.0, 2.0, 3.0], array![1.0, 1.0], BinsKind::Target)]
#[case(array![0.0, 1.0, 2.0, 3.0], array![0.0, f64::NAN, 2.0], BinsKind::Target)]
fn bins_must_be_strictly_rising(
    #[case] bins: Array1<f64>,
    #[case] new_bins: Array1<f64>,
    #[case] kind: BinsKind,
) {
    let data = array![1.0, 2.0, 3.0];
    let result = rebin_1d(&data, &bins, &new_bins, Axis(0), false, false);
    assert!(matches!(result, Err(RebinError::NotMonotonic(k)) if k == kind));
}

#[test]
fn shape_mismatch() {
    let data = array![[1.0, 2.0], [3.0, 4.0]];
    let result = rebin_1d(
        &data,
        &array![0.0, 1.0, 2.0, 3.0],
        &array![0.0, 3.0],
        Axis(1),
        false,
        false,
    );
    assert!(matches!(
        result,
        Err(RebinError::ShapeMismatch {
            axis: 1,
            expected: 3,
            found: 2
        })
    ));
}

#[test]
fn axis_out_of_bounds() {
    let result = rebin_1d(
        &array![1.0, 2.0],
        &array![0.0, 1.0, 2.0],
        &array![0.0, 2.0],
        Axis(1),
        false,
        false,
    );
    assert!(matches!(
        result,
        Err(RebinError::AxisOutOfBounds { axis: 1, ndim: 1 })
    ));
}

#[test]
fn single_boundary_is_not_enough() {
    let result = rebin_1d(
        &array![1.0, 2.0],
        &array![0.0, 1.0, 2.0],
        &array![1.0],
        Axis(0),
        false,
        false,
    );
    assert!(matches!(
        result,
        Err(RebinError::NotEnoughBins {
            kind: BinsKind::Target,
            length: 1,
            minimum: 2
        })
    ));
}
