use px_swatch_wasm::kmeans::{KMeansLab, KMeansOptions, Termination, refine_by_kmeans};
use px_swatch_wasm::math::distance;
use px_swatch_wasm::LabVector;

const BLACK: LabVector = LabVector::new(0.0, 0.0, 0.0);
const RED: LabVector = LabVector::new(53.23288178584245, 80.10930952982204, 67.22006831026425);
const YELLOW: LabVector = LabVector::new(97.13824698129729, -21.555908334832285, 94.48248544644461);
const GREEN: LabVector = LabVector::new(87.73703347354422, -86.18463649762525, 83.18116474777854);
const BLUE: LabVector = LabVector::new(32.302586667249486, 79.19666178930935, -107.86368104495168);
const WHITE: LabVector = LabVector::new(100.0, 0.0, 0.0);

fn primaries() -> Vec<LabVector> {
    vec![GREEN, YELLOW, RED, BLUE]
}

fn primary_seeds() -> Vec<LabVector> {
    vec![BLACK, RED, GREEN, BLUE, WHITE]
}

/// Deterministic pseudo-random population around a few centers.
fn blobs(centers: &[LabVector], per_center: usize, spread: f64) -> Vec<LabVector> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    };
    let mut pixels = Vec::with_capacity(centers.len() * per_center);
    for _ in 0..per_center {
        for center in centers {
            pixels.push(LabVector::new(
                center.l + next() * spread,
                center.a + next() * spread,
                center.b + next() * spread,
            ));
        }
    }
    pixels
}

fn assert_close(expected: LabVector, actual: LabVector, tolerance: f64) {
    assert!(
        distance(expected, actual) <= tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn cluster_counts_match_reference_assignment() {
    let mut kmeans = KMeansLab::new(&primary_seeds());
    kmeans.cluster(&primaries());

    let counts: Vec<usize> = kmeans.clusters().iter().map(|c| c.count).collect();
    assert_eq!(counts, vec![0, 1, 2, 1, 0]);

    // Unused extremes keep their seed as mean.
    assert_eq!(kmeans.clusters()[0].mean, BLACK);
    assert_eq!(kmeans.clusters()[4].mean, WHITE);
    // Yellow lands with green.
    let green_mean = LabVector::new(
        (GREEN.l + YELLOW.l) / 2.0,
        (GREEN.a + YELLOW.a) / 2.0,
        (GREEN.b + YELLOW.b) / 2.0,
    );
    assert_close(green_mean, kmeans.clusters()[2].mean, 1e-9);
    // Centers stay frozen until the pass is promoted.
    assert_eq!(kmeans.centers(), primary_seeds());
}

#[test]
fn parallel_cluster_counts_match_reference_assignment() {
    for workers in [1, 2, 3, 4, 16] {
        let mut kmeans = KMeansLab::new(&primary_seeds());
        kmeans.cluster_parallel(&primaries(), workers);

        let counts: Vec<usize> = kmeans.clusters().iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![0, 1, 2, 1, 0], "workers = {workers}");
    }
}

#[test]
fn parallel_pass_matches_sequential_pass() {
    let centers = [RED, GREEN, BLUE, WHITE, BLACK];
    let pixels = blobs(&centers, 400, 25.0);
    let seeds = vec![
        LabVector::new(50.0, 50.0, 50.0),
        LabVector::new(80.0, -60.0, 60.0),
        LabVector::new(40.0, 60.0, -80.0),
        LabVector::new(90.0, 0.0, 0.0),
        LabVector::new(10.0, 0.0, 0.0),
    ];

    let mut sequential = KMeansLab::new(&seeds);
    sequential.cluster(&pixels);

    for workers in [1, 2, 5, 7, 64] {
        let mut parallel = KMeansLab::new(&seeds);
        parallel.cluster_parallel(&pixels, workers);

        for (s, p) in sequential.clusters().iter().zip(parallel.clusters()) {
            assert_eq!(s.count, p.count, "workers = {workers}");
            assert_close(s.mean, p.mean, 1e-9);
        }
    }
}

#[test]
fn parallel_run_matches_sequential_run() {
    let pixels = blobs(&[RED, GREEN, BLUE], 300, 20.0);
    let seeds = vec![BLACK, WHITE, LabVector::new(50.0, 0.0, 0.0)];

    let sequential = refine_by_kmeans(&pixels, &seeds, 32, 1.0, false);
    let parallel = refine_by_kmeans(&pixels, &seeds, 32, 1.0, true);

    assert_eq!(sequential.len(), seeds.len());
    for (s, p) in sequential.iter().zip(&parallel) {
        assert_close(*s, *p, 1e-6);
    }
}

#[test]
fn run_converges_onto_blob_centers() {
    let centers = [RED, GREEN, BLUE];
    let pixels = blobs(&centers, 500, 5.0);
    let seeds = vec![
        LabVector::new(45.0, 70.0, 55.0),
        LabVector::new(80.0, -70.0, 70.0),
        LabVector::new(40.0, 65.0, -95.0),
    ];

    let mut kmeans = KMeansLab::new(&seeds);
    let report = kmeans.run(&pixels, &KMeansOptions::default());

    assert_eq!(report.termination, Termination::Converged);
    assert!(report.iterations < 32);
    assert!(report.last_shift <= 1.0);
    for (expected, actual) in centers.iter().zip(kmeans.centers()) {
        assert_close(*expected, actual, 1.0);
    }
}

#[test]
fn refining_converged_output_is_stable() {
    let pixels = blobs(&[RED, YELLOW, BLUE, WHITE], 250, 10.0);
    let seeds = primary_seeds();

    let first = refine_by_kmeans(&pixels, &seeds, 32, 1.0, false);
    let second = refine_by_kmeans(&pixels, &first, 32, 1.0, false);

    for (a, b) in first.iter().zip(&second) {
        assert!(distance(*a, *b) < 1.0, "{a} moved to {b}");
    }
}

#[test]
fn iteration_cap_stops_early() {
    let pixels = blobs(&[RED, BLUE], 100, 5.0);
    let seeds = vec![BLACK, WHITE];

    let mut kmeans = KMeansLab::new(&seeds);
    let options = KMeansOptions {
        max_iterations: 1,
        ..KMeansOptions::default()
    };
    let report = kmeans.run(&pixels, &options);

    assert_eq!(report.iterations, 1);
    assert_eq!(report.termination, Termination::MaxIterationsReached);
    assert!(report.last_shift > 1.0);
}

#[test]
fn duplicate_seeds_keep_cardinality() {
    let pixels = primaries();
    let seeds = vec![RED, RED, BLUE];
    let refined = refine_by_kmeans(&pixels, &seeds, 32, 1.0, false);

    assert_eq!(refined.len(), 3);
    // The second copy of red can only ever collect red itself.
    assert_eq!(refined[1], RED);
}
