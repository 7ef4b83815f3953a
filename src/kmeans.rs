//! K-means refinement of seed colors in Lab space.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::color::LabVector;
use crate::math::{combine_means, distance, distance_squared, new_mean};
use crate::memo::AssignmentCache;

pub const DEFAULT_MAX_ITERATIONS: usize = 32;
pub const DEFAULT_CONVERGENCE_EPSILON: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KMeansOptions {
    pub max_iterations: usize,
    /// Largest center movement, in Lab units, still counted as converged.
    pub convergence_epsilon: f64,
    pub parallel: bool,
    /// Number of slices for the parallel path. `None` uses one per rayon thread.
    pub workers: Option<usize>,
}

impl Default for KMeansOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            convergence_epsilon: DEFAULT_CONVERGENCE_EPSILON,
            parallel: false,
            workers: None,
        }
    }
}

/// A cluster center plus the mean of the colors assigned to it in the
/// current pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cluster {
    pub center: LabVector,
    pub mean: LabVector,
    pub count: usize,
}

impl Cluster {
    pub fn new(center: LabVector) -> Self {
        Self {
            center,
            mean: center,
            count: 0,
        }
    }
}

/// Running mean and count owned by one worker.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClusterAccumulator {
    pub mean: LabVector,
    pub count: usize,
}

impl ClusterAccumulator {
    #[inline(always)]
    pub fn push(&mut self, color: LabVector) {
        self.mean = new_mean(self.mean, self.count, color);
        self.count += 1;
    }

    /// Weighted-mean combination. A zero-count side leaves the other untouched.
    #[inline(always)]
    pub fn merge(self, other: Self) -> Self {
        Self {
            mean: combine_means(self.mean, self.count, other.mean, other.count),
            count: self.count + other.count,
        }
    }
}

/// Index of the nearest center; the lowest index wins ties.
#[inline(always)]
pub fn nearest_cluster(centers: &[LabVector], color: &LabVector) -> usize {
    let mut best = 0;
    let mut best_distance = f64::MAX;
    for (i, center) in centers.iter().enumerate() {
        let d = distance_squared(*center, *color);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

/// Assigns every color in `pixels` to its nearest center and accumulates one
/// running mean per center.
fn accumulate(centers: &[LabVector], pixels: &[LabVector]) -> Vec<ClusterAccumulator> {
    let mut accumulators = vec![ClusterAccumulator::default(); centers.len()];
    let mut cache = AssignmentCache::new();
    for color in pixels {
        let i = cache.get_or_insert_with(color, || nearest_cluster(centers, color));
        accumulators[i].push(*color);
    }
    trace!(pixels = pixels.len(), distinct = cache.distinct_colors(), "assignment pass");
    accumulators
}

fn merge_all(left: Vec<ClusterAccumulator>, right: Vec<ClusterAccumulator>) -> Vec<ClusterAccumulator> {
    left.into_iter().zip(right).map(|(a, b)| a.merge(b)).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Converged,
    MaxIterationsReached,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KMeansReport {
    pub iterations: usize,
    pub termination: Termination,
    /// Largest center movement in the final iteration.
    pub last_shift: f64,
}

/// Lloyd-style k-means over Lab colors with a fixed number of clusters.
///
/// Each pass freezes the centers, assigns pixels, and leaves the per-cluster
/// means and counts on the clusters. [`KMeansLab::run`] then promotes those
/// means to centers and repeats until nothing moves more than the epsilon.
#[derive(Clone, Debug)]
pub struct KMeansLab {
    clusters: Vec<Cluster>,
}

impl KMeansLab {
    pub fn new(seeds: &[LabVector]) -> Self {
        Self {
            clusters: seeds.iter().copied().map(Cluster::new).collect(),
        }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn centers(&self) -> Vec<LabVector> {
        self.clusters.iter().map(|c| c.center).collect()
    }

    /// One sequential assignment pass over `pixels`.
    pub fn cluster(&mut self, pixels: &[LabVector]) {
        let centers = self.centers();
        let accumulators = accumulate(&centers, pixels);
        self.absorb(accumulators);
    }

    /// One assignment pass split into `workers` disjoint slices, each
    /// accumulated privately and merged afterwards. Gives the same counts and
    /// (up to rounding) the same means as [`KMeansLab::cluster`].
    pub fn cluster_parallel(&mut self, pixels: &[LabVector], workers: usize) {
        let centers = self.centers();
        let chunk_size = pixels.len().div_ceil(workers.max(1)).max(1);
        let accumulators = pixels
            .par_chunks(chunk_size)
            .map(|chunk| accumulate(&centers, chunk))
            .reduce(
                || vec![ClusterAccumulator::default(); centers.len()],
                merge_all,
            );
        self.absorb(accumulators);
    }

    /// Stores a pass's results. Clusters nobody was assigned to keep their center as mean.
    fn absorb(&mut self, accumulators: Vec<ClusterAccumulator>) {
        for (cluster, acc) in self.clusters.iter_mut().zip(accumulators) {
            if acc.count == 0 {
                cluster.mean = cluster.center;
                cluster.count = 0;
            } else {
                cluster.mean = acc.mean;
                cluster.count = acc.count;
            }
        }
    }

    /// Moves every center to its mean and returns the largest movement.
    fn settle(&mut self) -> f64 {
        self.clusters
            .iter_mut()
            .map(|cluster| {
                let shift = distance(cluster.center, cluster.mean);
                cluster.center = cluster.mean;
                shift
            })
            .fold(0.0, f64::max)
    }

    /// Iterates until every center moves by at most `convergence_epsilon` or
    /// the iteration cap is hit. With no pixels or no clusters the seeds are
    /// left as they are.
    pub fn run(&mut self, pixels: &[LabVector], options: &KMeansOptions) -> KMeansReport {
        let mut report = KMeansReport {
            iterations: 0,
            termination: Termination::MaxIterationsReached,
            last_shift: 0.0,
        };
        if pixels.is_empty() || self.clusters.is_empty() {
            report.termination = Termination::Converged;
            return report;
        }

        let workers = options
            .workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1);

        while report.iterations < options.max_iterations {
            if options.parallel {
                self.cluster_parallel(pixels, workers);
            } else {
                self.cluster(pixels);
            }
            report.last_shift = self.settle();
            report.iterations += 1;
            debug!(
                iteration = report.iterations,
                shift = report.last_shift,
                "k-means iteration"
            );

            if report.last_shift <= options.convergence_epsilon {
                report.termination = Termination::Converged;
                break;
            }
        }

        debug!(
            iterations = report.iterations,
            termination = ?report.termination,
            "k-means finished"
        );
        report
    }
}

/// Refines `seeds` against `lab_colors`, returning one center per seed in
/// seed order.
pub fn refine_by_kmeans(
    lab_colors: &[LabVector],
    seeds: &[LabVector],
    max_iterations: usize,
    convergence_epsilon: f64,
    parallel: bool,
) -> Vec<LabVector> {
    let options = KMeansOptions {
        max_iterations,
        convergence_epsilon,
        parallel,
        workers: None,
    };
    let mut kmeans = KMeansLab::new(seeds);
    kmeans.run(lab_colors, &options);
    kmeans.centers()
}
