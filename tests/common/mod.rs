#![allow(dead_code)]

use crspectrum::{
    exit_on_error,
    spectrum::{
        boundary::{BoundaryEdge, BoundaryInterpolator, BoundaryRatios},
        detection::BinMoments,
        fcr,
        grid::MomentumGrid,
        power_law::{compute_normalization, compute_right_edge_value, PowerLawSegment},
    },
};
use ndarray::Array1;
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tempfile::TempDir;

#[cfg(feature = "cli")]
use crspectrum::cli;

#[macro_export]
macro_rules! def_test {
    (
        OUT[$($out_ident:ident = $out_str:expr),*]
        fn $name:ident $test_body:expr
    ) => {
        #[test]
        fn $name() {
            let test = common::Test::new();

            $( let $out_ident = test.output_path($out_str); )*

            let test_body = |$( $out_ident: &str, )*| $test_body;

            test_body(
                $( path_str!($out_ident), )*
            );
        }
    };
}

#[macro_export]
macro_rules! path_str {
    ($path:expr) => {
        $path.to_string_lossy().as_ref()
    };
}

#[cfg(feature = "cli")]
pub fn run<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli::run::run_with_args(cli::build::build().get_matches_from(args));
}

pub fn assert_file_exists<P: AsRef<Path>>(file_path: P) {
    let file_path = file_path.as_ref();
    assert!(
        file_path.exists(),
        "File {} does not exist",
        file_path.to_string_lossy()
    );
}

pub fn read_file<P: AsRef<Path>>(file_path: P) -> String {
    exit_on_error!(
        fs::read_to_string(file_path),
        "Error: Could not read file: {}"
    )
}

/// Temporary directory for the output of a single test.
#[derive(Debug)]
pub struct Test {
    output_dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        Self {
            output_dir: exit_on_error!(
                tempfile::tempdir(),
                "Error: Could not create temporary output directory: {}"
            ),
        }
    }

    pub fn output_path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.output_dir.path().join(file_name.as_ref())
    }
}

pub fn default_grid(mass: fcr) -> MomentumGrid {
    MomentumGrid::new(45, 1e-2, 1e2, 1e-3, 1e7, mass, 1.0)
}

/// Power-law segments on the bins of the given grid with the given slopes
/// and number densities.
pub fn segments_on_grid(grid: &MomentumGrid, q: &[fcr], n: &[fcr]) -> Vec<PowerLawSegment> {
    (0..grid.n_bins())
        .map(|bin_idx| {
            let (p_l, p_r) = grid.bin_edges(bin_idx);
            let (g_l, g_r) = grid.bin_edge_energies(bin_idx);
            let f_l = compute_normalization(n[bin_idx], q[bin_idx], p_l, p_r);
            PowerLawSegment {
                p_l,
                p_r,
                g_l,
                g_r,
                f_l,
                f_r: compute_right_edge_value(f_l, q[bin_idx], p_l, p_r),
                q: q[bin_idx],
                valid: n[bin_idx] > 0.0,
            }
        })
        .collect()
}

/// Computes the moments a set of power-law segments would have.
pub fn moments_of_segments(segments: &[PowerLawSegment], mass: fcr, c: fcr) -> BinMoments {
    BinMoments::new(
        segments.iter().map(PowerLawSegment::number_density).collect::<Array1<_>>(),
        segments
            .iter()
            .map(|segment| segment.energy_density(mass, c))
            .collect::<Array1<_>>(),
    )
}

/// Boundary interpolator returning fixed ratios and recording its calls.
#[derive(Debug)]
pub struct FixedBoundaryInterpolator {
    pub ratios: BoundaryRatios,
    pub converged: bool,
    pub f_per_e_small: fcr,
    pub calls: Mutex<Vec<(BoundaryEdge, fcr, fcr)>>,
}

impl FixedBoundaryInterpolator {
    pub fn new(momentum_ratio: fcr, distribution_ratio: fcr, converged: bool) -> Self {
        Self {
            ratios: BoundaryRatios {
                momentum_ratio,
                distribution_ratio,
            },
            converged,
            f_per_e_small: 10.0,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl BoundaryInterpolator for FixedBoundaryInterpolator {
    fn interpolated_ratios(
        &self,
        edge: BoundaryEdge,
        moment_ratio: fcr,
        number_density: fcr,
    ) -> (BoundaryRatios, bool) {
        self.calls
            .lock()
            .unwrap()
            .push((edge, moment_ratio, number_density));
        (self.ratios, self.converged)
    }

    fn e_small_to_f(&self, e_small: fcr, p: fcr) -> fcr {
        self.f_per_e_small * e_small / p
    }
}
