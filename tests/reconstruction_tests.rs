mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use common::FixedBoundaryInterpolator;
use crspectrum::{
    io::Verbosity,
    species::ParticleSpecies,
    spectrum::{
        boundary::{BoundaryEdge, BoundaryInterpolator},
        config::SpectrumReconstructionConfig,
        detection::BinMoments,
        engine::{CellContext, ReconstructionEngine},
        fcr,
        power_law::{PiecewiseSpectrum, ReconstructedSpectrum},
        SlopeSolvingMode,
    },
};
use ndarray::Array1;

const N_BINS: usize = 45;

fn engine_with(config: SpectrumReconstructionConfig) -> ReconstructionEngine {
    ReconstructionEngine::new(config, Verbosity::Quiet)
}

fn engine_for_mode(slope_mode: SlopeSolvingMode) -> ReconstructionEngine {
    engine_with(SpectrumReconstructionConfig {
        slope_mode,
        ..SpectrumReconstructionConfig::default()
    })
}

fn true_slopes() -> Vec<fcr> {
    (0..N_BINS).map(|idx| 4.3 + 0.05 * ((idx % 10) as fcr)).collect()
}

fn true_number_densities() -> Vec<fcr> {
    (0..N_BINS)
        .map(|idx| fcr::powf(10.0, -(idx as fcr) / 10.0))
        .collect()
}

fn reconstruct(engine: &ReconstructionEngine, moments: &BinMoments) -> PiecewiseSpectrum {
    match engine.reconstruct_spectrum(&CellContext::new(0.0), moments, None) {
        ReconstructedSpectrum::Piecewise(spectrum) => spectrum,
        ReconstructedSpectrum::Empty => panic!("Spectrum unexpectedly empty"),
    }
}

#[test]
fn uniform_moments_give_full_range_of_bounded_slopes_in_all_modes() {
    for &mode in &[
        SlopeSolvingMode::RootFinding,
        SlopeSolvingMode::BinTable,
        SlopeSolvingMode::RatioTable,
    ] {
        let engine = engine_for_mode(mode);
        let moments = BinMoments::new(Array1::ones(N_BINS), Array1::ones(N_BINS));
        let spectrum = reconstruct(&engine, &moments);
        assert_eq!(spectrum.first_bin_idx(), 0);
        assert_eq!(spectrum.last_bin_idx(), N_BINS - 1);
        assert_eq!(spectrum.segments().len(), N_BINS);
        for segment in spectrum.segments() {
            assert!(segment.q.is_finite() && fcr::abs(segment.q) <= 20.0);
            assert!(segment.f_l.is_finite() && segment.f_r.is_finite());
        }
        // The mean energy in the lowest bin lies far above what any slope allows
        assert!(!spectrum.segment(0).unwrap().valid);
    }
}

#[test]
fn unconverged_slopes_are_marked_invalid() {
    let engine = engine_for_mode(SlopeSolvingMode::RootFinding);
    let q_big = engine.config().q_big;
    let moments = BinMoments::new(Array1::ones(N_BINS), Array1::ones(N_BINS));
    let spectrum = reconstruct(&engine, &moments);
    for segment in spectrum.segments() {
        if fcr::abs(segment.q) == q_big {
            assert!(!segment.valid);
        }
    }
    let first = spectrum.segment(0).unwrap();
    assert_eq!(first.q, -q_big);
    assert!(!first.valid);
    assert_eq!(engine.solve_slope(0, moments.moment_ratio(0, engine.grid())), (-q_big, false));
}

#[test]
fn cells_without_enough_particles_give_empty_spectra() {
    let engine = engine_for_mode(SlopeSolvingMode::RootFinding);
    let context = CellContext::new(1.0);

    let empty = BinMoments::zeros(N_BINS);
    assert!(engine.reconstruct_spectrum(&context, &empty, None).is_empty());

    let segments = common::segments_on_grid(engine.grid(), &true_slopes(), &true_number_densities());
    let known = common::moments_of_segments(&segments, 0.0, 1.0);
    let mut n = Array1::zeros(N_BINS);
    let mut e = Array1::zeros(N_BINS);
    n[12] = known.number_density(12);
    e[12] = known.energy_density(12);
    let single = BinMoments::new(n.clone(), e.clone());
    assert!(engine.reconstruct_spectrum(&context, &single, None).is_empty());

    n[30] = known.number_density(30);
    e[30] = known.energy_density(30);
    let pair = BinMoments::new(n, e);
    let spectrum = reconstruct(&engine, &pair);
    assert_eq!(spectrum.first_bin_idx(), 0);
    assert_eq!(spectrum.last_bin_idx(), N_BINS - 1);
    let degenerate = spectrum.segment(20).unwrap();
    assert!(!degenerate.valid);
    assert_eq!((degenerate.f_l, degenerate.q), (0.0, 0.0));
    assert!(spectrum.segment(12).unwrap().valid);
    assert!(spectrum.segment(30).unwrap().valid);
}

#[test]
fn root_finding_recovers_slopes_and_moments_of_known_spectrum() {
    let engine = engine_for_mode(SlopeSolvingMode::RootFinding);
    let grid = engine.grid();
    let segments = common::segments_on_grid(grid, &true_slopes(), &true_number_densities());
    let moments = common::moments_of_segments(&segments, 0.0, 1.0);

    let spectrum = reconstruct(&engine, &moments);
    for (segment, &true_q) in spectrum.segments().iter().zip(true_slopes().iter()) {
        assert_abs_diff_eq!(segment.q, true_q, epsilon = 1e-6);
        assert!(segment.valid);
    }
    for (n, &true_n) in spectrum
        .number_densities()
        .iter()
        .zip(moments.number_densities().iter())
    {
        assert_relative_eq!(*n, true_n, max_relative = 1e-9);
    }
    for (e, &true_e) in spectrum
        .energy_densities(0.0, 1.0)
        .iter()
        .zip(moments.energy_densities().iter())
    {
        assert_relative_eq!(*e, true_e, max_relative = 1e-4);
    }
}

#[test]
fn bin_table_recovers_slopes_of_known_spectrum() {
    let engine = engine_for_mode(SlopeSolvingMode::BinTable);
    let grid = engine.grid();
    let segments = common::segments_on_grid(grid, &true_slopes(), &true_number_densities());
    let moments = common::moments_of_segments(&segments, 0.0, 1.0);

    let spectrum = reconstruct(&engine, &moments);
    for (segment, &true_q) in spectrum.segments().iter().zip(true_slopes().iter()) {
        assert_abs_diff_eq!(segment.q, true_q, epsilon = 5e-3);
        assert!(segment.valid);
    }
}

#[test]
fn ratio_table_recovers_slopes_of_interior_bins() {
    let engine = engine_for_mode(SlopeSolvingMode::RatioTable);
    let grid = engine.grid();
    let slopes = true_slopes();
    let segments = common::segments_on_grid(grid, &slopes, &true_number_densities());
    let moments = common::moments_of_segments(&segments, 0.0, 1.0);

    let spectrum = reconstruct(&engine, &moments);
    for bin_idx in 1..N_BINS - 1 {
        assert_abs_diff_eq!(
            spectrum.segment(bin_idx).unwrap().q,
            slopes[bin_idx],
            epsilon = 1e-3
        );
    }
}

#[test]
fn number_densities_are_preserved_for_massive_particles() {
    let engine = engine_with(SpectrumReconstructionConfig {
        slope_mode: SlopeSolvingMode::RootFinding,
        species: Some(ParticleSpecies::Proton),
        ..SpectrumReconstructionConfig::default()
    });
    let grid = engine.grid();
    assert_eq!(grid.mass(), 1.0);
    let segments = common::segments_on_grid(grid, &true_slopes(), &true_number_densities());
    let moments = common::moments_of_segments(&segments, grid.mass(), grid.c());

    let spectrum = reconstruct(&engine, &moments);
    for (n, &true_n) in spectrum
        .number_densities()
        .iter()
        .zip(moments.number_densities().iter())
    {
        assert_relative_eq!(*n, true_n, max_relative = 1e-9);
    }
    assert!(spectrum
        .slopes()
        .iter()
        .all(|&q| q.is_finite() && fcr::abs(q) <= 20.0));
}

#[test]
fn converged_boundary_interpolation_moves_cutoffs() {
    let engine = engine_with(SpectrumReconstructionConfig {
        slope_mode: SlopeSolvingMode::RootFinding,
        interpolate_cutoffs: true,
        ..SpectrumReconstructionConfig::default()
    });
    let grid = engine.grid();
    let edges = grid.edges();
    let e_small = engine.config().e_small;
    let boundary = FixedBoundaryInterpolator::new(2.0, 0.5, true);

    let moments = BinMoments::new(Array1::ones(N_BINS), Array1::ones(N_BINS));
    let spectrum = engine.reconstruct_spectrum(
        &CellContext::new(0.0),
        &moments,
        Some(&boundary as &dyn BoundaryInterpolator),
    );
    let spectrum = spectrum.as_piecewise().unwrap();

    let first = spectrum.segment(0).unwrap();
    assert_relative_eq!(first.p_l, edges[1] / 2.0);
    assert_relative_eq!(first.f_l, 10.0 * e_small / first.p_l);
    assert_relative_eq!(first.f_r, 0.5 * first.f_l);
    assert_relative_eq!(first.q, fcr::log10(2.0) / fcr::log10(first.p_r / first.p_l));

    let last = spectrum.segment(N_BINS - 1).unwrap();
    assert_relative_eq!(last.p_r, edges[N_BINS - 1] * 2.0);
    assert_relative_eq!(last.f_r, 10.0 * e_small / last.p_r);
    assert_relative_eq!(last.f_l, last.f_r / 0.5);
    assert!(fcr::abs(last.q) <= engine.config().q_big);

    let calls = boundary.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, BoundaryEdge::Lower);
    assert_relative_eq!(calls[0].1, 1.0 / grid.edge_energies()[1]);
    assert_eq!(calls[1].0, BoundaryEdge::Upper);
    assert_relative_eq!(calls[1].1, 1.0 / grid.edge_energies()[N_BINS - 1]);
}

#[test]
fn steep_cutoff_slopes_are_clamped() {
    let engine = engine_with(SpectrumReconstructionConfig {
        slope_mode: SlopeSolvingMode::RootFinding,
        interpolate_cutoffs: true,
        ..SpectrumReconstructionConfig::default()
    });
    let q_big = engine.config().q_big;
    let boundary = FixedBoundaryInterpolator::new(2.0, 1e-30, true);
    let moments = BinMoments::new(Array1::ones(N_BINS), Array1::ones(N_BINS));
    let spectrum = engine.reconstruct_spectrum(
        &CellContext::new(0.0),
        &moments,
        Some(&boundary as &dyn BoundaryInterpolator),
    );
    let spectrum = spectrum.as_piecewise().unwrap();

    let first = spectrum.segment(0).unwrap();
    let last = spectrum.segment(N_BINS - 1).unwrap();
    // Unclamped, the edge ratio would give a slope of about 100
    assert!(-fcr::log10(first.f_r / first.f_l) / fcr::log10(first.p_r / first.p_l) > q_big);
    assert_eq!(first.q, q_big);
    assert_eq!(last.q, q_big);
}

#[test]
fn failed_boundary_interpolation_keeps_fixed_edges() {
    let engine = engine_with(SpectrumReconstructionConfig {
        slope_mode: SlopeSolvingMode::RootFinding,
        interpolate_cutoffs: true,
        ..SpectrumReconstructionConfig::default()
    });
    let boundary = FixedBoundaryInterpolator::new(2.0, 0.5, false);
    let moments = BinMoments::new(Array1::ones(N_BINS), Array1::ones(N_BINS));
    let spectrum = engine.reconstruct_spectrum(
        &CellContext::new(0.0),
        &moments,
        Some(&boundary as &dyn BoundaryInterpolator),
    );
    let spectrum = spectrum.as_piecewise().unwrap();
    assert_eq!(spectrum.lower_cutoff(), engine.grid().edges()[0]);
    assert_eq!(spectrum.upper_cutoff(), engine.grid().edges()[N_BINS]);
    assert_relative_eq!(
        spectrum.segment(0).unwrap().f_l,
        10.0 * engine.config().e_small / spectrum.lower_cutoff()
    );
}

#[test]
fn boundary_interpolator_is_ignored_unless_enabled() {
    let engine = engine_for_mode(SlopeSolvingMode::RootFinding);
    let boundary = FixedBoundaryInterpolator::new(2.0, 0.5, true);
    let moments = BinMoments::new(Array1::ones(N_BINS), Array1::ones(N_BINS));
    let with_boundary = engine.reconstruct_spectrum(
        &CellContext::new(0.0),
        &moments,
        Some(&boundary as &dyn BoundaryInterpolator),
    );
    let without_boundary = engine.reconstruct_spectrum(&CellContext::new(0.0), &moments, None);
    assert!(boundary.calls.lock().unwrap().is_empty());
    assert_eq!(with_boundary, without_boundary);
}

#[test]
fn parallel_reconstruction_matches_serial_and_writes_diagnostics() {
    let test = common::Test::new();
    let diagnostics_file = test.output_path("crs.dat");
    let engine = ReconstructionEngine::new(
        SpectrumReconstructionConfig {
            slope_mode: SlopeSolvingMode::BinTable,
            diagnostics_file: diagnostics_file.clone(),
            ..SpectrumReconstructionConfig::default()
        },
        Verbosity::Diagnostics,
    );
    engine.diagnostics_log().clear().unwrap();

    let grid = engine.grid();
    let segments = common::segments_on_grid(grid, &true_slopes(), &true_number_densities());
    let cells = vec![
        (
            CellContext::new(0.0),
            common::moments_of_segments(&segments, 0.0, 1.0),
        ),
        (CellContext::new(1.0), BinMoments::zeros(N_BINS)),
        (
            CellContext::with_location(2.0, [0.1, 0.2, 0.3]),
            BinMoments::new(Array1::ones(N_BINS), Array1::ones(N_BINS)),
        ),
    ];
    let spectra = engine.reconstruct_spectra(&cells, None);
    assert_eq!(spectra.len(), 3);
    assert!(spectra[1].is_empty());

    let quiet_engine = engine_for_mode(SlopeSolvingMode::BinTable);
    for ((context, moments), spectrum) in cells.iter().zip(spectra.iter()) {
        assert_eq!(
            &quiet_engine.reconstruct_spectrum(context, moments, None),
            spectrum
        );
    }

    let text = common::read_file(&diagnostics_file);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        assert_eq!(
            line.split_whitespace().count(),
            5 + 2 * (N_BINS + 1) + N_BINS
        );
    }
}

#[test]
fn engine_can_be_configured_from_namelist_text() {
    let config = SpectrumReconstructionConfig::from_param_text(
        "&CRESP\n\
         ncrb = 20, ! number of bins\n\
         p_min_fix = 1.0d-1\n\
         p_max_fix = 1.0d3\n\
         slope_mode = 'root_finding'\n\
         species = 'e'\n\
         /\n",
    )
    .unwrap();
    let engine = engine_with(config);
    assert_eq!(engine.grid().n_bins(), 20);
    assert_relative_eq!(engine.grid().mass(), ParticleSpecies::Electron.mass());

    let moments = BinMoments::new(Array1::ones(20), Array1::ones(20));
    let spectrum = reconstruct(&engine, &moments);
    assert_eq!(spectrum.last_bin_idx(), 19);
}
