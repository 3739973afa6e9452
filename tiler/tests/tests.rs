#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use float_cmp::approx_eq;
    use itertools::Itertools;
    use rand::prelude::SmallRng;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    use nanofiche::collision_detection::ReserveSet;
    use nanofiche::entities::{
        Bin, Corner, Envelope, EnvelopeConfig, EnvelopeShape, Instance, Item, ReserveAnchor,
        ReserveShape, ReserveSize, ReserveZone,
    };
    use nanofiche::geometry::geo_traits::CollidesWith;
    use nanofiche::util::assertions;
    use nanofiche::{OversizedItem, PackError};
    use tiler::config::{SearchConfig, TilerConfig};
    use tiler::opt::grid::GridPlacer;
    use tiler::opt::orchestrator::PackingOrchestrator;
    use tiler::opt::size_search::EnvelopeSizeOptimizer;
    use tiler::opt::spiral::SpiralPlacer;
    use tiler::opt::{PlacementMode, Placer};

    fn init_logger() {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .is_test(true)
            .try_init();
    }

    fn items(n: usize, width: u32, height: u32) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(i, format!("scan-{i}.tif"), width, height))
            .collect()
    }

    fn instance(
        bin: (u32, u32),
        n: usize,
        envelope: EnvelopeConfig,
        reserves: Vec<ReserveZone>,
    ) -> Instance {
        let bin = Bin::try_new(bin.0, bin.1).unwrap();
        Instance::new(bin, items(n, bin.width, bin.height), envelope, reserves)
    }

    fn positions(result: &nanofiche::entities::PackingResult) -> Vec<(u32, u32)> {
        result.tiles().iter().map(|t| (t.x, t.y)).collect()
    }

    #[test]
    fn four_items_fill_a_square() {
        init_logger();
        let instance = instance(
            (100, 100),
            4,
            EnvelopeConfig::optimal(EnvelopeShape::Square, 1.0),
            vec![],
        );
        let result = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap();

        assert_eq!((result.envelope().width, result.envelope().height), (200, 200));
        assert_eq!(positions(&result), [(0, 0), (100, 0), (0, 100), (100, 100)]);
        assert_eq!(result.unplaced(), 0);
        assert!(approx_eq!(f64, result.efficiency(), 1.0, epsilon = 1e-9));

        let grid = result.grid().unwrap();
        assert_eq!((grid.cols, grid.rows), (2, 2));
        assert_eq!(grid.col_boundaries().collect_vec(), [0, 100, 200]);
    }

    #[test]
    fn partial_last_row_moves_to_the_bottom() {
        init_logger();
        let instance = instance(
            (100, 100),
            9,
            EnvelopeConfig::optimal(EnvelopeShape::Rectangle, 2.0),
            vec![],
        );
        let result = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap();

        assert_eq!((result.envelope().width, result.envelope().height), (500, 250));
        assert_eq!(result.tiles().len(), 9);
        assert!(approx_eq!(f64, result.efficiency(), 0.72, epsilon = 1e-9));

        let expected = (0..5)
            .map(|c| (c * 100, 0))
            .chain((1..5).map(|c| (c * 100, 150)))
            .collect_vec();
        assert_eq!(positions(&result), expected);
        assert!(assertions::tiles_in_raster_order(result.tiles()));
    }

    #[test]
    fn bottom_row_pass_can_be_disabled() {
        let instance = instance(
            (100, 100),
            9,
            EnvelopeConfig::fixed(EnvelopeShape::Rectangle, 500, 250),
            vec![],
        );
        let config = TilerConfig {
            bottom_row_pass: false,
            ..TilerConfig::default()
        };
        let result = PackingOrchestrator::new(config).pack(&instance).unwrap();
        assert_eq!(result.tiles()[8].x, 300);
        assert_eq!(result.tiles()[8].y, 100);
    }

    #[test]
    fn tiles_avoid_a_large_central_circle() {
        init_logger();
        let reserve = ReserveZone::new(
            ReserveShape::Circle,
            ReserveAnchor::Center,
            ReserveSize::Pixels(1000),
        );
        let instance = instance(
            (50, 50),
            1000,
            EnvelopeConfig::fixed(EnvelopeShape::Square, 2000, 2000),
            vec![reserve],
        );
        let result = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap();

        assert_eq!(result.tiles().len(), 1000);
        assert!(assertions::result_is_consistent(&result));
        for tile in result.tiles() {
            let r = tile.rect();
            let nearest_x = f64::clamp(1000.0, r.x_min, r.x_max);
            let nearest_y = f64::clamp(1000.0, r.y_min, r.y_max);
            let d = ((nearest_x - 1000.0).powi(2) + (nearest_y - 1000.0).powi(2)).sqrt();
            assert!(d >= 500.0, "tile #{} reaches into the reserve", tile.seq);
        }
    }

    #[test]
    fn oversized_items_are_all_reported() {
        let bin = Bin::try_new(100, 100).unwrap();
        let items = vec![
            Item::new(0, "scan-0.tif", 100, 100),
            Item::new(1, "scan-1.tif", 80, 90),
            Item::new(2, "scan-2.tif", 200, 50),
            Item::new(3, "scan-3.tif", 100, 101),
        ];
        let instance = Instance::new(
            bin,
            items,
            EnvelopeConfig::optimal(EnvelopeShape::Square, 1.0),
            vec![],
        );
        let err = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap_err();

        assert_eq!(
            err,
            PackError::OversizedItems(vec![
                OversizedItem {
                    seq: 2,
                    source: "scan-2.tif".into(),
                    width: 200,
                    height: 50
                },
                OversizedItem {
                    seq: 3,
                    source: "scan-3.tif".into(),
                    width: 100,
                    height: 101
                },
            ])
        );
    }

    #[test_case(vec![]; "no items")]
    #[test_case(vec![Item::new(0, "a.tif", 0, 10)]; "empty item")]
    #[test_case(vec![Item::new(1, "a.tif", 10, 10), Item::new(1, "b.tif", 10, 10)]; "repeated sequence index")]
    #[test_case(vec![Item::new(3, "a.tif", 10, 10), Item::new(2, "b.tif", 10, 10)]; "decreasing sequence index")]
    fn invalid_items_are_rejected(items: Vec<Item>) {
        let instance = Instance::new(
            Bin::try_new(10, 10).unwrap(),
            items,
            EnvelopeConfig::optimal(EnvelopeShape::Circle, 1.0),
            vec![],
        );
        let result = PackingOrchestrator::new(TilerConfig::default()).pack(&instance);
        assert!(matches!(result, Err(PackError::InvalidItems(_))), "{result:?}");
    }

    #[test]
    fn fixed_envelope_without_room() {
        let instance = instance(
            (100, 100),
            5,
            EnvelopeConfig::fixed(EnvelopeShape::Square, 200, 200),
            vec![],
        );
        let err = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap_err();
        assert_eq!(
            err,
            PackError::InsufficientSpace {
                shape: EnvelopeShape::Square,
                width: 200,
                height: 200,
                placed: 4,
                required: 5
            }
        );
    }

    #[test]
    fn fixed_envelope_with_oversized_reserve() {
        let reserve = ReserveZone::new(
            ReserveShape::Square,
            ReserveAnchor::Corner(Corner::TopLeft),
            ReserveSize::Pixels(500),
        );
        let instance = instance(
            (100, 100),
            4,
            EnvelopeConfig::fixed(EnvelopeShape::Square, 400, 400),
            vec![reserve],
        );
        let result = PackingOrchestrator::new(TilerConfig::default()).pack(&instance);
        assert!(matches!(
            result,
            Err(PackError::InvalidReserveConfiguration(_))
        ));
    }

    #[test]
    fn reserved_corner_pushes_first_tile_right() {
        init_logger();
        let reserve = ReserveZone::new(
            ReserveShape::Square,
            ReserveAnchor::Corner(Corner::TopLeft),
            ReserveSize::Pixels(100),
        );
        let instance = instance(
            (100, 100),
            4,
            EnvelopeConfig::optimal(EnvelopeShape::Square, 1.0),
            vec![reserve],
        );
        let result = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap();

        assert_eq!(result.envelope().width, 300);
        assert_eq!(positions(&result), [(100, 0), (200, 0), (0, 100), (100, 100)]);
    }

    #[test]
    fn no_growth_means_insufficient_space() {
        let reserve = ReserveZone::new(
            ReserveShape::Square,
            ReserveAnchor::Corner(Corner::TopLeft),
            ReserveSize::Pixels(100),
        );
        let instance = instance(
            (100, 100),
            4,
            EnvelopeConfig::optimal(EnvelopeShape::Square, 1.0),
            vec![reserve],
        );
        let mut config = TilerConfig::default();
        config.search.max_upper_bound_expansions = 0;

        let err = PackingOrchestrator::new(config).pack(&instance).unwrap_err();
        assert_eq!(
            err,
            PackError::InsufficientSpace {
                shape: EnvelopeShape::Square,
                width: 200,
                height: 200,
                placed: 3,
                required: 4
            }
        );
    }

    #[test]
    fn search_gives_up_after_max_iterations() {
        let instance = instance(
            (100, 100),
            5,
            EnvelopeConfig::optimal(EnvelopeShape::Square, 1.0),
            vec![],
        );
        let mut config = TilerConfig::default();
        config.search.max_iterations = 1;

        let err = PackingOrchestrator::new(config).pack(&instance).unwrap_err();
        assert_eq!(
            err,
            PackError::SearchNonConvergence {
                iterations: 1,
                lower: 262,
                upper: 300
            }
        );
    }

    #[test]
    fn cancelled_search_keeps_a_feasible_size() {
        init_logger();
        let instance = instance(
            (100, 100),
            5,
            EnvelopeConfig::optimal(EnvelopeShape::Square, 1.0),
            vec![],
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let orchestrator = PackingOrchestrator::new(TilerConfig::default())
            .with_cancellation_checker(move || {
                counter.fetch_add(1, Ordering::Relaxed);
                true
            });

        let plan = orchestrator.plan(&instance).unwrap();
        let report = plan.search_report().unwrap();
        assert!(report.interrupted);
        assert!(calls.load(Ordering::Relaxed) > 0);
        assert_eq!(plan.envelope().width, 300);
        assert_eq!(plan.n_tiles(), 5);

        let result = plan.into_result();
        assert!(assertions::result_is_consistent(&result));
    }

    #[test]
    fn spiral_starts_at_the_center() {
        init_logger();
        let instance = instance(
            (100, 100),
            20,
            EnvelopeConfig::optimal(EnvelopeShape::Circle, 1.0),
            vec![],
        );
        let result = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap();

        assert_eq!(result.tiles().len(), 20);
        assert!(result.grid().is_none());
        assert!(assertions::result_is_consistent(&result));

        let center = result.envelope().center();
        let first = result.tiles()[0].rect();
        assert!(first.collides_with(&center));

        //the first tiles stay closer to the center than the last ones
        let dist = |i: usize| {
            let c = nanofiche::geometry::geo_traits::Shape::centroid(&result.tiles()[i].rect());
            c.sq_distance_to(&center)
        };
        assert!(dist(0) < dist(19));
    }

    #[test]
    fn ellipse_with_percentage_reserve() {
        init_logger();
        let reserve = ReserveZone::new(
            ReserveShape::Circle,
            ReserveAnchor::Center,
            ReserveSize::Percentage(20.0),
        );
        let instance = instance(
            (60, 40),
            40,
            EnvelopeConfig::optimal(EnvelopeShape::Ellipse, 1.5),
            vec![reserve],
        );
        let orchestrator = PackingOrchestrator::new(TilerConfig::default());
        let plan = orchestrator.plan(&instance).unwrap();
        assert_eq!(plan.reserves().len(), 1);

        let result = plan.into_result();
        assert_eq!(result.tiles().len(), 40);
        assert_eq!(result.envelope().height, (result.envelope().width as f64 / 1.5) as u32);
        assert!(assertions::result_is_consistent(&result));
    }

    #[test]
    fn packing_is_idempotent() {
        let reserve = ReserveZone::new(
            ReserveShape::Rectangle { aspect: 0.6 },
            ReserveAnchor::Corner(Corner::BottomRight),
            ReserveSize::Percentage(25.0),
        );
        let instance = instance(
            (30, 45),
            137,
            EnvelopeConfig::optimal(EnvelopeShape::Rectangle, 1.3),
            vec![reserve],
        );
        let orchestrator = PackingOrchestrator::new(TilerConfig::default());
        let first = orchestrator.pack(&instance).unwrap();
        let second = orchestrator.pack(&instance).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parallel_and_sequential_rows_agree() {
        let instance = instance(
            (10, 10),
            2500,
            EnvelopeConfig::optimal(EnvelopeShape::Square, 1.0),
            vec![ReserveZone::new(
                ReserveShape::Circle,
                ReserveAnchor::Center,
                ReserveSize::Percentage(30.0),
            )],
        );
        let parallel = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap();
        let sequential = PackingOrchestrator::new(TilerConfig {
            parallel_rows: false,
            ..TilerConfig::default()
        })
        .pack(&instance)
        .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test_case(EnvelopeShape::Square; "square")]
    #[test_case(EnvelopeShape::Circle; "circle")]
    fn plan_streams_tiles_in_batches(shape: EnvelopeShape) {
        let instance = instance((20, 20), 100, EnvelopeConfig::optimal(shape, 1.0), vec![]);
        let orchestrator = PackingOrchestrator::new(TilerConfig::default());
        let plan = orchestrator.plan(&instance).unwrap();

        let tiles = plan.tiles().collect_vec();
        assert_eq!(tiles.len(), 100);
        //every iteration starts over
        assert_eq!(plan.tiles().collect_vec(), tiles);

        let batches = plan.batches(7).collect_vec();
        assert_eq!(batches.len(), 15);
        assert!(batches[..14].iter().all(|b| b.len() == 7));
        assert_eq!(batches[14].len(), 2);
        assert_eq!(batches.concat(), tiles);

        assert_eq!(plan.rendered_bytes(3), 100 * 400 * 3);
        assert_eq!(orchestrator.pack(&instance).unwrap().tiles(), &tiles[..]);
    }

    #[test]
    fn large_layouts_require_batching() {
        let instance = instance(
            (100, 100),
            10,
            EnvelopeConfig::optimal(EnvelopeShape::Square, 1.0),
            vec![],
        );
        let orchestrator = PackingOrchestrator::new(TilerConfig::default());
        let plan = orchestrator.plan(&instance).unwrap();

        let mut batching = orchestrator.config().batching;
        assert!(!plan.requires_batching(&batching));
        batching.memory_threshold_bytes = 99_999;
        assert!(plan.requires_batching(&batching));
    }

    fn random_reserves(rng: &mut SmallRng, bin: Bin) -> Vec<ReserveZone> {
        let corner = ReserveZone::new(
            ReserveShape::Square,
            ReserveAnchor::Corner(Corner::TopLeft),
            ReserveSize::Pixels(rng.random_range(1..=2 * bin.min_dim())),
        );
        let center = ReserveZone::new(
            ReserveShape::Circle,
            ReserveAnchor::Center,
            ReserveSize::Percentage(rng.random_range(5.0..25.0)),
        );
        match rng.random_range(0..4) {
            0 => vec![],
            1 => vec![corner],
            2 => vec![center],
            _ => vec![corner, center],
        }
    }

    #[test]
    fn random_instances_yield_valid_layouts() {
        init_logger();
        let mut rng = SmallRng::seed_from_u64(0);
        let shapes = [
            EnvelopeShape::Square,
            EnvelopeShape::Rectangle,
            EnvelopeShape::Circle,
            EnvelopeShape::Ellipse,
        ];
        let orchestrator = PackingOrchestrator::new(TilerConfig::default());

        for _ in 0..40 {
            let bin = Bin::try_new(rng.random_range(20..120), rng.random_range(20..120)).unwrap();
            let n = rng.random_range(1..150);
            let shape = shapes[rng.random_range(0..shapes.len())];
            let ratio = rng.random_range(0.5..2.5);
            let reserves = random_reserves(&mut rng, bin);
            let instance = Instance::new(
                bin,
                items(n, bin.width, bin.height),
                EnvelopeConfig::optimal(shape, ratio),
                reserves,
            );

            let result = orchestrator.pack(&instance).unwrap();
            assert_eq!(result.tiles().len(), n);
            assert!(assertions::tiles_are_disjoint(result.tiles()));
            assert!(assertions::tiles_are_contained(result.tiles(), result.envelope()));
            assert!(assertions::tiles_avoid_reserves(result.tiles(), result.reserves()));
            assert!(assertions::tiles_are_ordered(result.tiles()));
            if shape.is_grid() {
                assert!(assertions::tiles_in_raster_order(result.tiles()));
            }
        }
    }

    /// Whether `n` bins fit the envelope of the given size, the way the size search decides it
    fn size_fits(
        placer: &impl Placer,
        shape: EnvelopeShape,
        ratio: f64,
        zones: &[ReserveZone],
        n: usize,
        size: u32,
    ) -> bool {
        let Ok(envelope) = Envelope::from_size(shape, size, ratio) else {
            return false;
        };
        let Ok(reserves) = ReserveSet::resolve(zones, &envelope) else {
            return false;
        };
        placer
            .place(&envelope, &reserves, n, PlacementMode::CapacityCheck)
            .fits(n)
    }

    #[test]
    fn grid_feasibility_is_monotonic() {
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..20 {
            let bin = Bin::try_new(rng.random_range(10..60), rng.random_range(10..60)).unwrap();
            let n = rng.random_range(1..80);
            let shape = match rng.random_bool(0.5) {
                true => EnvelopeShape::Square,
                false => EnvelopeShape::Rectangle,
            };
            let ratio = rng.random_range(0.5..2.0);
            //a reserve no larger than a single cell only ever blocks the first cell
            let zones = match rng.random_bool(0.5) {
                true => vec![ReserveZone::new(
                    ReserveShape::Rectangle { aspect: 1.0 },
                    ReserveAnchor::Corner(Corner::TopLeft),
                    ReserveSize::Pixels(rng.random_range(1..=bin.min_dim())),
                )],
                false => vec![],
            };
            let placer = GridPlacer {
                bin,
                bottom_row_pass: true,
                parallel_rows: false,
            };

            let feasible = |size: u32| size_fits(&placer, shape, ratio, &zones, n, size);

            let first = (1..5000).find(|&s| feasible(s)).unwrap();
            for size in first..first + 300 {
                assert!(feasible(size), "size {size} infeasible after {first} fits");
            }
        }
    }

    #[test]
    fn spiral_feasibility_is_monotonic_in_steps_of_two() {
        //growing the size by two moves the center by a whole pixel, so the whole lattice shifts along.
        //ratio 0.5 keeps the height an exact multiple of the width
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..20 {
            let bin = Bin::try_new(rng.random_range(10..60), rng.random_range(10..60)).unwrap();
            let n = rng.random_range(1..80);
            let (shape, ratio) = match rng.random_bool(0.5) {
                true => (EnvelopeShape::Circle, 1.0),
                false => (EnvelopeShape::Ellipse, 0.5),
            };
            let placer = SpiralPlacer { bin };
            let feasible = |size: u32| size_fits(&placer, shape, ratio, &[], n, size);

            let first = (1..5000).find(|&s| feasible(s)).unwrap();
            for size in first..first + 200 {
                if feasible(size) {
                    assert!(feasible(size + 2), "size {size} fits but {} does not", size + 2);
                }
            }
        }
    }

    #[test_case(EnvelopeShape::Circle, 1.0, (100, 100), 12, 510; "circle_12")]
    #[test_case(EnvelopeShape::Circle, 1.0, (100, 100), 13, 510; "circle_13")]
    #[test_case(EnvelopeShape::Circle, 1.0, (50, 70), 5, 216; "circle_tall_bin")]
    #[test_case(EnvelopeShape::Ellipse, 1.5, (30, 20), 13, 154; "ellipse_small_bin")]
    #[test_case(EnvelopeShape::Ellipse, 1.5, (50, 70), 45, 633; "ellipse_tall_bin")]
    fn spiral_search_finds_size_below_a_gap(
        shape: EnvelopeShape,
        ratio: f64,
        bin: (u32, u32),
        n: usize,
        expected: u32,
    ) {
        init_logger();
        let bin = Bin::try_new(bin.0, bin.1).unwrap();
        let placer = SpiralPlacer { bin };
        let outcome = EnvelopeSizeOptimizer::new(&placer, shape, ratio, bin, &[], SearchConfig::default())
            .find_minimal_envelope(n)
            .unwrap();
        assert_eq!(outcome.envelope.width, expected);
        assert!(!outcome.report.interrupted);
        assert!(outcome.report.bisection_result >= expected);
        assert!(size_fits(&placer, shape, ratio, &[], n, expected));
        assert!(!size_fits(&placer, shape, ratio, &[], n, expected - 1));
    }

    #[test]
    fn spiral_search_matches_a_linear_scan() {
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..40 {
            let bin = Bin::try_new(rng.random_range(10..60), rng.random_range(10..60)).unwrap();
            let n = rng.random_range(1..40);
            let (shape, ratio) = match rng.random_bool(0.5) {
                true => (EnvelopeShape::Circle, 1.0),
                false => (EnvelopeShape::Ellipse, rng.random_range(0.5..2.0)),
            };
            let placer = SpiralPlacer { bin };

            let scanned = (1..5000)
                .find(|&s| size_fits(&placer, shape, ratio, &[], n, s))
                .unwrap();
            let outcome = EnvelopeSizeOptimizer::new(&placer, shape, ratio, bin, &[], SearchConfig::default())
                .find_minimal_envelope(n)
                .unwrap();
            assert_eq!(
                outcome.envelope.width, scanned,
                "{shape:?} (ratio {ratio}) with {n} bins of {}x{}",
                bin.width, bin.height
            );
        }
    }

    #[test_case("../assets/fiche_circle.json"; "circle")]
    #[test_case("../assets/fiche_rectangle.json"; "rectangle")]
    #[test_case("../assets/fiche_ellipse_fixed.json"; "ellipse_fixed")]
    fn test_instance(instance_path: &str) {
        init_logger();
        let ext_instance = tiler::io::read_instance(Path::new(instance_path)).unwrap();
        let instance = nanofiche::io::import(&ext_instance).unwrap();

        let result = PackingOrchestrator::new(TilerConfig::default())
            .pack(&instance)
            .unwrap();
        assert!(assertions::result_is_consistent(&result));

        let solution = nanofiche::io::export(&instance, &result, *tiler::EPOCH);
        assert_eq!(solution.tiles.len(), ext_instance.items.len());
        assert_eq!(solution.unplaced, 0);
        assert!(solution.tiles.iter().all(|t| !t.source.is_empty()));
    }
}
