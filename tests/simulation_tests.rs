#[cfg(test)]
mod tests {
    use neural_backdrop::topology::first_invalid_node;
    use neural_backdrop::*;

    fn storm(seed: u64) -> BackdropConfig {
        BackdropConfig {
            node_count: 10,
            emission_threshold: 0.0,
            emission_cooldown: 0.0,
            emission_probability: 1.0,
            packet_cap: 40,
            ..BackdropConfig::seeded(seed)
        }
    }

    fn start(config: BackdropConfig, width: u32, height: u32) -> SimulationLoop<Raster, ManualHost> {
        let mut lp = SimulationLoop::new(config, ManualHost::new()).unwrap();
        assert_eq!(lp.start(Raster::new(width, height)), LoopPhase::Running);
        lp
    }

    // ========== Construction ==========

    #[test]
    fn test_zero_nodes_on_zero_area() {
        let config = BackdropConfig {
            node_count: 0,
            ..BackdropConfig::seeded(1)
        };
        let mut lp = start(config, 0, 0);
        for _ in 0..10 {
            assert!(lp.frame().is_some(), "empty frame must not fail");
        }
        let sim = lp.simulation().unwrap();
        assert!(sim.nodes().is_empty());
        assert!(sim.packets().is_empty());
        assert_eq!(lp.stats().last_render, RenderStats::default());
        assert_eq!(lp.stats().skipped_frames, 0);
    }

    #[test]
    fn test_default_topology_is_valid_across_seeds() {
        for seed in 0..25 {
            let config = BackdropConfig::seeded(seed);
            let sim = Simulation::new(config.clone(), 1280.0, 720.0).unwrap();
            assert_eq!(sim.nodes().len(), 90);
            assert_eq!(first_invalid_node(sim.nodes(), &config), None, "seed {seed}");
            for (i, node) in sim.nodes().iter().enumerate() {
                let profile = config.profiles.get(node.node_type);
                for &to in &node.connections {
                    let d = node.position.distance(sim.nodes()[to as usize].position);
                    assert!(d < profile.max_distance, "seed {seed}: edge {i}->{to} spans {d}");
                }
            }
        }
    }

    #[test]
    fn test_distant_pair_never_connects() {
        let config = BackdropConfig {
            node_count: 2,
            primary_ratio: 1.0,
            secondary_ratio: 0.0,
            ..BackdropConfig::default()
        };
        for seed in 0..200 {
            let config = BackdropConfig {
                seed: Some(seed),
                ..config.clone()
            };
            // 10000 px wide: two nodes are almost always beyond 180 px
            let sim = Simulation::new(config, 10_000.0, 10_000.0).unwrap();
            let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
            if a.position.distance(b.position) >= 180.0 {
                assert!(a.connections.is_empty() && b.connections.is_empty(), "seed {seed}");
            }
        }
    }

    // ========== Long-run invariants ==========

    #[test]
    fn test_storm_respects_cap_and_progress() {
        let mut lp = start(storm(7), 300, 200);
        let cap = lp.config().packet_cap;
        let mut saw_full = false;
        for _ in 0..1000 {
            lp.frame();
            let sim = lp.simulation().unwrap();
            assert!(sim.packets().len() <= cap, "cap exceeded: {}", sim.packets().len());
            assert!(sim.packets().iter().all(|p| (0.0..1.0).contains(&p.progress)));
            saw_full |= sim.packets().len() == cap;
        }
        let stats = lp.stats();
        println!("Storm stats: {:?}", stats);
        assert_eq!(stats.frames, 1000);
        if lp.simulation().unwrap().edge_count() > 0 {
            assert!(saw_full, "storm never filled the pool");
            assert!(stats.dropped > 0);
            assert!(stats.delivered > 0);
        }
    }

    #[test]
    fn test_energy_and_bounds_hold_for_an_hour_of_frames() {
        let mut lp = start(BackdropConfig::seeded(21), 800, 600);
        for frame in 0..3600u64 {
            if frame % 97 == 0 {
                lp.notify_pointer(Some(Vec2::new((frame % 800) as f64, 300.0)));
            }
            lp.frame();
            let sim = lp.simulation().unwrap();
            let bounds = sim.bounds();
            for n in sim.nodes() {
                assert!((0.0..=1.0).contains(&n.energy), "energy {}", n.energy);
                assert!(bounds.contains(n.position), "node escaped to {:?}", n.position);
            }
        }
        assert_eq!(lp.stats().skipped_frames, 0);
    }

    #[test]
    fn test_cooldown_spaces_emissions() {
        let config = BackdropConfig {
            emission_threshold: 0.0,
            emission_cooldown: 0.5,
            ..BackdropConfig::seeded(5)
        };
        let mut sim = Simulation::new(config, 800.0, 600.0).unwrap();
        let mut last: Vec<Option<f64>> = vec![None; sim.nodes().len()];
        for _ in 0..500 {
            sim.tick().unwrap();
            for (i, n) in sim.nodes().iter().enumerate() {
                if n.last_activation != last[i] {
                    if let (Some(prev), Some(now)) = (last[i], n.last_activation) {
                        assert!(now - prev > 0.5 - 1e-9, "node {i} refired after {}", now - prev);
                    }
                    last[i] = n.last_activation;
                }
            }
        }
    }

    // ========== Lifecycle ==========

    #[test]
    fn test_stop_twice_is_noop() {
        let mut lp = start(BackdropConfig::seeded(2), 200, 200);
        lp.frame();
        lp.stop();
        lp.stop();
        assert_eq!(lp.phase(), LoopPhase::Stopped);
        assert_eq!(lp.host().cancelled(), 1);
        assert_eq!(lp.host().pending(), None);
        assert!(lp.frame().is_none(), "no frame may run after stop");
    }

    #[test]
    fn test_start_without_host_does_nothing() {
        let mut lp =
            SimulationLoop::<Raster, ManualHost>::new(BackdropConfig::seeded(3), ManualHost::unavailable())
                .unwrap();
        assert_eq!(lp.start(Raster::new(100, 100)), LoopPhase::Uninitialized);
        assert_eq!(lp.host().requested(), 0);
    }

    #[test]
    fn test_resize_to_zero_and_back() {
        let mut lp = start(BackdropConfig::seeded(4), 800, 600);
        lp.frame();
        lp.notify_resize(0, 0);
        assert!(lp.frame().is_some());
        assert_eq!(lp.stats().last_render, RenderStats::default());
        lp.notify_resize(400, 300);
        lp.frame();
        let sim = lp.simulation().unwrap();
        assert_eq!(sim.bounds(), Bounds::new(400.0, 300.0));
        assert!(sim.nodes().iter().all(|n| sim.bounds().contains(n.position)));
        assert_eq!(lp.stats().last_render.nodes, 90);
    }

    #[test]
    fn test_frames_paint_the_raster() {
        let mut lp = start(BackdropConfig::seeded(6), 160, 120);
        for _ in 0..30 {
            lp.frame();
        }
        let raster = lp.surface().unwrap();
        let lit = raster.pixels().chunks(4).filter(|px| px[0] > 40 || px[1] > 40 || px[2] > 40).count();
        assert!(lit > 0, "nothing visible was drawn");
        assert!(raster.pixels().chunks(4).all(|px| px[3] > 0), "background must cover every pixel");
    }

    // ========== Snapshot ==========

    #[test]
    fn test_snapshot_json_resume_matches_uninterrupted_run() {
        let config = storm(8);
        let mut original = Simulation::new(config.clone(), 300.0, 200.0).unwrap();
        for _ in 0..200 {
            original.tick().unwrap();
        }
        let json = original.to_json().unwrap();
        let mut resumed = Simulation::from_json(config, &json).unwrap();
        for _ in 0..500 {
            original.tick().unwrap();
            resumed.tick().unwrap();
        }
        assert_eq!(original.nodes(), resumed.nodes());
        assert_eq!(original.packets(), resumed.packets());
        assert_eq!(original.clock().to_bits(), resumed.clock().to_bits());
    }

    #[test]
    fn test_partial_config_json() {
        let config: BackdropConfig =
            serde_json::from_str(r#"{"node_count": 12, "resize_policy": "rebuild", "seed": 9}"#).unwrap();
        assert_eq!(config.node_count, 12);
        assert_eq!(config.resize_policy, ResizePolicy::Rebuild);
        assert_eq!(config.packet_cap, 300);
        let sim = Simulation::new(config, 500.0, 500.0).unwrap();
        assert_eq!(sim.nodes().len(), 12);
    }
}
