//! Integration tests for the cuboid network API.
//!
//! Note: polyscope keeps its state in a process-wide context, so all tests are
//! combined into a single test function and run in sequence.

use polyscope::*;

fn square() -> Vec<Vec3> {
    vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ]
}

#[test]
fn test_cuboid_networks() {
    init().expect("init failed");
    assert!(is_initialized());
    assert!(matches!(init(), Err(PolyscopeError::AlreadyInitialized)));

    // Registration
    {
        let handle = register_cuboid_network_loop("ring", square(), vec![Vec3::Z; 4])
            .expect("register failed");
        assert_eq!(handle.name(), "ring");
        assert!(has_cuboid_network("ring"));
        assert!(get_cuboid_network("ring").is_some());
        assert!(get_cuboid_network("missing").is_none());

        let duplicate = register_cuboid_network_line("ring", square(), vec![Vec3::Z; 3]);
        assert!(matches!(duplicate, Err(PolyscopeError::StructureExists(_))));

        let counts = with_cuboid_network_ref("ring", |cn| (cn.num_nodes(), cn.num_edges()));
        assert_eq!(counts, Some((4, 4)));

        let scale = with_context(|ctx| ctx.length_scale);
        assert!(scale > 0.0);
    }

    // Bad input is reported, not fatal
    {
        register_cuboid_network("broken", square(), vec![[0, 1], [2, 9]], vec![Vec3::Z])
            .expect("register failed");
        let errors = with_cuboid_network_ref("broken", |cn| cn.configuration_errors().len());
        assert_eq!(errors, Some(2));
        remove_cuboid_network("broken", true).expect("remove failed");
        assert!(!has_cuboid_network("broken"));
        assert!(remove_cuboid_network("broken", true).is_err());
        assert!(remove_cuboid_network("broken", false).is_ok());
    }

    // Planar registration
    {
        let planar = [Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(2.0, 1.0)];
        register_cuboid_network_line_2d("planar", &planar).expect("register failed");
        let info = with_cuboid_network_ref("planar", |cn| {
            (cn.nodes()[1], cn.orientations().to_vec())
        });
        let (node, orientations) = info.expect("planar network missing");
        assert_eq!(node, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(orientations, vec![Vec3::Z; 2]);
        remove_cuboid_network("planar", true).expect("remove failed");
    }

    // Styling through the handle
    {
        let handle = get_cuboid_network("ring").expect("ring missing");
        handle
            .set_color(Vec3::new(1.0, 0.0, 0.0))
            .set_width(0.25, false)
            .set_height(0.05, false);
        assert!(handle.set_material("wax").is_ok());
        assert!(matches!(
            handle.set_material("no such material"),
            Err(PolyscopeError::UnknownMaterial(_))
        ));

        let (color, width, material) = with_cuboid_network_ref("ring", |cn| {
            (cn.color(), cn.width(), cn.material().to_string())
        })
        .expect("ring missing");
        assert_eq!(color, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(width, ScaledValue::absolute(0.25));
        assert_eq!(material, "wax");
    }

    // Quantities
    {
        let handle = get_cuboid_network("ring").expect("ring missing");
        handle
            .add_edge_scalar_quantity("stress", vec![0.0, 1.0, 2.0, 3.0], DataType::Standard)
            .expect("scalar failed");
        handle
            .add_node_color_quantity("tint", vec![Vec3::ONE; 4])
            .expect("color failed");
        handle
            .add_node_vector_quantity("flow", vec![Vec3::X; 4], VectorType::Standard)
            .expect("vector failed");

        let wrong_size = handle.add_node_scalar_quantity("short", vec![1.0], DataType::Standard);
        assert!(matches!(wrong_size, Err(PolyscopeError::SizeMismatch { .. })));

        handle.set_quantity_enabled("stress", true).expect("enable failed");
        handle.set_quantity_enabled("tint", true).expect("enable failed");
        let enabled = with_cuboid_network_ref("ring", |cn| {
            cn.quantities()
                .iter()
                .filter(|q| q.is_enabled())
                .map(|q| q.name().to_string())
                .collect::<Vec<_>>()
        })
        .expect("ring missing");
        assert_eq!(enabled, vec!["tint".to_string()]);

        assert!(handle.set_quantity_enabled("nothing", true).is_err());
    }

    // Drawing with a recording backend
    {
        let mut backend = HeadlessBackend::new();
        let view = ViewParameters::default();
        let handle = get_cuboid_network("ring").expect("ring missing");
        handle.set_quantity_enabled("flow", true).expect("enable failed");

        draw_cuboid_networks(&mut backend, &view).expect("draw failed");
        let draws = backend.draws();
        assert!(draws.contains(&"cuboid/node_color".to_string()));
        assert!(draws.contains(&"cuboid/vector_arrow".to_string()));
        assert!(!draws.contains(&"cuboid/base_color".to_string()));

        // Programs are cached between frames
        backend.clear();
        draw_cuboid_networks(&mut backend, &view).expect("draw failed");
        assert!(backend.builds().is_empty());
        assert!(!backend.draws().is_empty());

        handle.set_depth_write(false);
        backend.clear();
        draw_cuboid_networks(&mut backend, &view).expect("draw failed");
        assert_eq!(backend.build_count("cuboid/node_color/no_depth"), 1);
        handle.set_depth_write(true);

        // Disabled networks draw nothing
        handle.set_enabled(false);
        backend.clear();
        draw_cuboid_networks(&mut backend, &view).expect("draw failed");
        assert!(backend.draws().is_empty());
        handle.set_enabled(true);
    }

    // Picking
    {
        let mut backend = HeadlessBackend::new();
        let view = ViewParameters::default();
        draw_pick_cuboid_networks(&mut backend, &view).expect("pick draw failed");
        let draws = backend.draws();
        assert!(draws.contains(&"cuboid/node_pick".to_string()));
        assert!(draws.contains(&"cuboid/edge_pick".to_string()));

        let start = with_cuboid_network_ref("ring", CuboidNetwork::pick_start)
            .flatten()
            .expect("pick range not assigned");

        let node = pick_global_index(start + 2)
            .expect("pick failed")
            .expect("nothing picked");
        assert_eq!(node.structure, "ring");
        assert_eq!(node.element, CuboidPickElement::Node(2));
        assert_eq!(node.row("degree"), Some("2"));
        assert!(node.row("tint").is_some());

        let edge = pick_global_index(start + 4 + 1)
            .expect("pick failed")
            .expect("nothing picked");
        assert_eq!(edge.element, CuboidPickElement::Edge(1));
        assert_eq!(edge.row("stress"), Some("1"));

        assert!(pick_global_index(0).expect("pick failed").is_none());
        assert!(pick_global_index(start + 8).expect("pick failed").is_none());
    }

    // Persistence
    {
        let path = std::env::temp_dir().join(format!(
            "polyscope_cuboids_test_{}.json",
            std::process::id()
        ));
        let handle = get_cuboid_network("ring").expect("ring missing");
        save_persistent_cache(&path).expect("save failed");

        handle.set_width(0.5, true);
        let width = with_cuboid_network_ref("ring", CuboidNetwork::width);
        assert_eq!(width, Some(ScaledValue::relative(0.5)));

        load_persistent_cache(&path).expect("load failed");
        let width = with_cuboid_network_ref("ring", CuboidNetwork::width);
        assert_eq!(width, Some(ScaledValue::absolute(0.25)));

        // A network registered under the same name picks the values up again
        remove_cuboid_network("ring", true).expect("remove failed");
        register_cuboid_network_loop("ring", square(), vec![Vec3::Z; 4]).expect("register failed");
        let restored =
            with_cuboid_network_ref("ring", |cn| (cn.width(), cn.material().to_string()));
        assert_eq!(restored, Some((ScaledValue::absolute(0.25), "wax".to_string())));

        let _ = std::fs::remove_file(&path);
    }

    // Vector export
    {
        let handle = get_cuboid_network("ring").expect("ring missing");
        handle
            .add_edge_vector_quantity("edge flow", vec![Vec3::Y; 4], VectorType::Standard)
            .expect("vector failed");
        let path = std::env::temp_dir().join(format!(
            "polyscope_cuboids_vectors_{}.txt",
            std::process::id()
        ));
        handle.write_vector_quantity("edge flow", &path).expect("export failed");
        let text = std::fs::read_to_string(&path).expect("read failed");
        let data_lines = text.lines().filter(|l| !l.starts_with('#')).count();
        assert_eq!(data_lines, 4);
        assert!(handle.write_vector_quantity("stress", &path).is_err());

        // Relative display lengths follow the current transform
        let display_length = |path: &std::path::Path| -> f32 {
            std::fs::read_to_string(path)
                .expect("read failed")
                .lines()
                .find_map(|l| l.strip_prefix("#displaylength "))
                .expect("missing length header")
                .parse()
                .expect("bad length header")
        };
        let before = display_length(&path);
        handle
            .set_transform(Mat4::from_scale(Vec3::splat(10.0)))
            .expect("transform failed");
        handle.write_vector_quantity("edge flow", &path).expect("export failed");
        let after = display_length(&path);
        assert!((after - 10.0 * before).abs() < 1e-4 * after.max(1.0));
        handle.set_transform(Mat4::IDENTITY).expect("transform failed");
        let _ = std::fs::remove_file(&path);
    }

    // Removal and shutdown
    {
        register_cuboid_network_loop_2d("other", &[Vec2::ZERO, Vec2::X, Vec2::Y])
            .expect("register failed");
        remove_all_cuboid_networks().expect("remove failed");
        assert!(!has_cuboid_network("ring"));
        assert!(!has_cuboid_network("other"));
    }

    shutdown();
    assert!(!is_initialized());
    assert!(matches!(
        register_cuboid_network_line("late", square(), vec![Vec3::Z; 3]),
        Err(PolyscopeError::NotInitialized)
    ));
}
