//! Cuboid network demonstration.
//!
//! Builds a small truss, attaches quantities, and runs one draw and one pick
//! pass through the recording backend.
//!
//! Run with: cargo run --example cuboid_network_demo

use std::f32::consts::PI;

use polyscope::*;

fn main() -> Result<()> {
    init()?;

    // A twisted beam: the up direction rotates along the line
    let beam_nodes: Vec<Vec3> = (0..20)
        .map(|i| Vec3::new(i as f32 * 0.1, 0.0, 0.0))
        .collect();
    let beam_up: Vec<Vec3> = (0..19)
        .map(|i| {
            let angle = 0.5 * PI * i as f32 / 18.0;
            Vec3::new(0.0, angle.sin(), angle.cos())
        })
        .collect();
    let beam = register_cuboid_network_line("beam", beam_nodes, beam_up)?;
    beam.set_width(0.02, true).set_height(0.005, true);
    let twist: Vec<f32> = (0..19).map(|i| i as f32 / 18.0).collect();
    beam.add_edge_scalar_quantity("twist", twist, DataType::Standard)?
        .set_quantity_enabled("twist", true)?;

    // A planar truss panel with explicit edges
    let mut panel_nodes = Vec::new();
    let mut panel_edges = Vec::new();
    for i in 0..4 {
        panel_nodes.push(Vec2::new(i as f32 * 0.5, 0.5));
        panel_nodes.push(Vec2::new(i as f32 * 0.5, 1.0));
        let bottom = 2 * i;
        panel_edges.push([bottom, bottom + 1]);
        if i > 0 {
            panel_edges.push([bottom - 2, bottom]);
            panel_edges.push([bottom - 1, bottom + 1]);
            panel_edges.push([bottom - 2, bottom + 1]);
        }
    }
    let panel = register_cuboid_network_2d("panel", &panel_nodes, panel_edges)?;
    panel.set_color(Vec3::new(0.8, 0.4, 0.2)).set_material("candy")?;
    let heights: Vec<f32> = panel_nodes.iter().map(|p| p.y).collect();
    panel
        .add_node_scalar_quantity("height", heights, DataType::Standard)?
        .add_node_vector_quantity_2d("load", &[Vec2::new(0.0, -0.1); 8], VectorType::Standard)?
        .set_quantity_enabled("load", true)?;

    with_cuboid_network("panel", |cn| {
        if let Some(scalar) = cn.quantity_mut("height").and_then(|q| q.as_scalar_mut()) {
            scalar.set_map_range((0.0, 1.5));
        }
    });

    let mut backend = HeadlessBackend::new();
    let view = ViewParameters::default();
    draw_cuboid_networks(&mut backend, &view)?;
    for event in backend.events() {
        if let BackendEvent::Draw {
            program,
            instances,
            vertices,
        } = event
        {
            println!("draw {program}: {instances} instances x {vertices} vertices");
        }
    }

    backend.clear();
    draw_pick_cuboid_networks(&mut backend, &view)?;
    if let Some(start) = with_cuboid_network_ref("beam", CuboidNetwork::pick_start).flatten() {
        // The first edge of the beam follows its 20 nodes
        if let Some(info) = pick_global_index(start + 20)? {
            println!("picked {} of '{}'", info.element, info.structure);
            for row in &info.rows {
                println!("  {}: {}", row.label, row.value);
            }
        }
    }

    shutdown();
    Ok(())
}
