// End-to-end scenarios for the navmesh: build meshes from obstacles or scene
// JSON, run path queries, and check the structural guarantees that must hold
// between queries (symmetric adjacency, no leftover transient nodes, indices
// in sync with the graph) as well as the validity of returned paths.

use waymark_nav::graph::NodeOwner;
use waymark_nav::scene::Scene;
use waymark_nav::{
    NavConfig, NavMesh, NodeId, Obstacle, ObstacleId, ObstacleShape, PathOutcome, Vec2,
};

fn rect(id: u64, min: (f32, f32), max: (f32, f32)) -> Obstacle {
    Obstacle::new(
        ObstacleId(id),
        ObstacleShape::rectangle(Vec2::from(min), Vec2::from(max)),
    )
}

/// Square obstacles of side 20 every 60 units, `per_side` squared of them.
fn lattice_mesh(per_side: usize) -> NavMesh {
    let config = NavConfig {
        cell_size: 128.0,
        ..NavConfig::default()
    };
    let mut mesh = NavMesh::new(config).unwrap();
    for i in 0..per_side * per_side {
        let x = (i % per_side) as f32 * 60.0;
        let y = (i / per_side) as f32 * 60.0;
        mesh.add_obstacle(&rect(i as u64, (x, y), (x + 20.0, y + 20.0)), 5.0)
            .unwrap();
    }
    mesh
}

/// Every node with its ordered adjacency, for before/after comparisons.
fn snapshot(mesh: &NavMesh) -> Vec<(NodeId, Vec<NodeId>)> {
    mesh.graph()
        .iter()
        .map(|n| (n.id, n.neighbors.to_vec()))
        .collect()
}

fn path_length(path: &[Vec2]) -> f32 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}

fn assert_structurally_sound(mesh: &NavMesh) {
    assert!(mesh.graph().is_symmetric(1e-4), "adjacency is not symmetric");
    assert!(mesh.indices_consistent(), "spatial indices out of sync");
    assert!(
        mesh.graph().iter().all(|n| !n.is_transient()),
        "transient node left behind"
    );
}

// ---------------------------------------------------------------------------
// Single obstacle
// ---------------------------------------------------------------------------

#[test]
fn detour_around_a_square() {
    let mut mesh = NavMesh::new(NavConfig::default()).unwrap();
    mesh.add_obstacle(&rect(1, (0.0, 0.0), (100.0, 100.0)), 10.0)
        .unwrap();

    let start = Vec2::new(-50.0, -50.0);
    let end = Vec2::new(150.0, 150.0);
    let path = mesh.find_path(start, end);

    assert_eq!(path.len(), 3);
    assert_eq!(path[0], start);
    assert_eq!(path[2], end);
    // The single waypoint is one of the two off-diagonal expanded corners.
    let corner = path[1];
    let d = 10.0 * std::f32::consts::FRAC_1_SQRT_2;
    let off_diagonal = [Vec2::new(100.0 + d, -d), Vec2::new(-d, 100.0 + d)];
    assert!(
        off_diagonal.iter().any(|c| c.distance(corner) < 1e-3),
        "unexpected waypoint {corner}"
    );

    let straight = start.distance(end);
    assert!(path_length(&path) > straight + 2.0 * d);
    assert_structurally_sound(&mesh);
}

#[test]
fn start_inside_the_obstacle_has_no_path() {
    let mut mesh = NavMesh::new(NavConfig::default()).unwrap();
    mesh.add_obstacle(&rect(1, (0.0, 0.0), (100.0, 100.0)), 10.0)
        .unwrap();
    let before = snapshot(&mesh);

    assert!(mesh
        .find_path(Vec2::new(50.0, 50.0), Vec2::new(150.0, 150.0))
        .is_empty());
    assert_eq!(snapshot(&mesh), before);
}

#[test]
fn queries_leave_the_graph_untouched() {
    let mut mesh = lattice_mesh(4);
    let before = snapshot(&mesh);
    let stats = mesh.stats();

    for (start, end) in [
        ((-30.0, -30.0), (230.0, 230.0)),
        ((40.0, 40.0), (160.0, 40.0)),
        ((10.0, 10.0), (100.0, 100.0)), // start inside a square
        ((-500.0, -500.0), (500.0, 500.0)),
    ] {
        mesh.query_path(Vec2::from(start), Vec2::from(end));
        assert_eq!(snapshot(&mesh), before);
        assert_eq!(mesh.stats(), stats);
    }
    assert_structurally_sound(&mesh);
}

// ---------------------------------------------------------------------------
// Obstacle fields
// ---------------------------------------------------------------------------

#[test]
fn paths_through_a_lattice_stay_clear() {
    let mut mesh = lattice_mesh(5);
    let queries = [
        ((-30.0, -30.0), (290.0, 290.0)),
        ((-30.0, 130.0), (290.0, 150.0)),
        ((40.0, -40.0), (40.0, 300.0)),
        ((100.0, 100.0), (-20.0, 270.0)),
    ];
    for (start, end) in queries {
        let (start, end) = (Vec2::from(start), Vec2::from(end));
        let path = mesh.find_path(start, end);
        assert!(!path.is_empty(), "no path from {start} to {end}");
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        for leg in path.windows(2) {
            assert!(
                mesh.is_segment_clear(leg[0], leg[1]),
                "leg {} -> {} cuts an obstacle",
                leg[0],
                leg[1]
            );
        }
        assert!(path_length(&path) + 1e-3 >= start.distance(end));
    }
    assert_structurally_sound(&mesh);
}

#[test]
fn query_outcome_reports_length_and_expansions() {
    let mut mesh = lattice_mesh(3);
    let start = Vec2::new(-30.0, -30.0);
    let end = Vec2::new(170.0, 170.0);
    let outcome = mesh.query_path(start, end);
    let path = outcome.path().expect("lattice is open");
    assert!((path.length - path_length(&path.waypoints)).abs() < 1e-3);
    assert!(path.expansions >= 1);
    assert_eq!(mesh.find_path(start, end), path.waypoints);
}

#[test]
fn small_budget_gives_up() {
    let mut mesh = lattice_mesh(5);
    let generous = mesh.query_path(Vec2::new(-30.0, -30.0), Vec2::new(290.0, 290.0));
    assert!(generous.is_found());

    let config = NavConfig {
        cell_size: 128.0,
        max_expansions: 2,
        ..NavConfig::default()
    };
    let mut starved = NavMesh::new(config).unwrap();
    for i in 0..25 {
        let x = (i % 5) as f32 * 60.0;
        let y = (i / 5) as f32 * 60.0;
        starved
            .add_obstacle(&rect(i, (x, y), (x + 20.0, y + 20.0)), 5.0)
            .unwrap();
    }
    let outcome = starved.query_path(Vec2::new(-30.0, -30.0), Vec2::new(290.0, 290.0));
    assert_eq!(outcome, PathOutcome::BudgetExceeded { expansions: 2 });
    assert!(starved
        .find_path(Vec2::new(-30.0, -30.0), Vec2::new(290.0, 290.0))
        .is_empty());
    assert_structurally_sound(&starved);
}

// ---------------------------------------------------------------------------
// Incremental updates
// ---------------------------------------------------------------------------

#[test]
fn wall_blocks_until_removed() {
    let mut mesh = NavMesh::new(NavConfig::default()).unwrap();
    let start = Vec2::new(-100.0, 50.0);
    let end = Vec2::new(100.0, 50.0);

    assert_eq!(mesh.find_path(start, end), vec![start, end]);

    mesh.add_obstacle(&rect(1, (-5.0, -100.0), (5.0, 200.0)), 5.0)
        .unwrap();
    let around = mesh.find_path(start, end);
    assert_eq!(around.len(), 4);
    assert!(path_length(&around) > 370.0);

    assert!(mesh.remove_obstacle(ObstacleId(1)));
    assert_eq!(mesh.find_path(start, end), vec![start, end]);
    assert_eq!(mesh.stats().nodes, 0);
    assert_structurally_sound(&mesh);
}

#[test]
fn add_remove_churn_keeps_structure_sound() {
    let mut mesh = lattice_mesh(4);
    for id in [5, 6, 9, 10] {
        assert!(mesh.remove_obstacle(ObstacleId(id)));
        assert_structurally_sound(&mesh);
    }
    // The middle of the lattice is now open.
    let path = mesh.find_path(Vec2::new(50.0, 90.0), Vec2::new(150.0, 90.0));
    assert_eq!(path.len(), 2);

    mesh.add_obstacle(&rect(100, (90.0, 70.0), (110.0, 110.0)), 5.0)
        .unwrap();
    let path = mesh.find_path(Vec2::new(50.0, 90.0), Vec2::new(150.0, 90.0));
    assert!(path.len() > 2);
    for leg in path.windows(2) {
        assert!(mesh.is_segment_clear(leg[0], leg[1]));
    }
    assert_eq!(mesh.stats().obstacles, 13);
    assert_structurally_sound(&mesh);
}

#[test]
fn idempotent_and_rejected_additions() {
    let mut mesh = lattice_mesh(2);
    let before = snapshot(&mesh);
    mesh.add_obstacle(&rect(0, (0.0, 0.0), (20.0, 20.0)), 5.0)
        .unwrap();
    assert_eq!(snapshot(&mesh), before);

    let sliver = Obstacle::new(
        ObstacleId(50),
        ObstacleShape::simple(vec![Vec2::new(300.0, 0.0), Vec2::new(310.0, 0.0)]),
    );
    assert!(mesh.add_obstacle(&sliver, 5.0).is_err());
    assert_eq!(snapshot(&mesh), before);
}

// ---------------------------------------------------------------------------
// Compound bodies and scenes
// ---------------------------------------------------------------------------

#[test]
fn compound_body_is_routed_around() {
    // An L made of two rectangles, opening towards +x/+y.
    let body = Obstacle::new(
        ObstacleId(1),
        ObstacleShape::compound(vec![
            ObstacleShape::rectangle(Vec2::new(0.0, 0.0), Vec2::new(20.0, 100.0)),
            ObstacleShape::rectangle(Vec2::new(20.0, 0.0), Vec2::new(100.0, 20.0)),
        ]),
    );
    let mut mesh = NavMesh::new(NavConfig::default()).unwrap();
    mesh.add_obstacle(&body, 5.0).unwrap();
    assert_eq!(mesh.stats().polygons, 2);
    assert!(mesh.graph().iter().all(|n| matches!(
        n.owner,
        NodeOwner::Corner {
            obstacle: ObstacleId(1),
            ..
        }
    )));

    let start = Vec2::new(-40.0, -40.0);
    let end = Vec2::new(60.0, 60.0);
    let path = mesh.find_path(start, end);
    assert!(path.len() > 2);
    assert!(path_length(&path) > start.distance(end));
    assert_structurally_sound(&mesh);
}

#[test]
fn scene_file_end_to_end() {
    let scene = Scene::from_json(
        r#"{
            "config": { "cell_size": 256.0, "smooth_paths": true },
            "obstacles": [
                { "id": 1, "margin": 10.0,
                  "vertices": [[0, 0], [100, 0], [100, 100], [0, 100]] }
            ],
            "queries": [
                { "start": [-50, -50], "end": [150, 150] },
                { "start": [50, 50], "end": [150, 150] }
            ]
        }"#,
    )
    .unwrap();
    let mut mesh = scene.build().unwrap();
    let results: Vec<Vec<Vec2>> = scene
        .queries
        .iter()
        .map(|q| mesh.find_path(q.start, q.end))
        .collect();
    assert_eq!(results[0].len(), 3);
    assert!(results[1].is_empty());
    assert_structurally_sound(&mesh);
}
