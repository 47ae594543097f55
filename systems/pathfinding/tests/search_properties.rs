use hyperdrone_core::{CellCoord, CellState, MazeLayout};
use hyperdrone_system_pathfinding::{find_alternative_target, AStar, PathSearch};
use hyperdrone_world::DistanceField;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_layout(rng: &mut ChaCha8Rng, columns: u32, rows: u32) -> MazeLayout {
    let mut layout = MazeLayout::filled(columns, rows, CellState::Walkable);
    for row in 0..rows {
        for column in 0..columns {
            if rng.gen_bool(0.3) {
                let _ = layout.set(CellCoord::new(column, row), CellState::Wall);
            }
        }
    }
    layout
}

fn random_walkable(rng: &mut ChaCha8Rng, layout: &MazeLayout) -> Option<CellCoord> {
    let walkable: Vec<CellCoord> = layout.view(1.0, 0.0).walkable_cells().collect();
    if walkable.is_empty() {
        return None;
    }
    Some(walkable[rng.gen_range(0..walkable.len())])
}

#[test]
fn path_lengths_match_breadth_first_distances() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let search = AStar::new();
    let mut solved = 0;

    for _ in 0..200 {
        let layout = random_layout(&mut rng, 9, 7);
        let (Some(start), Some(goal)) = (
            random_walkable(&mut rng, &layout),
            random_walkable(&mut rng, &layout),
        ) else {
            continue;
        };
        let view = layout.view(1.0, 0.0);
        let oracle = DistanceField::from_origins(view, &[start]);

        match search.find_path(view, start, goal) {
            Some(path) => {
                solved += 1;
                let expected = oracle.distance(goal).expect("search found an unreachable goal");
                assert_eq!(path.len() - 1, usize::from(expected), "suboptimal path\n{layout}");
                assert_eq!(path.first(), Some(&start));
                assert_eq!(path.last(), Some(&goal));
                for pair in path.windows(2) {
                    assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
                }
                assert!(path.iter().all(|cell| view.is_walkable(*cell)));
            }
            None => assert!(
                !oracle.is_reachable(goal),
                "search missed a route from {start} to {goal}\n{layout}"
            ),
        }
    }

    assert!(solved > 50, "too few solvable grids sampled: {solved}");
}

#[test]
fn column_wall_forces_detour_through_bottom_row() {
    let mut layout = MazeLayout::filled(10, 10, CellState::Walkable);
    for row in 0..=8 {
        let _ = layout.set(CellCoord::new(5, row), CellState::Wall);
    }
    let start = CellCoord::new(0, 0);
    let goal = CellCoord::new(9, 0);

    let path = AStar::new()
        .find_path(layout.view(32.0, 0.0), start, goal)
        .expect("route around the wall");

    assert!(path.len() - 1 > start.manhattan_distance(goal) as usize);
    assert_eq!(path.len() - 1, 27);
    assert!(path.contains(&CellCoord::new(5, 9)));
}

#[test]
fn out_of_bounds_endpoints_yield_no_path() {
    let layout = MazeLayout::filled(4, 4, CellState::Walkable);
    let view = layout.view(1.0, 0.0);
    let search = AStar::new();

    assert_eq!(search.find_path(view, CellCoord::new(4, 0), CellCoord::new(0, 0)), None);
    assert_eq!(search.find_path(view, CellCoord::new(0, 0), CellCoord::new(0, 9)), None);
}

#[test]
fn alternative_target_prefers_reachable_cell_closest_to_sealed_goal() {
    let layout = MazeLayout::parse(
        "
        ############
        ############
        ......##.#.#
        ############
        ############
        ",
    )
    .expect("layout parses");
    let view = layout.view(1.0, 0.0);
    let current = CellCoord::new(0, 2);
    let goal = CellCoord::new(10, 2);
    let search = AStar::new();
    assert!(search.find_path(view, current, goal).is_none());

    let chosen = find_alternative_target(view, &search, current, goal, 10)
        .expect("corridor cells are reachable");

    assert_eq!(chosen, CellCoord::new(5, 2));
    assert!(
        chosen.euclidean_distance(goal) < CellCoord::new(4, 2).euclidean_distance(goal),
        "a farther reachable candidate won"
    );
}

#[test]
fn alternative_target_is_none_when_everything_nearby_is_sealed() {
    let layout = MazeLayout::parse(
        "
        #####.
        #.####
        #####.
        ",
    )
    .expect("layout parses");

    let chosen = find_alternative_target(
        layout.view(1.0, 0.0),
        &AStar::new(),
        CellCoord::new(1, 1),
        CellCoord::new(5, 1),
        10,
    );

    assert_eq!(chosen, None);
}
