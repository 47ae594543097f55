use glam::Vec2;
use hyperdrone_core::MazeView;

/// Reports whether the straight segment between two points avoids walls.
///
/// The segment is sampled every `step` pixels, endpoints included. Samples
/// falling outside the grid block the line like walls do.
#[must_use]
pub fn has_line_of_sight(maze: MazeView<'_>, from: Vec2, to: Vec2, step: f32) -> bool {
    let distance = from.distance(to);
    let samples = if step > 0.0 {
        (distance / step).ceil().max(1.0) as u32
    } else {
        1
    };

    (0..=samples).all(|index| {
        let point = from.lerp(to, index as f32 / samples as f32);
        maze.cell_at(point).is_some_and(|cell| !maze.is_wall(cell))
    })
}
