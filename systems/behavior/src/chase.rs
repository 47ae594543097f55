use hyperdrone_core::{heading_degrees, MazeView};
use hyperdrone_system_pathfinding::PathSearch;
use rand::Rng;

use crate::{
    cooldown_elapsed, dash, has_line_of_sight, AgentAction, AgentCore, Behavior, TickContext,
};

pub(crate) fn tick<P, R>(
    core: &mut AgentCore<P>,
    maze: MazeView<'_>,
    ctx: &TickContext<'_>,
    rng: &mut R,
    out: &mut Vec<AgentAction>,
) -> Option<Behavior>
where
    P: PathSearch,
    R: Rng + ?Sized,
{
    let player = ctx.living_player()?;
    let tuning = core.tuning.chase;
    let capabilities = core.profile.capabilities();
    let aggro_radius = core.profile.aggro_radius;
    let distance = core.body.position.distance(player);

    if distance > aggro_radius * tuning.leash_factor {
        return Some(if capabilities.can_ram {
            Behavior::wall_follow()
        } else {
            core.calm_behavior()
        });
    }

    if capabilities.can_dash
        && distance <= aggro_radius
        && cooldown_elapsed(core.last_dash, ctx.now, core.tuning.dash.cooldown())
    {
        core.last_dash = Some(ctx.now);
        core.movement.clear_path();
        return Some(dash::begin(
            core.body.position,
            Some(player),
            &core.tuning.dash,
            ctx.now,
            rng,
        ));
    }

    core.movement
        .set_target(&mut core.body, player, maze, ctx.now);
    let ramming = capabilities.can_ram && distance <= aggro_radius * tuning.ram_radius_factor;
    let speed = ramming.then(|| core.body.speed * tuning.ram_speed_multiplier);
    let _ = core.advance(maze, ctx, speed, rng);

    let armed = capabilities.can_shoot && !capabilities.can_ram;
    if armed
        && cooldown_elapsed(core.last_shot, ctx.now, tuning.fire_cooldown())
        && has_line_of_sight(maze, core.body.position, player, tuning.sight_step)
    {
        core.last_shot = Some(ctx.now);
        out.push(AgentAction::Fire {
            angle_degrees: heading_degrees(player - core.body.position),
        });
    }

    None
}
