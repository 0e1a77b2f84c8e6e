use std::f64::consts::TAU;

use crate::config::{IdleConfig, MagnetConfig, SwarmConfig};
use crate::geometry::Point;
use crate::pool::Particle;
use crate::state::{Interaction, Mode};

/// Advances one particle by one frame: organize, pointer interaction, damping,
/// integration. Particles never read each other.
///
/// `distance` is the pointer distance measured before this call
/// (`f32::INFINITY` when there is no pointer). Returns whether the pointer
/// acted on the particle.
pub fn step(
    particle: &mut Particle,
    mode: Mode,
    pointer: Option<Point>,
    distance: f32,
    now_ms: u64,
    config: &SwarmConfig,
) -> bool {
    let target = active_target(particle, mode, now_ms, &config.idle);
    let k = if mode.is_code() {
        config.forces.organize_code
    } else {
        config.forces.organize
    };
    organize(particle, target, k);

    let interacted = match pointer {
        Some(pointer) if distance < config.forces.hover_radius => match mode.interaction() {
            Interaction::Push => {
                let multiplier = if mode.is_code() {
                    config.forces.code_hover_multiplier
                } else {
                    1.0
                };
                push(particle, pointer, distance, config, multiplier);
                true
            }
            Interaction::Magnet => magnet(particle, pointer, distance, config),
        },
        _ => false,
    };

    integrate(particle, config.forces.damping);
    interacted
}

/// Where the particle is heading this frame, idle drift included.
pub fn active_target(particle: &Particle, mode: Mode, now_ms: u64, idle: &IdleConfig) -> Point {
    match mode {
        Mode::Code(_) => particle.code_target(),
        Mode::Shape(shape) => {
            let target = particle.shape_target(shape);
            target + idle_offset(target, particle.phase(), now_ms, idle)
        }
    }
}

/// Bounded wobble around a target. Zero amplitude yields no offset.
pub fn idle_offset(target: Point, phase: f32, now_ms: u64, idle: &IdleConfig) -> Point {
    if idle.amplitude == 0.0 {
        return Point::ZERO;
    }

    let t = ((now_ms as f64 * idle.speed as f64) % TAU) as f32;

    Point::new(
        idle.amplitude * (phase + target.y * idle.frequency + t).cos(),
        idle.amplitude * (phase + target.x * idle.frequency + t).sin(),
    )
}

pub fn organize(particle: &mut Particle, target: Point, k: f32) {
    particle.velocity += (target - particle.position) * k;
}

/// Radial repulsion, linear in distance from full strength at the pointer to
/// zero at the hover radius.
pub fn push(
    particle: &mut Particle,
    pointer: Point,
    distance: f32,
    config: &SwarmConfig,
    multiplier: f32,
) {
    let hover = &config.forces;
    let angle = (particle.position.y - pointer.y).atan2(particle.position.x - pointer.x);
    let f = (1.0 - distance / hover.hover_radius) * hover.hover_force * multiplier;

    particle.velocity += Point::new(angle.cos(), angle.sin()) * f;
}

/// Elastic pull toward the pointer. Inside the elastic radius nothing happens.
pub fn magnet(
    particle: &mut Particle,
    pointer: Point,
    distance: f32,
    config: &SwarmConfig,
) -> bool {
    let m = &config.magnet;

    if distance <= m.elastic_radius {
        return false;
    }

    let nd = distance / config.forces.hover_radius;
    let pull = (distance - m.elastic_radius) * m.force * magnet_strength(nd, m);
    let dir = (pointer - particle.position) * (1.0 / distance);

    particle.velocity += dir * pull;
    true
}

/// Three-band falloff: flat core, then two linear ramps meeting at
/// `mid_strength` and ending at `edge_strength` on the hover radius.
pub fn magnet_strength(nd: f32, m: &MagnetConfig) -> f32 {
    if nd < m.core {
        1.0
    } else if nd < m.mid {
        remap(nd, m.core, m.mid, 1.0, m.mid_strength)
    } else {
        remap(nd, m.mid, 1.0, m.mid_strength, m.edge_strength)
    }
}

fn remap(v: f32, from_lo: f32, from_hi: f32, to_lo: f32, to_hi: f32) -> f32 {
    to_lo + (v - from_lo) / (from_hi - from_lo) * (to_hi - to_lo)
}

pub fn integrate(particle: &mut Particle, damping: f32) {
    particle.velocity *= damping;
    let velocity = particle.velocity;
    particle.position += velocity;
}
