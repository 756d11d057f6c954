//! Particle emitter component
//!
//! Simulates a pool of billboard particles in the emitter's local frame during
//! the loop phase and submits them as one batch in the render phase. Each
//! particle is seeded from the `start_*` ranges and then integrated with
//! gravity, spin, scale growth and a colour drift.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ecs::component::{
    component_state_accessors, format_vec3, parse_attribute, parse_vec3, Attribute, AttributeError, Component,
    ComponentContext, ComponentKind, ComponentState, ComponentType,
};
use crate::ecs::GameObjectId;
use crate::foundation::math::{utils, Color, Mat4, Vec3};
use crate::render::{ParticleDraw, ParticleInstance};

/// Closed range a start value is sampled from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Lower bound
    pub min: f32,
    /// Upper bound
    pub max: f32,
}

impl Span {
    /// Range `[min, max]`
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate range holding one value
    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    fn sample(self, rng: &mut StdRng) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// One simulated particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Seconds left to live
    pub life: f32,
    /// Position in the emitter's frame
    pub position: Vec3,
    /// Velocity in units per second
    pub velocity: Vec3,
    /// Billboard roll in degrees
    pub angle: f32,
    /// Roll speed in degrees per second
    pub angle_velocity: f32,
    /// Uniform scale
    pub scale: f32,
    /// Scale change per second
    pub scale_factor: f32,
    /// Current colour
    pub color: Color,
}

/// Largest pool an emitter will fill
pub const MAX_POOL_SIZE: usize = 10_000;

/// Particle emitter component
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    state: ComponentState,
    particles: Vec<Particle>,
    rng: StdRng,
    stopped: bool,
    frozen: bool,

    /// Pool size, capped at [`MAX_POOL_SIZE`]
    pub max_particles: usize,
    /// Billboard texture
    pub material: Option<String>,
    /// Central emission direction
    pub direction: Vec3,
    /// Full cone angle around `direction` in degrees
    pub angle_spread: f32,
    /// Constant acceleration
    pub gravity: Vec3,
    /// Colour change per second, applied to every channel and clamped to `[0, 1]`
    pub color_adder: Color,

    /// Lifetime in seconds
    pub start_life: Span,
    /// Distance from the emitter origin along the emission direction
    pub start_distance: Span,
    /// Speed along the emission direction
    pub start_velocity: Span,
    /// Initial roll in degrees
    pub start_angle: Span,
    /// Roll speed in degrees per second
    pub start_angle_velocity: Span,
    /// Initial scale
    pub start_scale: Span,
    /// Scale change per second
    pub start_scale_factor: Span,
    /// Lower colour bound, per channel
    pub start_min_color: Color,
    /// Upper colour bound, per channel
    pub start_max_color: Color,
}

impl ParticleEmitter {
    /// Emitter with default ranges and an entropy-seeded generator
    pub fn with_owner(owner: GameObjectId) -> Self {
        Self {
            state: ComponentState::new(owner),
            particles: Vec::new(),
            rng: StdRng::from_entropy(),
            stopped: false,
            frozen: false,
            max_particles: 100,
            material: None,
            direction: Vec3::y(),
            angle_spread: 45.0,
            gravity: Vec3::zeros(),
            color_adder: Color::new(0.0, 0.0, 0.0, 0.0),
            start_life: Span::new(1.0, 2.0),
            start_distance: Span::fixed(0.0),
            start_velocity: Span::new(1.0, 2.0),
            start_angle: Span::fixed(0.0),
            start_angle_velocity: Span::fixed(0.0),
            start_scale: Span::fixed(1.0),
            start_scale_factor: Span::fixed(0.0),
            start_min_color: Color::WHITE,
            start_max_color: Color::WHITE,
        }
    }

    /// Replace the generator with a seeded one
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Live particles
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Whether new particles are being spawned
    pub const fn is_emitting(&self) -> bool {
        !self.stopped
    }

    /// Whether the simulation is paused
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Restart: discard live particles, refill the pool and resume emission
    pub fn start(&mut self) {
        self.stopped = false;
        self.frozen = false;
        self.particles.clear();
        self.refill();
    }

    /// Stop spawning; live particles run out their lifetime
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Spawn again after [`Self::stop`]
    pub fn resume(&mut self) {
        self.stopped = false;
    }

    /// Pause the simulation; particles keep rendering in place
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Continue the simulation
    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Advance the simulation by `delta` seconds
    pub fn step(&mut self, delta: f32) {
        if self.frozen {
            return;
        }

        for p in &mut self.particles {
            p.life -= delta;
            p.velocity += self.gravity * delta;
            p.position += p.velocity * delta;
            p.angle += p.angle_velocity * delta;
            p.scale = p.scale_factor.mul_add(delta, p.scale).max(0.0);
            p.color = drift(&p.color, &self.color_adder, delta);
        }
        self.particles.retain(|p| p.life > 0.0);

        if !self.stopped {
            self.refill();
        }
    }

    fn refill(&mut self) {
        let target = self.max_particles.min(MAX_POOL_SIZE);
        while self.particles.len() < target {
            let particle = self.spawn();
            self.particles.push(particle);
        }
    }

    fn spawn(&mut self) -> Particle {
        let direction = random_cone_vector(&mut self.rng, &self.direction, self.angle_spread);
        let t = self.rng.gen::<f32>();

        Particle {
            life: self.start_life.sample(&mut self.rng),
            position: direction * self.start_distance.sample(&mut self.rng),
            velocity: direction * self.start_velocity.sample(&mut self.rng),
            angle: self.start_angle.sample(&mut self.rng),
            angle_velocity: self.start_angle_velocity.sample(&mut self.rng),
            scale: self.start_scale.sample(&mut self.rng),
            scale_factor: self.start_scale_factor.sample(&mut self.rng),
            color: self.start_min_color.lerp(&self.start_max_color, t),
        }
    }
}

fn drift(color: &Color, adder: &Color, delta: f32) -> Color {
    Color::new(
        adder.r.mul_add(delta, color.r).clamp(0.0, 1.0),
        adder.g.mul_add(delta, color.g).clamp(0.0, 1.0),
        adder.b.mul_add(delta, color.b).clamp(0.0, 1.0),
        adder.a.mul_add(delta, color.a).clamp(0.0, 1.0),
    )
}

/// Unit vector within `spread_degrees` (full cone angle) of `axis`.
fn random_cone_vector(rng: &mut StdRng, axis: &Vec3, spread_degrees: f32) -> Vec3 {
    let axis = axis.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
    let helper = if axis.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    let u = axis.cross(&helper).normalize();
    let w = axis.cross(&u);

    let half = utils::deg_to_rad(spread_degrees.clamp(0.0, 360.0)) * 0.5;
    let theta = if half > 0.0 { rng.gen_range(0.0..=half) } else { 0.0 };
    let phi = rng.gen_range(0.0..std::f32::consts::TAU);

    axis * theta.cos() + (u * phi.cos() + w * phi.sin()) * theta.sin()
}

impl Component for ParticleEmitter {
    component_state_accessors!();

    fn on_loop(&mut self, ctx: &mut ComponentContext<'_, '_>) {
        self.step(ctx.frame.time.delta);
    }

    fn on_render(&mut self, ctx: &mut ComponentContext<'_, '_>, projection: &Mat4, model_view: &Mat4) {
        if self.particles.is_empty() {
            return;
        }

        let draw = ParticleDraw {
            owner: ctx.owner,
            texture: self.material.clone(),
            projection: *projection,
            model_view: *model_view,
            particles: self
                .particles
                .iter()
                .map(|p| ParticleInstance {
                    position: p.position,
                    scale: p.scale,
                    angle: p.angle,
                    color: p.color,
                })
                .collect(),
        };
        if let Err(e) = ctx.frame.renderer.draw_particles(draw) {
            log::warn!("'{}': particle draw failed: {}", ctx.owner_name, e);
        }
    }

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("max_particles", "usize", self.max_particles),
            Attribute::new("material", "string", self.material.as_deref().unwrap_or("")),
            Attribute::new("direction", "vec3", format_vec3(&self.direction)),
            Attribute::new("angle_spread", "f32", self.angle_spread),
            Attribute::new("gravity", "vec3", format_vec3(&self.gravity)),
            Attribute::new("emitting", "bool", self.is_emitting()),
            Attribute::new("frozen", "bool", self.frozen),
            Attribute::new("live", "usize", self.particles.len()),
        ]
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), AttributeError> {
        match name {
            "max_particles" => {
                let count: usize = parse_attribute(name, value, "usize")?;
                if count > MAX_POOL_SIZE {
                    return Err(AttributeError::InvalidValue {
                        attribute: name.to_string(),
                        value: value.to_string(),
                        expected: "usize no larger than 10000",
                    });
                }
                self.max_particles = count;
            }
            "material" => {
                let value = value.trim();
                self.material = (!value.is_empty()).then(|| value.to_string());
            }
            "direction" => self.direction = parse_vec3(name, value)?,
            "angle_spread" => self.angle_spread = parse_attribute(name, value, "f32")?,
            "gravity" => self.gravity = parse_vec3(name, value)?,
            "emitting" => self.stopped = !parse_attribute::<bool>(name, value, "bool")?,
            "frozen" => self.frozen = parse_attribute(name, value, "bool")?,
            _ => return Err(AttributeError::unknown(ComponentKind::ParticleEmitter, name)),
        }
        Ok(())
    }
}

impl ComponentType for ParticleEmitter {
    const KIND: ComponentKind = ComponentKind::ParticleEmitter;

    fn new(owner: GameObjectId) -> Self {
        Self::with_owner(owner)
    }

    stored_in_slot!(particle_emitter);
}
