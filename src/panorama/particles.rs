//! Drifting textured particles overlaid on the panorama.

use glam::Vec2;
use rand::Rng;

use super::QuadRenderer;

/// Side length of a particle quad in scene units.
pub const PARTICLE_SIZE: f32 = 48.0;

/// A small textured quad drifting at constant velocity.
#[derive(Debug, Clone)]
pub struct Particle<T> {
    index: u64,
    texture: T,
    position: Vec2,
    velocity: Vec2,
}

impl<T> Particle<T> {
    pub fn new(index: u64, texture: T, position: Vec2, velocity: Vec2) -> Self {
        Self {
            index,
            texture,
            position,
            velocity,
        }
    }

    /// Monotonically increasing spawn index; never reused within a session.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_texture(&mut self, texture: T) {
        self.texture = texture;
    }

    pub fn update(&mut self) {
        self.position += self.velocity;
    }

    pub fn draw<R: QuadRenderer<T>>(&self, renderer: &mut R) {
        renderer.draw_quad(&self.texture, self.position, Vec2::splat(PARTICLE_SIZE));
    }
}

/// Owns the particle population and the texture newly spawned particles bind.
#[derive(Debug, Clone)]
pub struct ParticleController<T> {
    texture: T,
    particles: Vec<Particle<T>>,
    spawned: u64,
}

impl<T> ParticleController<T> {
    pub fn new(texture: T) -> Self {
        Self {
            texture,
            particles: Vec::new(),
            spawned: 0,
        }
    }

    /// Spawn one particle at the origin with the given texture.
    pub fn add_particle(&mut self, texture: T) {
        self.spawned += 1;
        self.particles
            .push(Particle::new(self.spawned, texture, Vec2::ZERO, Vec2::ZERO));
    }

    /// Remove the `count` most recently spawned particles. Removing more than
    /// exist clears the population.
    pub fn remove_particles(&mut self, count: usize) {
        for _ in 0..count {
            if self.particles.pop().is_none() {
                break;
            }
        }
    }

    pub fn update(&mut self) {
        for particle in &mut self.particles {
            particle.update();
        }
    }

    pub fn draw<R: QuadRenderer<T>>(&self, renderer: &mut R) {
        for particle in &self.particles {
            particle.draw(renderer);
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle<T>> {
        self.particles.iter()
    }
}

impl<T: Clone> ParticleController<T> {
    /// Spawn `count` particles at random positions within `bounds`, each with
    /// a small random drift, all bound to the controller's current texture.
    pub fn add_particles(&mut self, count: usize, bounds: Vec2) {
        let bounds = bounds.max(Vec2::ONE);
        let mut rng = rand::rng();
        for _ in 0..count {
            let position = Vec2::new(
                rng.random_range(0.0..bounds.x),
                rng.random_range(0.0..bounds.y),
            );
            let velocity = Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            self.spawned += 1;
            self.particles.push(Particle::new(
                self.spawned,
                self.texture.clone(),
                position,
                velocity,
            ));
        }
    }

    /// Rebind every live particle to `texture` and keep it for future spawns.
    pub fn update_particles(&mut self, texture: T) {
        for particle in &mut self.particles {
            particle.set_texture(texture.clone());
        }
        self.texture = texture;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_particles_spawns_within_bounds() {
        let mut controller: ParticleController<u32> = ParticleController::new(7);
        controller.add_particles(20, Vec2::new(640.0, 480.0));
        assert_eq!(controller.len(), 20);
        for particle in controller.particles() {
            let p = particle.position();
            assert!((0.0..640.0).contains(&p.x));
            assert!((0.0..480.0).contains(&p.y));
        }
    }

    #[test]
    fn test_remove_particles_pops_from_tail() {
        let mut controller: ParticleController<u32> = ParticleController::new(0);
        for texture in 1..=5 {
            controller.add_particle(texture);
        }
        controller.remove_particles(3);
        assert_eq!(controller.len(), 2);
        let indices: Vec<u64> = controller.particles().map(|p| p.index()).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_remove_more_than_exist_clears() {
        let mut controller: ParticleController<u32> = ParticleController::new(0);
        controller.add_particles(4, Vec2::new(100.0, 100.0));
        controller.remove_particles(10);
        assert!(controller.is_empty());
    }

    #[test]
    fn test_spawn_indices_never_reused() {
        let mut controller: ParticleController<u32> = ParticleController::new(0);
        controller.add_particles(3, Vec2::new(10.0, 10.0));
        controller.remove_particles(3);
        controller.add_particles(2, Vec2::new(10.0, 10.0));
        let indices: Vec<u64> = controller.particles().map(|p| p.index()).collect();
        assert_eq!(indices, vec![4, 5]);
    }

    #[test]
    fn test_update_particles_rebinds_all() {
        let mut controller: ParticleController<u32> = ParticleController::new(1);
        controller.add_particles(3, Vec2::new(10.0, 10.0));
        controller.update_particles(9);

        struct Sink(Vec<u32>);
        impl QuadRenderer<u32> for Sink {
            fn draw_quad(&mut self, texture: &u32, _center: Vec2, _size: Vec2) {
                self.0.push(*texture);
            }
        }
        let mut sink = Sink(Vec::new());
        controller.draw(&mut sink);
        assert_eq!(sink.0, vec![9, 9, 9]);

        // Future spawns also use the new texture.
        controller.add_particles(1, Vec2::new(10.0, 10.0));
        let mut sink = Sink(Vec::new());
        controller.draw(&mut sink);
        assert_eq!(sink.0, vec![9, 9, 9, 9]);
    }
}
