/// Ambient particle layout for a scene backdrop.
///
/// Layouts are deterministic for a given seed and scene, so a renderer can
/// regenerate them on every frame without particles jumping around.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;
use serde::Serialize;
use std::hash::{Hash, Hasher};

use crate::presentation::palette::PaletteKind;
use crate::schema::story::SceneId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    /// Horizontal position as a percentage of the viewport width.
    pub x: f32,
    /// Vertical position as a percentage of the viewport height.
    pub y: f32,
    pub size: f32,
    pub color: &'static str,
    pub opacity: f32,
    /// Animation offset so particles do not pulse in unison.
    pub delay_ms: u32,
    pub duration_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleField {
    pub palette: PaletteKind,
    pub particles: Vec<Particle>,
}

impl ParticleField {
    pub fn generate(scene: Option<&SceneId>, palette: PaletteKind, count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(scene_salt(scene)));
        let colors = palette.colors();

        let particles = (0..count)
            .map(|_| Particle {
                x: rng.gen_range(0.0..100.0),
                y: rng.gen_range(0.0..100.0),
                size: rng.gen_range(1.0..4.0),
                color: colors.choose(&mut rng).copied().unwrap_or("#ffffff"),
                opacity: rng.gen_range(0.2..0.8),
                delay_ms: rng.gen_range(0..3_000),
                duration_ms: rng.gen_range(3_000..8_000),
            })
            .collect();

        Self { palette, particles }
    }
}

fn scene_salt(scene: Option<&SceneId>) -> u64 {
    let Some(scene) = scene else {
        return 0;
    };
    let mut hasher = FxHasher::default();
    scene.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_layout() {
        let scene = SceneId::from("forest-entrance");
        let a = ParticleField::generate(Some(&scene), PaletteKind::Forest, 40, 7);
        let b = ParticleField::generate(Some(&scene), PaletteKind::Forest, 40, 7);
        assert_eq!(a, b);
        assert_eq!(a.particles.len(), 40);
    }

    #[test]
    fn scenes_get_different_layouts() {
        let a = ParticleField::generate(Some(&SceneId::from("a")), PaletteKind::Sky, 10, 7);
        let b = ParticleField::generate(Some(&SceneId::from("b")), PaletteKind::Sky, 10, 7);
        assert_ne!(a.particles, b.particles);
    }

    #[test]
    fn particles_stay_in_bounds_and_palette() {
        let field = ParticleField::generate(None, PaletteKind::Ember, 200, 99);
        for p in &field.particles {
            assert!((0.0..100.0).contains(&p.x));
            assert!((0.0..100.0).contains(&p.y));
            assert!((1.0..4.0).contains(&p.size));
            assert!(PaletteKind::Ember.colors().contains(&p.color));
            assert!(p.duration_ms >= 3_000);
        }
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(ParticleField::generate(None, PaletteKind::Starlight, 0, 1)
            .particles
            .is_empty());
    }
}
