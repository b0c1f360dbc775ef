use glam::Vec3;

use crate::error::Result;

use super::catalog::ObjectType;
use super::scatter::{Placement, Region, SpawnRule};
use super::transform::Transform;

/// Ground planes sit this far below a region's `ground_y`; object heights in
/// the catalog are relative to it.
pub const GROUND_PLANE_OFFSET: f32 = -1.0;

/// One biome: a region, the plane covering it and what grows on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Biome {
    pub region: Region,
    pub ground: ObjectType,
    pub rules: Vec<SpawnRule>,
}

impl Biome {
    /// Plane stretched over the whole region.
    pub fn ground_placement(&self) -> Placement {
        let spec = self.ground.spec();
        let (half_x, half_z) = self.region.half_extents();
        let position = self.region.center() + Vec3::new(0.0, GROUND_PLANE_OFFSET, 0.0);
        // The plane is an XY quad, so local Y becomes world Z once laid flat.
        let scale = Vec3::new(half_x, half_z, 1.0);
        Placement {
            object: self.ground,
            transform: Transform::from_degrees(position, spec.rotation, scale),
        }
    }
}

/// Biomes plus hand-placed objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldLayout {
    pub biomes: Vec<Biome>,
    pub fixed: Vec<Placement>,
}

impl WorldLayout {
    /// Forest, rocky terrain and desert side by side along X, with a spinning
    /// cube above the middle of the rocks.
    pub fn standard() -> Result<Self> {
        let depth = -20.0..20.0;
        let tree_top = Vec3::new(0.0, 4.0, 0.0);

        let forest = Biome {
            region: Region::new("forest", -60.0..-20.0, depth.clone(), 0.0)?,
            ground: ObjectType::PlaneGrass,
            rules: vec![
                SpawnRule::new(ObjectType::TreeBottom, 14).companion(ObjectType::TreeTop, tree_top),
                SpawnRule::new(ObjectType::TreeTrunk, 6),
                SpawnRule::new(ObjectType::Grass, 60),
                SpawnRule::new(ObjectType::GrassPatch, 40),
                SpawnRule::new(ObjectType::Tent, 2),
                SpawnRule::new(ObjectType::SmallRock, 8),
            ],
        };

        let rocky = Biome {
            region: Region::new("rocky", -20.0..20.0, depth.clone(), 0.0)?,
            ground: ObjectType::PlaneDirt,
            rules: vec![
                SpawnRule::new(ObjectType::StoneA, 12),
                SpawnRule::new(ObjectType::StoneB, 6),
                SpawnRule::new(ObjectType::StoneC, 12),
                SpawnRule::new(ObjectType::SmallRock, 24),
                SpawnRule::new(ObjectType::MilitaryVehicle, 2),
            ],
        };

        let desert = Biome {
            region: Region::new("desert", 20.0..60.0, depth, 0.0)?,
            ground: ObjectType::PlaneSand,
            rules: vec![
                SpawnRule::new(ObjectType::Cactus, 20),
                SpawnRule::new(ObjectType::Pyramid, 2),
                SpawnRule::new(ObjectType::Camel, 5),
            ],
        };

        let cube = ObjectType::MovingCube.spec();
        Ok(Self {
            biomes: vec![forest, rocky, desert],
            fixed: vec![Placement {
                object: ObjectType::MovingCube,
                transform: Transform::from_degrees(Vec3::new(0.0, 3.0, 0.0), cube.rotation, cube.scale),
            }],
        })
    }

    /// Objects a population pass will add, planes and companions included.
    pub fn object_count(&self) -> usize {
        let scattered: usize = self
            .biomes
            .iter()
            .flat_map(|biome| &biome.rules)
            .map(|rule| rule.count * (1 + rule.companions.len()))
            .sum();
        scattered + self.biomes.len() + self.fixed.len()
    }
}
