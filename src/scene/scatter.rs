//! Procedural placement of object instances inside ground-plane regions.

use std::ops::Range;

use glam::Vec3;
use rand::Rng;

use crate::error::{Error, Result};

use super::catalog::ObjectType;
use super::transform::Transform;

/// Axis-aligned rectangle on the X/Z ground plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    name: String,
    x: Range<f32>,
    z: Range<f32>,
    ground_y: f32,
}

impl Region {
    pub fn new(name: impl Into<String>, x: Range<f32>, z: Range<f32>, ground_y: f32) -> Result<Self> {
        let name = name.into();
        let valid = |r: &Range<f32>| r.start.is_finite() && r.end.is_finite() && r.start < r.end;
        if !valid(&x) || !valid(&z) || !ground_y.is_finite() {
            return Err(Error::InvalidRegion { name });
        }
        Ok(Self {
            name,
            x,
            z,
            ground_y,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x(&self) -> Range<f32> {
        self.x.clone()
    }

    pub fn z(&self) -> Range<f32> {
        self.z.clone()
    }

    pub fn ground_y(&self) -> f32 {
        self.ground_y
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.x.start + self.x.end) * 0.5,
            self.ground_y,
            (self.z.start + self.z.end) * 0.5,
        )
    }

    pub fn half_extents(&self) -> (f32, f32) {
        (
            (self.x.end - self.x.start) * 0.5,
            (self.z.end - self.z.start) * 0.5,
        )
    }

    /// Half-open on both axes.
    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.x.contains(&x) && self.z.contains(&z)
    }
}

/// Extra part placed with every instance, sharing its yaw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Companion {
    pub object: ObjectType,
    pub offset: Vec3,
}

/// `count` instances of one object type.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRule {
    pub object: ObjectType,
    pub count: usize,
    /// Ground-contact offset above the region's `ground_y`.
    pub height: f32,
    pub scale: f32,
    pub companions: Vec<Companion>,
}

impl SpawnRule {
    /// Height and scale start at the object type's defaults.
    pub fn new(object: ObjectType, count: usize) -> Self {
        let spec = object.spec();
        Self {
            object,
            count,
            height: spec.position.y,
            scale: spec.scale.x,
            companions: Vec::new(),
        }
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn companion(mut self, object: ObjectType, offset: Vec3) -> Self {
        self.companions.push(Companion { object, offset });
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub object: ObjectType,
    pub transform: Transform,
}

/// Samples `rule.count` placements inside `region`. X and Z are uniform over
/// the region, yaw is uniform in [0, 360) degrees, pitch and roll are zero.
/// Companions follow their instance directly.
pub fn scatter<R: Rng>(region: &Region, rule: &SpawnRule, rng: &mut R) -> Vec<Placement> {
    let mut placements = Vec::with_capacity(rule.count * (1 + rule.companions.len()));
    for _ in 0..rule.count {
        let x = rng.gen_range(region.x());
        let z = rng.gen_range(region.z());
        let yaw = rng.gen_range(0.0f32..360.0).to_radians();
        let position = Vec3::new(x, region.ground_y + rule.height, z);
        let rotation = Vec3::new(0.0, yaw, 0.0);

        placements.push(Placement {
            object: rule.object,
            transform: Transform::new(position, rotation, Vec3::splat(rule.scale)),
        });
        for companion in &rule.companions {
            placements.push(Placement {
                object: companion.object,
                transform: Transform::new(
                    position + companion.offset,
                    rotation,
                    companion.object.spec().scale,
                ),
            });
        }
    }
    placements
}
