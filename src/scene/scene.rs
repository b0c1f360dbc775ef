use log::{debug, info, warn};
use rand::Rng;

use crate::error::{Error, Result};
use crate::renderer::meshes::MeshLibrary;
use crate::renderer::textures::TextureLibrary;

use super::object::SceneObject;
use super::scatter::{scatter, Placement, Region, SpawnRule};
use super::world::WorldLayout;

/// Stable reference to an object in a [`Scene`]. Removing the object makes
/// every copy of the key stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    slot: u32,
    generation: u32,
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    dense: Option<usize>,
}

/// Owns every object in the world plus the optional sky.
///
/// Objects live in one dense vector in insertion order until something is
/// removed; removal swaps the last object into the hole.
#[derive(Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    // slot of each dense object
    owners: Vec<u32>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    pending_removals: Vec<ObjectKey>,
    sky: Option<SceneObject>,
    elapsed: f32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectKey {
        let dense = self.objects.len();
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize].dense = Some(dense);
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    dense: Some(dense),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.objects.push(object);
        self.owners.push(slot);
        ObjectKey {
            slot,
            generation: self.slots[slot as usize].generation,
        }
    }

    fn dense_index(&self, key: ObjectKey) -> Option<usize> {
        self.slots
            .get(key.slot as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.dense)
    }

    pub fn contains(&self, key: ObjectKey) -> bool {
        self.dense_index(key).is_some()
    }

    pub fn get(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.dense_index(key).map(|i| &self.objects[i])
    }

    /// Removes immediately in O(1). The last object takes the removed one's place.
    pub fn remove_object(&mut self, key: ObjectKey) -> Result<SceneObject> {
        let index = self.dense_index(key).ok_or(Error::StaleObject)?;
        let removed = self.objects.swap_remove(index);
        self.owners.swap_remove(index);
        if let Some(&moved) = self.owners.get(index) {
            self.slots[moved as usize].dense = Some(index);
        }

        let slot = &mut self.slots[key.slot as usize];
        slot.dense = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.slot);
        Ok(removed)
    }

    /// Removes at the start of the next [`Scene::update`], between frames.
    pub fn queue_removal(&mut self, key: ObjectKey) -> Result<()> {
        if !self.contains(key) {
            return Err(Error::StaleObject);
        }
        self.pending_removals.push(key);
        Ok(())
    }

    pub fn set_sky(&mut self, sky: Option<SceneObject>) {
        self.sky = sky;
    }

    pub fn sky(&self) -> Option<&SceneObject> {
        self.sky.as_ref()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn shadow_casters(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|object| object.casts_shadow())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Applies queued removals, then advances every object by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for key in std::mem::take(&mut self.pending_removals) {
            // The same key may be queued twice.
            if self.remove_object(key).is_ok() {
                debug!("Removed queued object {:?}", key);
            }
        }

        self.elapsed += dt;
        let elapsed = self.elapsed;
        for object in &mut self.objects {
            object.update(elapsed);
        }
        if let Some(sky) = &mut self.sky {
            sky.update(elapsed);
        }
    }

    pub fn place(
        &mut self,
        placement: &Placement,
        meshes: &MeshLibrary,
        textures: &TextureLibrary,
    ) -> Result<ObjectKey> {
        let object =
            SceneObject::with_transform(placement.object, placement.transform, meshes, textures)?;
        Ok(self.add_object(object))
    }

    /// Scatters one rule over `region`. Nothing is added unless every
    /// instance resolves.
    pub fn spawn<R: Rng>(
        &mut self,
        region: &Region,
        rule: &SpawnRule,
        rng: &mut R,
        meshes: &MeshLibrary,
        textures: &TextureLibrary,
    ) -> Result<Vec<ObjectKey>> {
        let objects = scatter(region, rule, rng)
            .iter()
            .map(|p| SceneObject::with_transform(p.object, p.transform, meshes, textures))
            .collect::<Result<Vec<_>>>()?;
        Ok(objects.into_iter().map(|o| self.add_object(o)).collect())
    }

    /// Adds every biome's ground plane and spawn rules, then the fixed objects.
    /// Returns how many objects were added.
    pub fn populate<R: Rng>(
        &mut self,
        layout: &WorldLayout,
        rng: &mut R,
        meshes: &MeshLibrary,
        textures: &TextureLibrary,
    ) -> Result<usize> {
        let before = self.len();
        for biome in &layout.biomes {
            let start = self.len();
            self.place(&biome.ground_placement(), meshes, textures)?;
            for rule in &biome.rules {
                if rule.count == 0 {
                    warn!(
                        "Spawn rule for {:?} in `{}` has zero instances",
                        rule.object,
                        biome.region.name()
                    );
                }
                self.spawn(&biome.region, rule, rng, meshes, textures)?;
            }
            debug!("Biome `{}`: {} objects", biome.region.name(), self.len() - start);
        }
        for placement in &layout.fixed {
            self.place(placement, meshes, textures)?;
        }

        let added = self.len() - before;
        info!("Populated scene with {} objects", added);
        Ok(added)
    }
}
