pub mod camera;
pub mod catalog;
pub mod light;
pub mod object;
pub mod scatter;
pub mod scene;
pub mod transform;
pub mod world;

pub use camera::Camera;
pub use catalog::{ObjectKind, ObjectType};
pub use light::Light;
pub use object::{FrameContext, SceneObject};
pub use scatter::{scatter, Placement, Region, SpawnRule};
pub use scene::{ObjectKey, Scene};
pub use transform::Transform;
pub use world::{Biome, WorldLayout};
