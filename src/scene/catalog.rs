use glam::Vec3;

/// Everything the scene knows how to spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Plane,
    PlaneGrass,
    PlaneDirt,
    PlaneSand,
    Grass,
    GrassPatch,
    Tent,
    TreeTrunk,
    TreeBottom,
    TreeTop,
    SmallRock,
    StoneA,
    StoneB,
    StoneC,
    MilitaryVehicle,
    Cactus,
    Pyramid,
    Camel,
    Cube,
    MovingCube,
    Skybox,
    AdvancedSkybox,
}

/// How an object refreshes itself each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObjectKind {
    /// Fixed transform, casts shadows.
    Standard,
    /// Rotation advances by `spin` radians per second on every axis. Casts shadows.
    Animated { spin: Vec3 },
    /// Cube-mapped sky drawn with a rotation-only view.
    Skybox,
    /// Screen-covering triangle that rebuilds view rays per pixel.
    AdvancedSkybox,
}

impl ObjectKind {
    pub fn casts_shadow(&self) -> bool {
        matches!(self, ObjectKind::Standard | ObjectKind::Animated { .. })
    }

    pub fn is_sky(&self) -> bool {
        !self.casts_shadow()
    }
}

/// Default resources and placement of an [`ObjectType`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectSpec {
    pub mesh: &'static str,
    pub texture: &'static str,
    pub kind: ObjectKind,
    pub position: Vec3,
    /// Degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
}

const fn lit(mesh: &'static str, texture: &'static str, y: f32, scale: f32) -> ObjectSpec {
    ObjectSpec {
        mesh,
        texture,
        kind: ObjectKind::Standard,
        position: Vec3::new(0.0, y, 0.0),
        rotation: Vec3::ZERO,
        scale: Vec3::splat(scale),
    }
}

// The plane mesh lies in XY; -90 degrees about X lays it on the ground.
const fn ground(texture: &'static str) -> ObjectSpec {
    ObjectSpec {
        mesh: "plane",
        texture,
        kind: ObjectKind::Standard,
        position: Vec3::ZERO,
        rotation: Vec3::new(-90.0, 0.0, 0.0),
        scale: Vec3::ONE,
    }
}

const fn sky(mesh: &'static str, kind: ObjectKind) -> ObjectSpec {
    ObjectSpec {
        mesh,
        texture: "skybox",
        kind,
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    }
}

impl ObjectType {
    pub const ALL: [ObjectType; 22] = [
        ObjectType::Plane,
        ObjectType::PlaneGrass,
        ObjectType::PlaneDirt,
        ObjectType::PlaneSand,
        ObjectType::Grass,
        ObjectType::GrassPatch,
        ObjectType::Tent,
        ObjectType::TreeTrunk,
        ObjectType::TreeBottom,
        ObjectType::TreeTop,
        ObjectType::SmallRock,
        ObjectType::StoneA,
        ObjectType::StoneB,
        ObjectType::StoneC,
        ObjectType::MilitaryVehicle,
        ObjectType::Cactus,
        ObjectType::Pyramid,
        ObjectType::Camel,
        ObjectType::Cube,
        ObjectType::MovingCube,
        ObjectType::Skybox,
        ObjectType::AdvancedSkybox,
    ];

    pub const fn spec(self) -> ObjectSpec {
        match self {
            ObjectType::Plane => ground("plane"),
            ObjectType::PlaneGrass => ground("plane_grass"),
            ObjectType::PlaneDirt => ground("plane_dirt"),
            ObjectType::PlaneSand => ground("plane_sand"),
            ObjectType::Grass => lit("grass", "grass", -0.75, 1.0),
            ObjectType::GrassPatch => lit("grasspatch", "grasspatch", -0.75, 0.1),
            ObjectType::Tent => lit("tent", "tent", -0.75, 1.0),
            ObjectType::TreeTrunk => lit("treetrunk", "treetrunk", -0.75, 0.1),
            ObjectType::TreeBottom => lit("tree", "tree", -0.75, 1.0),
            ObjectType::TreeTop => lit("treetop", "treetop", -0.75, 1.0),
            ObjectType::SmallRock => lit("smallrock", "smallrock", -0.75, 1.0),
            ObjectType::StoneA => lit("stone_a", "stone_a", -0.75, 1.0),
            ObjectType::StoneB => lit("stone_b", "stone_b", -0.75, 25.0),
            ObjectType::StoneC => lit("stone_c", "stone_c", -0.75, 1.0),
            ObjectType::MilitaryVehicle => lit("militaryvehicle", "militaryvehicle", -0.75, 1.0),
            ObjectType::Cactus => lit("cactus", "cactus", -0.9, 0.0075),
            ObjectType::Pyramid => lit("pyramid", "pyramid", -1.0, 1.0),
            ObjectType::Camel => lit("camel", "camel", -1.0, 1.0),
            ObjectType::Cube => lit("cube", "cube", 0.0, 1.0),
            ObjectType::MovingCube => ObjectSpec {
                kind: ObjectKind::Animated { spin: Vec3::ONE },
                ..lit("cube", "cube", 0.0, 1.0)
            },
            ObjectType::Skybox => sky("skybox", ObjectKind::Skybox),
            ObjectType::AdvancedSkybox => sky("advanced_skybox", ObjectKind::AdvancedSkybox),
        }
    }
}
