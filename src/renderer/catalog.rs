//! Every mesh and texture the viewer loads at startup.

use crate::gpu::ProgramKind;

use super::primitives;
use super::vertex::VertexLayout;

/// Times the plane texture repeats across one plane.
pub const PLANE_TILES: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Geometry {
    Cube,
    Plane,
    Skybox,
    FullscreenTriangle,
}

impl Geometry {
    pub fn vertices(self) -> Vec<f32> {
        match self {
            Geometry::Cube => primitives::cube(),
            Geometry::Plane => primitives::plane(PLANE_TILES),
            Geometry::Skybox => primitives::skybox(),
            Geometry::FullscreenTriangle => primitives::fullscreen_triangle(),
        }
    }

    pub fn layout(self) -> &'static VertexLayout {
        match self {
            Geometry::Cube | Geometry::Plane => &VertexLayout::TEXTURED,
            Geometry::Skybox | Geometry::FullscreenTriangle => &VertexLayout::POSITION,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshSource {
    Builtin(Geometry),
    /// Path below the asset root, loaded in the `2f 3f 3f` layout.
    File(&'static str),
}

#[derive(Clone, Copy, Debug)]
pub struct MeshSpec {
    pub name: &'static str,
    pub source: MeshSource,
    /// Program of the main pass. Lit meshes also get a shadow-pass vertex array.
    pub program: ProgramKind,
}

impl MeshSpec {
    pub const fn builtin(name: &'static str, geometry: Geometry, program: ProgramKind) -> Self {
        Self {
            name,
            source: MeshSource::Builtin(geometry),
            program,
        }
    }

    pub const fn file(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            source: MeshSource::File(path),
            program: ProgramKind::Lit,
        }
    }

    pub fn layout(&self) -> &'static VertexLayout {
        match self.source {
            MeshSource::Builtin(geometry) => geometry.layout(),
            MeshSource::File(_) => &VertexLayout::TEXTURED,
        }
    }

    pub fn casts_shadow(&self) -> bool {
        self.program == ProgramKind::Lit
    }
}

pub const MESHES: &[MeshSpec] = &[
    MeshSpec::builtin("cube", Geometry::Cube, ProgramKind::Lit),
    MeshSpec::builtin("plane", Geometry::Plane, ProgramKind::Lit),
    MeshSpec::builtin("skybox", Geometry::Skybox, ProgramKind::Skybox),
    MeshSpec::builtin(
        "advanced_skybox",
        Geometry::FullscreenTriangle,
        ProgramKind::AdvancedSkybox,
    ),
    MeshSpec::file("grass", "objects/grass/grass.obj"),
    MeshSpec::file("grasspatch", "objects/grasspatch/grasspatch.obj"),
    MeshSpec::file("tent", "objects/tent/tent.obj"),
    MeshSpec::file("treetrunk", "objects/treetrunk/treetrunk.obj"),
    MeshSpec::file("tree", "objects/tree/tree.obj"),
    MeshSpec::file("treetop", "objects/treetop/treetop.obj"),
    MeshSpec::file("smallrock", "objects/smallrock/smallrock.obj"),
    MeshSpec::file("stone_a", "objects/stone_a/stone_a.obj"),
    MeshSpec::file("stone_b", "objects/stone_b/stone_b.obj"),
    MeshSpec::file("stone_c", "objects/stone_c/stone_c.obj"),
    MeshSpec::file("militaryvehicle", "objects/militaryvehicle/militaryvehicle.obj"),
    MeshSpec::file("cactus", "objects/cactus/cactus.obj"),
    MeshSpec::file("pyramid", "objects/pyramid/pyramid.obj"),
    MeshSpec::file("camel", "objects/camel/camel.obj"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSource {
    Image(&'static str),
    /// Directory holding one image per cube face.
    CubeMap(&'static str),
}

#[derive(Clone, Copy, Debug)]
pub struct TextureSpec {
    pub name: &'static str,
    pub source: TextureSource,
}

impl TextureSpec {
    pub const fn image(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            source: TextureSource::Image(path),
        }
    }

    pub const fn cube_map(name: &'static str, dir: &'static str) -> Self {
        Self {
            name,
            source: TextureSource::CubeMap(dir),
        }
    }
}

/// Name of the shared shadow-map texture.
pub const DEPTH_TEXTURE: &str = "depth_texture";

pub const TEXTURES: &[TextureSpec] = &[
    TextureSpec::image("cube", "textures/img.png"),
    TextureSpec::image("plane", "textures/Untextured.png"),
    TextureSpec::image("plane_grass", "textures/plane_grass.png"),
    TextureSpec::image("plane_dirt", "textures/plane_dirt.png"),
    TextureSpec::image("plane_sand", "textures/plane_sand.png"),
    TextureSpec::image("grass", "textures/grass.png"),
    TextureSpec::image("grasspatch", "textures/grasspatch.png"),
    TextureSpec::image("tent", "textures/tent.png"),
    TextureSpec::image("treetrunk", "textures/treetrunk.png"),
    TextureSpec::image("tree", "textures/tree.png"),
    TextureSpec::image("treetop", "textures/treetop.png"),
    TextureSpec::image("smallrock", "textures/smallrock.png"),
    TextureSpec::image("stone_a", "textures/stone_a.png"),
    TextureSpec::image("stone_b", "textures/stone_b.png"),
    TextureSpec::image("stone_c", "textures/stone_c.png"),
    TextureSpec::image("militaryvehicle", "textures/militaryvehicle.png"),
    TextureSpec::image("cactus", "textures/cactus.png"),
    TextureSpec::image("pyramid", "textures/pyramid.png"),
    TextureSpec::image("camel", "textures/camel.png"),
    TextureSpec::cube_map("skybox", "textures/skybox1"),
];
