use log::{error, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::asset::AssetSource;
use crate::error::{Result, Teardown};
use crate::gpu::GpuContext;
use crate::input::InputState;
use crate::renderer::{MeshLibrary, SceneRenderer, ShaderLibrary, TextureLibrary};
use crate::scene::{Camera, FrameContext, Light, ObjectType, Scene, SceneObject, WorldLayout};
use crate::settings::{SkyboxSetting, ViewerSettings};
use crate::time::{FrameClock, Instant};

/// Everything one viewer session owns, generic over the graphics backend.
///
/// Resources are acquired in the order shaders, meshes, textures, scene,
/// shadow framebuffer, and released in reverse by [`Viewer::destroy`].
pub struct Viewer<G: GpuContext> {
    gpu: G,
    shaders: ShaderLibrary,
    meshes: MeshLibrary,
    textures: TextureLibrary,
    scene: Scene,
    renderer: SceneRenderer,
    camera: Camera,
    light: Light,
    input: InputState,
    clock: FrameClock,
}

impl<G: GpuContext> Viewer<G> {
    /// Builds the standard world, seeded from `settings.seed` when set.
    pub fn new(
        gpu: G,
        assets: &dyn AssetSource,
        settings: &ViewerSettings,
        size: [u32; 2],
    ) -> Result<Self> {
        let layout = WorldLayout::standard()?;
        let mut rng = match settings.seed {
            Some(seed) => {
                info!("Populating scene with seed {}", seed);
                SmallRng::seed_from_u64(seed)
            }
            None => SmallRng::from_entropy(),
        };
        Self::with_layout(gpu, assets, settings, size, &layout, &mut rng)
    }

    /// Any failure releases whatever was already created before returning.
    pub fn with_layout<R: Rng>(
        mut gpu: G,
        assets: &dyn AssetSource,
        settings: &ViewerSettings,
        size: [u32; 2],
        layout: &WorldLayout,
        rng: &mut R,
    ) -> Result<Self> {
        let shaders = ShaderLibrary::new(&mut gpu)?;
        let mut viewer = Self {
            gpu,
            shaders,
            meshes: MeshLibrary::default(),
            textures: TextureLibrary::default(),
            scene: Scene::new(),
            renderer: SceneRenderer::default(),
            camera: Camera::new(&settings.camera, aspect_ratio(size)),
            light: Light::from_settings(&settings.light),
            input: InputState::new(),
            clock: FrameClock::new(settings.target_fps),
        };

        if let Err(err) = viewer.load(assets, settings, layout, rng) {
            if let Err(cleanup) = viewer.destroy() {
                error!("Releasing resources after failed startup: {}", cleanup);
            }
            return Err(err);
        }
        Ok(viewer)
    }

    fn load<R: Rng>(
        &mut self,
        assets: &dyn AssetSource,
        settings: &ViewerSettings,
        layout: &WorldLayout,
        rng: &mut R,
    ) -> Result<()> {
        self.meshes = MeshLibrary::new(&mut self.gpu, assets, &self.shaders)?;
        self.textures = TextureLibrary::new(&mut self.gpu, assets, settings.shadow_map_size)?;

        self.scene.populate(layout, rng, &self.meshes, &self.textures)?;
        let sky = match settings.skybox {
            SkyboxSetting::Advanced => ObjectType::AdvancedSkybox,
            SkyboxSetting::Cube => ObjectType::Skybox,
        };
        self.scene
            .set_sky(Some(SceneObject::new(sky, &self.meshes, &self.textures)?));

        self.renderer = SceneRenderer::new(
            &mut self.gpu,
            &self.textures,
            settings.clear_color_rgba(),
        )?;
        info!(
            "Viewer ready: {} objects, {} meshes, {} textures",
            self.scene.len(),
            self.meshes.len(),
            self.textures.len()
        );
        Ok(())
    }

    /// Runs one frame timed by the internal clock.
    pub fn frame(&mut self) -> Result<()> {
        let dt = self.clock.tick();
        self.step(dt)
    }

    /// Runs one frame of `dt` seconds: input, camera, scene, both render passes.
    pub fn step(&mut self, dt: f32) -> Result<()> {
        let input = self.input.snapshot_and_reset();
        self.camera.update(&input, dt);
        self.scene.update(dt);

        self.gpu.begin_frame()?;
        let frame = FrameContext {
            camera: &self.camera,
            light: &self.light,
            meshes: &self.meshes,
            textures: &self.textures,
        };
        self.renderer.render(&mut self.gpu, &self.scene, &frame)?;
        self.gpu.end_frame()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(aspect_ratio([width, height]));
    }

    /// Releases every GPU resource in reverse acquisition order. Safe to call
    /// more than once. A failed release is logged and the rest still go;
    /// the first failure is returned.
    pub fn destroy(&mut self) -> Result<()> {
        let mut teardown = Teardown::new();
        teardown.check(self.renderer.destroy(&mut self.gpu));
        self.scene = Scene::new();
        teardown.check(self.textures.destroy(&mut self.gpu));
        teardown.check(self.meshes.destroy(&mut self.gpu));
        teardown.check(self.shaders.destroy(&mut self.gpu));
        teardown.finish()
    }

    pub fn next_frame_at(&self) -> Instant {
        self.clock.next_frame_at()
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn meshes(&self) -> &MeshLibrary {
        &self.meshes
    }

    pub fn textures(&self) -> &TextureLibrary {
        &self.textures
    }

    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }
}

fn aspect_ratio([width, height]: [u32; 2]) -> f32 {
    width as f32 / height.max(1) as f32
}
