use log::debug;

use crate::error::{Error, Result};
use crate::gpu::{FramebufferId, GpuContext, RenderTarget};
use crate::renderer::textures::TextureLibrary;
use crate::scene::{FrameContext, Scene};

/// Two passes per frame, always in this order:
///
/// 1. Shadow pass into the shadow framebuffer, whose only attachment is the
///    shared depth texture. Depth only, seen from the light.
/// 2. Main pass into the screen, sampling that depth texture as the shadow
///    map. The sky goes last so it lands behind all opaque depth.
///
/// Both passes go through one sequential command stream, so the depth writes
/// of pass 1 are complete before pass 2 samples them.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    framebuffer: Option<FramebufferId>,
    clear_color: [f32; 4],
}

impl SceneRenderer {
    /// Creates the shadow framebuffer around the library's depth texture.
    pub fn new(
        gpu: &mut impl GpuContext,
        textures: &TextureLibrary,
        clear_color: [f32; 4],
    ) -> Result<Self> {
        let depth = textures.depth_texture()?;
        let framebuffer = gpu.create_framebuffer(depth)?;
        debug!("Shadow framebuffer {:?} around {:?}", framebuffer, depth);
        Ok(Self {
            framebuffer: Some(framebuffer),
            clear_color,
        })
    }

    pub fn shadow_framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    /// Records both passes. The caller brackets this with `begin_frame` and
    /// `end_frame`.
    pub fn render(
        &self,
        gpu: &mut impl GpuContext,
        scene: &Scene,
        frame: &FrameContext<'_>,
    ) -> Result<()> {
        let framebuffer = self.framebuffer.ok_or(Error::NoRenderTarget)?;
        self.shadow_pass(gpu, framebuffer, scene, frame)?;
        self.main_pass(gpu, scene, frame)
    }

    fn shadow_pass(
        &self,
        gpu: &mut impl GpuContext,
        framebuffer: FramebufferId,
        scene: &Scene,
        frame: &FrameContext<'_>,
    ) -> Result<()> {
        gpu.bind_framebuffer(RenderTarget::Framebuffer(framebuffer))?;
        gpu.clear(None)?;
        for object in scene.shadow_casters() {
            object.render_shadow(gpu, frame)?;
        }
        Ok(())
    }

    fn main_pass(
        &self,
        gpu: &mut impl GpuContext,
        scene: &Scene,
        frame: &FrameContext<'_>,
    ) -> Result<()> {
        gpu.bind_framebuffer(RenderTarget::Screen)?;
        gpu.clear(Some(self.clear_color))?;

        let (skies, opaque): (Vec<_>, Vec<_>) =
            scene.objects().iter().partition(|object| object.is_sky());
        for object in opaque.into_iter().chain(skies).chain(scene.sky()) {
            object.render(gpu, frame)?;
        }
        Ok(())
    }

    /// Releases the shadow framebuffer. The depth texture belongs to the
    /// texture library. Calling it again does nothing.
    pub fn destroy(&mut self, gpu: &mut impl GpuContext) -> Result<()> {
        if let Some(framebuffer) = self.framebuffer.take() {
            gpu.release_framebuffer(framebuffer)?;
        }
        Ok(())
    }
}
