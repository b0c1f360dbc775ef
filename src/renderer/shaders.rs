use log::{debug, info};

use crate::error::{Result, Teardown};
use crate::gpu::{GpuContext, ProgramDescriptor, ProgramId, ProgramKind};

const LIT: &str = concat!(
    include_str!("../shader/uniforms.wgsl"),
    "\n",
    include_str!("../shader/lit.wgsl")
);
const SHADOW_MAP: &str = concat!(
    include_str!("../shader/uniforms.wgsl"),
    "\n",
    include_str!("../shader/shadow.wgsl")
);
const SKYBOX: &str = concat!(
    include_str!("../shader/uniforms.wgsl"),
    "\n",
    include_str!("../shader/skybox.wgsl")
);
const ADVANCED_SKYBOX: &str = concat!(
    include_str!("../shader/uniforms.wgsl"),
    "\n",
    include_str!("../shader/advanced_skybox.wgsl")
);

pub const PROGRAM_KINDS: [ProgramKind; 4] = [
    ProgramKind::Lit,
    ProgramKind::ShadowMap,
    ProgramKind::Skybox,
    ProgramKind::AdvancedSkybox,
];

pub fn label(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::Lit => "default",
        ProgramKind::ShadowMap => "shadow_map",
        ProgramKind::Skybox => "skybox",
        ProgramKind::AdvancedSkybox => "advanced_skybox",
    }
}

pub fn source(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::Lit => LIT,
        ProgramKind::ShadowMap => SHADOW_MAP,
        ProgramKind::Skybox => SKYBOX,
        ProgramKind::AdvancedSkybox => ADVANCED_SKYBOX,
    }
}

/// One compiled program per [`ProgramKind`].
pub struct ShaderLibrary {
    programs: Vec<(ProgramKind, ProgramId)>,
}

impl ShaderLibrary {
    pub fn new(gpu: &mut impl GpuContext) -> Result<Self> {
        let mut programs = Vec::with_capacity(PROGRAM_KINDS.len());
        for kind in PROGRAM_KINDS {
            let id = gpu.create_program(&ProgramDescriptor {
                label: label(kind),
                kind,
                source: source(kind),
            })?;
            debug!("Compiled program `{}` as {:?}", label(kind), id);
            programs.push((kind, id));
        }
        info!("Compiled {} shader programs", programs.len());
        Ok(Self { programs })
    }

    /// `None` once the library is destroyed.
    pub fn program(&self, kind: ProgramKind) -> Option<ProgramId> {
        self.programs
            .iter()
            .find_map(|&(k, id)| (k == kind).then_some(id))
    }

    /// Releases every program, newest first. Calling it again does nothing.
    pub fn destroy(&mut self, gpu: &mut impl GpuContext) -> Result<()> {
        let mut teardown = Teardown::new();
        while let Some((_, id)) = self.programs.pop() {
            teardown.check(gpu.release_program(id));
        }
        teardown.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::RecordingContext;

    #[test]
    fn every_source_has_a_vertex_entry_point() {
        for kind in PROGRAM_KINDS {
            assert!(source(kind).contains("fn vs_main"), "{kind:?}");
            assert!(source(kind).contains("struct DrawUniforms"), "{kind:?}");
        }
        assert!(!source(ProgramKind::ShadowMap).contains("fn fs_main"));
    }

    #[test]
    fn destroy_releases_each_program_once() {
        let mut gpu = RecordingContext::new();
        let mut shaders = ShaderLibrary::new(&mut gpu).unwrap();
        assert!(shaders.program(ProgramKind::Lit).is_some());

        shaders.destroy(&mut gpu).unwrap();
        shaders.destroy(&mut gpu).unwrap();

        assert_eq!(gpu.releases().count(), PROGRAM_KINDS.len());
        assert_eq!(gpu.live_resources(), 0);
        assert!(shaders.program(ProgramKind::Lit).is_none());
    }
}
