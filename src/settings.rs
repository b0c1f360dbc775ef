use std::path::PathBuf;

use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSettings {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "ViewerSettings::default_shadow_map_size")]
    pub shadow_map_size: u32,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
    #[serde(default = "ViewerSettings::default_target_fps")]
    pub target_fps: u32,
    #[serde(default = "ViewerSettings::default_asset_root")]
    pub asset_root: PathBuf,
    /// Seed for scene population. `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub skybox: SkyboxSetting,
    #[serde(default = "ViewerSettings::default_clear_color")]
    pub clear_color: [f32; 3],
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub light: LightSettings,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            shadow_map_size: Self::default_shadow_map_size(),
            present_mode: PresentModeSetting::default(),
            target_fps: Self::default_target_fps(),
            asset_root: Self::default_asset_root(),
            seed: None,
            skybox: SkyboxSetting::default(),
            clear_color: Self::default_clear_color(),
            camera: CameraSettings::default(),
            light: LightSettings::default(),
        }
    }
}

impl ViewerSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<ViewerSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded viewer settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default viewer settings.",
                        path, err
                    );
                    ViewerSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Viewer settings file {:?} not found. Using default settings.",
                    path
                );
                ViewerSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default viewer settings.",
                    path, err
                );
                ViewerSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if self.shadow_map_size == 0 {
            warn!("Shadow map size must be greater than zero. Using default value.");
            self.shadow_map_size = Self::default_shadow_map_size();
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if self.target_fps == 0 {
            warn!("Target frame rate must be greater than zero. Using default value.");
            self.target_fps = Self::default_target_fps();
        }

        if self.clear_color.iter().any(|c| !c.is_finite()) {
            warn!("Clear color must be finite. Using default color.");
            self.clear_color = Self::default_clear_color();
        }

        self.camera = self.camera.validate();
        self
    }

    pub fn present_mode(&self, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
        let desired = self.present_mode.to_wgpu();
        if available.contains(&desired) {
            return desired;
        }

        warn!(
            "Requested present mode {:?} is not supported. Falling back to FIFO.",
            desired
        );

        if available.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            available
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
    }

    pub fn clear_color_rgba(&self) -> [f32; 4] {
        let [r, g, b] = self.clear_color;
        [r, g, b, 1.0]
    }

    const fn default_shadow_map_size() -> u32 {
        2048
    }

    const fn default_target_fps() -> u32 {
        60
    }

    fn default_asset_root() -> PathBuf {
        PathBuf::from("assets")
    }

    const fn default_clear_color() -> [f32; 3] {
        [0.08, 0.16, 0.18]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 640,
            height: 640,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyboxSetting {
    /// Screen-covering triangle with per-pixel view rays.
    Advanced,
    /// Classic cube drawn around the camera.
    Cube,
}

impl Default for SkyboxSetting {
    fn default() -> Self {
        SkyboxSetting::Advanced
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of pointer motion.
    pub sensitivity: f32,
    pub position: [f32; 3],
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.1,
            far: 100.0,
            speed: 10.0,
            sensitivity: 0.04,
            position: [0.0, 0.0, 4.0],
            yaw_degrees: -90.0,
            pitch_degrees: 0.0,
        }
    }
}

impl CameraSettings {
    fn validate(mut self) -> Self {
        let defaults = Self::default();

        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            warn!("Camera field of view must be in (0, 180) degrees. Using default value.");
            self.fov_degrees = defaults.fov_degrees;
        }

        if !(self.near > 0.0 && self.far > self.near) {
            warn!("Camera clip planes must satisfy 0 < near < far. Using default planes.");
            self.near = defaults.near;
            self.far = defaults.far;
        }

        if !(self.speed.is_finite() && self.speed >= 0.0) {
            warn!("Camera speed must be non-negative. Using default value.");
            self.speed = defaults.speed;
        }

        if !(self.sensitivity.is_finite() && self.sensitivity >= 0.0) {
            warn!("Camera sensitivity must be non-negative. Using default value.");
            self.sensitivity = defaults.sensitivity;
        }

        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: [50.0, 50.0, -10.0],
            color: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeSetting {
    Fifo,
    FifoRelaxed,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeSetting {
    fn to_wgpu(&self) -> wgpu::PresentMode {
        match self {
            PresentModeSetting::Fifo => wgpu::PresentMode::Fifo,
            PresentModeSetting::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
            PresentModeSetting::Immediate => wgpu::PresentMode::Immediate,
            PresentModeSetting::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeSetting::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeSetting::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}

impl Default for PresentModeSetting {
    fn default() -> Self {
        PresentModeSetting::Fifo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_settings() -> ViewerSettings {
        ViewerSettings {
            shadow_map_size: 0,
            resolution: Resolution {
                width: 0,
                height: 0,
            },
            target_fps: 0,
            clear_color: [f32::NAN, 0.0, 0.0],
            camera: CameraSettings {
                fov_degrees: 0.0,
                near: 1.0,
                far: 0.5,
                speed: -1.0,
                ..CameraSettings::default()
            },
            ..ViewerSettings::default()
        }
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let validated = invalid_settings().validate();
        let defaults = ViewerSettings::default();

        assert_eq!(validated.shadow_map_size, defaults.shadow_map_size);
        assert_eq!(validated.resolution.width, Resolution::default().width);
        assert_eq!(validated.resolution.height, Resolution::default().height);
        assert_eq!(validated.target_fps, defaults.target_fps);
        assert_eq!(validated.clear_color, defaults.clear_color);
        assert_eq!(validated.camera.fov_degrees, defaults.camera.fov_degrees);
        assert_eq!(validated.camera.near, defaults.camera.near);
        assert_eq!(validated.camera.far, defaults.camera.far);
        assert_eq!(validated.camera.speed, defaults.camera.speed);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = ViewerSettings {
            shadow_map_size: 1024,
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            target_fps: 144,
            seed: Some(7),
            skybox: SkyboxSetting::Cube,
            ..ViewerSettings::default()
        };

        let validated = valid.clone().validate();

        assert_eq!(validated.shadow_map_size, valid.shadow_map_size);
        assert_eq!(validated.resolution.width, valid.resolution.width);
        assert_eq!(validated.target_fps, valid.target_fps);
        assert_eq!(validated.seed, Some(7));
        assert_eq!(validated.skybox, SkyboxSetting::Cube);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: ViewerSettings =
            serde_json::from_str(r#"{ "seed": 42, "skybox": "cube", "camera": { "speed": 3.0 } }"#)
                .unwrap();

        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.skybox, SkyboxSetting::Cube);
        assert_eq!(settings.camera.speed, 3.0);
        assert_eq!(settings.camera.fov_degrees, 50.0);
        assert_eq!(settings.shadow_map_size, 2048);
        assert_eq!(settings.light.position, [50.0, 50.0, -10.0]);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let settings = ViewerSettings::load_from_path("definitely/not/here/settings.json");
        assert_eq!(settings.resolution.width, 640);
        assert_eq!(settings.target_fps, 60);
    }

    #[test]
    fn present_mode_returns_desired_when_available() {
        let settings = ViewerSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..ViewerSettings::default()
        };

        let available = [
            wgpu::PresentMode::Fifo,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Immediate,
        ];

        assert_eq!(
            settings.present_mode(&available),
            wgpu::PresentMode::Mailbox
        );
    }

    #[test]
    fn present_mode_falls_back_to_fifo_when_desired_missing() {
        let settings = ViewerSettings {
            present_mode: PresentModeSetting::Mailbox,
            ..ViewerSettings::default()
        };

        let available = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];

        assert_eq!(settings.present_mode(&available), wgpu::PresentMode::Fifo);
    }
}
