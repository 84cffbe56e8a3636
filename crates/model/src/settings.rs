use crate::restorer::RestoreOptions;

/// Model tunables shared by every restoration.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model_path: String,
    pub upscale: u32,
    pub arch: String,
    pub channel_multiplier: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_path: "experiments/pretrained_models/GFPGANCleanv1-NoCE-C2.pth".into(),
            upscale: 2,
            arch: "clean".into(),
            channel_multiplier: 2,
        }
    }
}

impl ModelSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                                  |
    /// |----------------------------|----------------------------------------------------------|
    /// | `MODEL_PATH`               | `experiments/pretrained_models/GFPGANCleanv1-NoCE-C2.pth` |
    /// | `MODEL_UPSCALE`            | `2`                                                      |
    /// | `MODEL_ARCH`               | `clean`                                                  |
    /// | `MODEL_CHANNEL_MULTIPLIER` | `2`                                                      |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model_path = std::env::var("MODEL_PATH").unwrap_or(defaults.model_path);

        let upscale: u32 = std::env::var("MODEL_UPSCALE")
            .unwrap_or_else(|_| defaults.upscale.to_string())
            .parse()
            .expect("MODEL_UPSCALE must be a valid u32");

        let arch = std::env::var("MODEL_ARCH").unwrap_or(defaults.arch);

        let channel_multiplier: u32 = std::env::var("MODEL_CHANNEL_MULTIPLIER")
            .unwrap_or_else(|_| defaults.channel_multiplier.to_string())
            .parse()
            .expect("MODEL_CHANNEL_MULTIPLIER must be a valid u32");

        Self {
            model_path,
            upscale,
            arch,
            channel_multiplier,
        }
    }

    /// Options for one restoration hiding the given faces.
    pub fn options(&self, hide_faces: Vec<u32>) -> RestoreOptions {
        RestoreOptions {
            model_path: self.model_path.clone(),
            upscale: self.upscale,
            arch: self.arch.clone(),
            channel_multiplier: self.channel_multiplier,
            hide_faces,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_carry_settings_and_hidden_faces() {
        let options = ModelSettings::default().options(vec![0, 2]);
        assert_eq!(options.upscale, 2);
        assert_eq!(options.arch, "clean");
        assert_eq!(options.channel_multiplier, 2);
        assert_eq!(options.hide_faces, vec![0, 2]);
        assert!(options.model_path.ends_with(".pth"));
    }
}
