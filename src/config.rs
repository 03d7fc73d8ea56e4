use std::path::PathBuf;

pub const MODEL_ENV: &str = "LEARNING_PATH_MODEL";
pub const LOG_ENV: &str = "LEARNING_PATH_LOG";
pub const DEFAULT_MODEL_PATH: &str = "demos/student_model_v2.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model_path: PathBuf,
}

impl Settings {
    /// The `--model` flag wins over the environment, which wins over the default.
    pub fn resolve(model_flag: Option<PathBuf>) -> Self {
        Self::resolve_with(model_flag, std::env::var(MODEL_ENV).ok())
    }

    fn resolve_with(model_flag: Option<PathBuf>, model_env: Option<String>) -> Self {
        let model_path = model_flag
            .or_else(|| {
                model_env
                    .filter(|value| !value.trim().is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        tracing::debug!(model_path = %model_path.display(), "resolved settings");
        Settings { model_path }
    }
}
