use serde::Serialize;

/// Version information of this exporter binary.
///
/// `ZLM_EXPORTER_COMMIT` and `ZLM_EXPORTER_BUILD_DATE` are read at compile
/// time when set by the build environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub build_date: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("ZLM_EXPORTER_COMMIT")
                .unwrap_or("unknown")
                .to_string(),
            build_date: option_env!("ZLM_EXPORTER_BUILD_DATE")
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}
