use figment::providers::{Format, Json, Toml, Yaml};
use std::path::{Path, PathBuf};

/// Extensions probed when looking for `<base>.<ext>`, in priority order
const EXTENSIONS: [&str; 4] = ["toml", "json", "yaml", "yml"];

/// Configuration file loader that chooses the format from the file extension.
/// Returns a provider that can be passed straight to `Figment::merge`.
pub fn auto<P: AsRef<Path>>(path: P) -> impl figment::Provider {
    let path = path.as_ref();
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "toml" => SmartProvider::Toml(Toml::file(path)),
        "json" => SmartProvider::Json(Json::file(path)),
        "yaml" | "yml" => SmartProvider::Yaml(Yaml::file(path)),
        _ => {
            let detected = std::fs::read_to_string(path)
                .ok()
                .and_then(|content| detect_format_from_content(&content));
            tracing::debug!(
                "No known extension on {}, detected format: {:?}",
                path.display(),
                detected
            );
            match detected {
                Some(FileFormat::Json) => SmartProvider::Json(Json::file(path)),
                Some(FileFormat::Yaml) => SmartProvider::Yaml(Yaml::file(path)),
                Some(FileFormat::Toml) | None => SmartProvider::Toml(Toml::file(path)),
            }
        }
    }
}

/// First existing `<base>.<ext>` for the supported extensions
pub fn find(base: &Path) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| base.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

enum SmartProvider {
    Toml(figment::providers::Data<Toml>),
    Json(figment::providers::Data<Json>),
    Yaml(figment::providers::Data<Yaml>),
}

impl figment::Provider for SmartProvider {
    fn metadata(&self) -> figment::Metadata {
        match self {
            SmartProvider::Toml(p) => p.metadata(),
            SmartProvider::Json(p) => p.metadata(),
            SmartProvider::Yaml(p) => p.metadata(),
        }
    }

    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        match self {
            SmartProvider::Toml(p) => p.data(),
            SmartProvider::Json(p) => p.data(),
            SmartProvider::Yaml(p) => p.data(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Json,
    Yaml,
}

fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(FileFormat::Json);
    }

    let lines = || trimmed.lines().map(str::trim).filter(|l| !l.starts_with('#'));

    // TOML section headers or `key = value`
    if lines().any(|line| {
        (line.starts_with('[') && line.ends_with(']'))
            || (line.contains('=') && !line.contains(':'))
    }) {
        return Some(FileFormat::Toml);
    }

    if trimmed.starts_with("---") || lines().any(|line| line.contains(':')) {
        return Some(FileFormat::Yaml);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(detect_format_from_content(r#"{"scanner": {}}"#), Some(FileFormat::Json));
        assert_eq!(
            detect_format_from_content("scanner:\n  version: 3.3.7"),
            Some(FileFormat::Yaml)
        );
        assert_eq!(
            detect_format_from_content("[scanner]\nversion = \"3.3.7\""),
            Some(FileFormat::Toml)
        );
        assert_eq!(detect_format_from_content("# nothing here"), None);
    }

    #[test]
    fn test_find_prefers_toml() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("nuclei-step");
        assert_eq!(find(&base), None);

        std::fs::write(base.with_extension("yml"), "a: 1").unwrap();
        assert_eq!(find(&base), Some(base.with_extension("yml")));

        std::fs::write(base.with_extension("toml"), "a = 1").unwrap();
        assert_eq!(find(&base), Some(base.with_extension("toml")));
    }
}
