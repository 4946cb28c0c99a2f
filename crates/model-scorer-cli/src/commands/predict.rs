use std::io::Write;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{ArgGroup, Args};
use model_scorer::{FeatureVector, ModelLoader, ScorerConfig};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["features", "input"])))]
pub struct PredictArgs {
    /// Feature values as a JSON object, e.g. '{"age": 42, "income": 1.5}'.
    #[arg(long)]
    pub features: Option<String>,
    /// Path to a file holding the JSON object.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Score with this version instead of the latest one.
    #[arg(long)]
    pub version: Option<u64>,
}

impl PredictArgs {
    fn feature_vector(&self) -> anyhow::Result<FeatureVector> {
        let raw = match (&self.features, &self.input) {
            (Some(json), _) => json.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, None) => anyhow::bail!("Either --features or --input is required"),
        };
        parse_features(&raw)
    }
}

/// Parse a JSON object of feature name to number.
pub fn parse_features(raw: &str) -> anyhow::Result<FeatureVector> {
    serde_json::from_str(raw).context("Features must be a JSON object of numbers")
}

/// Writes only the probability to `out`, so it can be piped.
pub fn handle_command(
    args: PredictArgs,
    config: &ScorerConfig,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let data = args.feature_vector()?;
    let loader = ModelLoader::from_config(config);
    let model = match args.version {
        Some(version) => loader.load_version(version)?,
        None => loader.load()?,
    };

    let ignored: Vec<&str> = data
        .keys()
        .filter(|k| !model.feature_names().contains(k))
        .map(String::as_str)
        .collect();
    if !ignored.is_empty() {
        log::debug!("Ignoring unknown features: {}", ignored.join(", "));
    }

    let probability = model.predict(&data)?;
    log::info!("Feature vector scored with {}", model.uri());
    writeln!(out, "{probability}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_feature_objects() {
        let data = parse_features(r#"{"age": 42, "income": 1.5}"#).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["age"], 42.0);
        assert_eq!(data["income"], 1.5);
    }

    #[rstest]
    #[case(r#"[1, 2]"#)]
    #[case(r#"{"age": "old"}"#)]
    #[case("not json")]
    fn rejects_non_numeric_objects(#[case] raw: &str) {
        assert!(parse_features(raw).is_err());
    }

    #[test]
    fn reads_features_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("row.json");
        std::fs::write(&path, r#"{"f1": 1.0}"#).unwrap();

        let args = PredictArgs {
            features: None,
            input: Some(path),
            version: None,
        };
        assert_eq!(args.feature_vector().unwrap()["f1"], 1.0);
    }
}
