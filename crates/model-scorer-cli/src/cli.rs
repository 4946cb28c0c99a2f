use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use model_scorer::ScorerConfig;

use crate::commands;

#[derive(Args, Debug, Default)]
pub struct RegistryArgs {
    /// Registry endpoint. Falls back to `MLFLOW_TRACKING_URI`.
    #[arg(long, global = true)]
    pub tracking_uri: Option<String>,
    /// Registered model name. Falls back to `MODEL_NAME`.
    #[arg(long, global = true)]
    pub model_name: Option<String>,
    /// Read the registry settings from a TOML file instead of the environment.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(name = "scorer", author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the registered versions of the model.
    Versions,
    /// Score one feature vector with the latest (or a pinned) version.
    Predict(commands::predict::PredictArgs),
}

impl RegistryArgs {
    /// Command line flags win over the file or environment they fall back to.
    pub fn resolve(&self) -> anyhow::Result<ScorerConfig> {
        let config = match &self.config {
            Some(path) => {
                let base = ScorerConfig::from_toml_file(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                let mut builder = ScorerConfig::builder(
                    self.model_name
                        .clone()
                        .unwrap_or_else(|| base.model_name().to_string()),
                )
                .with_tracking_uri(
                    self.tracking_uri
                        .clone()
                        .unwrap_or_else(|| base.tracking_uri().to_string()),
                );
                builder = builder.with_credentials(base.credentials().cloned());
                builder.build()?
            }
            None => ScorerConfig::from_lookup(|key| match key {
                "MODEL_NAME" if self.model_name.is_some() => self.model_name.clone(),
                "MLFLOW_TRACKING_URI" if self.tracking_uri.is_some() => self.tracking_uri.clone(),
                _ => std::env::var(key).ok(),
            })?,
        };
        Ok(config)
    }
}

pub fn cli_main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = args
        .registry
        .resolve()
        .context("Invalid registry configuration")?;

    let mut stdout = std::io::stdout().lock();
    match args.command {
        Commands::Versions => commands::versions::handle_command(&config, &mut stdout),
        Commands::Predict(predict_args) => {
            commands::predict::handle_command(predict_args, &config, &mut stdout)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_predict_args() {
        let args = vec![
            "scorer",
            "--model-name",
            "churn",
            "predict",
            "--features",
            r#"{"age": 42}"#,
            "--version",
            "3",
        ];
        let cli_args = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(cli_args.registry.model_name.as_deref(), Some("churn"));
        assert!(cli_args.registry.tracking_uri.is_none());
        match cli_args.command {
            Commands::Predict(predict) => {
                assert_eq!(predict.features.as_deref(), Some(r#"{"age": 42}"#));
                assert_eq!(predict.version, Some(3));
                assert!(predict.input.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = vec!["scorer", "versions", "--tracking-uri", "http://registry:5000"];
        let cli_args = CliArgs::try_parse_from(args).unwrap();
        assert!(matches!(cli_args.command, Commands::Versions));
        assert_eq!(
            cli_args.registry.tracking_uri.as_deref(),
            Some("http://registry:5000")
        );
    }

    #[test]
    fn test_features_and_input_conflict() {
        let args = vec![
            "scorer",
            "predict",
            "--features",
            "{}",
            "--input",
            "row.json",
        ];
        assert!(CliArgs::try_parse_from(args).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scorer.toml");
        std::fs::write(
            &path,
            "tracking_uri = \"http://registry:5000\"\nmodel_name = \"churn\"\n\n[credentials]\ntoken = \"t\"\n",
        )
        .unwrap();

        let registry = RegistryArgs {
            tracking_uri: None,
            model_name: Some("fraud".to_string()),
            config: Some(path),
        };
        let config = registry.resolve().unwrap();
        assert_eq!(config.model_name(), "fraud");
        assert_eq!(config.tracking_uri().host_str(), Some("registry"));
        assert!(config.credentials().is_some());
    }
}
