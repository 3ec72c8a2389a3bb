//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::codec;
use crate::config::{load_config, SnapshotConfig};
use crate::error::{Error, Result, ResultExt};
use crate::report::SnapshotReport;
use crate::types::SaveOutcome;
use serde_json::json;
use std::fmt::Write as _;
use std::io::Write;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing to stdout
    pub fn run(&self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_to(&mut out)
    }

    /// Run the CLI command, writing to `out`
    pub fn run_to(&self, out: &mut impl Write) -> Result<()> {
        match &self.cli.command {
            Commands::Show { task } => self.show(task, out),
            Commands::Save { task, snapshot } => self.save(task, snapshot, out),
            Commands::Status => self.status(out),
            Commands::Inspect { snapshot } => self.inspect(snapshot, out),
            Commands::Validate => self.validate(out),
        }
    }

    /// Load the configuration file
    fn load_config(&self) -> Result<SnapshotConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -c flag)"))?;
        load_config(path).with_context(|| format!("loading {}", path.display()))
    }

    fn show(&self, task: &str, out: &mut impl Write) -> Result<()> {
        let config = self.load_config()?;
        let mut provider = config.open_provider(task)?;
        let snapshot = provider.get_snapshot();
        provider.close();

        match self.cli.format {
            OutputFormat::Json => {
                writeln!(out, "{}", json!({ "task": task, "snapshot": snapshot }))?;
            }
            OutputFormat::Pretty => writeln!(out, "{snapshot}")?,
        }
        Ok(())
    }

    fn save(&self, task: &str, snapshot: &str, out: &mut impl Write) -> Result<()> {
        let config = self.load_config()?;
        let mut provider = config.open_provider(task)?;
        let outcome = provider.save(snapshot);
        provider.close();

        match self.cli.format {
            OutputFormat::Json => {
                writeln!(out, "{}", json!({ "task": task, "outcome": outcome }))?;
            }
            OutputFormat::Pretty => writeln!(out, "{task}: {outcome:?}")?,
        }

        match outcome {
            SaveOutcome::Persisted | SaveOutcome::SkippedEmpty => Ok(()),
            SaveOutcome::Rejected => Err(Error::invalid_task(
                task,
                "snapshot is not valid standard base64",
            )),
            SaveOutcome::Failed => Err(Error::Other(format!(
                "snapshot for task '{task}' was not persisted"
            ))),
        }
    }

    fn status(&self, out: &mut impl Write) -> Result<()> {
        let config = self.load_config()?;

        for task in &config.tasks {
            let mut provider = config.open_provider(&task.id)?;
            let report = SnapshotReport::collect(task.id.clone(), provider.as_mut());
            provider.close();

            match self.cli.format {
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&report)?)?,
                OutputFormat::Pretty => {
                    let modified = report
                        .modified_at
                        .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
                    writeln!(
                        out,
                        "{:<20} {:<9} {:>6}B  {}  {}",
                        report.task,
                        report.kind,
                        report.bytes,
                        modified,
                        report.location.display()
                    )?;
                }
            }
        }
        Ok(())
    }

    fn inspect(&self, snapshot: &str, out: &mut impl Write) -> Result<()> {
        let bytes = codec::decode(snapshot)?;
        let hex = to_hex(&bytes);

        match self.cli.format {
            OutputFormat::Json => {
                writeln!(out, "{}", json!({ "bytes": bytes.len(), "hex": hex }))?;
            }
            OutputFormat::Pretty => {
                writeln!(out, "{} bytes", bytes.len())?;
                for (i, chunk) in bytes.chunks(16).enumerate() {
                    writeln!(out, "{:08x}  {}", i * 16, to_hex(chunk))?;
                }
            }
        }
        Ok(())
    }

    fn validate(&self, out: &mut impl Write) -> Result<()> {
        let config = self.load_config()?;
        match self.cli.format {
            OutputFormat::Json => writeln!(
                out,
                "{}",
                json!({ "valid": true, "tasks": config.tasks.len() })
            )?,
            OutputFormat::Pretty => writeln!(out, "OK ({} tasks)", config.tasks.len())?,
        }
        Ok(())
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn run(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        Runner::new(cli).run_to(&mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn write_config(dir: &std::path::Path) -> String {
        let config = dir.join("snapcursor.yaml");
        std::fs::write(
            &config,
            format!(
                "state_dir: {}\ntasks:\n  - id: orders\n    kind: postgres\n",
                dir.join("state").display()
            ),
        )
        .unwrap();
        config.display().to_string()
    }

    #[test]
    fn test_save_then_show() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());

        let saved = run(&["snapcursor", "-c", config.as_str(), "save", "orders", "AQID"]).unwrap();
        assert!(saved.contains("\"persisted\""));

        let shown = run(&[
            "snapcursor",
            "-c",
            config.as_str(),
            "-f",
            "pretty",
            "show",
            "orders",
        ])
        .unwrap();
        assert_eq!(shown.trim(), "AQID");
    }

    #[test]
    fn test_save_rejected_snapshot_is_an_error() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());

        let err =
            run(&["snapcursor", "-c", config.as_str(), "save", "orders", "@@"]).unwrap_err();
        assert!(matches!(err, Error::InvalidTask { .. }));

        let shown = run(&["snapcursor", "-c", config.as_str(), "show", "orders"]).unwrap();
        assert!(shown.contains("\"snapshot\":\"\""));
    }

    #[test]
    fn test_save_storage_failure_is_an_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let config = dir.path().join("snapcursor.yaml");
        std::fs::write(
            &config,
            format!(
                "state_dir: {}\ntasks:\n  - id: orders\n    kind: postgres\n",
                blocker.display()
            ),
        )
        .unwrap();
        let config = config.display().to_string();

        let err =
            run(&["snapcursor", "-c", config.as_str(), "save", "orders", "AQID"]).unwrap_err();
        assert!(err.to_string().contains("not persisted"));
    }

    #[test]
    fn test_status_reports_tasks() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());

        let status = run(&["snapcursor", "-c", config.as_str(), "status"]).unwrap();
        let report: SnapshotReport = serde_json::from_str(status.trim()).unwrap();
        assert_eq!(report.task, "orders");
        assert!(report.is_fresh());
    }

    #[test]
    fn test_inspect() {
        let out = run(&["snapcursor", "inspect", "AQID"]).unwrap();
        assert!(out.contains("\"hex\":\"010203\""));

        assert!(run(&["snapcursor", "inspect", "@@"]).unwrap_err().is_decode());
    }

    #[test]
    fn test_missing_config_flag() {
        let err = run(&["snapcursor", "validate"]).unwrap_err();
        assert!(err.to_string().contains("-c"));
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x00, 0xab, 0xff]), "00abff");
    }
}
