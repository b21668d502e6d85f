use crate::config::UpscalerConfig;
use crate::error::Error;

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

/// Writes the upscaled frames of `input` into `output` under the same names.
pub trait Upscaler: Sync + Send + std::fmt::Display {
    fn upscale(&self, chunk: usize, input: &Path, output: &Path) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct Model {
    config: UpscalerConfig,
}

impl Model {
    pub fn new(config: UpscalerConfig) -> Self {
        Self { config }
    }

    fn program(&self) -> String {
        self.config.binary.to_string_lossy().into_owned()
    }

    pub fn check(&self) -> Result<(), Error> {
        match Command::new(&self.config.binary)
            .arg("-h")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::UpscalerNotAvailable(self.program()))
            }
            Err(e) => Err(Error::UpscalerNotAvailable(format!("{}: {}", self.program(), e))),
            Ok(mut child) => {
                let _ = child.kill();
                let _ = child.wait();
                Ok(())
            }
        }
    }

    fn arguments<'a>(&'a self, input: &'a Path, output: &'a Path) -> Vec<std::borrow::Cow<'a, OsStr>> {
        use std::borrow::Cow;

        let mut args: Vec<Cow<'a, OsStr>> = vec![
            Cow::Borrowed(OsStr::new("-i")),
            Cow::Borrowed(input.as_os_str()),
            Cow::Borrowed(OsStr::new("-o")),
            Cow::Borrowed(output.as_os_str()),
            Cow::Borrowed(OsStr::new("-m")),
            Cow::Borrowed(OsStr::new(&self.config.model)),
            Cow::Borrowed(OsStr::new("-n")),
            Cow::Owned(self.config.denoise_level.to_string().into()),
            Cow::Borrowed(OsStr::new("-t")),
            Cow::Owned(self.config.tile_size.to_string().into()),
            Cow::Borrowed(OsStr::new("-c")),
            Cow::Owned(self.config.compression.to_string().into()),
        ];
        if let Some(scale) = self.config.scale {
            args.push(Cow::Borrowed(OsStr::new("-s")));
            args.push(Cow::Owned(scale.to_string().into()));
        }
        if let Some(threads) = &self.config.threads {
            args.push(Cow::Borrowed(OsStr::new("-j")));
            args.push(Cow::Borrowed(OsStr::new(threads)));
        }
        if let Some(gpu) = &self.config.gpu {
            args.push(Cow::Borrowed(OsStr::new("-g")));
            args.push(Cow::Borrowed(OsStr::new(gpu)));
        }
        args
    }
}

impl Upscaler for Model {
    fn upscale(&self, chunk: usize, input: &Path, output: &Path) -> Result<(), Error> {
        let mut command = Command::new(&self.config.binary);
        command
            .args(self.arguments(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        debug!(command = ?command, "running");

        let result = command.output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::UpscalerNotAvailable(self.program()),
            _ => Error::Io(e),
        })?;

        if !result.status.success() {
            let message = match Error::command(&self.program(), &result.stderr) {
                Error::CommandFailed { message, .. } => message,
                other => other.to_string(),
            };
            return Err(Error::UpscaleFailed { chunk, message });
        }
        Ok(())
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let binary = self
            .config
            .binary
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program());
        write!(f, "{} ({}, denoise {})", binary, self.config.model, self.config.denoise_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(model: &Model) -> Vec<String> {
        model
            .arguments(Path::new("in/"), Path::new("out/"))
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn default_arguments_match_reference_invocation() {
        let model = Model::new(UpscalerConfig::default());
        assert_eq!(
            args(&model),
            ["-i", "in/", "-o", "out/", "-m", "models-pro", "-n", "3", "-t", "5000", "-c", "2"]
        );
    }

    #[test]
    fn optional_settings_are_appended() {
        let model = Model::new(UpscalerConfig {
            scale: Some(4),
            threads: Some("1:2:2".to_string()),
            gpu: Some("0".to_string()),
            ..UpscalerConfig::default()
        });
        let args = args(&model);
        assert_eq!(&args[12..], ["-s", "4", "-j", "1:2:2", "-g", "0"]);
    }

    #[test]
    fn display_names_binary_and_model() {
        let model = Model::new(UpscalerConfig::default());
        assert_eq!(model.to_string(), "realcugan-ncnn-vulkan (models-pro, denoise 3)");
    }

    #[test]
    fn missing_binary_is_reported() {
        let model = Model::new(UpscalerConfig {
            binary: "/nonexistent/realcugan-ncnn-vulkan".into(),
            ..UpscalerConfig::default()
        });
        assert!(matches!(model.check(), Err(Error::UpscalerNotAvailable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_binary_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("realcugan-ncnn-vulkan");
        std::fs::write(&binary, b"not a program").unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o644)).unwrap();

        let model = Model::new(UpscalerConfig { binary, ..UpscalerConfig::default() });
        assert!(matches!(model.check(), Err(Error::UpscalerNotAvailable(_))));
    }
}
