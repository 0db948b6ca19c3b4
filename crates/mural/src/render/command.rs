use std::{
    env, io,
    path::{MAIN_SEPARATOR, Path, PathBuf},
    process::Stdio,
};

use log::{debug, trace};
use tokio::{
    io::AsyncWriteExt,
    process::{Child, Command},
};

use mural_core::artifact::RenderStyle;

use super::{RenderError, RenderOutput, Renderer};
use crate::config::{RendererConfig, ThemeConfig};

/// Environment variable carrying the requested style name.
pub const STYLE_ENV: &str = "MURAL_STYLE";

/// Environment variable carrying the theme name, when one is configured.
pub const THEME_ENV: &str = "MURAL_THEME";

/// Environment variable carrying the background color, when one is configured.
pub const BACKGROUND_ENV: &str = "MURAL_BACKGROUND";

/// Renders by running an external program once per request.
///
/// The diagram source is written to the program's stdin and the markup is
/// read from its stdout. Style and theme travel in the environment
/// ([`STYLE_ENV`], [`THEME_ENV`], [`BACKGROUND_ENV`]). A non-zero exit is a
/// rejection carrying whatever the program wrote to stderr.
///
/// The child is killed if the render future is dropped before it completes.
/// Stale renders issued by the scheduler are not dropped; they run to
/// completion and their output is discarded.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds a renderer from the `[renderer]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotConfigured`] if the command is empty.
    pub fn from_config(config: &RendererConfig) -> Result<Self, RenderError> {
        let (program, args) = config
            .command()
            .split_first()
            .ok_or(RenderError::NotConfigured)?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Locates the program without running it.
    ///
    /// Programs given with a path are checked directly; bare names are
    /// searched for in `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotFound`] if no matching file exists.
    pub async fn probe(&self) -> Result<PathBuf, RenderError> {
        let candidates: Vec<PathBuf> = if self.program.contains(MAIN_SEPARATOR)
            || Path::new(&self.program).is_absolute()
        {
            vec![PathBuf::from(&self.program)]
        } else {
            env::var_os("PATH")
                .map(|paths| {
                    env::split_paths(&paths)
                        .map(|dir| dir.join(&self.program))
                        .collect()
                })
                .unwrap_or_default()
        };

        for candidate in candidates {
            let is_file = tokio::fs::metadata(&candidate)
                .await
                .is_ok_and(|metadata| metadata.is_file());
            if is_file {
                debug!(program = self.program, path:? = candidate; "Renderer program found");
                return Ok(candidate);
            }
        }

        Err(RenderError::NotFound(self.program.clone()))
    }

    fn spawn(&self, style: RenderStyle, theme: &ThemeConfig) -> Result<Child, RenderError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(STYLE_ENV, style.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(name) = theme.name() {
            command.env(THEME_ENV, name);
        }
        if let Some(background) = theme.background_color_str() {
            command.env(BACKGROUND_ENV, background);
        }

        command.spawn().map_err(|source| self.spawn_error(source))
    }

    fn spawn_error(&self, source: io::Error) -> RenderError {
        RenderError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl Renderer for CommandRenderer {
    async fn render(
        &self,
        source: &str,
        style: RenderStyle,
        theme: &ThemeConfig,
    ) -> Result<RenderOutput, RenderError> {
        let mut child = self.spawn(style, theme)?;
        trace!(program = self.program, source_len = source.len(); "Renderer spawned");

        let stdin = child.stdin.take();
        let write_input = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(source.as_bytes()).await?;
            }
            Ok::<(), io::Error>(())
        };

        let (written, output) = tokio::join!(write_input, child.wait_with_output());
        let output = output.map_err(|source| self.spawn_error(source))?;

        // A renderer may exit before reading all of its input.
        match written {
            Err(err) if err.kind() != io::ErrorKind::BrokenPipe => {
                return Err(self.spawn_error(err));
            }
            _ => {}
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("renderer exited with {}", output.status),
                trimmed => trimmed.to_string(),
            };
            debug!(program = self.program, status:% = output.status; "Renderer rejected source");
            return Err(RenderError::Rejected(message));
        }

        let markup = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(if style.is_text() {
            RenderOutput::TextGrid(markup)
        } else {
            RenderOutput::Visual(markup)
        })
    }
}
