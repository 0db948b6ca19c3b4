//! CLI logic for the Mural diagram tool.
//!
//! Every subcommand that renders does so through a [`Session`], so the CLI
//! exercises the same debounce, fencing and share-link logic an editor
//! front end would.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{
    fs,
    future::Future,
    io::{self, Write},
    pin::pin,
    time::Duration,
};

use log::{debug, info, warn};
use tokio::time::MissedTickBehavior;
use url::Url;

use mural::{
    MuralError, RenderError, Renderer, Session, SessionUpdate,
    artifact::{ExportScale, RenderResult, RenderStyle},
    codec::location::{read_token, write_token},
    config::AppConfig,
    render::{CommandRenderer, LazyRenderer},
};

/// Run the Mural CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `MuralError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Share links that cannot be decoded
/// - Renderer setup errors and rejected diagrams
pub fn run(args: &Args) -> Result<(), MuralError> {
    let app_config = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Encode { input, base_url } => {
            let source = fs::read_to_string(input)?;
            println!("{}", encode_link(&app_config, &source, base_url.as_deref())?);
        }
        Command::Decode { link } => {
            print!("{}", decode_link(&app_config, link)?);
            io::stdout().flush()?;
        }
        Command::Render {
            input,
            output,
            style,
            scale,
        } => {
            info!(input_path = input; "Rendering diagram");
            let config = with_style(app_config, *style);
            runtime()?.block_on(render_file(&config, input, output.as_deref(), *scale))?;
        }
        Command::Watch {
            input,
            output,
            style,
            poll_ms,
        } => {
            let config = with_style(app_config, *style);
            runtime()?.block_on(watch_file(
                &config,
                input,
                output.as_deref(),
                Duration::from_millis(*poll_ms),
                shutdown_signal(),
            ))?;
        }
    }

    Ok(())
}

/// Encodes `source` into a share token, or into a full share address when
/// `base_url` is given.
///
/// # Errors
///
/// Returns an error if compression fails or `base_url` is not an address.
pub fn encode_link(
    config: &AppConfig,
    source: &str,
    base_url: Option<&str>,
) -> Result<String, MuralError> {
    let token = config.codec().build().encode(source)?;
    let Some(base_url) = base_url else {
        return Ok(token);
    };

    let mut url = Url::parse(base_url)?;
    write_token(&mut url, &token);
    Ok(url.into())
}

/// Decodes a bare token or the token carried by a share address.
///
/// # Errors
///
/// Returns an error if the address has no token or the token does not
/// decode.
pub fn decode_link(config: &AppConfig, link: &str) -> Result<String, MuralError> {
    let link = link.trim();
    let token = match Url::parse(link) {
        Ok(url) => read_token(&url).ok_or(MuralError::MissingShareToken)?,
        Err(_) => link.to_string(),
    };
    Ok(config.codec().build().decode(&token)?)
}

fn with_style(config: AppConfig, style: Option<RenderStyle>) -> AppConfig {
    match style {
        Some(style) => config.with_style(style),
        None => config,
    }
}

fn runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Opens a session on `source` backed by the configured renderer command.
///
/// The command is located before the first render so a missing program is
/// reported as such rather than as a failed render.
async fn open_session(
    config: &AppConfig,
    source: String,
) -> Result<Session<impl Renderer>, MuralError> {
    let command = CommandRenderer::from_config(config.renderer())?;
    let renderer = LazyRenderer::new(move || {
        let command = command.clone();
        async move {
            command.probe().await?;
            Ok::<_, RenderError>(command)
        }
    });
    renderer.get().await?;

    let location = Url::parse(config.session().base_url())?;
    Ok(Session::with_source(renderer, config, location, source))
}

async fn render_file(
    config: &AppConfig,
    input: &str,
    output: Option<&str>,
    scale: ExportScale,
) -> Result<(), MuralError> {
    let source = tokio::fs::read_to_string(input).await?;
    let mut session = open_session(config, source).await?;

    let update = session
        .next_update()
        .await
        .ok_or(MuralError::SessionClosed)?;
    let markup = match update.result() {
        RenderResult::Failed(message) => {
            return Err(RenderError::Rejected(message.clone()).into());
        }
        RenderResult::Visual(markup) | RenderResult::TextGrid(markup) => markup,
    };
    write_output(markup, output).await?;

    if let Some(plan) = session.export_plan(scale) {
        let (width, height) = plan.pixel_size();
        info!(width = width, height = height, scale:% = scale; "Export size");
    }
    info!(share_url = update.location().as_str(); "Share link ready");

    Ok(())
}

enum WatchEvent {
    Applied(Option<SessionUpdate>),
    Poll,
    Stop,
}

/// Renders `input` and re-renders it whenever its contents change, until
/// `stop` completes.
async fn watch_file(
    config: &AppConfig,
    input: &str,
    output: Option<&str>,
    poll: Duration,
    stop: impl Future<Output = ()>,
) -> Result<(), MuralError> {
    let source = tokio::fs::read_to_string(input).await?;
    let mut session = open_session(config, source).await?;

    let mut poll_timer = tokio::time::interval(poll);
    poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stop = pin!(stop);
    info!(input_path = input; "Watching for changes");

    loop {
        let event = tokio::select! {
            update = session.next_update() => WatchEvent::Applied(update),
            _ = poll_timer.tick() => WatchEvent::Poll,
            () = &mut stop => WatchEvent::Stop,
        };

        match event {
            WatchEvent::Applied(Some(update)) => match update.result() {
                RenderResult::Failed(message) => {
                    warn!(seq = update.seq(), error = message.as_str(); "Render failed");
                }
                RenderResult::Visual(markup) | RenderResult::TextGrid(markup) => {
                    write_output(markup, output).await?;
                    info!(
                        seq = update.seq(),
                        share_url = update.location().as_str();
                        "Render applied"
                    );
                }
            },
            WatchEvent::Poll => match tokio::fs::read_to_string(input).await {
                Ok(source) if source != session.source() => {
                    debug!(source_len = source.len(); "Input changed");
                    session.edit(source);
                }
                Ok(_) => {}
                // Editors that save by rename leave the path briefly missing.
                Err(err) => debug!(error:% = err; "Could not read input"),
            },
            WatchEvent::Applied(None) | WatchEvent::Stop => break,
        }
    }

    info!("Stopped watching");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error:% = err; "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn write_output(markup: &str, output: Option<&str>) -> Result<(), MuralError> {
    match output {
        Some(path) => {
            tokio::fs::write(path, markup).await?;
            debug!(output_file = path; "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(markup.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use mural::config::{RendererConfig, SchedulerConfig};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_encode_bare_token_and_address() {
        let config = AppConfig::default();
        let token = encode_link(&config, "graph TD", None).unwrap();
        assert!(token.starts_with("v1.d."));

        let address = encode_link(&config, "graph TD", Some("https://mural.dev/edit")).unwrap();
        assert_eq!(address, format!("https://mural.dev/edit#diagram={token}"));
    }

    #[test]
    fn test_decode_token_or_address() {
        let config = AppConfig::default();
        let token = encode_link(&config, "graph LR\n  A --> B", None).unwrap();

        assert_eq!(decode_link(&config, &token).unwrap(), "graph LR\n  A --> B");
        let address = format!("https://mural.dev/?x=1#diagram={token}");
        assert_eq!(decode_link(&config, &address).unwrap(), "graph LR\n  A --> B");
    }

    #[test]
    fn test_decode_address_without_token() {
        let err = decode_link(&AppConfig::default(), "https://mural.dev/").unwrap_err();
        assert!(matches!(err, MuralError::MissingShareToken));
    }

    #[test]
    fn test_decode_unsupported_version() {
        let err = decode_link(&AppConfig::default(), "v1.z.AAAA").unwrap_err();
        assert!(matches!(err, MuralError::Codec(ref codec) if codec.is_unsupported_format()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_watch_rewrites_output_on_change() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("diagram.mmd");
        let output = dir.path().join("out.txt");
        fs::write(&input, "first").unwrap();

        let config = AppConfig::default()
            .with_renderer(RendererConfig::new(vec!["cat".to_string()]))
            .with_scheduler(SchedulerConfig::new(Duration::from_millis(20)));

        let edit_input = input.clone();
        let stop = async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            tokio::fs::write(&edit_input, "second").await.unwrap();
            tokio::time::sleep(Duration::from_millis(700)).await;
        };

        watch_file(
            &config,
            input.to_str().unwrap(),
            Some(output.to_str().unwrap()),
            Duration::from_millis(20),
            stop,
        )
        .await
        .unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "second");
    }
}
