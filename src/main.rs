use anyhow::{bail, Context, Result};
use callscribe::audio::{classify_loopback, DeviceCatalog};
use callscribe::config::AppConfig;
use callscribe::events::PipelineEvent;
use callscribe::stt::Transcriber;
use callscribe::{telemetry, CaptureSession};
use crossbeam_channel::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    telemetry::init_tracing(&config);

    if config.list_input_devices {
        return list_devices(&config);
    }

    let model_path = config
        .whisper_model_path
        .as_deref()
        .context("--whisper-model-path (or CALLSCRIBE_MODEL) is required to transcribe")?;
    let engine = Arc::new(
        Transcriber::new(model_path, config.vad_threshold_db)
            .context("failed to load whisper model")?,
    );

    let (mut session, events) = CaptureSession::start(config.session_config(), engine)?;
    eprintln!("capturing; press Ctrl-C to abort");

    let deadline = (config.seconds > 0).then(|| Instant::now() + Duration::from_secs(config.seconds));
    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        match events.recv_timeout(Duration::from_millis(200)) {
            Ok(PipelineEvent::TextRecognized(text)) => println!("{text}"),
            Ok(PipelineEvent::Error { source, message }) => {
                eprintln!("[{}] {message}", source.label());
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    session.stop();
    Ok(())
}

fn list_devices(config: &AppConfig) -> Result<()> {
    let catalog = DeviceCatalog::enumerate()?;
    if catalog.descriptors().is_empty() {
        bail!("no audio devices detected");
    }

    let keywords = config.loopback_keywords();
    let picked = classify_loopback(catalog.descriptors(), &keywords);
    for device in catalog.descriptors() {
        let marker = if Some(device.index) == picked {
            " <- loopback"
        } else {
            ""
        };
        println!(
            "[{}] {} (in: {}, out: {}){marker}",
            device.index, device.name, device.max_input_channels, device.max_output_channels
        );
    }
    if picked.is_none() {
        eprintln!("no loopback device detected; pass --input-device to pick one");
    }
    Ok(())
}
