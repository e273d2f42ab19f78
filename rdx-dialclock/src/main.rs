use anyhow::Result;
use dialclock::prelude::*;
use dialclock::{ENGINE_NAME, VERSION};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // 2. Load the configuration file given on the command line, if any.
    let config = match env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            DialclockConfig::load(&path)?
        }
        None => DialclockConfig::default(),
    };

    // 3. Create the emitter.
    let emitter = TimeEmitter::new(&config)?;

    // 4. Listen to the emitter's lifecycle events and its ticks.
    spawn_event_listener(&emitter);
    let engine = emitter.rotation_engine();
    emitter.subscribe(move |emission| {
        let sample = &emission.sample;
        let readout = [
            engine.text(sample, HandSpec::Hour(ClockBase::TwelveHour)),
            sample.padded_minute(),
            sample.padded_second(),
        ]
        .map(|part| part.unwrap_or_else(|| "--".to_string()))
        .join(":");
        let hands = emission
            .rotations
            .iter()
            .map(|(hand, angle)| match angle {
                Some(angle) => format!("{hand}={angle:.2}"),
                None => format!("{hand}=?"),
            })
            .collect::<Vec<_>>()
            .join(" ");
        let period = sample.period_string().unwrap_or("");
        info!("[TICK #{}] {} {} | {}", emission.tick, readout, period, hands);
    });

    // 5. Run until Ctrl+C.
    emitter.resume()?;
    info!(
        "{} v{} running at {}. Press Ctrl+C to shut down.",
        ENGINE_NAME,
        VERSION,
        emitter.effective_precision()
    );
    tokio::signal::ctrl_c().await?;
    emitter.stop();
    info!("{} has shut down.", ENGINE_NAME);

    Ok(())
}

/// Spawns a task that logs every `EmitterEvent`.
fn spawn_event_listener(emitter: &TimeEmitter) {
    let mut events = emitter.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("[EMITTER] => {:?}", event);
        }
    });
}
