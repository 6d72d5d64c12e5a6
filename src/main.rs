mod bench;

use bench::gamepad::{GamepadHandle, PadSnapshot};
use bench::{apply_snapshot, LoggingInjector};
use color_eyre::{eyre::eyre, Result};
use flightpad::host::{InputInjector, MemoryHost, PluginMessage};
use flightpad::plugin::{Loaded, Plugin};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Bench frame period, close to a typical simulator frame
const FRAME_INTERVAL_MS: u64 = 20;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let injector: Arc<dyn InputInjector> = Arc::new(LoggingInjector);
    let plugin = Plugin::<Loaded>::load(injector);

    let profile = plugin.session().mapper().profile();
    info!("Starting gamepad reader for {}", profile.name);
    let (pad_tx, mut pad_rx) = watch::channel(PadSnapshot::at_rest(profile.brake_trigger));
    let _reader = GamepadHandle::spawn(profile, pad_tx)
        .map_err(|e| eyre!("Failed to spawn gamepad reader: {}", e))?;

    let mut host = MemoryHost::with_default_aircraft();
    let mut plugin = plugin.enable(&mut host);
    plugin.receive_message(PluginMessage::AircraftLoaded);

    let mut interval = tokio::time::interval(Duration::from_millis(FRAME_INTERVAL_MS));
    let mut last_tick = tokio::time::Instant::now();
    let mut last_mode = plugin.session().mode();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            now = interval.tick() => {
                let dt = (now - last_tick).as_secs_f32();
                last_tick = now;

                let snapshot = pad_rx.borrow_and_update().clone();
                apply_snapshot(&mut host, plugin.session().mapper(), &snapshot);
                host.advance_time(dt);

                for (command, phase) in host.dispatch_buttons() {
                    if !plugin.handle_command(&mut host, command, phase) {
                        debug!("Simulator command {} {:?}", command, phase);
                    }
                }
                plugin.flight_loop(&mut host, dt);

                let mode = plugin.session().mode();
                if mode != last_mode {
                    info!("Mode: {}", mode);
                    last_mode = mode;
                }
            }
            result = &mut shutdown => {
                result?;
                info!("Shutting down");
                break;
            }
        }
    }

    plugin.disable(&mut host);
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
