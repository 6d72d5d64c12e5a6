//! Plugin lifecycle
//!
//! The host drives the plugin through start, enable, disable and stop
//! callbacks. The typestate keeps frame and command entry points out of
//! reach until the custom commands exist.

use crate::config::Settings;
use crate::host::{CommandPhase, CommandRef, Host, InputInjector, PluginMessage};
use crate::session::Session;
use statum::{machine, state};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[state]
#[derive(Debug, Clone)]
pub enum PluginState {
    Loaded,
    Running,
    Stopped,
}

#[machine]
pub struct Plugin<S: PluginState> {
    session: Session,
}

// Available in all states
impl<S: PluginState> Plugin<S> {
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl Plugin<Loaded> {
    /// Loads the settings from the user's config directory
    pub fn load(injector: Arc<dyn InputInjector>) -> Self {
        let path = Settings::default_path()
            .map_err(|e| debug!("Settings will not be persisted: {}", e))
            .ok();
        let settings = path
            .as_deref()
            .map(Settings::load_or_default)
            .unwrap_or_default();
        Self::create(settings, path, injector)
    }

    pub fn create(
        settings: Settings,
        settings_path: Option<PathBuf>,
        injector: Arc<dyn InputInjector>,
    ) -> Self {
        info!("Plugin loaded for {}", settings.controller_type);
        Self::new(Session::new(settings, settings_path, injector))
    }

    pub fn enable(mut self, host: &mut dyn Host) -> Plugin<Running> {
        start_session(&mut self.session, host);
        self.transition()
    }
}

impl Plugin<Running> {
    /// Per-frame callback; the return value asks to be called again next frame
    pub fn flight_loop(&mut self, host: &mut dyn Host, elapsed: f32) -> f32 {
        self.session.frame(host, elapsed)
    }

    pub fn handle_command(
        &mut self,
        host: &mut dyn Host,
        command: CommandRef,
        phase: CommandPhase,
    ) -> bool {
        self.session.handle_command(host, command, phase)
    }

    pub fn receive_message(&mut self, message: PluginMessage) {
        self.session.receive_message(message);
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn disable(mut self, host: &mut dyn Host) -> Plugin<Stopped> {
        self.session.stop(host);
        info!("Plugin disabled");
        self.transition()
    }
}

impl Plugin<Stopped> {
    pub fn enable(mut self, host: &mut dyn Host) -> Plugin<Running> {
        start_session(&mut self.session, host);
        self.transition()
    }
}

fn start_session(session: &mut Session, host: &mut dyn Host) {
    session.start(host);
    if let Err(e) = session.detect_touchpad() {
        debug!("Touchpad not available: {}", e);
    }
    info!("Plugin enabled");
}
