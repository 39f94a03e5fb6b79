//! facelens Session Demo
//!
//! Runs one hosted session against a simulated engine that plays back a
//! fuzzed event stream from a background thread. Every distinct display
//! state is printed; the idle timeout closes the session.
//!
//! Usage: `facelens-demo [config.json]`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use facelens_core::{delivery_tag, EngineDelivery, FacelensResult, PermissionSet, SessionConfig};
use facelens_present::DisplayState;
use facelens_runtime::{telemetry, IdleSettings, RuntimeConfig, SessionHost};
use facelens_session::{
    AnalysisEngine, Collaborators, EventSink, HostSurface, LicenseReply, Notice, NoticeKind,
    PermissionAuthority, Renderer, SessionController, TracingSink,
};
use facelens_test::{emits, EventFuzzer, FuzzerConfig};

// ============================================================================
// SIMULATED COLLABORATORS
// ============================================================================

/// Engine playing back a recorded stream at a fixed pace
///
/// Playback runs on tokio's blocking pool. `stop` only raises the flag; the
/// worker notices it, or the closed sink, on its next step.
struct SimulatedEngine {
    stream: Vec<EngineDelivery>,
    pace: Duration,
    running: Arc<AtomicBool>,
}

impl SimulatedEngine {
    fn new(stream: Vec<EngineDelivery>, pace: Duration) -> Self {
        SimulatedEngine {
            stream,
            pace,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl AnalysisEngine for SimulatedEngine {
    fn initialize(&mut self, app_id: &str, license: LicenseReply) -> FacelensResult<()> {
        info!(app_id, "license accepted");
        license.validated();
        Ok(())
    }

    fn start(&mut self, config: &SessionConfig, events: EventSink) -> FacelensResult<()> {
        let stream: Vec<EngineDelivery> = std::mem::take(&mut self.stream)
            .into_iter()
            .filter(|delivery| emits(config, delivery_tag(delivery)))
            .collect();
        let running = Arc::clone(&self.running);
        let pace = self.pace;
        running.store(true, Ordering::SeqCst);

        tokio::task::spawn_blocking(move || {
            for delivery in stream {
                if !running.load(Ordering::SeqCst) || !events.is_open() {
                    break;
                }
                events.deliver(delivery);
                std::thread::sleep(pace);
            }
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

struct GrantAll;

impl PermissionAuthority for GrantAll {
    fn check_granted(&self, _permissions: &PermissionSet) -> bool {
        true
    }

    fn request(&mut self, _permissions: &PermissionSet) {}
}

/// Prints a line per distinct state
#[derive(Default)]
struct ConsoleRenderer {
    last: Mutex<Option<String>>,
}

impl ConsoleRenderer {
    fn describe(state: &DisplayState) -> String {
        let mut parts = vec![format!(
            "face={:?}/{}",
            state.face_box.tone(),
            state.face_box.stroke_width()
        )];
        for panel in state.expression_panels().filter(|p| p.visible) {
            let icon = panel
                .icon()
                .map(|icon| icon.to_string())
                .unwrap_or_else(|| "-".to_string());
            parts.push(format!("{:?}={icon}({})", panel.model, panel.label));
        }
        if state.head_pose.visible {
            parts.push(format!("pose=[{}]", state.head_pose.text));
        }
        if state.attention.visible {
            parts.push(format!("attention={}", state.attention.glyph));
        }
        parts.join("  ")
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, state: &DisplayState) {
        let line = Self::describe(state);
        let mut last = self.last.lock();
        if last.as_deref() != Some(line.as_str()) {
            println!("   {line}");
            *last = Some(line);
        }
    }
}

struct ConsoleSurface;

impl HostSurface for ConsoleSurface {
    fn show_notice(&mut self, notice: &Notice) {
        println!("\n   [{:?}] {} {:?}", notice.kind, notice.message, notice.actions);
    }

    fn dismiss_notice(&mut self, kind: NoticeKind) {
        println!("   [{kind:?}] dismissed");
    }

    fn finish(&mut self) {
        println!("   host screen closed");
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn demo_config() -> RuntimeConfig {
    RuntimeConfig {
        app_id: "facelens-demo".to_string(),
        log_filter: "info,facelens::events=warn".to_string(),
        idle: IdleSettings {
            timeout: Duration::from_secs(4),
            grace: Duration::from_secs(1),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => RuntimeConfig::from_path(path)?,
        None => demo_config(),
    };
    telemetry::init_from_config(&config)?;

    println!("=== facelens Session Demo ===\n");

    // 1. Configuration
    let controller_config = config.controller_config()?;
    println!("1. Profile: {:?}", controller_config.profile);
    println!(
        "   Idle timeout: {:?} (+{:?} grace)",
        controller_config.idle.timeout, controller_config.idle.grace
    );

    // 2. Simulated engine
    let fuzz = FuzzerConfig {
        event_count: 80,
        ..FuzzerConfig::light().with_profile(controller_config.profile)
    };
    let stream = EventFuzzer::new(fuzz).generate();
    println!("\n2. Engine stream: {} deliveries", stream.len());

    // 3. Hosted session
    println!("\n3. Running session...");
    let controller = SessionController::new(
        controller_config,
        Collaborators {
            engine: SimulatedEngine::new(stream, Duration::from_millis(40)),
            permissions: GrantAll,
            host: ConsoleSurface,
            renderer: Arc::new(ConsoleRenderer::default()),
            sink: Arc::new(TracingSink),
        },
    )?;
    let (host, _handle) = SessionHost::new(controller)?;
    let report = host.run().await?;

    // 4. Summary
    println!("\n4. Session {} ended: {}", report.session_id, report.phase);
    println!(
        "   applied={} failed={} skipped={} dropped={}",
        report.stats.applied, report.stats.failed, report.stats.skipped, report.stats.dropped
    );

    println!("\n=== Demo Complete ===");
    Ok(())
}
