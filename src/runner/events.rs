use super::state::{ProbeResult, SkippedProbe};
use colored::Colorize;

/// Run progress, emitted in the order things happen
#[derive(Debug, Clone)]
pub enum ProbeEvent {
    RunStarted {
        run_id: String,
        suite: String,
        base_url: String,
    },
    PhaseStarted {
        name: String,
    },
    StateChanged {
        from: &'static str,
        to: &'static str,
    },
    Probed(ProbeResult),
    Skipped(SkippedProbe),
    Authenticated {
        phone: String,
        user_id: Option<String>,
    },
    AuthFailed {
        error: String,
    },
    RunFinished {
        total: usize,
        passed: usize,
    },
}

pub trait ProbeListener {
    fn on_event(&self, event: &ProbeEvent);
}

/// Fans events out to every registered listener
#[derive(Default)]
pub struct EventEmitter {
    listeners: Vec<Box<dyn ProbeListener>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn ProbeListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: ProbeEvent) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

/// Prints one line per probe with a pass/fail glyph
pub struct ConsoleListener {
    pub verbose: bool,
}

impl ConsoleListener {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProbeListener for ConsoleListener {
    fn on_event(&self, event: &ProbeEvent) {
        match event {
            ProbeEvent::RunStarted {
                run_id,
                suite,
                base_url,
            } => {
                println!("{}", "=".repeat(60));
                println!("{} Suite: {}", "▶".green().bold(), suite.cyan());
                println!("  Target: {}", base_url.cyan());
                println!("  Run: {}", run_id.dimmed());
            }
            ProbeEvent::PhaseStarted { name } => {
                println!("\n{} {}", "==".blue(), name.bold());
            }
            ProbeEvent::StateChanged { from, to } => {
                log::debug!("harness state {} -> {}", from, to);
            }
            ProbeEvent::Probed(result) => print_probe(result, self.verbose),
            ProbeEvent::Skipped(skipped) => {
                println!(
                    "{} {:6} {:50} - skipped ({})",
                    "⏭".yellow(),
                    skipped.method.as_str(),
                    skipped.endpoint,
                    skipped.reason
                );
            }
            ProbeEvent::Authenticated { phone, user_id } => {
                println!(
                    "  {} Logged in as {} (user id {})",
                    "✓".green(),
                    phone.cyan(),
                    user_id.as_deref().unwrap_or("unknown")
                );
            }
            ProbeEvent::AuthFailed { error } => {
                println!("  {} Login failed, skipping authenticated probes", "✗".red());
                println!("    {}", error.red());
            }
            ProbeEvent::RunFinished { total, passed } => {
                println!(
                    "\n{} {} probe(s), {} passed",
                    "■".blue(),
                    total,
                    passed.to_string().green()
                );
            }
        }
    }
}

fn print_probe(result: &ProbeResult, verbose: bool) {
    let glyph = if result.success {
        "✅"
    } else {
        "❌"
    };
    let status = if result.success {
        result.status_code.to_string().green()
    } else {
        result.status_code.to_string().red()
    };

    println!(
        "{} {:6} {:50} - {} ({}ms)",
        glyph,
        result.method.as_str(),
        result.endpoint,
        status,
        result.duration_ms
    );

    if let Some(error) = &result.error {
        println!("    {} {}", "Error:".red(), error);
    }

    if !result.success && verbose && !result.response.is_empty() {
        let message = serde_json::from_str::<serde_json::Value>(&result.response)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));
        match message {
            Some(m) => println!("    {} {}", "Message:".red(), m),
            None => println!(
                "    {} {}",
                "Response:".red(),
                super::state::truncate(&result.response, 200)
            ),
        }
    }
}
