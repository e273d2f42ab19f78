use anyhow::Result;
use colored::Colorize;
use dialclock::prelude::*;
use dialclock::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct MyHighlighter;

impl Highlighter for MyHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    // Embedded at compile time from the root of the `rdx-dialshell` crate.
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    let rule = "-".repeat(79);

    println!("{}", rule.dimmed());
    println!("{}", version_string);
    let license_blurb = "
    This software is provided 'as is', without warranty of any kind.
    Distributed under the MIT OR Apache-2.0 license. Use at your own risk.
    ";
    println!("{}", license_blurb.dimmed());
    println!("{}", rule.dimmed());
}

/// Spawns the lifecycle event printer and the shell's own tick watcher.
fn spawn_event_listeners(emitter: &TimeEmitter, is_watching: Arc<AtomicBool>) {
    let mut events = emitter.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("\n<-- [EMITTER EVENT] {:?}\n>> ", event);
        }
    });

    // Prints at most once per wall-clock second, whatever the precision.
    let last_second = AtomicI64::new(-1);
    emitter.subscribe(move |emission| {
        if !is_watching.load(Ordering::Relaxed) {
            return;
        }
        let second = emission.sample.second.map_or(-1, i64::from);
        if last_second.swap(second, Ordering::Relaxed) == second {
            return;
        }
        println!("<-- {}", describe(emission));
    });
}

/// One line summarising an emission.
fn describe(emission: &Emission) -> String {
    let sample = &emission.sample;
    let time = [
        sample.hour24_string(),
        sample.padded_minute(),
        sample.padded_second(),
    ]
    .map(|part| part.unwrap_or_else(|| "--".to_string()))
    .join(":");
    let hands = emission
        .rotations
        .iter()
        .map(|(hand, angle)| match angle {
            Some(angle) => format!("{}={:.2}", hand, angle),
            None => format!("{}=?", hand),
        })
        .collect::<Vec<_>>()
        .join("  ");
    format!("[TICK #{}] {}  {}", emission.tick, time.bold(), hands)
}

fn parse_precision(arg: &str) -> Option<PrecisionLevel> {
    match arg {
        "low" => Some(PrecisionLevel::Low),
        "medium" => Some(PrecisionLevel::Medium),
        "high" => Some(PrecisionLevel::High),
        "veryhigh" | "very_high" => Some(PrecisionLevel::VeryHigh),
        other => other.parse::<f64>().ok().map(PrecisionLevel::Custom),
    }
}

fn parse_toggle(arg: Option<&&str>) -> Option<bool> {
    match arg {
        Some(&"on") => Some(true),
        Some(&"off") => Some(false),
        _ => None,
    }
}

fn report(result: Result<(), ClockError>, success: &str) {
    match result {
        Ok(()) => println!("--> {}", success),
        Err(e) => println!("Error: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => DialclockConfig::load(&path)?,
        None => DialclockConfig::default(),
    };
    let emitter = TimeEmitter::new(&config)?;

    let is_watching = Arc::new(AtomicBool::new(false));
    spawn_event_listeners(&emitter, is_watching.clone());

    info!("Starting {} at {}...", ENGINE_NAME.cyan(), emitter.effective_precision());
    emitter.resume()?;

    // The shell's observer handles.
    let mut observers: HashMap<usize, SubscriberId> = HashMap::new();
    let mut next_handle: usize = 0;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(MyHighlighter {}));

    println!("{} is running. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting dialshell...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some(command) = args.first() else {
            continue;
        };

        match *command {
            "start" => match args.get(1) {
                Some(seconds_str) => match seconds_str.parse::<f64>() {
                    Ok(seconds) => report(emitter.start(seconds), "Emitter started."),
                    Err(_) => println!("Error: '{}' is not a valid number of seconds.", seconds_str),
                },
                None => report(emitter.resume(), "Emitter started."),
            },
            "stop" => {
                emitter.stop();
                println!("--> Emitter stopped. Observers are kept.");
            }
            "precision" => match args.get(1).and_then(|arg| parse_precision(arg)) {
                Some(level) => report(emitter.set_precision(level), "Precision updated."),
                None => println!("Usage: precision <low|medium|high|veryhigh|SECONDS>"),
            },
            "ticktock" | "period" => match parse_toggle(args.get(1)) {
                Some(enabled) => {
                    let mut display = emitter.display_options();
                    if *command == "ticktock" {
                        display.tick_tock = enabled;
                    } else {
                        display.period = enabled;
                    }
                    emitter.set_display_options(display);
                    println!(
                        "--> {} display {}. Effective precision: {}.",
                        command,
                        if enabled { "on" } else { "off" },
                        emitter.effective_precision()
                    );
                }
                None => println!("Usage: {} on|off", command),
            },
            "base" => {
                let base = match args.get(1) {
                    Some(&"12") => Some(ClockBase::TwelveHour),
                    Some(&"24") => Some(ClockBase::TwentyFourHour),
                    Some(&"decimal") => Some(ClockBase::Decimal),
                    _ => None,
                };
                match base {
                    Some(base) => {
                        emitter.set_clock_base(base);
                        println!("--> Clock base set to {:?}.", base);
                    }
                    None => println!("Usage: base <12|24|decimal>"),
                }
            }
            "unit" => match args.get(1) {
                Some(&"degrees") => emitter.set_rotation_unit(RotationUnit::Degrees),
                Some(&"radians") => emitter.set_rotation_unit(RotationUnit::Radians),
                _ => println!("Usage: unit <degrees|radians>"),
            },
            "watch" => {
                is_watching.store(true, Ordering::Relaxed);
                println!("--> Printing one tick per second.");
            }
            "unwatch" => {
                is_watching.store(false, Ordering::Relaxed);
                println!("--> Stopped printing ticks.");
            }
            "add" => {
                let handle = next_handle;
                let id = emitter.subscribe(move |emission| {
                    if emission.tick % 100 == 0 {
                        println!("<-- [OBSERVER #{}] reached tick #{}", handle, emission.tick);
                    }
                });
                observers.insert(handle, id);
                next_handle += 1;
                println!("--> Added observer with handle: #{}", handle);
            }
            "remove" => match args.get(1).and_then(|h| h.parse::<usize>().ok()) {
                Some(handle) => match observers.remove(&handle) {
                    Some(id) => {
                        if emitter.unsubscribe(id) {
                            println!("--> Observer successfully removed.");
                        } else {
                            println!("--> Error: Observer not found in emitter.");
                        }
                    }
                    None => println!(
                        "Error: Invalid handle #{}. Use 'list' to see observers.",
                        handle
                    ),
                },
                None => println!("Usage: remove <HANDLE>"),
            },
            "list" => {
                println!("Observers ({} registered in total):", emitter.subscriber_count());
                for (handle, id) in &observers {
                    println!("  Handle #{}: {:?}", handle, id);
                }
            }
            "show" => {
                let effective = emitter.effective_precision();
                println!(
                    "Running: {}  Requested: {}  Effective: {} ({} updates/s)",
                    emitter.is_running(),
                    emitter.precision(),
                    effective,
                    effective.updates_per_second()
                );
                match emitter.last_emission() {
                    Some(emission) => {
                        println!("{}", describe(&emission));
                        if let Some(date) = emission.sample.date_string() {
                            println!("{}", date);
                        }
                    }
                    None => println!("No tick has been published yet."),
                }
            }
            "help" => {
                println!("Available commands:");
                println!("  start [S]              - Starts (or restarts) the emitter, optionally every S seconds.");
                println!("  stop                   - Stops the emitter; observers stay registered.");
                println!("  precision <P>          - low, medium, high, veryhigh, or a number of seconds.");
                println!("  ticktock on|off        - Toggles the pendulum display (forces sub-second updates).");
                println!("  period on|off          - Toggles the AM/PM indicator.");
                println!("  base <12|24|decimal>   - Selects the clock base.");
                println!("  unit <degrees|radians> - Selects the rotation unit.");
                println!("  watch / unwatch        - Prints one tick per second, or stops printing.");
                println!("  add                    - Adds an observer and prints its handle.");
                println!("  remove <H>             - Removes an observer by its handle.");
                println!("  list                   - Shows the shell's observers.");
                println!("  show                   - Shows the emitter state and last tick.");
                println!("  exit                   - Quits the shell.");
            }
            "exit" => break,
            _ => println!("Unknown command: '{}'. Type 'help'.", line),
        }
    }

    emitter.stop();
    Ok(())
}
