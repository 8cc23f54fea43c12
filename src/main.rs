//! avatar-behavior CLI
//!
//! Usage:
//!   avatar-behavior --text "This is VERY important!" --emphasis high
//!   avatar-behavior --text "How are you?" --question --verbose
//!   avatar-behavior --interactive                  # one utterance per line
//!   avatar-behavior --serve                        # HTTP preview API
//!   avatar-behavior --text "text" --json           # JSON output

use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

use avatar_behavior::core::{run_server, BehaviorEngine, FrameBuffer, Utterance};
use avatar_behavior::error::Result;
use avatar_behavior::types::{
    AccessibilityAudit, CulturalRegion, EmphasisLevel, FrameReport, MotionProfile, MotionSettings,
    MovementContext, MovementState,
};
use avatar_behavior::{BehaviorConfig, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "avatar-behavior",
    version = VERSION,
    about = "Simulate lip-sync and gesture behavior for an utterance",
    long_about = "avatar-behavior turns an utterance into lip-sync mouth poses and a\n\
                  gesture plan, then plays both back at a fixed frame rate.\n\n\
                  Modes:\n  \
                  --text         Single utterance\n  \
                  --interactive  One utterance per stdin line\n  \
                  --serve        HTTP preview API\n\n\
                  States:\n  \
                  IDLE          - No active plan\n  \
                  SPEAKING      - Plan without question/emphasis gestures\n  \
                  QUESTIONING   - Question tilt or eyebrow raise\n  \
                  EMPHASIZING   - Emphasis gestures\n  \
                  TRANSITIONING - Blending between plans"
)]
struct Args {
    /// Utterance to simulate
    #[arg(short, long)]
    text: Option<String>,

    /// Read utterances from stdin, one per line
    #[arg(short, long)]
    interactive: bool,

    /// Speech duration in ms (estimated from text length when absent)
    #[arg(long)]
    duration_ms: Option<f64>,

    /// Mark the utterance as a question
    #[arg(short, long)]
    question: bool,

    /// Emphasis level: low, medium, high
    #[arg(long, default_value = "medium")]
    emphasis: EmphasisLevel,

    /// Language code (en, nl, es, de, ja, fr, ...)
    #[arg(long, default_value = "en")]
    language: String,

    /// Cultural region override: western, eastern, mediterranean, nordic, other
    #[arg(long)]
    region: Option<CulturalRegion>,

    /// Simulation frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Motion profile: minimal, reduced, standard, enhanced
    #[arg(long, default_value = "standard")]
    profile: MotionProfile,

    /// Disable gestures (alternatives are reported instead)
    #[arg(long)]
    no_gestures: bool,

    /// Disable head movements
    #[arg(long)]
    no_head: bool,

    /// Report a platform reduced-motion preference
    #[arg(long)]
    reduced_motion: bool,

    /// JSON config file (BehaviorConfig)
    #[arg(long)]
    config: Option<String>,

    /// Seed for timing jitter and pattern variation
    #[arg(long)]
    seed: Option<u64>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Print every frame and the plan breakdown
    #[arg(long)]
    verbose: bool,
}

/// Everything one simulated utterance produced, for `--json`
#[derive(Serialize)]
struct SimulationOutput<'a> {
    analysis: &'a avatar_behavior::types::ContentAnalysis,
    timeline: &'a avatar_behavior::types::PhonemeTimeline,
    plan: &'a avatar_behavior::types::MovementPlan,
    alternatives: &'a [avatar_behavior::types::AlternativeCommunication],
    frames: Vec<FrameReport>,
    audit: AccessibilityAudit,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }

    let result = match load_config(&args) {
        Ok(config) => {
            if args.serve {
                run_serve(&args, config).await;
                Ok(())
            } else if args.interactive {
                run_interactive(&args, config)
            } else if let Some(ref text) = args.text {
                run_single(text, &args, config)
            } else {
                run_interactive(&args, config)
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<BehaviorConfig> {
    let mut config = match &args.config {
        Some(path) => BehaviorConfig::load(path)?,
        None => BehaviorConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn build_engine(args: &Args, config: BehaviorConfig) -> BehaviorEngine {
    let settings = MotionSettings {
        enable_gestures: !args.no_gestures,
        enable_head_movements: !args.no_head,
        profile: args.profile,
        ..MotionSettings::default()
    };
    let mut engine = BehaviorEngine::with_settings(config, settings);
    if args.reduced_motion {
        engine.observe_platform_reduced_motion(true);
    }
    engine
}

fn context_for(args: &Args) -> MovementContext {
    let mut ctx = MovementContext::new(args.question, args.emphasis).with_language(args.language.clone());
    if let Some(region) = args.region {
        ctx = ctx.with_region(region);
    }
    if let Some(d) = args.duration_ms {
        ctx = ctx.with_duration(d);
    }
    ctx
}

/// Run single utterance
fn run_single(text: &str, args: &Args, config: BehaviorConfig) -> Result<()> {
    let mut engine = build_engine(args, config);
    let ctx = context_for(args);
    ctx.validate()?;
    simulate(&mut engine, text, ctx, args)
}

/// Run interactive mode: the engine persists across lines
fn run_interactive(args: &Args, config: BehaviorConfig) -> Result<()> {
    let mut engine = build_engine(args, config);
    let ctx = context_for(args);
    ctx.validate()?;

    print_header("Interactive", args.no_color);
    println!("Type an utterance and press Enter. End with '?' for a question. Type 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("{}", format_prompt(engine.state(), args.no_color));
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!("\nSession ended at t={:.0}ms", engine.clock_ms());
            break;
        }
        if line.is_empty() {
            continue;
        }

        let mut line_ctx = ctx.clone();
        line_ctx.is_question = ctx.is_question || line.ends_with('?');
        simulate(&mut engine, line, line_ctx, args)?;
    }
    Ok(())
}

/// Speak, then tick at the frame rate until mouth and head are at rest
fn simulate(engine: &mut BehaviorEngine, text: &str, ctx: MovementContext, args: &Args) -> Result<()> {
    let utterance = engine.speak(text, ctx);
    let frame_ms = 1000.0 / args.fps.clamp(1.0, 240.0);
    let horizon_ms = utterance.timeline.total_duration_ms.max(utterance.plan.total_duration_ms) + 2000.0;

    if !args.json {
        print_utterance(&utterance, args);
    }

    let mut rig = FrameBuffer::new();
    let mut frames = Vec::new();
    let mut last_state = engine.state();
    let start = engine.clock_ms();
    while engine.clock_ms() - start < horizon_ms {
        let report = engine.update(frame_ms, &mut rig);
        let changed = report.state != last_state;
        last_state = report.state;
        if args.json {
            if changed {
                frames.push(report.clone());
            }
        } else if changed || args.verbose {
            print_report(&report, args.no_color);
        }
        if engine.is_settled() {
            break;
        }
    }

    if args.json {
        let output = SimulationOutput {
            analysis: &utterance.analysis,
            timeline: &utterance.timeline,
            plan: &utterance.plan,
            alternatives: &utterance.alternatives,
            frames,
            audit: engine.audit(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_audit(&engine.audit(), args.no_color);
    }
    Ok(())
}

/// Print header
fn print_header(mode: &str, no_color: bool) {
    let title = format!("avatar-behavior v{} - {}", VERSION, mode);
    if no_color {
        println!("========================================");
        println!("  {}", title);
        println!("========================================");
    } else {
        println!("{}", "========================================".bold());
        println!("  {}", title.bold());
        println!("{}", "========================================".bold());
    }
    println!();
}

fn format_prompt(state: MovementState, no_color: bool) -> String {
    if no_color {
        format!("[{}] > ", state)
    } else {
        format!("{}{} [{}]{} > ", state.color_code(), state.emoji(), state, MovementState::color_reset())
    }
}

fn print_report(report: &FrameReport, no_color: bool) {
    if no_color {
        println!("{}", report.to_parseable_string());
    } else {
        println!("{}", report.to_terminal_string());
    }
    for alt in &report.alternatives {
        println!("  {} {:?} via {:?}: {}", "↳".cyan(), alt.intent, alt.method, alt.message);
    }
}

fn print_utterance(utterance: &Utterance, args: &Args) {
    let a = &utterance.analysis;
    println!(
        "{} {:.0}ms | {} phonemes | emphasis={} questions={} explanations={} sentiment={} cues={} | confidence={:.2}",
        "utterance".bold(),
        utterance.timeline.total_duration_ms,
        utterance.timeline.len(),
        a.emphasis_points.len(),
        a.question_segments.len(),
        a.explanatory_segments.len(),
        a.sentiment_markers.len(),
        a.contextual_cues.len(),
        a.confidence
    );
    println!(
        "{} #{} | {} gestures | {} head movements | priority={:.2} | {:.0}ms",
        "plan".bold(),
        utterance.plan.id,
        utterance.plan.gestures.len(),
        utterance.plan.head_movements.len(),
        utterance.plan.priority,
        utterance.plan.total_duration_ms
    );

    if args.verbose {
        for g in &utterance.plan.gestures {
            println!(
                "  {:<14} {:<12?} start={:>6.0} dur={:>5.0} intensity={:.2}{}",
                g.gesture_type.to_string(),
                g.category,
                g.start_ms,
                g.duration_ms,
                g.intensity,
                g.source_word.as_ref().map(|w| format!(" ({})", w)).unwrap_or_default()
            );
        }
        for r in &utterance.plan.resolutions {
            println!(
                "  {} {} {} {:.0}→{:.0}",
                "·".dimmed(),
                r.reason.code().dimmed(),
                r.gesture_type,
                r.original_start_ms,
                r.resolved_start_ms
            );
        }
    }
    for alt in &utterance.alternatives {
        println!("  {} {:?} via {:?}: {}", "↳".cyan(), alt.intent, alt.method, alt.message);
    }
}

fn print_audit(audit: &AccessibilityAudit, no_color: bool) {
    if audit.compliant {
        let line = format!("audit: compliant (WCAG {:?})", audit.wcag_level);
        if no_color {
            println!("{}", line);
        } else {
            println!("{}", line.green());
        }
        return;
    }
    let line = format!("audit: {} violation(s)", audit.violations.len());
    if no_color {
        println!("{}", line);
    } else {
        println!("{}", line.yellow());
    }
    for v in &audit.violations {
        println!("  {} [{:?}] {}", v.criterion, v.level, v.description);
    }
}

/// Run HTTP API server
async fn run_serve(args: &Args, config: BehaviorConfig) {
    print_header("Preview API", args.no_color);
    if let Err(e) = run_server(&args.addr, config).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
