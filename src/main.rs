use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hark_daemon::assets::AssetProvisioner;
use hark_daemon::voice::{AudioCapture, SpeakRequest, SpeechSynthesizer, samples_to_wav};
use hark_daemon::{Config, Daemon};

/// Hark - background voice command listener
#[derive(Parser)]
#[command(name = "hark", version, about)]
struct Cli {
    /// Directory holding the bundled recognition model
    #[arg(long, env = "HARK_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the listener in the foreground (default when no command is given)
    Run,
    /// Copy the bundled model into the writable mirror
    Provision,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
        /// Write the captured audio to a WAV file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Test speech synthesis output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hark is ready to listen.")]
        text: String,
    },
    /// Install hark as a user service
    Install,
    /// Uninstall the hark user service
    Uninstall,
    /// Restart the hark user service
    Restart,
    /// Show service status
    Status,
    /// Tail the service log file
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
        /// Follow log output
        #[arg(short, long)]
        follow: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,hark_daemon=info",
        1 => "info,hark_daemon=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let model_dir = cli.model_dir;
    let config = Config::load_with_options(model_dir.as_deref());

    // Handle subcommands
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Run => run_daemon(config).await,
            Command::Provision => cmd_provision(&config),
            Command::TestMic { duration, save } => {
                test_mic(&config, duration, save.as_deref()).await
            }
            Command::TestTts { text } => test_tts(&config, &text),
            Command::Install => cmd_install(model_dir),
            Command::Uninstall => cmd_uninstall(),
            Command::Restart => cmd_restart(),
            Command::Status => cmd_status(),
            Command::Logs { lines, follow } => cmd_logs(lines, follow),
        };
    }

    run_daemon(config).await
}

/// Run the listening daemon until interrupted
#[allow(clippy::future_not_send)]
async fn run_daemon(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        bundled = %config.model.bundled_dir.display(),
        mirror = %config.model.mirror_dir.display(),
        "starting hark"
    );
    tracing::info!(
        time = ?config.keywords.time,
        camera = ?config.keywords.camera,
        share = ?config.keywords.share,
        "keywords loaded"
    );

    let daemon = Daemon::new(config);
    daemon.run().await?;

    Ok(())
}

/// Provision the model mirror without starting the listener
fn cmd_provision(config: &Config) -> anyhow::Result<()> {
    let provisioner = AssetProvisioner::new(&config.model);
    provisioner.ensure_model()?;

    if provisioner.is_provisioned() {
        println!("Model provisioned at {}", config.model.mirror_dir.display());
    } else {
        let missing = provisioner.missing_files().join(", ");
        anyhow::bail!("model mirror incomplete: missing {missing}");
    }

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64, save: Option<&Path>) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new(config.audio)?;
    capture.start()?;

    let sample_rate = capture.sample_rate();
    println!("Sample rate: {sample_rate} Hz");
    println!("---");

    let mut recorded: Vec<i16> = Vec::new();

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_samples();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.saturating_abs()).max().unwrap_or(0);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:5} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );

        if save.is_some() {
            recorded.extend_from_slice(&samples);
        }
    }

    capture.stop();

    if let Some(path) = save {
        let wav = samples_to_wav(&recorded, sample_rate)?;
        std::fs::write(path, wav)?;
        println!("\nSaved {} samples to {}", recorded.len(), path.display());
    }

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");
    println!("  4. Try: pavucontrol (to check levels)");

    Ok(())
}

/// Calculate RMS energy of 16-bit samples, normalized to [0, 1]
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples
        .iter()
        .map(|&s| {
            let v = f32::from(s) / 32768.0;
            v * v
        })
        .sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speech synthesis output
fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing speech synthesis with text: \"{text}\"\n");

    let mut synthesizer = SpeechSynthesizer::new(&config.speech)?;
    synthesizer.speak(SpeakRequest {
        text: text.to_string(),
        flush: true,
    })?;

    // The platform engine renders asynchronously; wait for it to finish
    let start = std::time::Instant::now();
    std::thread::sleep(Duration::from_millis(300));
    while synthesizer.is_speaking() {
        if start.elapsed() > Duration::from_secs(30) {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    println!("\n---");
    println!("If you heard the speech, synthesis is working!");

    Ok(())
}

/// Install hark as a user service
fn cmd_install(model_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let binary = std::env::current_exe()?;
    let service_config = hark_daemon::service::ServiceConfig {
        binary_path: binary,
        model_dir,
    };

    hark_daemon::service::install_service(&service_config)?;
    println!("Hark installed as user service");
    if let Some(log_path) = hark_daemon::service::log_path() {
        println!("Logs: {}", log_path.display());
    }
    Ok(())
}

/// Uninstall the hark user service
fn cmd_uninstall() -> anyhow::Result<()> {
    hark_daemon::service::uninstall_service()?;
    println!("Hark user service removed");
    Ok(())
}

/// Restart the hark user service
fn cmd_restart() -> anyhow::Result<()> {
    hark_daemon::service::restart_service()?;
    println!("Hark service restarted");
    Ok(())
}

/// Show service status
fn cmd_status() -> anyhow::Result<()> {
    let status = hark_daemon::service::service_status()?;
    println!("Hark service: {status}");
    Ok(())
}

/// Tail the service log file
fn cmd_logs(lines: usize, follow: bool) -> anyhow::Result<()> {
    let log_path = hark_daemon::service::log_path()
        .ok_or_else(|| anyhow::anyhow!("could not determine log path"))?;

    if !log_path.exists() {
        println!("No log file found at {}", log_path.display());
        println!("Is the service installed? Try: hark install");
        return Ok(());
    }

    let mut args = vec![format!("-n{lines}"), log_path.display().to_string()];
    if follow {
        args.insert(0, "-f".to_string());
    }

    let status = std::process::Command::new("tail").args(&args).status()?;

    if !status.success() {
        anyhow::bail!("tail exited with {status}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_zero() {
        assert!(calculate_rms(&[0i16; 1024]) < f32::EPSILON);
        assert!(calculate_rms(&[]) < f32::EPSILON);
    }

    #[test]
    fn rms_of_full_scale_is_near_one() {
        let samples = vec![i16::MAX; 256];
        let rms = calculate_rms(&samples);
        assert!(rms > 0.99 && rms <= 1.0);
    }
}
