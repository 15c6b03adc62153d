use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use topic_fanout_core::config::FanoutConfig;
use topic_fanout_core::wiring::{build_stack, WiringProps};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the topic fan-out workspace",
    long_about = "A unified CLI for packaging the fan-out Lambda, rendering the\n\
                  event wiring template, checking configuration, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and package the fan-out Lambda as a `bootstrap` zip
    Package {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving the zip artifact
        #[arg(long, default_value = "dist")]
        dist_dir: PathBuf,
    },
    /// Render the bucket → rule → function wiring as a CloudFormation template
    RenderStack {
        /// JSON file with wiring props
        #[arg(long, env = "WIRING_PROPS")]
        props: PathBuf,
        /// Write the template here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate fan-out configuration from a JSON file or the environment
    ValidateConfig {
        /// JSON file with fan-out settings; the environment is used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Check,
    /// Workspace tests
    Test,
    /// Run check + test
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    exit(1);
}

fn package_fanout_lambda(target: &str, profile: BuildProfile, dist_dir: &Path) {
    ensure_rust_target_installed(target);
    ensure_c_linker_available(target);

    step("Build fan-out lambda binary");

    let mut cargo_args = vec![
        "build",
        "-p",
        "topic_fanout_lambda",
        "--target",
        target,
        "--bin",
        "fanout_lambda",
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifact");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let zip_path = dist_dir.join("fanout_lambda.zip");
    package_lambda_zip(
        &target_dir.join(binary_name("fanout_lambda", target)),
        &zip_path,
    );

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        fail(format!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        ));
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        fail(format!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- package`"
        ));
    }
}

fn ensure_c_linker_available(target: &str) {
    if !cfg!(windows) || !target.ends_with("unknown-linux-gnu") {
        return;
    }

    let env_override_keys = [
        format!("CC_{}", target.replace('-', "_")),
        format!("CC_{target}"),
        "TARGET_CC".to_string(),
        "CC".to_string(),
    ];

    for key in env_override_keys {
        if let Ok(value) = std::env::var(&key) {
            let candidate = value.trim();
            if !candidate.is_empty() && tool_works(candidate) {
                return;
            }
        }
    }

    let canonical = "x86_64-linux-gnu-gcc";
    if tool_works(canonical) {
        return;
    }

    fail(format!(
        "missing C cross-linker for target `{target}`. install `{canonical}` (or set CC_x86_64_unknown_linux_gnu) before running `cargo run -p xtask -- package`.\n\
         Tip: the AWS SDK TLS stack needs a Linux C toolchain when cross-compiling from Windows."
    ));
}

fn tool_works(program: &str) -> bool {
    let mut parts = program.split_whitespace();
    let Some(bin) = parts.next() else {
        return false;
    };
    let args: Vec<&str> = parts.collect();

    Command::new(bin)
        .args(&args)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        fail(format!(
            "expected lambda binary at '{}'",
            binary_path.display()
        ));
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

// ── wiring and config ──────────────────────────────────────────────

fn render_stack(props_path: &Path, output: Option<&Path>) {
    let raw = fs::read_to_string(props_path).unwrap_or_else(|error| {
        fail(format!(
            "failed to read wiring props '{}': {error}",
            props_path.display()
        ))
    });
    let props: WiringProps = serde_json::from_str(&raw)
        .unwrap_or_else(|error| fail(format!("invalid wiring props: {error}")));
    let manifest = build_stack(&props).unwrap_or_else(|error| fail(error));

    let template = serde_json::to_string_pretty(&manifest.to_template())
        .expect("template should serialize");

    match output {
        Some(path) => {
            fs::write(path, template).expect("failed to write template");
            eprintln!(
                "Rendered {} resources to {}",
                manifest.resources.len(),
                path.display()
            );
        }
        None => println!("{template}"),
    }
}

fn validate_config(config_path: Option<&Path>) {
    let config = match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path).unwrap_or_else(|error| {
                fail(format!(
                    "failed to read config '{}': {error}",
                    path.display()
                ))
            });
            serde_json::from_str::<FanoutConfig>(&raw)
                .unwrap_or_else(|error| fail(format!("invalid config: {error}")))
        }
        None => FanoutConfig::from_env(),
    };

    if let Err(error) = config.validate() {
        fail(error);
    }
    match config.identifier_source() {
        Ok(source) => eprintln!(
            "Configuration valid: bus `{}`, source `{}`, identifiers from {}",
            config.event_bus_name,
            config.event_source,
            source.kind()
        ),
        Err(error) => fail(error),
    }
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test topic_fanout_core");
    run_cargo(&["test", "-p", "topic_fanout_core"]);

    step("Test topic_fanout_lambda");
    run_cargo(&["test", "-p", "topic_fanout_lambda"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Package {
            target,
            profile,
            dist_dir,
        } => {
            package_fanout_lambda(&target, profile, &dist_dir);
        }
        Commands::RenderStack { props, output } => {
            render_stack(&props, output.as_deref());
        }
        Commands::ValidateConfig { config } => {
            validate_config(config.as_deref());
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Test => ci_test(),
                CiJob::All => {
                    ci_check();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
