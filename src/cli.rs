// Command-line interface for Oxipatch.
//
// Subcommands apply a patch, inspect its header and segments, list its
// control tuples, and resolve numeric result codes to messages.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::bsdiff::control::ControlIter;
use crate::bsdiff::header::{HEADER_LEN, Segment};
use crate::compress::inflate::DEFAULT_CAPACITY_FACTOR;
use crate::engine::{self, PatchOptions};
use crate::error::ResultCode;
use crate::io::apply_file;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// BSDIFF40 binary patch applier.
#[derive(Parser, Debug)]
#[command(
    name = "oxipatch",
    version,
    about = "BSDIFF40 binary patch applier",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Apply a patch to an old file, producing the new file.
    Apply(ApplyArgs),
    /// Print header fields and segment sizes of a patch.
    Inspect(PrintArgs),
    /// Print every control tuple of a patch.
    Tuples(PrintArgs),
    /// Print the message for a numeric result code.
    Describe(DescribeArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct LimitArgs {
    /// Reject patches declaring a larger target (supports K/M/G suffix).
    #[arg(long = "max-target-size", value_parser = parse_byte_size)]
    max_target_size: Option<u64>,

    /// Reject segments inflating past this size (supports K/M/G suffix).
    #[arg(long = "max-inflated-size", value_parser = parse_byte_size)]
    max_inflated_size: Option<u64>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Original file.
    #[arg(value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// Patch file.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// Output file.
    #[arg(value_hint = ValueHint::FilePath)]
    new: PathBuf,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args, Debug)]
struct PrintArgs {
    /// Patch file.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args, Debug)]
struct DescribeArgs {
    /// Result code, e.g. -4.
    #[arg(allow_negative_numbers = true)]
    code: i32,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Apply,
    Inspect,
    Tuples,
    Describe,
    Config,
}

struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    old_file: Option<PathBuf>,
    patch_file: Option<PathBuf>,
    new_file: Option<PathBuf>,
    code: i32,
    patch_opts: PatchOptions,
}

fn patch_options(limits: &LimitArgs) -> PatchOptions {
    PatchOptions {
        max_target_size: limits.max_target_size,
        max_inflated_size: limits
            .max_inflated_size
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
        ..PatchOptions::default()
    }
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        old_file: None,
        patch_file: None,
        new_file: None,
        code: 0,
        patch_opts: PatchOptions::default(),
    };

    match cli.command {
        Cmd::Apply(args) => {
            opts.command = Command::Apply;
            opts.patch_opts = patch_options(&args.limits);
            opts.old_file = Some(args.old);
            opts.patch_file = Some(args.patch);
            opts.new_file = Some(args.new);
        }
        Cmd::Inspect(args) => {
            opts.command = Command::Inspect;
            opts.patch_opts = patch_options(&args.limits);
            opts.patch_file = Some(args.patch);
        }
        Cmd::Tuples(args) => {
            opts.command = Command::Tuples;
            opts.patch_opts = patch_options(&args.limits);
            opts.patch_file = Some(args.patch);
        }
        Cmd::Describe(args) => {
            opts.command = Command::Describe;
            opts.code = args.code;
        }
        Cmd::Config => {}
    }
    opts
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("oxipatch".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn print_json(json: &serde_json::Value) {
    let text = serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string());
    eprintln!("{text}");
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("oxipatch version {version} (Rust)");

    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("HEADER_LEN={HEADER_LEN}");
    eprintln!("INFLATE_CAPACITY_FACTOR={DEFAULT_CAPACITY_FACTOR}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Apply command
// ---------------------------------------------------------------------------

fn cmd_apply(opts: &Options) -> i32 {
    let (Some(old), Some(patch), Some(new)) = (&opts.old_file, &opts.patch_file, &opts.new_file)
    else {
        eprintln!("oxipatch: apply requires old, patch and new paths");
        return 1;
    };

    if new.exists() && !opts.force {
        eprintln!(
            "oxipatch: output file exists, use -f to overwrite: {}",
            new.display()
        );
        return 1;
    }

    let stats = match apply_file(old, patch, new, &opts.patch_opts) {
        Ok(stats) => stats,
        Err(e) => {
            let code = e.code();
            eprintln!("oxipatch: {} ({}): {e}", code.message(), code.code());
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxipatch: old size: {}, patch size: {}, new size: {}",
            stats.old_size, stats.patch_size, stats.new_size
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "apply",
            "old_size": stats.old_size,
            "patch_size": stats.patch_size,
            "new_size": stats.new_size,
            "new_sha256": stats.new_sha256.map(|h| hex(&h)),
        });
        print_json(&json);
    }

    0
}

// ---------------------------------------------------------------------------
// Print commands (inspect, tuples)
// ---------------------------------------------------------------------------

fn cmd_print(opts: &Options) -> i32 {
    let Some(path) = &opts.patch_file else {
        eprintln!("oxipatch: print commands require a patch file");
        return 1;
    };

    let patch = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("oxipatch: patch file: {}: {e}", path.display());
            return 1;
        }
    };

    let (info, control) = match engine::inspect_with_control(&patch, &opts.patch_opts) {
        Ok(r) => r,
        Err(e) => {
            let code = e.code();
            eprintln!("oxipatch: {} ({}): {e}", code.message(), code.code());
            return 1;
        }
    };

    if opts.command == Command::Inspect {
        println!("Patch file:          {}", path.display());
        println!("Patch size:          {}", info.patch_len);
        println!(
            "Magic:               {}",
            info.header.magic.escape_ascii()
        );
        println!("Target size:         {}", info.header.target_size);
        for (i, segment) in Segment::ALL.into_iter().enumerate() {
            println!(
                "{:<20} {} compressed, {} inflated",
                format!("{segment} segment:"),
                info.compressed[i],
                info.inflated[i]
            );
        }
        println!("Control tuples:      {}", info.tuples);
        if info.trailing_control_bytes > 0 {
            println!("Trailing ctrl bytes: {}", info.trailing_control_bytes);
        }
        println!("Total copy:          {}", info.total_copy);
        println!("Total insert:        {}", info.total_insert);

        if opts.json_output {
            let json = serde_json::json!({
                "command": "inspect",
                "patch_size": info.patch_len,
                "target_size": info.header.target_size,
                "compressed": info.compressed,
                "inflated": info.inflated,
                "tuples": info.tuples,
            });
            print_json(&json);
        }
        return 0;
    }

    // Tuples: show each instruction with the cursors it starts from.
    let (mut old_pos, mut new_pos) = (0i64, 0i64);
    println!("{:>8} {:>12} {:>12} {:>12} {:>12} {:>12}", "tuple", "new", "old", "copy", "insert", "seek");
    for (i, t) in ControlIter::new(&control).enumerate() {
        println!(
            "{i:>8} {new_pos:>12} {old_pos:>12} {:>12} {:>12} {:>+12}",
            t.copy_len, t.insert_len, t.seek_delta
        );
        new_pos = new_pos
            .saturating_add(t.copy_len)
            .saturating_add(t.insert_len);
        old_pos = old_pos
            .saturating_add(t.copy_len)
            .saturating_add(t.seek_delta);
    }

    0
}

// ---------------------------------------------------------------------------
// Describe command
// ---------------------------------------------------------------------------

fn cmd_describe(opts: &Options) -> i32 {
    let rc = ResultCode::from_code(opts.code);
    if opts.json_output {
        let json = serde_json::json!({
            "code": opts.code,
            "kind": format!("{rc:?}"),
            "message": rc.message(),
            "success": rc.is_success(),
        });
        print_json(&json);
    } else {
        println!("{}", rc.message());
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn default_filter(opts: &Options) -> &'static str {
    if opts.quiet {
        "error"
    } else {
        match opts.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Apply => cmd_apply(&opts),
        Command::Inspect | Command::Tuples => cmd_print(&opts),
        Command::Describe => cmd_describe(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
