// Command line front end for the LZO1Z codec.
//
// Uses explicit subcommands with positional INPUT/OUTPUT arguments; either
// may be omitted or given as `-` to use stdin/stdout.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::io::{compress_to_vec, decompress_to_vec};
use crate::lzo1z::max_compressed_size;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// LZO1Z block compressor/decompressor.
#[derive(Parser, Debug)]
#[command(
    name = "lzo1z",
    version,
    about = "LZO1Z block compressor/decompressor",
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
    /// Compress an input stream into one LZO1Z block.
    Compress(StreamArgs),
    /// Decompress one LZO1Z block.
    Decompress(DecompressArgs),
    /// Print the worst-case compressed size for an input length.
    Bound(BoundArgs),
}

#[derive(Args, Debug)]
struct StreamArgs {
    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecompressArgs {
    /// Expected decompressed size; the buffer still grows if it is too small.
    #[arg(long, short = 's', value_name = "N")]
    size: Option<usize>,

    #[command(flatten)]
    stream: StreamArgs,
}

#[derive(Args, Debug)]
struct BoundArgs {
    /// Uncompressed input length in bytes.
    #[arg(value_name = "LEN")]
    len: usize,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Bound(usize),
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    size_hint: Option<usize>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    json_output: bool,
}

/// `-` stands for the standard stream.
fn stdio_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| p.as_os_str() != "-")
}

fn resolve_options(cli: Cli) -> Options {
    let (command, size_hint, stream) = match cli.command {
        Cmd::Compress(args) => (Command::Compress, None, Some(args)),
        Cmd::Decompress(args) => (Command::Decompress, args.size, Some(args.stream)),
        Cmd::Bound(args) => (Command::Bound(args.len), None, None),
    };
    let (input_file, output_file) = match stream {
        Some(s) => (stdio_path(s.input), stdio_path(s.output)),
        None => (None, None),
    };

    Options {
        command,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        size_hint,
        input_file,
        output_file,
        json_output: cli.json_output,
    }
}

fn log_filter(opts: &Options) -> &'static str {
    match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

// ---------------------------------------------------------------------------
// Stream plumbing
// ---------------------------------------------------------------------------

fn read_input(path: Option<&Path>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path),
        None => {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data)?;
            Ok(data)
        }
    }
}

fn write_output(opts: &Options, data: &[u8]) -> Result<(), String> {
    match &opts.output_file {
        Some(path) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            let file = File::create(path)
                .map_err(|e| format!("output file: {}: {e}", path.display()))?;
            let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
            writer
                .write_all(data)
                .and_then(|()| writer.flush())
                .map_err(|e| format!("write error: {e}"))
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(data)
                .and_then(|()| out.flush())
                .map_err(|e| format!("write error: {e}"))
        }
    }
}

fn report(opts: &Options, name: &str, input_size: usize, output_size: usize) {
    if opts.verbose > 0 && !opts.quiet {
        eprintln!("lzo1z: {name}: input size: {input_size}, output size: {output_size}");
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": name,
            "input_size": input_size,
            "output_size": output_size,
        });
        eprintln!("{json:#}");
    }
}

// ---------------------------------------------------------------------------
// Compress command
// ---------------------------------------------------------------------------

fn cmd_compress(opts: &Options) -> i32 {
    let input = match read_input(opts.input_file.as_deref()) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("lzo1z: input: {e}");
            return 1;
        }
    };

    let packed = match compress_to_vec(&input) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("lzo1z: compress error: {e}");
            return 1;
        }
    };

    if let Err(msg) = write_output(opts, &packed) {
        eprintln!("lzo1z: {msg}");
        return 1;
    }

    report(opts, "compress", input.len(), packed.len());
    0
}

// ---------------------------------------------------------------------------
// Decompress command
// ---------------------------------------------------------------------------

fn cmd_decompress(opts: &Options) -> i32 {
    let input = match read_input(opts.input_file.as_deref()) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("lzo1z: input: {e}");
            return 1;
        }
    };

    let output = match decompress_to_vec(&input, opts.size_hint) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("lzo1z: decompress error: {e}");
            return 1;
        }
    };

    if let Some(expected) = opts.size_hint
        && expected != output.len()
        && !opts.quiet
    {
        eprintln!(
            "lzo1z: warning: expected {expected} bytes, decompressed {}",
            output.len()
        );
    }

    if let Err(msg) = write_output(opts, &output) {
        eprintln!("lzo1z: {msg}");
        return 1;
    }

    report(opts, "decompress", input.len(), output.len());
    0
}

// ---------------------------------------------------------------------------
// Bound command
// ---------------------------------------------------------------------------

fn cmd_bound(opts: &Options, len: usize) -> i32 {
    let bound = max_compressed_size(len);
    println!("{bound}");
    if opts.json_output {
        let json = serde_json::json!({
            "command": "bound",
            "input_size": len,
            "bound": bound,
        });
        eprintln!("{json:#}");
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
        Command::Bound(len) => cmd_bound(&opts, len),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_opts(args: &[&str]) -> Options {
        let argv: Vec<String> = std::iter::once("lzo1z".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cli = Cli::try_parse_from(argv).expect("cli parse failed");
        resolve_options(cli)
    }

    #[test]
    fn compress_subcommand_maps_correctly() {
        let opts = parse_opts(&["compress", "in.bin", "out.lzo"]);
        assert_eq!(opts.command, Command::Compress);
        assert_eq!(opts.input_file, Some(PathBuf::from("in.bin")));
        assert_eq!(opts.output_file, Some(PathBuf::from("out.lzo")));
        assert_eq!(opts.size_hint, None);
    }

    #[test]
    fn decompress_subcommand_maps_correctly() {
        let opts = parse_opts(&["--quiet", "decompress", "--size", "4096", "in.lzo"]);
        assert_eq!(opts.command, Command::Decompress);
        assert_eq!(opts.size_hint, Some(4096));
        assert!(opts.quiet);
        assert_eq!(opts.input_file, Some(PathBuf::from("in.lzo")));
        assert_eq!(opts.output_file, None);
    }

    #[test]
    fn dash_means_stdio() {
        let opts = parse_opts(&["compress", "-", "-"]);
        assert_eq!(opts.input_file, None);
        assert_eq!(opts.output_file, None);

        let opts = parse_opts(&["decompress", "-", "out.bin"]);
        assert_eq!(opts.input_file, None);
        assert_eq!(opts.output_file, Some(PathBuf::from("out.bin")));
    }

    #[test]
    fn bound_takes_length() {
        let opts = parse_opts(&["bound", "1000"]);
        assert_eq!(opts.command, Command::Bound(1000));
        assert!(parse_cli_fails(&["bound", "ten"]));
    }

    #[test]
    fn global_flags() {
        let opts = parse_opts(&["--force", "--json", "compress", "in", "out"]);
        assert!(opts.force);
        assert!(opts.json_output);
        let opts = parse_opts(&["compress", "-f", "in", "out"]);
        assert!(opts.force);
    }

    #[test]
    fn verbose_is_capped() {
        let verbose = parse_opts(&["-v", "-v", "-v", "compress"]);
        assert_eq!(verbose.verbose, 2);
        assert_eq!(log_filter(&verbose), "debug");
        assert_eq!(log_filter(&parse_opts(&["-v", "compress"])), "info");
        assert_eq!(log_filter(&parse_opts(&["compress"])), "warn");
        assert_eq!(log_filter(&parse_opts(&["-q", "compress"])), "error");
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(parse_cli_fails(&["-q", "-v", "compress"]));
    }

    #[test]
    fn existing_output_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.lzo");
        std::fs::write(&out, b"old").unwrap();
        let out_str = out.to_str().unwrap();

        let opts = parse_opts(&["compress", "in", out_str]);
        let err = write_output(&opts, b"new").unwrap_err();
        assert!(err.contains("use -f"));
        assert_eq!(std::fs::read(&out).unwrap(), b"old");

        let opts = parse_opts(&["-f", "compress", "in", out_str]);
        write_output(&opts, b"new").unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"new");
    }

    fn parse_cli_fails(args: &[&str]) -> bool {
        let argv = std::iter::once("lzo1z").chain(args.iter().copied());
        Cli::try_parse_from(argv).is_err()
    }
}
