fn main() {
    #[cfg(feature = "cli")]
    lzo1z::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("lzo1z: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
