use ss_core::aliases::AliasStore;
use ss_core::audit::AuditLog;
use ss_core::cache::ResponseCache;
use ss_core::config::Config;
use ss_core::repl::{load_shell_history, Repl};
use ss_core::session::Session;
use ss_oracle::MockOracle;

fn print_help() {
    println!("shellsensei — safety-checked command assistant");
    println!();
    println!("Usage:");
    println!("  shellsensei           Interactive mode");
    println!();
    println!("Options:");
    println!("  --version   Print version");
    println!("  --help      Print this help");
    println!();
    println!("In interactive mode, type `help` for the command list.");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("shellsensei {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let config = Config::load_or_default();

    let audit = if config.security.audit_enabled {
        let path = config.security.resolve_audit_path();
        match AuditLog::open(&path) {
            Ok(log) => log,
            Err(e) => {
                eprintln!("warning: audit log unavailable at {}: {e}", path.display());
                AuditLog::noop()
            }
        }
    } else {
        AuditLog::noop()
    };

    let aliases = AliasStore::load(&config.aliases.resolve_path());
    if aliases.rejected_count() > 0 {
        eprintln!(
            "warning: {} alias(es) ignored by the safety denylist",
            aliases.rejected_count()
        );
    }

    let cache = config
        .cache
        .enabled
        .then(|| ResponseCache::open_with_ttl(config.cache.resolve_dir(), config.cache.ttl()));

    let session = Session::new(aliases, config.security.command_timeout_secs, audit);
    let shell_history = load_shell_history(config.history.max_entries);

    // The oracle is an external collaborator; the bundled mock keeps the
    // binary usable offline.
    let oracle = MockOracle::new();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create async runtime: {e}");
            std::process::exit(1);
        }
    };

    let mut repl = Repl::new(session, oracle, cache, shell_history);
    if let Err(e) = runtime.block_on(repl.run()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
