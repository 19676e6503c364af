//! Memora CLI
//!
//! Command-line interface for inspecting and managing Memora caches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use colored::*;
use futures::future::join_all;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use memora_cache::{CacheControl, CacheHandle, CacheSettings, JsonCodec, MemoCache, MemoConfig};
use memora_core::{Arg, CacheEntry, CacheStore, CallArgs, Codec, KeyTtl, MemoraError};
use memora_keys::{canonical_form, derive_key, storage_key};
use memora_store::{MemoryStore, RedisStore};

/// Memora - distributed memoization over TTL key-value stores
#[derive(Parser)]
#[command(name = "memora")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Store URL
    #[arg(long, env = "REDIS_URL", global = true)]
    redis_url: Option<String>,

    /// Key prefix
    #[arg(long, env = "CACHE_PREFIX", global = true)]
    prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments addressing one cache entry.
#[derive(Args, Debug, Clone)]
struct EntryArgs {
    /// Function namespace
    namespace: String,

    /// Positional argument (JSON, or a bare string)
    #[arg(short, long = "arg")]
    args: Vec<String>,

    /// Keyword argument as NAME=VALUE (VALUE is JSON, or a bare string)
    #[arg(short, long = "kwarg")]
    kwargs: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the storage key for a set of arguments
    Key {
        #[command(flatten)]
        entry: EntryArgs,
    },

    /// Show what is stored for a set of arguments
    Inspect {
        #[command(flatten)]
        entry: EntryArgs,
    },

    /// Delete one entry, or a whole namespace with --all
    Invalidate {
        #[command(flatten)]
        entry: EntryArgs,
        /// Delete every entry in the namespace
        #[arg(long)]
        all: bool,
    },

    /// Check that the store is reachable
    Ping,

    /// Run concurrent calls against a slow memoized function
    Demo {
        /// Number of concurrent callers
        #[arg(short, long, default_value = "8")]
        count: usize,
        /// Simulated computation time in milliseconds
        #[arg(long, default_value = "250")]
        work_ms: u64,
        /// Use an in-process store instead of Redis
        #[arg(long)]
        memory: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "memora=debug,info"
    } else {
        "memora=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = CacheSettings::from_env().context("Invalid cache settings")?;
    if let Some(url) = cli.redis_url {
        settings.redis_url = url;
    }
    if let Some(prefix) = cli.prefix {
        settings.prefix = prefix;
    }

    match cli.command {
        Commands::Key { entry } => cmd_key(&settings, &entry),
        Commands::Inspect { entry } => cmd_inspect(&settings, &entry).await,
        Commands::Invalidate { entry, all } => cmd_invalidate(&settings, &entry, all).await,
        Commands::Ping => cmd_ping(&settings).await,
        Commands::Demo {
            count,
            work_ms,
            memory,
        } => cmd_demo(&settings, count, Duration::from_millis(work_ms), memory).await,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses a command-line value: JSON when it parses, a plain string otherwise.
fn parse_value(raw: &str) -> Arg {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Arg::from)
        .unwrap_or_else(|_| Arg::from(raw))
}

fn parse_call(entry: &EntryArgs) -> Result<CallArgs> {
    let mut call = CallArgs::positional(entry.args.iter().map(|a| parse_value(a)).collect());
    for raw in &entry.kwargs {
        let Some((name, value)) = raw.split_once('=') else {
            bail!("keyword argument {raw:?} is not NAME=VALUE");
        };
        if name.is_empty() {
            bail!("keyword argument {raw:?} has an empty name");
        }
        call = call.kwarg(name, parse_value(value));
    }
    Ok(call)
}

/// Opens the configured store and checks it answers.
async fn connect(settings: &CacheSettings) -> Result<MemoCache> {
    debug!(url = %settings.redis_url, prefix = %settings.prefix, "Connecting to cache store");
    let store = RedisStore::from_url(&settings.redis_url).context("Invalid REDIS_URL")?;
    let cache = MemoCache::with_prefix(Arc::new(store), settings.prefix.clone());
    cache
        .ping()
        .await
        .with_context(|| format!("Cannot reach cache store at {}", settings.redis_url))?;
    Ok(cache)
}

fn management_handle(cache: &MemoCache, namespace: &str) -> Result<CacheHandle<serde_json::Value>> {
    Ok(cache.handle(MemoConfig::new().with_namespace(namespace))?)
}

fn format_timestamp(timestamp: f64) -> String {
    let micros = (timestamp * 1_000_000.0) as i64;
    DateTime::<Utc>::from_timestamp_micros(micros)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("{timestamp}"))
}

fn format_ttl(ttl: KeyTtl) -> String {
    match ttl {
        KeyTtl::Missing => "missing".into(),
        KeyTtl::Persistent => "no expiry".into(),
        KeyTtl::Expires(left) => format!("{:.3}s", left.as_secs_f64()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Print the storage key
fn cmd_key(settings: &CacheSettings, entry: &EntryArgs) -> Result<()> {
    let call = parse_call(entry)?;
    let fingerprint = derive_key(&call.args, &call.kwargs);
    let key = storage_key(&settings.prefix, &entry.namespace, &fingerprint);

    println!("{} {}", "🔑 Key:".cyan().bold(), key);
    println!("   {} {}", "Canonical form:".dimmed(), canonical_form(&call.args, &call.kwargs));
    println!("   {} {}", "Fingerprint:".dimmed(), fingerprint);

    Ok(())
}

/// Show a stored entry
async fn cmd_inspect(settings: &CacheSettings, entry: &EntryArgs) -> Result<()> {
    let call = parse_call(entry)?;
    let cache = connect(settings).await?;
    let handle = management_handle(&cache, &entry.namespace)?;

    let key = handle.cache_key_for(&call);
    println!("{} {}", "🔍 Inspecting:".cyan().bold(), key);

    let ttl = cache.store().ttl(&key).await.context("TTL query failed")?;
    if !ttl.exists() {
        println!("\n{}", "Not cached.".yellow());
        return Ok(());
    }
    println!("   {} {}", "TTL:".dimmed(), format_ttl(ttl));

    let Some(raw) = cache.store().get(&key).await.context("Read failed")? else {
        println!("\n{}", "Entry expired while reading.".yellow());
        return Ok(());
    };
    println!("   {} {} bytes", "Size:".dimmed(), raw.len());

    match Codec::<serde_json::Value>::decode(&JsonCodec, &raw) {
        Ok(stored) => print_entry(&stored)?,
        Err(e) => println!("   {} {}", "Not a JSON entry:".yellow(), e),
    }

    Ok(())
}

fn print_entry(entry: &CacheEntry<serde_json::Value>) -> Result<()> {
    println!("   {} {}", "Produced:".dimmed(), format_timestamp(entry.timestamp));
    println!("   {} {:.1}s", "Age:".dimmed(), entry.age().as_secs_f64());
    println!(
        "   {} {}",
        "Parameters:".dimmed(),
        canonical_form(&entry.parameters.args, &entry.parameters.kwargs)
    );
    println!("\n{}", "📋 Value (JSON):".yellow().bold());
    println!("{}", serde_json::to_string_pretty(&entry.value)?);
    Ok(())
}

/// Delete entries
async fn cmd_invalidate(settings: &CacheSettings, entry: &EntryArgs, all: bool) -> Result<()> {
    let cache = connect(settings).await?;
    let handle = management_handle(&cache, &entry.namespace)?;

    let removed = if all {
        if !entry.args.is_empty() || !entry.kwargs.is_empty() {
            bail!("--all deletes the whole namespace; drop the arguments");
        }
        println!("{} {}", "🧹 Invalidating namespace:".cyan().bold(), entry.namespace);
        handle.invalidate_all().await
    } else {
        let call = parse_call(entry)?;
        println!("{} {}", "🧹 Invalidating:".cyan().bold(), handle.cache_key_for(&call));
        handle.invalidate(&call).await
    };

    println!("{} {} key(s) removed", "✅".green(), removed);
    Ok(())
}

/// Check connectivity
async fn cmd_ping(settings: &CacheSettings) -> Result<()> {
    println!("{} {}", "📡 Pinging:".cyan().bold(), settings.redis_url);
    let start = Instant::now();
    connect(settings).await?;
    println!("{} store answered in {:?}", "✅".green(), start.elapsed());
    Ok(())
}

/// Demonstrate single-flight coalescing
async fn cmd_demo(
    settings: &CacheSettings,
    count: usize,
    work: Duration,
    memory: bool,
) -> Result<()> {
    println!("{} {} concurrent callers", "📊 Demo with".cyan().bold(), count);

    let cache = if memory {
        println!("   Using in-process store");
        MemoCache::with_prefix(Arc::new(MemoryStore::new()), settings.prefix.clone())
    } else {
        println!("   Using {}", settings.redis_url);
        connect(settings).await?
    };

    let computations = Arc::new(AtomicUsize::new(0));
    let counter = computations.clone();
    let config = settings.apply(
        MemoConfig::<i64>::new()
            .with_namespace("memora.demo.add")
            .with_max_wait(work * 4)
            .with_check_interval(Duration::from_millis(10)),
    );
    let add = cache.memoize(config, move |(a, b): (i64, i64)| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(work).await;
            Ok::<_, MemoraError>(a + b)
        }
    });

    let cleared = add.invalidate_all().await;
    if cleared > 0 {
        println!("   Cleared {} stale entr(ies)", cleared);
    }

    println!("\n{}", "1. Cold calls (single-flight)...".dimmed());
    let start = Instant::now();
    let results = join_all((0..count).map(|_| add.call((1, 2)))).await;
    let cold = start.elapsed();
    for result in &results {
        match result {
            Ok(3) => {}
            Ok(other) => bail!("add(1, 2) returned {other}"),
            Err(e) => bail!("demo call failed: {e}"),
        }
    }
    println!(
        "   ✓ {} calls to add(1, 2) in {:?}, computed {} time(s)",
        count,
        cold,
        computations.load(Ordering::SeqCst)
    );

    println!("\n{}", "2. Warm calls...".dimmed());
    let start = Instant::now();
    join_all((0..count).map(|_| add.call((1, 2)))).await;
    println!("   ✓ {} calls in {:?}", count, start.elapsed());

    let stats = add.stats();
    println!("\n{}", "📈 Results:".green().bold());
    println!(
        "   Hits: {}  Misses: {}  Hit ratio: {:.0}%",
        stats.hits,
        stats.misses,
        stats.hit_ratio() * 100.0
    );
    println!(
        "   Computations: {}  Locks acquired: {}  Lock timeouts: {}",
        stats.computations, stats.lock_acquired, stats.lock_timeouts
    );

    if stats.computations == 1 {
        println!("   {} Computed exactly once", "✅".green());
    } else {
        println!("   {} Computed {} times", "❌".red(), stats.computations);
    }

    add.invalidate_all().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(args: &[&str], kwargs: &[&str]) -> EntryArgs {
        EntryArgs {
            namespace: "ns".into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            kwargs: kwargs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_value_prefers_json() {
        assert_eq!(parse_value("42"), Arg::Int(42));
        assert_eq!(parse_value("\"42\""), Arg::from("42"));
        assert_eq!(parse_value("alice"), Arg::from("alice"));
        assert_eq!(parse_value("[1, 2]"), Arg::list([1, 2]));
    }

    #[test]
    fn test_parse_call() {
        let call = parse_call(&entry(&["1", "x"], &["limit=10", "tag=a=b"])).unwrap();
        assert_eq!(call.args, vec![Arg::Int(1), Arg::from("x")]);
        assert_eq!(call.get_kw("limit"), Some(&Arg::Int(10)));
        assert_eq!(call.get_kw("tag"), Some(&Arg::from("a=b")));
    }

    #[test]
    fn test_parse_call_rejects_bad_kwargs() {
        assert!(parse_call(&entry(&[], &["novalue"])).is_err());
        assert!(parse_call(&entry(&[], &["=1"])).is_err());
    }

    #[test]
    fn test_key_matches_memoized_call_layout() {
        let call = parse_call(&entry(&["1", "2"], &[])).unwrap();
        let key = storage_key("memora", "math.add", &derive_key(&call.args, &call.kwargs));
        let expected = derive_key(&[Arg::Int(1), Arg::Int(2)], &[]);
        assert_eq!(key, storage_key("memora", "math.add", &expected));
    }

    #[test]
    fn test_cli_parses_invalidate_all() {
        let cli = Cli::try_parse_from(["memora", "invalidate", "billing.quote", "--all"]).unwrap();
        match cli.command {
            Commands::Invalidate { entry, all } => {
                assert!(all);
                assert_eq!(entry.namespace, "billing.quote");
            }
            _ => panic!("expected invalidate"),
        }
    }
}
