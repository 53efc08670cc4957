use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pairswap::{Address, Liquidity, MarketId, MarketParams, PoolConfig, WAD};
use pairswap_sdk::{
    preview_supply, preview_withdraw,
    scenario::{self, Scenario},
    simulate_swap_in, simulate_swap_out, MarketSnapshot, PoolSnapshot, SimulateResult,
};
use serde::Serialize;
use std::{fs, path::Path, str::FromStr};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ─── Account resolution ───────────────────────────────────────────────────────

/// Resolve `@label` to its derived address, or parse a base-58 address.
fn resolve_address(label_or_address: &str) -> Result<Address> {
    match label_or_address.strip_prefix('@') {
        Some("") => Err(anyhow!("Empty label '@'. Use @name or a base-58 address.")),
        Some(label) => Ok(Address::from_label(label)),
        None => Address::from_str(label_or_address).map_err(|_| {
            anyhow!("'{label_or_address}' is neither an @label nor a base-58 address.")
        }),
    }
}

// ─── WAD decimals ─────────────────────────────────────────────────────────────

/// Parse a decimal like `1.25` into a WAD-scaled integer (1.25e18).
fn parse_wad(decimal: &str) -> Result<u128> {
    let (whole, frac) = decimal.split_once('.').unwrap_or((decimal, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(anyhow!("'{decimal}' is not a decimal number."));
    }
    if frac.len() > 18 {
        return Err(anyhow!("'{decimal}' has more than 18 decimal places."));
    }
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits(whole) || !digits(frac) {
        return Err(anyhow!("'{decimal}' is not a decimal number."));
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse()? };
    let frac: u128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<18}").parse()?
    };
    whole
        .checked_mul(WAD)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| anyhow!("'{decimal}' is too large."))
}

/// Render a WAD-scaled integer as a trimmed decimal.
fn format_wad(value: u128) -> String {
    let whole = value / WAD;
    let frac = value % WAD;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

fn read_file(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Cannot read {what} from '{}'", path.display()))
}

fn load_snapshot(path: &Path) -> Result<PoolSnapshot> {
    PoolSnapshot::from_json(&read_file(path, "snapshot")?)
        .with_context(|| format!("'{}' is not a pool snapshot", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<Option<PoolConfig>> {
    let Some(path) = path else { return Ok(None) };
    let config = PoolConfig::from_json(&read_file(path, "pool config")?)
        .with_context(|| format!("Invalid pool config in '{}'", path.display()))?;
    Ok(Some(config))
}

/// JSON envelope shared by every command.
#[derive(Serialize)]
struct Output<'a, T: Serialize> {
    status: &'static str,
    command: &'a str,
    result: T,
}

fn print_json<T: Serialize>(command: &str, result: T) -> Result<()> {
    let out = Output { status: "ok", command, result };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// Pairswap — two-asset liquidity pool tooling.
///
/// Every command supports --json for machine-readable output.
/// Set RUST_LOG (e.g. RUST_LOG=pairswap=debug) to see engine logs on stderr.
#[derive(Parser)]
#[command(
    name    = "pairswap",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Market ids, swap simulation and scenario replay for pairswap pools.",
    after_help = "\
ENVIRONMENT:
  PAIRSWAP_CONFIG   Pool config JSON overriding a scenario's own pool settings
  RUST_LOG          Log filter for stderr output  [default: warn]

QUICK START:
  pairswap market-id --asset-a @usd --asset-b @eur --price 1.0
  pairswap replay    --scenario scenario.json --out snapshot.json
  pairswap simulate  --snapshot snapshot.json --market <ID> --amount-in 1000
  pairswap preview   --snapshot snapshot.json --market <ID> supply --shares 100"
)]
struct Cli {
    /// Pool config JSON file (owner, fee_recipient, default_fee_wad, chain_id)
    #[arg(long, global = true, value_name = "PATH", env = "PAIRSWAP_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the id of a market from its parameters
    MarketId {
        /// Asset A: @label or base-58 address
        #[arg(long)]
        asset_a: String,
        /// Asset B: @label or base-58 address
        #[arg(long)]
        asset_b: String,
        /// Reference price as a decimal: value of one B in A (e.g. 1.0)
        #[arg(long, value_parser = parse_wad)]
        price: u128,
        /// Rate model address
        #[arg(long)]
        rate_model: Option<String>,
    },

    /// Simulate an exact-in or exact-out swap against a snapshot
    ///
    /// Uses the fixed-price curve; markets with a rate model are rejected.
    Simulate {
        #[arg(long, value_name = "PATH")]
        snapshot: std::path::PathBuf,
        #[arg(long)]
        market: String,
        /// Exact amount of A to sell
        #[arg(long, conflicts_with = "amount_out", required_unless_present = "amount_out")]
        amount_in: Option<u128>,
        /// Exact amount of A to buy
        #[arg(long)]
        amount_out: Option<u128>,
        /// Minimum B received (with --amount-in)
        #[arg(long, default_value_t = 0, requires = "amount_in")]
        min_out: u128,
        /// Maximum B paid (with --amount-out)
        #[arg(long, requires = "amount_out")]
        max_in: Option<u128>,
    },

    /// Preview the shares and assets of a supply or withdrawal
    Preview {
        #[arg(long, value_name = "PATH")]
        snapshot: std::path::PathBuf,
        #[arg(long)]
        market: String,
        #[arg(value_enum)]
        action: Action,
        #[arg(long, default_value_t = 0)]
        amount_a: u128,
        #[arg(long, default_value_t = 0)]
        amount_b: u128,
        #[arg(long, default_value_t = 0)]
        shares: u128,
    },

    /// Replay a JSON scenario against a fresh in-memory pool
    Replay {
        #[arg(long, value_name = "PATH")]
        scenario: std::path::PathBuf,
        /// Write the final pool snapshot here
        #[arg(long, value_name = "PATH")]
        out: Option<std::path::PathBuf>,
    },

    /// Show the markets and positions of a snapshot
    Inspect {
        #[arg(long, value_name = "PATH")]
        snapshot: std::path::PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Action {
    Supply,
    Withdraw,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::MarketId { asset_a, asset_b, price, rate_model } => {
            cmd_market_id(asset_a, asset_b, *price, rate_model.as_deref(), cli.json)?;
        }
        Commands::Simulate { snapshot, market, amount_in, amount_out, min_out, max_in } => {
            cmd_simulate(snapshot, market, *amount_in, *amount_out, *min_out, *max_in, cli.json)?;
        }
        Commands::Preview { snapshot, market, action, amount_a, amount_b, shares } => {
            cmd_preview(snapshot, market, *action, *amount_a, *amount_b, *shares, cli.json)?;
        }
        Commands::Replay { scenario, out } => {
            cmd_replay(scenario, out.as_deref(), cli.config.as_deref(), cli.json)?;
        }
        Commands::Inspect { snapshot } => {
            cmd_inspect(snapshot, cli.json)?;
        }
    }

    Ok(())
}

// ─── market-id ───────────────────────────────────────────────────────────────

fn cmd_market_id(asset_a: &str, asset_b: &str, price: u128, rate_model: Option<&str>, json: bool) -> Result<()> {
    let params = MarketParams {
        asset_a: resolve_address(asset_a).context("--asset-a")?,
        asset_b: resolve_address(asset_b).context("--asset-b")?,
        rate_model: rate_model.map(resolve_address).transpose().context("--rate-model")?,
        reference_price: price,
    };
    let id = params.id();

    if json {
        #[derive(Serialize)]
        struct MarketIdOutput {
            market: MarketId,
            params: MarketParams,
        }
        return print_json("market-id", MarketIdOutput { market: id, params });
    }

    println!("─── Market ───────────────────────────────────────────────────────");
    println!("  Market id        {id}");
    println!("  Asset A          {}", params.asset_a);
    println!("  Asset B          {}", params.asset_b);
    println!("  Reference price  {}  (1 B = {} A)", price, format_wad(price));
    match params.rate_model {
        Some(model) => println!("  Rate model       {model}"),
        None => println!("  Rate model       none (fixed price)"),
    }
    Ok(())
}

// ─── simulate ────────────────────────────────────────────────────────────────

fn find_market<'a>(snapshot: &'a PoolSnapshot, market: &str) -> Result<&'a MarketSnapshot> {
    let id = MarketId::from_str(market).map_err(|e| anyhow!("--market: {e}"))?;
    Ok(snapshot.market(&id)?)
}

fn cmd_simulate(
    snapshot_path: &Path,
    market: &str,
    amount_in: Option<u128>,
    amount_out: Option<u128>,
    min_out: u128,
    max_in: Option<u128>,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let market = find_market(&snapshot, market)?;

    let sim = match (amount_in, amount_out) {
        (Some(amount_in), None) => simulate_swap_in(market, amount_in, min_out)?,
        (None, Some(amount_out)) => simulate_swap_out(market, amount_out, max_in.unwrap_or(u128::MAX))?,
        _ => return Err(anyhow!("Pass exactly one of --amount-in or --amount-out.")),
    };
    debug!(market = %sim.market, kind = ?sim.kind, "simulated");

    if json {
        return print_json("simulate", &sim);
    }
    print_simulation(&sim);
    Ok(())
}

fn print_simulation(sim: &SimulateResult) {
    println!("─── Simulation ───────────────────────────────────────────────────");
    println!("  Market           {}", sim.market);
    println!("  Kind             {:?}", sim.kind);
    println!("  Amount in   (A/B){:>22}", sim.amount_in);
    println!("  Gross out        {:>22}", sim.gross_out);
    println!("  Fee              {:>22}  ({} of output)", sim.fee, format_wad(sim.fee_rate_wad));
    println!("  Amount out       {:>22}", sim.amount_out);
    println!("  Effective rate   {:>22.8}", sim.effective_rate);
    println!("  ─── After ───────────────────────────────────────");
    println!("  Reserve A        {:>22}", sim.reserve_a_after);
    println!("  Reserve B        {:>22}", sim.reserve_b_after);
    println!("  Healthy          {}", if sim.healthy_after { "yes" } else { "no (recovering)" });
}

// ─── preview ─────────────────────────────────────────────────────────────────

fn cmd_preview(
    snapshot_path: &Path,
    market: &str,
    action: Action,
    amount_a: u128,
    amount_b: u128,
    shares: u128,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let market = find_market(&snapshot, market)?;
    let liquidity = Liquidity::from_parts(amount_a, amount_b, shares)
        .map_err(|e| anyhow!("{e}. Use --amount-a/--amount-b or --shares."))?;

    match action {
        Action::Supply => {
            let receipt = preview_supply(market, liquidity)?;
            if json {
                return print_json("preview-supply", receipt);
            }
            println!("─── Supply Preview ───────────────────────────────────────────────");
            println!("  Market           {}", market.id);
            println!("  Deposit A        {:>22}", receipt.assets_a);
            println!("  Deposit B        {:>22}", receipt.assets_b);
            println!("  Shares           {:>22}", receipt.shares);
            println!("  Fee shares       {:>22}", receipt.fee_shares);
        }
        Action::Withdraw => {
            let receipt = preview_withdraw(market, liquidity)?;
            if json {
                return print_json("preview-withdraw", receipt);
            }
            println!("─── Withdraw Preview ─────────────────────────────────────────────");
            println!("  Market           {}", market.id);
            println!("  Shares burned    {:>22}", receipt.shares);
            println!("  Receive A        {:>22}", receipt.assets_a);
            println!("  Receive B        {:>22}", receipt.assets_b);
        }
    }
    Ok(())
}

// ─── replay ──────────────────────────────────────────────────────────────────

fn cmd_replay(scenario_path: &Path, out: Option<&Path>, config: Option<&Path>, json: bool) -> Result<()> {
    let scenario = Scenario::from_json(&read_file(scenario_path, "scenario")?)
        .with_context(|| format!("'{}' is not a valid scenario", scenario_path.display()))?;
    let config = load_config(config)?;
    let outcome = scenario::run(&scenario, config)
        .with_context(|| format!("Replay of '{}' failed", scenario_path.display()))?;

    if let Some(out) = out {
        fs::write(out, outcome.snapshot.to_json_pretty()?)
            .with_context(|| format!("Cannot write snapshot to '{}'", out.display()))?;
    }

    if json {
        return print_json("replay", &outcome);
    }

    println!("─── Replay ───────────────────────────────────────────────────────");
    println!("  Scenario         {}", scenario_path.display());
    println!("  Steps            {}", outcome.steps.len());
    println!("  Markets          {}", outcome.snapshot.markets.len());
    println!("  Clock            {}", outcome.snapshot.captured_at);
    if let Some(out) = out {
        println!("  Snapshot         {}", out.display());
    }
    println!();
    print_markets(&outcome.snapshot);
    Ok(())
}

// ─── inspect ─────────────────────────────────────────────────────────────────

fn cmd_inspect(snapshot_path: &Path, json: bool) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    if json {
        return print_json("inspect", &snapshot);
    }

    println!("─── Pool ─────────────────────────────────────────────────────────");
    println!("  Owner            {}", snapshot.owner);
    println!("  Fee recipient    {}", snapshot.fee_recipient);
    println!("  Custody          {}", snapshot.custody);
    println!("  Captured at      {}", snapshot.captured_at);
    println!();
    print_markets(&snapshot);

    if !snapshot.positions.is_empty() {
        println!();
        println!("─── Positions ────────────────────────────────────────────────────");
        for position in &snapshot.positions {
            println!("  {}  {}  {:>22}", position.market, position.owner, position.shares);
        }
    }
    Ok(())
}

fn print_markets(snapshot: &PoolSnapshot) {
    if snapshot.markets.is_empty() {
        println!("  No markets.");
        return;
    }
    for market in &snapshot.markets {
        println!("─── Market {} ───", market.id);
        println!("  Assets           {} / {}", market.params.asset_a, market.params.asset_b);
        println!("  Reference price  {}", format_wad(market.params.reference_price));
        println!("  Reserve A        {:>22}", market.market.reserve_a);
        println!("  Reserve B        {:>22}", market.market.reserve_b);
        println!("  Total shares     {:>22}", market.market.total_shares);
        println!("  Fee rate         {}", format_wad(market.market.fee_rate_wad));
        println!("  Healthy          {}", if market.healthy { "yes" } else { "no" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wad_decimals() {
        assert_eq!(parse_wad("1").unwrap(), WAD);
        assert_eq!(parse_wad("1.25").unwrap(), WAD + WAD / 4);
        assert_eq!(parse_wad(".5").unwrap(), WAD / 2);
        assert_eq!(parse_wad("0.000000000000000001").unwrap(), 1);
        assert!(parse_wad("0.0000000000000000001").is_err());
        assert!(parse_wad("1.2.3").is_err());
        assert!(parse_wad("-1").is_err());
        assert!(parse_wad(".").is_err());
        assert!(parse_wad("340282366920938463464").is_err());
    }

    #[test]
    fn formats_wad_decimals() {
        assert_eq!(format_wad(WAD), "1");
        assert_eq!(format_wad(WAD / 2), "0.5");
        assert_eq!(format_wad(3 * WAD + 1), "3.000000000000000001");
        assert_eq!(parse_wad(&format_wad(1_234_500_000_000_000_000)).unwrap(), 1_234_500_000_000_000_000);
    }

    #[test]
    fn resolves_labels_and_addresses() {
        let usd = Address::from_label("usd");
        assert_eq!(resolve_address("@usd").unwrap(), usd);
        assert_eq!(resolve_address(&usd.to_string()).unwrap(), usd);
        assert!(resolve_address("@").is_err());
        assert!(resolve_address("0OIl").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
