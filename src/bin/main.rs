//! Whitelist CLI - the dApp page on a terminal
//!
//! Every command loads the page the same way the browser does: connect the wallet,
//! read membership and count, then render the button.
//!
//!   whitelist init                → create the local devnet ledger
//!   whitelist status              → {state, view, label}
//!   whitelist join                → press "Join the whitelist!"
//!   whitelist repl                → interactive page session
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use std::env;
use std::io::{IsTerminal, Write};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use whitelist_dapp::app::load_dotenv;
use whitelist_dapp::core::paths::files;
use whitelist_dapp::logging::init_logging;
use whitelist_dapp::{install_signal_handlers, Dapp, DappConfig, Devnet, DevnetWallet, Network, Shutdown, View};

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("whitelist {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}", json!({"error": format!("runtime: {e}")}));
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match opts.command.as_deref() {
            Some("init") => cmd_init(&opts),
            Some("account") => cmd_account(&opts),
            Some("status") => cmd_status(&opts).await,
            Some("connect") => cmd_connect(&opts).await,
            Some("join") => cmd_join(&opts).await,
            Some("click") => cmd_click(&opts).await,
            Some("repl") => cmd_repl(&opts).await,
            Some(cmd) => Err(format!("Unknown command: {}", cmd)),
            None => {
                print_usage();
                Ok(Value::Null)
            }
        }
    });

    match result {
        Ok(Value::Null) => {}
        Ok(output) => println!("{}", format_json(&output, &opts)),
        Err(e) => {
            eprintln!("{}", format_json(&json!({"error": e}), &opts));
            std::process::exit(1);
        }
    }
}

fn format_json(value: &Value, opts: &ParsedArgs) -> String {
    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    arg: Option<String>,
    account: Option<String>,
    network: Option<String>,
    contract: Option<String>,
    force: bool,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv(std::path::Path::new(files::DOTENV));

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--force" | "-f" => opts.force = true,
                "--account" | "-a" => {
                    if i + 1 < args.len() {
                        opts.account = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--network" | "--chain-id" | "-n" => {
                    if i + 1 < args.len() {
                        opts.network = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--contract" | "-c" => {
                    if i + 1 < args.len() {
                        opts.contract = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        if !positional.is_empty() {
            opts.arg = Some(positional.remove(0));
        }

        opts
    }
}

fn print_usage() {
    println!(
        r#"whitelist - join the on-chain whitelist

USAGE:
    whitelist <command> [options]

COMMANDS:
    init                    Create the local devnet ledger
    account [label]         Print the devnet address for an account label
    status                  Load the page: connect, read membership and count
    connect                 Connect the wallet explicitly
    join                    Load the page and press "Join the whitelist!"
    click                   Load the page and press whatever button is shown
    repl                    Interactive page session

OPTIONS:
    --account, -a <label>   Wallet account label (env: WHITELIST_ACCOUNT, default: deployer)
    --network, -n <net>     init: chain for the devnet (name or chain id, default: rinkeby)
    --contract, -c <addr>   Contract address (env: WHITELIST_CONTRACT_ADDRESS)
    --force, -f             init: overwrite an existing ledger
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENVIRONMENT:
    WHITELIST_ROOT          Data directory (devnet.json, deployment.json)
    WHITELIST_CHAIN_ID      Network the dApp accepts (default: 4)
    WHITELIST_CONFIRM_TIMEOUT_MS   Give up waiting for a receipt after this long

EXAMPLES:
    whitelist init
    deploy
    whitelist join --account alice
    whitelist status --account alice --json | jq .state.whitelist_count
"#
    );
}

fn load_config(opts: &ParsedArgs) -> Result<DappConfig, String> {
    let mut config = DappConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(account) = &opts.account {
        config = config.with_account(account.clone());
    }
    if let Some(contract) = &opts.contract {
        let address = contract.parse().map_err(|e| format!("Invalid contract address: {}", e))?;
        config = config.with_contract(address);
    }
    Ok(config)
}

fn open_dapp(opts: &ParsedArgs) -> Result<Dapp, String> {
    let config = load_config(opts)?;
    let devnet = Arc::new(Devnet::open(config.devnet_path()).map_err(|e| e.to_string())?);
    let wallet = Arc::new(DevnetWallet::labelled(devnet, &config.account));
    debug!(account = %wallet.account(), "using devnet wallet");
    let dapp = Dapp::new(config, wallet)
        .map_err(|e| e.to_string())?
        .with_alert(Arc::new(|message: &str| eprintln!("alert: {}", message)));
    Ok(dapp)
}

async fn page(dapp: &Dapp) -> Value {
    let state = dapp.state().await;
    let view = dapp.view().await;
    json!({
        "state": state,
        "seats_left": state.seats_left(),
        "view": view,
        "label": view.label(),
    })
}

fn cmd_init(opts: &ParsedArgs) -> Result<Value, String> {
    let config = load_config(opts)?;
    let network = match opts.network.as_deref() {
        Some(raw) => Network::parse(raw).ok_or_else(|| format!("Invalid network: {}", raw))?,
        None => config.network,
    };
    let path = config.devnet_path();
    if path.exists() && !opts.force {
        return Err(format!("Devnet ledger already exists at {} (use --force)", path.display()));
    }
    Devnet::create(&path, network.chain_id()).map_err(|e| e.to_string())?;
    Ok(json!({
        "status": "initialized",
        "ledger": path.display().to_string(),
        "chain_id": network.chain_id(),
        "network": network.as_str(),
    }))
}

fn cmd_account(opts: &ParsedArgs) -> Result<Value, String> {
    let config = load_config(opts)?;
    let label = opts.arg.clone().unwrap_or(config.account);
    let address = Devnet::account(&label);
    Ok(json!({"account": label, "address": address}))
}

async fn cmd_status(opts: &ParsedArgs) -> Result<Value, String> {
    let dapp = open_dapp(opts)?;
    // Mount failures are part of the page; they show up as the error view.
    let _ = dapp.mount().await;
    Ok(page(&dapp).await)
}

async fn cmd_connect(opts: &ParsedArgs) -> Result<Value, String> {
    let dapp = open_dapp(opts)?;
    dapp.connect_wallet().await.map_err(|e| e.to_string())?;
    Ok(page(&dapp).await)
}

async fn cmd_join(opts: &ParsedArgs) -> Result<Value, String> {
    let dapp = open_dapp(opts)?;
    dapp.mount().await.map_err(|e| e.to_string())?;
    if dapp.view().await != View::JoinWhitelist {
        return Ok(page(&dapp).await);
    }
    press(&dapp, &install_signal_handlers()).await?;
    Ok(page(&dapp).await)
}

async fn cmd_click(opts: &ParsedArgs) -> Result<Value, String> {
    let dapp = open_dapp(opts)?;
    let _ = dapp.mount().await;
    press(&dapp, &install_signal_handlers()).await?;
    Ok(page(&dapp).await)
}

async fn press(dapp: &Dapp, shutdown: &Shutdown) -> Result<View, String> {
    match shutdown.guard(dapp.click()).await {
        Some(result) => result.map_err(|e| e.to_string()),
        None => Err("Interrupted while waiting for confirmation".into()),
    }
}

async fn cmd_repl(opts: &ParsedArgs) -> Result<Value, String> {
    println!("Whitelist page - type 'help' or 'quit'\n");

    let dapp = open_dapp(opts)?;
    let shutdown = install_signal_handlers();
    let _ = dapp.mount().await;
    println!("[{}]", dapp.view().await.label());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("whitelist> ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = shutdown.wait() => break,
        };
        let input = match line {
            Ok(Some(line)) => line,
            _ => break,
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                println!("Commands:");
                println!("  click      - Press the button");
                println!("  state      - Show session state");
                println!("  refresh    - Re-read the whitelist count");
                println!("  check      - Re-check membership");
                println!("  dismiss    - Dismiss the error message");
                println!("  disconnect - Forget the wallet connection");
                println!("  quit       - Exit");
            }
            "click" => {
                if let Err(e) = press(&dapp, &shutdown).await {
                    println!("Error: {}", e);
                }
            }
            "state" => {
                let state = dapp.state().await;
                println!("{}", serde_json::to_string_pretty(&state).unwrap_or_default());
            }
            "refresh" => match dapp.update_whitelisted_count().await {
                Ok(count) => println!("{} users in the whitelist", count),
                Err(e) => println!("Error: {}", e),
            },
            "check" => match dapp.check_if_whitelisted().await {
                Ok(member) => println!("whitelisted: {}", member),
                Err(e) => println!("Error: {}", e),
            },
            "dismiss" => dapp.dismiss_error().await,
            "disconnect" => dapp.disconnect().await,
            cmd => {
                println!("Unknown: {}. Type 'help'.", cmd);
                continue;
            }
        }
        let state = dapp.state().await;
        println!("There are currently {} users in the whitelist", state.whitelist_count);
        println!("[{}]", dapp.view().await.label());
    }

    println!("Goodbye!");
    Ok(json!({"status": "exited"}))
}
