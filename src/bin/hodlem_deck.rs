use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use hodlem_deck::config::ProtocolConfig;
use hodlem_deck::encoding::{word_to_hex, Word};
use hodlem_deck::ledger::InMemoryDeckLedger;
use hodlem_deck::session::{CardIndex, SeatIndex, TableSession};
use hodlem_deck::store::JsonFileSecretStore;
use hodlem_deck::DeckEngine;

const LOG_TARGET: &str = "bin::hodlem_deck";
const DEFAULT_DB: &str = "hodlem_secrets.json";
const DEFAULT_VERIF_ROUNDS: usize = 10;

type Engine = DeckEngine<InMemoryDeckLedger, JsonFileSecretStore>;

#[derive(Debug, Parser)]
#[command(name = "hodlem_deck")]
#[command(about = "Deck preparation, shuffle proofs and card decryption for one seat", long_about = None)]
struct Args {
    /// JSON document holding this player's secrets
    #[arg(long, env = "HODLEM_DB", default_value = DEFAULT_DB)]
    db: PathBuf,

    /// Table id
    #[arg(long = "id", env = "HODLEM_TABLE_ID")]
    table_id: u64,

    /// Player address the secrets are filed under
    #[arg(long, env = "HODLEM_FROM")]
    from: String,

    /// This player's seat at the table
    #[arg(long, env = "HODLEM_SEAT", default_value_t = 0)]
    seat: SeatIndex,

    /// Deck id on the contract (defaults to the table id)
    #[arg(long, env = "HODLEM_DECK_ID")]
    deck_id: Option<u64>,

    /// JSON snapshot of the deck contract state
    #[arg(long, env = "HODLEM_LEDGER")]
    ledger: Option<PathBuf>,

    /// Protocol configuration file
    #[arg(long, env = "HODLEM_CONFIG")]
    config: Option<PathBuf>,

    /// Optional RNG seed, for reproducible runs only
    #[arg(long, env = "HODLEM_RNG_SEED")]
    rng_seed: Option<u64>,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "HODLEM_LOG_JSON", default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate preparation secrets and print the commitment hash
    SubmitPrep,
    /// Reveal the preparation entries with proofs
    VerifyPrep,
    /// Shuffle the contract's latest deck
    Shuffle {
        /// Comma-separated order of the 52 playable positions (values 1..=52)
        #[arg(long, value_delimiter = ',')]
        order: Option<Vec<usize>>,

        /// Shadow rounds to commit to
        #[arg(long, default_value_t = DEFAULT_VERIF_ROUNDS)]
        verif_rounds: usize,
    },
    /// Answer the contract's challenge for this seat
    VerifyShuffle,
    /// Strip this seat's mask from dealt cards
    Decrypt {
        /// Comma-separated card indices
        #[arg(long, value_delimiter = ',', required = true)]
        cards: Vec<CardIndex>,

        /// Card ownership as `card:seat`, repeatable
        #[arg(long = "draw", value_parser = parse_draw)]
        draws: Vec<(CardIndex, SeatIndex)>,
    },
    /// Open cards in public
    Reveal {
        #[arg(long, value_delimiter = ',', required = true)]
        cards: Vec<CardIndex>,
    },
    /// Print the base index of a card dealt to this seat
    Peek {
        #[arg(long)]
        card: CardIndex,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json_logs)?;
    run(args).await
}

fn load_dotenv() {
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

fn parse_draw(value: &str) -> std::result::Result<(CardIndex, SeatIndex), String> {
    let (card, seat) = value
        .split_once(':')
        .ok_or_else(|| format!("expected card:seat, got {value}"))?;
    let card = card.trim().parse().map_err(|err| format!("bad card: {err}"))?;
    let seat = seat.trim().parse().map_err(|err| format!("bad seat: {err}"))?;
    Ok((card, seat))
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ProtocolConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ProtocolConfig::default(),
    };
    let ledger = match &args.ledger {
        Some(path) => InMemoryDeckLedger::load_json(path)
            .with_context(|| format!("failed to load ledger snapshot {}", path.display()))?,
        None => InMemoryDeckLedger::new(),
    };
    let store = JsonFileSecretStore::open(&args.db)
        .await
        .with_context(|| format!("failed to open secret store {}", args.db.display()))?;
    let engine: Engine = DeckEngine::new(Arc::new(ledger), Arc::new(store)).with_config(config);

    let mut rng = args
        .rng_seed
        .map(StdRng::seed_from_u64)
        .unwrap_or_else(StdRng::from_entropy);

    let verif_rounds = match &args.command {
        Command::Shuffle { verif_rounds, .. } => *verif_rounds,
        _ => DEFAULT_VERIF_ROUNDS,
    };
    let mut session = TableSession::new(
        args.from.clone(),
        args.table_id,
        args.deck_id.unwrap_or(args.table_id),
        args.seat,
        verif_rounds,
    );
    info!(
        target: LOG_TARGET,
        address = %session.address,
        table_id = session.table_id,
        seat = session.seat_index,
        "running {:?}",
        args.command
    );

    match args.command {
        Command::SubmitPrep => {
            let hash = engine.prepare_deck(&session, &mut rng).await?;
            print_words([hash]);
        }
        Command::VerifyPrep => {
            let cards = engine.verify_prep(&session, &mut rng).await?;
            print_words(cards.iter().flat_map(|card| card.abi_words()));
        }
        Command::Shuffle { order, .. } => {
            require_ledger(&args.ledger)?;
            let output = match order {
                Some(order) => {
                    engine
                        .shuffle_with_permutation(&session, order, &mut rng)
                        .await?
                }
                None => engine.shuffle(&session, &mut rng).await?,
            };
            print_words(output.abi_words());
        }
        Command::VerifyShuffle => {
            require_ledger(&args.ledger)?;
            let response = engine.verify_shuffle(&session).await?;
            print_words(response.abi_words());
        }
        Command::Decrypt { cards, draws } => {
            require_ledger(&args.ledger)?;
            for (card, seat) in draws {
                session.assign_draw(card, seat);
            }
            let shares = engine.decrypt_cards(&session, &cards, &mut rng).await?;
            print_words(shares.iter().flat_map(|share| share.abi_words()));
        }
        Command::Reveal { cards } => {
            require_ledger(&args.ledger)?;
            let reveals = engine.reveal_cards(&session, &cards, &mut rng).await?;
            print_words(reveals.iter().flat_map(|reveal| reveal.abi_words()));
        }
        Command::Peek { card } => {
            require_ledger(&args.ledger)?;
            let open_index = engine.peek_card(&session, card).await?;
            println!("{open_index}");
        }
    }
    Ok(())
}

fn require_ledger(ledger: &Option<PathBuf>) -> Result<()> {
    if ledger.is_none() {
        return Err(anyhow!("this command reads the deck contract; pass --ledger"));
    }
    Ok(())
}

fn print_words(words: impl IntoIterator<Item = Word>) {
    for word in words {
        println!("{}", word_to_hex(&word));
    }
}
