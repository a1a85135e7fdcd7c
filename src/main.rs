use std::{env, fs, process, sync::Arc};

use deck_builder::{
    card_blob::card_blob_service::CardBlobService,
    card_grouper::{card_grouper::GroupBy, stats::mana_curve_bars},
    cards::card::CardGroup,
    catalog::card_catalog::CardCatalog,
    deck_manager::deck_manager::DeckManager,
    services::{
        card_price_service::{CardPriceService, PriceCache},
        deck_service::HttpDeckService,
        identity::IdentityProvider,
        local_storage::PreferenceStore,
        ServiceResult,
    },
    utilities::{config::CONFIG, constants::ACCESS_TOKEN_KEY},
};
use log::{info, warn};
use reqwest::Client;

const USAGE: &str =
    "usage: deck_builder (<deck-file> | --remote <deck-id>) [type|color|mana|name|price] [--prices]";

struct Args {
    source: Source,
    group_by: GroupBy,
    show_prices: bool,
}

enum Source {
    File(String),
    Remote(String),
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let show_prices = args.iter().any(|arg| arg == "--prices");
    let mut positional = args.iter().filter(|arg| *arg != "--prices");

    let source = match positional.next().map(String::as_str) {
        Some("--remote") => Source::Remote(
            positional
                .next()
                .ok_or("--remote needs a deck id")?
                .to_string(),
        ),
        Some(path) => Source::File(path.to_string()),
        None => return Err(USAGE.to_string()),
    };
    let group_by = match positional.next() {
        Some(group_by) => group_by.parse()?,
        None => GroupBy::default(),
    };

    Ok(Args {
        source,
        group_by,
        show_prices,
    })
}

fn load_file_deck(path: &str, blob_service: &CardBlobService) -> ServiceResult<Vec<CardGroup>> {
    let card_blob = fs::read_to_string(path)?;
    let parsed = blob_service.parse(&card_blob);

    let mut group = CardGroup::new(path);
    group.cards = parsed.cards;
    group.invalid_cards = parsed.invalid_cards;
    Ok(vec![group])
}

async fn load_remote_deck(id: &str, blob_service: CardBlobService) -> ServiceResult<Vec<CardGroup>> {
    let preferences = Arc::new(PreferenceStore::open(&CONFIG.preferences_path)?);
    let access_token = preferences.get_item(ACCESS_TOKEN_KEY);
    let identity = IdentityProvider::with_store(preferences.clone());
    let repository = HttpDeckService::new(Client::new(), &CONFIG.decks_url, blob_service, access_token);

    let manager = DeckManager::new(Arc::new(repository), &identity, Some(preferences));
    manager.load(id).await?;

    let state = manager.current();
    let deck = state.deck.ok_or("deck was not loaded")?;
    info!(
        "Loaded deck {:?} with {} card groups, editable: {}",
        deck.name,
        deck.card_group_order.len(),
        state.can_edit
    );
    Ok(deck
        .ordered_card_groups()
        .map(|(_, group)| group.clone())
        .collect())
}

async fn print_prices(group: &CardGroup) -> ServiceResult<()> {
    let cache = PriceCache::new(CONFIG.card_cache_limit, CONFIG.card_expiration_ms);
    let service = CardPriceService::new(Client::new(), CONFIG.cards_url.clone(), cache);
    let names: Vec<String> = group.cards.iter().map(|card| card.name().to_string()).collect();
    let prices = service.get_card_prices(&names).await?;

    println!("Current prices:");
    for name in &names {
        match prices.get(&name.to_lowercase()).copied().flatten() {
            Some(price) => println!("  {} {}", price, name),
            None => println!("  ----- {}", name),
        }
    }
    Ok(())
}

fn print_card_group(group: &CardGroup, group_by: GroupBy) {
    for line in &group.invalid_cards {
        warn!("Could not parse {:?} in {}", line, group.name);
    }

    println!(
        "== {} ({} cards, {}) grouped by {} ==",
        group.name,
        group.count(),
        group.price(),
        group_by.label()
    );
    println!(
        "{}",
        CardBlobService::stringify_grouped(&group_by.group(&group.cards), &group.invalid_cards)
    );
    println!("Mana curve:");
    for (mana_value, bar) in mana_curve_bars(&group.cards).iter().enumerate() {
        println!("{:>2} | {}", mana_value, bar);
    }
    println!();
}

#[tokio::main]
async fn main() -> ServiceResult<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let catalog = Arc::new(CardCatalog::load_from_file(&CONFIG.catalog_path)?);
    let blob_service = CardBlobService::new(catalog);

    let card_groups = match &args.source {
        Source::File(path) => load_file_deck(path, &blob_service)?,
        Source::Remote(id) => load_remote_deck(id, blob_service).await?,
    };

    for group in &card_groups {
        print_card_group(group, args.group_by);
        if args.show_prices && !group.cards.is_empty() {
            print_prices(group).await?;
        }
    }
    Ok(())
}
