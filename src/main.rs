use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wisekey_scout::models::{price_text, Currency, Property, PropertyDraft, TransactionType};
use wisekey_scout::{Config, FileTokenStore, HttpTransport, Session, SyncCoordinator, SyncError, SyncResult};

#[derive(Parser)]
#[command(name = "wisekey")]
#[command(about = "Manage real-estate listings on a WiseKey backend")]
struct Cli {
    /// Override the API base URL (defaults to WISEKEY_API_BASE or the local backend)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ping the backend
    Health,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the logged-in profile
    Me,
    /// List your properties
    List,
    /// Search with a raw query string, e.g. `has_balcony=true&city=Tbilisi`
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    Create(CreateArgs),
    /// Change (or clear, with an empty string) the price of a listing
    SetPrice {
        id: i64,
        #[arg(allow_hyphen_values = true)]
        price: String,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the full record of a listing
    Show { id: i64 },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    title: Option<String>,
    /// buy, rent or daily_rent
    #[arg(long)]
    transaction_type: Option<TransactionType>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    district: Option<String>,
    #[arg(long)]
    street: Option<String>,
    /// GEL or USD
    #[arg(long)]
    currency: Option<Currency>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    area_sqm: Option<f64>,
    #[arg(long)]
    rooms: Option<i64>,
    #[arg(long)]
    bedrooms: Option<i64>,
    #[arg(long)]
    bathrooms: Option<i64>,
    #[arg(long)]
    floor: Option<i64>,
    #[arg(long)]
    total_floors: Option<i64>,
    #[arg(long)]
    has_balcony: Option<bool>,
    #[arg(long)]
    pets_allowed: Option<bool>,
    #[arg(long)]
    furnished: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

impl CreateArgs {
    /// Flags override the stock listing defaults
    fn into_draft(self) -> PropertyDraft {
        let defaults = PropertyDraft::default();
        PropertyDraft {
            title: self.title.unwrap_or(defaults.title),
            transaction_type: self.transaction_type.or(defaults.transaction_type),
            city: self.city.or(defaults.city),
            district: self.district.or(defaults.district),
            street: self.street.or(defaults.street),
            currency: self.currency.or(defaults.currency),
            price: self.price.or(defaults.price),
            area_sqm: self.area_sqm.or(defaults.area_sqm),
            rooms: self.rooms.or(defaults.rooms),
            bedrooms: self.bedrooms.or(defaults.bedrooms),
            bathrooms: self.bathrooms.or(defaults.bathrooms),
            floor: self.floor.or(defaults.floor),
            total_floors: self.total_floors.or(defaults.total_floors),
            has_balcony: self.has_balcony.or(defaults.has_balcony),
            pets_allowed: self.pets_allowed.or(defaults.pets_allowed),
            furnished: self.furnished.or(defaults.furnished),
            description: self.description.or(defaults.description),
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid WISEKEY_* environment")?;
    if let Some(base) = &cli.api_base {
        config = config.with_api_base(base);
    }

    let transport = HttpTransport::new(&config)?;
    let session = Session::new(FileTokenStore::new(&config.token_dir));
    let coordinator = SyncCoordinator::new(transport, session);
    coordinator.init_session();

    let result = run(&coordinator, cli.command).await;
    let status = coordinator.status();

    match result {
        Ok(()) => {
            if !status.is_empty() {
                info!("✅ {}", status);
            }
            Ok(())
        }
        Err(err) if status.is_empty() => anyhow::bail!("❌ {}", err),
        Err(_) => anyhow::bail!("❌ {}", status),
    }
}

async fn run(coordinator: &SyncCoordinator<HttpTransport>, command: Command) -> SyncResult<()> {
    match command {
        Command::Health => {
            let body = coordinator.health().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Login { email, password } => {
            coordinator.login(&email, &password).await?;
            if let Some(user) = coordinator.user() {
                println!("{} <{}> ({})", user.full_name, user.email, user.role);
            }
        }
        Command::Logout => coordinator.logout(),
        Command::Me => {
            if !coordinator.is_authenticated() {
                return Err(SyncError::NotAuthenticated);
            }
            match coordinator.load_profile().await {
                Some(user) => {
                    println!("#{} {} <{}>", user.id, user.full_name, user.email);
                    println!("   Role: {}", user.role);
                }
                None => println!("Profile unavailable"),
            }
        }
        Command::List => {
            coordinator.load_properties().await?;
            print_properties(&coordinator.properties());
        }
        Command::Search { query } => {
            coordinator.search(&query).await?;
            print_properties(&coordinator.properties());
        }
        Command::Create(args) => {
            let created = coordinator.create(args.into_draft()).await?;
            print_properties(&[created]);
        }
        Command::SetPrice { id, price } => {
            coordinator.load_properties().await?;
            coordinator.set_draft(id, price);
            coordinator.update_price(id).await?;
        }
        Command::Delete { id, yes } => {
            coordinator.load_properties().await?;
            coordinator.delete(id, |id| yes || confirm_delete(id)).await?;
        }
        Command::Show { id } => {
            coordinator.toggle_details(id).await?;
            if let Some(detail) = coordinator.detail(id) {
                println!("{}", serde_json::to_string_pretty(&detail.record)?);
            }
        }
    }

    Ok(())
}

fn print_properties(properties: &[Property]) {
    for (i, property) in properties.iter().enumerate() {
        let price = match property.price {
            Some(price) => format!(
                "{} {}",
                price_text(Some(price)),
                property.currency.as_ref().map(Currency::as_str).unwrap_or_default()
            ),
            None => "no price".to_string(),
        };
        println!("{}. #{} {} ({})", i + 1, property.id, property.title, price.trim());

        let place: Vec<&str> = [&property.city, &property.district, &property.street]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();
        if !place.is_empty() {
            println!("   {}", place.join(" · "));
        }
        if let (Some(rooms), Some(area)) = (property.rooms, property.area_sqm) {
            println!("   {} rooms, {} sqm", rooms, area);
        }
    }
}

fn confirm_delete(id: i64) -> bool {
    print!("Really delete property #{id}? [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
