use clap::Parser;
use courier_dispatch::application::engine::{DeliveryView, DispatchEngine};
use courier_dispatch::domain::business::{Business, SubscriptionTier};
use courier_dispatch::domain::delivery::DeliveryRequest;
use courier_dispatch::domain::ids::{BusinessId, DeliveryId, RiderId};
use courier_dispatch::domain::money::Credit;
use courier_dispatch::domain::ports::{
    BusinessStoreBox, DeliveryStoreBox, LedgerStoreBox, RiderStoreBox,
};
use courier_dispatch::domain::rider::Rider;
use courier_dispatch::domain::user::{Role, User};
use courier_dispatch::error::{Error, Result as EngineResult};
use courier_dispatch::infrastructure::in_memory::{
    InMemoryBusinessStore, InMemoryDeliveryStore, InMemoryLedgerStore, InMemoryRiderStore,
    InMemoryUserStore,
};
use courier_dispatch::interfaces::csv::script_reader::{ScriptCommand, ScriptReader};
use courier_dispatch::interfaces::csv::state_writer::StateWriter;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dispatch scenario CSV script
    script: PathBuf,

    /// Print final state as JSON instead of CSV
    #[arg(long)]
    json: bool,
}

/// Drives the engine from a scenario script, mapping script labels to the
/// ids generated at run time.
struct ScriptRunner {
    engine: DispatchEngine,
    users: InMemoryUserStore,
    businesses: InMemoryBusinessStore,
    riders: InMemoryRiderStore,
    business_labels: HashMap<String, BusinessId>,
    rider_labels: HashMap<String, RiderId>,
    delivery_labels: HashMap<String, DeliveryId>,
}

impl ScriptRunner {
    fn new() -> Self {
        let users = InMemoryUserStore::new();
        let businesses = InMemoryBusinessStore::new();
        let riders = InMemoryRiderStore::new();
        let deliveries = InMemoryDeliveryStore::new();
        let ledger = InMemoryLedgerStore::new();

        let engine = DispatchEngine::new(
            Box::new(businesses.clone()) as BusinessStoreBox,
            Box::new(riders.clone()) as RiderStoreBox,
            Box::new(deliveries.clone()) as DeliveryStoreBox,
            Box::new(ledger.clone()) as LedgerStoreBox,
        );
        Self {
            engine,
            users,
            businesses,
            riders,
            business_labels: HashMap::new(),
            rider_labels: HashMap::new(),
            delivery_labels: HashMap::new(),
        }
    }

    fn business_id(&self, label: &str) -> EngineResult<BusinessId> {
        self.business_labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::Validation(format!("unknown business label: {label}")))
    }

    fn rider_id(&self, label: &str) -> EngineResult<RiderId> {
        self.rider_labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::Validation(format!("unknown rider label: {label}")))
    }

    fn delivery_id(&self, label: &str) -> EngineResult<DeliveryId> {
        self.delivery_labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::Validation(format!("unknown delivery label: {label}")))
    }

    async fn run(&mut self, command: ScriptCommand) -> EngineResult<()> {
        match command {
            ScriptCommand::RegisterBusiness { label, tier } => {
                self.register_business(label, tier).await
            }
            ScriptCommand::RegisterRider { label } => self.register_rider(label).await,
            ScriptCommand::SetOnline { rider, online } => {
                let rider_id = self.rider_id(&rider)?;
                self.engine.set_rider_availability(rider_id, online).await?;
                Ok(())
            }
            ScriptCommand::Request {
                label,
                business,
                method,
            } => {
                let business_id = self.business_id(&business)?;
                let ticket = self
                    .engine
                    .request_delivery(
                        business_id,
                        DeliveryRequest {
                            pickup_address: "Avenue Mohammed V, Tangier".into(),
                            pickup_lat: 35.7650,
                            pickup_lng: -5.8250,
                            dropoff_address: "Boulevard Pasteur, Tangier".into(),
                            dropoff_lat: 35.7700,
                            dropoff_lng: -5.8100,
                            estimated_duration: 30,
                            payment_method: method,
                        },
                    )
                    .await?;
                self.delivery_labels.insert(label, ticket.delivery.id);
                Ok(())
            }
            ScriptCommand::Accept { delivery, rider } => {
                let delivery_id = self.delivery_id(&delivery)?;
                let rider_id = self.rider_id(&rider)?;
                self.engine.accept_delivery(delivery_id, rider_id).await?;
                Ok(())
            }
            ScriptCommand::Pickup { delivery } => {
                let delivery_id = self.delivery_id(&delivery)?;
                self.engine.mark_picked_up(delivery_id).await?;
                Ok(())
            }
            ScriptCommand::Transit { delivery } => {
                let delivery_id = self.delivery_id(&delivery)?;
                self.engine.mark_in_transit(delivery_id).await?;
                Ok(())
            }
            ScriptCommand::Deliver { delivery } => {
                let delivery_id = self.delivery_id(&delivery)?;
                self.engine.mark_delivered(delivery_id).await?;
                Ok(())
            }
            ScriptCommand::Cancel { delivery } => {
                let delivery_id = self.delivery_id(&delivery)?;
                self.engine.cancel_delivery(delivery_id).await?;
                Ok(())
            }
            ScriptCommand::TopUp { business, amount } => {
                let business_id = self.business_id(&business)?;
                self.engine
                    .add_wallet_credits(business_id, Credit::new(amount)?)
                    .await?;
                Ok(())
            }
        }
    }

    async fn register_business(&mut self, label: String, tier: SubscriptionTier) -> EngineResult<()> {
        use courier_dispatch::domain::ports::{BusinessStore, UserStore};

        let now = chrono::Utc::now();
        let user = User::new(format!("{label}@demo.ma"), Role::Business, label.clone(), now);
        let business = Business::new(user.id, label.clone(), tier, now);
        self.users.create(user).await?;
        self.business_labels.insert(label, business.id);
        self.businesses.create(business).await?;
        Ok(())
    }

    async fn register_rider(&mut self, label: String) -> EngineResult<()> {
        use courier_dispatch::domain::ports::{RiderStore, UserStore};

        let now = chrono::Utc::now();
        let user = User::new(format!("{label}@demo.ma"), Role::Rider, label.clone(), now);
        let rider = Rider::new(user.id, label.clone(), "+212 6 00 00 00 00".into(), now);
        self.users.create(user).await?;
        self.rider_labels.insert(label, rider.id);
        self.riders.create(rider).await?;
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct StateSummary {
    businesses: Vec<Business>,
    riders: Vec<Rider>,
    deliveries: Vec<DeliveryView>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut runner = ScriptRunner::new();

    let file = File::open(&cli.script).into_diagnostic()?;
    for command in ScriptReader::new(file).commands() {
        match command {
            Ok(command) => {
                if let Err(e) = runner.run(command).await {
                    eprintln!("Error processing command: {e}");
                }
            }
            Err(e) => eprintln!("Error reading command: {e}"),
        }
    }

    use courier_dispatch::domain::ports::{BusinessStore, RiderStore};
    let businesses = runner.businesses.list().await.into_diagnostic()?;
    let riders = runner.riders.list().await.into_diagnostic()?;
    let deliveries = runner.engine.all_deliveries().await.into_diagnostic()?;

    if cli.json {
        let summary = StateSummary {
            businesses,
            riders,
            deliveries,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).into_diagnostic()?
        );
    } else {
        let stdout = io::stdout();
        let writer = StateWriter::new(stdout.lock());
        writer
            .write_state(&businesses, &riders, &deliveries)
            .into_diagnostic()?;
    }

    Ok(())
}
