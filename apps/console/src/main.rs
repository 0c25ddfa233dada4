use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::info;

use client_core::{
    load_settings, screens::{DriversScreen, OrdersScreen}, HttpRemoteService, IdentityError,
    IdentityProvider, MultipartUploader, SessionManager, SessionTokens,
};
use shared::domain::CompanyId;
use token_store::TokenStore;

#[derive(Parser, Debug)]
#[command(about = "Company console for the transfer marketplace")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange an identity-provider token for a persisted session.
    Login {
        #[arg(long)]
        token: String,
    },
    /// List the company's drivers, newest first.
    Drivers,
    /// List transfer orders currently open for bidding.
    Orders {
        #[arg(long)]
        region: Option<String>,
    },
    /// Upload one image file and print the resulting media id.
    Upload { path: PathBuf },
}

/// Identity seam for the CLI: the token is obtained out of band and passed
/// on the command line.
struct StaticIdentity {
    token: String,
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<String, IdentityError> {
        Ok(self.token.clone())
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<String, IdentityError> {
        Ok(self.token.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = load_settings();

    let store = TokenStore::new(&settings.token_db_url)
        .await
        .context("failed to open the token store")?;
    let tokens = SessionTokens::new(store);
    tokens.load().await?;
    let service = Arc::new(HttpRemoteService::new(&settings.api_url, tokens.clone())?);

    match args.command {
        Command::Login { token } => {
            let manager = SessionManager::new(
                service,
                Arc::new(StaticIdentity { token }),
                tokens,
            );
            let user = manager.login("", "").await?;
            info!(user = %user.id, "session persisted");
            println!(
                "Logged in as {} {} <{}>",
                user.first_name, user.last_name, user.email
            );
        }
        Command::Drivers => {
            let company_id = require_company(&service, &tokens).await?;
            let screen = DriversScreen::new(service, company_id);
            screen.refresh().await?;
            let drivers = screen.drivers().await;
            info!(count = drivers.len(), "driver roster loaded");
            for driver in drivers {
                println!(
                    "{}  {} {}  {}  active={}",
                    driver.id, driver.first_name, driver.last_name, driver.phone, driver.is_active
                );
            }
        }
        Command::Orders { region } => {
            let screen = OrdersScreen::new(service, region.map(|r| r.as_str().into()));
            screen.refresh().await?;
            let orders = screen.orders().await;
            info!(count = orders.len(), "open orders loaded");
            for order in orders {
                let route = order
                    .meta
                    .first()
                    .map(|leg| leg.from.main_text.clone())
                    .unwrap_or_default();
                println!("{}  {:?}  {route}", order.id, order.status);
            }
        }
        Command::Upload { path } => {
            info!(path = %path.display(), "uploading");
            let uploader = MultipartUploader::new(service);
            let mut report = |pct: u8| println!("  {pct}%");
            let media = uploader.upload_file(&path, Some(&mut report)).await?;
            println!("Uploaded as media id {media}");
        }
    }

    Ok(())
}

async fn require_company(
    service: &Arc<HttpRemoteService>,
    tokens: &SessionTokens,
) -> Result<CompanyId> {
    let manager = SessionManager::new(
        Arc::clone(service) as Arc<dyn client_core::RemoteService>,
        Arc::new(client_core::MissingIdentityProvider),
        tokens.clone(),
    );
    let Some(user) = manager.reauthenticate().await? else {
        bail!("no valid session, run `console login` first");
    };
    match user.company_id {
        Some(company_id) => Ok(company_id),
        None => bail!("the signed-in user is not attached to a company"),
    }
}
