use clap::Parser;
use sheets::{ApiError, SheetClient};
use tokio::sync::RwLock;

pub mod alert;
pub mod cache;
pub mod format;
pub mod models;
pub mod period;

pub use cache::SessionCache;

pub struct AppState {
    pub sheets: SheetClient,
    pub config: Config,
    pub cache: RwLock<SessionCache>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let sheets = SheetClient::new(&config.api_url, &config.sheet_id, config.proxy_url.as_deref())?;

        Ok(Self {
            sheets,
            config,
            cache: RwLock::new(SessionCache::default()),
        })
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Web app endpoint in front of the spreadsheet
    #[arg(long, env = "SHEET_API_URL")]
    pub api_url: String,

    #[arg(long, env = "SHEET_ID")]
    pub sheet_id: String,

    /// Optional CORS proxy; the target URL is passed as its `url` parameter
    #[arg(long, env = "SHEET_PROXY_URL")]
    pub proxy_url: Option<String>,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "CURRENCY_SYMBOL", default_value = "đ")]
    pub currency_symbol: String,
}
