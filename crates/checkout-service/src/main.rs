//! Command line entry point for the checkout handoff pipeline.
//!
//! Three commands cover what a theme developer needs while wiring a store to
//! an order-processing endpoint:
//!
//! - `preview` prints the payload a cart file assembles to,
//! - `handoff` reads a live store's cart and posts it to the endpoint,
//! - `simulate` clicks checkout on an in-memory cart page and reports the
//!   outcome the shopper would see.

use checkout_config::Config;
use checkout_delivery::FixedCartSource;
use checkout_order::PageContext;
use checkout_page::{MemoryPage, PageInterface};
use checkout_service::{build_http_collaborators, preview, run_handoff, simulate};
use checkout_types::Customer;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Command-line arguments for the checkout tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to a TOML configuration file
	#[arg(short, long, conflicts_with = "host_config")]
	config: Option<PathBuf>,

	/// Host page configuration object, e.g. '{"apiUrl":"https://...","enabled":true}'
	#[arg(long, env = "CHECKOUT_HOST_CONFIG")]
	host_config: Option<String>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the order payload assembled from a cart file
	Preview {
		/// Cart JSON as returned by the storefront's /cart.js
		#[arg(long)]
		cart: PathBuf,
		#[command(flatten)]
		page: PageArgs,
	},
	/// Fetch a store's cart and hand it to the order endpoint
	Handoff {
		#[command(flatten)]
		page: PageArgs,
	},
	/// Click checkout on a simulated cart page
	Simulate {
		/// Cart JSON served to the simulated page
		#[arg(long)]
		cart: PathBuf,
		#[command(flatten)]
		page: PageArgs,
	},
}

/// Page the command acts on behalf of.
#[derive(ClapArgs, Debug)]
struct PageArgs {
	/// Cart page URL of the store
	#[arg(long, default_value = "https://shop.example/cart")]
	shop: Url,

	/// Email of the signed-in customer
	#[arg(long)]
	customer_email: Option<String>,

	/// Id of the signed-in customer
	#[arg(long)]
	customer_id: Option<u64>,
}

impl PageArgs {
	fn customer(&self) -> Option<Customer> {
		if self.customer_email.is_none() && self.customer_id.is_none() {
			return None;
		}
		Some(Customer {
			email: self.customer_email.clone(),
			id: self.customer_id,
		})
	}

	fn context(&self, config: &Config) -> PageContext {
		let page: Arc<dyn PageInterface> =
			Arc::new(MemoryPage::new().with_location(self.shop.clone()));
		let context = PageContext::new(page, config.page.shop_domain.clone());
		match self.customer() {
			Some(customer) => context.with_customer(customer),
			None => context,
		}
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = load_config(&args).await?;
	tracing::info!(
		api_url = %config.checkout.api_url,
		enabled = config.checkout.enabled,
		"Loaded configuration"
	);

	match args.command {
		Command::Preview { cart, page } => {
			let source = FixedCartSource::from_file(&cart).await?;
			println!("{}", preview(&source, &page.context(&config)).await?);
		},
		Command::Handoff { page } => {
			let (cart, handoff) = build_http_collaborators(&config, &page.shop)?;
			let context = page.context(&config);
			match run_handoff(cart.as_ref(), handoff.as_ref(), &context).await {
				Ok(target) => println!("{target}"),
				Err(e) => {
					tracing::error!(error = %e, "Handoff failed");
					println!("{}", e.user_message());
				},
			}
		},
		Command::Simulate { cart, page } => {
			let (_, handoff) = build_http_collaborators(&config, &page.shop)?;
			let source = Arc::new(FixedCartSource::from_file(&cart).await?);
			let customer = page.customer();
			let report = simulate(config, page.shop, source, handoff, customer).await?;
			println!("{report}");
		},
	}

	Ok(())
}

/// Loads configuration from `--config`, `--host-config` or the defaults.
async fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
	let config = match (&args.config, &args.host_config) {
		(Some(path), _) => Config::from_file(path).await?,
		(None, Some(json)) => Config::from_host_json(json)?,
		(None, None) => Config::default(),
	};
	Ok(config)
}
