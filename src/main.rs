use std::sync::Arc;

use tower_http::cors::CorsLayer;

use kisaan_saathi::backend::{
    AgronomyAdvisor, FarmBackend, FarmServices, GoogleTranslate, RestClient,
};
use kisaan_saathi::config::AppConfig;
use kisaan_saathi::error::Result;
use kisaan_saathi::intake::{FlowController, SessionContext};
use kisaan_saathi::llm::create_providers;
use kisaan_saathi::shell::{Repl, intake_routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export GROQ_API_KEY=gsk_...");
            return Err(e.into());
        }
    };

    eprintln!("🌾 Kisaan Saathi v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Farmer: {} ({})", config.farmer_name, config.farmer_id);
    eprintln!("   Backend: {}", config.backend.backend_url);
    eprintln!("   AI API: {}", config.backend.api_url);
    eprintln!(
        "   Models: {} / {} (vision)",
        config.llm.yield_model, config.llm.vision_model
    );
    eprintln!(
        "   Translation: {}",
        if config.translate_enabled { "Hindi <-> English" } else { "off" }
    );

    // ── Services ────────────────────────────────────────────────────────
    let providers = create_providers(&config.llm)?;
    let advisor = AgronomyAdvisor::new(providers.text, providers.vision);
    let rest = RestClient::new(config.backend.clone());
    let backend: Arc<dyn FarmBackend> = Arc::new(FarmServices::new(rest, advisor));

    let context = SessionContext::new(config.farmer_id.clone(), config.farmer_name.clone())
        .with_farm_acres(config.farm_acres);
    let mut controller = FlowController::new(backend, context);
    if config.translate_enabled {
        controller =
            controller.with_translator(Arc::new(GoogleTranslate::new(config.translate_url.clone())));
    }
    let controller = Arc::new(controller);

    // ── HTTP ────────────────────────────────────────────────────────────
    if config.http_enabled {
        let app = intake_routes(Arc::clone(&controller)).layer(CorsLayer::permissive());
        let listener =
            tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port)).await?;
        eprintln!(
            "   Intake API: http://0.0.0.0:{}/api/intake/turn",
            config.http_port
        );
        tokio::spawn(async move {
            tracing::info!("Intake HTTP server started");
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Intake HTTP server stopped");
            }
        });
    } else {
        eprintln!("   Intake API: disabled");
    }

    eprintln!("   Type a message and press Enter. /help for commands, /quit to exit.\n");

    // ── REPL ────────────────────────────────────────────────────────────
    let mut repl = Repl::new(controller);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    repl.run(stdin, tokio::io::stdout()).await?;

    Ok(())
}
