//! `doctor` command — report configuration and collaborator status.

use graphtutor_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    println!("GraphTutor doctor");
    println!("-----------------");
    println!(
        "API key:       {}",
        if config.has_api_key() {
            "configured"
        } else {
            "MISSING (set DEEPSEEK_API_KEY)"
        }
    );
    println!("API base:      {}", config.api_base);
    println!("Model:         {}", config.model);
    println!(
        "Retrieval:     {}",
        if config.retrieval_enabled {
            "in-memory demo store"
        } else {
            "disabled (degraded fallback context)"
        }
    );
    println!("Context top-k: {}", config.top_k);
    println!(
        "Gateway:       {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("CORS origin:   {}", config.gateway.frontend_origin);

    Ok(())
}
