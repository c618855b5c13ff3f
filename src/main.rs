use domain::rtc::RtcSdk;
use log::{error, info};
use service::{config::Config, logging::Logger};

fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
    }

    let Some(channel) = config.channel() else {
        error!("No channel given, set --channel or CHANNEL");
        std::process::exit(2);
    };

    if !config.has_token_credentials() {
        error!("App ID and App Certificate are required, set --app-id and --app-certificate");
        std::process::exit(2);
    }

    let sdk = match RtcSdk::new(&config) {
        Ok(sdk) => sdk,
        Err(e) => {
            error!("Failed to initialize RTC SDK: {e}");
            std::process::exit(1);
        }
    };

    info!(
        "Minting {} token for channel {} (uid {})",
        if config.publisher { "publisher" } else { "subscriber" },
        channel,
        config.uid
    );

    let user_token = match sdk.generate_user_token(
        channel,
        config.uid,
        config.publisher,
        config.token_expire_seconds,
    ) {
        Ok(user_token) => user_token,
        Err(e) => {
            error!("Failed to mint token: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&user_token) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!("Failed to serialize token: {e}");
            std::process::exit(1);
        }
    }
}
