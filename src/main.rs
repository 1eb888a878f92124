/*!
Here we go!

```text
roster [ CONFIG_FILE ]
```

With no config file, everything is left at its default (see `config::Cfg`).
*/
use std::sync::Arc;

use simplelog::{ColorChoice, TerminalMode, TermLogger};

use roster::config::{self, Cfg};
use roster::inter;

fn die(msg: &str) -> ! {
    log::error!("{}", msg);
    eprintln!("{}", msg);
    std::process::exit(1);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("roster")
        .build();
    if let Err(e) = TermLogger::init(
        roster::log_level_from_env(),
        log_cfg,
        TerminalMode::Stdout,
        ColorChoice::Auto
    ) {
        eprintln!("Unable to start logging: {}", &e);
    }
    log::info!("Logging started.");

    let cfg = match std::env::args().nth(1) {
        Some(path) => match Cfg::from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => die(&format!("Error loading configuration from {:?}: {}", &path, &e)),
        },
        None => {
            log::info!("No config file specified; using defaults.");
            Cfg::default()
        },
    };
    log::info!("Configuration:\n{:#?}", &cfg);

    if let Err(e) = inter::init(&cfg.template_dir) {
        die(&format!("Error initializing templates: {}", &e));
    }

    let glob = match config::load_configuration(&cfg).await {
        Ok(glob) => Arc::new(glob),
        Err(e) => die(&format!("Error loading configuration: {}", &e)),
    };

    let app = inter::router(glob, &cfg.static_dir);

    log::info!("Listening on {}", &cfg.addr);
    let server = match axum::Server::try_bind(&cfg.addr) {
        Ok(builder) => builder.serve(app.into_make_service()),
        Err(e) => die(&format!("Unable to bind to {}: {}", &cfg.addr, &e)),
    };

    if let Err(e) = server.await {
        die(&format!("Server error: {}", &e));
    }
}
