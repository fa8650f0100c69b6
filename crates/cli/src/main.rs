//! homebrew-releaser binary.

use homebrew_releaser::cli::{
    self, EXIT_FAILURE, exit_code_for, render_error, render_report,
};
use homebrew_releaser::tracing::{TracingConfig, init_tracing};

fn main() {
    #[allow(clippy::print_stderr)]
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    let json_mode = cli.json_mode();

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        ..Default::default()
    };
    if let Err(err) = init_tracing(tracing_config) {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("{err:?}");
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "Failed to start async runtime");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let result = runtime.block_on(cli::execute(&cli));
    let code = exit_code_for(&result);
    match result {
        Ok(report) => render_report(&report, json_mode),
        Err(err) => render_error(err, json_mode),
    }

    std::process::exit(code);
}
