use std::process::ExitCode;

use bookstore::{config::RunnerConfig, mongodb::MongoDbBookstore, report::Report, runner::Runner};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RunnerConfig::from_env();
    let builder = MongoDbBookstore::builder(&config.uri, &config.database);
    let mut report = Report::stdout();

    match Runner::new(builder, config).run(&mut report).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("bookstore run failed: {err}");
            ExitCode::FAILURE
        }
    }
}
