//! `qa-agent` binary

#[tokio::main]
async fn main() {
    let matches = qa_agent::command().get_matches();
    qa_agent::logging::init(matches.get_flag("log-json"), matches.get_flag("verbose"));

    let code = match qa_agent::dispatch(&matches).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "qa-agent failed");
            eprintln!("error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}
