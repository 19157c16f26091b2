use battle_client::use_cases::BattleOutcome;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let code = match battle_client::run_with_config().await {
        Ok(BattleOutcome::ChannelFailed { .. }) => 1,
        Ok(_) => 0,
        Err(e) => {
            tracing::error!(error = %e, "battle client failed");
            1
        }
    };
    // The stdin reader blocks runtime shutdown; exit without waiting for it.
    std::process::exit(code);
}
