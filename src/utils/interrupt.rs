use super::wait::CancelToken;

/// Route Ctrl-C into a cancellation token.
///
/// The first interrupt cancels the token so the running command can finish
/// its exit sequence. A second interrupt terminates the process.
pub(crate) fn install_interrupt_handler() -> Result<CancelToken, ctrlc::Error> {
    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            eprintln!("Interrupted again, exiting");
            std::process::exit(130);
        }
        tracing::debug!("interrupt received");
        handler_token.cancel();
    })?;
    Ok(token)
}
