use bankops::api::ApiError;
use bankops::cli;
use bankops::core::terminal;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_main().await {
        let err_msg = e.to_string();
        if err_msg.contains("canceled") || err_msg.contains("OperationCanceled") {
            println!();
            return;
        }
        terminal::print_error(&err_msg);
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_auth) {
            terminal::print_info("Run `bankops login` to store a fresh token.");
        }
        std::process::exit(1);
    }
}
