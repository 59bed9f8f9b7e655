#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match clipstack_core::runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("[clipstack-core] {error}");
            std::process::exit(2);
        }
    };

    if let Err(error) = clipstack_core::runtime::run_with_options(options).await {
        eprintln!("[clipstack-core] runtime failed: {error}");
        std::process::exit(1);
    }
}
