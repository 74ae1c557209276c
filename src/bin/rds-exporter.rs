use rds_exporter::cli::{actions, actions::Action, start};

#[tokio::main]
async fn main() {
    let action = match start() {
        Ok(action) => action,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    match action {
        Action::Run { .. } => {
            if let Err(err) = actions::run::handle(action).await {
                eprintln!("{err}");
                std::process::exit(err.exit_code());
            }
        }
    }
}
