use comment_channel::{ClientConfig, CommentClient, JoinOutcome, MemoryPage};
use env_logger::Env;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> comment_channel::Result<()> {
    let config = ClientConfig::from_env()?;
    let page = MemoryPage::for_config(&config);
    let form = config.form_selector.clone();
    let input = config.input_selector.clone();
    let container = config.container_selector.clone();

    let mut client = CommentClient::new(config, page)?;
    match client.start().await? {
        JoinOutcome::Joined(comments) => {
            info!("Rendered {} comments", comments.len());
            println!("{}", client.page().inner_html(&container).unwrap_or_default());
        }
        JoinOutcome::Rejected(reason) => {
            warn!("Join rejected: {}", reason);
            return Ok(());
        }
        JoinOutcome::Skipped => {
            warn!("CHANNEL_TOPIC_ID is not set, nothing to join");
            return Ok(());
        }
    }

    // Each line typed on stdin is submitted through the comment form
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        client.page().set_field(&form, &input, line)?;
        client.submit_form()?;
    }

    client.socket().disconnect().await;
    Ok(())
}
