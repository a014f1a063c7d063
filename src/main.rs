//! Revisor command-line client.
//!
//! Signs in against the review server, lists reviews, prints diffs with
//! their discussion threads and posts comments.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};

use revisor::application::{NavigationOutcome, ReviewInbox};
use revisor::domain::{Comment, DiffReply, Review};
use revisor::infra::app_config::{self, AppConfig};
use revisor::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "revisor")]
#[command(version)]
#[command(about = "Terminal client for the Revisor code review service", long_about = None)]
struct Args {
    /// API base URL, overriding the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and remember the session token
    Login {
        username: String,
        /// Read from the terminal when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Register a new account
    Signup {
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Change the password of the signed-in user
    Passwd {
        #[arg(long)]
        old: Option<String>,
        #[arg(long)]
        new: Option<String>,
    },

    /// List reviews
    Reviews {
        #[arg(value_enum, default_value = "outgoing")]
        inbox: InboxArg,
    },

    /// Print a review's diff together with its comments
    Show {
        id: String,
        /// First revision to compare (1-based)
        #[arg(long, requires = "to")]
        from: Option<u32>,
        /// Last revision to compare (1-based)
        #[arg(long, requires = "from")]
        to: Option<u32>,
    },

    /// Comment on a diff line, or reply to a comment
    Comment {
        review: String,
        line: String,
        text: String,
        #[arg(long)]
        reply_to: Option<String>,
    },

    /// Accept a review
    Accept { id: String },

    /// Decline a review
    Decline { id: String },

    /// Resolve a named route through the navigation guard
    Route { name: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InboxArg {
    Incoming,
    Outgoing,
}

impl From<InboxArg> for ReviewInbox {
    fn from(arg: InboxArg) -> Self {
        match arg {
            InboxArg::Incoming => ReviewInbox::Incoming,
            InboxArg::Outgoing => ReviewInbox::Outgoing,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = load_config()?;
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }

    let state = AppState::new(config).context("Failed to initialise client")?;
    run(&state, args.command).await
}

fn load_config() -> Result<AppConfig> {
    app_config::load_config().with_context(|| {
        format!(
            "Failed to load config from {}",
            app_config::config_path().display()
        )
    })
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    let session = &state.session;
    match command {
        Commands::Login { username, password } => {
            let password = secret(password, "Password")?;
            session.login(&username, &password).await?;
            let me = session.current_identity()?;
            println!("Signed in as {} ({})", me.username, me.full_name());
        }
        Commands::Logout => {
            session.await_ready().await;
            session.logout();
            println!("Signed out");
        }
        Commands::Whoami => {
            session.await_ready().await;
            match session.current_identity() {
                Ok(me) => println!("{} ({})", me.username, me.full_name()),
                Err(_) => println!("Not signed in"),
            }
        }
        Commands::Signup {
            username,
            first_name,
            last_name,
            password,
        } => {
            let password = secret(password, "Password")?;
            session
                .sign_up(&first_name, &last_name, &username, &password)
                .await?;
            println!("Account {username} created, sign in with `revisor login {username}`");
        }
        Commands::Passwd { old, new } => {
            let old = secret(old, "Current password")?;
            let new = secret(new, "New password")?;
            session.change_password(&old, &new).await?;
            println!("Password changed");
        }
        Commands::Reviews { inbox } => {
            require_session(state).await?;
            let reviews = state.reviews.load_reviews(inbox.into()).await?;
            if reviews.is_empty() {
                println!("No reviews");
            }
            for review in &reviews {
                println!("{}", review_row(review));
            }
        }
        Commands::Show { id, from, to } => {
            require_session(state).await?;
            let revisions = from.zip(to);
            let reply = state
                .reviews
                .load_diff(&id, revisions)
                .await
                .with_context(|| format!("Failed to load review {id}"))?;
            print_review(&reply);
        }
        Commands::Comment {
            review,
            line,
            text,
            reply_to,
        } => {
            require_session(state).await?;
            state
                .reviews
                .add_comment(&review, &line, &text, reply_to.as_deref())
                .await?;
            println!("Comment posted");
        }
        Commands::Accept { id } => {
            require_session(state).await?;
            state.reviews.accept_review(&id).await?;
            println!("Review {id} accepted");
        }
        Commands::Decline { id } => {
            require_session(state).await?;
            state.reviews.decline_review(&id).await?;
            println!("Review {id} declined");
        }
        Commands::Route { name } => match state.router.push(&name).await? {
            NavigationOutcome::Arrived(route) => {
                let path = route.leaf().map(|leaf| leaf.path.as_str()).unwrap_or("");
                println!("{} {}", route.name, path);
            }
            NavigationOutcome::Aborted => println!("Navigation aborted"),
        },
    }
    Ok(())
}

async fn require_session(state: &AppState) -> Result<()> {
    state.session.await_ready().await;
    if !state.session.is_authenticated() {
        bail!("Not signed in, run `revisor login <username>` first");
    }
    Ok(())
}

/// Returns `value` or reads one line from the terminal.
fn secret(value: Option<String>, prompt: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    eprint!("{prompt}: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.is_empty() {
        bail!("{prompt} must not be empty");
    }
    Ok(line)
}

fn review_row(review: &Review) -> String {
    let status = match (review.closed, review.accepted) {
        (false, _) => "open",
        (true, true) => "accepted",
        (true, false) => "declined",
    };
    format!(
        "{:>6}  {:<9} {:<40} {:<16} rev {:<3} {} comments  {}",
        review.id,
        status,
        review.name,
        review.owner.username,
        review.revisions_count,
        review.comments_count,
        review.updated.format("%Y-%m-%d %H:%M"),
    )
}

fn print_review(reply: &DiffReply) {
    let info = &reply.info;
    println!("{} by {}", info.name, info.owner.full_name());
    println!(
        "{} (+{} -{})",
        reply.diff.name,
        reply.diff.additions(),
        reply.diff.deletions()
    );
    print!("{}", reply.diff);

    let threads = reply.comments.by_line();
    if threads.is_empty() {
        return;
    }
    println!();
    for (line_id, roots) in threads {
        let context = reply
            .diff
            .find_line(line_id)
            .and_then(|line| line.new_side().or(line.old()))
            .map(|line| line.content.trim_end().to_string())
            .unwrap_or_default();
        println!("line {line_id}: {context}");
        for root in roots {
            print_thread(root);
        }
    }
}

fn print_thread(root: &Comment) {
    let mut stack = vec![(root, 1usize)];
    while let Some((comment, depth)) = stack.pop() {
        println!(
            "{}[{}] {} {}: {}",
            "  ".repeat(depth),
            comment.id,
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.author.username,
            comment.text
        );
        stack.extend(comment.children.iter().rev().map(|child| (child, depth + 1)));
    }
}
