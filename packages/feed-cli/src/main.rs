// Terminal client for the alumni feed

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use feed_engine::alumni_api::{Post, PostDraft, PostId, PostStatus, PostTag, PostType, UserId};
use feed_engine::{
    CurrentUser, FeedConfig, FeedContext, FeedController, FeedItem, FeedSnapshot, FilterCriteria,
    LoadOutcome, Role,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "feed", about = "Browse and moderate the alumni feed")]
struct Cli {
    /// Id of the signed-in user
    #[arg(long, default_value = "me", global = true)]
    user: String,

    #[arg(long, value_enum, default_value_t = RoleArg::Alumnus, global = true)]
    role: RoleArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the feed, optionally following background refreshes
    Tail {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "type", value_enum)]
        types: Vec<TypeArg>,
        #[arg(long = "tag", value_enum)]
        tags: Vec<TagArg>,
        #[arg(long = "company")]
        companies: Vec<String>,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Keep running and print each refreshed snapshot
        #[arg(long)]
        follow: bool,
    },
    /// Toggle the like on a post
    Like { id: String },
    /// Comment on a post
    Comment { id: String, text: String },
    /// Publish a text post
    Post {
        text: String,
        #[arg(long, value_enum)]
        tag: Option<TagArg>,
    },
    /// Delete one of your posts
    Delete { id: String },
    /// Moderation listing and actions
    Moderate {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[command(subcommand)]
        action: Option<ModerateAction>,
    },
}

#[derive(Subcommand)]
enum ModerateAction {
    Pin { id: String },
    Hide { id: String },
    Restore { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Alumnus,
    Moderator,
    Admin,
}

#[derive(Clone, Copy, ValueEnum)]
enum TypeArg {
    Text,
    Image,
    Video,
    Job,
    Announcement,
}

#[derive(Clone, Copy, ValueEnum)]
enum TagArg {
    SuccessStory,
    CareerMilestone,
    Achievement,
    LearningJourney,
    Volunteering,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Active,
    Hidden,
    Deleted,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Alumnus => Role::Alumnus,
            RoleArg::Moderator => Role::Moderator,
            RoleArg::Admin => Role::Admin,
        }
    }
}

impl From<TypeArg> for PostType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Text => PostType::Text,
            TypeArg::Image => PostType::Image,
            TypeArg::Video => PostType::Video,
            TypeArg::Job => PostType::Job,
            TypeArg::Announcement => PostType::Announcement,
        }
    }
}

impl From<TagArg> for PostTag {
    fn from(arg: TagArg) -> Self {
        match arg {
            TagArg::SuccessStory => PostTag::SuccessStory,
            TagArg::CareerMilestone => PostTag::CareerMilestone,
            TagArg::Achievement => PostTag::Achievement,
            TagArg::LearningJourney => PostTag::LearningJourney,
            TagArg::Volunteering => PostTag::Volunteering,
        }
    }
}

impl From<StatusArg> for PostStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => PostStatus::Active,
            StatusArg::Hidden => PostStatus::Hidden,
            StatusArg::Deleted => PostStatus::Deleted,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,feed_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = FeedConfig::from_env().context("Failed to load configuration")?;
    let api = Arc::new(config.api_client()?);

    let mut user = CurrentUser {
        id: UserId::new(cli.user),
        role: cli.role.into(),
        university_id: None,
    };
    if let Some(university_id) = config.university_id.clone() {
        user = user.with_university(university_id);
    }

    match cli.command {
        Command::Tail {
            search,
            types,
            tags,
            companies,
            pages,
            follow,
        } => {
            let mut criteria = FilterCriteria::all()
                .with_types(types.into_iter().map(PostType::from))
                .with_tags(tags.into_iter().map(PostTag::from));
            for company in companies {
                criteria = criteria.with_company(company);
            }
            if let Some(search) = search {
                criteria = criteria.with_search(search);
            }

            let feed = FeedController::new(api, FeedContext::public(user), config.settings);
            feed.load_ads().await?;
            feed.load_first_page(criteria).await?;
            for _ in 1..pages {
                if feed.load_next_page().await? == LoadOutcome::Skipped {
                    break;
                }
            }
            print_snapshot(&feed.snapshot());

            if follow {
                follow_feed(&feed).await?;
            }
            feed.shutdown().await;
        }
        Command::Like { id } => {
            let feed = feed_containing(api, FeedContext::public(user), config, &id).await?;
            feed.toggle_like(&PostId::new(&id)).await?;
            if let Some(post) = feed.snapshot().post(&PostId::new(&id)) {
                print_post(post);
            }
        }
        Command::Comment { id, text } => {
            let feed = feed_containing(api, FeedContext::public(user), config, &id).await?;
            feed.add_comment(&PostId::new(&id), text).await?;
            println!("{} Comment added", "✓".green());
        }
        Command::Post { text, tag } => {
            let mut draft = PostDraft::text(text);
            if let Some(tag) = tag {
                draft = draft.with_tag(tag.into());
            }
            let feed = FeedController::new(api, FeedContext::public(user), config.settings);
            let post = feed.create_post(draft).await?;
            println!("{} Published post {}", "✓".green(), post.id.to_string().bold());
        }
        Command::Delete { id } => {
            let feed = feed_containing(api, FeedContext::public(user), config, &id).await?;
            feed.delete_post(&PostId::new(&id)).await?;
            println!("{} Deleted post {}", "✓".green(), id.bold());
        }
        Command::Moderate { status, action } => {
            let context = FeedContext::moderation(user, status.map(PostStatus::from));
            match action {
                None => {
                    let feed = FeedController::new(api, context, config.settings);
                    feed.load_first_page(FilterCriteria::all()).await?;
                    print_snapshot(&feed.snapshot());
                }
                Some(ModerateAction::Pin { id }) => {
                    let feed = feed_containing(api, context, config, &id).await?;
                    feed.toggle_pin(&PostId::new(&id)).await?;
                    println!("{} Toggled pin on {}", "✓".green(), id.bold());
                }
                Some(ModerateAction::Hide { id }) => {
                    let feed = feed_containing(api, context, config, &id).await?;
                    feed.hide_post(&PostId::new(&id)).await?;
                    println!("{} Hid {}", "✓".green(), id.bold());
                }
                Some(ModerateAction::Restore { id }) => {
                    let feed = feed_containing(api, context, config, &id).await?;
                    feed.restore_post(&PostId::new(&id)).await?;
                    println!("{} Restored {}", "✓".green(), id.bold());
                }
            }
        }
    }

    Ok(())
}

/// Page through the feed until the post is loaded, so actions can find it.
async fn feed_containing(
    api: Arc<feed_engine::alumni_api::AlumniApiClient>,
    context: FeedContext,
    config: FeedConfig,
    id: &str,
) -> Result<FeedController> {
    let feed = FeedController::new(api, context, config.settings);
    let id = PostId::new(id);

    feed.load_first_page(FilterCriteria::all()).await?;
    while feed.snapshot().post(&id).is_none() {
        if feed.load_next_page().await? == LoadOutcome::Skipped {
            anyhow::bail!("Post {} is not in the feed", id);
        }
    }
    Ok(feed)
}

async fn follow_feed(feed: &FeedController) -> Result<()> {
    feed.start().await;
    let mut snapshots = feed.subscribe();
    let mut last_generation = feed.snapshot().generation;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.generation != last_generation && !snapshot.is_loading {
                    last_generation = snapshot.generation;
                    println!();
                    println!("{}", "── refreshed ──".dimmed());
                    print_snapshot(&snapshot);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &FeedSnapshot) {
    if let Some(error) = &snapshot.error {
        let hint = if error.retryable { " (retry later)" } else { "" };
        println!("{} {}{}", "!".red().bold(), error.message, hint);
    }
    if snapshot.is_empty_result() {
        println!("{}", "No posts match these filters.".dimmed());
        return;
    }

    for item in &snapshot.items {
        match item {
            FeedItem::Post(post) => print_post(post),
            FeedItem::Ad(ad) => {
                println!(
                    "{} {} {}",
                    "Sponsored".yellow().bold(),
                    ad.title.bold(),
                    ad.link.dimmed()
                );
                println!();
            }
        }
    }

    let more = if snapshot.has_more { ", more available" } else { "" };
    println!(
        "{}",
        format!(
            "{} of {} posts, page {}{}",
            snapshot.posts.len(),
            snapshot.total,
            snapshot.cursor,
            more
        )
        .dimmed()
    );
}

fn print_post(post: &Post) {
    let author = post.author_name.as_deref().unwrap_or(post.author_id.as_str());
    let mut header = format!("{} {}", post.id.to_string().dimmed(), author.bold());
    if let Some(company) = post.company() {
        header.push_str(&format!(" @ {}", company));
    }
    header.push_str(&format!(" · {}", post.post_type.label().cyan()));
    if let Some(tag) = post.tag {
        header.push_str(&format!(" · {}", tag.label().magenta()));
    }
    if post.is_pinned {
        header.push_str(&format!(" {}", "pinned".yellow()));
    }
    if post.status != PostStatus::Active {
        header.push_str(&format!(" [{}]", post.status.as_str().red()));
    }
    println!("{}", header);

    if let Some(job) = post.job() {
        let location = job.location.as_deref().unwrap_or("remote");
        println!("  {} at {} ({})", job.title.bold(), job.company, location);
    }
    println!("  {}", post.content);

    let heart = if post.liked_by_current_user {
        "♥".red()
    } else {
        "♡".normal()
    };
    println!(
        "  {} {}  💬 {}  {}",
        heart,
        post.like_count,
        post.comment_count,
        post.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
    println!();
}
