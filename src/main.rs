use anyhow::{Context, Result};
use blog_admin::api::{Credentials, DEFAULT_LIST_LIMIT};
use blog_admin::app::{read_files, unique_file_names, App, ArticleEdit};
use blog_admin::models::Config;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "blog-admin")]
#[command(about = "Manage blog articles and upload their images")]
struct CliArgs {
    #[command(flatten)]
    overrides: ImageOverrides,

    #[command(subcommand)]
    command: Command,
}

/// Image settings that take precedence over the environment.
#[derive(Debug, Args)]
struct ImageOverrides {
    /// Override the maximum output width.
    #[arg(long, global = true)]
    max_width: Option<u32>,

    /// Override the maximum output height.
    #[arg(long, global = true)]
    max_height: Option<u32>,

    /// Override the encoder quality, in (0, 1].
    #[arg(long, global = true)]
    quality: Option<f32>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Save admin credentials after checking them against the API.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "BLOG_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget saved credentials.
    Logout,
    /// Compress images locally and write the results to a directory.
    Compress {
        #[arg(long, short, default_value = "compressed")]
        out_dir: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Compress and upload images for an article topic.
    Upload {
        #[arg(long)]
        topic: String,
        /// Create the article once the images are uploaded.
        #[arg(long)]
        create: bool,
        #[arg(long)]
        context_url: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List articles.
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Show one article with its content.
    Show { id: String },
    /// Update fields of an article.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Read the new content from this file.
        #[arg(long)]
        content_file: Option<PathBuf>,
        /// Replace the tags (comma-separated ids).
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Publish an article.
    Publish { id: String },
    /// Unpublish an article.
    Unpublish { id: String },
    /// Flip the published state of an article.
    TogglePublish { id: String },
    /// Delete an article.
    Delete { id: String },
}

fn load_config(args: &ImageOverrides) -> blog_admin::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(max_width) = args.max_width {
        config.compress.max_width = max_width;
    }
    if let Some(max_height) = args.max_height {
        config.compress.max_height = max_height;
    }
    if let Some(quality) = args.quality {
        config.compress.quality = quality;
    }
    config.compress.validate()?;
    Ok(config)
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            app.login(Credentials::new(username, password)).await?;
        }
        Command::Logout => app.logout()?,
        Command::Compress { out_dir, files } => {
            let outputs = app.compress_files(&files).await?;
            tokio::fs::create_dir_all(&out_dir).await?;
            for (output, name) in outputs.iter().zip(unique_file_names(&outputs)) {
                let target = out_dir.join(name);
                tokio::fs::write(&target, output.data())
                    .await
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                println!(
                    "{} ({} bytes{})",
                    target.display(),
                    output.size(),
                    if output.is_original() { ", unchanged" } else { "" }
                );
            }
        }
        Command::Upload {
            topic,
            create,
            context_url,
            files,
        } => {
            let files = read_files(&files).await?;
            let mut form = app.upload_form();
            for image in form.submit(&topic, &files).await? {
                println!("{} -> {}", image.original_name, image.filename);
            }
            if create {
                let article = form.create_article(&topic, context_url).await?;
                println!("Created article {} ({})", article.id, article.slug);
            }
        }
        Command::List { limit } => {
            for article in app.api().list_articles(limit).await? {
                println!(
                    "{}\t{:?}\t{}\t{}",
                    article.id,
                    article.status,
                    if article.is_published { "published" } else { "draft" },
                    article.title
                );
            }
        }
        Command::Show { id } => {
            let detail = app.api().get_article(&id).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        Command::Edit {
            id,
            title,
            description,
            content_file,
            tags,
        } => {
            let content = match content_file {
                Some(path) => Some(read_content(&path).await?),
                None => None,
            };
            let article = app
                .edit_article(
                    &id,
                    ArticleEdit {
                        title,
                        description,
                        content,
                        tag_ids: tags,
                    },
                )
                .await?;
            println!("Updated article {}", article.id);
        }
        Command::Publish { id } => {
            app.api().publish_article(&id, true).await?;
            println!("Published {}", id);
        }
        Command::Unpublish { id } => {
            app.api().publish_article(&id, false).await?;
            println!("Unpublished {}", id);
        }
        Command::TogglePublish { id } => {
            let response = app.toggle_publish(&id).await?;
            println!("{} is_published={}", id, response.is_published);
        }
        Command::Delete { id } => {
            app.api().delete_article(&id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

async fn read_content(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_admin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let CliArgs { overrides, command } = CliArgs::parse();

    let app = match load_config(&overrides).and_then(|config| App::new(&config)) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match run(&app, command).await {
        Ok(()) => {
            info!("Done");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
