use campus_hub::blob::Upload;
use campus_hub::models::{NewPost, PostCategory};
use campus_hub::{CampusHub, Session};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{non_empty, print_list, print_one, truncate, CommandResult, OutputFormat};

#[derive(Args)]
pub struct PostCommand {
    #[command(subcommand)]
    pub command: PostSubcommand,
}

#[derive(Subcommand)]
pub enum PostSubcommand {
    /// Publish a post
    Create {
        /// Post text
        content: String,

        /// Category (general, academic, events, clubs, sports, placements, other)
        #[arg(long, default_value = "general")]
        category: PostCategory,

        /// Attach an image
        #[arg(long)]
        image: Option<PathBuf>,

        /// Hide the like count from readers
        #[arg(long)]
        hide_likes: bool,
    },

    /// Show the feed
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Only posts by this user ID
        #[arg(long)]
        author: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a post with its comments
    Show {
        /// Post ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Like a post
    Like {
        /// Post ID
        id: String,
    },

    /// Remove your like
    Unlike {
        /// Post ID
        id: String,
    },

    /// Comment on a post
    Comment {
        /// Post ID
        id: String,

        /// Comment text
        content: String,
    },

    /// Delete one of your comments
    DeleteComment {
        /// Comment ID
        id: String,
    },

    /// Delete one of your posts and its comments
    Delete {
        /// Post ID
        id: String,
    },

    /// Recompute a post's like and comment counters
    Repair {
        /// Post ID
        id: String,
    },
}

impl PostCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            PostSubcommand::Create {
                content,
                category,
                image,
                hide_likes,
            } => {
                let mut new = NewPost::new(non_empty(content, "Post content")?);
                new.category = *category;
                new.hide_likes = *hide_likes;

                let upload = match image {
                    Some(path) => Some(Upload::from_path(path).await?),
                    None => None,
                };
                let post = hub.posts.create(session, new, upload.as_ref()).await?;
                println!("Created post {}", post.id);
                Ok(())
            }

            PostSubcommand::List {
                category,
                author,
                format,
            } => {
                let posts = match author {
                    Some(author) => hub.posts.list_by_author(author).await?,
                    None => hub.posts.list(category.as_deref()).await?,
                };
                print_list(&posts, format, "post(s)", |p| {
                    format!(
                        "{:<36}  {:<16}  {:>4}  {:>4}  {}",
                        p.id,
                        truncate(&p.author_name, 16),
                        if p.hide_likes { "-".to_string() } else { p.like_count.to_string() },
                        p.comment_count,
                        truncate(&p.content, 40)
                    )
                })
            }

            PostSubcommand::Show { id, format } => {
                let post = hub
                    .posts
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Post not found: {}", id))?;
                let comments = hub.posts.comments(id).await?;

                match format {
                    OutputFormat::Json => {
                        let value = serde_json::json!({ "post": post, "comments": comments });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => {
                        print_one(&post, format)?;
                        for comment in &comments {
                            println!("  {}", comment);
                        }
                    }
                }
                Ok(())
            }

            PostSubcommand::Like { id } => {
                let post = hub.posts.like(session, id).await?;
                println!("Liked ({} like(s))", post.like_count);
                Ok(())
            }

            PostSubcommand::Unlike { id } => {
                let post = hub.posts.unlike(session, id).await?;
                println!("Unliked ({} like(s))", post.like_count);
                Ok(())
            }

            PostSubcommand::Comment { id, content } => {
                let comment = hub
                    .posts
                    .add_comment(session, id, non_empty(content, "Comment")?)
                    .await?;
                println!("Added comment {}", comment.id);
                Ok(())
            }

            PostSubcommand::DeleteComment { id } => {
                hub.posts.delete_comment(session, id).await?;
                println!("Deleted comment {}", id);
                Ok(())
            }

            PostSubcommand::Delete { id } => {
                hub.posts.delete(session, id).await?;
                println!("Deleted post {}", id);
                Ok(())
            }

            PostSubcommand::Repair { id } => {
                let post = hub.posts.repair_counters(id).await?;
                println!(
                    "{} like(s), {} comment(s)",
                    post.like_count, post.comment_count
                );
                Ok(())
            }
        }
    }
}
