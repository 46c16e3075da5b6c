//! Gallery Feed command line client
//!
//! Browses the Unsplash photo listing, downloads thumbnails through the
//! shared image cache and manages the favorites file.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gallery_feed::config::{
    default_favorites_path, DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENT_DOWNLOADS,
};
use gallery_feed::detail::format_date;
use gallery_feed::{
    favorite_photos, DetailNavigator, FavoriteSet, FeedController, FeedEvent, GalleryConfig,
    ImageCache, ImageLoader, ImageSlot, SlotContent, UnsplashClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Browse Unsplash photos from the terminal
#[derive(Parser, Debug)]
#[command(name = "gallery_feed")]
#[command(version, about, long_about = None)]
struct Args {
    /// Unsplash access key (defaults to UNSPLASH_ACCESS_KEY)
    #[arg(long)]
    access_key: Option<String>,

    /// API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Favorites file (default: ~/.local/share/gallery_feed/favorites.json)
    #[arg(long)]
    favorites_file: Option<PathBuf>,

    /// Maximum parallel image downloads
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_DOWNLOADS)]
    max_downloads: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List photos from the feed
    Browse {
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Only list photos marked as favorite
        #[arg(long, default_value_t = false)]
        favorites_only: bool,
    },
    /// Download every thumbnail of the loaded pages
    Thumbs {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show details for the photo at a feed position
    Detail {
        index: usize,
        /// Toggle the photo's favorite state
        #[arg(long, default_value_t = false)]
        toggle_favorite: bool,
    },
    /// Toggle a photo id in the favorites
    Favorite { id: String },
    /// List favorite photo ids
    Favorites,
}

#[tokio::main]
async fn main() {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=gallery_feed=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting gallery_feed");

    if let Err(e) = run(args).await {
        log::error!("Application error: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn build_config(args: &Args) -> GalleryConfig {
    let mut config = GalleryConfig::from_env();
    if args.access_key.is_some() {
        config = config.with_access_key(args.access_key.clone());
    }
    config.base_url = args.base_url.clone();
    config.max_concurrent_downloads = args.max_downloads;
    config.favorites_path = args
        .favorites_file
        .clone()
        .unwrap_or_else(default_favorites_path);
    config
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = build_config(&args);

    match args.command {
        Command::Browse {
            pages,
            favorites_only,
        } => browse(&config, pages, favorites_only).await,
        Command::Thumbs { pages } => thumbs(&config, pages).await,
        Command::Detail {
            index,
            toggle_favorite,
        } => detail(&config, index, toggle_favorite).await,
        Command::Favorite { id } => {
            let mut favorites = FavoriteSet::open(&config.favorites_path);
            if favorites.toggle(&id) {
                println!("★ {id} added to favorites");
            } else {
                println!("☆ {id} removed from favorites");
            }
            Ok(())
        }
        Command::Favorites => {
            let favorites = FavoriteSet::open(&config.favorites_path);
            let mut ids: Vec<String> = favorites.all_ids().into_iter().collect();
            ids.sort();
            println!("{} favorites", ids.len());
            for id in ids {
                println!("★ {id}");
            }
            Ok(())
        }
    }
}

/// Load `pages` pages in sequence, stopping at the first failure
async fn load_pages(
    feed: &mut FeedController<UnsplashClient>,
    pages: u32,
) -> anyhow::Result<()> {
    for _ in 0..pages {
        feed.load_next_page();
        for event in feed.settle().await {
            match event {
                FeedEvent::LoadingStarted => println!("Loading photos..."),
                FeedEvent::Updated => log::info!("Feed now has {} photos", feed.len()),
                FeedEvent::Failed { kind, message } => bail!("{message} ({kind})"),
            }
        }
    }
    Ok(())
}

fn open_feed(config: &GalleryConfig) -> (Arc<UnsplashClient>, FeedController<UnsplashClient>) {
    let source = Arc::new(UnsplashClient::from_config(config));
    let feed = FeedController::new(Arc::clone(&source), Handle::current());
    (source, feed)
}

async fn browse(
    config: &GalleryConfig,
    pages: u32,
    favorites_only: bool,
) -> anyhow::Result<()> {
    let (_source, mut feed) = open_feed(config);
    load_pages(&mut feed, pages).await?;
    let favorites = FavoriteSet::open(&config.favorites_path);

    let photos = if favorites_only {
        favorite_photos(feed.items(), &favorites)
    } else {
        feed.items().to_vec()
    };
    for (index, photo) in photos.iter().enumerate() {
        let marker = if favorites.contains(&photo.id) { "★" } else { " " };
        println!(
            "{marker} {index:>4}  {:<12} {:<40} {} ({})",
            photo.id,
            photo.alt_description.as_deref().unwrap_or("Untitled"),
            photo.author.name,
            format_date(photo.created_at.as_deref().unwrap_or_default()),
        );
    }
    println!("{} photos, next page {}", feed.len(), feed.page_cursor());
    Ok(())
}

async fn thumbs(config: &GalleryConfig, pages: u32) -> anyhow::Result<()> {
    let (source, mut feed) = open_feed(config);
    load_pages(&mut feed, pages).await?;

    let mut loader = ImageLoader::new(
        source,
        Arc::new(ImageCache::new()),
        Handle::current(),
        config.max_concurrent_downloads,
    );
    let mut slots: Vec<ImageSlot> = (0..feed.len()).map(ImageSlot::new).collect();
    for (slot, photo) in slots.iter_mut().zip(feed.items()) {
        loader.request(slot, photo.thumbnail_url());
    }
    while let Some(loaded) = loader.next_loaded().await {
        if let Some(slot) = slots.get_mut(loaded.slot) {
            slot.apply(loaded);
        }
    }

    for (slot, photo) in slots.iter().zip(feed.items()) {
        match slot.content() {
            SlotContent::Ready(bytes) => match image::load_from_memory(bytes) {
                Ok(img) => println!(
                    "{:<12} {}x{} ({} bytes)",
                    photo.id,
                    img.width(),
                    img.height(),
                    bytes.len()
                ),
                Err(e) => println!("{:<12} undecodable image: {e}", photo.id),
            },
            SlotContent::Failed(kind) => println!("{:<12} {}", photo.id, kind.user_message()),
            SlotContent::Empty | SlotContent::Loading => {}
        }
    }

    let stats = loader.cache().stats();
    println!(
        "{} images cached ({} fetched, {} coalesced, {} failed)",
        loader.cache().len(),
        stats.misses,
        stats.coalesced,
        stats.failures
    );
    Ok(())
}

async fn detail(
    config: &GalleryConfig,
    index: usize,
    toggle_favorite: bool,
) -> anyhow::Result<()> {
    let (_source, mut feed) = open_feed(config);
    while feed.len() <= index {
        let before = feed.len();
        load_pages(&mut feed, 1).await?;
        if feed.len() == before {
            bail!("The feed ended before position {index}");
        }
    }

    let navigator = DetailNavigator::new(feed.items().to_vec(), index)
        .context("photo position out of range")?;
    let mut favorites = FavoriteSet::open(&config.favorites_path);
    if toggle_favorite {
        navigator.toggle_favorite(&mut favorites);
    }

    let details = navigator.details();
    let photo = navigator.current();
    let marker = if navigator.is_favorite(&favorites) { "★" } else { "☆" };
    println!("{marker} {}", details.title);
    println!("  {}", details.description);
    println!("  by {} on {}", details.author, details.created_at);
    println!("  {}", photo.regular_url());
    Ok(())
}
