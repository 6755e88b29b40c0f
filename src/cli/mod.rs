use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::password;
use crate::catalog::Catalog;
use crate::config;
use crate::domain::user::User;
use crate::http::server::HttpServer;
use crate::storage::{albums::AlbumStore, db, tracks::TrackStore, users::UserStore};

#[derive(Parser)]
#[command(name = "melodeck")]
#[command(version = "0.1")]
#[command(about = "Music catalog server")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Create a user account
    AddUser { username: String, password: String },
    /// Search albums and tracks by keyword
    Search { keyword: String },
}

/// Entrypoint for CLI
pub fn run() {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = config::Config::load(&cli.config).unwrap();

    match &cli.command {
        Commands::Serve => {
            let conn = db::open(&cfg.database).expect("Failed to initialize storage");

            let server = HttpServer::new(conn, cfg.http, cfg.auth);

            println!(
                "HTTP server running at http://{}:{}",
                server.config.bind_addr, server.config.port
            );
            server.run();
        }

        Commands::AddUser { username, password } => {
            let conn = db::open(&cfg.database).expect("Failed to initialize storage");
            let users = UserStore::new(db::share(conn));

            let mut user = User {
                id: String::new(),
                username: username.clone(),
                password: password::digest(password),
            };
            let id = users.create(&mut user).unwrap();
            println!("Created user '{}' with id {}", username, id);
        }

        Commands::Search { keyword } => {
            let conn = db::open(&cfg.database).expect("Failed to initialize storage");
            let handle = db::share(conn);
            let catalog = Catalog::new(TrackStore::new(handle.clone()), AlbumStore::new(handle));

            let (albums, tracks) = catalog.search(keyword).unwrap();

            println!("Albums ({}):", albums.len());
            for album in &albums {
                println!("  {} [{} tracks] ({})", album.title, album.tracks.len(), album.id);
            }

            println!("Tracks ({}):", tracks.len());
            for track in &tracks {
                println!("  {} - {} ({})", track.artist, track.title, track.id);
            }
        }
    }
}
