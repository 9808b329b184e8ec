use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blogline::config::{Cli, Command, Config};
use blogline::db::{self, groups, users};
use blogline::state::{AppState, DbPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    std::fs::create_dir_all(config.media_path())?;

    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        command => run_admin_command(&pool, &config, command),
    }
}

async fn serve(pool: DbPool, config: Config) -> anyhow::Result<()> {
    {
        let conn = pool.get()?;
        let purged = blogline::auth::session::purge_expired(&conn)?;
        if purged > 0 {
            tracing::info!(purged, "Removed expired sessions");
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = blogline::build_router(AppState::new(pool, config));

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn run_admin_command(pool: &DbPool, config: &Config, command: Command) -> anyhow::Result<()> {
    let conn = pool.get()?;
    match command {
        Command::Serve => {}
        Command::CreateUser {
            username,
            password,
            admin,
        } => {
            let user = users::create_user(
                &conn,
                &username,
                Some(&password),
                admin,
                config.auth.bcrypt_cost,
            )?;
            tracing::info!(user_id = user.id, username = %user.username, admin, "User created");
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group = groups::create_group(&conn, &title, &slug, &description)?;
            tracing::info!(group_id = group.id, slug = %group.slug, "Group created");
        }
        Command::DeleteUser { username } => {
            let user = users::find_by_username(&conn, &username)?
                .with_context(|| format!("no user named {username:?}"))?;
            users::delete_user(&conn, user.id)?;
            tracing::info!(username = %username, "User deleted with their posts");
        }
        Command::DeleteGroup { slug } => {
            let group = groups::find_by_slug(&conn, &slug)?
                .with_context(|| format!("no group with slug {slug:?}"))?;
            groups::delete_group(&conn, group.id)?;
            tracing::info!(slug = %slug, "Group deleted");
        }
    }
    Ok(())
}
