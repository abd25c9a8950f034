//! CLI entry point for booth-auth.

pub mod auth;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Photobooth account authorization
#[derive(Parser, Debug)]
#[command(name = "booth-auth", version, about = "Device authorization for the photobooth")]
pub struct Cli {
    /// Config file (defaults to ~/.booth-auth/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorization management
    Auth(AuthArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Authorize this booth with the device flow
    Login(ProfileArgs),
    /// Exchange the stored refresh token for a new access token
    Refresh(ProfileArgs),
    /// Show the stored token
    Status(ProfileArgs),
    /// Forget the stored token
    Logout(ProfileArgs),
}

/// Profile selection shared by every auth subcommand.
#[derive(Parser, Debug, Default)]
pub struct ProfileArgs {
    /// Token profile (overrides the configured profile)
    #[arg(short, long)]
    pub profile: Option<String>,
}
