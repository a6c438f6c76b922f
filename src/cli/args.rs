use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::Role;

#[derive(Parser, Debug)]
#[command(name = "drivebook")]
#[command(version)]
#[command(about = "Find driving instructors and book lessons from the terminal", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API base URL (overrides configuration)
    #[arg(long, env = "DRIVEBOOK_BASE_URL")]
    pub base_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Account password
        #[arg(short, long, env = "DRIVEBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        /// Full name
        #[arg(short, long)]
        name: String,
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Account password
        #[arg(short, long, env = "DRIVEBOOK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Account type
        #[arg(long, value_enum, default_value_t = RoleArg::Student)]
        role: RoleArg,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Search instructors near a position
    Instructors {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Search radius in km
        #[arg(short, long)]
        radius: Option<f64>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Manage lessons
    Rides {
        #[command(subcommand)]
        command: RideCommands,
    },
    /// Check configuration, session and API reachability
    Status,
    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum RideCommands {
    /// List your lessons
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Book a lesson
    Book {
        /// Instructor id
        #[arg(short, long)]
        instructor: i64,
        /// Start time, RFC 3339 or YYYY-MM-DDTHH:MM (UTC)
        #[arg(long)]
        at: String,
        /// Pickup latitude
        #[arg(long, allow_negative_numbers = true, requires = "pickup_lon")]
        pickup_lat: Option<f64>,
        /// Pickup longitude
        #[arg(long, allow_negative_numbers = true, requires = "pickup_lat")]
        pickup_lon: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum RoleArg {
    Student,
    Instructor,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Student => Role::Student,
            RoleArg::Instructor => Role::Instructor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "drivebook",
            "instructors",
            "--lat",
            "-23.55",
            "--lon",
            "-46.63",
        ])
        .unwrap();
        match cli.command {
            Commands::Instructors { lat, lon, radius, .. } => {
                assert_eq!(lat, Some(-23.55));
                assert_eq!(lon, Some(-46.63));
                assert_eq!(radius, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_pickup_needs_both_coordinates() {
        let result = Cli::try_parse_from([
            "drivebook",
            "rides",
            "book",
            "--instructor",
            "3",
            "--at",
            "2026-11-02T14:00",
            "--pickup-lat",
            "-23.5",
        ]);
        assert!(result.is_err());
    }
}
