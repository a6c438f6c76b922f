use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::{
    api::ApiRequest,
    app::{get_config_dir, init_config, AppState},
    constants::PROFILE_ENDPOINT,
    models::{
        parse_timestamp, Credentials, Instructor, NewRide, Profile, RegistrationRequest, Ride,
        SearchParams,
    },
    utils::{log_error, log_info, ApiError},
};

use super::{Commands, OutputFormat, RideCommands};

/// Handle commands that need neither the network nor a session.
/// Returns `true` when the command was handled here.
pub fn handle_local_command(command: &Commands) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing drivebook configuration...");
            match init_config()? {
                Some(path) => println!("Configuration written to {}", path.display()),
                None => println!("Configuration already exists, leaving it untouched"),
            }
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Handle a CLI subcommand against the bootstrapped application
pub async fn handle_command(
    state: &AppState,
    command: &Commands,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        Commands::Init | Commands::Version => {
            handle_local_command(command)?;
        }
        Commands::Login { email, password } => {
            let profile = state
                .auth
                .sign_in(&Credentials::new(email.as_str(), password.as_str()))
                .await?;
            println!("{} Signed in as {}", "[OK]".green(), profile.display_name().bold());
        }
        Commands::Register {
            name,
            email,
            password,
            role,
        } => {
            let request = RegistrationRequest {
                full_name: name.clone(),
                email: email.clone(),
                password: password.clone(),
                role: Some((*role).into()),
            };
            let profile = state.auth.sign_up(&request).await?;
            println!(
                "{} Account created, signed in as {}",
                "[OK]".green(),
                profile.display_name().bold()
            );
        }
        Commands::Logout => {
            state.auth.sign_out();
            state.rides.reset();
            println!("Signed out");
        }
        Commands::Whoami => show_profile(state.session.snapshot().user.as_ref()),
        Commands::Instructors {
            lat,
            lon,
            radius,
            format,
        } => {
            let params = SearchParams {
                latitude: *lat,
                longitude: *lon,
                radius: *radius,
            };
            if params.coordinates().is_none() {
                println!(
                    "{} Position incomplete, pass both --lat and --lon",
                    "[WARNING]".yellow()
                );
            }
            let found = state.instructors.search(params).await?;
            print_instructors(&found, *format)?;
        }
        Commands::Rides { command } => handle_rides(state, command).await?,
        Commands::Status => show_status(state, config_path).await,
    }
    Ok(())
}

async fn handle_rides(state: &AppState, command: &RideCommands) -> Result<()> {
    if !state.session.is_authenticated() {
        bail!("Not signed in. Run `drivebook login` first.");
    }

    match command {
        RideCommands::List { format } => {
            let rides = state.rides.list().await?;
            print_rides(&rides, *format)?;
        }
        RideCommands::Book {
            instructor,
            at,
            pickup_lat,
            pickup_lon,
        } => {
            let scheduled_at = parse_timestamp(at)
                .with_context(|| format!("Invalid start time '{}'", at))?;
            let ride = state
                .rides
                .book(&NewRide {
                    instructor_id: *instructor,
                    scheduled_at,
                    pickup_latitude: *pickup_lat,
                    pickup_longitude: *pickup_lon,
                })
                .await?;
            log_info("RIDES", format!("Booked ride {}", ride.id));
            println!(
                "{} Ride {} booked for {} ({})",
                "[OK]".green(),
                ride.id,
                ride.scheduled_at.format("%Y-%m-%d %H:%M UTC"),
                ride.status
            );
        }
    }
    Ok(())
}

fn show_profile(user: Option<&Profile>) {
    let Some(user) = user else {
        println!("Not signed in");
        return;
    };

    println!("{}", user.display_name().bold());
    println!("  Email: {}", user.email);
    if let Some(role) = user.role {
        println!("  Role:  {}", role);
    }
    if !user.is_active {
        println!("  {}", "Account inactive".yellow());
    }
    if user.has_pending_reviews {
        println!("  {}", "You have lessons waiting for a review".cyan());
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_instructors(found: &[Instructor], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(found);
    }

    if found.is_empty() {
        println!("No instructors found");
        return Ok(());
    }

    for instructor in found {
        let name = instructor.full_name.as_deref().unwrap_or("(unnamed)");
        let mut line = format!("  #{:<4} {}", instructor.id, name.bold());
        if let Some(distance) = instructor.distance {
            line.push_str(&format!("  {:.1} km", distance));
        }
        if let Some(rate) = instructor.hourly_rate {
            line.push_str(&format!("  {:.2}/h", rate).green().to_string());
        }
        if let Some(rating) = instructor.rating {
            line.push_str(&format!("  {:.1}*", rating));
        }
        if let Some(vehicle) = &instructor.vehicle_model {
            line.push_str(&format!("  {}", vehicle.dimmed()));
        }
        println!("{}", line);
    }
    Ok(())
}

fn print_rides(rides: &[Ride], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(rides);
    }

    if rides.is_empty() {
        println!("No rides booked");
        return Ok(());
    }

    for ride in rides {
        println!(
            "  #{:<4} {}  instructor #{}  {:.2}  {}",
            ride.id,
            ride.scheduled_at.format("%Y-%m-%d %H:%M"),
            ride.instructor_id,
            ride.price,
            ride.status.to_string().cyan()
        );
    }
    Ok(())
}

/// Show version information
pub fn show_version() {
    println!("drivebook v{}", env!("CARGO_PKG_VERSION"));
    println!("   Find driving instructors and book lessons");
}

/// Show configuration, session and API status
async fn show_status(state: &AppState, config_path: Option<&Path>) {
    println!("drivebook Status:");
    println!();

    // Configuration
    let config_file = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => get_config_dir().ok().map(|dir| dir.join("config.toml")),
    };
    match config_file {
        Some(path) if path.exists() => {
            println!("  [OK] Configuration: {}", path.display())
        }
        _ => println!("  [WARNING] Configuration: Not found (using defaults)"),
    }
    println!("      • API: {}", state.config.api.base_url);

    // Session
    let session = state.session.snapshot();
    match &session.user {
        Some(user) if session.is_authenticated => {
            println!("  [OK] Session: Signed in as {}", user.display_name())
        }
        _ => println!("  [WARNING] Session: Not signed in"),
    }

    // API reachability. With a session this also validates the token.
    let probe = if session.is_authenticated {
        state
            .gateway
            .get_json::<Profile>(PROFILE_ENDPOINT, &[])
            .await
            .map(|_| ())
    } else {
        state.gateway.send(ApiRequest::get("/")).await.map(|_| ())
    };
    match probe {
        Ok(()) => println!("  [OK] API: Reachable"),
        Err(ApiError::Unauthorized { .. }) => {
            println!("  [WARNING] API: Reachable, session expired (signed out)")
        }
        Err(ApiError::Network(reason)) => {
            log_error("STATUS", &reason);
            println!("  [ERROR] API: Unreachable ({})", reason);
        }
        Err(err) => println!("  [OK] API: Reachable ({})", err),
    }

    let stats = state.instructors.cache_stats();
    println!("      • Search cache: {}", stats.format());
    println!();
}
