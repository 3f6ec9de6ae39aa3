use anyhow::Result;
use clap::{Parser, Subcommand};
use rollcall_cli::config::Config;
use rollcall_cli::session::Session;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rollcall", about = "Face-recognition attendance tracker", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a new user
    Register {
        /// Display name for the new user
        #[arg(long)]
        name: String,
    },
    /// Mark attendance via face recognition
    Mark,
    /// Show the attendance report
    View,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut session = Session::open(Config::from_env())?;

    match cli.command {
        Some(Commands::Register { name }) => session.register(&name)?,
        Some(Commands::Mark) => session.mark()?,
        Some(Commands::View) => session.view()?,
        None => menu(&mut session)?,
    }
    Ok(())
}

/// Interactive menu loop when no subcommand is given.
fn menu(session: &mut Session) -> Result<()> {
    loop {
        println!();
        println!("1. Register new user");
        println!("2. Mark attendance");
        println!("3. View attendance report");
        println!("4. Exit");
        print!("Choose an option: ");
        io::stdout().flush()?;

        let mut choice = String::new();
        if io::stdin().read_line(&mut choice)? == 0 {
            return Ok(());
        }

        match choice.trim() {
            "1" => {
                print!("Enter name: ");
                io::stdout().flush()?;
                let mut name = String::new();
                io::stdin().read_line(&mut name)?;
                if let Err(e) = session.register(name.trim()) {
                    eprintln!("Registration failed: {e}");
                }
            }
            "2" => {
                if let Err(e) = session.mark() {
                    eprintln!("Attendance marking failed: {e}");
                }
            }
            "3" => session.view()?,
            "4" => return Ok(()),
            other => println!("Invalid option: {other}"),
        }
    }
}
