use std::path::{Path, PathBuf};

mod check;
mod preventive;

use anyhow::Context;
use chrono::Local;
use check::Check;
use clap::ArgAction;
use preventive::Preventive;
use serde::Serialize;
use tracing::instrument;
use vistoria_core::{
    AppConfig, DateKey, EquipmentFaultLogEntry, ItemStatus, fault_history::DefectCount,
};
use vistoria_engine::Engine;

#[derive(Debug, clap::Parser)]
#[command(version, about = "Daily equipment inspection checklist")]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, default_value = "vistoria.toml", global = true)]
    config: PathBuf,

    /// Account e-mail (or the administrator identifier)
    #[arg(long, global = true)]
    email: Option<String>,

    /// Account password
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let session = Session {
            config: self.config,
            email: self.email,
            password: self.password,
        };
        self.command.run(&session)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Global options every command needs to reach the engine.
#[derive(Debug)]
struct Session {
    config: PathBuf,
    email: Option<String>,
    password: Option<String>,
}

impl Session {
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        AppConfig::load(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))
    }

    /// Engine with nobody signed in.
    fn guest(&self) -> anyhow::Result<Engine> {
        let config = self.load_config()?;
        let database = config.storage.database.clone();
        Engine::open(config).with_context(|| format!("failed to open {}", database.display()))
    }

    /// Engine signed in with the global credentials. Each invocation is a
    /// single action, so it stays out of the login history.
    fn signed_in(&self) -> anyhow::Result<Engine> {
        let (email, password) = self.credentials()?;
        let mut engine = self.guest()?;
        engine.authenticate(email, password)?;
        Ok(engine)
    }

    fn credentials(&self) -> anyhow::Result<(&str, &str)> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok((email.as_str(), password.as_str())),
            _ => anyhow::bail!("this command needs --email and --password"),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Write a default configuration file and create the database
    Init,

    /// Create an account in the organization domain
    Register(Register),

    /// Show the checklist for a date
    Show(Show),

    /// Mark items and save the checklist
    Check(Check),

    /// Print the shareable daily summary
    Export(Export),

    /// Fault history of one piece of equipment
    Faults(Faults),

    /// Preventive maintenance records
    #[command(subcommand)]
    Preventive(Preventive),

    /// Lock or unlock self-registration (administrator only)
    Registration(Registration),

    /// Change log or login history
    Log(Log),
}

impl Command {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        match self {
            Self::Init => Init::run(&session.config)?,
            Self::Register(command) => command.run(session)?,
            Self::Show(command) => command.run(session)?,
            Self::Check(command) => command.run(session)?,
            Self::Export(command) => command.run(session)?,
            Self::Faults(command) => command.run(session)?,
            Self::Preventive(command) => command.run(session)?,
            Self::Registration(command) => command.run(session)?,
            Self::Log(command) => command.run(session)?,
        }
        Ok(())
    }
}

struct Init;

impl Init {
    #[instrument]
    fn run(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        let config = AppConfig::default();
        config
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Engine::open(config.clone())?;

        println!("Created {}", path.display());
        println!("Created {}", config.storage.database.display());
        println!(
            "Administrator: {} (change the initial password in the config before sharing it)",
            config.admin.identifier
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Register {
    /// Display name of the new account
    #[arg(long)]
    name: String,
}

impl Register {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let (email, password) = session.credentials()?;
        let mut engine = session.guest()?;
        let actor = engine.register(&self.name, email, password)?;
        println!("Registered {}", actor.label());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Show {
    /// Date as YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<DateKey>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Show {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let engine = session.guest()?;
        let report = engine.report(self.date.unwrap_or_else(DateKey::today))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let collaborator = if report.collaborator.is_empty() {
            "not saved yet"
        } else {
            report.collaborator.as_str()
        };
        println!("{} ({collaborator})", report.id);
        for section in engine.template().sections() {
            println!();
            println!("{}", section.name);
            for item in &section.items {
                let state = report.data.item(&section.name, item);
                match state.status {
                    ItemStatus::Ok => println!("  [ok]    {item}"),
                    ItemStatus::Issue => println!("  [issue] {item}  {}", state.observation),
                }
            }
        }
        let open = report.data.issues(engine.template()).count();
        println!();
        println!("{open} item(s) with issues");
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Export {
    /// Date as YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<DateKey>,
}

impl Export {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let engine = session.guest()?;
        print!(
            "{}",
            engine.export_summary(self.date.unwrap_or_else(DateKey::today))?
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Faults {
    /// Equipment as "<SECTION> - <Item>"; omit to list all equipment
    equipment: Option<String>,

    /// Print the defect summary and history as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct FaultReport {
    equipment: String,
    defects: Vec<DefectCount>,
    history: Vec<EquipmentFaultLogEntry>,
}

impl Faults {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let engine = session.guest()?;
        let Some(equipment) = self.equipment else {
            let names = engine.equipment_names();
            if self.json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
            return Ok(());
        };

        let report = FaultReport {
            defects: engine.defect_summary(&equipment)?,
            history: engine.fault_history(&equipment)?,
            equipment,
        };
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        if report.history.is_empty() {
            println!("No faults recorded for {}", report.equipment);
            return Ok(());
        }
        println!("Most frequent defects:");
        for defect in &report.defects {
            println!("  {:>3}x {}", defect.occurrences, defect.description);
        }
        println!();
        println!("History:");
        for entry in &report.history {
            println!(
                "  {}  {}",
                entry.date.with_timezone(&Local).format("%d/%m/%Y %H:%M"),
                entry.description
            );
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Registration {
    #[arg(value_enum)]
    action: LockAction,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LockAction {
    Lock,
    Unlock,
    Status,
}

impl Registration {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let locked = match self.action {
            LockAction::Status => session.guest()?.registration_locked()?,
            LockAction::Lock | LockAction::Unlock => {
                let locked = matches!(self.action, LockAction::Lock);
                session.signed_in()?.set_registration_locked(locked)?;
                locked
            }
        };
        println!(
            "Registration is {}",
            if locked { "locked" } else { "open" }
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Log {
    #[arg(value_enum)]
    kind: LogKind,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogKind {
    Changes,
    Logins,
}

impl Log {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let engine = session.signed_in()?;
        match self.kind {
            LogKind::Changes => {
                for entry in engine.change_log()? {
                    println!(
                        "{}  {} ({})  {}",
                        entry.date.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S"),
                        entry.user,
                        entry.email,
                        entry.change
                    );
                }
            }
            LogKind::Logins => {
                for entry in engine.login_history()? {
                    println!(
                        "{}  {} ({})",
                        entry.date.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S"),
                        entry.user,
                        entry.email
                    );
                }
            }
        }
        Ok(())
    }
}
