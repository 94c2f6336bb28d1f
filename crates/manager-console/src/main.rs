use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use manager_console::backend::memory::Fixture;
use manager_console::{
    Action, AssumeYes, Confirm, ConsoleConfig, DashboardView, EmployeeAction, HttpBackend,
    ManagerBackend, ManagerWorkflow, MemoryBackend, Notice, Outcome, Session, SessionHandle,
    SessionStore, SessionUser, WorkflowResult,
};
use reputation::{bids, BidId, FeedbackId, UserId, VipRequestId};
use tracing::info;

/// Manager console for feedback, delivery bids and VIP status
#[derive(Parser, Debug)]
#[command(name = "manager-console", version, about, long_about = None)]
struct Cli {
    /// TOML config file (overlays MANAGER_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config and MANAGER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Run against an in-memory backend seeded from a JSON fixture
    #[arg(long, global = true)]
    offline: Option<PathBuf>,

    /// Skip confirmation prompts for destructive actions
    #[arg(long, short, global = true, default_value_t = false)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a session issued by the login service
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        id: UserId,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "manager")]
        role: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Discard the stored session
    Logout,
    /// Dashboard counters
    Stats,
    /// Customers whose warning count crossed an advisory threshold
    Advisories,
    #[command(subcommand)]
    Feedback(FeedbackCommand),
    #[command(subcommand)]
    Bids(BidCommand),
    #[command(subcommand)]
    Vip(VipCommand),
    #[command(subcommand)]
    Customers(CustomerCommand),
    #[command(subcommand)]
    Employees(EmployeeCommand),
}

/// Complaints and compliments awaiting review
#[derive(Subcommand, Debug)]
enum FeedbackCommand {
    List,
    /// Uphold the feedback; the target receives a warning
    Approve { feedback_id: FeedbackId },
    /// Reject the feedback; the reporter receives a warning
    Dismiss {
        feedback_id: FeedbackId,
        /// Reporter id (defaults to the item's reporter)
        #[arg(long)]
        reporter: Option<UserId>,
    },
}

/// Pending delivery bids, grouped per order
#[derive(Subcommand, Debug)]
enum BidCommand {
    List,
    /// Assign the bid's driver; non-lowest bids need a justification
    Approve {
        bid_id: BidId,
        #[arg(long)]
        justification: Option<String>,
    },
    Reject { bid_id: BidId },
}

/// VIP requests and demotion
#[derive(Subcommand, Debug)]
enum VipCommand {
    List,
    Approve { request_id: VipRequestId },
    Reject { request_id: VipRequestId },
    /// Demote a VIP back to a regular customer
    Demote { customer_id: UserId },
}

#[derive(Subcommand, Debug)]
enum CustomerCommand {
    List,
    /// Remove and blacklist a customer
    Deregister { customer_id: UserId },
}

#[derive(Subcommand, Debug)]
enum EmployeeCommand {
    List,
    Fire { user_id: UserId },
    /// Salary +10%
    Promote { user_id: UserId },
    /// Salary -10%
    Demote { user_id: UserId },
}

/// Ask on stdin; anything but `y`/`yes` declines.
fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let config = match &cli.config {
        Some(path) => ConsoleConfig::from_file(path)?,
        None => ConsoleConfig::default(),
    };
    Ok(match &cli.api_url {
        Some(url) => config.with_api_url(url),
        None => config,
    })
}

fn load_fixture(path: &Path) -> Result<Fixture> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read fixture {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Invalid fixture {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let store = SessionStore::new(config.session_path.clone());

    match &cli.command {
        Command::Login {
            token,
            id,
            name,
            role,
            email,
        } => {
            let session = Session::new(
                token.clone(),
                SessionUser {
                    id: *id,
                    name: name.clone(),
                    role: role.clone(),
                    email: email.clone(),
                },
            );
            SessionHandle::from_store(store).establish(session)?;
            println!("Logged in as {name}.");
            return Ok(ExitCode::SUCCESS);
        }
        Command::Logout => {
            SessionHandle::from_store(store).invalidate();
            println!("Logged out.");
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let session = SessionHandle::from_store(store);
    let backend: Arc<dyn ManagerBackend> = match &cli.offline {
        Some(path) => {
            let token = session.bearer().unwrap_or_default();
            info!(fixture = %path.display(), "Using in-memory backend");
            Arc::new(MemoryBackend::new(load_fixture(path)?, session.clone(), token))
        }
        None => Arc::new(HttpBackend::new(&config, session.clone())?),
    };

    let mut workflow = match ManagerWorkflow::new(backend, session, config.thresholds) {
        Ok(w) => w,
        Err(e) => return Ok(report(Action::Reload, Err(e))),
    };
    if let Err(e) = load_for(&mut workflow, &cli.command).await {
        return Ok(report(Action::Reload, Err(e)));
    }

    let confirm: &dyn Confirm = if cli.yes { &AssumeYes } else { &ask };
    let (action, result) = run(&mut workflow, cli.command, confirm).await;
    Ok(report(action, result))
}

/// Fetch only the lists `command` reads, so an unrelated failing endpoint
/// does not block it.
async fn load_for(workflow: &mut ManagerWorkflow, command: &Command) -> WorkflowResult<()> {
    match command {
        Command::Login { .. } | Command::Logout => {}
        Command::Stats => {
            workflow.load_stats().await?;
        }
        Command::Feedback(_) => {
            workflow.reload_feedback().await?;
        }
        Command::Bids(_) => {
            workflow.reload_bids().await?;
        }
        Command::Vip(VipCommand::Demote { .. })
        | Command::Advisories
        | Command::Customers(_) => {
            workflow.reload_customers().await?;
        }
        Command::Vip(_) => {
            workflow.reload_vip_requests().await?;
        }
        Command::Employees(_) => {
            workflow.reload_employees().await?;
        }
    }
    Ok(())
}

/// Execute one command against a freshly loaded workflow.
///
/// Listing commands print the view and report `Outcome::Done` with an empty
/// notice.
async fn run(
    workflow: &mut ManagerWorkflow,
    command: Command,
    confirm: &dyn Confirm,
) -> (Action, WorkflowResult<Outcome>) {
    match command {
        Command::Login { .. } | Command::Logout => listed(|_| {}, workflow.view()),
        Command::Stats => listed(print_stats, workflow.view()),
        Command::Advisories => {
            for (customer, advisory) in workflow.advisories() {
                println!(
                    "#{:<5} {:<24} warnings={:<3} {}",
                    customer.user_id, customer.name, customer.amount_warnings, advisory
                );
            }
            (Action::Reload, Ok(Outcome::Done(Notice::info(""))))
        }

        Command::Feedback(FeedbackCommand::List) => listed(print_feedback, workflow.view()),
        Command::Feedback(FeedbackCommand::Approve { feedback_id }) => (
            Action::ApproveFeedback,
            workflow
                .approve_feedback(feedback_id)
                .await
                .map(Outcome::Done),
        ),
        Command::Feedback(FeedbackCommand::Dismiss {
            feedback_id,
            reporter,
        }) => {
            let reporter = reporter.or_else(|| {
                workflow
                    .view()
                    .feedback
                    .iter()
                    .find(|f| f.feedback_id == feedback_id)
                    .map(|f| f.feedback_from)
            });
            let result = match reporter {
                Some(reporter_id) => workflow
                    .dismiss_feedback(feedback_id, reporter_id)
                    .await
                    .map(Outcome::Done),
                None => Err(reputation::ValidationError::UnknownFeedback(feedback_id).into()),
            };
            (Action::DismissFeedback, result)
        }

        Command::Bids(BidCommand::List) => listed(print_bids, workflow.view()),
        Command::Bids(BidCommand::Approve {
            bid_id,
            justification,
        }) => (
            Action::ApproveBid,
            workflow
                .approve_bid_in_view(bid_id, justification.as_deref())
                .await
                .map(Outcome::Done),
        ),
        Command::Bids(BidCommand::Reject { bid_id }) => (
            Action::RejectBid,
            workflow.reject_bid(bid_id).await.map(Outcome::Done),
        ),

        Command::Vip(VipCommand::List) => listed(print_vip_requests, workflow.view()),
        Command::Vip(VipCommand::Approve { request_id }) => (
            Action::ApproveVip,
            workflow
                .approve_vip_request(request_id)
                .await
                .map(Outcome::Done),
        ),
        Command::Vip(VipCommand::Reject { request_id }) => (
            Action::RejectVip,
            workflow
                .reject_vip_request(request_id)
                .await
                .map(Outcome::Done),
        ),
        Command::Vip(VipCommand::Demote { customer_id }) => (
            Action::DemoteVip,
            workflow.demote_vip(customer_id, confirm).await,
        ),

        Command::Customers(CustomerCommand::List) => listed(print_customers, workflow.view()),
        Command::Customers(CustomerCommand::Deregister { customer_id }) => (
            Action::DeregisterCustomer,
            workflow.deregister_customer(customer_id, confirm).await,
        ),

        Command::Employees(EmployeeCommand::List) => listed(print_employees, workflow.view()),
        Command::Employees(EmployeeCommand::Fire { user_id }) => (
            Action::FireEmployee,
            workflow
                .employee_action(user_id, EmployeeAction::Fire, confirm)
                .await,
        ),
        Command::Employees(EmployeeCommand::Promote { user_id }) => (
            Action::PromoteEmployee,
            workflow
                .employee_action(user_id, EmployeeAction::Promote, confirm)
                .await,
        ),
        Command::Employees(EmployeeCommand::Demote { user_id }) => (
            Action::DemoteEmployee,
            workflow
                .employee_action(user_id, EmployeeAction::Demote, confirm)
                .await,
        ),
    }
}

fn listed(print: fn(&DashboardView), view: &DashboardView) -> (Action, WorkflowResult<Outcome>) {
    print(view);
    (Action::Reload, Ok(Outcome::Done(Notice::info(""))))
}

fn report(action: Action, result: WorkflowResult<Outcome>) -> ExitCode {
    match result {
        Ok(Outcome::Done(notice)) => {
            if !notice.message.is_empty() {
                println!("{notice}");
            }
            ExitCode::SUCCESS
        }
        Ok(Outcome::Cancelled) => {
            println!("Cancelled.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(%action, error = %e, "Action failed");
            let notice = Notice::failure(action, &e);
            eprintln!("{notice}");
            if notice.retriable {
                eprintln!("(you can retry this action)");
            }
            ExitCode::FAILURE
        }
    }
}

// ── Rendering ────────────────────────────────────────────────────────

fn print_stats(view: &DashboardView) {
    let Some(s) = &view.stats else {
        return;
    };
    println!("Orders:            {}", s.total_orders);
    println!("Revenue:           ${:.2}", s.total_revenue);
    println!("Users:             {}", s.total_users);
    println!("Employees:         {}", s.employee_count);
    println!("Pending feedback:  {}", s.pending_feedback);
    println!("Orders with bids:  {}", s.pending_bids);
    println!("VIP requests:      {}", s.vip_requests);
}

fn print_feedback(view: &DashboardView) {
    if view.feedback.is_empty() {
        println!("No feedback awaiting review.");
    }
    for item in &view.feedback {
        println!(
            "#{} [{}] {} (#{}) -> {} (#{}) [{}]",
            item.feedback_id,
            item.feedback_type,
            item.reporter_label(),
            item.feedback_from,
            item.target_label(),
            item.feedback_for,
            item.complaint_status,
        );
        println!("    {}", item.message);
    }
}

fn print_bids(view: &DashboardView) {
    if view.bid_groups.is_empty() {
        println!("No pending bids.");
    }
    for group in &view.bid_groups {
        println!(
            "Order #{} for {} to {} (total ${:.2})",
            group.order_id,
            group.customer_name.as_deref().unwrap_or("?"),
            group.delivered_to.as_deref().unwrap_or("?"),
            group.order_total.unwrap_or_default(),
        );
        for ranked in bids::rank_bids(group) {
            println!(
                "    bid #{:<5} {:<20} ${:>8.2}{}",
                ranked.bid.bid_id,
                ranked.bid.driver_name,
                ranked.bid.bid_amount,
                if ranked.is_lowest { "  LOWEST" } else { "" },
            );
        }
    }
}

fn print_vip_requests(view: &DashboardView) {
    if view.vip_requests.is_empty() {
        println!("No pending VIP requests.");
    }
    for r in &view.vip_requests {
        println!(
            "#{:<5} customer #{:<5} {:<24} balance=${:.2} orders={} warnings={}",
            r.request_id,
            r.customer_id,
            r.customer_name,
            r.total_balance,
            r.total_orders,
            r.amount_warnings,
        );
    }
}

fn print_customers(view: &DashboardView) {
    for c in &view.customers {
        println!(
            "#{:<5} {:<24} {:<7} warnings={:<3} balance=${:.2}",
            c.user_id,
            c.name,
            if c.vip_status { "VIP" } else { "regular" },
            c.amount_warnings,
            c.total_balance,
        );
    }
}

fn print_employees(view: &DashboardView) {
    for e in &view.employees {
        println!(
            "#{:<5} {:<24} {:<10} salary=${:.2} warnings={}",
            e.user_id, e.name, e.role, e.salary, e.amount_warnings,
        );
    }
}
