use std::{error::Error, fs, path::PathBuf};

use clap::{Parser, Subcommand};
use lettre::{SmtpTransport, message::Mailbox};
use rusqlite::Connection;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use expense_tracker::{
    Email, ExpenseForm, SortOrder,
    budget::{LogNotifier, Notifier, SmtpNotifier, is_over_budget, notify_if_over_budget},
    create_expense, create_user, delete_expense, get_user_by_email, initialize_db,
    list_expenses, now_local, parse_budget,
    report::{PageSize, ReportLayout, format_amount},
    render_report, total_expenses,
};

/// Track personal expenses and export them as a PDF report.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: PathBuf,

    /// SMTP server to email budget notices through. Notices are only logged
    /// when this is not set.
    #[arg(long)]
    smtp_host: Option<String>,

    /// Port of the SMTP server.
    #[arg(long, default_value_t = 25)]
    smtp_port: u16,

    /// Sender of budget notices.
    #[arg(long, default_value = "Expense Tracker <noreply@localhost>")]
    smtp_from: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new user
    Register {
        /// The user's email address
        #[arg(long)]
        email: String,

        /// The spending limit, leave out for no budget
        #[arg(long, default_value = "")]
        budget: String,
    },

    /// Record an expense
    Add {
        /// The email address of the user who spent the money
        #[arg(long)]
        email: String,

        /// What the money was spent on
        #[arg(long)]
        title: String,

        /// How much was spent
        #[arg(long, allow_hyphen_values = true)]
        amount: String,

        /// An optional category, e.g. "Food"
        #[arg(long, default_value = "")]
        category: String,

        /// The date as YYYY-MM-DD (default: today)
        #[arg(long, default_value = "")]
        date: String,
    },

    /// List a user's expenses, newest first
    List {
        /// The user's email address
        #[arg(long)]
        email: String,
    },

    /// Delete one of a user's expenses
    Delete {
        /// The user's email address
        #[arg(long)]
        email: String,

        /// The ID of the expense to delete
        #[arg(long)]
        id: i64,
    },

    /// Export a user's expenses as a PDF report
    Export {
        /// The user's email address
        #[arg(long)]
        email: String,

        /// Where to write the PDF
        #[arg(short, long, default_value = "Expense_Report.pdf")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();
    let connection = Connection::open(&args.db_path)?;
    initialize_db(&connection)?;

    match args.command {
        Command::Register { email, budget } => {
            let user = create_user(Email::new(&email)?, parse_budget(&budget), &connection)?;
            println!(
                "Registered {} (ID {}) with budget {}",
                user.email,
                user.id,
                format_amount(user.budget)
            );
        }
        Command::Add {
            email,
            title,
            amount,
            category,
            date,
        } => {
            let user = get_user_by_email(&Email::new(&email)?, &connection)?;
            let form = ExpenseForm {
                title,
                amount,
                category,
                date,
            };
            let builder = form.into_builder(user.id, now_local().date())?;
            let expense = create_expense(builder, &connection)?;
            println!(
                "Added expense {}: {} {} on {}",
                expense.id,
                expense.title,
                format_amount(expense.amount),
                expense.date
            );

            let notifier = build_notifier(args.smtp_host.as_deref(), args.smtp_port, &args.smtp_from)?;
            if let Some(notice) = notify_if_over_budget(user.id, notifier.as_ref(), &connection)? {
                println!("{}", notice.subject);
            }
        }
        Command::List { email } => {
            let user = get_user_by_email(&Email::new(&email)?, &connection)?;
            let expenses = list_expenses(user.id, SortOrder::Descending, &connection)?;
            let total = total_expenses(user.id, &connection)?;

            for expense in &expenses {
                println!(
                    "{:>6}  {}  {:<30}  {:<15}  {:>12}",
                    expense.id,
                    expense.date,
                    expense.title,
                    expense.category.as_deref().unwrap_or("-"),
                    format_amount(expense.amount)
                );
            }

            println!("Total: {}", format_amount(total));
            if is_over_budget(total, user.budget) {
                println!("Over budget ({})", format_amount(user.budget));
            }
        }
        Command::Delete { email, id } => {
            let user = get_user_by_email(&Email::new(&email)?, &connection)?;
            delete_expense(id, user.id, &connection)?;
            println!("Deleted expense {id}");
        }
        Command::Export { email, output } => {
            let user = get_user_by_email(&Email::new(&email)?, &connection)?;
            let layout = ReportLayout::default();
            let report = render_report(
                user.id,
                now_local(),
                PageSize::A4,
                &layout,
                &connection,
            )?;
            fs::write(&output, &report.bytes)?;
            println!(
                "Wrote {} pages to {}",
                report.page_count,
                output.display()
            );
        }
    }

    Ok(())
}

fn build_notifier(
    smtp_host: Option<&str>,
    smtp_port: u16,
    smtp_from: &str,
) -> Result<Box<dyn Notifier>, Box<dyn Error>> {
    let Some(smtp_host) = smtp_host else {
        return Ok(Box::new(LogNotifier));
    };

    let from: Mailbox = smtp_from.parse()?;
    let transport = SmtpTransport::builder_dangerous(smtp_host)
        .port(smtp_port)
        .build();

    Ok(Box::new(SmtpNotifier::new(from, transport)))
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_log).init();
}
