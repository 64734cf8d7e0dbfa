//! Budget checks and the notices sent when a user overspends.

use std::fmt::{Debug, Display};

use lettre::{
    Message, Transport,
    message::{Mailbox, header::ContentType},
};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    Email, Error,
    expense::total_expenses,
    report::format_amount,
    user::{User, UserID, get_user_by_id},
};

/// The subject line of budget notices.
pub const NOTICE_SUBJECT: &str = "Budget exceeded - Expense Tracker";

/// Whether `total` spending is over a `budget`.
///
/// A budget of zero or less means the user has not set one, so they are
/// never over it.
pub fn is_over_budget(total: Decimal, budget: Decimal) -> bool {
    budget > Decimal::ZERO && total > budget
}

/// A message telling a user their spending has passed their budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetNotice {
    /// Who the notice is for.
    pub recipient: Email,
    /// The subject line.
    pub subject: String,
    /// The plain-text message.
    pub body: String,
}

/// Build a notice for `user` if `total` is over their budget.
pub fn check_budget(user: &User, total: Decimal) -> Option<BudgetNotice> {
    if !is_over_budget(total, user.budget) {
        return None;
    }

    let body = format!(
        "Hello\n\nYour total expenses (₹{}) have exceeded your budget (₹{}).\n\n- Expense Tracker",
        format_amount(total),
        format_amount(user.budget)
    );

    Some(BudgetNotice {
        recipient: user.email.clone(),
        subject: NOTICE_SUBJECT.to_owned(),
        body,
    })
}

/// An error from a [Notifier] that failed to deliver a notice.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("could not send notice to {recipient}: {reason}")]
pub struct NotifyError {
    /// Who the notice was for.
    pub recipient: String,
    /// Why delivery failed.
    pub reason: String,
}

/// Delivers budget notices to users, e.g. by email.
pub trait Notifier: Debug + Send + Sync {
    /// Deliver `notice` to its recipient.
    ///
    /// # Errors
    /// Returns a [NotifyError] if the notice could not be delivered.
    fn send(&self, notice: &BudgetNotice) -> Result<(), NotifyError>;
}

/// A [Notifier] that writes notices to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notice: &BudgetNotice) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %notice.recipient,
            subject = %notice.subject,
            "{}",
            notice.body
        );

        Ok(())
    }
}

/// A [Notifier] that emails notices through a `lettre` transport.
///
/// The transport is passed in fully configured, e.g. an
/// [SmtpTransport](lettre::SmtpTransport) for a real mail server or a
/// [StubTransport](lettre::transport::stub::StubTransport) in tests.
/// Sending is synchronous and blocks until the transport responds.
pub struct SmtpNotifier<T> {
    from: Mailbox,
    transport: T,
}

impl<T> SmtpNotifier<T> {
    /// Create a notifier that sends notices from `from` through `transport`.
    pub fn new(from: Mailbox, transport: T) -> Self {
        Self { from, transport }
    }

    /// The transport notices are sent through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn build_message(&self, notice: &BudgetNotice) -> Result<Message, NotifyError> {
        let to: Mailbox = notice
            .recipient
            .as_ref()
            .parse()
            .map_err(|error| notify_error(notice, error))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notice.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(notice.body.clone())
            .map_err(|error| notify_error(notice, error))
    }
}

impl<T> Debug for SmtpNotifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl<T> Notifier for SmtpNotifier<T>
where
    T: Transport + Send + Sync,
    T::Error: Display,
{
    fn send(&self, notice: &BudgetNotice) -> Result<(), NotifyError> {
        let message = self.build_message(notice)?;

        self.transport
            .send(&message)
            .map_err(|error| notify_error(notice, error))?;

        tracing::debug!("Emailed budget notice to {}", notice.recipient);

        Ok(())
    }
}

fn notify_error(notice: &BudgetNotice, reason: impl Display) -> NotifyError {
    NotifyError {
        recipient: notice.recipient.to_string(),
        reason: reason.to_string(),
    }
}

/// Recompute a user's total and send them a notice if it is over budget.
///
/// Delivery failures are logged and otherwise ignored: the notice is a
/// courtesy and must not undo the expense that triggered it.
///
/// Returns the notice that was sent (or attempted), if any.
///
/// # Errors
/// This function will return an error if the user or their total could not be
/// read from the database.
pub fn notify_if_over_budget(
    user_id: UserID,
    notifier: &dyn Notifier,
    connection: &Connection,
) -> Result<Option<BudgetNotice>, Error> {
    let user = get_user_by_id(user_id, connection)?;
    let total = total_expenses(user_id, connection)?;

    let Some(notice) = check_budget(&user, total) else {
        return Ok(None);
    };

    match notifier.send(&notice) {
        Ok(()) => tracing::info!("Sent budget notice to user {user_id}"),
        Err(error) => tracing::error!("Failed to send budget notice: {error}"),
    }

    Ok(Some(notice))
}

#[cfg(test)]
pub(crate) mod test_notifiers {
    use std::sync::Mutex;

    use super::{BudgetNotice, Notifier, NotifyError};

    /// Keeps every notice it is asked to send.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<BudgetNotice>>,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, notice: &BudgetNotice) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    /// Fails every delivery.
    #[derive(Debug, Default)]
    pub struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn send(&self, notice: &BudgetNotice) -> Result<(), NotifyError> {
            Err(NotifyError {
                recipient: notice.recipient.to_string(),
                reason: "mail server unavailable".to_owned(),
            })
        }
    }
}
