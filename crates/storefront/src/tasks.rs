//! Fire-and-forget background jobs.
//!
//! Requests enqueue a [`Job`] and move on; a single worker task drains the
//! channel and does the slow work (today: email). Enqueueing never blocks
//! and never fails the request - if the channel is gone the job is logged
//! and dropped, because notifications are best-effort by contract while
//! the order itself is already committed.

use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sqlx::PgPool;
use tokio::sync::mpsc;

use prickly_pear_core::{OrderId, quantize};

use crate::config::MailConfig;
use crate::db::OrderRepository;
use crate::models::OrderWithLines;

/// A unit of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Checkout finished; send the order confirmation.
    OrderCreated(OrderId),
    /// Payment settled; send the invoice.
    SendInvoice(OrderId),
}

/// Cheap handle for enqueueing jobs from request handlers.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl JobQueue {
    /// Create the queue and the receiving end for the worker.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue a job and return immediately.
    ///
    /// A send failure means the worker is gone; the job is dropped with a
    /// log line and the calling request is unaffected.
    pub fn enqueue(&self, job: Job) {
        if let Err(e) = self.tx.send(job) {
            tracing::error!(job = ?e.0, "job queue closed, dropping job");
        }
    }
}

/// Background worker: drains the queue and sends mail.
pub struct Worker {
    pool: PgPool,
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl Worker {
    /// Build a worker from the mail configuration.
    ///
    /// Without an SMTP URL the worker runs in log-only mode: jobs are
    /// processed and logged but no mail leaves the process. Useful in
    /// development and tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP URL or from address is malformed.
    pub fn new(pool: PgPool, config: &MailConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let mailer = match config.smtp_url.as_deref() {
            Some(url) => Some(AsyncSmtpTransport::<Tokio1Executor>::from_url(url)?.build()),
            None => None,
        };

        Ok(Self {
            pool,
            mailer,
            from: config.from.clone(),
        })
    }

    /// Drain jobs until every [`JobQueue`] handle is dropped.
    ///
    /// Per-job failures are logged and swallowed; one bad order id must not
    /// stall the queue behind it.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Job>) {
        while let Some(job) = rx.recv().await {
            if let Err(e) = self.process(job).await {
                tracing::error!(?job, error = %e, "background job failed");
            }
        }
        tracing::info!("job queue drained, worker exiting");
    }

    async fn process(&self, job: Job) -> Result<(), WorkerError> {
        match job {
            Job::OrderCreated(order_id) => self.send_order_confirmation(order_id).await,
            Job::SendInvoice(order_id) => self.send_invoice(order_id).await,
        }
    }

    async fn load_order(&self, order_id: OrderId) -> Result<OrderWithLines, WorkerError> {
        OrderRepository::new(&self.pool)
            .get_with_lines(order_id)
            .await?
            .ok_or(WorkerError::OrderGone(order_id))
    }

    async fn send_order_confirmation(&self, order_id: OrderId) -> Result<(), WorkerError> {
        let order = self.load_order(order_id).await?;

        let subject = format!("Order no. {order_id}");
        let body = format!(
            "Dear {},\n\n\
             Your order has been placed successfully.\n\
             Your order id is {order_id}.\n",
            order.order.name
        );

        self.deliver(&order.order.email, &subject, body).await
    }

    async fn send_invoice(&self, order_id: OrderId) -> Result<(), WorkerError> {
        let order = self.load_order(order_id).await?;

        let mut body = format!(
            "Dear {},\n\nThank you for your payment. Your invoice:\n\n",
            order.order.name
        );
        for line in &order.lines {
            body.push_str(&format!(
                "  {} x{} @ {} = {}\n",
                line.product_name,
                line.quantity,
                quantize(line.unit_price),
                quantize(line.line_total()),
            ));
        }
        if order.order.discount_percent > 0 {
            body.push_str(&format!(
                "  discount ({}%): -{}\n",
                order.order.discount_percent,
                order.discount_amount()
            ));
        }
        body.push_str(&format!("  total: {}\n", order.total()));

        let subject = format!("Prickly Pear - Invoice no. {order_id}");
        self.deliver(&order.order.email, &subject, body).await
    }

    async fn deliver(&self, to: &str, subject: &str, body: String) -> Result<(), WorkerError> {
        let Some(mailer) = &self.mailer else {
            tracing::info!(%to, %subject, "mail transport not configured, logging only");
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().map_err(|_| WorkerError::BadRecipient)?)
            .subject(subject)
            .body(body)?;

        mailer.send(message).await?;
        tracing::info!(%to, %subject, "mail sent");
        Ok(())
    }
}

/// Failures inside the worker. Logged, never propagated to requests.
#[derive(Debug, thiserror::Error)]
enum WorkerError {
    #[error("order {0} no longer exists")]
    OrderGone(OrderId),
    #[error("recipient address failed to parse")]
    BadRecipient,
    #[error("repository error: {0}")]
    Repository(#[from] crate::db::RepositoryError),
    #[error("mail build error: {0}")]
    Mail(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_after_worker_drop_does_not_panic() {
        let (queue, rx) = JobQueue::new();
        drop(rx);
        // Must not panic or block; the job is logged and dropped.
        queue.enqueue(Job::OrderCreated(OrderId::new(1)));
    }

    #[tokio::test]
    async fn test_jobs_arrive_in_order() {
        let (queue, mut rx) = JobQueue::new();
        queue.enqueue(Job::OrderCreated(OrderId::new(1)));
        queue.enqueue(Job::SendInvoice(OrderId::new(1)));

        assert_eq!(rx.recv().await, Some(Job::OrderCreated(OrderId::new(1))));
        assert_eq!(rx.recv().await, Some(Job::SendInvoice(OrderId::new(1))));
    }
}
